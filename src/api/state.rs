use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::analytics::{ClickRecorder, ClickSink};
use crate::api::jwt::JwtService;
use crate::config::StaticConfig;
use crate::services::{AnalyticsService, LinkService, RedirectService, UserService};
use crate::storage::SeaOrmStorage;

/// Everything the handlers share, registered once as `web::Data<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<SeaOrmStorage>,
    pub links: Arc<LinkService>,
    pub users: Arc<UserService>,
    pub analytics: Arc<AnalyticsService>,
    pub redirect: Arc<RedirectService>,
    pub recorder: ClickRecorder,
    pub jwt: Arc<JwtService>,
    /// Edge header carrying the visitor country
    pub country_header: String,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &StaticConfig, storage: Arc<SeaOrmStorage>) -> Self {
        let sink: Arc<dyn ClickSink> = storage.clone();
        let recorder = ClickRecorder::new(
            sink,
            Duration::from_secs(config.analytics.flush_interval_secs.max(1)),
            config.analytics.max_buffer.max(1),
        );

        let analytics = Arc::new(AnalyticsService::new(storage.clone()));
        let links = Arc::new(LinkService::new(
            storage.clone(),
            analytics.clone(),
            config.links.clone(),
            config.server.public_base_url.clone(),
        ));
        let redirect = Arc::new(RedirectService::new(
            storage.clone(),
            recorder.clone(),
            config.analytics.hash_ips,
        ));

        Self {
            users: Arc::new(UserService::new(storage.clone())),
            jwt: Arc::new(JwtService::from_config(&config.auth)),
            country_header: config.analytics.country_header.clone(),
            started_at: Instant::now(),
            storage,
            links,
            analytics,
            redirect,
            recorder,
        }
    }
}
