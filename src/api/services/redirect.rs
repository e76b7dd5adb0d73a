use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::debug;

use crate::api::AppState;
use crate::services::Visit;
use crate::utils::ip::{extract_client_ip, extract_country};

use super::helpers::error_from_condensr;
use super::types::RedirectQuery;

/// Header alternative to `?password=`
pub const LINK_PASSWORD_HEADER: &str = "X-Link-Password";

fn header_str(req: &HttpRequest, name: impl header::AsHeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(String::from)
}

/// 同步阶段只提取原始字符串，解析 UA 等计算交给 RedirectService
fn visit_from_request(req: &HttpRequest, query: RedirectQuery, country_header: &str) -> Visit {
    Visit {
        password: query
            .password
            .filter(|p| !p.is_empty())
            .or_else(|| header_str(req, LINK_PASSWORD_HEADER)),
        user_agent: header_str(req, header::USER_AGENT),
        referrer: header_str(req, header::REFERER),
        ip: extract_client_ip(req),
        country: extract_country(req.headers(), country_header),
    }
}

/// GET /{code}
pub async fn handle_redirect(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RedirectQuery>,
) -> HttpResponse {
    let code = path.into_inner();
    let visit = visit_from_request(&req, query.into_inner(), &state.country_header);

    match state.redirect.resolve(&code, visit).await {
        Ok(destination) => HttpResponse::Found()
            .insert_header((header::LOCATION, destination))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish(),
        Err(e) => {
            debug!("Redirect for '{}' refused: {}", code, e);
            error_from_condensr(&e)
        }
    }
}
