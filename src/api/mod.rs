pub mod jwt;
pub mod middleware;
pub mod services;
mod state;

pub use state::AppState;
