pub mod health;
pub mod interactions;

use axum::Router;

pub fn router() -> Router {
    Router::new()
        .merge(health::router())
        .merge(interactions::router())
}
