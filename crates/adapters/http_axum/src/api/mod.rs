//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod entities;
#[allow(clippy::missing_errors_doc)]
pub mod flows;
#[allow(clippy::missing_errors_doc)]
pub mod hubs;
pub mod sse;

use std::str::FromStr;

use axum::Router;
use axum::routing::{get, post};

use pockethub_app::ports::{EntityRepository, EventPublisher, HubRepository, QuoteSource};

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<HR, ER, EP, QS>() -> Router<AppState<HR, ER, EP, QS>>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    Router::new()
        // Flows
        .route(
            "/flows",
            get(flows::list::<HR, ER, EP, QS>).post(flows::start::<HR, ER, EP, QS>),
        )
        .route(
            "/flows/{flow_id}",
            post(flows::progress::<HR, ER, EP, QS>).delete(flows::abort::<HR, ER, EP, QS>),
        )
        // Hubs
        .route("/hubs", get(hubs::list::<HR, ER, EP, QS>))
        .route(
            "/hubs/{id}",
            get(hubs::get::<HR, ER, EP, QS>).delete(hubs::delete::<HR, ER, EP, QS>),
        )
        .route("/hubs/{id}/reload", post(hubs::reload::<HR, ER, EP, QS>))
        .route(
            "/hubs/{id}/options",
            post(hubs::start_options::<HR, ER, EP, QS>),
        )
        // Entities
        .route("/entities", get(entities::list::<HR, ER, EP, QS>))
        .route("/entities/{id}", get(entities::get::<HR, ER, EP, QS>))
        .route(
            "/entities/{id}/refresh",
            post(entities::refresh::<HR, ER, EP, QS>),
        )
        // Events
        .route("/events/stream", get(sse::stream::<HR, ER, EP, QS>))
}

/// Parse an identifier taken from the request path.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, ApiError> {
    T::from_str(raw).map_err(|_| ApiError::invalid_id(raw))
}
