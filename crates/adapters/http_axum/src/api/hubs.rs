//! JSON handlers for hubs.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pockethub_app::ports::{EntityRepository, EventPublisher, HubRepository, QuoteSource};
use pockethub_domain::entity::Entity;
use pockethub_domain::flow::FlowResult;
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;

use crate::api::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// A hub together with its runtime status.
#[derive(Debug, Serialize)]
pub struct HubView {
    #[serde(flatten)]
    pub hub: Hub,
    /// Whether the hub's sensors are currently polled.
    pub loaded: bool,
}

/// Possible responses from the get endpoint.
pub enum GetResponse {
    Ok(Json<HubView>),
}

impl IntoResponse for GetResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/hubs`
pub async fn list<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
) -> Result<Json<Vec<HubView>>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let hubs = state.hub_service.list_hubs().await?;
    let mut views = Vec::with_capacity(hubs.len());
    for hub in hubs {
        let loaded = state.hub_service.is_loaded(hub.id).await;
        views.push(HubView { hub, loaded });
    }
    Ok(Json(views))
}

/// `GET /api/hubs/:id`
pub async fn get<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<GetResponse, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: HubId = parse_id(&id)?;
    let hub = state.hub_service.get_hub(id).await?;
    let loaded = state.hub_service.is_loaded(id).await;
    Ok(GetResponse::Ok(Json(HubView { hub, loaded })))
}

/// `DELETE /api/hubs/:id`: remove the hub and its sensors.
pub async fn delete<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: HubId = parse_id(&id)?;
    state.hub_service.remove_hub(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/hubs/:id/reload`: returns the hub's sensors after setup.
pub async fn reload<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Entity>>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: HubId = parse_id(&id)?;
    Ok(Json(state.hub_service.reload_hub(id).await?))
}

/// `POST /api/hubs/:id/options`: open an options wizard.
pub async fn start_options<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<Json<FlowResult>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: HubId = parse_id(&id)?;
    Ok(Json(state.flow_service.start_options_flow(id).await?))
}
