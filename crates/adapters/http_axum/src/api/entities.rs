//! JSON handlers for price sensors.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use pockethub_app::ports::{EntityRepository, EventPublisher, HubRepository, QuoteSource};
use pockethub_domain::entity::Entity;
use pockethub_domain::id::{EntityId, HubId};

use crate::api::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub hub_id: Option<String>,
}

/// `GET /api/entities[?hub_id=…]`
pub async fn list<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Entity>>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let entities = match query.hub_id.as_deref() {
        Some(raw) => {
            let hub_id: HubId = parse_id(raw)?;
            state.entity_service.list_by_hub(hub_id).await?
        }
        None => state.entity_service.list_entities().await?,
    };
    Ok(Json(entities))
}

/// `GET /api/entities/:id`
pub async fn get<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<Json<Entity>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: EntityId = parse_id(&id)?;
    Ok(Json(state.entity_service.get_entity(id).await?))
}

/// `POST /api/entities/:id/refresh`: fetch a fresh quote right away.
pub async fn refresh<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(id): Path<String>,
) -> Result<Json<Entity>, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let id: EntityId = parse_id(&id)?;
    Ok(Json(state.refresh_service.refresh_by_id(id).await?))
}
