//! JSON handlers driving the setup and options wizards.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use pockethub_app::ports::{EntityRepository, EventPublisher, HubRepository, QuoteSource};
use pockethub_domain::flow::{FlowResult, FlowSummary, UserInput};
use pockethub_domain::id::FlowId;

use crate::api::parse_id;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the flow step endpoints.
pub enum StepResponse {
    Ok(Json<FlowResult>),
}

impl IntoResponse for StepResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// `GET /api/flows`
pub async fn list<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
) -> Json<Vec<FlowSummary>>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    Json(state.flow_service.list_flows().await)
}

/// `POST /api/flows`: open a setup wizard.
pub async fn start<HR, ER, EP, QS>(State(state): State<AppState<HR, ER, EP, QS>>) -> StepResponse
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    StepResponse::Ok(Json(state.flow_service.start_config_flow().await))
}

/// `POST /api/flows/:flow_id`: submit the current step.
pub async fn progress<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(flow_id): Path<String>,
    Json(input): Json<UserInput>,
) -> Result<StepResponse, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let flow_id: FlowId = parse_id(&flow_id)?;
    let result = state.flow_service.progress(flow_id, &input).await?;
    Ok(StepResponse::Ok(Json(result)))
}

/// `DELETE /api/flows/:flow_id`
pub async fn abort<HR, ER, EP, QS>(
    State(state): State<AppState<HR, ER, EP, QS>>,
    Path(flow_id): Path<String>,
) -> Result<StatusCode, ApiError>
where
    HR: HubRepository + Send + Sync + 'static,
    ER: EntityRepository + Send + Sync + 'static,
    EP: EventPublisher + Send + Sync + 'static,
    QS: QuoteSource + Send + Sync + 'static,
{
    let flow_id: FlowId = parse_id(&flow_id)?;
    state.flow_service.abort(flow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
