//! Flow manager: keeps in-progress wizards keyed by flow id.

use std::collections::HashMap;

use tokio::sync::Mutex;

use pockethub_domain::error::{NotFoundError, PocketError};
use pockethub_domain::flow::{FlowResult, FlowSummary, UserInput};
use pockethub_domain::id::{FlowId, HubId};

use crate::flows::{ConfigFlow, Flow, OptionsFlow};
use crate::ports::{IntegrationContext, QuoteSource};

/// Starts, advances and aborts wizards.
///
/// A flow is taken out of the map while a submission is processed, so two
/// concurrent submissions to the same flow never interleave: the second one
/// sees `NotFound`. Finished flows are dropped.
pub struct FlowService<C, Q> {
    ctx: C,
    quotes: Q,
    flows: Mutex<HashMap<FlowId, Flow>>,
}

impl<C, Q> FlowService<C, Q>
where
    C: IntegrationContext,
    Q: QuoteSource + Sync,
{
    pub fn new(ctx: C, quotes: Q) -> Self {
        Self {
            ctx,
            quotes,
            flows: Mutex::new(HashMap::new()),
        }
    }

    /// Open a setup wizard on its `user` step.
    pub async fn start_config_flow(&self) -> FlowResult {
        let flow = ConfigFlow::new();
        let step = flow.current_form();
        let flow = Flow::Config(flow);
        let flow_id = FlowId::new();
        let result = FlowResult::new(flow_id, flow.handler(), step);
        self.flows.lock().await.insert(flow_id, flow);
        tracing::debug!(%flow_id, "config flow started");
        result
    }

    /// Open an options wizard for an existing hub.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the hub does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn start_options_flow(&self, hub_id: HubId) -> Result<FlowResult, PocketError> {
        if self.ctx.get_hub(hub_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Hub",
                id: hub_id.to_string(),
            }
            .into());
        }
        let flow = Flow::Options(OptionsFlow::new(hub_id));
        let flow_id = FlowId::new();
        let result = FlowResult::new(flow_id, flow.handler(), OptionsFlow::init_form());
        self.flows.lock().await.insert(flow_id, flow);
        tracing::debug!(%flow_id, "options flow started");
        Ok(result)
    }

    /// Feed a submission to a running flow.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or finished flows. Storage errors from
    /// the wizard are propagated and the flow stays open.
    #[tracing::instrument(skip(self, input))]
    pub async fn progress(
        &self,
        flow_id: FlowId,
        input: &UserInput,
    ) -> Result<FlowResult, PocketError> {
        let mut flow = self.flows.lock().await.remove(&flow_id).ok_or_else(|| {
            PocketError::from(NotFoundError {
                entity: "Flow",
                id: flow_id.to_string(),
            })
        })?;

        let outcome = flow.handle(input, &self.ctx, &self.quotes).await;
        let handler = flow.handler();
        match outcome {
            Ok(step) if step.is_terminal() => {
                tracing::info!(%flow_id, %handler, "flow finished");
                Ok(FlowResult::new(flow_id, handler, step))
            }
            Ok(step) => {
                self.flows.lock().await.insert(flow_id, flow);
                Ok(FlowResult::new(flow_id, handler, step))
            }
            Err(err) => {
                tracing::error!(%flow_id, error = %err, "flow step failed");
                self.flows.lock().await.insert(flow_id, flow);
                Err(err)
            }
        }
    }

    /// Drop a running flow.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown flows.
    pub async fn abort(&self, flow_id: FlowId) -> Result<(), PocketError> {
        match self.flows.lock().await.remove(&flow_id) {
            Some(_) => {
                tracing::debug!(%flow_id, "flow aborted");
                Ok(())
            }
            None => Err(NotFoundError {
                entity: "Flow",
                id: flow_id.to_string(),
            }
            .into()),
        }
    }

    /// In-progress flows.
    pub async fn list_flows(&self) -> Vec<FlowSummary> {
        self.flows
            .lock()
            .await
            .iter()
            .map(|(flow_id, flow)| FlowSummary {
                flow_id: *flow_id,
                handler: flow.handler(),
                step_id: flow.step_id(),
            })
            .collect()
    }
}
