//! Setup and options wizards.
//!
//! Each wizard is a small state machine. It is fed one submission at a time
//! and answers with the next [`FlowStep`]. Wizards reach the rest of the
//! system only through [`IntegrationContext`] and [`QuoteSource`].

pub mod config_flow;
pub mod options_flow;

use pockethub_domain::error::PocketError;
use pockethub_domain::flow::{CONFIG_FLOW_HANDLER, FlowStep, StepId, UserInput};

use crate::ports::{IntegrationContext, QuoteSource};

pub use config_flow::ConfigFlow;
pub use options_flow::OptionsFlow;

/// Any in-progress wizard.
#[derive(Debug, Clone)]
pub enum Flow {
    Config(ConfigFlow),
    Options(OptionsFlow),
}

impl Flow {
    /// Handler reported with every result: the integration name for setup,
    /// the hub id for options.
    #[must_use]
    pub fn handler(&self) -> String {
        match self {
            Self::Config(_) => CONFIG_FLOW_HANDLER.to_string(),
            Self::Options(flow) => flow.hub_id().to_string(),
        }
    }

    #[must_use]
    pub fn step_id(&self) -> StepId {
        match self {
            Self::Config(flow) => flow.step_id(),
            Self::Options(flow) => flow.step_id(),
        }
    }

    /// Feed one submission to the wizard.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from the context. Form problems are not
    /// errors; they come back as a form with field errors.
    pub async fn handle<C, Q>(
        &mut self,
        input: &UserInput,
        ctx: &C,
        quotes: &Q,
    ) -> Result<FlowStep, PocketError>
    where
        C: IntegrationContext,
        Q: QuoteSource + Sync,
    {
        match self {
            Self::Config(flow) => flow.handle(input, ctx, quotes).await,
            Self::Options(flow) => flow.handle(input, ctx, quotes).await,
        }
    }
}
