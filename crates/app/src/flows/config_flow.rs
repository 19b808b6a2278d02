//! Setup wizard: creates a hub and its initial instruments.
//!
//! `user` asks for the hub name, then `add_sensor` collects instruments one
//! at a time until the user stops asking for more. Nothing is persisted
//! before the final submission.

use pockethub_domain::error::PocketError;
use pockethub_domain::flow::{
    AbortReason, FIELD_ISIN, FlowStep, FormError, HubNameForm, InstrumentForm, StepId, UserInput,
    add_sensor_schema, hub_name_schema,
};
use pockethub_domain::hub::Hub;
use pockethub_domain::instrument::TrackedInstrument;

use crate::ports::{IntegrationContext, QuoteSource};
use crate::validation::validate_isin;

/// State of one setup wizard.
#[derive(Debug, Clone)]
pub struct ConfigFlow {
    step: StepId,
    hub_name: Option<String>,
    instruments: Vec<TrackedInstrument>,
}

impl Default for ConfigFlow {
    fn default() -> Self {
        Self {
            step: StepId::User,
            hub_name: None,
            instruments: Vec::new(),
        }
    }
}

impl ConfigFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn step_id(&self) -> StepId {
        self.step
    }

    /// Instruments collected so far.
    #[must_use]
    pub fn instruments(&self) -> &[TrackedInstrument] {
        &self.instruments
    }

    /// The empty form of the current step.
    #[must_use]
    pub fn current_form(&self) -> FlowStep {
        match self.step {
            StepId::AddSensor => FlowStep::form(StepId::AddSensor, add_sensor_schema()),
            _ => FlowStep::form(StepId::User, hub_name_schema()),
        }
    }

    /// Feed one submission.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the context.
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
        match self.step {
            StepId::AddSensor => self.handle_add_sensor(input, ctx, quotes).await,
            _ => self.handle_user(input, ctx).await,
        }
    }

    async fn handle_user<C: IntegrationContext>(
        &mut self,
        input: &UserInput,
        ctx: &C,
    ) -> Result<FlowStep, PocketError> {
        let form = match HubNameForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Ok(self.current_form().with_errors(errors)),
        };

        if ctx.find_hub_by_name(&form.hub_name).await?.is_some() {
            tracing::info!(hub = %form.hub_name, "hub already exists, aborting setup");
            return Ok(FlowStep::Abort(AbortReason::HubAlreadyExists));
        }

        self.hub_name = Some(form.hub_name);
        self.instruments.clear();
        self.step = StepId::AddSensor;
        Ok(self.current_form())
    }

    async fn handle_add_sensor<C, Q>(
        &mut self,
        input: &UserInput,
        ctx: &C,
        quotes: &Q,
    ) -> Result<FlowStep, PocketError>
    where
        C: IntegrationContext,
        Q: QuoteSource + Sync,
    {
        let form = match InstrumentForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Ok(self.current_form().with_errors(errors)),
        };

        let isin = match validate_isin(&form.isin, quotes).await {
            Ok(isin) => isin,
            Err(err) => return Ok(self.current_form().with_error(FIELD_ISIN, err)),
        };
        if self.instruments.iter().any(|inst| inst.isin == isin) {
            return Ok(self
                .current_form()
                .with_error(FIELD_ISIN, FormError::IsinAlreadyExists));
        }

        let instrument = TrackedInstrument::new(isin, form.name, form.quantity)?;
        if form.add_more {
            self.instruments.push(instrument);
            return Ok(self.current_form());
        }

        // the collected list only grows once the hub is stored
        let mut instruments = self.instruments.clone();
        instruments.push(instrument);
        let step = self.create_entry(ctx, instruments.clone()).await?;
        self.instruments = instruments;
        Ok(step)
    }

    async fn create_entry<C: IntegrationContext>(
        &self,
        ctx: &C,
        instruments: Vec<TrackedInstrument>,
    ) -> Result<FlowStep, PocketError> {
        let title = self.hub_name.clone().unwrap_or_default();
        let hub = Hub::builder()
            .name(title.clone())
            .instruments(instruments)
            .build()?;

        let hub = match ctx.create_hub(hub).await {
            Ok(hub) => hub,
            Err(PocketError::Conflict(_)) => {
                return Ok(FlowStep::Abort(AbortReason::HubAlreadyExists));
            }
            Err(err) => return Err(err),
        };
        tracing::info!(hub = %hub.name, instruments = hub.instruments.len(), "setup finished");

        if let Err(err) = ctx.setup_hub(hub.id).await {
            tracing::error!(hub = %hub.name, error = %err, "hub created but not ready");
        }

        Ok(FlowStep::CreateEntry {
            title,
            hub_id: Some(hub.id),
        })
    }
}
