//! Options wizard: add, re-weight or delete instruments of an existing hub.
//!
//! ```text
//! init ─┬─ add_stock ──────► add_sensor ─(add more)─► add_sensor …
//!       ├─ edit_quantity ──► edit_quantity ─► edit_quantity_value
//!       └─ delete_stock ───► delete_sensor
//! ```
//!
//! Every change is persisted right away. The hub is reloaded once the
//! wizard finishes so its sensors reflect the new instrument list.

use pockethub_domain::error::PocketError;
use pockethub_domain::flow::{
    AbortReason, ActionForm, BASE_ERROR_KEY, FIELD_ISIN, FlowStep, FormError, InstrumentForm,
    OptionsAction, QuantityForm, SelectInstrumentForm, StepId, UserInput, action_schema,
    add_sensor_schema, quantity_schema, select_instrument_schema,
};
use pockethub_domain::hub::Hub;
use pockethub_domain::id::HubId;
use pockethub_domain::instrument::TrackedInstrument;

use crate::ports::{IntegrationContext, QuoteSource};
use crate::validation::validate_isin;

/// Placeholder shown with instrument pickers and the quantity form.
pub const SELECTED_STOCK_PLACEHOLDER: &str = "selected_stock";

/// State of one options wizard.
#[derive(Debug, Clone)]
pub struct OptionsFlow {
    hub_id: HubId,
    step: StepId,
    selected_isin: Option<String>,
}

impl OptionsFlow {
    #[must_use]
    pub fn new(hub_id: HubId) -> Self {
        Self {
            hub_id,
            step: StepId::Init,
            selected_isin: None,
        }
    }

    #[must_use]
    pub fn hub_id(&self) -> HubId {
        self.hub_id
    }

    #[must_use]
    pub fn step_id(&self) -> StepId {
        self.step
    }

    /// The `init` form offered when the wizard opens.
    #[must_use]
    pub fn init_form() -> FlowStep {
        FlowStep::form(StepId::Init, action_schema())
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
        let Some(hub) = ctx.get_hub(self.hub_id).await? else {
            tracing::warn!(hub_id = %self.hub_id, "hub disappeared while its options were open");
            return Ok(FlowStep::Abort(AbortReason::HubNotFound));
        };

        match self.step {
            StepId::AddSensor => self.handle_add_sensor(hub, input, ctx, quotes).await,
            StepId::EditQuantity => Ok(self.handle_select_for_edit(&hub, input)),
            StepId::EditQuantityValue => self.handle_quantity(hub, input, ctx).await,
            StepId::DeleteSensor => self.handle_delete(hub, input, ctx).await,
            StepId::Init | StepId::User => Ok(self.handle_init(&hub, input)),
        }
    }

    fn handle_init(&mut self, hub: &Hub, input: &UserInput) -> FlowStep {
        let form = match ActionForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Self::init_form().with_errors(errors),
        };
        match form.action {
            OptionsAction::AddStock => {
                self.step = StepId::AddSensor;
                FlowStep::form(StepId::AddSensor, add_sensor_schema())
            }
            OptionsAction::EditQuantity => {
                self.step = StepId::EditQuantity;
                edit_select_form(hub)
            }
            OptionsAction::DeleteStock => {
                self.step = StepId::DeleteSensor;
                delete_select_form(hub)
            }
        }
    }

    async fn handle_add_sensor<C, Q>(
        &mut self,
        mut hub: Hub,
        input: &UserInput,
        ctx: &C,
        quotes: &Q,
    ) -> Result<FlowStep, PocketError>
    where
        C: IntegrationContext,
        Q: QuoteSource + Sync,
    {
        let form_step = || FlowStep::form(StepId::AddSensor, add_sensor_schema());
        let form = match InstrumentForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Ok(form_step().with_errors(errors)),
        };

        let isin = match validate_isin(&form.isin, quotes).await {
            Ok(isin) => isin,
            Err(err) => return Ok(form_step().with_error(FIELD_ISIN, err)),
        };
        if hub.contains(&isin) {
            return Ok(form_step().with_error(FIELD_ISIN, FormError::IsinAlreadyExists));
        }

        hub.add_instrument(TrackedInstrument::new(isin, form.name, form.quantity)?)?;
        let hub = ctx.update_hub(hub).await?;
        tracing::info!(hub = %hub.name, instruments = hub.instruments.len(), "instrument added");

        if form.add_more {
            return Ok(form_step());
        }
        self.finish(ctx).await
    }

    fn handle_select_for_edit(&mut self, hub: &Hub, input: &UserInput) -> FlowStep {
        let form = match SelectInstrumentForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return edit_select_form(hub).with_errors(errors),
        };
        self.selected_isin = Some(form.isin);
        self.step = StepId::EditQuantityValue;
        self.quantity_form(hub)
    }

    /// Quantity form for the selected instrument, or back to the picker
    /// when it is gone.
    fn quantity_form(&mut self, hub: &Hub) -> FlowStep {
        match self.selected(hub) {
            Some(inst) => FlowStep::form(StepId::EditQuantityValue, quantity_schema(inst.quantity))
                .with_placeholder(SELECTED_STOCK_PLACEHOLDER, describe(inst)),
            None => {
                self.step = StepId::EditQuantity;
                self.selected_isin = None;
                edit_select_form(hub)
            }
        }
    }

    async fn handle_quantity<C: IntegrationContext>(
        &mut self,
        mut hub: Hub,
        input: &UserInput,
        ctx: &C,
    ) -> Result<FlowStep, PocketError> {
        let Some(isin) = self.selected(&hub).map(|inst| inst.isin.clone()) else {
            return Ok(self.quantity_form(&hub));
        };
        let form = match QuantityForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Ok(self.quantity_form(&hub).with_errors(errors)),
        };

        hub.set_quantity(&isin, form.quantity)?;
        ctx.update_hub(hub).await?;
        tracing::info!(%isin, quantity = %form.quantity, "quantity updated");
        self.finish(ctx).await
    }

    async fn handle_delete<C: IntegrationContext>(
        &mut self,
        mut hub: Hub,
        input: &UserInput,
        ctx: &C,
    ) -> Result<FlowStep, PocketError> {
        let form = match SelectInstrumentForm::parse(input) {
            Ok(form) => form,
            Err(errors) => return Ok(delete_select_form(&hub).with_errors(errors)),
        };
        let Some(inst) = find_instrument(&hub, &form.isin).cloned() else {
            tracing::warn!(isin = %form.isin, "selected instrument not found");
            return Ok(delete_select_form(&hub).with_error(BASE_ERROR_KEY, FormError::SensorNotFound));
        };

        hub.remove_instrument(&inst.isin)?;
        let hub = ctx.update_hub(hub).await?;
        let unique_id = inst.unique_id();
        if ctx.remove_entity(hub.id, &unique_id).await?.is_none() {
            tracing::warn!(%unique_id, "no sensor registered for removed instrument");
        }
        tracing::info!(hub = %hub.name, isin = %inst.isin, "instrument deleted");
        self.finish(ctx).await
    }

    async fn finish<C: IntegrationContext>(&self, ctx: &C) -> Result<FlowStep, PocketError> {
        ctx.reload_hub(self.hub_id).await?;
        Ok(FlowStep::CreateEntry {
            title: String::new(),
            hub_id: None,
        })
    }

    fn selected<'h>(&self, hub: &'h Hub) -> Option<&'h TrackedInstrument> {
        self.selected_isin
            .as_deref()
            .and_then(|isin| find_instrument(hub, isin))
    }
}

fn find_instrument<'h>(hub: &'h Hub, isin: &str) -> Option<&'h TrackedInstrument> {
    hub.instruments.iter().find(|inst| inst.unique_id() == isin)
}

fn describe(inst: &TrackedInstrument) -> String {
    format!("{} (ISIN: {})", inst.name, inst.isin)
}

fn edit_select_form(hub: &Hub) -> FlowStep {
    FlowStep::form(
        StepId::EditQuantity,
        select_instrument_schema(&hub.instruments_sorted_by_name()),
    )
}

fn delete_select_form(hub: &Hub) -> FlowStep {
    FlowStep::form(
        StepId::DeleteSensor,
        select_instrument_schema(&hub.instruments_sorted_by_name()),
    )
    .with_placeholder(SELECTED_STOCK_PLACEHOLDER, "Choose a stock from the list.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::HubRepository;
    use crate::test_support::{FakeContext, FakeQuoteSource, share_payload};
    use pockethub_domain::flow::{FIELD_ACTION, FieldKind, FormErrors};
    use pockethub_domain::isin::Isin;
    use pockethub_domain::quantity::Quantity;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    const APPLE: &str = "US0378331005";
    const DEUTSCHE: &str = "DE0005140008";
    const ISHARES: &str = "IE00B4L5Y983";

    fn input(value: Value) -> UserInput {
        value.as_object().cloned().unwrap()
    }

    fn quotes() -> FakeQuoteSource {
        FakeQuoteSource::default()
            .with_payload(APPLE, share_payload(json!(100)))
            .with_payload(DEUTSCHE, share_payload(json!(10)))
            .with_payload(ISHARES, share_payload(json!(80)))
    }

    fn instrument(isin: &str, name: &str, qty: rust_decimal::Decimal) -> TrackedInstrument {
        TrackedInstrument::new(Isin::parse(isin).unwrap(), name, Quantity::new(qty).unwrap())
            .unwrap()
    }

    async fn depot(ctx: &FakeContext) -> Hub {
        ctx.insert_hub(
            Hub::builder()
                .name("Depot")
                .instrument(instrument(DEUTSCHE, "deutsche bank", dec!(10)))
                .instrument(instrument(APPLE, "Apple", dec!(2)))
                .build()
                .unwrap(),
        )
        .await
    }

    fn errors_of(step: &FlowStep) -> &FormErrors {
        match step {
            FlowStep::Form { errors, .. } => errors,
            other => panic!("expected a form, got {other:?}"),
        }
    }

    fn finished() -> FlowStep {
        FlowStep::CreateEntry {
            title: String::new(),
            hub_id: None,
        }
    }

    async fn choose(
        flow: &mut OptionsFlow,
        action: &str,
        ctx: &FakeContext,
        quotes: &FakeQuoteSource,
    ) -> FlowStep {
        flow.handle(&input(json!({"action": action})), ctx, quotes)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn should_reject_unknown_action() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);

        let step = choose(&mut flow, "sell_everything", &ctx, &quotes).await;

        assert_eq!(errors_of(&step)[FIELD_ACTION], FormError::InvalidValue);
        assert_eq!(flow.step_id(), StepId::Init);
    }

    #[tokio::test]
    async fn should_add_instrument_and_reload_hub() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "add_stock", &ctx, &quotes).await;

        let step = flow
            .handle(
                &input(json!({"isin": ISHARES, "name": "MSCI World", "quantity": 3.333})),
                &ctx,
                &quotes,
            )
            .await
            .unwrap();

        assert_eq!(step, finished());
        let stored = ctx.hub(hub.id).await;
        assert_eq!(stored.instruments.len(), 3);
        let added = stored.instruments.iter().find(|i| i.name == "MSCI World").unwrap();
        assert_eq!(added.quantity.value(), dec!(3.33));
        assert_eq!(ctx.reloads(), [hub.id]);
    }

    #[tokio::test]
    async fn should_persist_each_instrument_when_adding_more() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "add_stock", &ctx, &quotes).await;

        let step = flow
            .handle(
                &input(json!({"isin": ISHARES, "name": "MSCI World", "add_more_sensors": true})),
                &ctx,
                &quotes,
            )
            .await
            .unwrap();

        assert!(errors_of(&step).is_empty());
        assert_eq!(ctx.hub(hub.id).await.instruments.len(), 3);
        assert!(ctx.reloads().is_empty());
    }

    #[tokio::test]
    async fn should_reject_isin_already_in_hub() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "add_stock", &ctx, &quotes).await;

        let step = flow
            .handle(&input(json!({"isin": APPLE, "name": "Apple"})), &ctx, &quotes)
            .await
            .unwrap();

        assert_eq!(errors_of(&step)[FIELD_ISIN], FormError::IsinAlreadyExists);
    }

    #[tokio::test]
    async fn should_offer_instruments_sorted_by_name_for_editing() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);

        let step = choose(&mut flow, "edit_quantity", &ctx, &quotes).await;

        let FlowStep::Form {
            step_id: StepId::EditQuantity,
            data_schema,
            ..
        } = step
        else {
            panic!("expected the picker, got {step:?}");
        };
        let FieldKind::Select { options } = &data_schema[0].kind else {
            panic!("expected a select field");
        };
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, ["Apple", "deutsche bank"]);
    }

    #[tokio::test]
    async fn should_edit_quantity_of_selected_instrument() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "edit_quantity", &ctx, &quotes).await;

        let step = flow
            .handle(&input(json!({"isin": APPLE})), &ctx, &quotes)
            .await
            .unwrap();
        let FlowStep::Form {
            step_id: StepId::EditQuantityValue,
            data_schema,
            description_placeholders,
            ..
        } = &step
        else {
            panic!("expected the quantity form, got {step:?}");
        };
        assert_eq!(data_schema[0].default, Some(json!(2.0)));
        assert_eq!(
            description_placeholders[SELECTED_STOCK_PLACEHOLDER],
            "Apple (ISIN: US0378331005)"
        );

        let step = flow
            .handle(&input(json!({"quantity": 7.125})), &ctx, &quotes)
            .await
            .unwrap();

        assert_eq!(step, finished());
        let stored = ctx.hub(hub.id).await;
        let apple = stored.instrument(&Isin::parse(APPLE).unwrap()).unwrap();
        assert_eq!(apple.quantity.value(), dec!(7.12));
        assert_eq!(ctx.reloads(), [hub.id]);
    }

    #[tokio::test]
    async fn should_go_back_to_picker_when_selected_instrument_vanished() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "edit_quantity", &ctx, &quotes).await;
        flow.handle(&input(json!({"isin": APPLE})), &ctx, &quotes)
            .await
            .unwrap();

        let mut stored = ctx.hub(hub.id).await;
        stored
            .remove_instrument(&Isin::parse(APPLE).unwrap())
            .unwrap();
        ctx.hubs.update(stored).await.unwrap();

        let step = flow
            .handle(&input(json!({"quantity": 1})), &ctx, &quotes)
            .await
            .unwrap();

        assert!(matches!(
            step,
            FlowStep::Form {
                step_id: StepId::EditQuantity,
                ..
            }
        ));
        assert_eq!(flow.step_id(), StepId::EditQuantity);
    }

    #[tokio::test]
    async fn should_delete_instrument_and_its_sensor() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "delete_stock", &ctx, &quotes).await;

        let step = flow
            .handle(&input(json!({"isin": DEUTSCHE})), &ctx, &quotes)
            .await
            .unwrap();

        assert_eq!(step, finished());
        assert_eq!(ctx.hub(hub.id).await.instruments.len(), 1);
        assert_eq!(ctx.removed(), [(hub.id, DEUTSCHE.to_string())]);
        assert_eq!(ctx.reloads(), [hub.id]);
    }

    #[tokio::test]
    async fn should_report_unknown_instrument_on_delete() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let hub = depot(&ctx).await;
        let mut flow = OptionsFlow::new(hub.id);
        choose(&mut flow, "delete_stock", &ctx, &quotes).await;

        let step = flow
            .handle(&input(json!({"isin": ISHARES})), &ctx, &quotes)
            .await
            .unwrap();

        assert_eq!(errors_of(&step)[BASE_ERROR_KEY], FormError::SensorNotFound);
        assert_eq!(ctx.hub(hub.id).await.instruments.len(), 2);
        assert!(ctx.removed().is_empty());
    }

    #[tokio::test]
    async fn should_abort_when_hub_was_deleted() {
        let (ctx, quotes) = (FakeContext::default(), quotes());
        let mut flow = OptionsFlow::new(HubId::new());

        let step = choose(&mut flow, "add_stock", &ctx, &quotes).await;

        assert_eq!(step, FlowStep::Abort(AbortReason::HubNotFound));
    }
}
