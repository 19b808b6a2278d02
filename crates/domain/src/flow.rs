//! Flow vocabulary: steps, form schemas, form errors and flow results shared
//! by the setup (config) and options wizards.
//!
//! A wizard answers every submission with a [`FlowStep`]: either another form
//! to fill in, a finished entry, or an abort. The flow registry wraps it into
//! a [`FlowResult`] carrying the flow id before it goes over the wire.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::{FlowId, HubId};
use crate::instrument::TrackedInstrument;
use crate::quantity::Quantity;

/// Handler name reported by config flows.
pub const CONFIG_FLOW_HANDLER: &str = "pockethub";

/// Error key for problems not tied to a single field.
pub const BASE_ERROR_KEY: &str = "base";

pub const FIELD_HUB_NAME: &str = "hub_name";
pub const FIELD_ISIN: &str = "isin";
pub const FIELD_NAME: &str = "name";
pub const FIELD_QUANTITY: &str = "quantity";
pub const FIELD_ADD_MORE: &str = "add_more_sensors";
pub const FIELD_ACTION: &str = "action";

/// Raw submission: a JSON object keyed by field name.
pub type UserInput = serde_json::Map<String, Value>;

/// Field errors keyed by field name (or [`BASE_ERROR_KEY`]).
pub type FormErrors = BTreeMap<String, FormError>;

/// Identifier of a wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    User,
    AddSensor,
    Init,
    EditQuantity,
    EditQuantityValue,
    DeleteSensor,
}

impl StepId {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::AddSensor => "add_sensor",
            Self::Init => "init",
            Self::EditQuantity => "edit_quantity",
            Self::EditQuantityValue => "edit_quantity_value",
            Self::DeleteSensor => "delete_sensor",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a select field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Input widget of a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Float {
        #[serde(skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
    },
    Boolean,
    Select { options: Vec<SelectOption> },
}

/// One field of a form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FormField {
    fn new(name: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
            default: None,
        }
    }

    #[must_use]
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldKind::String)
    }

    /// Non-negative float input.
    #[must_use]
    pub fn positive_float(name: &str) -> Self {
        Self::new(name, FieldKind::Float { min: Some(0.0) })
    }

    #[must_use]
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    #[must_use]
    pub fn select(name: &str, options: Vec<SelectOption>) -> Self {
        Self::new(name, FieldKind::Select { options })
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Error code attached to a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormError {
    InvalidIsin,
    IsinAlreadyExists,
    SensorNotFound,
    Required,
    InvalidQuantity,
    InvalidValue,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InvalidIsin => "invalid_isin",
            Self::IsinAlreadyExists => "isin_already_exists",
            Self::SensorNotFound => "sensor_not_found",
            Self::Required => "required",
            Self::InvalidQuantity => "invalid_quantity",
            Self::InvalidValue => "invalid_value",
        })
    }
}

/// Why a wizard gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    HubAlreadyExists,
    HubNotFound,
}

/// What a wizard answers to a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStep {
    Form {
        step_id: StepId,
        data_schema: Vec<FormField>,
        errors: FormErrors,
        description_placeholders: BTreeMap<String, String>,
    },
    /// The wizard finished. `hub_id` is set when a hub was created.
    CreateEntry { title: String, hub_id: Option<HubId> },
    Abort(AbortReason),
}

impl FlowStep {
    /// A form without errors or placeholders.
    #[must_use]
    pub fn form(step_id: StepId, data_schema: Vec<FormField>) -> Self {
        Self::Form {
            step_id,
            data_schema,
            errors: FormErrors::new(),
            description_placeholders: BTreeMap::new(),
        }
    }

    /// Attach errors to a form. No-op on other variants.
    #[must_use]
    pub fn with_errors(mut self, new_errors: FormErrors) -> Self {
        if let Self::Form { errors, .. } = &mut self {
            *errors = new_errors;
        }
        self
    }

    /// Attach a single error to a form.
    #[must_use]
    pub fn with_error(self, field: &str, error: FormError) -> Self {
        self.with_errors(FormErrors::from([(field.to_string(), error)]))
    }

    /// Attach a description placeholder to a form.
    #[must_use]
    pub fn with_placeholder(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Self::Form {
            description_placeholders,
            ..
        } = &mut self
        {
            description_placeholders.insert(key.to_string(), value.into());
        }
        self
    }

    /// Whether the flow is over after this step.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Form { .. })
    }
}

/// Wire representation of a flow step, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    Form {
        flow_id: FlowId,
        handler: String,
        step_id: StepId,
        data_schema: Vec<FormField>,
        errors: FormErrors,
        description_placeholders: BTreeMap<String, String>,
    },
    CreateEntry {
        flow_id: FlowId,
        handler: String,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        hub_id: Option<HubId>,
    },
    Abort {
        flow_id: FlowId,
        handler: String,
        reason: AbortReason,
    },
}

impl FlowResult {
    #[must_use]
    pub fn new(flow_id: FlowId, handler: impl Into<String>, step: FlowStep) -> Self {
        let handler = handler.into();
        match step {
            FlowStep::Form {
                step_id,
                data_schema,
                errors,
                description_placeholders,
            } => Self::Form {
                flow_id,
                handler,
                step_id,
                data_schema,
                errors,
                description_placeholders,
            },
            FlowStep::CreateEntry { title, hub_id } => Self::CreateEntry {
                flow_id,
                handler,
                title,
                hub_id,
            },
            FlowStep::Abort(reason) => Self::Abort {
                flow_id,
                handler,
                reason,
            },
        }
    }

    #[must_use]
    pub fn flow_id(&self) -> FlowId {
        match self {
            Self::Form { flow_id, .. }
            | Self::CreateEntry { flow_id, .. }
            | Self::Abort { flow_id, .. } => *flow_id,
        }
    }
}

/// An in-progress flow, as listed by the flow registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowSummary {
    pub flow_id: FlowId,
    pub handler: String,
    pub step_id: StepId,
}

// -- Schemas ------------------------------------------------------------------

/// `user` step of the config flow.
#[must_use]
pub fn hub_name_schema() -> Vec<FormField> {
    vec![FormField::string(FIELD_HUB_NAME).required()]
}

/// `add_sensor` step, shared by both wizards.
#[must_use]
pub fn add_sensor_schema() -> Vec<FormField> {
    vec![
        FormField::string(FIELD_ISIN).required(),
        FormField::string(FIELD_NAME).required(),
        FormField::positive_float(FIELD_QUANTITY).with_default(0.0),
        FormField::boolean(FIELD_ADD_MORE).with_default(false),
    ]
}

/// `init` step of the options flow.
#[must_use]
pub fn action_schema() -> Vec<FormField> {
    let options = OptionsAction::ALL
        .iter()
        .map(|action| SelectOption {
            value: action.as_str().to_string(),
            label: action.label().to_string(),
        })
        .collect();
    vec![FormField::select(FIELD_ACTION, options).required()]
}

/// Instrument picker, options ordered by name ignoring case.
#[must_use]
pub fn select_instrument_schema(instruments: &[&TrackedInstrument]) -> Vec<FormField> {
    let mut options: Vec<SelectOption> = instruments
        .iter()
        .map(|inst| SelectOption {
            value: inst.isin.to_string(),
            label: inst.name.clone(),
        })
        .collect();
    options.sort_by_key(|opt| opt.label.to_lowercase());
    vec![FormField::select(FIELD_ISIN, options).required()]
}

/// `edit_quantity_value` step, prefilled with the current quantity.
#[must_use]
pub fn quantity_schema(current: Quantity) -> Vec<FormField> {
    let default = serde_json::to_value(current).unwrap_or(Value::Null);
    vec![
        FormField::positive_float(FIELD_QUANTITY)
            .required()
            .with_default(default),
    ]
}

// -- Parsed forms -------------------------------------------------------------

/// Submission of the `user` step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubNameForm {
    pub hub_name: String,
}

impl HubNameForm {
    /// # Errors
    ///
    /// Returns the per-field errors when the submission is unusable.
    pub fn parse(input: &UserInput) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();
        let hub_name = required_string(input, FIELD_HUB_NAME, &mut errors);
        match hub_name {
            Some(hub_name) if errors.is_empty() => Ok(Self { hub_name }),
            _ => Err(errors),
        }
    }
}

/// Submission of the `add_sensor` step.
///
/// The ISIN is kept raw: validating it needs the quote source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentForm {
    pub isin: String,
    pub name: String,
    pub quantity: Quantity,
    pub add_more: bool,
}

impl InstrumentForm {
    /// # Errors
    ///
    /// Returns the per-field errors when the submission is unusable.
    pub fn parse(input: &UserInput) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();
        let isin = required_string(input, FIELD_ISIN, &mut errors);
        let name = required_string(input, FIELD_NAME, &mut errors);

        let quantity = match input.get(FIELD_QUANTITY) {
            None | Some(Value::Null) => Some(Quantity::ZERO),
            Some(raw) => parse_quantity(raw)
                .map_err(|err| errors.insert(FIELD_QUANTITY.to_string(), err))
                .ok(),
        };

        let add_more = match input.get(FIELD_ADD_MORE) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(flag)) => *flag,
            Some(_) => {
                errors.insert(FIELD_ADD_MORE.to_string(), FormError::InvalidValue);
                false
            }
        };

        match (isin, name, quantity) {
            (Some(isin), Some(name), Some(quantity)) if errors.is_empty() => Ok(Self {
                isin,
                name,
                quantity,
                add_more,
            }),
            _ => Err(errors),
        }
    }
}

/// Choice offered by the options flow `init` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionsAction {
    AddStock,
    EditQuantity,
    DeleteStock,
}

impl OptionsAction {
    pub const ALL: [Self; 3] = [Self::AddStock, Self::EditQuantity, Self::DeleteStock];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddStock => "add_stock",
            Self::EditQuantity => "edit_quantity",
            Self::DeleteStock => "delete_stock",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::AddStock => "Add a new stock",
            Self::EditQuantity => "Change stock quantity",
            Self::DeleteStock => "Delete a stock",
        }
    }
}

impl FromStr for OptionsAction {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(FormError::InvalidValue)
    }
}

/// Submission of the options flow `init` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionForm {
    pub action: OptionsAction,
}

impl ActionForm {
    /// # Errors
    ///
    /// Returns `required` for a missing action and `invalid_value` for an
    /// unknown one.
    pub fn parse(input: &UserInput) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();
        let Some(raw) = required_string(input, FIELD_ACTION, &mut errors) else {
            return Err(errors);
        };
        raw.parse()
            .map(|action| Self { action })
            .map_err(|err| FormErrors::from([(FIELD_ACTION.to_string(), err)]))
    }
}

/// Submission of an instrument picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectInstrumentForm {
    /// Upper-cased, trimmed selection.
    pub isin: String,
}

impl SelectInstrumentForm {
    /// # Errors
    ///
    /// Returns `required` when nothing was selected.
    pub fn parse(input: &UserInput) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();
        required_string(input, FIELD_ISIN, &mut errors)
            .map(|isin| Self {
                isin: isin.to_ascii_uppercase(),
            })
            .ok_or(errors)
    }
}

/// Submission of the `edit_quantity_value` step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityForm {
    pub quantity: Quantity,
}

impl QuantityForm {
    /// # Errors
    ///
    /// Returns `required` for a missing value and `invalid_quantity` for a
    /// negative or non-numeric one.
    pub fn parse(input: &UserInput) -> Result<Self, FormErrors> {
        let field_error = |err: FormError| -> Result<Self, FormErrors> {
            Err(FormErrors::from([(FIELD_QUANTITY.to_string(), err)]))
        };
        match input.get(FIELD_QUANTITY) {
            None | Some(Value::Null) => field_error(FormError::Required),
            Some(raw) => match parse_quantity(raw) {
                Ok(quantity) => Ok(Self { quantity }),
                Err(err) => field_error(err),
            },
        }
    }
}

fn required_string(input: &UserInput, key: &str, errors: &mut FormErrors) -> Option<String> {
    match input.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        None | Some(Value::Null | Value::String(_)) => {
            errors.insert(key.to_string(), FormError::Required);
            None
        }
        Some(_) => {
            errors.insert(key.to_string(), FormError::InvalidValue);
            None
        }
    }
}

/// Numbers and numeric strings are accepted; anything else or a negative
/// value is `invalid_quantity`.
fn parse_quantity(raw: &Value) -> Result<Quantity, FormError> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .ok_or(FormError::InvalidQuantity)
            .and_then(|f| Quantity::from_f64(f).map_err(|_| FormError::InvalidQuantity)),
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|_| FormError::InvalidQuantity)
            .and_then(|d| Quantity::new(d).map_err(|_| FormError::InvalidQuantity)),
        _ => Err(FormError::InvalidQuantity),
    }
}
