//! Declarative data-entry forms.
//!
//! A form is an ordered list of [`FieldDescriptor`]s. Interactive sessions
//! prompt for each field through `dialoguer`; script sessions (or commands
//! given `key=value` arguments) feed the same validators from the command
//! line, so both paths accept exactly the same input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Input, Select};

use crate::cli::core::{CommandError, ShellContext};
use crate::currency::{parse_currency_input, validate_amount, MAX_AMOUNT};

/// Field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How a field is prompted for: free text or a fixed list.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Text,
    Choice(Vec<String>),
}

type ValidatorCallback = dyn Fn(&str) -> Result<String, String> + Send + Sync;

/// Normalises raw input or explains why it is unacceptable.
#[derive(Clone)]
pub enum Validator {
    None,
    NonEmpty,
    MinLength(usize),
    /// Transaction amount: `0 < x <= MAX_AMOUNT`, currency symbols allowed.
    Amount,
    /// Opening balance: `0 <= x <= MAX_AMOUNT`.
    Balance,
    PositiveNumber,
    Range(i64, i64),
    Date,
    OneOf(Vec<String>),
    Custom(Arc<ValidatorCallback>),
}

impl Validator {
    pub fn validate(&self, input: &str) -> Result<String, ValidationError> {
        let trimmed = input.trim();
        match self {
            Validator::None => Ok(trimmed.to_string()),
            Validator::NonEmpty => {
                if trimmed.is_empty() {
                    Err(ValidationError::new("Value cannot be empty"))
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Validator::MinLength(min) => {
                if trimmed.chars().count() < *min {
                    Err(ValidationError::new(format!(
                        "Must be at least {min} characters"
                    )))
                } else {
                    Ok(trimmed.to_string())
                }
            }
            Validator::Amount => parse_currency_input(trimmed)
                .filter(|value| validate_amount(*value))
                .map(|value| value.to_string())
                .ok_or_else(|| ValidationError::new("Please enter a valid amount")),
            Validator::Balance => parse_currency_input(trimmed)
                .filter(|value| (0.0..=MAX_AMOUNT).contains(value))
                .map(|value| value.to_string())
                .ok_or_else(|| ValidationError::new("Please enter a valid initial balance")),
            Validator::PositiveNumber => parse_currency_input(trimmed)
                .filter(|value| *value > 0.0)
                .map(|value| value.to_string())
                .ok_or_else(|| ValidationError::new("Amount must be positive")),
            Validator::Range(min, max) => trimmed
                .parse::<i64>()
                .ok()
                .filter(|value| (*min..=*max).contains(value))
                .map(|value| value.to_string())
                .ok_or_else(|| {
                    ValidationError::new(format!("Enter a whole number between {min} and {max}"))
                }),
            Validator::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(|date| date.to_string())
                .map_err(|_| ValidationError::new("Use YYYY-MM-DD format")),
            Validator::OneOf(options) => options
                .iter()
                .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
                .cloned()
                .ok_or_else(|| {
                    ValidationError::new(format!("Value must be one of: {}", options.join(", ")))
                }),
            Validator::Custom(callback) => callback(trimmed).map_err(ValidationError::new),
        }
    }
}

/// Declarative description of a single form field.
#[derive(Clone)]
pub struct FieldDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub help: Option<&'static str>,
    pub validator: Validator,
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn new(key: &'static str, label: &'static str, kind: FieldKind, validator: Validator) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
            help: None,
            validator,
            default: None,
        }
    }

    pub fn text(key: &'static str, label: &'static str, validator: Validator) -> Self {
        Self::new(key, label, FieldKind::Text, validator)
    }

    pub fn choice(key: &'static str, label: &'static str, options: &[&str]) -> Self {
        let options: Vec<String> = options.iter().map(|option| option.to_string()).collect();
        Self::new(
            key,
            label,
            FieldKind::Choice(options.clone()),
            Validator::OneOf(options),
        )
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_help(mut self, help: &'static str) -> Self {
        self.help = Some(help);
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Validates one raw value. Blank input clears optional fields.
    fn accept(&self, raw: &str) -> Result<String, ValidationError> {
        if raw.trim().is_empty() || raw.trim() == "-" {
            return if self.required {
                Err(ValidationError::new(format!("{} is required", self.label)))
            } else {
                Ok(String::new())
            };
        }
        self.validator.validate(raw)
    }
}

/// Values collected by a form, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<&'static str, String>,
}

impl FormValues {
    /// Non-empty value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<&str, CommandError> {
        self.get(key)
            .ok_or_else(|| CommandError::InvalidArguments(format!("missing value for `{key}`")))
    }

    pub fn number(&self, key: &str) -> Result<f64, CommandError> {
        let raw = self.require(key)?;
        raw.parse::<f64>()
            .map_err(|_| CommandError::InvalidArguments(format!("`{key}` must be a number")))
    }

    pub fn date(&self, key: &str) -> Result<Option<NaiveDate>, CommandError> {
        self.get(key)
            .map(crate::cli::core::parse_date)
            .transpose()
    }

    pub fn owned(&self, key: &str) -> Option<String> {
        self.get(key).map(str::to_string)
    }
}

/// Initial values used when editing an existing record.
pub type Prefill = BTreeMap<&'static str, String>;

pub struct FormDescriptor {
    pub name: &'static str,
    pub fields: Vec<FieldDescriptor>,
}

impl FormDescriptor {
    pub fn new(name: &'static str, fields: Vec<FieldDescriptor>) -> Self {
        Self { name, fields }
    }

    /// Collects values interactively when possible, otherwise from `args`.
    pub fn run(
        &self,
        context: &ShellContext,
        args: &[&str],
        prefill: &Prefill,
    ) -> Result<FormValues, CommandError> {
        if args.is_empty() && context.is_interactive() {
            self.prompt(&context.theme, prefill)
        } else {
            self.from_args(args, prefill)
        }
    }

    /// Maps `key=value` arguments onto the form's fields.
    pub fn from_args(&self, args: &[&str], prefill: &Prefill) -> Result<FormValues, CommandError> {
        let mut provided: BTreeMap<String, String> = BTreeMap::new();
        for arg in args {
            let (key, value) = arg.split_once('=').ok_or_else(|| {
                CommandError::InvalidArguments(format!("expected key=value, got `{arg}`"))
            })?;
            let key = key.trim().to_ascii_lowercase();
            if !self.fields.iter().any(|field| field.key == key) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown field `{key}` for {} (expected {})",
                    self.name,
                    self.keys().join(", ")
                )));
            }
            provided.insert(key, value.to_string());
        }

        let mut values = FormValues::default();
        for field in &self.fields {
            let raw = provided
                .get(field.key)
                .cloned()
                .or_else(|| prefill.get(field.key).cloned())
                .or_else(|| field.default.clone())
                .unwrap_or_default();
            let accepted = field.accept(&raw).map_err(|err| {
                CommandError::InvalidArguments(format!("{}: {}", field.key, err))
            })?;
            values.values.insert(field.key, accepted);
        }
        Ok(values)
    }

    fn prompt(&self, theme: &ColorfulTheme, prefill: &Prefill) -> Result<FormValues, CommandError> {
        let mut values = FormValues::default();
        for field in &self.fields {
            let initial = prefill
                .get(field.key)
                .cloned()
                .or_else(|| field.default.clone())
                .unwrap_or_default();
            let label = match (field.required, field.help) {
                (true, Some(help)) => format!("{} ({help})", field.label),
                (false, Some(help)) => format!("{} ({help}, optional)", field.label),
                (false, None) => format!("{} (optional)", field.label),
                (true, None) => field.label.to_string(),
            };
            let accepted = match &field.kind {
                FieldKind::Choice(options) => {
                    let default = options
                        .iter()
                        .position(|option| option.eq_ignore_ascii_case(&initial))
                        .unwrap_or(0);
                    let index = Select::with_theme(theme)
                        .with_prompt(label)
                        .items(options)
                        .default(default)
                        .interact()?;
                    options[index].clone()
                }
                FieldKind::Text => {
                    let raw: String = Input::with_theme(theme)
                        .with_prompt(label)
                        .with_initial_text(initial)
                        .allow_empty(!field.required)
                        .validate_with(|input: &String| -> Result<(), String> {
                            field.accept(input).map(|_| ()).map_err(|err| err.message)
                        })
                        .interact_text()?;
                    field
                        .accept(&raw)
                        .map_err(|err| CommandError::InvalidArguments(err.message))?
                }
            };
            values.values.insert(field.key, accepted);
        }
        Ok(values)
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.fields.iter().map(|field| field.key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget_like_form() -> FormDescriptor {
        FormDescriptor::new(
            "budget",
            vec![
                FieldDescriptor::text("name", "Name", Validator::MinLength(2)),
                FieldDescriptor::text("amount", "Amount", Validator::PositiveNumber),
                FieldDescriptor::choice("period", "Period", &["daily", "weekly", "monthly"])
                    .with_default("monthly"),
                FieldDescriptor::text("alert", "Alert %", Validator::Range(10, 100))
                    .with_default("80"),
                FieldDescriptor::text("end", "End date", Validator::Date).optional(),
            ],
        )
    }

    #[test]
    fn args_fill_fields_and_defaults() {
        let values = budget_like_form()
            .from_args(&["name=Food", "amount=$1,250.50", "period=Weekly"], &Prefill::new())
            .unwrap();
        assert_eq!(values.get("name"), Some("Food"));
        assert_eq!(values.number("amount").unwrap(), 1250.5);
        assert_eq!(values.get("period"), Some("weekly"));
        assert_eq!(values.get("alert"), Some("80"));
        assert_eq!(values.get("end"), None);
    }

    #[test]
    fn validators_reject_bad_input() {
        let form = budget_like_form();
        assert!(form.from_args(&["name=F", "amount=10"], &Prefill::new()).is_err());
        assert!(form
            .from_args(&["name=Food", "amount=10", "alert=5"], &Prefill::new())
            .is_err());
        assert!(form
            .from_args(&["name=Food", "amount=10", "colour=red"], &Prefill::new())
            .is_err());
        assert!(form.from_args(&["name=Food"], &Prefill::new()).is_err());
    }

    #[test]
    fn prefill_is_kept_unless_overridden_or_cleared() {
        let mut prefill = Prefill::new();
        prefill.insert("name", "Groceries".into());
        prefill.insert("amount", "300".into());
        prefill.insert("end", "2024-12-31".into());
        let values = budget_like_form()
            .from_args(&["amount=350", "end="], &prefill)
            .unwrap();
        assert_eq!(values.get("name"), Some("Groceries"));
        assert_eq!(values.get("amount"), Some("350"));
        assert_eq!(values.get("end"), None);
    }

    #[test]
    fn amount_validator_enforces_bounds() {
        assert!(Validator::Amount.validate("0").is_err());
        assert!(Validator::Amount.validate("1000000").is_err());
        assert_eq!(Validator::Amount.validate("$12.50").unwrap(), "12.5");
        assert!(Validator::Balance.validate("0").is_ok());
    }

    #[test]
    fn choice_fields_prompt_from_their_options() {
        let field = FieldDescriptor::choice("period", "Period", &["weekly", "monthly"]);
        match &field.kind {
            FieldKind::Choice(options) => assert_eq!(options, &["weekly", "monthly"]),
            FieldKind::Text => panic!("choice field built as text"),
        }
        assert_eq!(field.accept("MONTHLY").unwrap(), "monthly");
        assert!(matches!(
            FieldDescriptor::text("name", "Name", Validator::NonEmpty).kind,
            FieldKind::Text
        ));
    }
}
