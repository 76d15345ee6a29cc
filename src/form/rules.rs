// Validation rules and rule sets.
// Declarative per-field rules, their built-in checks and loading from JSON tables.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{PortfolioError, Result};

use super::host::Control;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Spanish mobile/landline: optional +34/0034/34 prefix, then 9 digits starting 6-9.
static PHONE_ES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+34|0034|34)?[6-9]\d{8}$").expect("valid phone regex"));

/// E.164-like international number.
static PHONE_INTL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{6,14}$").expect("valid phone regex"));

static PHONE_SEPARATORS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-().]").expect("valid separator regex"));

/// Semantic value of a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
    Multiple(Vec<String>),
}

impl FieldValue {
    /// Extract the value a rule sees from a control.
    pub fn from_control(control: &Control) -> Self {
        match control {
            Control::Input { value } => FieldValue::Text(value.clone()),
            Control::Checkbox { checked, .. } => FieldValue::Checked(*checked),
            Control::RadioGroup { options } => FieldValue::Text(
                options
                    .iter()
                    .find(|o| o.selected)
                    .map(|o| o.value.clone())
                    .unwrap_or_default(),
            ),
            Control::SelectMultiple { options } => FieldValue::Multiple(
                options
                    .iter()
                    .filter(|o| o.selected)
                    .map(|o| o.value.clone())
                    .collect(),
            ),
        }
    }

    /// Whether the value counts as absent.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.is_empty(),
            FieldValue::Checked(checked) => !checked,
            FieldValue::Multiple(values) => values.is_empty(),
        }
    }

    /// String form used by text-based rules.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Checked(checked) => checked.to_string(),
            FieldValue::Multiple(values) => values.join(","),
        }
    }

    fn length(&self) -> usize {
        match self {
            FieldValue::Multiple(values) => values.len(),
            other => other.as_text().chars().count(),
        }
    }

    fn as_number(&self) -> Option<f64> {
        self.as_text()
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
    }
}

/// Predicate for custom rules.
pub type CustomCheck = Arc<dyn Fn(&FieldValue, &Control) -> bool + Send + Sync>;

/// The check a rule performs.
#[derive(Clone)]
pub enum RuleKind {
    Required,
    Email,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    Phone,
    Url,
    Number,
    Min(f64),
    Max(f64),
    /// Must equal the live value of the named field.
    Match(String),
    Custom(CustomCheck),
    /// A rule type name nobody recognizes. Always passes.
    Unknown(String),
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleKind::Required => write!(f, "Required"),
            RuleKind::Email => write!(f, "Email"),
            RuleKind::MinLength(n) => write!(f, "MinLength({})", n),
            RuleKind::MaxLength(n) => write!(f, "MaxLength({})", n),
            RuleKind::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            RuleKind::Phone => write!(f, "Phone"),
            RuleKind::Url => write!(f, "Url"),
            RuleKind::Number => write!(f, "Number"),
            RuleKind::Min(x) => write!(f, "Min({})", x),
            RuleKind::Max(x) => write!(f, "Max({})", x),
            RuleKind::Match(field) => write!(f, "Match({})", field),
            RuleKind::Custom(_) => write!(f, "Custom(..)"),
            RuleKind::Unknown(name) => write!(f, "Unknown({})", name),
        }
    }
}

/// A single validation rule with an optional custom message.
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub message: Option<String>,
}

impl Rule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub fn email() -> Self {
        Self::new(RuleKind::Email)
    }

    pub fn min_length(length: usize) -> Self {
        Self::new(RuleKind::MinLength(length))
    }

    pub fn max_length(length: usize) -> Self {
        Self::new(RuleKind::MaxLength(length))
    }

    pub fn pattern(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| {
            PortfolioError::InvalidArgument(format!("invalid pattern '{}': {}", pattern, e))
        })?;
        Ok(Self::new(RuleKind::Pattern(regex)))
    }

    pub fn phone() -> Self {
        Self::new(RuleKind::Phone)
    }

    pub fn url() -> Self {
        Self::new(RuleKind::Url)
    }

    pub fn number() -> Self {
        Self::new(RuleKind::Number)
    }

    pub fn min(bound: f64) -> Self {
        Self::new(RuleKind::Min(bound))
    }

    pub fn max(bound: f64) -> Self {
        Self::new(RuleKind::Max(bound))
    }

    pub fn matches(field: impl Into<String>) -> Self {
        Self::new(RuleKind::Match(field.into()))
    }

    pub fn custom<F>(check: F) -> Self
    where
        F: Fn(&FieldValue, &Control) -> bool + Send + Sync + 'static,
    {
        Self::new(RuleKind::Custom(Arc::new(check)))
    }

    /// Override the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// The message reported when this rule fails.
    pub fn message(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match &self.kind {
            RuleKind::Required => "This field is required".to_string(),
            RuleKind::Email => "Please enter a valid email address".to_string(),
            RuleKind::MinLength(n) => format!("Must be at least {} characters", n),
            RuleKind::MaxLength(n) => format!("Must be at most {} characters", n),
            RuleKind::Pattern(_) => "Invalid format".to_string(),
            RuleKind::Phone => "Please enter a valid phone number".to_string(),
            RuleKind::Url => "Please enter a valid URL".to_string(),
            RuleKind::Number => "Please enter a valid number".to_string(),
            RuleKind::Min(x) => format!("Must be at least {}", x),
            RuleKind::Max(x) => format!("Must be at most {}", x),
            RuleKind::Match(field) => format!("Must match {}", field),
            RuleKind::Custom(_) | RuleKind::Unknown(_) => "Invalid value".to_string(),
        }
    }

    /// Evaluate the rule. `lookup` resolves the live value of another field.
    ///
    /// Only `Required` rejects an empty value; structural rules pass on empty.
    /// `Required` looks at the text form, so an unchecked checkbox (`"false"`)
    /// passes it.
    pub fn check(
        &self,
        value: &FieldValue,
        control: &Control,
        lookup: impl Fn(&str) -> Option<FieldValue>,
    ) -> bool {
        match &self.kind {
            RuleKind::Required => !value.as_text().trim().is_empty(),
            RuleKind::Match(field) => {
                let other = lookup(field).unwrap_or(FieldValue::Text(String::new()));
                value.as_text() == other.as_text()
            }
            RuleKind::Custom(check) => check(value, control),
            RuleKind::Unknown(name) => {
                warn!(rule = %name, "unknown validation rule, skipping");
                true
            }
            _ if value.is_empty() => true,
            RuleKind::Email => EMAIL_RE.is_match(&value.as_text()),
            RuleKind::MinLength(n) => value.length() >= *n,
            RuleKind::MaxLength(n) => value.length() <= *n,
            RuleKind::Pattern(re) => re.is_match(&value.as_text()),
            RuleKind::Phone => {
                let text = value.as_text();
                let digits = PHONE_SEPARATORS_RE.replace_all(text.trim(), "");
                PHONE_ES_RE.is_match(&digits) || PHONE_INTL_RE.is_match(&digits)
            }
            RuleKind::Url => url::Url::parse(value.as_text().trim()).is_ok(),
            RuleKind::Number => value.as_number().is_some(),
            RuleKind::Min(bound) => value.as_number().is_some_and(|n| n >= *bound),
            RuleKind::Max(bound) => value.as_number().is_some_and(|n| n <= *bound),
        }
    }

    /// Parse a rule descriptor such as `{"type": "minLength", "value": 2}`.
    pub fn from_json(descriptor: &Value) -> Result<Self> {
        let object = descriptor.as_object().ok_or_else(|| {
            PortfolioError::InvalidArgument("rule descriptor must be an object".to_string())
        })?;
        let rule_type = object.get("type").and_then(Value::as_str).unwrap_or_default();

        let kind = match rule_type {
            "required" => RuleKind::Required,
            "email" => RuleKind::Email,
            "minLength" | "min_length" => RuleKind::MinLength(usize_param(object, rule_type, "length")?),
            "maxLength" | "max_length" => RuleKind::MaxLength(usize_param(object, rule_type, "length")?),
            "pattern" => {
                let pattern = str_param(object, rule_type, "pattern")?;
                Rule::pattern(pattern)?.kind
            }
            "phone" => RuleKind::Phone,
            "url" => RuleKind::Url,
            "number" => RuleKind::Number,
            "min" => RuleKind::Min(f64_param(object, rule_type, "min")?),
            "max" => RuleKind::Max(f64_param(object, rule_type, "max")?),
            "match" => RuleKind::Match(str_param(object, rule_type, "field")?.to_string()),
            "custom" => {
                return Err(PortfolioError::InvalidArgument(
                    "custom rules need a predicate and cannot be loaded from JSON".to_string(),
                ));
            }
            other => RuleKind::Unknown(other.to_string()),
        };

        Ok(Self {
            kind,
            message: object
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Look up a rule parameter under its specific key or the generic `value` key.
fn param<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).or_else(|| object.get("value"))
}

fn missing(rule_type: &str, key: &str) -> PortfolioError {
    PortfolioError::InvalidArgument(format!(
        "rule '{}' needs a '{}' (or 'value') parameter",
        rule_type, key
    ))
}

fn usize_param(object: &Map<String, Value>, rule_type: &str, key: &str) -> Result<usize> {
    param(object, key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| missing(rule_type, key))
}

fn f64_param(object: &Map<String, Value>, rule_type: &str, key: &str) -> Result<f64> {
    param(object, key)
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| missing(rule_type, key))
}

fn str_param<'a>(object: &'a Map<String, Value>, rule_type: &str, key: &str) -> Result<&'a str> {
    param(object, key)
        .and_then(Value::as_str)
        .ok_or_else(|| missing(rule_type, key))
}

/// Ordered mapping of field name to its ordered rules.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    fields: Vec<(String, Vec<Rule>)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare rules for a field, appending to any already declared.
    pub fn field(mut self, name: impl Into<String>, rules: Vec<Rule>) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => existing.extend(rules),
            None => self.fields.push((name, rules)),
        }
        self
    }

    /// Load a rule table of the form `{"field": [{"type": ...}, ...]}`.
    pub fn from_json(table: &Value) -> Result<Self> {
        let object = table.as_object().ok_or_else(|| {
            PortfolioError::InvalidArgument("rule table must be a JSON object".to_string())
        })?;

        let mut set = Self::new();
        for (field, descriptors) in object {
            let descriptors = descriptors.as_array().ok_or_else(|| {
                PortfolioError::InvalidArgument(format!(
                    "rules for field '{}' must be an array",
                    field
                ))
            })?;
            let rules = descriptors
                .iter()
                .map(Rule::from_json)
                .collect::<Result<Vec<_>>>()?;
            set = set.field(field.clone(), rules);
        }
        Ok(set)
    }

    pub fn rules(&self, field: &str) -> Option<&[Rule]> {
        self.fields
            .iter()
            .find(|(n, _)| n == field)
            .map(|(_, rules)| rules.as_slice())
    }

    /// Declared field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.rules(field).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
