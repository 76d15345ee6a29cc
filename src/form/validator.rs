// Form validator.
// Runs rule sets against a form host, tracks per-field errors and renders error state.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::warn;

use super::host::FormHost;
use super::rules::{FieldValue, RuleSet};

/// Rendering and live-validation options.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Whether to toggle classes and error displays on the host.
    pub show_errors: bool,
    pub error_class: String,
    pub success_class: String,
    /// Class given to error displays created on demand.
    pub error_display_class: String,
    pub validate_on_blur: bool,
    pub validate_on_input: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            show_errors: true,
            error_class: "error".to_string(),
            success_class: "success".to_string(),
            error_display_class: "error-message".to_string(),
            validate_on_blur: true,
            validate_on_input: false,
        }
    }
}

/// A user interaction on a named field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Blur(String),
    Input(String),
}

/// Validates a form against a rule set.
pub struct FormValidator<F: FormHost> {
    form: Option<F>,
    rules: RuleSet,
    options: ValidatorOptions,
    errors: BTreeMap<String, Vec<String>>,
}

impl<F: FormHost> FormValidator<F> {
    /// Attach a validator. A missing form yields a detached validator that
    /// treats every field as valid.
    pub fn new(form: Option<F>, rules: RuleSet, options: ValidatorOptions) -> Self {
        if form.is_none() {
            warn!("form not found, validator is detached");
        }
        Self {
            form,
            rules,
            options,
            errors: BTreeMap::new(),
        }
    }

    pub fn form(&self) -> Option<&F> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut F> {
        self.form.as_mut()
    }

    /// Current errors by field name.
    pub fn errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }

    /// The reported error for a field, if any.
    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.errors
            .get(name)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Validate a single field. Fields absent from the form are valid.
    pub fn validate_field(&mut self, name: &str) -> bool {
        let Some(form) = self.form.as_ref() else {
            return true;
        };
        let Some(control) = form.control(name) else {
            warn!(field = name, "field not found in form, skipping validation");
            return true;
        };

        let value = FieldValue::from_control(&control);
        let lookup = |other: &str| form.control(other).map(|c| FieldValue::from_control(&c));
        let error = self
            .rules
            .rules(name)
            .unwrap_or_default()
            .iter()
            .find(|rule| !rule.check(&value, &control, lookup))
            .map(|rule| rule.message());

        match &error {
            Some(message) => {
                self.errors.insert(name.to_string(), vec![message.clone()]);
            }
            None => {
                self.errors.remove(name);
            }
        }

        if self.options.show_errors {
            if let Some(form) = self.form.as_mut() {
                render_field(form, &self.options, name, error.as_deref());
            }
        }

        error.is_none()
    }

    /// Revalidate every declared field from scratch.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        let fields: Vec<String> = self.rules.field_names().map(str::to_string).collect();
        for field in &fields {
            self.validate_field(field);
        }
        self.errors.is_empty()
    }

    /// React to a blur or input event. Returns the field's validity when it
    /// was validated, `None` when the event was ignored.
    pub fn handle_event(&mut self, event: &FieldEvent) -> Option<bool> {
        let (name, enabled) = match event {
            FieldEvent::Blur(name) => (name, self.options.validate_on_blur),
            FieldEvent::Input(name) => (
                name,
                self.options.validate_on_input || self.errors.contains_key(name),
            ),
        };
        if enabled && self.rules.contains(name) {
            Some(self.validate_field(name))
        } else {
            None
        }
    }

    /// Validate and serialize the form. `None` means "do not submit".
    ///
    /// Repeated field names are merged into arrays.
    pub fn get_validated_data(&mut self) -> Option<Map<String, Value>> {
        if !self.validate() {
            return None;
        }

        let mut data = Map::new();
        let Some(form) = self.form.as_ref() else {
            return Some(data);
        };

        for (name, value) in form.entries() {
            let value = Value::String(value);
            match data.get_mut(&name) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    data.insert(name, value);
                }
            }
        }
        Some(data)
    }

    /// Drop all errors and strip error rendering, leaving values untouched.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
        let Some(form) = self.form.as_mut() else {
            return;
        };
        for name in self.rules.field_names() {
            form.remove_class(name, &self.options.error_class);
            form.remove_class(name, &self.options.success_class);
            if form.has_error_display(name) {
                form.hide_error(name);
            }
        }
    }

    /// Clear errors and reset the form's values.
    pub fn reset(&mut self) {
        self.clear_errors();
        if let Some(form) = self.form.as_mut() {
            form.reset();
        }
    }
}

fn render_field<F: FormHost>(
    form: &mut F,
    options: &ValidatorOptions,
    name: &str,
    error: Option<&str>,
) {
    match error {
        Some(message) => {
            form.add_class(name, &options.error_class);
            form.remove_class(name, &options.success_class);
            if !form.has_error_display(name) {
                form.create_error_display(name, &options.error_display_class);
            }
            form.show_error(name, message);
        }
        None => {
            form.remove_class(name, &options.error_class);
            form.add_class(name, &options.success_class);
            if form.has_error_display(name) {
                form.hide_error(name);
            }
        }
    }
}
