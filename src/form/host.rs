// Form host abstraction.
// Defines how the validator reads controls and renders error state, plus an in-memory host.

use std::collections::{BTreeSet, HashMap};

use serde_json::Value;

use crate::error::{PortfolioError, Result};

/// A selectable option of a radio group or multi-select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOption {
    pub value: String,
    pub selected: bool,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

/// A named form control as exposed by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Text-like input, textarea or single select.
    Input { value: String },
    /// A checkbox and the value it submits when checked.
    Checkbox { checked: bool, value: String },
    /// Radio buttons sharing one name.
    RadioGroup { options: Vec<ChoiceOption> },
    /// A `<select multiple>`.
    SelectMultiple { options: Vec<ChoiceOption> },
}

impl Control {
    pub fn input(value: impl Into<String>) -> Self {
        Control::Input {
            value: value.into(),
        }
    }

    pub fn checkbox(checked: bool) -> Self {
        Control::Checkbox {
            checked,
            value: "on".to_string(),
        }
    }

    /// Values this control contributes to a submission.
    fn entries(&self) -> Vec<String> {
        match self {
            Control::Input { value } => vec![value.clone()],
            Control::Checkbox { checked, value } => {
                if *checked {
                    vec![value.clone()]
                } else {
                    Vec::new()
                }
            }
            Control::RadioGroup { options } | Control::SelectMultiple { options } => options
                .iter()
                .filter(|o| o.selected)
                .map(|o| o.value.clone())
                .collect(),
        }
    }
}

/// The surface a validator needs from a form: control lookup and error rendering.
pub trait FormHost {
    /// Look up the first control with the given name.
    fn control(&self, name: &str) -> Option<Control>;

    /// Submission entries in document order. Names may repeat.
    fn entries(&self) -> Vec<(String, String)>;

    fn add_class(&mut self, name: &str, class: &str);

    fn remove_class(&mut self, name: &str, class: &str);

    /// Whether an error display element exists next to the control.
    fn has_error_display(&self, name: &str) -> bool;

    /// Create an (initially hidden) error display next to the control.
    fn create_error_display(&mut self, name: &str, class: &str);

    fn show_error(&mut self, name: &str, message: &str);

    fn hide_error(&mut self, name: &str);

    /// Reset every control to its initial value.
    fn reset(&mut self);
}

/// Rendered error display state for a control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDisplay {
    pub class: String,
    pub message: String,
    pub visible: bool,
}

/// A headless, in-memory form.
#[derive(Debug, Clone, Default)]
pub struct MemoryForm {
    controls: Vec<(String, Control)>,
    initial: Vec<(String, Control)>,
    classes: HashMap<String, BTreeSet<String>>,
    displays: HashMap<String, ErrorDisplay>,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a control. Its current value becomes the reset value.
    pub fn with_control(mut self, name: impl Into<String>, control: Control) -> Self {
        let name = name.into();
        self.initial.push((name.clone(), control.clone()));
        self.controls.push((name, control));
        self
    }

    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_control(name, Control::input(value))
    }

    /// Build a form from a JSON object: strings and numbers become inputs,
    /// booleans checkboxes, and string arrays fully selected multi-selects.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            PortfolioError::InvalidArgument("form values must be a JSON object".to_string())
        })?;

        let mut form = Self::new();
        for (name, value) in object {
            let control = match value {
                Value::String(s) => Control::input(s.clone()),
                Value::Number(n) => Control::input(n.to_string()),
                Value::Bool(b) => Control::checkbox(*b),
                Value::Null => Control::input(""),
                Value::Array(items) => Control::SelectMultiple {
                    options: items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => ChoiceOption::new(s.clone(), true),
                            other => ChoiceOption::new(other.to_string(), true),
                        })
                        .collect(),
                },
                Value::Object(_) => {
                    return Err(PortfolioError::InvalidArgument(format!(
                        "unsupported value for field '{}'",
                        name
                    )));
                }
            };
            form = form.with_control(name.clone(), control);
        }
        Ok(form)
    }

    fn control_mut(&mut self, name: &str) -> Option<&mut Control> {
        self.controls
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Replace the value of a text input.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) {
        if let Some(Control::Input { value: current }) = self.control_mut(name) {
            *current = value.into();
        }
    }

    pub fn set_checked(&mut self, name: &str, checked: bool) {
        if let Some(Control::Checkbox { checked: current, .. }) = self.control_mut(name) {
            *current = checked;
        }
    }

    /// Select exactly the given values of a radio group or multi-select.
    pub fn select(&mut self, name: &str, values: &[&str]) {
        if let Some(Control::RadioGroup { options } | Control::SelectMultiple { options }) =
            self.control_mut(name)
        {
            for option in options.iter_mut() {
                option.selected = values.contains(&option.value.as_str());
            }
        }
    }

    pub fn has_class(&self, name: &str, class: &str) -> bool {
        self.classes
            .get(name)
            .is_some_and(|classes| classes.contains(class))
    }

    pub fn error_display(&self, name: &str) -> Option<&ErrorDisplay> {
        self.displays.get(name)
    }

    /// The visible error message for a control, if any.
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        self.displays
            .get(name)
            .filter(|d| d.visible)
            .map(|d| d.message.as_str())
    }
}

impl FormHost for MemoryForm {
    fn control(&self, name: &str) -> Option<Control> {
        self.controls
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c.clone())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.controls
            .iter()
            .flat_map(|(name, control)| {
                control
                    .entries()
                    .into_iter()
                    .map(move |value| (name.clone(), value))
            })
            .collect()
    }

    fn add_class(&mut self, name: &str, class: &str) {
        self.classes
            .entry(name.to_string())
            .or_default()
            .insert(class.to_string());
    }

    fn remove_class(&mut self, name: &str, class: &str) {
        if let Some(classes) = self.classes.get_mut(name) {
            classes.remove(class);
        }
    }

    fn has_error_display(&self, name: &str) -> bool {
        self.displays.contains_key(name)
    }

    fn create_error_display(&mut self, name: &str, class: &str) {
        self.displays.insert(
            name.to_string(),
            ErrorDisplay {
                class: class.to_string(),
                ..ErrorDisplay::default()
            },
        );
    }

    fn show_error(&mut self, name: &str, message: &str) {
        if let Some(display) = self.displays.get_mut(name) {
            display.message = message.to_string();
            display.visible = true;
        }
    }

    fn hide_error(&mut self, name: &str) {
        if let Some(display) = self.displays.get_mut(name) {
            display.message.clear();
            display.visible = false;
        }
    }

    fn reset(&mut self) {
        self.controls = self.initial.clone();
    }
}
