// Form validation module.
// Declarative rule sets evaluated against a pluggable form host.

pub mod host;
pub mod rules;
pub mod validator;

pub use host::{ChoiceOption, Control, ErrorDisplay, FormHost, MemoryForm};
pub use rules::{CustomCheck, FieldValue, Rule, RuleKind, RuleSet};
pub use validator::{FieldEvent, FormValidator, ValidatorOptions};
