// Portfolio site components.
// A cached, rate-limit-aware GitHub API client and a rule-based form validator.

pub mod cache;
pub mod error;
pub mod form;
pub mod github;

pub use error::{PortfolioError, Result};
pub use form::{FormHost, FormValidator, MemoryForm, Rule, RuleSet, ValidatorOptions};
pub use github::{ClientConfig, GitHubClient};
