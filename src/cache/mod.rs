// Cache module for in-memory response caching.
// Keeps decoded GitHub API responses for a configurable TTL.

pub mod store;

pub use store::{CacheEntry, DEFAULT_TTL, ResponseCache};
