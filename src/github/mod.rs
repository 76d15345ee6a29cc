// GitHub API module.
// Provides the cached client, typed endpoints and response types for the GitHub REST API.

pub mod client;
pub mod endpoints;
pub mod types;

pub use client::{ClientConfig, GitHubClient, HttpMethod, RequestOptions};
pub use endpoints::{MAX_PER_PAGE, RepositoryListOptions, SearchOptions, clamp_pagination};
pub use types::{
    ActivityDigest, Commit, Contributor, Languages, RateLimit, RateLimitStatus, RepoSort,
    RepoType, Repository, RepositoryStats, SearchResults, SearchSort, SortDirection, UserProfile,
};
