// GitHub API response types.
// Raw deserialization structs and the normalized view models built from them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PortfolioError;

/// Raw user object as returned by `/users/{username}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawUser {
    pub id: u64,
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub public_repos: u64,
    pub public_gists: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Stable user profile shape exposed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: u64,
    pub login: String,
    /// Display name, falling back to the login.
    pub name: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub bio: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: bool,
    pub public_repos: u64,
    pub public_gists: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RawUser> for UserProfile {
    fn from(raw: RawUser) -> Self {
        let name = non_empty(raw.name).unwrap_or_else(|| raw.login.clone());
        Self {
            id: raw.id,
            login: raw.login,
            name,
            avatar_url: raw.avatar_url,
            html_url: raw.html_url,
            bio: non_empty(raw.bio),
            company: non_empty(raw.company),
            blog: non_empty(raw.blog),
            location: non_empty(raw.location),
            email: non_empty(raw.email),
            hireable: raw.hireable.unwrap_or(false),
            public_repos: raw.public_repos,
            public_gists: raw.public_gists,
            followers: raw.followers,
            following: raw.following,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawOwner {
    pub login: String,
}

/// Raw repository object as returned by the repos endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Option<RawOwner>,
    pub description: Option<String>,
    pub html_url: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub watchers_count: u64,
    pub open_issues_count: u64,
    pub size: u64,
    pub private: bool,
    pub fork: bool,
    pub archived: bool,
    pub disabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub topics: Vec<String>,
    pub has_pages: bool,
    pub default_branch: Option<String>,
}

/// Repository view model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub html_url: Option<String>,
    pub clone_url: Option<String>,
    pub ssh_url: Option<String>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub open_issues: u64,
    pub size: u64,
    pub private: bool,
    pub fork: bool,
    pub archived: bool,
    pub disabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub topics: Vec<String>,
    pub has_pages: bool,
    pub default_branch: Option<String>,
}

impl From<RawRepository> for Repository {
    fn from(raw: RawRepository) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            full_name: raw.full_name,
            owner: raw.owner.map(|o| o.login),
            description: non_empty(raw.description),
            html_url: raw.html_url,
            clone_url: raw.clone_url,
            ssh_url: raw.ssh_url,
            homepage: non_empty(raw.homepage),
            language: raw.language,
            stars: raw.stargazers_count,
            forks: raw.forks_count,
            watchers: raw.watchers_count,
            open_issues: raw.open_issues_count,
            size: raw.size,
            private: raw.private,
            fork: raw.fork,
            archived: raw.archived,
            disabled: raw.disabled,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            pushed_at: raw.pushed_at,
            topics: raw.topics,
            has_pages: raw.has_pages,
            default_branch: raw.default_branch,
        }
    }
}

impl Repository {
    /// Whether this repository belongs on a portfolio page: it has stars,
    /// carries a "featured"/"portfolio" topic, or is an active original.
    pub fn is_featured(&self) -> bool {
        self.stars > 0
            || self
                .topics
                .iter()
                .any(|t| t == "featured" || t == "portfolio")
            || (!self.fork && !self.archived)
    }

    /// Whether `name` matches this repository's name or full name.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name == name || self.full_name == name
    }
}

/// Bytes of code per language.
pub type Languages = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCommitDetail {
    pub message: String,
    pub author: Option<RawCommitAuthor>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawCommit {
    pub sha: String,
    pub html_url: Option<String>,
    pub commit: RawCommitDetail,
}

/// A commit summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub html_url: Option<String>,
}

impl From<RawCommit> for Commit {
    fn from(raw: RawCommit) -> Self {
        let author = raw.commit.author.unwrap_or_default();
        Self {
            sha: raw.sha,
            message: raw.commit.message,
            author_name: author.name,
            author_email: author.email,
            date: author.date,
            html_url: raw.html_url,
        }
    }
}

/// A repository contributor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contributor {
    pub id: u64,
    pub login: String,
    pub avatar_url: Option<String>,
    pub html_url: Option<String>,
    pub contributions: u64,
}

/// Aggregated repository statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryStats {
    pub languages: Languages,
    /// Whether the repository has at least one commit.
    pub has_commits: bool,
    /// Number of contributors.
    pub contributors: usize,
    pub last_commit: Option<Commit>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawReadme {
    pub content: String,
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawEventRepo {
    pub name: String,
}

/// Public event as returned by `/users/{username}/events/public`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub repo: Option<RawEventRepo>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Digest of a user's recent public activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivityDigest {
    pub total_events: usize,
    /// Event count per event type (e.g. `PushEvent`).
    pub event_types: BTreeMap<String, usize>,
    /// Names of repositories that saw activity.
    pub repositories: BTreeSet<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub push_events: usize,
    pub issue_events: usize,
    pub pull_request_events: usize,
}

impl ActivityDigest {
    pub(crate) fn from_events(events: Vec<RawEvent>) -> Self {
        let mut digest = Self {
            total_events: events.len(),
            ..Self::default()
        };

        for event in events {
            match event.event_type.as_str() {
                "PushEvent" => digest.push_events += 1,
                "IssuesEvent" => digest.issue_events += 1,
                "PullRequestEvent" => digest.pull_request_events += 1,
                _ => {}
            }
            if let Some(repo) = event.repo {
                digest.repositories.insert(repo.name);
            }
            if let Some(created_at) = event.created_at {
                if digest.last_activity.is_none_or(|last| created_at > last) {
                    digest.last_activity = Some(created_at);
                }
            }
            *digest.event_types.entry(event.event_type).or_insert(0) += 1;
        }

        digest
    }
}

/// Raw search response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawSearchResponse {
    pub total_count: u64,
    pub incomplete_results: bool,
    pub items: Vec<RawRepository>,
}

/// Repository search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub total_count: u64,
    pub incomplete_results: bool,
    pub items: Vec<Repository>,
}

/// Rate limit information from response headers. `None` until observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    /// Reset time in epoch seconds.
    pub reset: Option<u64>,
    pub used: Option<u64>,
}

impl RateLimit {
    /// Reset time as a timestamp, if known.
    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        self.reset
            .and_then(|secs| DateTime::from_timestamp(i64::try_from(secs).ok()?, 0))
    }
}

/// Snapshot of the rate limit state with the derived reset timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset: Option<u64>,
    pub used: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
}

impl From<RateLimit> for RateLimitStatus {
    fn from(state: RateLimit) -> Self {
        Self {
            limit: state.limit,
            remaining: state.remaining,
            reset: state.reset,
            used: state.used,
            reset_at: state.reset_at(),
        }
    }
}

/// Declares a string-backed option enum whose parse error names the allowed set.
macro_rules! option_enum {
    ($(#[$meta:meta])* $name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALLOWED: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = PortfolioError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(PortfolioError::InvalidArgument(format!(
                        "invalid {} '{}', expected one of: {}",
                        $what,
                        other,
                        Self::ALLOWED.join(", ")
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

option_enum!(
    /// Which repositories of a user to list.
    RepoType, "type", {
        Owner => "owner",
        All => "all",
        Member => "member",
    }
);

option_enum!(
    /// Sort key for repository listings.
    RepoSort, "sort", {
        Created => "created",
        Updated => "updated",
        Pushed => "pushed",
        FullName => "full_name",
    }
);

option_enum!(
    /// Sort direction.
    SortDirection, "direction", {
        Asc => "asc",
        Desc => "desc",
    }
);

option_enum!(
    /// Sort key for repository search.
    SearchSort, "sort", {
        Stars => "stars",
        Forks => "forks",
        HelpWantedIssues => "help-wanted-issues",
        Updated => "updated",
    }
);

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
