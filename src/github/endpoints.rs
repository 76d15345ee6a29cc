// GitHub API endpoint functions.
// Provides typed, validated accessors for users, repositories, activity and search.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;

use crate::error::{PortfolioError, Result};

use super::client::GitHubClient;
use super::types::{
    ActivityDigest, Commit, Contributor, Languages, RawCommit, RawEvent, RawReadme,
    RawRepository, RawSearchResponse, RawUser, RepoSort, RepoType, Repository, RepositoryStats,
    SearchResults, SearchSort, SortDirection, UserProfile,
};

pub const MAX_PER_PAGE: u32 = 100;

/// Options for listing a user's repositories.
#[derive(Debug, Clone)]
pub struct RepositoryListOptions {
    /// Owner of the repositories; falls back to the configured username.
    pub username: Option<String>,
    pub repo_type: RepoType,
    pub sort: RepoSort,
    pub direction: SortDirection,
    /// Clamped to `1..=100`.
    pub per_page: u32,
    /// Clamped to `>= 1`.
    pub page: u32,
    /// Repository names or full names to drop from the result.
    pub exclude: Vec<String>,
    /// Keep only repositories worth showing on a portfolio.
    pub featured: bool,
}

impl Default for RepositoryListOptions {
    fn default() -> Self {
        Self {
            username: None,
            repo_type: RepoType::Owner,
            sort: RepoSort::Updated,
            direction: SortDirection::Desc,
            per_page: 30,
            page: 1,
            exclude: Vec::new(),
            featured: false,
        }
    }
}

/// Options for repository search.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    /// Best-match ordering when `None`.
    pub sort: Option<SearchSort>,
    pub order: SortDirection,
    pub language: Option<String>,
    pub user: Option<String>,
    pub per_page: u32,
    pub page: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            sort: None,
            order: SortDirection::Desc,
            language: None,
            user: None,
            per_page: 30,
            page: 1,
        }
    }
}

/// Clamp pagination values into the range the API accepts.
pub fn clamp_pagination(per_page: u32, page: u32) -> (u32, u32) {
    (per_page.clamp(1, MAX_PER_PAGE), page.max(1))
}

fn encode_query(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes()).collect()
}

/// Percent-encode a username or repository name for use as one path segment.
fn path_segment(value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() || value == "." || value == ".." {
        return Err(PortfolioError::InvalidArgument(format!(
            "'{}' is not a valid path segment",
            value
        )));
    }
    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
    Ok(encoded.replace('+', "%20"))
}

/// `/repos/{owner}/{repo}` with both segments encoded.
fn repo_path(username: &str, repo: &str) -> Result<String> {
    Ok(format!("/repos/{}/{}", path_segment(username)?, path_segment(repo)?))
}

impl GitHubClient {
    /// Get a user's normalized profile.
    pub async fn get_user(&self, username: Option<&str>) -> Result<UserProfile> {
        let username = self.resolve_username(username)?;
        let raw: RawUser = self.get_json(&format!("/users/{}", path_segment(username)?)).await?;
        Ok(raw.into())
    }

    /// List a user's repositories with validated, clamped query options.
    pub async fn get_repositories(&self, options: &RepositoryListOptions) -> Result<Vec<Repository>> {
        let username = self.resolve_username(options.username.as_deref())?;
        let (per_page, page) = clamp_pagination(options.per_page, options.page);

        let endpoint = format!(
            "/users/{}/repos?type={}&sort={}&direction={}&per_page={}&page={}",
            path_segment(username)?,
            options.repo_type,
            options.sort,
            options.direction,
            per_page,
            page
        );
        let raw: Vec<RawRepository> = self.get_json(&endpoint).await?;

        let repos = raw
            .into_iter()
            .map(Repository::from)
            .filter(|repo| !options.exclude.iter().any(|name| repo.matches_name(name)))
            .filter(|repo| !options.featured || repo.is_featured())
            .collect();
        Ok(repos)
    }

    /// Get a specific repository.
    pub async fn get_repository(&self, repo: &str, username: Option<&str>) -> Result<Repository> {
        let username = self.resolve_username(username)?;
        let raw: RawRepository = self.get_json(&repo_path(username, repo)?).await?;
        Ok(raw.into())
    }

    /// Get bytes of code per language for a repository.
    pub async fn get_repository_languages(
        &self,
        repo: &str,
        username: Option<&str>,
    ) -> Result<Languages> {
        let username = self.resolve_username(username)?;
        self.get_json(&format!("{}/languages", repo_path(username, repo)?))
            .await
    }

    /// Get the most recent commits of a repository.
    pub async fn get_repository_commits(
        &self,
        repo: &str,
        username: Option<&str>,
        per_page: u32,
    ) -> Result<Vec<Commit>> {
        let username = self.resolve_username(username)?;
        let (per_page, _) = clamp_pagination(per_page, 1);
        let raw: Vec<RawCommit> = self
            .get_json(&format!(
                "{}/commits?per_page={}",
                repo_path(username, repo)?,
                per_page
            ))
            .await?;
        Ok(raw.into_iter().map(Commit::from).collect())
    }

    /// Get the contributors of a repository.
    pub async fn get_repository_contributors(
        &self,
        repo: &str,
        username: Option<&str>,
    ) -> Result<Vec<Contributor>> {
        let username = self.resolve_username(username)?;
        self.get_json(&format!("{}/contributors", repo_path(username, repo)?))
            .await
    }

    /// Get the decoded README of a repository, or `None` if it has none.
    pub async fn get_repository_readme(
        &self,
        repo: &str,
        username: Option<&str>,
    ) -> Result<Option<String>> {
        let username = self.resolve_username(username)?;
        let endpoint = format!("{}/readme", repo_path(username, repo)?);
        let raw: RawReadme = match self.get_json(&endpoint).await {
            Ok(raw) => raw,
            Err(PortfolioError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        if let Some(encoding) = raw.encoding.as_deref() {
            if encoding != "base64" {
                return Err(PortfolioError::Decode(format!(
                    "unsupported README encoding '{}'",
                    encoding
                )));
            }
        }

        // The API wraps base64 content at 60 columns.
        let compact: String = raw.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(compact)
            .map_err(|e| PortfolioError::Decode(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| PortfolioError::Decode(e.to_string()))?;
        Ok(Some(text))
    }

    /// Gather languages, latest commit and contributor count concurrently.
    ///
    /// Never fails: each sub-request that errors contributes an empty value.
    pub async fn get_repository_stats(&self, repo: &str, username: Option<&str>) -> RepositoryStats {
        let (languages, commits, contributors) = tokio::join!(
            self.get_repository_languages(repo, username),
            self.get_repository_commits(repo, username, 1),
            self.get_repository_contributors(repo, username),
        );

        let languages = languages.unwrap_or_else(|e| {
            warn!(repo, error = %e, "failed to fetch repository languages");
            Languages::new()
        });
        let commits = commits.unwrap_or_else(|e| {
            warn!(repo, error = %e, "failed to fetch repository commits");
            Vec::new()
        });
        let contributors = contributors.unwrap_or_else(|e| {
            warn!(repo, error = %e, "failed to fetch repository contributors");
            Vec::new()
        });

        RepositoryStats {
            languages,
            has_commits: !commits.is_empty(),
            contributors: contributors.len(),
            last_commit: commits.into_iter().next(),
        }
    }

    /// Summarize a user's recent public events. Returns an empty digest on error.
    pub async fn get_user_activity(&self, username: Option<&str>) -> ActivityDigest {
        let events = match self.resolve_username(username) {
            Ok(username) => match path_segment(username) {
                Ok(username) => {
                    self.get_json::<Vec<RawEvent>>(&format!(
                        "/users/{}/events/public?per_page={}",
                        username, MAX_PER_PAGE
                    ))
                    .await
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match events {
            Ok(events) => ActivityDigest::from_events(events),
            Err(e) => {
                warn!(error = %e, "failed to fetch user activity");
                ActivityDigest::default()
            }
        }
    }

    /// Search repositories by free text plus optional language/user qualifiers.
    pub async fn search_repositories(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResults> {
        let mut terms: Vec<String> = Vec::new();
        if !query.trim().is_empty() {
            terms.push(query.trim().to_string());
        }
        if let Some(language) = options.language.as_deref().filter(|l| !l.is_empty()) {
            terms.push(format!("language:{}", language));
        }
        if let Some(user) = options.user.as_deref().filter(|u| !u.is_empty()) {
            terms.push(format!("user:{}", user));
        }
        if terms.is_empty() {
            return Err(PortfolioError::InvalidArgument(
                "search query must not be empty".to_string(),
            ));
        }

        let (per_page, page) = clamp_pagination(options.per_page, options.page);
        let mut endpoint = format!(
            "/search/repositories?q={}&order={}&per_page={}&page={}",
            encode_query(&terms.join(" ")),
            options.order,
            per_page,
            page
        );
        if let Some(sort) = options.sort {
            endpoint.push_str(&format!("&sort={}", sort));
        }

        let raw: RawSearchResponse = self.get_json(&endpoint).await?;
        Ok(SearchResults {
            total_count: raw.total_count,
            incomplete_results: raw.incomplete_results,
            items: raw.items.into_iter().map(Repository::from).collect(),
        })
    }
}
