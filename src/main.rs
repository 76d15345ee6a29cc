// Command-line front end for the portfolio components.
// Fetches GitHub profile data and validates form submissions against JSON rule tables.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use portfolio::form::{FormValidator, MemoryForm, RuleSet, ValidatorOptions};
use portfolio::github::{
    ClientConfig, GitHubClient, RepoSort, RepoType, RepositoryListOptions, SearchOptions,
    SearchSort, SortDirection,
};
use portfolio::{PortfolioError, Result};

/// Portfolio data tools.
#[derive(Parser)]
#[command(name = "portfolio", version, about = "GitHub portfolio data and form validation")]
struct Cli {
    /// GitHub token (defaults to GITHUB_TOKEN).
    #[arg(long, global = true)]
    token: Option<String>,

    /// Disable the response cache.
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a user's profile.
    User { username: Option<String> },

    /// List a user's repositories.
    Repos {
        username: Option<String>,
        #[arg(long = "type", default_value = "owner")]
        repo_type: RepoType,
        #[arg(long, default_value = "updated")]
        sort: RepoSort,
        #[arg(long, default_value = "desc")]
        direction: SortDirection,
        #[arg(long, default_value_t = 30)]
        per_page: u32,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Repository names to leave out.
        #[arg(long)]
        exclude: Vec<String>,
        /// Only show repositories worth featuring.
        #[arg(long)]
        featured: bool,
    },

    /// Show languages, latest commit and contributors of a repository.
    Stats {
        repo: String,
        #[arg(long)]
        owner: Option<String>,
    },

    /// Summarize a user's recent public activity.
    Activity { username: Option<String> },

    /// Search repositories.
    Search {
        query: String,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        sort: Option<SearchSort>,
        #[arg(long, default_value = "desc")]
        order: SortDirection,
    },

    /// Validate form values against a rule table.
    Validate {
        /// JSON rule table: {"field": [{"type": "required"}, ...]}.
        #[arg(long)]
        rules: PathBuf,
        /// JSON object of field values.
        #[arg(long)]
        form: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let token = cli.token.as_deref();
    let client = match cli.command {
        Command::Validate { rules, form } => return validate(&rules, &form),
        Command::User { username } => {
            let client = connect(token, cli.no_cache)?;
            print_json(&client.get_user(username.as_deref()).await?)?;
            client
        }
        Command::Repos {
            username,
            repo_type,
            sort,
            direction,
            per_page,
            page,
            exclude,
            featured,
        } => {
            let client = connect(token, cli.no_cache)?;
            let options = RepositoryListOptions {
                username,
                repo_type,
                sort,
                direction,
                per_page,
                page,
                exclude,
                featured,
            };
            for repo in client.get_repositories(&options).await? {
                println!(
                    "{:<40} {:>6}★ {}",
                    repo.full_name,
                    repo.stars,
                    repo.language.as_deref().unwrap_or("-")
                );
            }
            client
        }
        Command::Stats { repo, owner } => {
            let client = connect(token, cli.no_cache)?;
            print_json(&client.get_repository_stats(&repo, owner.as_deref()).await)?;
            client
        }
        Command::Activity { username } => {
            let client = connect(token, cli.no_cache)?;
            print_json(&client.get_user_activity(username.as_deref()).await)?;
            client
        }
        Command::Search {
            query,
            language,
            user,
            sort,
            order,
        } => {
            let client = connect(token, cli.no_cache)?;
            let options = SearchOptions {
                sort,
                order,
                language,
                user,
                ..SearchOptions::default()
            };
            print_json(&client.search_repositories(&query, &options).await?)?;
            client
        }
    };

    let rate_limit = client.rate_limit();
    if let (Some(remaining), Some(limit)) = (rate_limit.remaining, rate_limit.limit) {
        tracing::info!(remaining, limit, reset_at = ?rate_limit.reset_at, "rate limit");
    }

    Ok(ExitCode::SUCCESS)
}

/// Build a client from the environment, with command-line overrides.
fn connect(token: Option<&str>, no_cache: bool) -> Result<GitHubClient> {
    let mut config = ClientConfig::from_env();
    if let Some(token) = token {
        config.token = Some(token.to_string());
    }
    config.cache_enabled = !no_cache;
    GitHubClient::new(config)
}

fn validate(rules_path: &Path, form_path: &Path) -> Result<ExitCode> {
    let rules = RuleSet::from_json(&read_json(rules_path)?)?;
    let form = MemoryForm::from_json(&read_json(form_path)?)?;
    let mut validator = FormValidator::new(Some(form), rules, ValidatorOptions::default());

    match validator.get_validated_data() {
        Some(data) => {
            print_json(&data)?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            print_json(validator.errors())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(PortfolioError::from)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
