//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.nooknote.toml` in the current or home
//!    directory, or `nooknote.toml` in the XDG config directory
//! 3. **Environment variables** – `NOOKNOTE_OWNER`, `NOOKNOTE_TOKEN`, or the
//!    fallback `GITHUB_TOKEN`
//! 4. **Command-line arguments** – `--owner`/`-o`, `--token`/`-t`, and so on
//!
//! # Configuration File
//!
//! ```toml
//! owner = "octocat"
//! repo = "hello-world"
//! token = "ghp_example"
//! page_size = 30
//! poll_interval_seconds = 120
//! default_category = "General"
//! ```

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::credentials::CredentialContext;
use crate::github::pagination::DEFAULT_PAGE_SIZE;
use crate::github::{ApiError, DEFAULT_API_BASE, PageSize, parse_api_base};

/// Polling interval used when none is configured, in seconds.
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300;

/// Operation mode determined by CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Print the first page of discussions and exit.
    ListDiscussions,
    /// Print one discussion and its comments.
    ShowDiscussion,
    /// Create a discussion from `title`, `body`, and `category`.
    CreateDiscussion,
    /// Keep polling and report new discussions until interrupted.
    Watch,
}

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `NOOKNOTE_OWNER` or `--owner`: Repository owner
/// - `NOOKNOTE_REPO` or `--repo`: Repository name
/// - `NOOKNOTE_TOKEN`, `GITHUB_TOKEN`, or `--token`: Personal access token
/// - `NOOKNOTE_API_BASE` or `--api-base`: REST API root (GitHub Enterprise)
/// - `NOOKNOTE_POLL_INTERVAL_SECONDS` or `--poll-interval-seconds`
///
/// # Example
///
/// ```no_run
/// use nooknote::NookNoteConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = NookNoteConfig::load().expect("failed to load configuration");
/// config.validate().expect("configuration should be consistent");
/// let context = config.credential_context();
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "NOOKNOTE",
    discovery(
        dotfile_name = ".nooknote.toml",
        config_file_name = "nooknote.toml",
        app_name = "nooknote"
    )
)]
pub struct NookNoteConfig {
    /// Repository owner (e.g., "octocat").
    ///
    /// Can be provided via:
    /// - CLI: `--owner <OWNER>` or `-o <OWNER>`
    /// - Environment: `NOOKNOTE_OWNER`
    /// - Config file: `owner = "..."`
    #[ortho_config(cli_short = 'o')]
    pub owner: Option<String>,

    /// Repository name (e.g., "hello-world").
    ///
    /// Can be provided via:
    /// - CLI: `--repo <REPO>` or `-r <REPO>`
    /// - Environment: `NOOKNOTE_REPO`
    /// - Config file: `repo = "..."`
    #[ortho_config(cli_short = 'r')]
    pub repo: Option<String>,

    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `NOOKNOTE_TOKEN` or `GITHUB_TOKEN`
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// REST API root. Point this at `https://<host>/api/v3` for GitHub
    /// Enterprise Server.
    #[ortho_config()]
    pub api_base: String,

    /// Discussions requested per page (1 to 100).
    #[ortho_config()]
    pub page_size: u8,

    /// Seconds between background polls in watch mode. Must be at least 1.
    #[ortho_config()]
    pub poll_interval_seconds: u64,

    /// Starts watch mode with background polling disabled; only the initial
    /// refresh runs.
    ///
    /// Note: `ortho_config` does not load boolean values from the
    /// environment, so use the CLI flag or the config file.
    #[ortho_config()]
    pub no_auto_update: bool,

    /// Keeps running and reports new discussions as they appear.
    ///
    /// Can be provided via:
    /// - CLI: `--watch` / `-w`
    /// - Config file: `watch = true`
    #[ortho_config(cli_short = 'w')]
    pub watch: bool,

    /// Discussion number whose comments should be shown.
    ///
    /// Can be provided via:
    /// - CLI: `--discussion <NUMBER>` or `-d <NUMBER>`
    /// - Environment: `NOOKNOTE_DISCUSSION`
    #[ortho_config(cli_short = 'd')]
    pub discussion: Option<u64>,

    /// Title of a discussion to create.
    #[ortho_config()]
    pub title: Option<String>,

    /// Body of a discussion to create; empty when omitted.
    #[ortho_config()]
    pub body: Option<String>,

    /// Category name of a discussion to create.
    #[ortho_config()]
    pub category: Option<String>,

    /// Category used when `title` is given without `category`.
    #[ortho_config()]
    pub default_category: Option<String>,
}

impl Default for NookNoteConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            token: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            no_auto_update: false,
            watch: false,
            discussion: None,
            title: None,
            body: None,
            category: None,
            default_category: None,
        }
    }
}

impl NookNoteConfig {
    /// Resolves the token from configuration or the `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// Returns `None` when no source provides a value; the auth state
    /// machine then stays `NotConfigured`.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
    }

    /// Builds the credential snapshot handed to the auth state machine.
    #[must_use]
    pub fn credential_context(&self) -> CredentialContext {
        CredentialContext::new(
            self.owner.as_deref().unwrap_or_default(),
            self.repo.as_deref().unwrap_or_default(),
            self.resolve_token().as_deref().unwrap_or_default(),
        )
    }

    /// Parses the configured API base.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when `api_base` is not an absolute
    /// HTTP(S) URL.
    pub fn api_base_url(&self) -> Result<Url, ApiError> {
        parse_api_base(&self.api_base)
    }

    /// Validated page size.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when `page_size` is outside 1 to 100.
    pub fn page_size(&self) -> Result<PageSize, ApiError> {
        PageSize::new(self.page_size)
    }

    /// Background polling interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// Category to file a new discussion under, preferring `category` over
    /// `default_category`.
    #[must_use]
    pub fn effective_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .or(self.default_category.as_deref())
            .filter(|name| !name.trim().is_empty())
    }

    /// Determines the operation mode based on provided configuration.
    ///
    /// A title selects `CreateDiscussion`, then a discussion number selects
    /// `ShowDiscussion`, then `watch` selects `Watch`; otherwise discussions
    /// are listed.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.title.is_some() {
            OperationMode::CreateDiscussion
        } else if self.discussion.is_some() {
            OperationMode::ShowDiscussion
        } else if self.watch {
            OperationMode::Watch
        } else {
            OperationMode::ListDiscussions
        }
    }

    /// Validates configuration consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] when modes conflict, a discussion
    /// would be created without a category, or numeric settings are out of
    /// range, and [`ApiError::InvalidUrl`] for an unusable `api_base`.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.poll_interval_seconds == 0 {
            return Err(configuration("poll_interval_seconds must be at least 1"));
        }
        self.page_size()
            .map_err(|error| configuration(&error.to_string()))?;
        self.api_base_url()?;

        if self.title.is_some() && self.discussion.is_some() {
            return Err(configuration(
                "--title creates a discussion and cannot be combined with --discussion",
            ));
        }
        if self.title.is_some() && self.watch {
            return Err(configuration("--title cannot be combined with --watch"));
        }
        if self.title.is_none() && (self.body.is_some() || self.category.is_some()) {
            return Err(configuration(
                "--body and --category require --title to create a discussion",
            ));
        }
        if self.title.is_some() && self.effective_category().is_none() {
            return Err(configuration(
                "a category is required to create a discussion (use --category or default_category)",
            ));
        }
        Ok(())
    }
}

fn configuration(message: &str) -> ApiError {
    ApiError::Configuration {
        message: message.to_owned(),
    }
}

#[cfg(test)]
mod tests;
