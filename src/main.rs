//! `NookNote` CLI entrypoint for GitHub Discussions.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use nooknote::github::models::Comment;
use nooknote::{
    ApiError, AuthState, AuthStateMachine, Discussion, DiscussionStore, LoadOutcome,
    NookNoteConfig, OctocrabConnector, OperationMode, PollingScheduler, StderrJsonlEventSink,
};
use ortho_config::OrthoConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if writeln!(io::stderr().lock(), "{error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Wiring shared by every operation mode.
struct Client {
    auth: Arc<AuthStateMachine>,
    store: Arc<DiscussionStore>,
    events: Arc<StderrJsonlEventSink>,
}

async fn run() -> Result<(), ApiError> {
    let config = load_config()?;
    config.validate()?;

    let client = connect(&config).await?;
    match config.operation_mode() {
        OperationMode::ListDiscussions => list(&client).await,
        OperationMode::ShowDiscussion => show(&client, &config).await,
        OperationMode::CreateDiscussion => create(&client, &config).await,
        OperationMode::Watch => watch(&client, &config).await,
    }
}

/// Loads configuration from CLI, environment, and files.
///
/// # Errors
///
/// Returns [`ApiError::Configuration`] when ortho-config fails to parse
/// arguments or load configuration files.
fn load_config() -> Result<NookNoteConfig, ApiError> {
    NookNoteConfig::load().map_err(|error| ApiError::Configuration {
        message: error.to_string(),
    })
}

async fn connect(config: &NookNoteConfig) -> Result<Client, ApiError> {
    let auth = Arc::new(AuthStateMachine::new(
        Arc::new(OctocrabConnector),
        config.api_base_url()?,
    ));
    auth.update_credentials(config.credential_context());

    match auth.validate().await {
        AuthState::Valid => {}
        AuthState::Invalid(error) => return Err(error),
        AuthState::NotConfigured => {
            return Err(ApiError::Configuration {
                message: "owner, repository, and token are required \
                          (use --owner, --repo, and --token or GITHUB_TOKEN)"
                    .to_owned(),
            });
        }
        AuthState::Configured | AuthState::Validating => return Err(ApiError::NotAuthenticated),
    }

    let events = Arc::new(StderrJsonlEventSink);
    let store = Arc::new(DiscussionStore::new(
        Arc::clone(&auth),
        Arc::clone(&events) as _,
        config.page_size()?,
    ));
    Ok(Client {
        auth,
        store,
        events,
    })
}

async fn list(client: &Client) -> Result<(), ApiError> {
    client.store.refresh().await?;
    let snapshot = client.store.snapshot();
    let mut stdout = io::stdout().lock();
    for discussion in &snapshot.discussions {
        write_line(&mut stdout, &summary_line(discussion))?;
    }
    if snapshot.has_more {
        write_line(&mut stdout, "(more discussions available)")?;
    }
    Ok(())
}

async fn show(client: &Client, config: &NookNoteConfig) -> Result<(), ApiError> {
    let number = config.discussion.ok_or_else(|| ApiError::Configuration {
        message: "a discussion number is required (use --discussion or -d)".to_owned(),
    })?;
    let discussion = find_discussion(&client.store, number).await?;

    let mut comments: Vec<Comment> = Vec::new();
    let mut page = client.store.fetch_comments(&discussion).await?;
    loop {
        let next = page.page_info.next_cursor().cloned();
        comments.append(&mut page.items);
        let Some(cursor) = next else { break };
        page = client
            .store
            .fetch_comments_page(&discussion, Some(cursor))
            .await?;
    }

    let mut stdout = io::stdout().lock();
    write_line(&mut stdout, &summary_line(&discussion))?;
    write_line(&mut stdout, &discussion.url)?;
    if let Some(body) = discussion.body.as_deref().filter(|body| !body.is_empty()) {
        write_line(&mut stdout, "")?;
        write_line(&mut stdout, body)?;
    }
    for comment in &comments {
        write_line(&mut stdout, "")?;
        write_line(&mut stdout, &comment_line(comment))?;
        write_line(&mut stdout, &comment.body)?;
    }
    Ok(())
}

/// Pages through the repository until discussion `number` is loaded.
async fn find_discussion(store: &DiscussionStore, number: u64) -> Result<Discussion, ApiError> {
    store.refresh().await?;
    loop {
        if let Some(found) = store.discussion_by_number(number) {
            return Ok(found);
        }
        if store.load_more().await? == LoadOutcome::Skipped {
            return Err(ApiError::NotFound {
                resource: format!("discussion #{number}"),
            });
        }
    }
}

async fn create(client: &Client, config: &NookNoteConfig) -> Result<(), ApiError> {
    let title = config.title.as_deref().unwrap_or_default();
    let body = config.body.as_deref().unwrap_or_default();
    let category = config.effective_category().unwrap_or_default();

    let created = client.store.create(title, body, category).await?;

    let mut stdout = io::stdout().lock();
    write_line(&mut stdout, &format!("Created {}", summary_line(&created)))?;
    write_line(&mut stdout, &created.url)
}

async fn watch(client: &Client, config: &NookNoteConfig) -> Result<(), ApiError> {
    list(client).await?;

    let scheduler = PollingScheduler::new(
        Arc::clone(&client.store),
        Arc::clone(&client.events) as _,
        config.poll_interval(),
    );
    scheduler.enable(!config.no_auto_update);
    scheduler.attach(&client.auth);
    tracing::info!(
        interval_secs = config.poll_interval_seconds,
        enabled = scheduler.is_enabled(),
        "watching for new discussions"
    );

    tokio::signal::ctrl_c().await.map_err(|error| ApiError::Io {
        message: error.to_string(),
    })?;
    scheduler.enable(false);
    Ok(())
}

fn summary_line(discussion: &Discussion) -> String {
    let author = discussion
        .author
        .as_ref()
        .map_or("ghost", |author| author.login.as_str());
    format!(
        "#{} [{}] {} ({}, {} by {author}, {} comments)",
        discussion.number,
        discussion.state,
        discussion.title,
        discussion.category.name,
        discussion.updated_at.format("%Y-%m-%d %H:%M"),
        discussion.comment_count
    )
}

fn comment_line(comment: &Comment) -> String {
    let author = comment
        .author
        .as_ref()
        .map_or("ghost", |author| author.login.as_str());
    let reply = if comment.parent_comment_id.is_some() {
        " (reply)"
    } else {
        ""
    };
    format!(
        "-- {author} at {}{reply}",
        comment.created_at.format("%Y-%m-%d %H:%M")
    )
}

fn write_line(stdout: &mut impl Write, line: &str) -> Result<(), ApiError> {
    writeln!(stdout, "{line}").map_err(|error| ApiError::Io {
        message: error.to_string(),
    })
}
