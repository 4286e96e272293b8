//! quickmemo: capture text and files into a self-hosted memo server.
//!
//! Each invocation is one short-lived step: it reads the pending state from
//! the config file, performs one action, and exits. Drafts and uploaded
//! attachments accumulate across invocations until `submit` turns them into
//! a memo.
//!
//! ```text
//! quickmemo login https://memos.example.com <token>
//! quickmemo capture selection "interesting quote"
//! quickmemo attach ./screenshot.png
//! quickmemo resume        # retry an attach that was interrupted
//! quickmemo submit
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quickmemo_actions::{
    Capture, CredentialsOutcome, LinkReport, Notice, PendingActions, SubmitOutcome, TagsOutcome,
    UploadOutcome, UploadSource,
};
use quickmemo_client::MemosClient;
use quickmemo_core::{defaults, Visibility};
use quickmemo_store::FileConfigStore;

type Actions = PendingActions<FileConfigStore, MemosClient>;

#[derive(Parser)]
#[command(name = "quickmemo")]
#[command(author, version, about = "Quick capture for a self-hosted memo server")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = defaults::ENV_CONFIG_PATH)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check and save the server URL and access token
    Login {
        /// Server base URL
        url: String,
        /// Access token
        token: String,
    },

    /// Append captured text to the draft
    Capture {
        #[command(subcommand)]
        kind: CaptureKind,
    },

    /// Show the draft, or replace it with TEXT
    Draft {
        text: Option<String>,
    },

    /// Upload a file or image URL to attach to the next memo
    Attach {
        /// Local path or http(s) URL
        source: String,
    },

    /// Retry an upload that was interrupted before it finished
    Resume,

    /// Create a memo from the draft and attach uploaded files
    Submit {
        /// Replace the draft with this text first
        text: Option<String>,
    },

    /// Set the default memo visibility
    Visibility {
        /// public, private or protected
        value: Visibility,
    },

    /// List tags with usage counts
    Tags,

    /// Show pending state as JSON
    Status,

    /// Discard the draft, pending upload and attachments
    Reset,
}

#[derive(Subcommand)]
enum CaptureKind {
    /// Selected text
    Selection { text: String },

    /// A link (or the page itself when no link is given)
    Link {
        /// Page URL
        page_url: String,
        /// Link target, if a link was captured
        #[arg(long)]
        link: Option<String>,
    },

    /// An image, inserted as markdown
    Image { src_url: String },
}

impl From<CaptureKind> for Capture {
    fn from(kind: CaptureKind) -> Self {
        match kind {
            CaptureKind::Selection { text } => Capture::Selection(text),
            CaptureKind::Link { page_url, link } => Capture::Link {
                link_url: link,
                page_url,
            },
            CaptureKind::Image { src_url } => Capture::Image { src_url },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output stays clean.
///
/// Environment:
///   LOG_FORMAT - "json" or "text" (default: "text")
///   RUST_LOG   - standard env filter (default: "quickmemo=warn")
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quickmemo=warn".into());
    let registry = tracing_subscriber::registry().with(env_filter);

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    if log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Returns whether the action succeeded.
async fn run(cli: Cli) -> anyhow::Result<bool> {
    let path = cli.config.unwrap_or_else(FileConfigStore::default_path);
    let store = FileConfigStore::new(&path);
    store
        .migrate()
        .await
        .with_context(|| format!("reading {}", path.display()))?;

    let client = MemosClient::from_env()?;
    let actions = PendingActions::new(store, client);
    let view = actions.open().await?;

    match cli.command {
        Commands::Login { url, token } => cmd_login(&actions, &url, &token).await,
        Commands::Capture { kind } => {
            let draft = actions.capture(&kind.into()).await?;
            print!("{}", draft);
            Ok(true)
        }
        Commands::Draft { text: None } => {
            if let Some(draft) = view.config.draft() {
                print!("{}", draft);
            }
            Ok(true)
        }
        Commands::Draft { text: Some(text) } => {
            actions.editor_blur(&text).await?;
            Ok(true)
        }
        Commands::Attach { source } => {
            let outcome = actions.upload(&UploadSource::parse(&source)).await?;
            Ok(report_upload(&outcome))
        }
        Commands::Resume => match actions.resume_upload().await? {
            Some(outcome) => Ok(report_upload(&outcome)),
            None => {
                println!("No interrupted upload");
                Ok(true)
            }
        },
        Commands::Submit { text } => cmd_submit(&actions, text.as_deref()).await,
        Commands::Visibility { value } => {
            actions.set_visibility(value).await?;
            println!("Default visibility: {}", value);
            Ok(true)
        }
        Commands::Tags => cmd_tags(&actions).await,
        Commands::Status => {
            let output = serde_json::json!({
                "config": path.to_string_lossy(),
                "configured": view.config.is_configured(),
                "visibility": view.config.visibility().as_str(),
                "draft": view.config.draft(),
                "upload_pending": view.config.upload_pending(),
                "attachments": view.config.resource_id_list,
                "idle": view.state.is_idle(),
                "notice": view.notice.map(|n| n.message_key()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(true)
        }
        Commands::Reset => {
            actions.reset().await?;
            Ok(true)
        }
    }
}

fn report(notice: Notice, detail: Option<&dyn std::fmt::Display>) -> bool {
    if notice.is_error() {
        match detail {
            Some(detail) => eprintln!("Error: {} ({})", notice, detail),
            None => eprintln!("Error: {}", notice),
        }
        false
    } else {
        println!("{}", notice);
        true
    }
}

async fn cmd_login(actions: &Actions, url: &str, token: &str) -> anyhow::Result<bool> {
    let outcome = actions.save_credentials(url, token).await?;
    Ok(match &outcome {
        CredentialsOutcome::Saved(user) => {
            println!("{} (user {})", outcome.notice(), user.user_id);
            true
        }
        CredentialsOutcome::Rejected(notice) => report(*notice, None),
        CredentialsOutcome::Failed { notice, error } => report(*notice, Some(error)),
    })
}

fn report_upload(outcome: &UploadOutcome) -> bool {
    match outcome {
        UploadOutcome::Staged(resource) => {
            let id = if resource.name.is_empty() {
                &resource.uid
            } else {
                &resource.name
            };
            println!("{}: {}", Notice::PicSuccess, id);
            true
        }
        UploadOutcome::Rejected(notice) => report(*notice, None),
        UploadOutcome::Failed { notice, error } => report(*notice, Some(error)),
        UploadOutcome::Discarded => {
            eprintln!("Upload superseded by a newer one");
            false
        }
    }
}

async fn cmd_submit(actions: &Actions, text: Option<&str>) -> anyhow::Result<bool> {
    let outcome = actions.submit(text).await?;
    Ok(match &outcome {
        SubmitOutcome::Created { memo, link } => {
            println!("{}: {}", outcome.notice(), memo.name);
            match link {
                LinkReport::Linked { names, dropped } => {
                    println!("Attached {} file(s)", names.len());
                    if *dropped > 0 {
                        eprintln!("Skipped {} attachment(s) without an id", dropped);
                    }
                }
                LinkReport::Skipped { dropped } => {
                    eprintln!("Skipped {} attachment(s) without an id", dropped);
                }
                LinkReport::Failed(error) => {
                    eprintln!("Warning: attachments were not linked ({})", error);
                }
                LinkReport::NothingStaged => {}
            }
            true
        }
        SubmitOutcome::Rejected(notice) => report(*notice, None),
        SubmitOutcome::Failed { notice, error } => report(*notice, Some(error)),
    })
}

async fn cmd_tags(actions: &Actions) -> anyhow::Result<bool> {
    let outcome = actions.tags().await?;
    Ok(match &outcome {
        TagsOutcome::Tags(tags) => {
            for (tag, count) in tags {
                println!("#{}\t{}", tag, count);
            }
            true
        }
        TagsOutcome::Empty => report(Notice::SearchNone, None),
        TagsOutcome::Rejected(notice) => report(*notice, None),
        TagsOutcome::Failed { notice, error } => report(*notice, Some(error)),
    })
}
