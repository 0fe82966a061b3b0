use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use autofill_cli::config::load_config;
use autofill_cli::storage::{self, JsonFileStore, LocalStore};
use autofill_cli::{AutofillConfig, ContentHost};
use autofill_core_types::{FillResult, Profile, RawFieldCatalog, ResumeFile};
use base64::{engine::general_purpose::STANDARD as Base64, Engine as _};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use command_channel::{
    Command, CommandChannel, CommandResponse, FillFormPayload, InProcessTransport,
    MatchScorePayload, QuestionPayload, QuickFillPayload, SaveAnswerPayload,
};
use form_engine::MemoryDom;
use serde::de::DeserializeOwned;
use tokio::fs;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Autofill - fill job application forms from a stored profile
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long)]
    debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum OutputFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a page from a profile
    Fill(FillArgs),

    /// Report whether the page side is ready and how many controls it sees
    Status(PageArgs),

    /// List required controls that are still empty
    Checklist(PageArgs),

    /// Score the stored profile against a job posting
    MatchScore {
        /// Job posting as plain text
        #[arg(long, value_name = "FILE")]
        job: PathBuf,
    },

    /// Manage saved answers to free-text questions
    Answers {
        #[command(subcommand)]
        action: AnswersAction,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Page fixture (JSON)
    #[arg(long, value_name = "FILE")]
    page: PathBuf,
}

#[derive(Args)]
struct FillArgs {
    #[command(flatten)]
    page: PageArgs,

    /// Classified field catalog (JSON)
    #[arg(long, value_name = "FILE")]
    fields: PathBuf,

    /// Profile to fill from; the stored profile is used when omitted
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Cache this file as the resume before filling
    #[arg(long, value_name = "FILE")]
    resume: Option<PathBuf>,

    /// Also store the given profile for later quick fills
    #[arg(long)]
    save_profile: bool,
}

#[derive(Subcommand)]
enum AnswersAction {
    /// List saved answers
    List,

    /// Save an answer
    Save {
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },

    /// Suggest an answer for a question
    Generate {
        #[arg(long)]
        question: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;
    init_logging(cli.log_level.as_deref(), cli.debug, &config)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_DATE"),
        "Starting autofill"
    );

    let store_path = config.store_path()?;
    info!(store = %store_path.display(), "configuration ready");
    let store: Arc<dyn LocalStore> = Arc::new(JsonFileStore::new(store_path));
    let result = run(cli.command, cli.output, &config, store).await;

    if let Err(err) = &result {
        error!("Command failed: {err:#}");
    }
    result
}

fn init_logging(level: Option<&str>, debug: bool, config: &AutofillConfig) -> Result<()> {
    let level: tracing::Level = if debug {
        tracing::Level::DEBUG
    } else {
        level
            .or(config.log_level.as_deref())
            .unwrap_or("info")
            .parse()
            .context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

async fn run(
    command: Commands,
    output: OutputFormat,
    config: &AutofillConfig,
    store: Arc<dyn LocalStore>,
) -> Result<()> {
    match command {
        Commands::Fill(args) => {
            if let Some(path) = &args.resume {
                let resume = read_resume(path).await?;
                storage::save_resume(store.as_ref(), &resume).await?;
                info!(file = %resume.name, bytes = resume.size, "resume cached");
            }
            let fields: RawFieldCatalog = read_json(&args.fields).await?;
            let command = match &args.profile {
                Some(path) => {
                    let profile: Profile = read_json(path).await?;
                    if args.save_profile {
                        storage::save_profile(store.as_ref(), &profile).await?;
                    }
                    Command::FillForm(FillFormPayload {
                        profile: Some(profile),
                        fields,
                    })
                }
                None => Command::QuickFill(QuickFillPayload { fields }),
            };
            let response = send(&args.page.page, config, store, command).await?;
            print_fill(&response, output)
        }
        Commands::Status(args) => {
            let response = send(&args.page, config, store, Command::GetStatus).await?;
            print_response(&response, output)
        }
        Commands::Checklist(args) => {
            let response = send(&args.page, config, store, Command::ValidateForm).await?;
            print_response(&response, output)
        }
        Commands::MatchScore { job } => {
            let job_text = fs::read_to_string(&job)
                .await
                .with_context(|| format!("Failed to read {}", job.display()))?;
            let command = Command::GetMatchScore(MatchScorePayload { job_text });
            let response = send_detached(config, store, command).await?;
            print_response(&response, output)
        }
        Commands::Answers { action } => {
            let command = match action {
                AnswersAction::List => Command::GetAnswerLibrary,
                AnswersAction::Save { question, answer } => {
                    Command::SaveAnswer(SaveAnswerPayload { question, answer })
                }
                AnswersAction::Generate { question } => {
                    Command::GenerateAnswer(QuestionPayload { question })
                }
            };
            let response = send_detached(config, store, command).await?;
            print_response(&response, output)
        }
    }
}

/// Loads the page, wires the host behind a channel and sends `command`.
async fn send(
    page: &Path,
    config: &AutofillConfig,
    store: Arc<dyn LocalStore>,
    command: Command,
) -> Result<CommandResponse> {
    let raw = fs::read_to_string(page)
        .await
        .with_context(|| format!("Failed to read page fixture {}", page.display()))?;
    let dom = Arc::new(MemoryDom::from_fixture(&raw)?);
    deliver(dom, config, store, command).await
}

/// Commands that never touch the page run against an empty document.
async fn send_detached(
    config: &AutofillConfig,
    store: Arc<dyn LocalStore>,
    command: Command,
) -> Result<CommandResponse> {
    let dom = Arc::new(MemoryDom::new(Default::default()));
    deliver(dom, config, store, command).await
}

async fn deliver(
    dom: Arc<MemoryDom>,
    config: &AutofillConfig,
    store: Arc<dyn LocalStore>,
    command: Command,
) -> Result<CommandResponse> {
    let host = ContentHost::new(dom, store, config.pacing.clone());
    let transport = InProcessTransport::new(Arc::new(host));
    let (events, _) = broadcast::channel(16);
    let channel = CommandChannel::new(transport, config.channel.clone(), events);
    let response = channel.send(command).await?;
    if !response.success {
        bail!(response
            .error
            .unwrap_or_else(|| "command failed".to_string()));
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn read_resume(path: &Path) -> Result<ResumeFile> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("Failed to read resume {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume".to_string());
    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    };
    Ok(ResumeFile {
        size: bytes.len() as u64,
        encoded_data: format!("data:{mime_type};base64,{}", Base64.encode(&bytes)),
        mime_type: mime_type.to_string(),
        name,
        uploaded_at: Some(Utc::now()),
    })
}

fn print_fill(response: &CommandResponse, output: OutputFormat) -> Result<()> {
    if let OutputFormat::Json = output {
        return print_response(response, output);
    }
    let result: FillResult =
        serde_json::from_value(response.data.clone()).context("Malformed fill result")?;
    println!(
        "filled {}, skipped {}, errors {}",
        result.filled_fields.len(),
        result.skipped_fields.len(),
        result.errors.len()
    );
    for filled in &result.filled_fields {
        println!("  + {:<24} {}", filled.field, filled.value);
    }
    for skipped in &result.skipped_fields {
        println!("  - {:<24} {}", skipped.field, skipped.reason);
    }
    for failed in &result.errors {
        println!("  ! {:<24} {}", failed.field, failed.message);
    }
    Ok(())
}

fn print_response(response: &CommandResponse, output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Human => println!("{}", serde_yaml::to_string(&response.data)?),
    }
    Ok(())
}
