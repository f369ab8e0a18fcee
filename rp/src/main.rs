//! romplan - structured plan generation
//!
//! CLI entry point.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use romplan::cli::{Cli, Command, OutputFormat, get_log_path, resolve_user};
use romplan::config::Config;
use romplan::domain::{Plan, PlanRequest, RequestStatus};
use romplan::lifecycle::{edit_plan, submit};
use romplan::llm::create_client;
use romplan::pipeline::{JsonMode, Orchestrator, extract, fallback, normalize};
use romplan::prompts::PromptLoader;
use romplan::store::{RequestStore, SqliteStore};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing here can be traced
    let log_path = get_log_path();
    let log_dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Generate {
            need,
            file,
            user,
            format,
        } => {
            let user = resolve_user(user.as_deref());
            cmd_generate(&config, &user, &need, file, format).await
        }
        Command::Fallback { need, format } => cmd_fallback(&need, format),
        Command::Requests { user, format } => {
            let user = resolve_user(user.as_deref());
            cmd_requests(&config, &user, format).await
        }
        Command::Show { id, format } => cmd_show(&config, &id, format).await,
        Command::Edit { id, path, format } => cmd_edit(&config, &id, path.as_ref(), format).await,
        Command::Extract { path, array } => cmd_extract(path.as_ref(), array),
    }
}

fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&config.storage.db_path)
        .with_context(|| format!("Failed to open request store at {}", config.storage.db_path.display()))
}

/// Run the pipeline for a need and record the request
async fn cmd_generate(
    config: &Config,
    user: &str,
    need: &str,
    file_ref: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    debug!(%user, %need, ?file_ref, "cmd_generate: called");
    let client = create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = PromptLoader::new(config.pipeline.prompts_dir.as_deref());
    let orchestrator = Orchestrator::new(client, prompts, config.pipeline.clone());
    let store = open_store(config)?;

    let submission = submit(&store, &orchestrator, user, need, file_ref)
        .await
        .context("Failed to submit request")?;

    match format {
        OutputFormat::Json => print_json(&submission.request)?,
        OutputFormat::Text => {
            print_request_header(&submission.request);
            println!();
            print_plan(&submission.outcome.plan);
        }
    }
    Ok(())
}

fn cmd_fallback(need: &str, format: OutputFormat) -> Result<()> {
    debug!(%need, "cmd_fallback: called");
    let plan = fallback(need);
    match format {
        OutputFormat::Json => print_json(&plan),
        OutputFormat::Text => {
            print_plan(&plan);
            Ok(())
        }
    }
}

/// List a user's requests, newest first
async fn cmd_requests(config: &Config, user: &str, format: OutputFormat) -> Result<()> {
    debug!(%user, "cmd_requests: called");
    let store = open_store(config)?;
    let requests = store.list_for_user(user).await.context("Failed to list requests")?;

    if let OutputFormat::Json = format {
        return print_json(&requests);
    }

    if requests.is_empty() {
        println!("No requests for {}", user);
        return Ok(());
    }

    for request in &requests {
        let goal = request.plan().map(|p| p.goal).unwrap_or_default();
        println!(
            "{}  {}  {:<10}  {}",
            request.created_at.format("%Y-%m-%d %H:%M"),
            request.id.dimmed(),
            status_label(request.status),
            if goal.is_empty() { request.need.clone() } else { goal }
        );
        if let Some(error) = request.error() {
            println!("    {} {}", "error:".red(), error);
        }
    }
    Ok(())
}

async fn cmd_show(config: &Config, id: &str, format: OutputFormat) -> Result<()> {
    debug!(%id, "cmd_show: called");
    let store = open_store(config)?;
    let request = store
        .get(id)
        .await
        .context("Failed to read request")?
        .ok_or_else(|| eyre!("Request not found: {}", id))?;

    match format {
        OutputFormat::Json => print_json(&request),
        OutputFormat::Text => {
            print_request_header(&request);
            if let Some(plan) = request.plan() {
                println!();
                print_plan(&plan);
            }
            Ok(())
        }
    }
}

/// Store an edited plan for a complete request
async fn cmd_edit(config: &Config, id: &str, path: Option<&PathBuf>, format: OutputFormat) -> Result<()> {
    debug!(%id, ?path, "cmd_edit: called");
    let raw = read_input(path)?;
    let edited: serde_json::Value = serde_json::from_str(&raw).context("Edited plan is not valid JSON")?;

    let store = open_store(config)?;
    let request = edit_plan(&store, id, &edited)
        .await
        .with_context(|| format!("Failed to edit request {}", id))?;

    match format {
        OutputFormat::Json => print_json(&request),
        OutputFormat::Text => {
            print_request_header(&request);
            if let Some(plan) = request.plan() {
                println!();
                print_plan(&plan);
            }
            Ok(())
        }
    }
}

/// Contents of `path`, or all of stdin
fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Extract JSON from raw model text; object mode also enforces the plan schema
fn cmd_extract(path: Option<&PathBuf>, array: bool) -> Result<()> {
    debug!(?path, %array, "cmd_extract: called");
    let raw = read_input(path)?;

    let mode = if array { JsonMode::Array } else { JsonMode::Object };
    let value = extract(&raw, mode)?;
    if array {
        return print_json(&value);
    }
    let plan = normalize(&value)?;
    print_json(&plan)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

fn status_label(status: RequestStatus) -> String {
    match status {
        RequestStatus::Generating => status.to_string().yellow().to_string(),
        RequestStatus::Complete => status.to_string().green().to_string(),
        RequestStatus::Failed => status.to_string().red().to_string(),
    }
}

fn print_request_header(request: &PlanRequest) {
    println!("{} {}", "Request".bold(), request.id);
    println!("  need:    {}", request.need);
    if let Some(file_ref) = &request.file_ref {
        println!("  file:    {}", file_ref);
    }
    println!("  status:  {}", status_label(request.status));
    println!("  created: {}", request.created_at.to_rfc3339());
    if let Some(error) = request.error() {
        println!("  {}   {}", "error:".red(), error);
        println!("  {}", "Showing the fallback plan.".dimmed());
    }
}

fn print_plan(plan: &Plan) {
    println!("{}", plan.goal.bold());
    for phase in &plan.phases {
        println!();
        println!("{}", phase.title.cyan().bold());
        for task in &phase.tasks {
            println!(
                "  [{}] {} ({}, {} -> {})",
                task.task_id,
                task.title.bold(),
                task.owner,
                task.start_date,
                task.end_date
            );
            if !task.success_metric.is_empty() {
                println!("      {} {}", "metric:".dimmed(), task.success_metric);
            }
            println!("      {} {}", "how:".dimmed(), task.instruction);
            println!("      {} {}", "e.g.:".dimmed(), task.example);
        }
    }
}
