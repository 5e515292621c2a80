#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]
// crates/evidex-cli/src/main.rs
// ============================================================================
// Module: Evidex CLI Entry Point
// Description: Command dispatcher for launching evidex-server and driving
//              its HTTP surface.
// Purpose: Provide a safe, localized CLI for server and case workflows.
// Dependencies: clap, evidex-config, evidex-contract, evidex-hypothesis,
//               evidex-server, evidex-store-sqlite, reqwest, serde, tokio
// ============================================================================

//! ## Overview
//! The Evidex CLI has two faces: `serve` loads an [`evidex_config::AppConfig`],
//! opens the evidence model store, and runs [`evidex_server::serve`] in the
//! current process; every `case` subcommand is a thin HTTP client call
//! against an already-running server, following the same request/response
//! DTOs `evidex-server`'s handlers accept. All user-facing strings are
//! routed through the i18n catalog to prepare for future localization.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use evidex_cli::serve_policy;
use evidex_cli::t;
use evidex_config::AppConfig;
use evidex_contract::types::ChatRequest;
use evidex_contract::types::ChatResponse;
use evidex_contract::types::CreateCaseRequest;
use evidex_contract::types::CreateCaseResponse;
use evidex_contract::types::FullAnalysisRequest;
use evidex_contract::types::ImportFixtureRequest;
use evidex_contract::types::ImportFixtureResponse;
use evidex_contract::types::PipelineRunResponse;
use evidex_contract::types::RunStageRequest;
use evidex_contract::types::ScoreJudgmentRequest;
use evidex_hypothesis::QualityReportV1;
use evidex_server::AppState;
use evidex_store_sqlite::EvidexSqliteStore;
use evidex_store_sqlite::SqliteStoreConfig;
use evidex_store_sqlite::SqliteStoreMode;
use evidex_store_sqlite::SqliteSyncMode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "evidex", disable_help_subcommand = true, disable_version_flag = true, arg_required_else_help = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the evidex-server HTTP/WebSocket listener.
    Serve(ServeCommand),
    /// Case lifecycle and analysis commands against a running server.
    Case {
        /// Selected case subcommand.
        #[command(subcommand)]
        command: CaseCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Path to the TOML application config.
    #[arg(long, value_name = "PATH")]
    config: PathBuf,
    /// Path to the SQLite evidence model store file.
    #[arg(long, value_name = "PATH")]
    store: PathBuf,
    /// Directory artifact bytes are stored under.
    #[arg(long, value_name = "DIR")]
    artifacts: PathBuf,
    /// Address to bind the HTTP/WebSocket listener to.
    #[arg(long, value_name = "ADDR", default_value = "127.0.0.1:8080")]
    bind: String,
    /// Allow binding to a non-loopback address.
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Case subcommands.
#[derive(Subcommand, Debug)]
enum CaseCommand {
    /// Create a new case.
    Create(CaseCreateCommand),
    /// Import a named fixture bundle into a case.
    ImportFixture(CaseImportFixtureCommand),
    /// Run the default (or named) playbook over a case.
    RunPipeline(CaseRunPipelineCommand),
    /// Run a single pipeline stage over a case.
    RunStage(CaseRunStageCommand),
    /// Ask a grounded question about a case.
    Chat(CaseChatCommand),
    /// Score an existing judgment's evidence quality.
    ScoreJudgment(CaseScoreJudgmentCommand),
}

/// Shared server-address argument for every `case` subcommand.
#[derive(Args, Debug)]
struct ServerArg {
    /// Base URL of a running evidex-server instance.
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8080")]
    server: String,
}

/// Arguments for `case create`.
#[derive(Args, Debug)]
struct CaseCreateCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case title.
    #[arg(long)]
    title: String,
    /// Acting principal.
    #[arg(long)]
    actor: Option<String>,
    /// Rationale recorded on the creating action.
    #[arg(long)]
    rationale: Option<String>,
}

/// Arguments for `case import-fixture`.
#[derive(Args, Debug)]
struct CaseImportFixtureCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case to import into.
    #[arg(long)]
    case: String,
    /// Fixture bundle name.
    #[arg(long)]
    fixture_name: String,
}

/// Arguments for `case run-pipeline`.
#[derive(Args, Debug)]
struct CaseRunPipelineCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case to run the playbook over.
    #[arg(long)]
    case: String,
    /// Named playbook; defaults to the platform default when omitted.
    #[arg(long)]
    playbook: Option<String>,
}

/// Arguments for `case run-stage`.
#[derive(Args, Debug)]
struct CaseRunStageCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case to run the stage over.
    #[arg(long)]
    case: String,
    /// Stage name to run in isolation.
    #[arg(long)]
    stage: String,
}

/// Arguments for `case chat`.
#[derive(Args, Debug)]
struct CaseChatCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case to ask about.
    #[arg(long)]
    case: String,
    /// Natural-language question.
    #[arg(long)]
    question: String,
}

/// Arguments for `case score-judgment`.
#[derive(Args, Debug)]
struct CaseScoreJudgmentCommand {
    #[command(flatten)]
    target: ServerArg,
    /// Case the judgment belongs to.
    #[arg(long)]
    case: String,
    /// Judgment to score.
    #[arg(long)]
    judgment_uid: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for localized error messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a localized message.
    const fn new(message: String) -> Self {
        Self { message }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    match cli.command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Case { command } => command_case(command).await,
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = AppConfig::load(&command.config)
        .map_err(|err| CliError::new(t!("serve.config.load_failed", path = command.config.display(), error = err)))?;

    let allow_non_loopback = serve_policy::resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let outcome =
        serve_policy::resolve_bind(&command.bind, allow_non_loopback).map_err(|err| CliError::new(err.to_string()))?;
    if outcome.network_exposed {
        write_stderr_line(&t!("serve.warn.local_only", bind = command.bind))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }

    let store_path = command.store.display().to_string();
    let store = EvidexSqliteStore::open(SqliteStoreConfig {
        path: command.store,
        busy_timeout_ms: 5_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Full,
    })
    .map_err(|err| CliError::new(t!("serve.store.open_failed", path = store_path, error = err)))?;

    let state = Arc::new(
        AppState::new(config, store, command.artifacts)
            .map_err(|err| CliError::new(t!("serve.state.build_failed", error = err)))?,
    );

    evidex_server::serve(outcome.addr, state)
        .await
        .map_err(|err| CliError::new(t!("serve.failed", error = err)))?;

    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Case Commands
// ============================================================================

/// Dispatches case subcommands.
async fn command_case(command: CaseCommand) -> CliResult<ExitCode> {
    match command {
        CaseCommand::Create(command) => case_create(command).await,
        CaseCommand::ImportFixture(command) => case_import_fixture(command).await,
        CaseCommand::RunPipeline(command) => case_run_pipeline(command).await,
        CaseCommand::RunStage(command) => case_run_stage(command).await,
        CaseCommand::Chat(command) => case_chat(command).await,
        CaseCommand::ScoreJudgment(command) => case_score_judgment(command).await,
    }
}

async fn case_create(command: CaseCreateCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = CreateCaseRequest { title: command.title, actor_id: command.actor, rationale: command.rationale };
    let response: CreateCaseResponse = client
        .post_json("/cases", &request)
        .await
        .map_err(|err| CliError::new(t!("case.create.failed", error = err)))?;
    write_stdout_line(&t!("case.create.ok", case_uid = response.case_uid, title = response.title))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

async fn case_import_fixture(command: CaseImportFixtureCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = ImportFixtureRequest { fixture_name: command.fixture_name.clone() };
    let response: ImportFixtureResponse = client
        .post_json(&format!("/cases/{}/fixtures/import", command.case), &request)
        .await
        .map_err(|err| CliError::new(t!("case.fixture.import_failed", fixture_name = command.fixture_name, error = err)))?;
    write_stdout_line(&t!(
        "case.fixture.import_ok",
        fixture_name = command.fixture_name,
        case_uid = command.case,
        evidence_count = response.evidence_uids.len(),
        assertion_count = response.assertion_uids.len(),
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

async fn case_run_pipeline(command: CaseRunPipelineCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = FullAnalysisRequest { playbook_name: command.playbook };
    let response: PipelineRunResponse = client
        .post_json(&format!("/cases/{}/pipelines/full_analysis", command.case), &request)
        .await
        .map_err(|err| CliError::new(t!("pipeline.run.failed", error = err)))?;
    print_pipeline_response(&response)
}

async fn case_run_stage(command: CaseRunStageCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = RunStageRequest { stage_name: command.stage };
    let response: PipelineRunResponse = client
        .post_json(&format!("/cases/{}/pipelines/run_stage", command.case), &request)
        .await
        .map_err(|err| CliError::new(t!("pipeline.run.failed", error = err)))?;
    print_pipeline_response(&response)
}

fn print_pipeline_response(response: &PipelineRunResponse) -> CliResult<ExitCode> {
    write_stdout_line(&t!(
        "pipeline.run.ok",
        run_uid = response.run_uid,
        status = response.status,
        stage_count = response.completed_stages.len(),
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

async fn case_chat(command: CaseChatCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = ChatRequest { question: command.question };
    let response: ChatResponse = client
        .post_json(&format!("/cases/{}/analysis/chat", command.case), &request)
        .await
        .map_err(|err| CliError::new(t!("chat.ask.failed", error = err)))?;
    write_stdout_line(&t!("chat.ask.ok", answer_type = format!("{:?}", response.answer_type), answer_text = response.answer_text))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

async fn case_score_judgment(command: CaseScoreJudgmentCommand) -> CliResult<ExitCode> {
    let client = ApiClient::new(&command.target.server);
    let request = ScoreJudgmentRequest { judgment_uid: command.judgment_uid };
    let report: QualityReportV1 = client
        .post_json(&format!("/cases/{}/quality/score_judgment", command.case), &request)
        .await
        .map_err(|err| CliError::new(t!("quality.score.failed", error = err)))?;
    write_stdout_line(&t!(
        "quality.score.ok",
        evidence_coverage = report.evidence_coverage,
        source_diversity = report.source_diversity,
        confidence_calibration = report.confidence_calibration,
        narrative_coherence = report.narrative_coherence,
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: HTTP Client
// ============================================================================

/// Minimal JSON HTTP client driving evidex-server's endpoints.
struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors raised while calling a remote evidex-server endpoint.
#[derive(Debug, Error)]
enum ApiClientError {
    /// The request itself failed (connection refused, timeout, ...).
    #[error("{0}")]
    Request(String),
    /// The server returned a non-success status.
    #[error("{0}")]
    Status(String),
    /// The response body failed to decode as the expected JSON shape.
    #[error("{0}")]
    Decode(String),
}

impl ApiClient {
    fn new(base_url: &str) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.trim_end_matches('/').to_string() }
    }

    async fn post_json<Req: Serialize + ?Sized, Resp: DeserializeOwned>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, ApiClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| ApiClientError::Request(t!("http.request_failed", url = url, error = err)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiClientError::Status(t!("http.status_error", url = url, status = status, body = body)));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|err| ApiClientError::Decode(t!("http.decode_failed", url = url, error = err)))
    }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    use std::io::Write;
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats a localized output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
