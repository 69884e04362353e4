#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Context as _;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tfci_core::coordination::{PublishOutcome, ReportPublisher};
use tfci_core::output::json_format::format_diagnostics;
use tfci_core::output::{OutputWriter, TerraformReport, WorkflowCommands};
use tfci_core::types::{host_platform, UNKNOWN};
use tfci_core::{
    ClassifierConfig, Context, GateConfig, GitHubApiClient, ReportInputs,
};

#[derive(Parser)]
#[command(
    name = "tfci",
    version,
    about = "Terraform end-to-end CI helper for GitHub Actions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Decide whether tests run for this event (sets `should_run`)
    Gate(GateArgs),
    /// Map changed files to test targets (sets `changes`)
    Classify(ClassifyArgs),
    /// Post the Terraform report and fail on plan/test errors
    Report(ReportArgs),
}

#[derive(clap::Args)]
struct GateArgs {
    /// Comment token that requests approval
    #[arg(long, env = "INPUT_COMMAND", default_value = "/allow")]
    command: String,

    /// Seconds per jitter slot before checking comments
    #[arg(long, env = "INPUT_JITTER_SECONDS", default_value_t = 1)]
    jitter_seconds: u64,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "INPUT_OUTPUT_FORMAT")]
    output_format: Option<String>,
}

#[derive(clap::Args)]
struct ClassifyArgs {
    /// Comma-separated changed files (or directories for manual dispatch)
    #[arg(long, env = "INPUT_CHANGES", default_value = "")]
    changes: String,

    /// Root whose subdirectories are retested when modules change
    #[arg(long, env = "INPUT_SRC_CORE", default_value = "configurations")]
    src_core: String,

    /// Directory paths are resolved against (default: current directory)
    #[arg(long, env = "INPUT_BASE_DIR")]
    base_dir: Option<String>,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "INPUT_OUTPUT_FORMAT")]
    output_format: Option<String>,
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Terraform working directory
    #[arg(long, env = "INPUT_WORKDIR")]
    workdir: String,

    /// Terraform version
    #[arg(long = "tf-version", env = "INPUT_TFVERSION_VERSION")]
    tf_version: String,

    /// Terraform platform (default: host `{os}_{arch}`)
    #[arg(long = "tf-platform", env = "INPUT_TFVERSION_PLATFORM")]
    tf_platform: Option<String>,

    /// `terraform fmt` outcome
    #[arg(long, env = "INPUT_TFFMT_OUTCOME")]
    fmt_outcome: Option<String>,

    /// `terraform init` outcome
    #[arg(long, env = "INPUT_TFINIT_OUTCOME")]
    init_outcome: Option<String>,

    /// `terraform validate` outcome
    #[arg(long, env = "INPUT_TFVALIDATE_OUTCOME")]
    validate_outcome: Option<String>,

    /// `terraform validate` stdout file
    #[arg(long, env = "INPUT_TFVALIDATE_STDOUT_FILE")]
    validate_stdout_file: Option<String>,

    /// `terraform validate` stderr file
    #[arg(long, env = "INPUT_TFVALIDATE_STDERR_FILE")]
    validate_stderr_file: Option<String>,

    /// `terraform plan` outcome
    #[arg(long, env = "INPUT_TFPLAN_OUTCOME")]
    plan_outcome: Option<String>,

    /// `terraform plan` exit code
    #[arg(long, env = "INPUT_TFPLAN_EXITCODE")]
    plan_exit_code: Option<String>,

    /// `terraform plan` stdout file
    #[arg(long, env = "INPUT_TFPLAN_STDOUT_FILE")]
    plan_stdout_file: Option<String>,

    /// `terraform plan` stderr file
    #[arg(long, env = "INPUT_TFPLAN_STDERR_FILE")]
    plan_stderr_file: Option<String>,

    /// Rendered plan file
    #[arg(long, env = "INPUT_TFPLAN_FILE")]
    plan_file: Option<String>,

    /// `terraform test` outcome
    #[arg(long, env = "INPUT_TFTEST_OUTCOME")]
    test_outcome: Option<String>,

    /// `terraform test` exit code
    #[arg(long, env = "INPUT_TFTEST_EXITCODE")]
    test_exit_code: Option<String>,

    /// `terraform test` stdout file
    #[arg(long, env = "INPUT_TFTEST_STDOUT_FILE")]
    test_stdout_file: Option<String>,

    /// `terraform test` stderr file
    #[arg(long, env = "INPUT_TFTEST_STDERR_FILE")]
    test_stderr_file: Option<String>,

    /// Pusher shown for non pull request events
    #[arg(long, env = "INPUT_OWNER")]
    owner: Option<String>,

    /// GitHub token for API access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

/// Output format for the CLI
#[derive(Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// GitHub Actions: write to $GITHUB_OUTPUT + annotations on stdout
    Gha,
    /// JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Gate(args) => run_gate(args),
        Commands::Classify(args) => run_classify(args),
        Commands::Report(args) => run_report(args),
    };
    std::process::exit(code);
}

/// Logs go to stderr so stdout stays free for workflow commands
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env("TFCI_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().filter(|s| !s.is_empty())
}

fn clean_or(v: &Option<String>, default: &str) -> String {
    clean_opt(v).unwrap_or(default).to_string()
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")
}

/// Print `::error::` and return the failing exit code
fn fail(err: &anyhow::Error) -> i32 {
    tracing::error!(error = %format!("{:#}", err), "command failed");
    let mut cmds = WorkflowCommands::stdout();
    let _ = cmds.error(&format!("{:#}", err));
    1
}

fn run_gate(args: GateArgs) -> i32 {
    let format = OutputFormat::detect(clean_opt(&args.output_format));
    match gate(&args) {
        Ok(should_run) => match write_outputs(format, &[("should_run", should_run.to_string())]) {
            Ok(()) => {
                let mut cmds = WorkflowCommands::stdout();
                let _ = cmds.info(&format!(
                    "Should run tests: {}",
                    if should_run { "✅ Yes" } else { "❌ No" }
                ));
                0
            }
            Err(e) => fail(&e),
        },
        Err(e) => fail(&e),
    }
}

fn gate(args: &GateArgs) -> anyhow::Result<bool> {
    let ctx = Context::from_env().context("failed to load workflow context")?;
    let config = GateConfig {
        command: args.command.clone(),
        jitter_unit: Duration::from_secs(args.jitter_seconds),
    };
    let token = clean_opt(&args.token).map(str::to_string);

    let rt = runtime()?;
    let decision = rt
        .block_on(tfci_core::evaluate_gate(&ctx, &config, token))
        .context("approval gate failed")?;
    Ok(decision.should_run)
}

fn run_classify(args: ClassifyArgs) -> i32 {
    let format = OutputFormat::detect(clean_opt(&args.output_format));
    let base_dir = clean_opt(&args.base_dir)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let src_core = match args.src_core.trim() {
        "" => ClassifierConfig::default().src_core,
        root => root.to_string(),
    };
    let config = ClassifierConfig { src_core, base_dir };

    let result = tfci_core::classify_from_env(&args.changes, &config)
        .context("failed to classify changes");

    let classification = match result {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    for d in &classification.diagnostics {
        tracing::warn!(category = ?d.category, "{}", d.message);
    }

    let json = classification.to_json();
    let written = match format {
        OutputFormat::Gha => {
            let mut cmds = WorkflowCommands::stdout();
            let _ = cmds.diagnostics(&classification.diagnostics);
            let _ = cmds.info(&format!(
                "Test targets ({}): {}",
                classification.targets.len(),
                json
            ));
            write_outputs(format, &[("changes", json)])
        }
        OutputFormat::Json => {
            let diagnostics: serde_json::Value =
                serde_json::from_str(&format_diagnostics(&classification.diagnostics))
                    .unwrap_or_else(|_| serde_json::json!([]));
            let output = serde_json::json!({
                "changes": classification.targets,
                "diagnostics": diagnostics,
            });
            print_json(&output)
        }
        OutputFormat::Text => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            let _ = writeln!(w, "Test targets: {}", classification.targets.len());
            for t in &classification.targets {
                let _ = writeln!(w, "  {} ({})", t.path, t.name);
            }
            if !classification.diagnostics.is_empty() {
                let _ = writeln!(w, "\nDiagnostics:");
                for d in &classification.diagnostics {
                    let _ = writeln!(w, "  [{:?}] {}", d.severity, d.message);
                }
            }
            Ok(())
        }
    };

    match written {
        Ok(()) => 0,
        Err(e) => fail(&e),
    }
}

fn run_report(args: ReportArgs) -> i32 {
    let ctx = match Context::from_env().context("failed to load workflow context") {
        Ok(ctx) => ctx,
        Err(e) => return fail(&e),
    };

    if args.workdir.trim().is_empty() {
        return fail(&anyhow::anyhow!("Input required and not supplied: WORKDIR"));
    }
    if args.tf_version.trim().is_empty() {
        return fail(&anyhow::anyhow!(
            "Input required and not supplied: TFVERSION_VERSION"
        ));
    }

    let defaults = ReportInputs::default();
    let inputs = ReportInputs {
        workdir: args.workdir.clone(),
        tf_version: args.tf_version.clone(),
        tf_platform: clean_opt(&args.tf_platform)
            .map(str::to_string)
            .unwrap_or_else(host_platform),
        fmt_outcome: clean_or(&args.fmt_outcome, UNKNOWN),
        init_outcome: clean_or(&args.init_outcome, UNKNOWN),
        validate_outcome: clean_or(&args.validate_outcome, UNKNOWN),
        validate_stdout_file: clean_or(&args.validate_stdout_file, &defaults.validate_stdout_file),
        validate_stderr_file: clean_or(&args.validate_stderr_file, &defaults.validate_stderr_file),
        plan_outcome: clean_or(&args.plan_outcome, UNKNOWN),
        plan_exit_code: clean_or(&args.plan_exit_code, UNKNOWN),
        plan_stdout_file: clean_or(&args.plan_stdout_file, &defaults.plan_stdout_file),
        plan_stderr_file: clean_or(&args.plan_stderr_file, &defaults.plan_stderr_file),
        plan_file: clean_or(&args.plan_file, &defaults.plan_file),
        test_outcome: clean_or(&args.test_outcome, UNKNOWN),
        test_exit_code: clean_or(&args.test_exit_code, UNKNOWN),
        test_stdout_file: clean_or(&args.test_stdout_file, &defaults.test_stdout_file),
        test_stderr_file: clean_or(&args.test_stderr_file, &defaults.test_stderr_file),
        owner: clean_opt(&args.owner).map(str::to_string),
    };

    let report = TerraformReport::load(inputs, &ctx);
    let mut cmds = WorkflowCommands::stdout();
    let _ = cmds.diagnostics(report.diagnostics());

    let client = GitHubApiClient::new(
        ctx.api_url.as_str(),
        clean_opt(&args.token).map(str::to_string),
        ctx.repo.clone(),
    );
    let published = runtime().and_then(|rt| {
        rt.block_on(ReportPublisher::new(&client).publish(&report, &ctx))
            .context("failed to publish report")
    });
    let posted = match published {
        Ok(PublishOutcome::CreatedIssue { number, url }) => {
            tracing::info!(number, url = url.as_deref().unwrap_or(""), "report issue created");
            true
        }
        Ok(outcome) => {
            tracing::debug!(?outcome, "report published");
            true
        }
        Err(e) => {
            fail(&e);
            false
        }
    };

    for (title, body) in report.log_groups() {
        let _ = cmds.group(title, body);
    }

    for failure in report.failures() {
        let _ = cmds.error(failure);
    }
    let _ = cmds.flush();
    report.exit_code(posted)
}

/// Set step outputs, or print them for non-Actions formats
fn write_outputs(format: OutputFormat, outputs: &[(&str, String)]) -> anyhow::Result<()> {
    match format {
        OutputFormat::Gha => {
            let writer = OutputWriter::from_env();
            for (name, value) in outputs {
                writer
                    .set(name, value)
                    .with_context(|| format!("failed to set output {}", name))?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = outputs
                .iter()
                .map(|(k, v)| {
                    let value = serde_json::from_str(v)
                        .unwrap_or_else(|_| serde_json::Value::String(v.clone()));
                    (k.to_string(), value)
                })
                .collect();
            print_json(&serde_json::Value::Object(map))
        }
        OutputFormat::Text => {
            let stdout = std::io::stdout();
            let mut w = stdout.lock();
            for (name, value) in outputs {
                writeln!(w, "{}: {}", name, value)?;
            }
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer(&mut lock, value)?;
    writeln!(lock)?;
    Ok(())
}
