use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use color_print::cformat;
use serde::Serialize;

use safesave::label::{self, Severity};
use safesave::session::TICK_INTERVAL;
use safesave::{
    ActionAvailability, ActionResult, EditorState, Probes, SafeSaveConfig, Session,
    SourceControlStatus, UiSink, resolve_preferred_provider,
};

/// Long enough for a slow network fetch; the CLIs themselves have no timeout.
const COMMAND_WAIT: Duration = Duration::from_secs(600);

#[derive(Parser)]
#[command(name = "safesave")]
#[command(about = "Git / Plastic SCM status and gated sync actions", long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Source control integration to prefer instead of auto-detecting
    #[arg(long, global = true, value_enum)]
    provider: Option<ProviderArg>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Git,
    Plastic,
}

impl ProviderArg {
    fn integration_name(self) -> &'static str {
        match self {
            ProviderArg::Git => "Git",
            ProviderArg::Plastic => "Plastic SCM",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Probe once and print the status
    Status {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep polling and report changes until interrupted
    Watch,
    /// Fetch from the Git remote
    Fetch,
    /// Pull from upstream with rebase
    Pull {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Push local commits to upstream
    Push {
        #[arg(short, long)]
        yes: bool,
    },
    /// Update the Plastic SCM workspace
    Update {
        #[arg(short, long)]
        yes: bool,
    },
}

/// The CLI has no editor, so there is never unsaved work.
struct CliEditor {
    provider: Option<ProviderArg>,
}

impl EditorState for CliEditor {
    fn source_control_provider(&self) -> Option<String> {
        self.provider.map(|p| p.integration_name().to_string())
    }
}

struct TerminalSink {
    assume_yes: bool,
    failed: bool,
}

impl UiSink for TerminalSink {
    fn status_label_changed(&mut self, label: &str) {
        eprintln!("{}", cformat!("<dim>{label}</>"));
    }

    fn notify(&mut self, message: &str, success: bool) {
        if success {
            eprintln!("{}", cformat!("<green>✓</> {message}"));
        } else {
            self.failed = true;
            eprintln!("{}", cformat!("<red>✗</> {message}"));
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        eprint!("{}", cformat!("<bold>{prompt}</> [y/N] "));
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn show_details(&mut self, text: &str) {
        println!("{text}");
    }
}

type CliSession = Session<CliEditor, TerminalSink>;

#[derive(Serialize)]
struct StatusReport<'a> {
    label: String,
    severity: Severity,
    actions: ActionAvailability,
    status: &'a SourceControlStatus,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}", cformat!("<red>Error:</> {e:#}"));
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("SAFESAVE_LOG", default))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let dir = match cli.dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let project_dir = dunce::canonicalize(&dir)
        .with_context(|| format!("Project directory {} not found", dir.display()))?;
    let config = SafeSaveConfig::load(&project_dir)?;
    let editor = CliEditor {
        provider: cli.provider,
    };

    type Action = fn(&mut CliSession) -> ActionResult;
    let (action, assume_yes): (Action, bool) = match cli.command {
        Commands::Status { json } => return status(&config, &project_dir, &editor, json),
        Commands::Watch => return watch(new_session(config, project_dir, editor, false)),
        Commands::Fetch => (CliSession::fetch, false),
        Commands::Pull { yes } => (CliSession::pull_rebase, yes),
        Commands::Push { yes } => (CliSession::push, yes),
        Commands::Update { yes } => (CliSession::plastic_update, yes),
    };

    let mut session = new_session(config, project_dir, editor, assume_yes);
    session.request_update();
    if !session.wait_for_status(COMMAND_WAIT) {
        anyhow::bail!("Timed out waiting for status");
    }

    match action(&mut session) {
        ActionResult::Started => {}
        ActionResult::Declined => return Ok(0),
        ActionResult::Disabled | ActionResult::Unavailable => return Ok(1),
    }

    let Some(outcome) = session.wait_for_command(COMMAND_WAIT) else {
        anyhow::bail!("Timed out waiting for the command to finish");
    };
    // Show where the command left things
    if session.wait_for_status(COMMAND_WAIT) {
        println!("{}", session.label());
    }
    Ok(if outcome.success { 0 } else { 1 })
}

fn new_session(
    config: SafeSaveConfig,
    project_dir: PathBuf,
    editor: CliEditor,
    assume_yes: bool,
) -> CliSession {
    let probes = Probes::system(&config);
    Session::new(
        config,
        probes,
        project_dir,
        editor,
        TerminalSink {
            assume_yes,
            failed: false,
        },
    )
}

fn status(
    config: &SafeSaveConfig,
    project_dir: &std::path::Path,
    editor: &CliEditor,
    json: bool,
) -> anyhow::Result<i32> {
    let preferred = resolve_preferred_provider(editor.source_control_provider().as_deref());
    let status = Probes::system(config).probe(preferred, project_dir);
    let work = editor.local_work();

    if json {
        let report = StatusReport {
            label: label::status_label(&status, &work),
            severity: label::severity(&status, &work),
            actions: ActionAvailability::evaluate(&status, work.has_unsaved_assets),
            status: &status,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", cformat!("<bold>{}</>", label::status_label(&status, &work)));
        println!("{}", label::status_summary(&status, &work));
    }
    Ok(0)
}

fn watch(mut session: CliSession) -> anyhow::Result<i32> {
    let stop = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&stop))
            .context("Failed to install signal handler")?;
    }

    eprintln!(
        "{}",
        cformat!(
            "<dim>Watching {} ({})</>",
            session.project_dir().display(),
            session.auto_fetch_label()
        )
    );
    while !stop.load(Ordering::Relaxed) {
        session.tick(Instant::now());
        std::thread::sleep(TICK_INTERVAL);
    }
    Ok(if session.ui().failed { 1 } else { 0 })
}
