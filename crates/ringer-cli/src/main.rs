mod logging;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use ringer_core::impls::InMemoryBackend;
use ringer_core::ports::CallingBackend;
use ringer_core::{
    BackendCallState, CallRef, CancelHandle, DispatchConfig, DispatchOptions, DispatchReport,
    Dispatcher, PooledDispatcher, StatusObserver,
};
use ringer_twilio::{Credentials, TwilioBackend};

/// Caller id used by `--dry-run` when none is configured.
const DRY_RUN_CALLER_ID: &str = "+15005550006";

#[derive(Parser, Debug)]
#[command(name = "ringer", version, about = "Place voice notification calls")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    backend: BackendArgs,

    /// Dispatch defaults (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Args, Debug)]
struct BackendArgs {
    #[arg(long, env = "account_sid", global = true, hide_env_values = true)]
    account_sid: Option<String>,

    #[arg(long, env = "auth_token", global = true, hide_env_values = true)]
    auth_token: Option<String>,

    /// Caller id presented to callees
    #[arg(long = "from", env = "from_", global = true)]
    from: Option<String>,

    /// Override the REST API host
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Use an in-memory backend instead of placing real calls
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Call one number and print the outcome
    Call {
        #[arg(long, env = "to")]
        to: String,

        #[command(flatten)]
        message: MessageArgs,
    },
    /// Call every `--to` number in order and print the report
    Batch {
        #[arg(long = "to", required = true)]
        to: Vec<String>,

        #[command(flatten)]
        message: MessageArgs,

        #[command(flatten)]
        dispatch: DispatchArgs,
    },
    /// Look up the backend state of a call
    Status {
        reference: String,

        /// Poll until the call ends
        #[arg(long)]
        wait: bool,

        #[arg(long, default_value_t = 2000)]
        poll_ms: u64,

        #[arg(long, default_value_t = 300)]
        timeout_secs: u64,
    },
}

#[derive(Args, Debug, Default)]
struct MessageArgs {
    /// Text spoken to each callee
    #[arg(short, long, required_unless_present = "url")]
    message: Option<String>,

    /// Play markup fetched from this URL instead of speaking a message
    #[arg(long, conflicts_with_all = ["message", "voice", "language"])]
    url: Option<String>,

    #[arg(long)]
    voice: Option<String>,

    #[arg(long)]
    language: Option<String>,
}

#[derive(Args, Debug, Default)]
struct DispatchArgs {
    /// Pause between destinations
    #[arg(long)]
    delay_ms: Option<u64>,

    #[arg(long)]
    retries: Option<u32>,

    /// Skip the rest of the batch once the backend looks down
    #[arg(long)]
    fail_fast: bool,

    /// Worker pool size (1 = sequential)
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Stop starting new calls after this many seconds
    #[arg(long)]
    deadline_secs: Option<u64>,
}

impl MessageArgs {
    fn template(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

fn options(message: &MessageArgs, dispatch: Option<&DispatchArgs>) -> DispatchOptions {
    let mut options = DispatchOptions::new();
    if let Some(v) = &message.voice {
        options = options.with_voice(v);
    }
    if let Some(l) = &message.language {
        options = options.with_language(l);
    }
    if let Some(url) = &message.url {
        options = options.with_markup_url(url);
    }
    let Some(d) = dispatch else {
        return options;
    };
    if let Some(ms) = d.delay_ms {
        options = options.with_delay_between_calls(Duration::from_millis(ms));
    }
    if let Some(n) = d.retries {
        options = options.with_max_retries(n);
    }
    if d.fail_fast {
        options = options.with_fail_fast(true);
    }
    if let Some(secs) = d.deadline_secs {
        options = options.with_deadline(Duration::from_secs(secs));
    }
    options
}

fn load_config(path: Option<&Path>) -> Result<DispatchConfig> {
    let Some(path) = path else {
        return Ok(DispatchConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn backend(args: &BackendArgs) -> Result<Arc<dyn CallingBackend>> {
    if args.dry_run {
        info!("dry run: no real calls will be placed");
        return Ok(Arc::new(InMemoryBackend::new()));
    }
    let sid = args
        .account_sid
        .as_deref()
        .context("account_sid is not set (flag, env or .env)")?;
    let token = args
        .auth_token
        .as_deref()
        .context("auth_token is not set (flag, env or .env)")?;
    let mut twilio = TwilioBackend::new(Credentials::new(sid, token)?)?;
    if let Some(base) = &args.api_base {
        twilio = twilio.with_base_url(base);
    }
    Ok(Arc::new(twilio))
}

fn dispatcher(args: &BackendArgs, config: DispatchConfig) -> Result<Dispatcher> {
    let caller_id = match (&args.from, args.dry_run) {
        (Some(from), _) => from.clone(),
        (None, true) => DRY_RUN_CALLER_ID.to_string(),
        (None, false) => bail!("from_ is not set (flag, env or .env)"),
    };
    Ok(Dispatcher::builder()
        .backend(backend(args)?)
        .caller_id(caller_id)
        .config(config)
        .build()?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Cancel the batch between destinations on Ctrl-C.
fn cancel_on_ctrl_c() -> CancelHandle {
    let handle = CancelHandle::new();
    let on_signal = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing the call in flight");
            on_signal.cancel();
        }
    });
    handle
}

fn exit_code(report: &DispatchReport) -> ExitCode {
    if report.counts().queued == report.len() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

#[derive(Serialize)]
struct StatusView<'a> {
    reference: &'a CallRef,
    state: BackendCallState,
    terminal: bool,
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Call { to, message } => {
            let dispatcher = dispatcher(&cli.backend, config)?;
            let outcome = dispatcher
                .call_one(&to, message.template(), &options(&message, None))
                .await?;
            print_json(&outcome)?;
            Ok(if outcome.is_queued() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Command::Batch {
            to,
            message,
            dispatch,
        } => {
            let dispatcher = dispatcher(&cli.backend, config)?;
            let opts = options(&message, Some(&dispatch));
            let cancel = cancel_on_ctrl_c();

            let report = if dispatch.workers > 1 {
                PooledDispatcher::new(dispatcher, dispatch.workers)?
                    .dispatch_until(message.template(), &to, &opts, &cancel.signal())
                    .await?
            } else {
                dispatcher
                    .dispatch_until(message.template(), &to, &opts, &cancel.signal())
                    .await?
            };
            print_json(&report)?;
            Ok(exit_code(&report))
        }
        Command::Status {
            reference,
            wait,
            poll_ms,
            timeout_secs,
        } => {
            let observer = StatusObserver::new(backend(&cli.backend)?);
            let reference = CallRef::new(reference);
            let state = if wait {
                observer
                    .wait_for_terminal(
                        &reference,
                        Duration::from_millis(poll_ms),
                        Duration::from_secs(timeout_secs),
                    )
                    .await?
            } else {
                observer.fetch_status(&reference).await?
            };
            print_json(&StatusView {
                reference: &reference,
                state,
                terminal: state.is_terminal(),
            })?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env は任意（無ければプロセス環境のみ）
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(logging::LoggingConfig { json: cli.log_json })?;
    run(cli).await
}
