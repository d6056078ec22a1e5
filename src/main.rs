//! Thin CLI collaborator: parses arguments into a validated [`Config`],
//! runs one keep-awake session, and maps the outcome to a process exit code.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use wakeguard::{AssertionKind, ChildCommand, Config, Platform};

/// Keeps the machine awake until a timeout, child exit, or interrupt.
///
/// With no kind flag, idle system sleep is prevented. With no timeout and
/// no command, wakeguard runs until interrupted (Ctrl-C / SIGTERM).
#[derive(Parser, Debug)]
#[command(name = "wakeguard", version, about)]
struct Cli {
    /// Prevent the display from idle sleeping.
    #[arg(short = 'd', long)]
    display: bool,

    /// Prevent the system from idle sleeping.
    #[arg(short = 'i', long)]
    idle: bool,

    /// Prevent disks from idling.
    #[arg(short = 'm', long)]
    disk: bool,

    /// Prevent system sleep entirely (effective on AC power).
    #[arg(short = 's', long)]
    system: bool,

    /// Release assertions after this many seconds (0 = no timeout).
    #[arg(short = 't', long, value_name = "SECONDS", default_value_t = 0)]
    timeout: u64,

    /// Release assertions once battery capacity drops below this percent.
    #[arg(short = 'b', long, value_name = "PERCENT")]
    min_battery: Option<f32>,

    /// Grace period in seconds for stopping a supervised command.
    #[arg(long, value_name = "SECONDS", default_value_t = 5)]
    grace: u64,

    /// Command to run while assertions are held; wakeguard exits with its
    /// exit code when it finishes.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
    command: Vec<String>,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut kinds = Vec::new();
        if self.idle {
            kinds.push(AssertionKind::PreventUserIdleSystemSleep);
        }
        if self.display {
            kinds.push(AssertionKind::PreventUserIdleDisplaySleep);
        }
        if self.disk {
            kinds.push(AssertionKind::PreventDiskIdle);
        }
        if self.system {
            kinds.push(AssertionKind::PreventSystemSleep);
        }
        if kinds.is_empty() {
            // No flags given: prevent idle system sleep.
            kinds.push(AssertionKind::PreventUserIdleSystemSleep);
        }

        let child = match self.command.split_first() {
            Some((program, args)) => Some(ChildCommand::new(program.clone(), args.to_vec())),
            None => None,
        };

        Config {
            kinds,
            timeout: Duration::from_secs(self.timeout),
            child,
            grace: Duration::from_secs(self.grace),
            min_battery: self.min_battery,
            ..Config::default()
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = Cli::parse().into_config();
    if let Err(err) = cfg.validate() {
        error!("invalid configuration: {err}");
        return ExitCode::from(2);
    }

    let platform = match Platform::native() {
        Ok(platform) => platform,
        Err(err) => {
            error!("{err}");
            return ExitCode::from(2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start runtime: {err}");
            return ExitCode::from(2);
        }
    };

    match runtime.block_on(wakeguard::session::run(&cfg, &platform)) {
        Ok(outcome) => {
            let code = outcome.exit_code();
            ExitCode::from(u8::try_from(code.clamp(0, 255)).unwrap_or(1))
        }
        Err(err) => {
            error!("{err}");
            ExitCode::from(2)
        }
    }
}
