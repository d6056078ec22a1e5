//! Keeps the display awake while a supervised command runs.
//!
//! Run with: `cargo run --example run_command -- sleep 30`

use std::env;

use wakeguard::{AssertionKind, ChildCommand, Config, Platform};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let mut args = env::args().skip(1);
    let program = args.next().unwrap_or_else(|| "sleep".to_string());
    let rest: Vec<String> = args.collect();

    let cfg = Config {
        kinds: vec![
            AssertionKind::PreventUserIdleSystemSleep,
            AssertionKind::PreventUserIdleDisplaySleep,
        ],
        child: Some(ChildCommand::new(program, rest)),
        ..Config::default()
    };
    cfg.validate()?;

    let platform = Platform::native()?;
    let outcome = wakeguard::session::run(&cfg, &platform).await?;
    println!("ended: {outcome}");
    std::process::exit(outcome.exit_code());
}
