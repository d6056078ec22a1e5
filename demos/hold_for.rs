//! Holds an idle-sleep assertion for two minutes, or until Ctrl-C.
//!
//! Run with: `cargo run --example hold_for`

use std::time::Duration;

use wakeguard::{Config, Platform};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();

    let cfg = Config {
        timeout: Duration::from_secs(120),
        ..Config::default()
    };
    cfg.validate()?;

    let platform = Platform::native()?;
    let outcome = wakeguard::session::run(&cfg, &platform).await?;
    println!("ended: {outcome}");
    Ok(())
}
