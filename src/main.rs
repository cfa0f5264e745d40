// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value
)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use photobooth::cli::commands::{Cli, Command};
use photobooth::cli::output;
use photobooth::config::Config;
use photobooth::ledger::Ledger;
use photobooth::operations;
use photobooth::watcher::Watcher;

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries the JSON results.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> CmdResult {
    match cli.command {
        Command::Init => cmd_init(),
        Command::Watch { interval } => cmd_watch(interval),
        Command::Tick => cmd_tick(),
        Command::Pending => cmd_pending(),
        Command::Status => cmd_status(),
        Command::Videos { screensaver } => cmd_videos(screensaver),
        Command::Records { pretty } => cmd_records(pretty),
        Command::Reset => cmd_reset(),
        Command::Prune { days } => cmd_prune(days),
        Command::Delete { name } => cmd_delete(&name),
    }
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

fn get_config() -> Result<Config, Box<dyn std::fmt::Display>> {
    Config::from_cwd().map_err(map_err)
}

fn open_ledger(config: &Config) -> Ledger {
    Ledger::open(&config.ledger_path, config.stale_lock_timeout())
}

fn block_on<F: Future>(future: F) -> Result<F::Output, Box<dyn std::fmt::Display>> {
    let rt = tokio::runtime::Runtime::new().map_err(map_err)?;
    Ok(rt.block_on(future))
}

fn cmd_init() -> CmdResult {
    let config = get_config()?;
    config.ensure_dirs().map_err(map_err)?;
    let wrote_config = !config.config_path.exists();
    if wrote_config {
        config.save_settings().map_err(map_err)?;
    }
    println!(
        "{}",
        output::format_json(&serde_json::json!({
            "initialized": true,
            "config": config.config_path,
            "wrote_config": wrote_config,
        }))
    );
    Ok(())
}

fn cmd_watch(interval: Option<u64>) -> CmdResult {
    let config = get_config()?;
    config.ensure_dirs().map_err(map_err)?;
    let mut watcher = Watcher::from_config(&config);
    if let Some(secs) = interval {
        watcher = watcher.with_poll_interval(Duration::from_secs(secs.max(1)));
    }
    let watcher = Arc::new(watcher);

    block_on(async move {
        let handle = Arc::clone(&watcher).spawn().map_err(map_err)?;
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for ctrl-c: {e}");
        }
        tracing::info!("shutting down, waiting for the current photo to finish");
        handle.stop().await;
        let status = operations::get_status(&watcher).await;
        println!("{}", output::format_json(&status));
        Ok::<(), Box<dyn std::fmt::Display>>(())
    })?
}

fn cmd_tick() -> CmdResult {
    let config = get_config()?;
    config.ensure_dirs().map_err(map_err)?;
    let watcher = Watcher::from_config(&config);
    let report = block_on(watcher.check_for_new_files())?;
    println!("{}", output::format_json(&report));
    Ok(())
}

fn cmd_pending() -> CmdResult {
    let config = get_config()?;
    let watcher = Watcher::from_config(&config);
    let pending = block_on(watcher.pending_files())?;
    println!(
        "{}",
        output::format_json(&serde_json::json!({
            "count": pending.len(),
            "files": pending,
        }))
    );
    Ok(())
}

fn cmd_status() -> CmdResult {
    let config = get_config()?;
    let watcher = Watcher::from_config(&config);
    let status = block_on(operations::get_status(&watcher))?;
    println!("{}", output::format_json(&status));
    Ok(())
}

fn cmd_videos(screensaver: bool) -> CmdResult {
    let config = get_config()?;
    let result = if screensaver {
        operations::list_screensaver_videos(&config)
    } else {
        operations::list_output_videos(&config)
    };
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_records(pretty: bool) -> CmdResult {
    let config = get_config()?;
    let ledger = open_ledger(&config);
    let result = operations::list_records(&ledger);
    if pretty {
        println!("{}", output::format_pretty(&result));
    } else {
        println!("{}", output::format_json(&result));
    }
    Ok(())
}

fn cmd_reset() -> CmdResult {
    let config = get_config()?;
    let mut ledger = open_ledger(&config);
    let result = operations::reset_history(&mut ledger).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_prune(days: Option<u32>) -> CmdResult {
    let config = get_config()?;
    let days = days.unwrap_or(config.settings.watcher.prune_days);
    let mut ledger = open_ledger(&config);
    let result = operations::prune_history(&mut ledger, days).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}

fn cmd_delete(name: &str) -> CmdResult {
    let config = get_config()?;
    let result = operations::delete_video(&config, name).map_err(map_err)?;
    println!("{}", output::format_json(&result));
    Ok(())
}
