//! `pocketlife` command-line host.
//!
//! # Responsibility
//! - Resolve config, logging and database location.
//! - Sweep expired trash on start, then run one subcommand.

mod cli;
mod commands;

use anyhow::{anyhow, Context};
use clap::Parser;
use cli::{Cli, Commands};
use commands::Session;
use directories::ProjectDirs;
use log::info;
use pocketlife_core::db::open_db;
use pocketlife_core::{
    default_log_level, init_logging, pass_status, LifecycleConfig, SweepTrigger,
};
use std::path::PathBuf;

const DB_FILE_NAME: &str = "pocketlife.db";
const LOG_DIR_NAME: &str = "logs";

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(&cli)?;
    let data_dir = default_data_dir()?;
    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => data_dir.join(DB_FILE_NAME),
    };
    let log_dir = absolute(
        cli.log_dir
            .clone()
            .unwrap_or_else(|| data_dir.join(LOG_DIR_NAME)),
    )?;
    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    init_logging(level, &log_dir)?;

    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create `{}`", parent.display()))?;
    }
    let conn = open_db(&db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let session = Session::open(&conn, config)?;

    // `sweep` runs its own manual pass.
    if !matches!(cli.command, Commands::Sweep) {
        let reports = session.sweep(SweepTrigger::Startup);
        let purged: usize = reports.iter().map(|report| report.purged).sum();
        let failed: usize = reports.iter().map(|report| report.failures.len()).sum();
        info!(
            "event=startup_sweep module=cli status={} purged={purged} failed={failed}",
            pass_status(&reports)
        );
    }

    commands::run(&session, &db_path, cli.command)
}

fn load_config(cli: &Cli) -> anyhow::Result<LifecycleConfig> {
    let mut config = match &cli.config {
        Some(path) => LifecycleConfig::from_file(path)?,
        None => LifecycleConfig::default(),
    };
    if let Some(days) = cli.retention_days {
        config.retention_days = days;
    }
    config.validate()?;
    Ok(config)
}

fn default_data_dir() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "pocketlife")
        .ok_or_else(|| anyhow!("could not determine data directory"))?;
    Ok(dirs.data_dir().to_path_buf())
}

fn absolute(path: PathBuf) -> anyhow::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()?.join(path))
}
