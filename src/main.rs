//! Tokenmeta - two-tier NFT token metadata service.

#![allow(dead_code)]

mod cli;
mod config;
mod core;
mod logger;
mod metadata;
mod routes;
mod source;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{ServiceConfig, cfg, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before the server blocks on accept)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    init_config(ServiceConfig::load(cli)?);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::run(&cfg()),
        Commands::Generate { args } => cli::generate::run(args, &cfg()),
        Commands::Fetch { args } => cli::fetch::run(args, &cfg()),
    }
}
