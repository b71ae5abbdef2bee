//! CLI for the mfetch URL-fetch engine.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use mfetch_core::config;
use mfetch_core::logging::Verbosity;
use std::path::PathBuf;

use commands::{run_add, run_fetch, run_status, run_stop};

/// Top-level CLI for mfetch.
#[derive(Debug, Parser)]
#[command(name = "mfetch")]
#[command(about = "mfetch: resumable, adaptively throttled concurrent URL fetcher", long_about = None)]
pub struct Cli {
    /// Only log errors.
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log every dispatch and completion.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch every URL of a run (BASE.input plus URLs given here), resuming
    /// an interrupted run if BASE.recover.json exists.
    Run(RunArgs),

    /// Append a URL to BASE.input.
    Add {
        /// Base path of the run.
        base: PathBuf,
        /// URL to queue.
        url: String,
        /// Request header line sent with this URL (repeatable).
        #[arg(long = "header", short = 'H', value_name = "HEADER")]
        headers: Vec<String>,
    },

    /// Ask running fetches to save their state and exit.
    Stop,

    /// Show the pending recovery record of a run.
    Status {
        /// Base path of the run.
        base: PathBuf,
    },
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Base path of the run: BASE.input, BASE.output, BASE.errors, ...
    pub base: PathBuf,

    /// Extra URLs to queue (ignored when resuming).
    pub urls: Vec<String>,

    /// Source address to send from (repeatable; one interface each).
    #[arg(long = "interface", value_name = "ADDR")]
    pub interfaces: Vec<String>,

    /// Proxy for every interface (host:port).
    #[arg(long, value_name = "PROXY")]
    pub proxy: Option<String>,

    /// Proxy credentials.
    #[arg(long, value_name = "USER:PASS", requires = "proxy")]
    pub proxy_auth: Option<String>,

    /// Hard cap on connections per interface.
    #[arg(long, value_name = "N")]
    pub max_conns: Option<usize>,

    /// Use the full connection cap right away instead of ramping up.
    #[arg(long)]
    pub no_adaptive: bool,

    /// Failed attempts per URL before it goes to BASE.errors.
    #[arg(long, value_name = "N")]
    pub max_retry: Option<u32>,

    /// Queue redirect targets instead of only counting redirects.
    #[arg(long)]
    pub follow_redirects: bool,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Errors
        } else if self.verbose {
            Verbosity::All
        } else {
            Verbosity::Notices
        }
    }

    pub async fn run(self) -> Result<()> {
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match self.command {
            CliCommand::Run(args) => run_fetch(cfg, args).await?,
            CliCommand::Add { base, url, headers } => run_add(&base, &url, headers)?,
            CliCommand::Stop => run_stop(&cfg)?,
            CliCommand::Status { base } => run_status(&base)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
