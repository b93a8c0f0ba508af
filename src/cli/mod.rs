pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "adlist-sync")]
#[command(about = "Keep Pi-hole ad-list subscriptions in step with what is reachable", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/adlist-sync/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// KEY=VALUE file with PIHOLE_HOST and WEBPASSWORD
    #[arg(long, default_value = "secrets.env", global = true)]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe every subscription and push enable/disable/add to the Pi-hole
    Sync {
        /// Seed list of candidate URLs (overrides seed_file in the config)
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Probe and report, but change nothing remotely
        #[arg(long)]
        dry_run: bool,
    },
    /// List distinct hostnames the Pi-hole did not block
    Hosts {
        /// Only queries from this client
        #[arg(long)]
        client: Option<String>,
    },
}
