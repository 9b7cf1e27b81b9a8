//! CLI entrypoint flags.
//!
//! A flat, single-`Args`-struct clap derive: this binary has one job (serve),
//! so it gets one flat struct rather than a subcommand tree.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "marathon-consul-bridge")]
#[command(about = "One-way sync bridge from orchestrator lifecycle events to a service-discovery registry")]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "bridge.yaml")]
    pub config: String,

    /// Override the HTTP ingress bind address (host:port).
    #[arg(long)]
    pub bind_address: Option<String>,

    /// Override the worker pool size.
    #[arg(long)]
    pub workers: Option<usize>,
}
