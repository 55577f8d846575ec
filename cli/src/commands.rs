pub mod scan;

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use nullbind_common::config::{Config, DEFAULT_CONCURRENCY, DEFAULT_PAGE_SIZE};
use nullbind_common::network::target::Target;

#[derive(Parser)]
#[command(name = "nullbind")]
#[command(version)]
#[command(about = "Finds LDAP servers that allow anonymous binds and dumps exposed passwords.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Reduce output (-q hides headers and info logs, -qq hides per-host details)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Do not print the banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe one or more LDAP servers for anonymous bind
    #[command(alias = "s")]
    Scan(ScanArgs),
}

#[derive(Args)]
pub struct ScanArgs {
    /// Server to probe, as host or host:port (port defaults to 389)
    #[arg(required_unless_present = "file")]
    pub target: Option<Target>,

    /// File with one host:port entry per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Directory receiving <host>.passwords.lst dumps and the host manifest
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output: PathBuf,

    /// Connect and per-operation timeout in seconds
    #[arg(short, long, value_name = "SECS", default_value_t = 3)]
    pub timeout: u64,

    /// Entries requested per page of the subtree search
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: i32,

    /// Number of servers scanned at the same time
    #[arg(short = 'j', long, value_name = "N", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl ScanArgs {
    pub fn to_config(&self, quiet: u8, no_banner: bool) -> anyhow::Result<Config> {
        let cfg = Config {
            timeout: Duration::from_secs(self.timeout),
            page_size: self.page_size,
            concurrency: self.concurrency,
            output_dir: self.output.clone(),
            quiet,
            no_banner,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
