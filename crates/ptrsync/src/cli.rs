//! Command-line arguments
//!
//! Everything the user types is checked and canonicalized here, before a
//! [`ChangeRequest`] reaches the engine.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ptrsync_core::{ChangeRequest, Error, RecordKind};
use ptrsync_provider_route53::Route53Settings;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "ptrsync", version, about = "Keep A and PTR records in Route 53 in step")]
pub struct Cli {
    /// AWS shared-config profile
    #[arg(long, env = "PTRSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Reverse zone table (TOML)
    #[arg(long, env = "PTRSYNC_CONF", default_value = "ptrsync.toml", global = true)]
    pub conf: PathBuf,

    /// Log change batches instead of submitting them
    #[arg(long, env = "PTRSYNC_DRYRUN", global = true)]
    pub dryrun: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        env = "PTRSYNC_LOG_LEVEL",
        default_value = "warn",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        global = true
    )]
    pub log_level: String,

    /// AWS region override
    #[arg(long, env = "PTRSYNC_REGION", global = true)]
    pub region: Option<String>,

    /// Route 53 endpoint override
    #[arg(long, env = "PTRSYNC_ENDPOINT_URL", global = true)]
    pub endpoint_url: Option<String>,

    /// Seconds to wait for a change to reach INSYNC
    #[arg(long, env = "PTRSYNC_MAX_WAIT", default_value_t = 300, global = true)]
    pub max_wait: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add an A record with its PTR record, or a CNAME record
    #[command(visible_alias = "a")]
    Add(AddArgs),
    /// Delete a host's A record (with its PTR record) or CNAME record
    #[command(visible_alias = "del")]
    Delete(DeleteArgs),
    /// List the record sets of a zone
    #[command(visible_alias = "l")]
    List(ListArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeArg {
    A,
    Cname,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Hostname to add
    #[arg(short = 'H', long)]
    pub hostname: String,

    /// IPv4 address for an A record
    #[arg(short, long)]
    pub ip: Option<String>,

    /// Target for a CNAME record
    #[arg(short, long)]
    pub cname: Option<String>,

    /// Record type; must agree with --ip / --cname
    #[arg(short = 't', long = "type", value_enum, ignore_case = true)]
    pub record_type: Option<TypeArg>,

    /// Forward hosted zone name
    #[arg(short, long)]
    pub zone: String,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Hostname to delete
    #[arg(short = 'H', long)]
    pub hostname: String,

    /// Forward hosted zone name
    #[arg(short, long)]
    pub zone: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Hosted zone name
    #[arg(short, long)]
    pub zone: String,

    /// Print one JSON object per record set
    #[arg(long)]
    pub json: bool,

    /// Records per provider page (1-300)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=300))]
    pub page_size: Option<u32>,
}

impl Cli {
    pub fn route53_settings(&self) -> Route53Settings {
        Route53Settings {
            profile: self.profile.clone(),
            region: self.region.clone(),
            endpoint_url: self.endpoint_url.clone(),
            dry_run: self.dryrun,
            max_wait: Duration::from_secs(self.max_wait),
            ..Route53Settings::default()
        }
    }
}

impl AddArgs {
    /// Build the engine request, canonicalizing names to dot-terminated form
    pub fn to_request(&self) -> Result<ChangeRequest, Error> {
        let hostname = fqdn(&self.hostname);

        let request = match (&self.ip, &self.cname) {
            (Some(ip), None) => {
                let ip: Ipv4Addr = ip.parse().map_err(|_| {
                    Error::invalid_input(format!("{ip} is not an IPv4 address"))
                })?;
                ChangeRequest::add_a(hostname, ip, &self.zone)
            }
            (None, Some(cname)) => ChangeRequest::add_cname(hostname, fqdn(cname), &self.zone),
            _ => return Err(Error::invalid_input("choose ip or cname")),
        };

        match (self.record_type, request.kind) {
            (Some(TypeArg::A), RecordKind::Cname) => {
                Err(Error::invalid_input("--type A needs --ip"))
            }
            (Some(TypeArg::Cname), RecordKind::A) => {
                Err(Error::invalid_input("--type CNAME needs --cname"))
            }
            _ => Ok(request),
        }
    }
}

/// Dot-terminated form of a DNS name
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}
