// # ptrsync - forward/reverse record tool
//
// Thin command-line layer over ptrsync-core:
// 1. Parse and validate arguments
// 2. Initialize logging and the runtime
// 3. Load the reverse zone table and connect to Route 53
// 4. Run one `add`, `delete` or `list` operation
//
// All record logic lives in ptrsync-core.
//
// ## Example
//
// ```bash
// ptrsync --conf /etc/ptrsync.toml add -H host.example.com -i 10.1.2.3 -z example.com
// ptrsync delete -H host.example.com -z example.com
// ptrsync list -z example.com
// ```

mod cli;
mod commands;

use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Exit codes
///
/// - 0: Operation completed
/// - 1: Usage or configuration error
/// - 2: Operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PtrsyncExitCode {
    Success = 0,
    ConfigError = 1,
    OperationFailed = 2,
}

impl From<PtrsyncExitCode> for ExitCode {
    fn from(code: PtrsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                PtrsyncExitCode::ConfigError.into()
            } else {
                PtrsyncExitCode::Success.into()
            };
        }
    };

    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return PtrsyncExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return PtrsyncExitCode::OperationFailed.into();
        }
    };

    let code = rt.block_on(async {
        match commands::run(&cli).await {
            Ok(()) => PtrsyncExitCode::Success,
            Err(e) => {
                eprintln!("ptrsync: {:#}", e);
                exit_code_for(&e)
            }
        }
    });

    code.into()
}

/// Log to stderr so `list` output stays clean; `RUST_LOG` overrides the level
fn init_tracing(log_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env()?
    } else {
        EnvFilter::try_new(format!(
            "ptrsync={level},ptrsync_core={level},ptrsync_provider_route53={level},\
             aws_config=warn,aws_smithy_runtime=warn",
            level = log_level
        ))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
}

fn exit_code_for(err: &anyhow::Error) -> PtrsyncExitCode {
    match err.downcast_ref::<ptrsync_core::Error>() {
        Some(ptrsync_core::Error::Config(_) | ptrsync_core::Error::InvalidInput(_)) => {
            PtrsyncExitCode::ConfigError
        }
        _ => PtrsyncExitCode::OperationFailed,
    }
}
