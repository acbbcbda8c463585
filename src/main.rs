//! vt-enrich - VirusTotal enrichment for file-integrity alerts
//!
//! Invoked once per alert by the host supervisor:
//!
//! ```bash
//! vt-enrich <alert_file> <api_key> [extra] [debug] [extra2]
//! ```
//!
//! The third and fifth positionals are accepted for supervisor
//! compatibility and ignored; passing the literal `debug` as the fourth
//! positional enables verbose diagnostics in the integration log.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vt_enrich::config::{DEFAULT_LOG_PATH, DEFAULT_SOCKET_PATH};
use vt_enrich::{pipeline, DiagLog, EnrichError, RunConfig};

#[derive(Parser)]
#[command(name = "vt-enrich")]
#[command(version)]
#[command(about = "Enrich file-integrity alerts with VirusTotal file reputation", long_about = None)]
struct Cli {
    /// Path to the JSON alert file
    alert_file: PathBuf,

    /// VirusTotal API key
    api_key: String,

    /// Reserved supervisor slot, ignored
    extra: Option<String>,

    /// Pass "debug" to enable verbose diagnostics
    debug_flag: Option<String>,

    /// Reserved supervisor slot, ignored
    extra2: Option<String>,

    /// Analysis queue socket the verdict is delivered to
    #[arg(long, env = "VT_ENRICH_SOCKET", default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Append-only diagnostic log file
    #[arg(long, env = "VT_ENRICH_LOG", default_value = DEFAULT_LOG_PATH)]
    log: PathBuf,

    /// Reputation endpoint URL
    #[arg(long, env = "VT_ENRICH_API_URL", default_value = vt_enrich::reputation::FILE_REPORT_URL)]
    api_url: String,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        RunConfig {
            alert_path: self.alert_file,
            api_key: self.api_key,
            api_url: self.api_url,
            verbose: self.debug_flag.as_deref() == Some("debug"),
            log_path: self.log,
            socket_path: self.socket,
        }
    }

    /// The raw invocation line recorded in the integration log, five
    /// space-separated slots padded with empties.
    fn invocation_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.alert_file.display(),
            self.api_key,
            self.extra.as_deref().unwrap_or_default(),
            self.debug_flag.as_deref().unwrap_or_default(),
            self.extra2.as_deref().unwrap_or_default(),
        )
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            // The invocation record is written even for rejected argument
            // lines, so the supervisor's log stays complete.
            DiagLog::new(DEFAULT_LOG_PATH, false).record("# ERROR: Wrong arguments");
            tracing::error!("bad arguments: {e}");
            return ExitCode::from(EnrichError::BadArguments.exit_code());
        }
    };

    let invocation = cli.invocation_line();
    let config = cli.into_config();
    let diag = DiagLog::new(&config.log_path, config.verbose);
    diag.record(&invocation);

    match pipeline::run(&config, &diag).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diag.debug(&format!("# ERROR: {e}"));
            tracing::error!("enrichment failed: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
