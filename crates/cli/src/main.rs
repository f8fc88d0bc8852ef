//! Prebid privacy CLI for settings validation and activity checks.
//!
//! This tool provides commands for:
//! - Validating privacy settings files
//! - Evaluating an activity control decision for a component
//! - Scrubbing a bid request the way it would be sent to a component

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod error;
mod evaluate;

use error::CliError;
use evaluate::{LegacyFlags, Target};
use prebid_privacy_common::privacy::{Activity, Component, Policies};

#[derive(Parser)]
#[command(name = "pbs-privacy")]
#[command(about = "Prebid privacy CLI for activity controls and request scrubbing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a settings file and compile every account's activity controls
    Validate {
        /// Path to the TOML settings file
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Print whether a component may perform an activity
    Allow {
        #[command(flatten)]
        target: TargetArgs,

        /// Activity name, e.g. fetchBids or transmitUfpd
        #[arg(long)]
        activity: Activity,

        /// Bid request JSON supplying GPP section ids and GPC
        #[arg(long)]
        request: Option<PathBuf>,

        /// GPP section ids, used when no request is given
        #[arg(long, value_delimiter = ',')]
        gpp_sid: Vec<i8>,

        /// Global Privacy Control signal, used when no request is given
        #[arg(long)]
        gpc: Option<String>,
    },

    /// Print a bid request redacted for a component
    Scrub {
        #[command(flatten)]
        target: TargetArgs,

        /// Bid request JSON to redact
        #[arg(long)]
        request: PathBuf,

        /// Enforce GDPR on user and device identifiers
        #[arg(long)]
        gdpr_id: bool,

        /// Enforce GDPR on geolocation
        #[arg(long)]
        gdpr_geo: bool,

        /// Enforce CCPA
        #[arg(long)]
        ccpa: bool,
    },
}

#[derive(Args)]
struct TargetArgs {
    /// Path to the TOML settings file
    #[arg(long, short)]
    file: PathBuf,

    /// Account id; unknown accounts use the host defaults
    #[arg(long, default_value = "")]
    account: String,

    /// Component type: bidder, analytics, rtd, general or a custom type
    #[arg(long, default_value = "bidder")]
    component_type: String,

    /// Component name
    #[arg(long)]
    component_name: String,
}

impl TargetArgs {
    fn target(&self) -> Target {
        Target {
            account: self.account.clone(),
            component: Component::new(&self.component_type, &self.component_name),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logger(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) -> Result<(), CliError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Validate { file } => config::validate(&file, cli.verbose),
        Commands::Allow {
            target,
            activity,
            request,
            gpp_sid,
            gpc,
        } => {
            let policies = Policies {
                gpp_sid,
                gpc,
                ..Default::default()
            };
            evaluate::allow(
                &target.file,
                &target.target(),
                activity,
                request.as_deref(),
                &policies,
            )
        }
        Commands::Scrub {
            target,
            request,
            gdpr_id,
            gdpr_geo,
            ccpa,
        } => evaluate::scrub_and_print(
            &target.file,
            &target.target(),
            &request,
            LegacyFlags {
                gdpr_id,
                gdpr_geo,
                ccpa,
            },
        ),
    }
}
