//! Geofence CLI
//!
//! Command-line interface for computing distances, running admission checks
//! against a policy, parsing map links, and replaying recorded position
//! samples through the acquisition loop.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use geofence_acquisition::{AcquiredFix, PositionAcquirer, ScriptStep, ScriptedSource};
use geofence_core::{
    check_admission, distance_meters, logging, parse_maps_link, AdmissionResult, Config,
    GeoCoordinate, GeoPolicy, PositionSample, RawPositionSample,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Exit status when the check ran but the sample was outside the radius
const EXIT_DENIED: i32 = 2;

#[derive(Parser)]
#[command(name = "geofence")]
#[command(about = "Geofence admission checks", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Great-circle distance in meters between two "lat,lon" points
    Distance {
        #[arg(allow_hyphen_values = true)]
        from: GeoCoordinate,
        #[arg(allow_hyphen_values = true)]
        to: GeoCoordinate,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Check a position sample against a policy
    Check {
        /// Institution anchor as "lat,lon" (defaults to the configured policy)
        #[arg(long, allow_hyphen_values = true)]
        anchor: Option<GeoCoordinate>,

        /// Allowed radius in meters
        #[arg(long)]
        radius: Option<f64>,

        /// Treat the policy as disabled
        #[arg(long, default_value_t = false)]
        disabled: bool,

        /// Position sample as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        sample: Option<GeoCoordinate>,

        /// Reported accuracy of the sample in meters
        #[arg(long, requires = "sample")]
        accuracy: Option<f64>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Extract coordinates from a map share link
    ParseLink {
        url: String,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Replay recorded samples through acquisition, then check the best fix
    Simulate {
        /// JSON array of samples, each optionally with "delay_ms"
        #[arg(long)]
        samples: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

/// One recorded sample in a simulation file
#[derive(Debug, Deserialize)]
struct RecordedStep {
    /// Wait before delivering this sample
    #[serde(default)]
    delay_ms: u64,
    #[serde(flatten)]
    sample: RawPositionSample,
}

/// JSON output for distance command
#[derive(Debug, Serialize)]
struct DistanceOutput {
    from: GeoCoordinate,
    to: GeoCoordinate,
    distance_meters: f64,
}

/// JSON output for check and simulate commands
#[derive(Debug, Serialize)]
struct CheckOutput {
    #[serde(flatten)]
    result: AdmissionResult,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fix: Option<AcquiredFix>,
}

impl CheckOutput {
    fn new(result: AdmissionResult, fix: Option<AcquiredFix>) -> Self {
        let message = match result.denial_report() {
            Some(report) => report.to_string(),
            None => "Admitted".to_string(),
        };
        Self {
            result,
            message,
            fix,
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_distance(from: GeoCoordinate, to: GeoCoordinate, json: bool) -> Result<()> {
    let meters = distance_meters(&from, &to);
    if json {
        print_json(&DistanceOutput {
            from,
            to,
            distance_meters: meters,
        })
    } else {
        println!("{:.1} m", meters);
        Ok(())
    }
}

/// Policy from flags, falling back to the configured policy
fn policy_from_args(
    config: &Config,
    anchor: Option<GeoCoordinate>,
    radius: Option<f64>,
    disabled: bool,
) -> Result<GeoPolicy> {
    if disabled {
        return Ok(GeoPolicy::disabled());
    }
    match (anchor, radius, &config.policy) {
        (Some(anchor), Some(radius), _) => Ok(GeoPolicy::enabled(anchor, radius)),
        (None, None, Some(record)) => Ok(record.resolve()?),
        (Some(_), None, _) | (None, Some(_), _) => {
            bail!("--anchor and --radius must be given together")
        }
        (None, None, None) => bail!("No policy given: pass --anchor and --radius or --config"),
    }
}

fn report(output: &CheckOutput, json: bool) -> Result<bool> {
    if json {
        print_json(output)?;
    } else {
        if let Some(warning) = output.fix.as_ref().and_then(AcquiredFix::warning) {
            eprintln!("Warning: {}", warning);
        }
        println!("{}", output.message);
        println!("Distance: {:.1} m", output.result.distance_meters);
        println!("Allowed radius: {:.1} m", output.result.allowed_radius_meters);
    }
    Ok(output.result.allowed)
}

fn cmd_check(
    config: &Config,
    policy: GeoPolicy,
    sample: Option<GeoCoordinate>,
    accuracy: Option<f64>,
    json: bool,
) -> Result<bool> {
    let sample = sample
        .map(|coordinate| PositionSample::at(coordinate, accuracy, Utc::now()))
        .transpose()?;
    let result = check_admission(&policy, sample.as_ref())?;
    info!(
        enabled = policy.enabled,
        allowed = result.allowed,
        distance_m = result.distance_meters,
        policy_from_config = config.policy.is_some(),
        "Admission check"
    );
    report(&CheckOutput::new(result, None), json)
}

fn cmd_parse_link(url: &str, json: bool) -> Result<()> {
    let coordinate = parse_maps_link(url)?;
    if json {
        print_json(&coordinate)
    } else {
        println!("{}", coordinate);
        Ok(())
    }
}

fn read_recorded_steps(path: &Path) -> Result<Vec<ScriptStep>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read samples from {}", path.display()))?;
    let recorded: Vec<RecordedStep> =
        serde_json::from_str(&content).context("Failed to parse samples")?;

    recorded
        .into_iter()
        .map(|step| {
            let sample = PositionSample::try_from(step.sample)?;
            Ok::<_, anyhow::Error>(ScriptStep {
                delay: Duration::from_millis(step.delay_ms),
                event: Ok(sample),
            })
        })
        .collect()
}

async fn cmd_simulate(config: &Config, samples: &Path, json: bool) -> Result<bool> {
    let record = config
        .policy
        .as_ref()
        .context("simulate needs a [policy] section in the config")?;
    let policy = record.resolve()?;
    let steps = read_recorded_steps(samples)?;
    if steps.is_empty() {
        bail!("No samples found in {}", samples.display());
    }

    let source = ScriptedSource::new(steps);
    let acquirer = PositionAcquirer::new(config.acquisition.clone())?;

    let (cancel_tx, cancel_rx) = oneshot::channel();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling acquisition");
            let _ = cancel_tx.send(());
        }
    });
    let fix = acquirer.acquire_cancellable(&source, cancel_rx).await;
    interrupt.abort();
    let fix = fix?;

    report(&check_fix(&policy, fix)?, json)
}

/// Check an acquired fix. An unreliable fix under an active policy is turned
/// away with the manual-entry hint instead of being checked.
fn check_fix(policy: &GeoPolicy, fix: AcquiredFix) -> Result<CheckOutput> {
    if policy.enabled {
        if let Some(warning) = fix.warning() {
            warn!(
                accuracy_m = ?fix.sample.accuracy_meters,
                attempts = fix.attempts,
                "Best fix is unreliable; admission not checked"
            );
            bail!("{} Best fix: {}", warning, fix.sample.coordinate);
        }
    }
    let result = check_admission(policy, fix.trusted_sample())?;
    Ok(CheckOutput::new(result, Some(fix)))
}

async fn run(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;

    let mut logging_config = config.logging.clone();
    logging_config.json |= cli.log_json;
    logging::init_with(&logging_config);

    match cli.cmd {
        Commands::Distance { from, to, json } => cmd_distance(from, to, json).map(|_| true),
        Commands::Check {
            anchor,
            radius,
            disabled,
            sample,
            accuracy,
            json,
        } => {
            let policy = policy_from_args(&config, anchor, radius, disabled)?;
            cmd_check(&config, policy, sample, accuracy, json)
        }
        Commands::ParseLink { url, json } => cmd_parse_link(&url, json).map(|_| true),
        Commands::Simulate { samples, json } => cmd_simulate(&config, &samples, json).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_DENIED),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
