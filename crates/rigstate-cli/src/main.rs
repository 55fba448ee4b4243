//! rigstate CLI
//!
//! One-shot local access to the hardware inventory: scan, read sensors,
//! apply GPU control values, or extract records from a saved `lshw -json`
//! document without touching the machine.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail};
use rigstate_api::OverclockRequest;
use rigstate_inventory::{
    Collaborators, DeviceNode, Guid, Inventory, InventoryScanner, OverclockOutcome, ScanContext,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rigstate-cli")]
#[command(about = "Hardware inventory and GPU control", long_about = None)]
struct Cli {
    /// Timeout for each external command, in milliseconds
    #[arg(long, global = true, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the machine and print the static inventory
    Scan,
    /// Scan the machine and print the sensor readings
    Dynamic,
    /// Print uptime, CPU load and memory usage
    Status,
    /// Apply GPU control values to one device
    Overclock(OverclockArgs),
    /// Extract records from a saved `lshw -json` document
    Extract {
        /// Path to the document
        path: PathBuf,
    },
}

#[derive(Args)]
struct OverclockArgs {
    /// Device GUID
    guid: String,
    /// Power limit in W
    #[arg(long)]
    power_limit: Option<i64>,
    /// Fan speed in percent
    #[arg(long)]
    fan_speed: Option<i64>,
    /// Core clock offset in MHz (top core clock on AMD)
    #[arg(long, allow_hyphen_values = true)]
    core_clock_offset: Option<i64>,
    /// Memory clock offset in MHz (top memory clock on AMD)
    #[arg(long, allow_hyphen_values = true)]
    mem_clock_offset: Option<i64>,
    /// Core voltage in mV
    #[arg(long)]
    core_voltage: Option<i64>,
    /// Memory voltage in mV
    #[arg(long)]
    mem_voltage: Option<i64>,
}

impl From<&OverclockArgs> for OverclockRequest {
    fn from(args: &OverclockArgs) -> Self {
        Self {
            power_limit: args.power_limit,
            fan_speed: args.fan_speed,
            core_clock_offset: args.core_clock_offset,
            mem_clock_offset: args.mem_clock_offset,
            core_voltage: args.core_voltage,
            mem_voltage: args.mem_voltage,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let io = Collaborators::local().with_timeout(Duration::from_millis(cli.timeout_ms));
    let scanner = InventoryScanner::new(io);

    match cli.command {
        Commands::Scan => print_json(&scanner.scan().static_snapshot()),
        Commands::Dynamic => print_json(&scanner.scan().dynamic_snapshot()),
        Commands::Status => {
            let inventory = scanner.scan();
            print_json(&inventory.system_status(scanner.io()))
        }
        Commands::Overclock(args) => {
            let mut inventory = scanner.scan();
            if inventory.is_empty() {
                bail!("inventory is empty; the hardware probe needs superuser rights");
            }
            let guid = Guid::from(args.guid.as_str());
            let outcome = inventory.apply_overclock(scanner.io(), &guid, &(&args).into());
            if outcome == OverclockOutcome::NotFound {
                bail!("no device with guid {guid}");
            }
            print_json(&outcome.into_response(&guid))
        }
        Commands::Extract { path } => {
            let text = std::fs::read_to_string(&path)
                .wrap_err_with(|| format!("failed to read {}", path.display()))?;
            let tree = DeviceNode::from_json(&text)?;
            let inventory = Inventory::from_tree(&ScanContext::new(tree));
            print_json(&inventory.static_snapshot())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
