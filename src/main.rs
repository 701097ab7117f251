use anyhow::{bail, Context};
use clap::Parser;
use log::{info, warn};
use smartmeter_rs::util::encode_hex;
use smartmeter_rs::{available_ports, init_logger, MeterConfig, SmartMeter, SmartMeterError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "smartmeter-cli")]
#[command(about = "Read and decrypt smart meter push telegrams from a serial interface")]
struct Cli {
    /// Serial interface, e.g. /dev/ttyUSB0
    #[arg(short, long, required_unless_present_any = ["config", "list_ports"])]
    interface: Option<String>,

    /// Decryption key, 32 hex characters
    #[arg(short, long, required_unless_present_any = ["config", "list_ports"])]
    key: Option<String>,

    /// JSON configuration file instead of --interface/--key
    #[arg(short, long, conflicts_with_all = ["interface", "key"])]
    config: Option<PathBuf>,

    /// Also print the raw frame and decrypted payload
    #[arg(short, long)]
    raw: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print readings as JSON
    #[arg(long)]
    json: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Seconds to wait after a cycle without data
    #[arg(long, default_value = "5")]
    retry_delay: u64,

    /// Stop after this many readings
    #[arg(long)]
    count: Option<u64>,

    /// Drop frames with a bad HDLC frame check sequence
    #[arg(long)]
    verify_fcs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if cli.list_ports {
        for port in available_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let mut config = match (&cli.config, cli.interface, cli.key) {
        (Some(path), _, _) => MeterConfig::from_json_file(path)?,
        (None, Some(interface), Some(key)) => MeterConfig::new(interface, key),
        _ => bail!("A serial interface (-i/--interface) and a decryption key (-k/--key) must be set"),
    };
    config.verify_fcs |= cli.verify_fcs;

    let mut meter = SmartMeter::open(config).context("Invalid configuration")?;
    let retry_delay = Duration::from_secs(cli.retry_delay);
    let mut received = 0u64;

    loop {
        let result = tokio::select! {
            result = meter.read_meter_data() => result,
            _ = tokio::signal::ctrl_c() => break,
        };

        match result {
            Ok(Some(reading)) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&reading)?);
                } else {
                    println!("{reading}");
                }
                if cli.raw {
                    print_raw(&meter)?;
                }

                received += 1;
                if cli.count.is_some_and(|count| received >= count) {
                    break;
                }
            }
            Ok(None) => {
                warn!("No data from {}, retrying in {}s", meter.interface(), cli.retry_delay);
                tokio::select! {
                    _ = tokio::time::sleep(retry_delay) => {}
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            Err(e @ SmartMeterError::FramingDesync { .. }) => warn!("{e}"),
            Err(e) => return Err(e).context("Unable to decode meter data"),
        }
    }

    info!("Received {received} readings");
    meter.close();
    Ok(())
}

fn print_raw<C: smartmeter_rs::Connector>(meter: &SmartMeter<C>) -> anyhow::Result<()> {
    if let Some(frame) = meter.last_raw_frame() {
        println!("Raw notification packet:\n{}", encode_hex(frame.as_bytes()));
    }
    if let Some(payload) = meter.last_decrypted_payload()? {
        println!("Raw decrypted data:\n{}", encode_hex(&payload));
    }
    Ok(())
}
