use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use econet::devices::ecomax::Ecomax;
use econet::protocol::{Dispatcher, DeviceHandle};
use econet::structures::network_info::NetworkInfo;
use econet::transport::TcpTransport;

#[derive(Parser)]
#[command(name = "econet")]
#[command(about = "Talk to a Plum ecoMAX controller over an RS-485-over-TCP bridge")]
struct Cli {
    /// Bridge address, e.g. "192.168.1.50:8899"
    #[arg(short, long)]
    address: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect and stream decoded ecoMAX keys to stdout as they arrive
    Monitor {
        /// Stop after this many seconds (omit to run until interrupted)
        #[arg(short, long)]
        seconds: Option<u64>,
    },

    /// Connect, write one ecoMAX parameter, then exit
    Set {
        /// Parameter name as reported by `monitor` (e.g. "heating_set_temp")
        name: String,
        /// New semantic value
        value: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let transport = Box::new(TcpTransport::new(cli.address.clone()));
    let dispatcher = Dispatcher::new(transport, NetworkInfo::default());

    let run_handle = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.run().await })
    };

    let ecomax = wait_for_ecomax(&dispatcher).await?;

    match cli.command {
        Commands::Monitor { seconds } => monitor(&ecomax, seconds).await,
        Commands::Set { name, value } => {
            let confirmed = ecomax.set(&name, value).await.with_context(|| format!("setting {name:?}"))?;
            if confirmed {
                log::info!("confirmed {name} = {value}");
            } else {
                log::warn!("{name} = {value} was not confirmed");
            }
            Ok(())
        }
    }?;

    dispatcher.shutdown().await;
    run_handle.abort();
    Ok(())
}

async fn wait_for_ecomax(dispatcher: &std::sync::Arc<Dispatcher>) -> Result<std::sync::Arc<Ecomax>> {
    let handle = dispatcher.get_device("ecomax").await;
    match handle {
        DeviceHandle::Ecomax(ecomax) => Ok(ecomax),
        DeviceHandle::EcoSter(_) => anyhow::bail!("expected ecomax, got ecoster"),
    }
}

async fn monitor(ecomax: &Ecomax, seconds: Option<u64>) -> Result<()> {
    for key in ["state", "heating_temp", "heating_target", "mode", "boiler_control", "burned_fuel"] {
        if let Some(value) = ecomax.get(key).await {
            println!("{key} = {}", serde_json::to_string(&value)?);
        }
    }

    if let Some(seconds) = seconds {
        tokio::time::sleep(Duration::from_secs(seconds)).await;
    } else {
        tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    }

    Ok(())
}
