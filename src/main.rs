use balance_relay::blockchain::{subscribe, Topic};
use balance_relay::config::PushTopicKind;
use balance_relay::error::ConfigError;
use balance_relay::logging::init_logging;
use balance_relay::{
    AppConfig, AssetKind, ChainClient, DispatchResult, Forwarder, ForwarderError, NetworkResolver, RpcClient, WatchSettings,
    WatchStrategy, Watcher,
};
use clap::{Parser, Subcommand};
use log::{error, info};
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "forwarder")]
#[command(about = "Watches an account and relays incoming funds to a receiver")]
#[command(version)]
struct Cli {
    /// Network to operate on (ethereum, polygon, linea, linea-sepolia)
    #[arg(long, global = true)]
    network: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the sender account and forward incoming funds
    Watch {
        #[arg(long, value_enum)]
        strategy: Option<WatchStrategy>,
    },
    /// Send a single transfer to the receiver
    Send {
        /// Amount in whole units; defaults to VALUE_ETHER
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long, value_enum)]
        asset: Option<AssetKind>,
    },
    /// Print a sample configuration file
    SampleConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if matches!(cli.command, Command::SampleConfig) {
        println!("{}", AppConfig::generate_sample_config()?);
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    init_logging(&config.logging)?;

    let network = cli
        .network
        .clone()
        .unwrap_or_else(|| config.networks.default_network.clone());
    let profile = NetworkResolver::from_config(&config)?.resolve(&network)?;
    info!("Using network {} (chain id {})", profile.name, profile.chain_id);

    let client: Arc<dyn ChainClient> = Arc::new(RpcClient::new(profile.rpc_url.clone(), &config.rpc)?);
    let forwarder = Forwarder::from_config(Arc::clone(&client), profile.clone(), &config)?;

    match cli.command {
        Command::Send { amount, asset } => {
            let amount = amount
                .or(config.transfer.amount)
                .ok_or_else(|| ConfigError::MissingEnvVar("VALUE_ETHER".to_string()))?;
            let asset = asset.unwrap_or(config.transfer.forward_asset);

            match forwarder.send(amount, asset).await? {
                DispatchResult::Confirmed { hash } => info!("Transfer confirmed: {}", hash),
                other => {
                    error!("Transfer not completed: {:?}", other);
                    std::process::exit(1);
                }
            }
        }
        Command::Watch { strategy } => {
            let strategy = strategy.unwrap_or(config.watch.strategy);
            let monitored = forwarder.sender();
            let mut watcher = Watcher::new(client, forwarder, WatchSettings::from_config(&config));

            let run = async {
                match strategy {
                    WatchStrategy::Polling => watcher.run_polling().await?,
                    WatchStrategy::Push => {
                        let topic = match config.watch.push_topic {
                            PushTopicKind::Pending => Topic::PendingTransactions,
                            PushTopicKind::Logs => Topic::TokenTransfers {
                                token: profile.require_token()?.address,
                                recipient: monitored,
                            },
                        };
                        let mut subscription = subscribe(profile.require_ws_url()?, topic).await?;
                        watcher.run_push(&mut subscription).await?
                    }
                }
                Ok::<(), ForwarderError>(())
            };

            tokio::select! {
                result = run => result?,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Received shutdown signal");
                }
            }
        }
        Command::SampleConfig => {}
    }

    Ok(())
}
