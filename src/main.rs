use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use ergo_swap_lib::commands::{self, SwapArgs};
use ergo_swap_lib::{AppConfig, EngineRegistry};
use ergo_swap_sdk::{Account, Network, NodeWalletProver, PoolId, Slippage};

#[derive(Parser)]
#[command(name = "ergo-swap")]
#[command(about = "Quote and submit AMM swaps on Ergo", long_about = None)]
struct Cli {
    /// Directory holding ergo_swap_config.json
    #[arg(long, env = "ERGO_SWAP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Network to use instead of the configured one
    #[arg(long)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TradeArgs {
    /// Asset to sell: ERG, a token id, or a token name
    base: String,
    /// Asset to buy
    quote: String,
    /// Amount of the sold asset, in its display decimals
    amount: String,
    /// Maximum slippage in percent
    #[arg(short, long, default_value = "0.5")]
    slippage: Slippage,
    /// Route through this pool only
    #[arg(long)]
    pool: Option<PoolId>,
}

impl From<TradeArgs> for SwapArgs {
    fn from(args: TradeArgs) -> Self {
        SwapArgs {
            base: args.base,
            quote: args.quote,
            amount: args.amount,
            slippage: args.slippage,
            pool_id: args.pool,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Persist the default network
    SetNetwork { network: Network },
    /// Show the balance of an address
    Balance {
        /// Defaults to the configured address
        address: Option<String>,
    },
    /// List pools, optionally for one pair
    Pools {
        #[arg(requires = "quote")]
        base: Option<String>,
        quote: Option<String>,
    },
    /// Price a swap without touching the wallet
    Quote(TradeArgs),
    /// Place a swap order signed by the node wallet
    Swap {
        #[command(flatten)]
        trade: TradeArgs,
        /// Address funding the swap; defaults to the configured address
        #[arg(long)]
        address: Option<String>,
        /// Change address; defaults to the funding address
        #[arg(long)]
        change: Option<String>,
    },
    /// Keep the pool set fresh until interrupted
    Watch {
        /// Seconds between reloads; defaults to the configured interval
        #[arg(long)]
        every: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    ergo_swap_lib::init_logging();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(AppConfig::default_data_dir);
    let mut config = AppConfig::load(&data_dir)?;

    if let Commands::SetNetwork { network } = cli.command {
        config.network = network;
        config.save(&data_dir)?;
        println!("default network set to {network}");
        return Ok(());
    }

    config.apply_env(cli.network, |key| std::env::var(key).ok())?;
    let network = config.network;
    let engine_config = config.engine(network).clone();

    let mut registry = EngineRegistry::default();
    registry
        .activate(engine_config.clone())
        .await
        .with_context(|| format!("activating {network} engine"))?;
    let node = registry.get(network)?;

    match cli.command {
        Commands::SetNetwork { .. } => {}
        Commands::Balance { address } => {
            let address = config.wallet_address(address)?;
            for line in commands::balance(node, address).await? {
                println!("{:>24}  {}", line.amount, line.asset);
            }
        }
        Commands::Pools { base, quote } => {
            let pair = base.zip(quote);
            for line in commands::pools(node, pair).await? {
                println!("{line}");
            }
        }
        Commands::Quote(trade) => {
            println!("{}", commands::quote(node, trade.into()).await?);
        }
        Commands::Swap {
            trade,
            address,
            change,
        } => {
            let address = config.wallet_address(address)?;
            let Some(api_key) = engine_config.node_api_key.as_deref() else {
                bail!("swap needs a node API key (set ERGO_SWAP_NODE_API_KEY)");
            };
            let prover = NodeWalletProver::new(
                &engine_config.node_url,
                api_key,
                engine_config.http_timeout(),
            )?;
            let account = Arc::new(Account::new(address, Box::new(prover)));
            println!("{}", commands::swap(node, trade.into(), account, change).await?);
        }
        Commands::Watch { every } => {
            let every = Duration::from_secs(every.unwrap_or(config.pool_refresh_secs).max(1));
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let refresher = node.spawn_pool_refresher(every, shutdown_rx);
            log::info!("refreshing {network} pools every {}s", every.as_secs());
            tokio::signal::ctrl_c().await?;
            let _ = shutdown_tx.send(true);
            refresher.await?;
        }
    }
    Ok(())
}
