//! phn-node — the PHN full-node binary.
//!
//! Startup sequence:
//!   1. Load (or generate) the owner wallet
//!   2. Open the persistent store; load the chain, or mint genesis if fresh
//!   3. Build the Node Facade and start the peer-sync background task
//!   4. Start the HTTP/JSON transport
//!   5. Run until Ctrl-C, then flush and exit

mod config;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use config::{expand_tilde, Args};
use phn_chain::Chain;
use phn_consensus::Checkpointer;
use phn_core::time::now_unix;
use phn_genesis::{build_genesis_block, load_or_generate_owner_wallet};
use phn_mempool::Mempool;
use phn_rpc::facade::{NodeHandle, NodeParams};
use phn_rpc::rate_limit::RateLimiters;
use phn_rpc::server::{router, AppState};
use phn_store::Store;
use phn_sync::{PeerSync, SyncConfig};

/// Interval between `periodic_tick` passes (sync-best + recovery probing).
/// Not consensus-bearing; chosen as a reasonable cadence, not named by any
/// fixed constant.
const SYNC_TICK_INTERVAL_SECS: u64 = 15;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,phn=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("PHN node starting");

    let owner_file = expand_tilde(&args.owner_file);
    let owner = load_or_generate_owner_wallet(&owner_file).context("loading owner wallet")?;

    let store_dir = expand_tilde(&args.lmdb_dir);
    std::fs::create_dir_all(&store_dir).with_context(|| format!("creating store dir {}", store_dir.display()))?;
    let store = Store::open(&store_dir).context("opening store")?;

    let total_supply = args.total_supply_amount();
    let starting_reward = args.starting_reward_amount();
    let min_fee = args.min_fee_amount();

    let chain = match store.load_chain().context("loading persisted chain")? {
        Some(blocks) => {
            info!(height = blocks.len(), "loaded existing chain");
            Chain::from_blocks(blocks)
        }
        None => {
            info!("fresh store — minting genesis block");
            let genesis = build_genesis_block(&owner.address, total_supply, now_unix()).context("building genesis block")?;
            store.save_chain(std::slice::from_ref(&genesis)).context("persisting genesis block")?;
            let record = phn_genesis::genesis_validation_record(&genesis, now_unix());
            store.put_validation(&record).context("recording genesis validation")?;
            Chain::from_blocks(vec![genesis])
        }
    };

    let mempool = {
        let mut pool = Mempool::default();
        for tx in store.load_mempool().context("loading persisted mempool")? {
            let _ = pool.admit(tx, now_unix());
        }
        pool
    };

    let sync_config = SyncConfig { initial_peers: args.peers.clone(), ..SyncConfig::default() };
    let mut sync = PeerSync::new(sync_config);
    for peer in store.load_peers().context("loading persisted peers")? {
        sync.add_peer(peer);
    }

    let node = Arc::new(NodeHandle::new(
        chain,
        mempool,
        Checkpointer::new(),
        sync,
        store,
        NodeParams {
            owner_address: owner.address.clone(),
            starting_reward,
            total_supply,
            token_name: "PHN".to_string(),
        },
    ));

    // ── Background peer-sync loop ─────────────────────────────────────────────
    let sync_node = Arc::clone(&node);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(SYNC_TICK_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            sync_node.run_sync_tick().await;
        }
    });

    // ── HTTP transport ────────────────────────────────────────────────────────
    let state = AppState {
        node: Arc::clone(&node),
        limiters: Arc::new(RateLimiters::new()),
        min_fee,
        target_block_seconds: phn_core::constants::TARGET_BLOCK_SECONDS,
    };
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", args.node_host, args.node_port)
        .parse()
        .context("parsing bind address")?;
    let listener = tokio::net::TcpListener::bind(addr).await.context("binding listener")?;
    info!(%addr, owner = %node.owner_address(), "node ready");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running HTTP server")?;

    info!("flushing store on shutdown");
    node.store().flush().context("flushing store")?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl-C, shutting down");
}
