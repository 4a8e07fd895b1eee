//! Bridge monitor binary

mod args;
mod constants;

use args::MonitorArgs;
use std::{sync::Arc, time::Duration};

use alloy_network::{AnyNetwork, Ethereum};
use alloy_provider::ProviderBuilder;
use alloy_rpc_client::RpcClient;
use bridge_monitor_primitives::{ChainBlock, EvaluateResponse, Severity};
use bridge_monitor_providers::{AlloyChainClient, CacheConfig, ChainClient, RetryingClient};
use bridge_monitor_watcher::{BridgeAgent, MonitorConfig};
use clap::Parser;
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    init_tracing_subscriber();

    let args = MonitorArgs::parse();
    run(args).await
}

async fn run(args: MonitorArgs) -> eyre::Result<()> {
    let config = MonitorConfig::for_chain(args.l2.chain_id)?;
    let retry = args.retry();

    let l1_provider = ProviderBuilder::<_, _, Ethereum>::default()
        .connect_client(RpcClient::builder().http(args.l1.url.clone()));
    let l1 = Arc::new(RetryingClient::new(
        AlloyChainClient::<_, Ethereum>::new(l1_provider),
        "l1",
        retry,
        CacheConfig::default(),
    ));
    let l2_provider = ProviderBuilder::<_, _, AnyNetwork>::default()
        .connect_client(RpcClient::builder().http(args.l2.url.clone()));
    let l2 = Arc::new(RetryingClient::new(
        AlloyChainClient::<_, AnyNetwork>::new(l2_provider),
        "l2",
        retry,
        CacheConfig::default(),
    ));

    let mut agent = BridgeAgent::new(l1.clone(), l2, config)?;
    agent.initialize().await?;
    tracing::info!(target: "bridge::monitor", l1 = %args.l1.url, l2 = %args.l2.url, chain_id = args.l2.chain_id, "bridge monitor started");

    let mut interval = tokio::time::interval(Duration::from_millis(args.l1.poll_interval_ms));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_processed: Option<u64> = None;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "bridge::monitor", "received shutdown signal");
                break;
            }
            _ = interval.tick() => {}
        }

        let head = match l1.latest_block().await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!(target: "bridge::monitor", %err, "failed to fetch L1 head");
                continue;
            }
        };
        if last_processed.is_some_and(|number| head.number <= number) {
            continue;
        }

        let from = last_processed.map_or(head.number, |number| {
            (number + 1).max(head.number.saturating_sub(constants::MAX_L1_CATCH_UP - 1))
        });
        for number in from..=head.number {
            let block = if number == head.number {
                head
            } else {
                match l1.block_by_number(number).await {
                    Ok(block) => block,
                    Err(err) => {
                        tracing::warn!(target: "bridge::monitor", number, %err, "skipping L1 block");
                        continue;
                    }
                }
            };
            process_block(&agent, &l1, block).await;
        }
        last_processed = Some(head.number);

        if !agent.is_healthy() {
            tracing::error!(target: "bridge::monitor", "bridge monitor is unhealthy");
        }
    }

    Ok(())
}

/// Evaluates the L1 block and its transactions.
async fn process_block<L1, L2>(
    agent: &BridgeAgent<L1, L2>,
    l1: &RetryingClient<L1>,
    block: ChainBlock,
) where
    L1: ChainClient + 'static,
    L2: ChainClient + 'static,
{
    report(&block, agent.handle_block(block));

    match l1.block_with_transactions(block.hash).await {
        Ok(full) => {
            for tx in &full.transactions {
                report(&block, agent.handle_transaction(tx));
            }
        }
        Err(err) => {
            tracing::warn!(target: "bridge::monitor", number = block.number, %err, "failed to fetch L1 transactions");
        }
    }
}

fn report(block: &ChainBlock, response: EvaluateResponse) {
    if !response.is_success() {
        tracing::warn!(target: "bridge::monitor", number = block.number, "evaluation failed");
    }
    for finding in response.findings {
        if finding.severity >= Severity::High {
            tracing::error!(target: "bridge::monitor", l1_block = block.number, metadata = ?finding.metadata, "{finding}");
        } else {
            tracing::warn!(target: "bridge::monitor", l1_block = block.number, metadata = ?finding.metadata, "{finding}");
        }
    }
}

fn init_tracing_subscriber() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_line_number(false)
                .with_ansi(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
