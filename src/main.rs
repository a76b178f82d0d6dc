use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use semisync_kv::api::{ApiState, Metrics, Node, RouterBuilder};
use semisync_kv::cluster::{ClusterState, FollowerNode, Leader, QuorumReplicator};
use semisync_kv::config::{CliArgs, Role};
use semisync_kv::replication::{DelayModel, FollowerEndpoint, HttpFollower};

// Upper bound on draining background replications at shutdown.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

fn build_leader(args: &CliArgs) -> anyhow::Result<Arc<Leader>> {
    let config = args.replication_config();
    config.validate().context("invalid replication configuration")?;

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build http client")?;
    let delay: Arc<dyn DelayModel> = Arc::new(config.delay_model()?);

    let followers: Vec<Arc<dyn FollowerEndpoint>> = args
        .follower_urls()
        .iter()
        .map(|url| Arc::new(HttpFollower::new(client.clone(), url, Arc::clone(&delay))) as Arc<dyn FollowerEndpoint>)
        .collect();

    let mut replicator = QuorumReplicator::new(followers, config.write_quorum)?;
    if let Some(deadline) = config.write_deadline {
        replicator = replicator.with_deadline(deadline);
    }
    Ok(Arc::new(Leader::new(args.node_id.clone(), replicator)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    let cluster = Arc::new(ClusterState::from(&args));

    let node = match args.role {
        Role::Leader => {
            let leader = build_leader(&args)?;
            tracing::info!(
                node_id = %args.node_id,
                write_quorum = leader.quorum(),
                followers = ?cluster.follower_urls,
                min_delay_ms = args.min_delay_ms,
                max_delay_ms = args.max_delay_ms,
                write_deadline_ms = ?args.write_deadline_ms,
                "starting leader"
            );
            Node::Leader(leader)
        }
        Role::Follower => {
            tracing::info!(node_id = %args.node_id, "starting follower");
            Node::Follower(Arc::new(FollowerNode::new(args.node_id.clone())))
        }
    };

    let state = ApiState {
        node: node.clone(),
        cluster: Arc::clone(&cluster),
        metrics: Metrics::new().context("failed to register metrics")?,
    };
    let app = RouterBuilder::with_state(state);

    let listener = TcpListener::bind(cluster.address)
        .await
        .with_context(|| format!("failed to bind {}", cluster.address))?;
    tracing::info!(addr = %cluster.address, role = %cluster.role, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Node::Leader(leader) = node {
        let tracker = leader.tracker();
        tracing::info!(in_flight = tracker.in_flight(), "draining background replication");
        if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait_idle()).await.is_err() {
            tracing::warn!(in_flight = tracker.in_flight(), "abandoning unfinished replication");
        }
    }

    Ok(())
}
