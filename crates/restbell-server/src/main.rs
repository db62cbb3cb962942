//! Restbell Notification Server
//!
//! gRPC server that persists scheduled rest notifications and delivers them
//! through FCM on a fixed sweep cadence.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tonic::transport::Server;
use tracing::{info, warn};

use restbell_proto::v1::device_service_server::DeviceServiceServer;
use restbell_proto::v1::rest_timer_service_server::RestTimerServiceServer;

use restbell_server::auth::JwtManager;
use restbell_server::push::FcmClient;
use restbell_server::server::{DeviceServiceImpl, RestTimerServiceImpl, jwt_interceptor};
use restbell_server::storage::ServerDatabase;
use restbell_server::worker::{DeliveryWorker, SweepConfig};

#[derive(Parser, Debug)]
#[command(name = "restbell-server")]
#[command(
    version,
    about = "Restbell notification server - schedule store and delivery sweep"
)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:50051")]
    addr: SocketAddr,

    /// Path to SQLite database file.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JWT secret key.
    #[arg(
        long,
        env = "RESTBELL_JWT_SECRET",
        default_value = "dev-secret-change-me"
    )]
    jwt_secret: String,

    /// Access token TTL in seconds.
    #[arg(long, default_value_t = 3600)]
    access_ttl: i64,

    /// Path to the FCM service account credentials JSON file.
    #[arg(long, env = "RESTBELL_FCM_CREDENTIALS")]
    fcm_credentials: PathBuf,

    /// Seconds between delivery sweeps.
    #[arg(long, default_value_t = 60)]
    sweep_interval: u64,

    /// Seconds a notification record is retained before being purged.
    #[arg(long, default_value_t = 3600)]
    retention: u64,

    /// Delete delivery targets the push channel reports as permanently gone.
    /// By default stale targets are only logged.
    #[arg(long)]
    evict_invalid_targets: bool,

    /// Output logs as JSON (for structured log aggregation).
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    restbell_core::tracing_init::init_tracing("restbell_server=info", args.log_json);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %args.addr,
        "Starting restbell-server"
    );

    let db = match &args.db_path {
        Some(path) => {
            info!(path = %path.display(), "Opening server database");
            ServerDatabase::open(path).await?
        }
        None => {
            let default_path = default_db_path()?;
            info!(path = %default_path.display(), "Opening server database (default path)");
            ServerDatabase::open(&default_path).await?
        }
    };

    let jwt = Arc::new(JwtManager::new(args.jwt_secret.as_bytes(), args.access_ttl));

    let fcm = FcmClient::from_credentials_file(&args.fcm_credentials)?;

    // Spawn background task that delivers due notifications and purges
    // stale records on a fixed cadence.
    let worker = DeliveryWorker::with_config(
        db.clone(),
        fcm,
        SweepConfig {
            retention: Duration::from_secs(args.retention),
            evict_invalid_targets: args.evict_invalid_targets,
        },
    );
    let sweep_interval = args.sweep_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));
        interval.tick().await; // Skip first immediate tick
        loop {
            interval.tick().await;
            match worker.run_sweep().await {
                Ok(summary) if summary.due > 0 || summary.purged > 0 => {
                    info!(
                        due = summary.due,
                        sent = summary.sent,
                        failed = summary.failed,
                        purged = summary.purged,
                        "Delivery sweep completed"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Delivery sweep failed");
                }
                _ => {}
            }
        }
    });

    let timer = RestTimerServiceImpl::new(db.clone());
    let device = DeviceServiceImpl::new(db);

    let jwt_check = jwt_interceptor(Arc::clone(&jwt));

    let grpc_router = Server::builder()
        .http2_keepalive_interval(Some(Duration::from_secs(30)))
        .http2_keepalive_timeout(Some(Duration::from_secs(10)))
        .add_service(RestTimerServiceServer::with_interceptor(
            timer,
            jwt_check.clone(),
        ))
        .add_service(DeviceServiceServer::with_interceptor(device, jwt_check));

    info!(addr = %args.addr, "Server starting");

    tokio::select! {
        result = grpc_router.serve(args.addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Server stopped");
    Ok(())
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".restbell").join("server.db"))
}
