//! Restbell CLI
//!
//! Terminal client for the Restbell notification server. Hosts the local
//! rest countdown and manages push delivery target registration.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use restbell_cli::config::{CliConfig, DeviceConfig};
use restbell_cli::connection::{ConnectionConfig, ServerConnection};
use restbell_cli::scheduler::RemoteReminderScheduler;
use restbell_cli::tui;
use restbell_core::timer::DEFAULT_REST_SECS;
use restbell_proto::v1::DeliveryPlatform;

#[derive(Parser, Debug)]
#[command(name = "restbell")]
#[command(version, about = "Rest-timer client for the Restbell notification server", long_about = None)]
struct Cli {
    /// Server address (overrides the saved config).
    #[arg(long)]
    server: Option<String>,

    /// Access token (overrides the saved config).
    #[arg(long, env = "RESTBELL_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save the server address and access token to the config file.
    Login {
        /// Server address, e.g. "http://127.0.0.1:50051".
        #[arg(long)]
        server: String,

        /// Access token issued by the account service.
        #[arg(long, env = "RESTBELL_TOKEN")]
        token: String,
    },

    /// Register this device's push delivery target.
    Register {
        /// Opaque push subscription or device token payload.
        #[arg(long)]
        target: String,

        /// Platform kind.
        #[arg(long, value_enum, default_value_t = PlatformArg::Native)]
        platform: PlatformArg,
    },

    /// Remove the registered delivery target.
    Unregister {
        /// Platform kind.
        #[arg(long, value_enum, default_value_t = PlatformArg::Native)]
        platform: PlatformArg,
    },

    /// Run the rest countdown for an exercise.
    Timer {
        /// Exercise the rest period belongs to.
        exercise: String,

        /// Rest length in seconds.
        #[arg(long, default_value_t = DEFAULT_REST_SECS)]
        duration: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PlatformArg {
    Web,
    Native,
}

impl PlatformArg {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Native => "native",
        }
    }
}

impl From<PlatformArg> for DeliveryPlatform {
    fn from(value: PlatformArg) -> Self {
        match value {
            PlatformArg::Web => Self::Web,
            PlatformArg::Native => Self::Native,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // All tracing goes to stderr: stdout belongs to the countdown TUI
    let default_filter = if matches!(cli.command, Command::Timer { .. }) {
        "restbell=warn"
    } else {
        "restbell=info"
    };
    restbell_core::tracing_init::init_stderr_tracing(default_filter);

    let mut config = CliConfig::load();

    if let Command::Login { server, token } = &cli.command {
        config.server_url = Some(server.clone());
        config.access_token = Some(token.clone());
        config.save()?;
        info!(server = %server, "Credentials saved");
        return Ok(());
    }

    let conn_config = ConnectionConfig {
        addr: cli
            .server
            .or_else(|| config.server_url.clone())
            .unwrap_or_else(|| ConnectionConfig::default().addr),
        auth_token: cli.token.or_else(|| config.access_token.clone()),
        ..ConnectionConfig::default()
    };
    let conn = ServerConnection::connect(conn_config).await?;

    match cli.command {
        Command::Login { .. } => {} // handled above

        Command::Register { target, platform } => {
            let resp = conn
                .register_delivery_target(&target, platform.into())
                .await?;
            if resp.success {
                config.device = Some(DeviceConfig {
                    delivery_target: target,
                    platform: platform.as_str().to_string(),
                });
                config.save()?;
                info!(platform = platform.as_str(), "Delivery target registered");
            } else {
                warn!("Server declined the delivery target registration");
            }
        }

        Command::Unregister { platform } => {
            let resp = conn.unregister_delivery_target(platform.into()).await?;
            config.device = None;
            config.save()?;
            if resp.success {
                info!(platform = platform.as_str(), "Delivery target unregistered");
            } else {
                info!("No delivery target was registered");
            }
        }

        Command::Timer { exercise, duration } => {
            let delivery_target = config
                .device
                .as_ref()
                .map(|d| d.delivery_target.clone());
            if delivery_target.is_none() {
                warn!(
                    "No delivery target registered; the countdown runs without \
                     background notifications (run `restbell register` first)"
                );
            }

            let scheduler = RemoteReminderScheduler::new(conn, delivery_target);
            tui::run(scheduler, &exercise, duration).await?;
        }
    }

    Ok(())
}
