use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use colored::*;
use consult_client::SignalingClient;
use consult_client::SignalingClientConfig;
use consult_client::signaling::{StaticIdentity, WsConnector};
use consult_core::{IceServerConfig, ParticipantId, SessionId, SessionLifecycle};
use consult_server::{RegistryConfig, RelayConfig};
use dialoguer::Input;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "consult")]
#[command(about = "Signaling relay for two-party video consultations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the signaling relay.
    Serve {
        #[arg(long, env = "CONSULT_BIND", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,

        /// STUN/TURN urls advertised to clients, comma separated.
        #[arg(
            long,
            env = "CONSULT_STUN",
            value_delimiter = ',',
            default_value = "stun:stun.l.google.com:19302"
        )]
        stun: Vec<String>,

        /// Identities allowed per session. 0 disables the cap.
        #[arg(long, env = "CONSULT_MAX_MEMBERS", default_value_t = 2)]
        max_members: usize,
    },
    /// Join a session and print what the relay sends.
    Probe {
        #[arg(long, env = "CONSULT_URL", default_value = "ws://127.0.0.1:3000/ws")]
        url: String,

        #[arg(long)]
        session: Option<String>,

        #[arg(long)]
        participant: Option<String>,
    },
}

/// Keeps a running count of open sessions on the console.
#[derive(Default)]
struct SessionBoard {
    active: AtomicUsize,
}

#[async_trait]
impl SessionLifecycle for SessionBoard {
    async fn on_session_started(&self, session_id: &SessionId) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        println!("{} {} ({} active)", "+ session".green(), session_id, active);
    }

    async fn on_session_ended(&self, session_id: &SessionId) {
        let active = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map_or(0, |previous| previous - 1);
        println!("{} {} ({} active)", "- session".yellow(), session_id, active);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            bind,
            stun,
            max_members,
        } => run_serve(bind, stun, max_members).await,
        Commands::Probe {
            url,
            session,
            participant,
        } => run_probe(url, session, participant).await,
    }
}

async fn run_serve(bind: SocketAddr, stun: Vec<String>, max_members: usize) -> Result<()> {
    if stun.iter().any(|url| url.trim().is_empty()) {
        bail!("Empty ICE server url in --stun");
    }

    let config = RelayConfig {
        bind_addr: bind,
        ice_servers: vec![IceServerConfig {
            urls: stun,
            username: None,
            credential: None,
        }],
        registry: RegistryConfig {
            max_members: (max_members > 0).then_some(max_members),
            ..RegistryConfig::default()
        },
    };

    println!("{}", "Starting consult relay...".green().bold());
    println!("   ws://{}/ws", config.bind_addr);
    match config.registry.max_members {
        Some(cap) => println!("   {} identities per session", cap),
        None => println!("   {}", "sessions uncapped".yellow()),
    }

    consult_server::serve(config, Arc::new(SessionBoard::default())).await
}

async fn run_probe(url: String, session: Option<String>, participant: Option<String>) -> Result<()> {
    let session_id = match session {
        Some(raw) => SessionId::parse(&raw).context("Invalid --session")?,
        None => SessionId::parse(prompt("Session id")?)?,
    };
    let participant_id = match participant {
        Some(raw) => ParticipantId::parse(&raw).context("Invalid --participant")?,
        None => ParticipantId::parse(prompt("Participant id")?)?,
    };

    let client = SignalingClient::new(
        Arc::new(WsConnector::new(url.clone())),
        Arc::new(StaticIdentity(participant_id)),
        SignalingClientConfig::default(),
    );

    client.on_user_joined(|peer| println!("{} {}", "+ joined".green(), peer));
    client.on_user_left(|peer| println!("{} {}", "- left".yellow(), peer));
    client.on_signal(|envelope| {
        println!(
            "{} {:?} from {}",
            "> signal".cyan(),
            envelope.kind,
            envelope.sender_id
        )
    });
    client.on_error(|err| eprintln!("{} {}", "! error".red(), err));

    println!("{}", format!("Connecting to {}...", url).cyan());
    let ack = client
        .connect(&session_id)
        .await
        .with_context(|| format!("Failed to join {}", session_id))?;

    println!(
        "{}",
        format!("Joined {} as {}", ack.session_id, ack.participant_id)
            .green()
            .bold()
    );
    println!("   members: {}", ack.members);
    for peer in &ack.peers {
        println!("   peer:    {}", peer);
    }
    for server in client.ice_servers().await {
        println!("   ice:     {}", server.urls.join(", "));
    }
    println!("{}", "Watching, ctrl-c to leave.".dimmed());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    client.disconnect().await;
    println!("{}", "Left session.".green());
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(label)
        .validate_with(|input: &String| -> Result<(), String> {
            if input.trim().is_empty() {
                Err("required".to_owned())
            } else {
                Ok(())
            }
        })
        .interact_text()
        .context("Failed to read input")
}
