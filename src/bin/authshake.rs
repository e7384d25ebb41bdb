//! authshake CLI binary.
//!
//! Runs one side of one authentication session and exits.
//!
//! # Commands
//!
//! - `server` - Accept one client and verify it
//! - `client` - Connect and authenticate

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use authshake::{
    session::{ClientHandshake, ScriptedConsole, StdConsole},
    transport::tcp::accept_one,
    ClientSession, Config, Framing, PlaintextClient, PlaintextServer, ServerSession,
    SessionOutcome, TcpEndpoint, VERSION,
};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "authshake")]
#[command(version = VERSION)]
#[command(about = "Challenge-response authentication over TCP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept one connection and authenticate the client
    Server {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Connect to a server and authenticate
    Client {
        #[command(flatten)]
        common: CommonArgs,

        /// Shared secret (overrides config and AUTHSHAKE_SECRET)
        #[arg(long)]
        secret: Option<String>,

        /// Identity to greet with
        #[arg(long)]
        identity: Option<String>,

        /// Plaintext username (prompted for when omitted)
        #[arg(long, requires = "password")]
        username: Option<String>,

        /// Plaintext password (prompted for when omitted)
        #[arg(long, requires = "username")]
        password: Option<String>,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Authentication mode: challenge, plaintext
    #[arg(short, long, default_value = "challenge")]
    mode: String,

    /// Host to bind (server) or connect to (client)
    #[arg(long)]
    host: Option<String>,

    /// Port
    #[arg(short, long)]
    port: Option<u16>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Receive timeout in seconds (0 waits forever)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Framing: raw, length-prefixed
    #[arg(long)]
    framing: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Challenge,
    Plaintext,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "challenge" | "challenge-response" | "hmac" => Ok(Self::Challenge),
            "plaintext" | "plain" => Ok(Self::Plaintext),
            _ => anyhow::bail!("Unknown mode: {s}. Use: challenge, plaintext"),
        }
    }
}

impl CommonArgs {
    /// Load config, then apply flags on top
    fn resolve(&self) -> anyhow::Result<(Mode, Config)> {
        let mode = Mode::from_str(&self.mode)?;
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(port) = self.port {
            config.server.port = port;
            config.client.port = port;
        }
        if let Some(secs) = self.timeout_secs {
            config.transport.receive_timeout_secs = secs;
        }
        if let Some(framing) = &self.framing {
            config.transport.framing = Framing::from_str(framing).map_err(anyhow::Error::msg)?;
        }

        Ok((mode, config))
    }
}

/// Which side of the session this process ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Server,
    Client,
}

/// Authentication rejected (client side only)
const EXIT_REJECTED: u8 = 1;

/// Setup, transport or configuration error
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = match &cli.command {
        Commands::Server { common } | Commands::Client { common, .. } => common.verbose,
    };
    init_logging(verbose);

    ExitCode::from(exit_status(run(cli)))
}

fn run(cli: Cli) -> anyhow::Result<(Role, SessionOutcome)> {
    match cli.command {
        Commands::Server { common } => {
            let (mode, mut config) = common.resolve()?;
            if let Some(host) = common.host {
                config.server.host = host;
            }

            let outcome = run_async(cmd_server(mode, config))?;
            Ok((Role::Server, outcome))
        }

        Commands::Client {
            common,
            secret,
            identity,
            username,
            password,
        } => {
            let (mode, mut config) = common.resolve()?;
            if let Some(host) = common.host {
                config.client.host = host;
            }
            if secret.is_some() {
                config.client.secret = secret;
            }
            if identity.is_some() {
                config.client.identity = identity;
            }

            let answers = username.zip(password);
            let outcome = run_async(cmd_client(mode, config, answers))?;
            Ok((Role::Client, outcome))
        }
    }
}

/// Report the result once and map it to a process exit status
fn exit_status(result: anyhow::Result<(Role, SessionOutcome)>) -> u8 {
    match result {
        Ok((role, outcome)) => {
            tracing::info!(
                session = %outcome.session_id,
                verdict = %outcome.verdict,
                "Session finished"
            );
            if role == Role::Client && !outcome.is_success() {
                EXIT_REJECTED
            } else {
                0
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            EXIT_ERROR
        }
    }
}

fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();
}

fn run_async<F>(future: F) -> anyhow::Result<SessionOutcome>
where
    F: std::future::Future<Output = anyhow::Result<SessionOutcome>>,
{
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(future)
}

async fn cmd_server(mode: Mode, config: Config) -> anyhow::Result<SessionOutcome> {
    let addr = config.server.listen_addr()?;
    let transport_config = config.transport.to_transport_config();
    let store = Arc::new(config.identity_store()?);

    tracing::info!(
        "Starting authshake server ({:?} mode, {} framing)",
        mode,
        transport_config.framing
    );

    let listener = TcpEndpoint::new(addr).listen().await?;
    let (mut transport, peer) = accept_one(&listener, &transport_config).await?;

    let outcome = match mode {
        Mode::Challenge => ServerSession::new(store).run(&mut transport).await,
        Mode::Plaintext => PlaintextServer::new(store).run(&mut transport).await,
    }
    .with_context(|| format!("Session with {peer} failed"))?;

    Ok(outcome)
}

async fn cmd_client(
    mode: Mode,
    config: Config,
    answers: Option<(String, String)>,
) -> anyhow::Result<SessionOutcome> {
    let addr = config.client.server_addr()?;
    let transport_config = config.transport.to_transport_config();

    let mut transport = TcpEndpoint::new(addr).connect(&transport_config).await?;

    let outcome = match mode {
        Mode::Challenge => {
            let mut handshake = ClientHandshake::new(config.client_secret());
            if let Some(identity) = &config.client.identity {
                handshake = handshake.with_identity(identity.as_str());
            }
            ClientSession::from_handshake(handshake)
                .run(&mut transport)
                .await
        }
        Mode::Plaintext => {
            let unframed = transport_config.framing == Framing::Raw;
            match answers {
                Some((username, password)) => {
                    PlaintextClient::new(ScriptedConsole::new([username, password]))
                        .reject_empty_answers(unframed)
                        .run(&mut transport)
                        .await
                }
                None => {
                    PlaintextClient::new(StdConsole::new())
                        .reject_empty_answers(unframed)
                        .run(&mut transport)
                        .await
                }
            }
        }
    }
    .with_context(|| format!("Session with {addr} failed"))?;

    Ok(outcome)
}
