//! SMB2 negotiate probe
//!
//! Connects to a server, runs the negotiate exchange and prints what the
//! server offered. No session is set up.

use clap::Parser;
use smb2_handshake::auth::{Credentials, TokenProvider};
use smb2_handshake::protocol::Smb2Dialect;
use smb2_handshake::{Client, ClientConfig, Error, TcpDispatcher};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "smb2-probe")]
#[command(about = "Negotiate with an SMB2 server and report its parameters", long_about = None)]
struct Args {
    /// SMB server address or hostname
    #[arg(short = 'H', long)]
    host: String,

    /// Port to connect to
    #[arg(short = 'p', long, default_value = "445")]
    port: u16,

    /// Offer only SMB 2.x dialects
    #[arg(long)]
    smb2_only: bool,

    /// Timeout in seconds for connect and negotiate
    #[arg(short = 't', long, default_value = "10")]
    timeout: u64,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

/// Provider for a probe that never authenticates
struct NoAuth;

impl TokenProvider for NoAuth {
    fn negotiate_token(&mut self, _credentials: &Credentials) -> smb2_handshake::Result<Vec<u8>> {
        Err(Error::Provider("probe does not authenticate".to_string()))
    }

    fn auth_token(
        &mut self,
        _credentials: &Credentials,
        _challenge: &[u8],
    ) -> smb2_handshake::Result<Vec<u8>> {
        Err(Error::Provider("probe does not authenticate".to_string()))
    }

    fn session_key(&self) -> Option<Vec<u8>> {
        None
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut config = ClientConfig::default();
    if args.smb2_only {
        config.dialects = vec![Smb2Dialect::Smb202, Smb2Dialect::Smb210];
    }

    let timeout = Duration::from_secs(args.timeout);

    tracing::info!("Connecting to {}:{}", args.host, args.port);
    let dispatcher =
        tokio::time::timeout(timeout, TcpDispatcher::connect((args.host.as_str(), args.port)))
            .await??;

    let mut client = Client::with_config(dispatcher, NoAuth, Credentials::default(), config);
    let response = tokio::time::timeout(timeout, client.negotiate()).await??;

    println!("Dialect:          {}", response.dialect_revision);
    println!("Server GUID:      {}", response.server_guid);
    println!("Security mode:    {:?}", response.security_mode);
    println!("Capabilities:     {:?}", response.capabilities);
    println!("Max transact:     {}", response.max_transact_size);
    println!("Max read:         {}", response.max_read_size);
    println!("Max write:        {}", response.max_write_size);
    println!("Security blob:    {} bytes", response.security_blob.len());

    if let Some(params) = client.negotiated() {
        if params.signing_required() {
            println!("Signing:          required");
        } else {
            println!("Signing:          not required");
        }
    }

    let (mut dispatcher, _) = client.into_parts();
    dispatcher.shutdown().await?;

    Ok(())
}
