//! authkit server binary

use authkit_core::{
    CredentialStore, MemoryCredentialStore, RevocationRegistry, Role, TokenCodec, TokenConfig,
    TokenIssuer, TokenVerifier,
};
use clap::{Arg, Command};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

mod handlers;
mod server;

use handlers::AppState;
use server::AuthServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = Command::new("authkit-server")
        .version("0.1.0")
        .about("Token-based authentication and role-based authorization service")
        .arg(
            Arg::new("bind")
                .long("bind")
                .value_name("ADDR")
                .help("Bind address")
                .default_value("127.0.0.1:8081"),
        )
        .arg(
            Arg::new("token-secret")
                .long("token-secret")
                .value_name("SECRET")
                .help("Token signing secret (falls back to AUTHKIT_TOKEN_SECRET)"),
        )
        .arg(
            Arg::new("access-ttl-secs")
                .long("access-ttl-secs")
                .value_name("SECS")
                .help("Access token lifetime in seconds")
                .default_value("900"),
        )
        .arg(
            Arg::new("refresh-ttl-secs")
                .long("refresh-ttl-secs")
                .value_name("SECS")
                .help("Refresh token lifetime in seconds")
                .default_value("604800"),
        )
        .arg(
            Arg::new("prune-interval-secs")
                .long("prune-interval-secs")
                .value_name("SECS")
                .help("Revocation registry prune interval in seconds")
                .default_value("60"),
        )
        .arg(
            Arg::new("seed-admin")
                .long("seed-admin")
                .value_name("LOGIN:PASSWORD")
                .help("Create a bootstrap ADMIN account at startup"),
        )
        .get_matches();

    let bind_addr: SocketAddr = matches
        .get_one::<String>("bind")
        .unwrap()
        .parse()
        .expect("Invalid bind address");

    let secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .or_else(|| std::env::var("AUTHKIT_TOKEN_SECRET").ok())
        .expect("A token secret is required (--token-secret or AUTHKIT_TOKEN_SECRET)");

    let access_ttl: u64 = matches
        .get_one::<String>("access-ttl-secs")
        .unwrap()
        .parse()
        .expect("Invalid access TTL");
    let refresh_ttl: u64 = matches
        .get_one::<String>("refresh-ttl-secs")
        .unwrap()
        .parse()
        .expect("Invalid refresh TTL");
    assert!(
        access_ttl > 0 && access_ttl <= refresh_ttl,
        "Access TTL must be non-zero and no longer than the refresh TTL"
    );

    let prune_interval: u64 = matches
        .get_one::<String>("prune-interval-secs")
        .unwrap()
        .parse()
        .expect("Invalid prune interval");

    info!("Starting authkit server");
    info!("Bind address: {}", bind_addr);
    info!(
        "Token lifetimes: access {}s, refresh {}s",
        access_ttl, refresh_ttl
    );

    let users = Arc::new(MemoryCredentialStore::new());

    if let Some(seed) = matches.get_one::<String>("seed-admin") {
        let (login, password) = seed
            .split_once(':')
            .expect("--seed-admin expects LOGIN:PASSWORD");
        users
            .create("Admin", "Admin", login, password, Role::Admin)
            .map_err(|e| format!("Failed to seed admin account: {}", e))?
            .expect("seed admin login already taken");
        info!("Seeded admin account '{}'", login);
    }

    let codec = TokenCodec::from_secret(secret.as_bytes());
    let revocations = Arc::new(RevocationRegistry::new());
    let config = TokenConfig {
        access_ttl: Duration::from_secs(access_ttl),
        refresh_ttl: Duration::from_secs(refresh_ttl),
    };

    let issuer = TokenIssuer::new(
        Arc::clone(&users) as Arc<dyn CredentialStore>,
        codec.clone(),
        Arc::clone(&revocations),
        config,
    )
    .map_err(|e| format!("Failed to initialize token issuer: {}", e))?;
    let verifier = TokenVerifier::new(codec, Arc::clone(&revocations));

    // The revocation registry only grows between prunes; run the sweep as a
    // long-lived background task.
    spawn_pruner(Arc::clone(&revocations), Duration::from_secs(prune_interval));

    let state = Arc::new(AppState {
        issuer,
        verifier,
        users,
        revocations,
    });

    let server = AuthServer::new(state);

    match server.serve(bind_addr).await {
        Ok(_) => info!("Server shutdown gracefully"),
        Err(e) => {
            warn!("Server error: {}", e);
            return Err(e);
        }
    }

    Ok(())
}

fn spawn_pruner(revocations: Arc<RevocationRegistry>, period: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let removed = revocations.prune(authkit_core::codec::now_unix());
            if removed > 0 {
                debug!("Pruned {} expired revocation entries", removed);
            }
        }
    });
}
