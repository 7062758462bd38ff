use crate::{
    api,
    backend::{
        DocumentStore, IdentityProvider, IdentityToolkitProvider, MemoryDocumentStore,
        MemoryIdentityProvider, PgDocumentStore,
    },
    cli::{
        commands::backend::{Backend, redact_dsn},
        telemetry,
    },
    gateway::AccountGateway,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub allowed_origin: String,
    pub backend: Backend,
    pub users_collection: String,
}

/// Execute the server action.
/// # Errors
/// Returns an error if a backend cannot be initialized or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let (identity, store) = connect_backends(&args.backend).await?;

    let gateway = Arc::new(
        AccountGateway::new(identity, store).with_collection(args.users_collection),
    );

    let result = api::new(args.port, &args.allowed_origin, gateway, shutdown_signal()).await;

    telemetry::shutdown_tracer();

    result
}

/// Build the clients once; the gateway receives them by reference counting.
async fn connect_backends(
    backend: &Backend,
) -> Result<(Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>)> {
    match backend {
        Backend::Managed {
            dsn,
            identity_url,
            identity_api_key,
        } => {
            let identity = IdentityToolkitProvider::new(identity_url, identity_api_key.clone())?;
            let store = PgDocumentStore::connect(dsn).await?;

            Ok((Arc::new(identity), Arc::new(store)))
        }
        Backend::Memory => {
            warn!("Using in-memory backend, accounts are lost on restart");

            Ok((
                Arc::new(MemoryIdentityProvider::new()),
                Arc::new(MemoryDocumentStore::new()),
            ))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C"),
        () = terminate => info!("Received SIGTERM"),
    }
}

fn log_startup_args(args: &Args) {
    let mut entries = vec![
        ("listen", format!("tcp:{}", args.port)),
        ("allowed_origin", args.allowed_origin.clone()),
        ("users_collection", args.users_collection.clone()),
    ];

    match &args.backend {
        Backend::Managed {
            dsn, identity_url, ..
        } => {
            entries.push(("backend", "managed".to_string()));
            entries.push(("dsn", redact_dsn(dsn)));
            entries.push(("identity_url", identity_url.clone()));
            entries.push(("identity_api_key_set", "true".to_string()));
        }
        Backend::Memory => entries.push(("backend", "memory".to_string())),
    }

    log_entries("Startup configuration", &entries);
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!("{}\n\n{title}:", banner());
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn banner() -> String {
    BANNER.replace(
        "{VERSION}",
        &format!(
            " - {} - {}",
            env!("CARGO_PKG_VERSION"),
            short_commit(crate::GIT_COMMIT_HASH)
        ),
    )
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}

const BANNER: &str = r"
   _______
  |   |   |
  |   |   |  E N I R E J O {VERSION}
  |  o|o  |
  |___|___|";
