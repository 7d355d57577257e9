use std::sync::Arc;

use clap::Parser;

use packserve::cli;
use packserve::config::{self, ConfigStore, RuntimeConfig};
use packserve::service::{Host, PackOffer, PackService, ServiceOptions};

/// Host used when running standalone: no connected clients, offers are logged.
struct StandaloneHost {
    bind_address: Option<String>,
}

impl Host for StandaloneHost {
    fn bind_address(&self) -> Option<String> {
        self.bind_address.clone()
    }

    fn recipients(&self) -> Vec<String> {
        Vec::new()
    }

    fn push_pack(&self, recipient: &str, offer: &PackOffer) {
        tracing::info!(
            "offer {} -> {} (sha1 {})",
            offer.url,
            recipient,
            hex::encode(offer.hash)
        );
    }

    fn send_message(&self, recipient: &str, text: &str) {
        tracing::info!("message to {}: {}", recipient, text);
    }
}

/// Wait for Ctrl+C. SIGHUP reloads the config and packs in the meantime.
async fn wait_for_shutdown(service: &PackService) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!("Could not install SIGHUP handler: {}", e);
                None
            }
        };
        loop {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    if let Err(e) = res {
                        tracing::error!("Failed to listen for Ctrl+C: {}", e);
                    }
                    return;
                }
                Some(_) = async {
                    match hangup.as_mut() {
                        Some(h) => h.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    tracing::info!("SIGHUP received, reloading");
                    if let Err(e) = service.on_reload_requested() {
                        tracing::error!("Reload failed: {}", e);
                    }
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = service;
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let config_path = config::find_config_file(args.config.as_deref());
    let store = match ConfigStore::open(&config_path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("error: {}: {}", config_path.display(), e);
            std::process::exit(1);
        }
    };
    let runtime = RuntimeConfig::resolve(&store.snapshot(), &args);

    let host = Arc::new(StandaloneHost {
        bind_address: runtime.host_address.clone(),
    });
    let options = ServiceOptions {
        port: Some(runtime.port),
        workers: runtime.workers,
    };
    let service = PackService::start(store, runtime.pack_dir, host, options);
    if let Some(offer) = service.primary_asset() {
        tracing::info!("Primary pack: {} (sha1 {})", offer.url, hex::encode(offer.hash));
    }

    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start signal runtime: {}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async move {
        wait_for_shutdown(&service).await;
        tracing::info!("Shutting down...");

        // A second Ctrl+C while connections drain forces the exit.
        let stopping = tokio::task::spawn_blocking(move || {
            let mut service = service;
            service.stop();
        });
        tokio::select! {
            _ = stopping => {}
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\npackserve: forced exit");
                std::process::exit(1);
            }
        }
        tracing::info!("Goodbye.");
    });
}
