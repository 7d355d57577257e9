//! Host-facing side of the server.
//!
//! The embedding host (a game server, or the standalone binary) implements
//! [`Host`] and drives a [`PackService`]: it asks for the current pack offer,
//! forwards join/world-change events, and requests reloads. Nothing here knows
//! about the host's own types; recipients are opaque ids.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::assets::store;
use crate::config::{ConfigError, ConfigStore};
use crate::http::server::{bind_listener, HttpServer};
use crate::http::state::{AppState, ServerState};
use crate::net::resolver::{base_url, AddressResolver};

/// What the core needs from the embedding host.
pub trait Host: Send + Sync {
    /// Bind address from the host's own settings, if it has one.
    fn bind_address(&self) -> Option<String>;
    /// Ids of everyone currently connected.
    fn recipients(&self) -> Vec<String>;
    /// Ask a recipient's client to download and apply a pack.
    fn push_pack(&self, recipient: &str, offer: &PackOffer);
    fn send_message(&self, recipient: &str, text: &str);
}

/// The pack handed to clients: where to fetch it and what it must hash to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOffer {
    pub name: String,
    pub url: String,
    pub hash: [u8; 20],
    /// Client may not decline.
    pub required: bool,
}

/// Summary for the host's "info" command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub running: bool,
    pub base_url: String,
    pub loaded: usize,
    pub force_pack: bool,
    pub auto_apply: bool,
    pub pack_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Overrides `http_port` from the config when set.
    pub port: Option<u16>,
    pub workers: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        ServiceOptions {
            port: None,
            workers: crate::config::DEFAULT_WORKERS,
        }
    }
}

pub struct PackService {
    state: AppState,
    host: Arc<dyn Host>,
    http: Option<HttpServer>,
}

impl PackService {
    /// Resolve the advertised address, bind and start the HTTP server, and load
    /// the configured packs.
    pub fn start(
        config: Arc<ConfigStore>,
        pack_dir: PathBuf,
        host: Arc<dyn Host>,
        options: ServiceOptions,
    ) -> Self {
        let resolver = AddressResolver::system(host.bind_address());
        Self::start_with_resolver(config, pack_dir, host, options, &resolver)
    }

    pub fn start_with_resolver(
        config: Arc<ConfigStore>,
        pack_dir: PathBuf,
        host: Arc<dyn Host>,
        options: ServiceOptions,
        resolver: &AddressResolver,
    ) -> Self {
        if let Err(e) = store::ensure_pack_dir(&pack_dir) {
            tracing::warn!("Could not create pack folder {}: {}", pack_dir.display(), e);
        }

        let snapshot = config.snapshot();
        let port = options.port.unwrap_or(snapshot.http_port);
        let advertised = resolver.resolve(snapshot.configured_address());

        let (server, http) = match bind_listener(port) {
            Ok(listener) => {
                let bound = listener.local_addr().map(|a| a.port()).unwrap_or(port);
                let server = Arc::new(ServerState::new(true, bound, base_url(&advertised, bound)));
                (server, Some(listener))
            }
            Err(e) => {
                tracing::error!("Failed to start HTTP server: {}", e);
                tracing::error!("Resource packs will NOT work without the HTTP server!");
                let fallback = file_url(&pack_dir);
                tracing::warn!("Using file:// URLs as fallback: {}", fallback);
                (Arc::new(ServerState::new(false, port, fallback)), None)
            }
        };

        let state = AppState::new(config, server, pack_dir);
        state.rebuild_assets();

        let http = http.and_then(|listener| {
            match HttpServer::start(listener, state.clone(), options.workers) {
                Ok(h) => Some(h),
                Err(e) => {
                    tracing::error!("{}", e);
                    state.server.set_running(false);
                    None
                }
            }
        });

        tracing::info!("Pack folder location: {}", state.pack_dir().display());
        tracing::info!("HTTP server running on: {}", state.server.base_url());
        PackService { state, host, http }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn base_url(&self) -> &str {
        self.state.server.base_url()
    }

    /// The first loaded pack, as offered to clients.
    pub fn primary_asset(&self) -> Option<PackOffer> {
        let required = self.state.config.snapshot().force_pack;
        let assets = self.state.server.assets();
        assets.primary().map(|a| PackOffer {
            name: a.name.clone(),
            url: a.download_url.clone(),
            hash: a.content_hash,
            required,
        })
    }

    /// Offer the primary pack to one recipient. Forced offers skip the prompt.
    pub fn apply_to(&self, recipient: &str) {
        let Some(offer) = self.primary_asset() else {
            tracing::info!("No resource packs configured for: {}", recipient);
            return;
        };
        if !offer.required {
            let prompt = self.state.config.snapshot().message("pack_prompt");
            if !prompt.is_empty() {
                self.host.send_message(recipient, &prompt);
            }
        }
        self.host.push_pack(recipient, &offer);
        tracing::info!(
            "{} resource pack '{}' to {} ({})",
            if offer.required { "Forced" } else { "Offered" },
            offer.name,
            recipient,
            offer.url
        );
    }

    /// Offer the primary pack to everyone connected. Returns how many were asked.
    pub fn apply_to_all(&self) -> usize {
        let recipients = self.host.recipients();
        for r in &recipients {
            self.apply_to(r);
        }
        recipients.len()
    }

    /// Returns whether an offer was made.
    pub fn on_recipient_joined(&self, recipient: &str) -> bool {
        self.apply_if_auto(recipient)
    }

    pub fn on_world_changed(&self, recipient: &str) -> bool {
        self.apply_if_auto(recipient)
    }

    fn apply_if_auto(&self, recipient: &str) -> bool {
        if !self.state.config.snapshot().auto_apply_all_worlds {
            return false;
        }
        self.apply_to(recipient);
        true
    }

    /// The host changed the in-memory config; rebuild from it.
    pub fn on_config_changed(&self) -> usize {
        self.state.rebuild_assets()
    }

    /// Re-read the config file and rebuild, as `POST /api/reload` does.
    pub fn on_reload_requested(&self) -> Result<usize, ConfigError> {
        let count = self.state.reload()?;
        tracing::info!("Configuration reloaded: {} resource packs loaded", count);
        Ok(count)
    }

    pub fn info(&self) -> ServiceInfo {
        let config = self.state.config.snapshot();
        ServiceInfo {
            running: self.state.server.is_running(),
            base_url: self.state.server.base_url().to_string(),
            loaded: self.state.server.assets().len(),
            force_pack: config.force_pack,
            auto_apply: config.auto_apply_all_worlds,
            pack_dir: self.state.pack_dir().to_path_buf(),
        }
    }

    pub fn stop(&mut self) {
        self.state.server.set_running(false);
        if let Some(mut http) = self.http.take() {
            http.stop();
        }
    }
}

impl Drop for PackService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `file://` URL of the pack directory, with a trailing slash.
fn file_url(dir: &Path) -> String {
    let abs = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    let mut url = format!("file://{}", abs.display());
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}
