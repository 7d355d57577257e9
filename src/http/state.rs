use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::assets::library::AssetLibrary;
use crate::assets::store;
use crate::config::{ConfigError, ConfigStore};

/// Live server facts. One per running service.
///
/// `assets` is only ever replaced wholesale, so a handler that loads it once
/// sees a complete library for the whole request.
#[derive(Debug)]
pub struct ServerState {
    running: AtomicBool,
    bound_port: u16,
    base_url: String,
    assets: ArcSwap<AssetLibrary>,
}

impl ServerState {
    pub fn new(running: bool, bound_port: u16, base_url: impl Into<String>) -> Self {
        ServerState {
            running: AtomicBool::new(running),
            bound_port,
            base_url: base_url.into(),
            assets: ArcSwap::from_pointee(AssetLibrary::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn bound_port(&self) -> u16 {
        self.bound_port
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn assets(&self) -> Arc<AssetLibrary> {
        self.assets.load_full()
    }

    pub fn publish_assets(&self, library: AssetLibrary) {
        self.assets.store(Arc::new(library));
    }
}

/// Context handed to every request handler and to the host-facing service.
/// Arc fields make it cheap to clone into worker closures.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub server: Arc<ServerState>,
    pack_dir: Arc<PathBuf>,
    reload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: Arc<ConfigStore>, server: Arc<ServerState>, pack_dir: PathBuf) -> Self {
        AppState {
            config,
            server,
            pack_dir: Arc::new(pack_dir),
            reload_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pack_dir(&self) -> &Path {
        &self.pack_dir
    }

    /// Rebuild the asset library from the in-memory config and publish it.
    /// Returns the number of loaded assets.
    pub fn rebuild_assets(&self) -> usize {
        let _guard = self.reload_lock.lock();
        self.rebuild_locked()
    }

    /// Re-read the config file, then rebuild. A config error leaves both the
    /// config and the published library untouched.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let _guard = self.reload_lock.lock();
        self.config.reload()?;
        Ok(self.rebuild_locked())
    }

    fn rebuild_locked(&self) -> usize {
        let names = self.config.snapshot().resource_packs;
        let library = store::rebuild(&names, &self.pack_dir, self.server.base_url());
        let count = library.len();
        self.server.publish_assets(library);
        count
    }
}
