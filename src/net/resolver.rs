use crate::net::external::{ExternalIpSource, PublicIpServices};
use crate::net::interfaces::{self, InterfaceSource, SystemInterfaces};

/// Environment variables consulted for a host name, in order.
/// `REPLIT_DEV_DOMAIN` carries a host name rather than an IP; it is used as-is.
pub const ENV_HOST_VARS: &[&str] = &["REPLIT_DEV_DOMAIN", "REPL_SLUG", "HOSTNAME", "HOST_IP"];

pub const FALLBACK_HOST: &str = "localhost";
const WILDCARD: &str = "0.0.0.0";

/// Read access to environment variables.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Picks the host to advertise in download URLs.
///
/// Strategies, first hit wins: explicit config, external IP services,
/// environment, host bind address, interface scan, then `localhost`.
pub struct AddressResolver {
    external: Box<dyn ExternalIpSource>,
    env: Box<dyn EnvSource>,
    interfaces: Box<dyn InterfaceSource>,
    host_address: Option<String>,
}

impl AddressResolver {
    /// Resolver backed by the real network, process environment and interfaces.
    pub fn system(host_address: Option<String>) -> Self {
        Self::with_sources(
            Box::new(PublicIpServices::default()),
            Box::new(ProcessEnv),
            Box::new(SystemInterfaces),
            host_address,
        )
    }

    pub fn with_sources(
        external: Box<dyn ExternalIpSource>,
        env: Box<dyn EnvSource>,
        interfaces: Box<dyn InterfaceSource>,
        host_address: Option<String>,
    ) -> Self {
        AddressResolver {
            external,
            env,
            interfaces,
            host_address,
        }
    }

    /// Never fails; the worst case is `localhost`.
    pub fn resolve(&self, configured: Option<&str>) -> String {
        if let Some(addr) = configured.filter(|a| !a.is_empty() && *a != WILDCARD) {
            tracing::info!("Using manually configured server IP: {}", addr);
            return addr.to_string();
        }

        if let Some(ip) = self.external.lookup().filter(|ip| !ip.is_empty()) {
            tracing::info!("Detected external IP: {}", ip);
            return ip;
        }

        if let Some(host) = self.from_env() {
            return host;
        }

        if let Some(addr) = self
            .host_address
            .as_deref()
            .filter(|a| !a.is_empty() && *a != WILDCARD && *a != FALLBACK_HOST)
        {
            tracing::info!("Using host bind address: {}", addr);
            return addr.to_string();
        }

        if let Some(addr) = interfaces::pick_best(&self.interfaces.ipv4_addrs()) {
            tracing::info!("Auto-detected local network IP: {}", addr);
            return addr.to_string();
        }

        tracing::warn!("Could not detect external server IP! Using localhost as fallback.");
        tracing::warn!("Resource packs will NOT work for external clients!");
        tracing::warn!("Set 'server_ip' in the config file or via the web interface");
        FALLBACK_HOST.to_string()
    }

    fn from_env(&self) -> Option<String> {
        ENV_HOST_VARS.iter().find_map(|key| {
            let value = self.env.var(key)?;
            if value.is_empty() || value == FALLBACK_HOST {
                return None;
            }
            tracing::info!("Using environment variable {}: {}", key, value);
            Some(value)
        })
    }
}

/// Build the base URL download links are prefixed with.
pub fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}/", host, port)
}

/// Host part of a base URL, or "Auto" if it has no scheme.
pub fn host_of(base_url: &str) -> &str {
    match base_url.split_once("://") {
        Some((_, rest)) => rest
            .split(['/', ':'])
            .next()
            .filter(|h| !h.is_empty())
            .unwrap_or("Auto"),
        None => "Auto",
    }
}
