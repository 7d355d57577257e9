use regex::Regex;
use std::net::Ipv4Addr;
use std::sync::LazyLock;
use std::time::Duration;

/// "What is my IP" services, queried in order.
pub const IP_SERVICES: &[&str] = &[
    "https://icanhazip.com",
    "https://ipv4.icanhazip.com",
    "https://api.ipify.org",
    "https://checkip.amazonaws.com",
    "https://ipinfo.io/ip",
];

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

static DOTTED_QUAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("dotted-quad pattern is valid")
});

/// Something that can report this machine's address as seen from the internet.
pub trait ExternalIpSource: Send + Sync {
    fn lookup(&self) -> Option<String>;
}

/// Parse the body returned by an IP echo service: first line, trimmed, must be
/// a dotted quad.
pub fn parse_ip_body(body: &str) -> Option<String> {
    let line = body.lines().next()?.trim();
    if DOTTED_QUAD.is_match(line) && line.parse::<Ipv4Addr>().is_ok() {
        Some(line.to_string())
    } else {
        None
    }
}

/// Queries `IP_SERVICES` (or a custom list) over HTTPS with short timeouts.
#[derive(Debug, Clone)]
pub struct PublicIpServices {
    endpoints: Vec<String>,
}

impl Default for PublicIpServices {
    fn default() -> Self {
        Self::new(IP_SERVICES.iter().map(|s| s.to_string()).collect())
    }
}

impl PublicIpServices {
    pub fn new(endpoints: Vec<String>) -> Self {
        PublicIpServices { endpoints }
    }

    fn client() -> reqwest::Result<reqwest::blocking::Client> {
        reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .user_agent(concat!("packserve/", env!("CARGO_PKG_VERSION")))
            .build()
    }

    fn query(client: &reqwest::blocking::Client, endpoint: &str) -> Result<String, String> {
        let response = client.get(endpoint).send().map_err(|e| e.to_string())?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(format!("status {}", response.status()));
        }
        let body = response.text().map_err(|e| e.to_string())?;
        parse_ip_body(&body).ok_or_else(|| "response is not an IPv4 address".to_string())
    }
}

impl ExternalIpSource for PublicIpServices {
    fn lookup(&self) -> Option<String> {
        let client = match Self::client() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Could not build HTTP client for IP lookup: {}", e);
                return None;
            }
        };
        for endpoint in &self.endpoints {
            match Self::query(&client, endpoint) {
                Ok(ip) => {
                    tracing::info!("Detected external IP from {}: {}", endpoint, ip);
                    return Some(ip);
                }
                Err(e) => tracing::debug!("Failed to get IP from {}: {}", endpoint, e),
            }
        }
        tracing::info!("All external IP detection services failed");
        None
    }
}
