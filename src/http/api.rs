use std::io::BufRead;

use crate::config::ConfigError;
use crate::http::json::{self, ScanError};
use crate::http::request::{Request, RequestError};
use crate::http::response::Response;
use crate::http::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("request body is not valid UTF-8")]
    Utf8,
    #[error(transparent)]
    Field(#[from] ScanError),
    #[error("invalid port: {0}")]
    InvalidPort(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The four settings the web form edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub server_ip: String,
    pub http_port: u16,
    pub force_pack: bool,
    pub auto_apply: bool,
}

impl ConfigUpdate {
    /// Pull all four fields out of a JSON body. Fails on the first missing or
    /// malformed field; nothing is applied in that case.
    pub fn from_json(body: &str) -> Result<Self, ApiError> {
        let server_ip = json::scan_string(body, "server_ip")?;
        let port_text = json::scan_text(body, "http_port")?;
        let http_port = port_text
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or(ApiError::InvalidPort(port_text))?;
        let force_pack = json::scan_bool(body, "force_pack")?;
        let auto_apply = json::scan_bool(body, "auto_apply")?;
        Ok(ConfigUpdate {
            server_ip,
            http_port,
            force_pack,
            auto_apply,
        })
    }
}

/// Dispatch a request whose path starts with `/api/`.
pub fn handle<R: BufRead>(state: &AppState, req: &mut Request<R>) -> Response {
    match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/api/config") => match update_config(state, req) {
            Ok(()) => Response::api(
                200,
                true,
                "Configuration updated successfully! Restart recommended.",
            ),
            Err(e) => {
                tracing::warn!("Error updating configuration: {}", e);
                Response::api(500, false, &format!("Error updating configuration: {}", e))
            }
        },
        ("POST", "/api/reload") => match state.reload() {
            Ok(count) => {
                tracing::info!("Reloaded via control API: {} resource packs loaded", count);
                Response::api(200, true, "Plugin reloaded successfully!")
            }
            Err(e) => {
                tracing::warn!("Error reloading configuration: {}", e);
                Response::api(500, false, &format!("Error reloading plugin: {}", e))
            }
        },
        _ => Response::api(404, false, "API endpoint not found"),
    }
}

fn update_config<R: BufRead>(state: &AppState, req: &mut Request<R>) -> Result<(), ApiError> {
    let body = req.body()?;
    let body = String::from_utf8(body).map_err(|_| ApiError::Utf8)?;
    tracing::info!("Received config update: {}", body);

    let update = ConfigUpdate::from_json(&body)?;
    state.config.update(|cfg| {
        cfg.server_ip = update.server_ip;
        cfg.http_port = update.http_port;
        cfg.force_pack = update.force_pack;
        cfg.auto_apply_all_worlds = update.auto_apply;
    })?;
    Ok(())
}
