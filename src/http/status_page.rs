use minijinja::{context, Environment};
use serde::Serialize;
use std::sync::LazyLock;

use crate::assets::store::{format_size, list_directory};
use crate::http::response::Response;
use crate::http::state::AppState;
use crate::net::resolver::host_of;

const STATUS_TEMPLATE: &str = include_str!("templates/status.html");

/// `.html` template names get HTML auto-escaping.
static TEMPLATES: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    if let Err(e) = env.add_template("status.html", STATUS_TEMPLATE) {
        tracing::error!("Status page template is invalid: {}", e);
    }
    env
});

#[derive(Serialize)]
struct PackRow {
    name: String,
    size: String,
    loaded: bool,
}

#[derive(Serialize)]
struct FormValues {
    server_ip: String,
    http_port: u16,
    force_pack: bool,
    auto_apply: bool,
}

/// Render the status page from one snapshot of config, server and asset state.
pub fn render(state: &AppState) -> Result<String, minijinja::Error> {
    let config = state.config.snapshot();
    let server = &state.server;
    let running = server.is_running();
    let assets = server.assets();

    let packs: Vec<PackRow> = list_directory(state.pack_dir())
        .into_iter()
        .map(|p| PackRow {
            loaded: assets.contains(&p.name),
            size: format_size(p.size_bytes),
            name: p.name,
        })
        .collect();

    let form = FormValues {
        server_ip: config.server_ip,
        http_port: config.http_port,
        force_pack: config.force_pack,
        auto_apply: config.auto_apply_all_worlds,
    };

    TEMPLATES.get_template("status.html")?.render(context! {
        running,
        port => server.bound_port(),
        loaded_count => assets.len(),
        host => host_of(server.base_url()),
        packs,
        pack_dir => state.pack_dir().display().to_string(),
        config => form,
    })
}

/// GET / , /index, /index.html
pub fn serve(state: &AppState) -> Response {
    match render(state) {
        Ok(html) => Response::html(200, html),
        Err(e) => {
            tracing::error!("Failed to render status page: {}", e);
            Response::text(500, "Internal Server Error")
        }
    }
}
