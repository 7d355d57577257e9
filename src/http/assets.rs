use crate::assets::is_archive_name;
use crate::http::response::{Body, Response};
use crate::http::state::AppState;

/// File name a request path points at: the last segment, query string removed.
pub fn requested_name(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    path.rsplit('/').next().unwrap_or("")
}

fn not_found(name: &str) -> Response {
    tracing::warn!("Resource pack not found: {}", name);
    Response::text(404, &format!("File not found: {}", name))
}

/// GET /<name>.zip: stream the archive from the pack directory.
pub fn serve_archive(state: &AppState, path: &str) -> Response {
    let name = requested_name(path);
    tracing::info!("HTTP request for: {}", name);

    if !is_archive_name(name) {
        return not_found(name);
    }
    let file_path = state.pack_dir().join(name);
    if !file_path.is_file() {
        return not_found(name);
    }

    let opened = std::fs::File::open(&file_path).and_then(|f| {
        let len = f.metadata()?.len();
        Ok((f, len))
    });
    let (file, len) = match opened {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Error serving file {}: {}", file_path.display(), e);
            return Response::text(500, "Internal Server Error");
        }
    };

    tracing::info!("Serving {} ({} bytes)", name, len);
    Response::new(200, Body::File { file, len })
        .header("Content-Type", "application/zip")
        .header("Content-Disposition", format!("attachment; filename=\"{}\"", name))
        .header("Cache-Control", "no-cache")
        .header("Access-Control-Allow-Origin", "*")
}
