pub mod api;
pub mod assets;
pub mod json;
pub mod pool;
pub mod request;
pub mod response;
pub mod server;
pub mod state;
pub mod status_page;

use std::io::BufRead;

use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::state::AppState;

/// Route one parsed request to its handler.
///
/// Only GET and POST are served. Then, in order: the status page, the control
/// API under `/api/`, and finally archives from the pack directory.
pub fn route<R: BufRead>(state: &AppState, req: &mut Request<R>) -> Response {
    if req.method != "GET" && req.method != "POST" {
        return Response::text(405, "Method Not Allowed");
    }
    let path = req.path.clone();
    if matches!(path.as_str(), "/" | "/index" | "/index.html") {
        status_page::serve(state)
    } else if path.starts_with("/api/") {
        api::handle(state, req)
    } else {
        assets::serve_archive(state, &path)
    }
}
