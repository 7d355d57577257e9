use serde::Serialize;
use std::fs::File;
use std::io::{self, Read, Write};

pub enum Body {
    Bytes(Vec<u8>),
    /// Streamed from disk; exactly `len` bytes are sent.
    File { file: File, len: u64 },
}

impl Body {
    pub fn len(&self) -> u64 {
        match self {
            Body::Bytes(b) => b.len() as u64,
            Body::File { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A complete response. `Content-Length` is always derived from the body and
/// the connection is always closed after it is written.
pub struct Response {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Body,
}

pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[derive(Serialize)]
struct ApiReply<'a> {
    success: bool,
    message: &'a str,
}

impl Response {
    pub fn new(status: u16, body: Body) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn text(status: u16, message: &str) -> Self {
        Response::new(status, Body::Bytes(message.as_bytes().to_vec()))
            .header("Content-Type", "text/plain")
    }

    pub fn html(status: u16, html: String) -> Self {
        Response::new(status, Body::Bytes(html.into_bytes()))
            .header("Content-Type", "text/html; charset=UTF-8")
            .header("Cache-Control", "no-cache")
    }

    /// `{"success": .., "message": ..}` as used by every control API reply.
    pub fn api(status: u16, success: bool, message: &str) -> Self {
        let body = serde_json::to_vec(&ApiReply { success, message }).unwrap_or_else(|e| {
            tracing::error!("Failed to serialize API reply: {}", e);
            br#"{"success":false,"message":"internal error"}"#.to_vec()
        });
        Response::new(status, Body::Bytes(body))
            .header("Content-Type", "application/json")
            .header("Cache-Control", "no-cache")
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize status line, headers, blank line and body to `out`.
    pub fn write_to<W: Write>(self, out: &mut W) -> io::Result<()> {
        let mut head = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        head.push_str("Connection: close\r\n\r\n");
        out.write_all(head.as_bytes())?;

        match self.body {
            Body::Bytes(bytes) => out.write_all(&bytes)?,
            Body::File { file, len } => {
                let copied = io::copy(&mut file.take(len), out)?;
                if copied != len {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("file shrank while streaming: sent {} of {} bytes", copied, len),
                    ));
                }
            }
        }
        out.flush()
    }
}
