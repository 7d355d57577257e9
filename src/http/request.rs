use std::io::{self, BufRead, Read};

/// Longest request or header line accepted, in bytes.
pub const MAX_LINE: u64 = 8 * 1024;
/// Largest request body the server will read.
pub const MAX_BODY: usize = 64 * 1024;
const MAX_HEADERS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("failed to read request: {0}")]
    Io(#[from] io::Error),
    #[error("invalid Content-Length: {0}")]
    InvalidContentLength(String),
    #[error("request body of {0} bytes exceeds the {MAX_BODY} byte limit")]
    BodyTooLarge(usize),
}

/// One inbound request. The request line and header block are read up front;
/// the body is read on demand.
#[derive(Debug)]
pub struct Request<R> {
    pub method: String,
    pub path: String,
    content_length: Option<String>,
    body_read: bool,
    reader: R,
}

/// Read one line, capped at `MAX_LINE`, with the trailing CR/LF removed.
/// `Ok(None)` means the peer closed before sending anything.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader.by_ref().take(MAX_LINE).read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    String::from_utf8(buf)
        .map(Some)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

impl<R: BufRead> Request<R> {
    /// Parse the request line (`METHOD SP PATH ...`) and the header block.
    ///
    /// Returns `Ok(None)` for an empty or malformed request line; the caller
    /// closes the connection without a response.
    pub fn read(mut reader: R) -> io::Result<Option<Self>> {
        let Some(line) = read_line(&mut reader)? else {
            return Ok(None);
        };
        let mut tokens = line.split(' ');
        let (Some(method), Some(path)) = (tokens.next(), tokens.next()) else {
            return Ok(None);
        };
        if method.is_empty() || path.is_empty() {
            return Ok(None);
        }
        let (method, path) = (method.to_string(), path.to_string());

        let mut content_length = None;
        for _ in 0..MAX_HEADERS {
            let Some(header) = read_line(&mut reader)? else {
                break;
            };
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':') {
                if name.trim().eq_ignore_ascii_case("content-length") {
                    content_length = Some(value.trim().to_string());
                }
            }
        }

        Ok(Some(Request {
            method,
            path,
            content_length,
            body_read: false,
            reader,
        }))
    }

    /// Declared body length; absent means zero.
    pub fn content_length(&self) -> Result<usize, RequestError> {
        match &self.content_length {
            None => Ok(0),
            Some(raw) => raw
                .parse()
                .map_err(|_| RequestError::InvalidContentLength(raw.clone())),
        }
    }

    /// Read exactly `Content-Length` bytes. Only the first call reads.
    pub fn body(&mut self) -> Result<Vec<u8>, RequestError> {
        if self.body_read {
            return Ok(Vec::new());
        }
        let len = self.content_length()?;
        if len > MAX_BODY {
            return Err(RequestError::BodyTooLarge(len));
        }
        self.body_read = true;
        let mut body = vec![0u8; len];
        self.reader.read_exact(&mut body)?;
        Ok(body)
    }

    /// Consume a body nobody asked for, so closing the socket does not reset
    /// the connection before the client has read the response.
    pub fn discard_body(&mut self) {
        if self.body_read {
            return;
        }
        self.body_read = true;
        let len = match self.content_length() {
            Ok(n) if n <= MAX_BODY => n as u64,
            _ => return,
        };
        let _ = io::copy(&mut self.reader.by_ref().take(len), &mut io::sink());
    }
}
