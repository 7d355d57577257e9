use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, BufReader, BufWriter, Read};
use std::net::{Ipv4Addr, Shutdown, SocketAddr, SocketAddrV4, TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::http::pool::WorkerPool;
use crate::http::request::Request;
use crate::http::route;
use crate::http::state::AppState;

/// Read/write timeout per connection; a stalled client holds a worker at most this long.
pub const IO_TIMEOUT: Duration = Duration::from_secs(30);
const BACKLOG: i32 = 50;
const QUEUE_BOUND: usize = 64;
/// How long, and how much, a closing connection keeps reading whatever the
/// client is still sending after the response went out.
const LINGER_TIMEOUT: Duration = Duration::from_secs(5);
const LINGER_LIMIT: u64 = 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind 0.0.0.0:{port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start HTTP threads: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Bind a listener on the wildcard address. Port 0 picks a free port.
pub fn bind_listener(port: u16) -> Result<TcpListener, ServerError> {
    let bind = |port: u16| -> std::io::Result<TcpListener> {
        let addr: SocketAddr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port).into();
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(BACKLOG)?;
        Ok(socket.into())
    };
    bind(port).map_err(|source| ServerError::Bind { port, source })
}

/// Single-listener HTTP server: one accept thread feeding a worker pool.
pub struct HttpServer {
    state: AppState,
    port: u16,
    accept_thread: Option<JoinHandle<()>>,
}

impl HttpServer {
    /// Start accepting on `listener`. The caller has already marked the
    /// server state as running.
    pub fn start(listener: TcpListener, state: AppState, workers: usize) -> Result<Self, ServerError> {
        let port = listener.local_addr()?.port();
        let pool = WorkerPool::new(workers, QUEUE_BOUND)?;
        let loop_state = state.clone();
        let accept_thread = std::thread::Builder::new()
            .name("packserve-accept".to_string())
            .spawn(move || accept_loop(listener, pool, loop_state))?;
        tracing::info!("HTTP server started on 0.0.0.0:{} with {} workers", port, workers);
        Ok(HttpServer {
            state,
            port,
            accept_thread: Some(accept_thread),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Flip the running flag, wake the accept loop so it exits and drops the
    /// listener, and wait for it. Connections already handed to workers finish.
    pub fn stop(&mut self) {
        let Some(handle) = self.accept_thread.take() else {
            return;
        };
        self.state.server.set_running(false);
        // accept() is blocking; a throwaway connection lets the loop see the flag.
        let wake = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let _ = TcpStream::connect_timeout(&wake, Duration::from_secs(1));
        if handle.join().is_err() {
            tracing::error!("HTTP accept thread panicked");
        }
        tracing::info!("HTTP server stopped.");
    }
}

impl Drop for HttpServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(listener: TcpListener, mut pool: WorkerPool, state: AppState) {
    for conn in listener.incoming() {
        if !state.server.is_running() {
            break;
        }
        match conn {
            Ok(stream) => {
                let conn_state = state.clone();
                if pool.execute(move || handle_connection(stream, &conn_state)).is_err() {
                    break;
                }
            }
            Err(e) => {
                if state.server.is_running() {
                    tracing::warn!("Error accepting HTTP connection: {}", e);
                } else {
                    break;
                }
            }
        }
    }
    pool.shutdown();
    tracing::debug!("accept loop exited");
}

/// Serve exactly one request on `stream`, then close it.
pub fn handle_connection(stream: TcpStream, state: &AppState) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    if let Err(e) = serve_stream(&stream, state) {
        tracing::warn!("Error handling HTTP request from {}: {}", peer, e);
    }
    linger_close(&stream);
}

/// Half-close, then drain unread request bytes so the final close does not
/// reset the connection before the client has read the response.
fn linger_close(stream: &TcpStream) {
    if stream.shutdown(Shutdown::Write).is_err() {
        return;
    }
    let _ = stream.set_read_timeout(Some(LINGER_TIMEOUT));
    let _ = io::copy(&mut Read::take(stream, LINGER_LIMIT), &mut io::sink());
}

fn serve_stream(stream: &TcpStream, state: &AppState) -> std::io::Result<()> {
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;

    let Some(mut req) = Request::read(BufReader::new(stream))? else {
        return Ok(());
    };
    tracing::debug!("{} {}", req.method, req.path);

    let response = route(state, &mut req);
    req.discard_body();

    let mut out = BufWriter::new(stream);
    response.write_to(&mut out)
}
