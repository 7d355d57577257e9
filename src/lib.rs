//! Embedded resource-pack server: hash and serve archives over HTTP, advertise
//! a reachable download URL, and expose a small status page and control API.

pub mod assets;
pub mod cli;
pub mod config;
pub mod http;
pub mod net;
pub mod service;
