use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "packserve",
    about = "Serve resource-pack archives over HTTP with an advertised public URL",
    long_about = None,
    version,
)]
pub struct Args {
    /// Path to TOML config file (default search: ./packserve.toml, ~/.config/packserve/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the .zip archives [default: ./pack]
    #[arg(short = 'd', long, value_name = "DIR")]
    pub pack_dir: Option<PathBuf>,

    /// HTTP port to listen on, overriding http_port from the config file
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of connection worker threads [default: 5]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Bind address reported by the embedding host, used as an address hint
    #[arg(long, value_name = "ADDR")]
    pub host_address: Option<String>,
}
