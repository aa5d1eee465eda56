//! Web server command.

use std::net::{SocketAddr, ToSocketAddrs};

use crate::cli::icons;
use crate::config::Settings;
use crate::server::{self, AppState};

const DEFAULT_PORT: u16 = 5001;

/// Start the web server.
pub async fn cmd_serve(mut settings: Settings, bind: Option<String>) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        settings.bind = bind;
    }
    let addr = parse_bind_address(&settings.bind)?;
    let generator = super::gemini_client(&settings)?;

    println!(
        "{} Starting papersum server at http://{}",
        icons::info(),
        addr
    );
    println!("  Candidate models: {}", settings.llm.models.join(", "));
    println!("  Uploads: {}", settings.upload_dir.display());
    println!("  Press Ctrl+C to stop");

    let state = AppState::new(settings, generator);
    server::serve(state, addr).await
}

/// Parse a bind address that can be:
/// - Just a port: "5001" -> 127.0.0.1:5001
/// - Just a host: "0.0.0.0" -> 0.0.0.0:5001
/// - Host and port: "0.0.0.0:5001" -> 0.0.0.0:5001
fn parse_bind_address(bind: &str) -> anyhow::Result<SocketAddr> {
    let bind = bind.trim();

    let (host, port) = if let Ok(port) = bind.parse::<u16>() {
        ("127.0.0.1", port)
    } else {
        match bind.rsplit_once(':') {
            Some((host, port_str)) if !host.ends_with(':') => match port_str.parse::<u16>() {
                Ok(port) => (host, port),
                Err(_) => anyhow::bail!("Invalid port in bind address: {}", bind),
            },
            _ => (bind, DEFAULT_PORT),
        }
    };

    let host = host.trim_start_matches('[').trim_end_matches(']');
    (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("Bind address resolved to nothing: {}", bind))
}
