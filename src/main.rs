//!
//! atlas server binary
//! -------------------
//! Command-line entry point for the service atlas front end. Configuration comes from
//! environment variables; `--http-port` and `--bind` override them.

use std::env;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use atlas::config::AppConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn parse_string_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();

    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("atlas server\n\nUSAGE:\n  atlas [--http-port N] [--bind ADDR]\n\nOPTIONS:\n  --http-port N   HTTP port (env: ATLAS_HTTP_PORT, default 3000)\n  --bind ADDR     Listen address (env: ATLAS_BIND, default 0.0.0.0)\n\nENVIRONMENT:\n  ADMIN_EMAILS             comma-separated admin emails\n  STRAPI_INTERNAL_URL      content backend URL for server-side requests\n  NEXT_PUBLIC_STRAPI_URL   public content backend URL (default http://localhost:1337)\n  ATLAS_SESSION_TTL_SECS   session lifetime in seconds (default 3600)\n  ATLAS_SECURE_COOKIES     mark session cookies Secure (default false)\n");
        return Ok(());
    }

    // CLI arguments override environment
    let mut config = AppConfig::from_env();
    if let Some(port) = parse_port_arg(&args, "--http-port") { config.http_port = port; }
    if let Some(bind) = parse_string_arg(&args, "--bind") { config.bind = bind; }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "atlas", "atlas starting: RUST_LOG='{}', http_port={}, bind={}", rust_log, config.http_port, config.bind);

    atlas::server::run(config).await
}
