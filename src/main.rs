use anyhow::{Context, Result};
use clap::Parser;
use product_catalog_api::app::App;
use product_catalog_api::models::Config;
use std::net::SocketAddr;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "product-catalog-api")]
#[command(about = "Serve the product catalog HTTP API")]
struct CliArgs {
    /// Address to bind, overriding HOST.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on, overriding PORT.
    #[arg(long)]
    port: Option<u16>,
}

fn listen_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address '{}:{}'", host, port))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_catalog_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting product-catalog-api");

    let args = CliArgs::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let addr = listen_addr(
        args.host.as_deref().unwrap_or(&config.host),
        args.port.unwrap_or(config.port),
    )?;

    match App::new(&config).await {
        Ok(app) => match app.serve(addr).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Server failed: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::listen_addr;

    #[test]
    fn test_listen_addr_valid() {
        let addr = listen_addr("0.0.0.0", 5000).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn test_listen_addr_invalid() {
        let err = listen_addr("not a host", 5000).unwrap_err();
        assert!(err.to_string().contains("not a host"));
    }
}
