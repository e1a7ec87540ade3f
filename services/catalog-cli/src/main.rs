//! Nexudus catalog CLI
//!
//! Single-binary host for the tenant connection and product catalog:
//! 1. Loads TOML config and the site secret
//! 2. Wires Crypto -> TokenStore -> OAuthClient -> TokenManager
//! 3. Wires ApiClient -> ProductService over the file-backed state store
//! 4. Runs one command per invocation, printing JSON to stdout

mod config;
mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::{Cache, Clock, Secret, SettingsStore, SystemClock, TokenSlot};
use nexudus_auth::{Crypto, OAuthClient, TokenManager, TokenStore};
use nexudus_catalog::{ApiClient, ProductService, ProductType};

use crate::config::Config;
use crate::store::FileStore;

const USAGE: &str = "usage: catalog-cli [--config <path>] <command>

commands:
  connect <username>            authenticate (password from NEXUDUS_PASSWORD)
  disconnect                    clear the stored token set
  status                        print the connection status
  refresh                       rotate the stored token set
  test                          probe the tenant API with the stored token
  products [memberships|rooms]  print the catalog (--refresh bypasses cache)
  clear-cache                   drop all cached product listings";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays clean for command output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());
    let force_refresh = args.iter().any(|a| a == "--refresh");

    let mut positionals = Vec::new();
    let mut skip_next = false;
    for arg in &args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--config" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        positionals.push(arg.as_str());
    }

    let Some(command) = positionals.first().copied() else {
        anyhow::bail!("{USAGE}");
    };

    let config_path = Config::resolve_path(cli_config_path);
    info!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let site_secret = config.storage.site_secret.clone().context(
        "site secret not configured; set NEXUDUS_SITE_SECRET or storage.site_secret_file",
    )?;

    std::fs::create_dir_all(&config.storage.state_dir).with_context(|| {
        format!(
            "failed to create state dir {}",
            config.storage.state_dir.display()
        )
    })?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let file_store = FileStore::open(config.storage.state_dir.join("state.json"), clock.clone())
        .context("failed to open state file")?;
    let settings: Arc<dyn SettingsStore> = Arc::new(config.settings());
    let http = reqwest::Client::new();

    let crypto = Crypto::new(&site_secret);
    let slot: Arc<dyn TokenSlot> = file_store.clone();
    let token_store = TokenStore::new(slot, crypto);
    let oauth = OAuthClient::new(http.clone(), settings.clone(), clock);
    let manager = Arc::new(TokenManager::new(token_store, oauth));

    match command {
        "connect" => {
            let username = positionals
                .get(1)
                .copied()
                .context("connect requires a username argument")?;
            let password = std::env::var("NEXUDUS_PASSWORD")
                .context("NEXUDUS_PASSWORD is not set")
                .map(Secret::new)?;
            manager.connect(username, &password).await?;
            print_json(&manager.get_status())?;
        }
        "disconnect" => {
            manager.disconnect();
            print_json(&manager.get_status())?;
        }
        "status" => {
            print_json(&manager.get_status())?;
        }
        "refresh" => {
            manager.refresh_tokens().await?;
            print_json(&manager.get_status())?;
        }
        "test" => {
            let api = ApiClient::new(http, settings, manager);
            api.test_connection().await?;
            print_json(&serde_json::json!({"ok": true}))?;
        }
        "products" => {
            let product_type = match positionals.get(1).copied() {
                Some("memberships") => Some(ProductType::Memberships),
                Some("rooms") => Some(ProductType::Rooms),
                Some(other) => anyhow::bail!("unknown product type {other:?}\n\n{USAGE}"),
                None => None,
            };
            let api = ApiClient::new(http, settings.clone(), manager);
            let cache: Arc<dyn Cache> = file_store;
            let service = ProductService::new(api, cache, settings);
            let records = service.get_products(product_type, force_refresh).await?;
            print_json(&records)?;
        }
        "clear-cache" => {
            let api = ApiClient::new(http, settings.clone(), manager);
            let cache: Arc<dyn Cache> = file_store;
            let service = ProductService::new(api, cache, settings);
            service.clear_cache();
            print_json(&serde_json::json!({"cleared": true}))?;
        }
        other => anyhow::bail!("unknown command {other:?}\n\n{USAGE}"),
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
