//! The `merchbell` binary.
//!
//! Running with no subcommand starts the gateway server. The remaining
//! commands are one-shot operator tools that run against the configured
//! store and exit.

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    merchbell_chat::SlackClient,
    merchbell_commerce::CommerceClient,
    merchbell_config::MerchbellConfig,
    merchbell_gateway::GatewayState,
    merchbell_store::{
        MetaStore, SqliteMetaStore, SqliteTenantDirectory, Tenant, TenantDirectory, TenantMeta,
    },
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "merchbell", about = "Merchbell — commerce-to-chat notification gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "MERCHBELL_CONFIG")]
    config: Option<PathBuf>,

    // Gateway arguments (used when no subcommand is provided, or with `gateway`)
    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server (default when no subcommand is provided).
    Gateway,
    /// Recreate the configured webhook subscriptions for one shop.
    RegisterWebhooks {
        /// Shop domain, e.g. acme.myshopify.com.
        #[arg(long)]
        shop: String,
    },
    /// Fetch a shop's timezone offset and money format and persist them.
    SyncShop {
        /// Shop domain, e.g. acme.myshopify.com.
        #[arg(long)]
        shop: String,
    },
    /// List the channels of a shop's connected chat workspace.
    Channels {
        /// Shop domain, e.g. acme.myshopify.com.
        #[arg(long)]
        shop: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MerchbellConfig> {
    match &cli.config {
        Some(path) => Ok(merchbell_config::load_config(path)?),
        None => Ok(merchbell_config::discover_and_load()),
    }
}

/// Open the SQLite database from config and hand back both store views
/// over one shared pool.
async fn open_stores(
    config: &MerchbellConfig,
) -> anyhow::Result<(Arc<dyn MetaStore>, Arc<dyn TenantDirectory>)> {
    let db_url = format!("sqlite:{}?mode=rwc", config.store.path);
    let pool = sqlx::SqlitePool::connect(&db_url).await?;
    merchbell_store::run_migrations(&pool).await?;
    Ok((
        Arc::new(SqliteMetaStore::with_pool(pool.clone())),
        Arc::new(SqliteTenantDirectory::with_pool(pool)),
    ))
}

async fn find_tenant(tenants: &dyn TenantDirectory, shop: &str) -> anyhow::Result<Tenant> {
    tenants
        .find_by_domain(shop)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no tenant installed for shop {shop}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "merchbell starting");

    let config = load_config(&cli)?;

    match cli.command {
        // Default: start the gateway when no subcommand is provided
        None | Some(Commands::Gateway) => {
            // CLI args override config values
            let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
            let port = cli.port.unwrap_or(config.server.port);

            let (store, tenants) = open_stores(&config).await?;
            let chat = Arc::new(SlackClient::with_base_url(&config.chat.base_url)?);
            let commerce = Arc::new(CommerceClient::new(&config.commerce.api_version)?);

            let state = GatewayState::new(store, tenants, chat, commerce, &config);
            merchbell_gateway::start(&bind, port, state).await?;
            Ok(())
        },
        Some(Commands::RegisterWebhooks { shop }) => register_webhooks(&config, &shop).await,
        Some(Commands::SyncShop { shop }) => sync_shop(&config, &shop).await,
        Some(Commands::Channels { shop }) => list_channels(&config, &shop).await,
    }
}

/// Full-replace the webhook subscriptions for one shop: every configured
/// topic is dropped and recreated against the public listen endpoint.
async fn register_webhooks(config: &MerchbellConfig, shop: &str) -> anyhow::Result<()> {
    let Some(public_url) = config.server.public_url.as_deref() else {
        anyhow::bail!("server.public_url must be configured to register webhooks");
    };
    let endpoint = format!("{}/webhooks/listen", public_url.trim_end_matches('/'));

    let (_, tenants) = open_stores(config).await?;
    let tenant = find_tenant(tenants.as_ref(), shop).await?;

    let commerce = CommerceClient::new(&config.commerce.api_version)?;
    let count = commerce
        .register_webhooks(
            &tenant.shop_domain,
            &tenant.access_token,
            &config.commerce.webhook_topics,
            &endpoint,
        )
        .await?;

    println!("Recreated {count} webhook subscription(s) for {shop} -> {endpoint}");
    Ok(())
}

/// Pull `timezoneOffset` and `moneyFormat` from the shop and persist them
/// so the scheduler and digest renderer read local copies.
async fn sync_shop(config: &MerchbellConfig, shop: &str) -> anyhow::Result<()> {
    let (store, tenants) = open_stores(config).await?;
    let tenant = find_tenant(tenants.as_ref(), shop).await?;

    let commerce = CommerceClient::new(&config.commerce.api_version)?;
    let metadata = commerce
        .shop_metadata(&tenant.shop_domain, &tenant.access_token)
        .await?;

    let meta = TenantMeta::new(store.as_ref(), &tenant.id);
    meta.set_timezone_offset(&metadata.timezone_offset).await?;
    meta.set_money_format(&metadata.money_format).await?;

    println!("Synced {shop}:");
    println!("  timezone offset: {}", metadata.timezone_offset);
    println!("  money format:    {}", metadata.money_format);
    Ok(())
}

async fn list_channels(config: &MerchbellConfig, shop: &str) -> anyhow::Result<()> {
    let (store, tenants) = open_stores(config).await?;
    let tenant = find_tenant(tenants.as_ref(), shop).await?;

    let meta = TenantMeta::new(store.as_ref(), &tenant.id);
    let Some(connection) = meta.chat_connection().await? else {
        anyhow::bail!("shop {shop} has no connected chat workspace");
    };

    let chat = SlackClient::with_base_url(&config.chat.base_url)?;
    let channels = chat.list_channels(&connection.access_token).await?;

    if channels.is_empty() {
        println!("No channels visible to the connected workspace.");
    } else {
        for channel in &channels {
            println!("  {}  #{}", channel.id, channel.name);
        }
    }
    Ok(())
}
