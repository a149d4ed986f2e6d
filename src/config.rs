//! Command-line and environment configuration.
//!
//! Everything is read once at start-up into an immutable [`Config`].

extern crate alloc;

use alloc::sync::Arc;
use core::net::{IpAddr, Ipv4Addr, SocketAddr};
use core::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::auth::AuthGate;
use crate::error::ConfigError;
use crate::store::LedgerStore;
use crate::store::memory::MemoryStore;
use crate::store::supabase::SupabaseStore;

/// MCP tool server for a personal spending ledger.
#[derive(Debug, Parser)]
#[command(version, about)]
pub(crate) struct Cli {
    /// Secret callers must present to `validate`.
    #[arg(long, env = "LEDGER_BEARER_TOKEN", hide_env_values = true)]
    pub(crate) bearer_token: String,

    /// Identity returned by `validate`, in `{country_code}{number}` form.
    #[arg(long, env = "LEDGER_IDENTITY")]
    pub(crate) identity: String,

    /// Currency symbol prefixed to amounts.
    #[arg(long, env = "LEDGER_CURRENCY", default_value = "₹")]
    pub(crate) currency: String,

    /// Where ledger rows are kept.
    #[arg(long, env = "LEDGER_STORE", value_enum, default_value_t = StoreKind::Supabase)]
    pub(crate) store: StoreKind,

    /// Supabase project URL.
    #[arg(long, env = "SUPABASE_URL")]
    pub(crate) supabase_url: Option<String>,

    /// Supabase API key.
    #[arg(long, env = "SUPABASE_KEY", hide_env_values = true)]
    pub(crate) supabase_key: Option<String>,

    /// Timeout for each store request, in seconds.
    #[arg(long, env = "LEDGER_STORE_TIMEOUT_SECS", default_value_t = 30)]
    pub(crate) store_timeout_secs: u64,

    /// Credit seeded into the memory store at start-up.
    #[arg(long, env = "LEDGER_OPENING_BALANCE")]
    pub(crate) opening_balance: Option<f64>,

    /// Transport to serve.
    #[command(subcommand)]
    pub(crate) transport: Transport,
}

/// Ledger backends selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StoreKind {
    /// Hosted Supabase tables.
    Supabase,
    /// In-process store, lost on exit.
    Memory,
}

/// Transports the server can run on.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub(crate) enum Transport {
    /// Serve `/mcp/list-tools` and `/mcp/call-tool` over HTTP.
    Http {
        /// Address to bind.
        #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
        host: IpAddr,
        /// Port to bind.
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,
    },
    /// Serve MCP over stdin/stdout.
    Stdio,
}

/// Store selection after validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoreConfig {
    /// Supabase project credentials.
    Supabase {
        /// Project URL.
        url: String,
        /// API key.
        key: String,
        /// Per-request timeout.
        timeout: Duration,
    },
    /// Memory store with an optional opening credit.
    Memory {
        /// Credit recorded before serving.
        opening_balance: Option<f64>,
    },
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Bearer token check.
    pub(crate) auth: AuthGate,
    /// Currency symbol.
    pub(crate) currency: String,
    /// Ledger backend.
    pub(crate) store: StoreConfig,
    /// Transport to serve.
    pub(crate) transport: Transport,
}

impl Config {
    /// Validates parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the bearer token is empty or the
    /// Supabase store is selected without URL and key.
    pub(crate) fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let auth = AuthGate::new(cli.bearer_token, cli.identity)?;
        let store = match cli.store {
            StoreKind::Supabase => StoreConfig::Supabase {
                url: cli
                    .supabase_url
                    .filter(|url| !url.is_empty())
                    .ok_or(ConfigError::MissingStoreSetting("SUPABASE_URL"))?,
                key: cli
                    .supabase_key
                    .filter(|key| !key.is_empty())
                    .ok_or(ConfigError::MissingStoreSetting("SUPABASE_KEY"))?,
                timeout: Duration::from_secs(cli.store_timeout_secs),
            },
            StoreKind::Memory => StoreConfig::Memory {
                opening_balance: cli.opening_balance,
            },
        };
        Ok(Self {
            auth,
            currency: cli.currency,
            store,
            transport: cli.transport,
        })
    }
}

impl Transport {
    /// Socket address for the HTTP transport, if selected.
    pub(crate) const fn http_addr(&self) -> Option<SocketAddr> {
        match *self {
            Self::Http { host, port } => Some(SocketAddr::new(host, port)),
            Self::Stdio => None,
        }
    }
}

impl StoreConfig {
    /// Opens the configured store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Client`] if the Supabase client cannot be built.
    pub(crate) async fn open(&self) -> Result<Arc<dyn LedgerStore>, ConfigError> {
        match self {
            Self::Supabase { url, key, timeout } => {
                tracing::info!(url = %url, "using supabase store");
                Ok(Arc::new(SupabaseStore::new(url, key.clone(), *timeout)?))
            }
            Self::Memory { opening_balance } => {
                tracing::warn!("using in-memory store; data is lost on exit");
                let store = MemoryStore::new();
                if let Some(amount) = *opening_balance {
                    store.credit(amount).await;
                }
                Ok(Arc::new(store))
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "test code uses expect for readability"
)]
mod tests {
    use core::net::{IpAddr, Ipv4Addr, SocketAddr};
    use core::time::Duration;

    use clap::Parser;

    use super::{Cli, Config, StoreConfig, StoreKind, Transport};
    use crate::error::ConfigError;
    use crate::store::{LedgerStore, Table};

    const BASE: [&str; 5] = [
        "ledger-mcp",
        "--bearer-token",
        "s3cret",
        "--identity",
        "+491234567890",
    ];

    fn parse(extra: &[&str]) -> Cli {
        Cli::try_parse_from(BASE.iter().chain(extra)).expect("arguments parse")
    }

    #[test]
    fn http_defaults() {
        let cli = parse(&[
            "--supabase-url",
            "https://x.supabase.co",
            "--supabase-key",
            "k",
            "http",
        ]);
        assert_eq!(cli.store, StoreKind::Supabase);
        assert_eq!(cli.currency, "₹");
        assert_eq!(
            cli.transport.http_addr(),
            Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 5000))
        );
        let config = Config::from_cli(cli).expect("valid config");
        assert_eq!(
            config.store,
            StoreConfig::Supabase {
                url: "https://x.supabase.co".to_owned(),
                key: "k".to_owned(),
                timeout: Duration::from_secs(30),
            }
        );
    }

    #[test]
    fn stdio_has_no_http_addr() {
        let cli = parse(&["--store", "memory", "stdio"]);
        assert_eq!(cli.transport, Transport::Stdio);
        assert_eq!(cli.transport.http_addr(), None);
    }

    #[test]
    fn custom_port() {
        let cli = parse(&["--store", "memory", "http", "--port", "8080"]);
        assert_eq!(
            cli.transport,
            Transport::Http {
                host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                port: 8080
            }
        );
    }

    /// Supabase selection built directly, so exported variables cannot leak in.
    fn supabase_cli(url: Option<&str>, key: Option<&str>) -> Cli {
        Cli {
            bearer_token: "s3cret".to_owned(),
            identity: "+491234567890".to_owned(),
            currency: "₹".to_owned(),
            store: StoreKind::Supabase,
            supabase_url: url.map(ToOwned::to_owned),
            supabase_key: key.map(ToOwned::to_owned),
            store_timeout_secs: 30,
            opening_balance: None,
            transport: Transport::Stdio,
        }
    }

    #[test]
    fn supabase_without_credentials_is_rejected() {
        assert!(matches!(
            Config::from_cli(supabase_cli(None, Some("k"))),
            Err(ConfigError::MissingStoreSetting("SUPABASE_URL"))
        ));
        assert!(matches!(
            Config::from_cli(supabase_cli(Some("https://x.supabase.co"), None)),
            Err(ConfigError::MissingStoreSetting("SUPABASE_KEY"))
        ));
        assert!(matches!(
            Config::from_cli(supabase_cli(Some(""), Some("k"))),
            Err(ConfigError::MissingStoreSetting("SUPABASE_URL"))
        ));
    }

    #[test]
    fn empty_bearer_token_is_rejected() {
        let cli = Cli::try_parse_from([
            "ledger-mcp",
            "--bearer-token",
            "",
            "--identity",
            "+1",
            "--store",
            "memory",
            "stdio",
        ])
        .expect("arguments parse");
        assert!(matches!(
            Config::from_cli(cli),
            Err(ConfigError::EmptySecret)
        ));
    }

    #[test]
    fn missing_subcommand_is_a_parse_error() {
        assert!(Cli::try_parse_from(BASE).is_err());
    }

    #[tokio::test]
    async fn memory_store_opens_with_opening_balance() {
        let cli = parse(&["--store", "memory", "--opening-balance", "250", "stdio"]);
        let config = Config::from_cli(cli).expect("valid config");
        let store = config.store.open().await.expect("store opens");
        let credits = store
            .amounts(Table::BalanceUpdates)
            .await
            .expect("credits readable");
        assert_eq!(credits.len(), 1);
    }
}
