//! Command Line Interface (CLI) arguments.

use clap::Parser;
use url::Url;

/// Episerve command line interface
#[derive(Clone, Debug, Parser)]
pub struct CommandLineArgs {
    /// The IP address on which the service should listen
    #[arg(long, default_value = "0.0.0.0", env = "EPISERVE_HOST")]
    pub host: String,
    /// The port to which the service should bind
    #[arg(long, default_value_t = 5000, env = "EPISERVE_PORT")]
    pub port: u16,
    /// Flag indicating whether HTTPS should be used
    #[arg(long, default_value_t = false, env = "EPISERVE_HTTPS")]
    pub https: bool,
    /// Path to the certificate file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/episerve/certs/cert.pem",
        env = "EPISERVE_CERT_FILE"
    )]
    pub cert_file: String,
    /// Path to the key file to be used for HTTPS encryption
    #[arg(
        long,
        default_value = "~/.config/episerve/certs/key.pem",
        env = "EPISERVE_KEY_FILE"
    )]
    pub key_file: String,
    /// Maximum time in seconds to wait for operations to complete upon receiving `ctrl+c` signal.
    #[arg(long, default_value_t = 60, env = "EPISERVE_SHUTDOWN_TIMEOUT")]
    pub graceful_shutdown_timeout: u64,
    /// Base URL of the warehouse HTTP SQL API
    #[arg(
        long,
        default_value = "http://localhost:8000/",
        env = "EPISERVE_WAREHOUSE_URL"
    )]
    pub warehouse_url: Url,
    /// User name for the warehouse session
    #[arg(long, default_value = "dashboard", env = "EPISERVE_WAREHOUSE_USER")]
    pub warehouse_user: String,
    /// Password for the warehouse session
    #[arg(
        long,
        default_value = "",
        env = "EPISERVE_WAREHOUSE_PASSWORD",
        hide_env_values = true
    )]
    pub warehouse_password: String,
    /// Name of the (virtual) warehouse that executes queries
    #[arg(
        long,
        default_value = "DATA_APPS_DEMO",
        env = "EPISERVE_WAREHOUSE_NAME"
    )]
    pub warehouse_name: String,
    /// Warehouse database holding the epidemiological tables
    #[arg(
        long,
        default_value = "COVID19_EPIDEMIOLOGICAL_DATA",
        env = "EPISERVE_WAREHOUSE_DATABASE"
    )]
    pub warehouse_database: String,
    /// Warehouse schema holding the epidemiological tables
    #[arg(long, default_value = "PUBLIC", env = "EPISERVE_WAREHOUSE_SCHEMA")]
    pub warehouse_schema: String,
    /// Base URL of the document store HTTP API
    #[arg(
        long,
        default_value = "http://localhost:5984/",
        env = "EPISERVE_DOCUMENT_STORE_URL"
    )]
    pub document_store_url: Url,
    /// Document store database holding supplementary dashboard data
    #[arg(
        long,
        default_value = "covid19_supplementary",
        env = "EPISERVE_DOCUMENT_DATABASE"
    )]
    pub document_database: String,
    /// Document store collection holding user comments
    #[arg(
        long,
        default_value = "user_comments",
        env = "EPISERVE_COMMENT_COLLECTION"
    )]
    pub comment_collection: String,
    /// Time in seconds for which cached query responses remain valid
    #[arg(long, default_value_t = 300, env = "EPISERVE_CACHE_TTL")]
    pub cache_ttl: u64,
}

/// Returns parsed command line arguments.
pub fn parse() -> CommandLineArgs {
    CommandLineArgs::parse()
}
