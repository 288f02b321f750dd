use clap::{Parser, ValueEnum};
use linkhop_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "LINKHOP_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "LINKHOP_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "LINKHOP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "LINKHOP_MYSQL_DSN";
pub const CACHE_CAPACITY_ENV: &str = "LINKHOP_CACHE_CAPACITY";
pub const CACHE_TTL_ENV: &str = "LINKHOP_CACHE_TTL_SECS";
pub const CODE_LENGTH_ENV: &str = "LINKHOP_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "LINKHOP_MAX_ATTEMPTS";
pub const STORE_TIMEOUT_ENV: &str = "LINKHOP_STORE_TIMEOUT_MS";
pub const LOG_FORMAT_ENV: &str = "LINKHOP_LOG_FORMAT";
pub const LOG_FILTER_ENV: &str = "LINKHOP_LOG_FILTER";
pub const OTLP_ENDPOINT_ENV: &str = "LINKHOP_OTLP_ENDPOINT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linkhop", about = "Short link resolution and management server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public base URL short links are served under.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Maximum number of links held in the resolution cache.
    #[arg(long, env = CACHE_CAPACITY_ENV, default_value_t = linkhop_cache::DEFAULT_MAX_CAPACITY)]
    pub cache_capacity: u64,

    /// Seconds a cached link may be served before it is reloaded.
    #[arg(
        long,
        env = CACHE_TTL_ENV,
        default_value_t = linkhop_cache::DEFAULT_TTL.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_ttl_secs: u64,

    /// Length of generated short codes (4 to 16).
    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = linkhop_allocator::RandomGenerator::DEFAULT_LENGTH)]
    pub code_length: usize,

    /// Generated codes tried per link before giving up.
    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = linkhop_allocator::DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    /// Deadline for a single store call, in milliseconds.
    #[arg(
        long,
        env = STORE_TIMEOUT_ENV,
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub store_timeout_ms: u64,

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Log filter directives, used when `RUST_LOG` is unset.
    #[arg(long, env = LOG_FILTER_ENV, default_value = "info,linkhop=debug")]
    pub log_filter: String,

    /// OTLP gRPC endpoint to export spans to.
    #[arg(long, env = OTLP_ENDPOINT_ENV)]
    pub otlp_endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let cli = CLI::try_parse_from(["linkhop"]).unwrap();

        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.store_timeout_ms, 2000);
        assert_eq!(cli.cache_ttl_secs, linkhop_cache::DEFAULT_TTL.as_secs());
    }

    #[test]
    fn zero_durations_are_rejected() {
        assert!(CLI::try_parse_from(["linkhop", "--store-timeout-ms", "0"]).is_err());
        assert!(CLI::try_parse_from(["linkhop", "--cache-ttl-secs", "0"]).is_err());
        assert!(CLI::try_parse_from(["linkhop", "--max-attempts", "0"]).is_err());
        assert!(CLI::try_parse_from(["linkhop", "--store-timeout-ms", "1"]).is_ok());
    }

    #[test]
    fn mysql_backend_requires_a_dsn() {
        assert!(CLI::try_parse_from(["linkhop", "--storage", "mysql"]).is_err());
        assert!(CLI::try_parse_from([
            "linkhop",
            "--storage",
            "mysql",
            "--mysql-dsn",
            "mysql://u:p@localhost/linkhop"
        ])
        .is_ok());
    }
}
