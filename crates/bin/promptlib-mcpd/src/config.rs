use clap::{Parser, builder::BoolishValueParser};
use reqwest::Url;
use std::error::Error;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:4020";
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "promptlib-mcpd", version, about = "Prompt library MCP daemon.")]
struct CliArgs {
    /// Listing endpoint of the prompt storage API.
    #[arg(long, env = "PROMPTLIB_API_URL")]
    api_url: Option<String>,

    #[arg(
        long,
        env = "PROMPTLIB_CACHE_TTL_SECS",
        default_value_t = DEFAULT_CACHE_TTL_SECS
    )]
    cache_ttl_secs: u64,

    #[arg(
        long,
        env = "PROMPTLIB_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(
        long = "stdio",
        env = "PROMPTLIB_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(
        long,
        env = "PROMPTLIB_MCP_SERVE",
        default_value_t = true,
        value_parser = BoolishValueParser::new()
    )]
    mcp_serve: bool,

    #[arg(long, env = "PROMPTLIB_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(long, env = "PROMPTLIB_LOG", default_value = DEFAULT_LOG_FILTER)]
    log_filter: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct PromptLibConfig {
    pub api_url: Url,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub enable_stdio: bool,
    pub mcp_serve: bool,
    pub mcp_http_addr: SocketAddr,
    pub log_filter: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingSetting(&'static str),
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSetting(name) => write!(f, "missing required setting: {name}"),
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl PromptLibConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

impl TryFrom<CliArgs> for PromptLibConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let api_url = args
            .api_url
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingSetting("PROMPTLIB_API_URL"))?;
        let api_url = match Url::parse(api_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                return Err(ConfigError::InvalidSetting {
                    name: "PROMPTLIB_API_URL",
                    value: api_url,
                });
            }
        };

        if args.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PROMPTLIB_REQUEST_TIMEOUT_SECS",
                value: args.request_timeout_secs.to_string(),
            });
        }

        if !args.enable_stdio && !args.mcp_serve {
            return Err(ConfigError::InvalidSetting {
                name: "PROMPTLIB_MCP_SERVE",
                value: "false with stdio disabled; no transport to serve".to_string(),
            });
        }

        let log_filter = if args.log_filter.trim().is_empty() {
            DEFAULT_LOG_FILTER.to_string()
        } else {
            args.log_filter
        };

        Ok(Self {
            api_url,
            cache_ttl: Duration::from_secs(args.cache_ttl_secs),
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            enable_stdio: args.enable_stdio,
            mcp_serve: args.mcp_serve,
            mcp_http_addr: args.mcp_http_addr,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> CliArgs {
        CliArgs {
            api_url: Some("http://catalog.test/prompt-storage/files".to_string()),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            enable_stdio: false,
            mcp_serve: true,
            mcp_http_addr: DEFAULT_MCP_HTTP_ADDR.parse().expect("valid MCP addr"),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    #[test]
    fn defaults_parse() {
        let config = PromptLibConfig::try_from(base_args()).expect("config should parse");

        assert_eq!(config.api_url.path(), "/prompt-storage/files");
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn api_url_is_required() {
        let mut args = base_args();
        args.api_url = Some("  ".to_string());

        let err = PromptLibConfig::try_from(args).expect_err("missing url");

        assert!(matches!(err, ConfigError::MissingSetting("PROMPTLIB_API_URL")));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let mut args = base_args();
        args.api_url = Some("ftp://catalog.test/files".to_string());

        let err = PromptLibConfig::try_from(args).expect_err("ftp url");

        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                name: "PROMPTLIB_API_URL",
                ..
            }
        ));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut args = base_args();
        args.request_timeout_secs = 0;

        assert!(PromptLibConfig::try_from(args).is_err());
    }

    #[test]
    fn zero_ttl_is_allowed() {
        let mut args = base_args();
        args.cache_ttl_secs = 0;

        let config = PromptLibConfig::try_from(args).expect("zero ttl");

        assert_eq!(config.cache_ttl, Duration::ZERO);
    }

    #[test]
    fn some_transport_must_be_enabled() {
        let mut args = base_args();
        args.mcp_serve = false;

        assert!(PromptLibConfig::try_from(args).is_err());
    }
}
