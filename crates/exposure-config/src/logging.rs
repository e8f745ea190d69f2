// ============================================================================
// Logging Configuration
// ============================================================================

use anyhow::Result;

use crate::Lookup;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid LOG_FORMAT: {}. Must be 'pretty' or 'json'", s),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive passed to the tracing EnvFilter
    pub rust_log: String,
    pub format: LogFormat,
}

impl LoggingConfig {
    pub(crate) fn from_lookup(env: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            rust_log: env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            format: match env("LOG_FORMAT") {
                Some(format) => format.parse()?,
                None => LogFormat::Pretty,
            },
        })
    }
}
