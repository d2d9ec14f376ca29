//! Log levels and the filter directives built from them

use std::fmt;
use std::str::FromStr;

use super::LoggingError;

/// Crates whose events follow the configured level; everything else
/// (hyper, r2d2, ...) stays at `warn` unless `RUST_LOG` says otherwise.
const OWN_CRATES: &[&str] = &["followgraph_core", "followgraph_api", "followgraph"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// `EnvFilter` directive: `warn` globally, this level for our crates
    pub fn filter_directive(&self) -> String {
        let global = (*self).max(LogLevel::Warn);
        let mut directive = global.as_str().to_string();
        for krate in OWN_CRATES {
            directive.push_str(&format!(",{}={}", krate, self.as_str()));
        }
        directive
    }
}

impl FromStr for LogLevel {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(LoggingError::InvalidConfiguration(format!(
                "unknown level {}",
                other
            ))),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
