//! Function handler configuration.
//!
//! Two switches, both off by default. They can be set in code, deserialised
//! from the host's settings (`{"logRequest": true, "logError": true}`), or
//! read from the environment:
//!
//! | Variable              | Field         |
//! |-----------------------|---------------|
//! | `FNCHAIN_LOG_REQUEST` | `log_request` |
//! | `FNCHAIN_LOG_ERROR`   | `log_error`   |
//!
//! Accepted values are `true/false`, `1/0`, `yes/no` and `on/off`, in any
//! case. An empty or unset variable leaves the switch off.

use serde::Deserialize;

use crate::error::Error;

const ENV_LOG_REQUEST: &str = "FNCHAIN_LOG_REQUEST";
const ENV_LOG_ERROR: &str = "FNCHAIN_LOG_ERROR";

/// Logging switches for [`FunctionHandler`](crate::FunctionHandler).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandlerConfig {
    /// Log the trigger arguments at `info` before the chain runs.
    pub log_request: bool,
    /// Log a failed chain at `error` before answering it.
    pub log_error: bool,
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_request(mut self, on: bool) -> Self {
        self.log_request = on;
        self
    }

    pub fn with_log_error(mut self, on: bool) -> Self {
        self.log_error = on;
        self
    }

    /// Reads the switches from `FNCHAIN_*` environment variables.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let flag = |key: &'static str| match lookup(key) {
            Some(value) => parse_flag(key, &value),
            None => Ok(false),
        };

        Ok(Self {
            log_request: flag(ENV_LOG_REQUEST)?,
            log_error: flag(ENV_LOG_ERROR)?,
        })
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config { key, value: value.to_owned() }),
    }
}
