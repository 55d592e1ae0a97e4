use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const ENV_BIND: &str = "MEETWIRE_BIND";
pub const ENV_SEND_TIMEOUT_MS: &str = "MEETWIRE_SEND_TIMEOUT_MS";
pub const ENV_CHANNEL_CAPACITY: &str = "MEETWIRE_CHANNEL_CAPACITY";
pub const ENV_MAX_MESSAGE_BYTES: &str = "MEETWIRE_MAX_MESSAGE_BYTES";
pub const ENV_PING_INTERVAL_SECS: &str = "MEETWIRE_PING_INTERVAL_SECS";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "MEETWIRE_IDLE_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Relay tuning knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Upper bound for one delivery attempt, queueing and socket write alike.
    pub send_timeout: Duration,
    /// Outbound frames buffered per participant before sends start waiting.
    pub channel_capacity: usize,
    pub max_message_bytes: usize,
    pub ping_interval: Duration,
    /// A channel with no inbound frame (pongs included) for this long is closed.
    pub idle_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            send_timeout: Duration::from_secs(5),
            channel_capacity: 64,
            max_message_bytes: 64 * 1024,
            ping_interval: Duration::from_secs(20),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl RelayConfig {
    /// Defaults overridden by `MEETWIRE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, ENV_BIND)? {
            config.bind_addr = addr;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_SEND_TIMEOUT_MS)? {
            config.send_timeout = Duration::from_millis(ms);
        }
        if let Some(capacity) = parse_var(&lookup, ENV_CHANNEL_CAPACITY)? {
            config.channel_capacity = capacity;
        }
        if let Some(bytes) = parse_var(&lookup, ENV_MAX_MESSAGE_BYTES)? {
            config.max_message_bytes = bytes;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_PING_INTERVAL_SECS)? {
            config.ping_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_IDLE_TIMEOUT_SECS)? {
            config.idle_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, bool, String); 5] = [
            (
                ENV_SEND_TIMEOUT_MS,
                self.send_timeout.is_zero(),
                format!("{}", self.send_timeout.as_millis()),
            ),
            (
                ENV_CHANNEL_CAPACITY,
                self.channel_capacity == 0,
                self.channel_capacity.to_string(),
            ),
            (
                ENV_MAX_MESSAGE_BYTES,
                self.max_message_bytes == 0,
                self.max_message_bytes.to_string(),
            ),
            (
                ENV_PING_INTERVAL_SECS,
                self.ping_interval.is_zero(),
                self.ping_interval.as_secs().to_string(),
            ),
            (
                ENV_IDLE_TIMEOUT_SECS,
                self.idle_timeout.is_zero(),
                self.idle_timeout.as_secs().to_string(),
            ),
        ];

        for (key, is_zero, value) in checks {
            if is_zero {
                return Err(ConfigError::Invalid {
                    key,
                    value,
                    reason: "must be greater than zero".to_owned(),
                });
            }
        }

        if self.idle_timeout <= self.ping_interval {
            return Err(ConfigError::Invalid {
                key: ENV_IDLE_TIMEOUT_SECS,
                value: self.idle_timeout.as_secs().to_string(),
                reason: "must be longer than the ping interval".to_owned(),
            });
        }

        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        })
}
