//! Configuration model (`config.toml`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ParleyError, Result};
use crate::storage::keys::DEFAULT_PREFIX;

const MIB: u64 = 1024 * 1024;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct ParleyConfig {
    pub storage: StorageConfig,
    pub eviction: EvictionConfig,
    pub retention: RetentionConfig,
    pub chat: ChatConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Global prefix for physical keys.
    pub prefix: String,
    /// Byte quota of the persistent area. 0 means unlimited.
    pub quota_bytes: u64,
    /// `validate_data` flags usage above this.
    pub usage_warning_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            quota_bytes: 5 * MIB,
            usage_warning_bytes: 4 * MIB,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvictionConfig {
    /// Install the oldest-fraction policy on the store.
    pub enabled: bool,
    pub fraction: f64,
    /// Retry the failed write once after a successful eviction.
    pub retry_after_eviction: bool,
}

impl Default for EvictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fraction: 0.25,
            retry_after_eviction: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RetentionConfig {
    pub max_messages: usize,
    pub keep_messages: usize,
    pub max_backgrounds: usize,
    pub keep_backgrounds: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_messages: 1000,
            keep_messages: 500,
            max_backgrounds: 10,
            keep_backgrounds: 5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    pub history_batch_size: usize,
    pub max_message_length: usize,
    pub max_image_bytes: usize,
    pub history_load_delay_ms: u64,
    /// Probability that a sent message gets a simulated reply.
    pub reply_probability: f64,
    pub reply_delay_min_ms: u64,
    pub reply_delay_max_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_batch_size: 50,
            max_message_length: 2000,
            max_image_bytes: 5 * MIB as usize,
            history_load_delay_ms: 800,
            reply_probability: 0.3,
            reply_delay_min_ms: 1000,
            reply_delay_max_ms: 3000,
        }
    }
}

impl StorageConfig {
    pub fn quota(&self) -> Option<u64> {
        (self.quota_bytes > 0).then_some(self.quota_bytes)
    }
}

impl ChatConfig {
    pub fn history_load_delay(&self) -> Duration {
        Duration::from_millis(self.history_load_delay_ms)
    }
}

impl ParleyConfig {
    /// Parses a TOML document; absent sections and fields take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the store and chat service cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.storage.prefix.is_empty() {
            return Err(ParleyError::config("storage.prefix must not be empty"));
        }
        if !(self.eviction.fraction > 0.0 && self.eviction.fraction <= 1.0) {
            return Err(ParleyError::config("eviction.fraction must be in (0, 1]"));
        }
        if self.retention.keep_messages > self.retention.max_messages
            || self.retention.keep_backgrounds > self.retention.max_backgrounds
        {
            return Err(ParleyError::config(
                "retention keep_* must not exceed the matching max_*",
            ));
        }
        if self.chat.history_batch_size == 0 {
            return Err(ParleyError::config("chat.history_batch_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.chat.reply_probability) {
            return Err(ParleyError::config("chat.reply_probability must be in [0, 1]"));
        }
        if self.chat.reply_delay_min_ms > self.chat.reply_delay_max_ms {
            return Err(ParleyError::config(
                "chat.reply_delay_min_ms must not exceed reply_delay_max_ms",
            ));
        }
        Ok(())
    }
}
