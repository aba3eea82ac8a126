//! クライアント設定（TOML）
//!
//! 例:
//! ```toml
//! target = "https://exam.example.com/openexam"
//! role = "student"
//! timeout = 30
//! buffer-policy = "accumulate"
//! ```
//!
//! 省略したキーは [`crate::constants::defaults`] の値になる。

use crate::constants::defaults;
use crate::error::ClientError;
use crate::response::BufferPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ClientConfig {
    /// ベースURL
    pub target: String,
    /// セッションID（PHPSESSID cookieとして送る）
    pub session: String,
    /// デフォルトのロール（パスの1段目）
    pub role: String,
    /// 全体タイムアウト（秒）
    pub timeout: u64,
    /// 低速監視の下限（bytes/sec）
    pub low_speed_limit: u32,
    /// 低速監視の継続時間（秒）
    pub low_speed_time: u64,
    pub buffer_policy: BufferPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: defaults::TARGET.to_string(),
            session: String::new(),
            role: String::new(),
            timeout: defaults::TIMEOUT_SECS,
            low_speed_limit: defaults::LOW_SPEED_LIMIT,
            low_speed_time: defaults::LOW_SPEED_TIME_SECS,
            buffer_policy: BufferPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// ターゲットだけを指定した設定
    pub fn with_target<S: Into<String>>(target: S) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// 設定ファイルを読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ClientError> {
        toml::from_str(content).map_err(|e| ClientError::Config(format!("failed to parse: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String, ClientError> {
        toml::to_string_pretty(self)
            .map_err(|e| ClientError::Config(format!("failed to serialize: {}", e)))
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn low_speed_time_duration(&self) -> Duration {
        Duration::from_secs(self.low_speed_time)
    }
}
