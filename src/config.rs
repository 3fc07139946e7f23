//! 运行配置 - 配置文件与命令行参数合并

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::backoff::RetryConfig;

/// 客户端配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 事件推送 WebSocket 地址
    pub push_endpoint: String,
    /// REST API 基地址
    pub api_base: String,
    /// 提示音文件路径（缺省时无声运行）
    pub sound_path: Option<PathBuf>,
    /// 单次 HTTP 请求超时（秒）
    pub http_timeout_secs: u64,
    /// 持久化与初始拉取重试
    pub persist_retry: RetryConfig,
    /// 传输层重连退避
    pub reconnect: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            push_endpoint: "ws://localhost:4000/events".to_string(),
            api_base: "http://localhost:4000".to_string(),
            sound_path: None,
            http_timeout_secs: 30,
            persist_retry: RetryConfig::default(),
            reconnect: RetryConfig::reconnect(),
        }
    }
}

impl Config {
    /// 默认配置文件路径
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("recruit-notify")
            .join("config.json")
    }

    /// 从指定文件加载
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// 加载默认位置的配置；文件缺失或损坏时退回默认值
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "failed to load config, using defaults");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.push_endpoint, "ws://localhost:4000/events");
        assert_eq!(config.api_base, "http://localhost:4000");
        assert!(config.sound_path.is_none());
    }

    #[test]
    fn test_load_from_file_with_partial_fields() {
        // 未出现的字段回落到默认值
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"api_base": "http://10.0.0.5:4000", "http_timeout_secs": 5}}"#
        )
        .unwrap();
        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.api_base, "http://10.0.0.5:4000");
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.push_endpoint, "ws://localhost:4000/events");
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        assert!(Config::load_from(Path::new("/nonexistent/config.json")).is_err());
    }

    #[test]
    fn test_load_from_invalid_json_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
