//! 重试退避策略 - 带抖动的上限指数退避
//!
//! 持久化调用使用有限次重试；传输层重连忽略 `max_retries`，
//! 无限重试但延迟封顶。

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 最大重试次数（传输层重连不使用）
    pub max_retries: u32,
    /// 初始退避时长（毫秒）
    pub initial_backoff_ms: u64,
    /// 退避时长上限（毫秒）
    pub max_backoff_ms: u64,
    /// 退避倍率
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// 传输层重连的默认策略：500ms 起步，2 倍增长，30s 封顶
    pub fn reconnect() -> Self {
        Self {
            max_retries: u32::MAX,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }

    /// 第 `attempt` 次重试前的等待时长（attempt 从 1 开始）
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let raw = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exp as i32);
        let capped = raw.min(self.max_backoff_ms as f64);
        Duration::from_millis(capped as u64)
    }

    /// 带 ±20% 抖动的等待时长，避免多个客户端同步重连
    pub fn delay_with_jitter(&self, attempt: u32) -> Duration {
        let base = self.delay_for(attempt);
        let factor = rand::thread_rng().gen_range(0.8..=1.2);
        base.mul_f64(factor)
    }
}
