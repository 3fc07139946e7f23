//! 读取状态同步器 - 乐观更新、异步持久化、失败补偿
//!
//! 本地变更先行，网络随后；持久化任务全部挂在会话的 `JoinSet` 上，
//! 会话销毁时可确定性取消。终态失败执行补偿恢复并向消费端暴露
//! 可恢复错误。

use anyhow::Result;
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::record::NotificationRecord;
use super::store::SharedStore;
use super::surface::{SyncAction, SyncFailure};
use crate::backoff::RetryConfig;

/// 同步器配置
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// REST API 基地址（如 http://localhost:4000）
    pub api_base: String,
    /// 单次请求超时（秒）
    pub timeout_secs: u64,
    /// 持久化与初始拉取的重试策略
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:4000".to_string(),
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

/// 读取状态同步器（可克隆句柄，内部共享）
#[derive(Clone)]
pub struct ReadStateSync {
    inner: Arc<SyncInner>,
}

impl std::fmt::Debug for ReadStateSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadStateSync")
            .field("api_base", &self.inner.config.api_base)
            .finish()
    }
}

struct SyncInner {
    http: Client,
    config: SyncConfig,
    store: Arc<SharedStore>,
    tasks: Mutex<JoinSet<()>>,
}

impl ReadStateSync {
    pub fn new(config: SyncConfig, store: Arc<SharedStore>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            inner: Arc::new(SyncInner {
                http,
                config,
                store,
                tasks: Mutex::new(JoinSet::new()),
            }),
        })
    }

    /// 会话启动时拉取初始快照，带上限退避重试
    ///
    /// 全部尝试失败后存储保持为空，并向消费端暴露失败。
    pub async fn fetch_initial_snapshot(&self) {
        let retry = &self.inner.config.retry;
        let mut attempt = 0u32;
        loop {
            match self.try_fetch().await {
                Ok(records) => {
                    info!(count = records.len(), "initial notification snapshot loaded");
                    self.inner.store.with(|s| s.replace_all(records));
                    self.inner.store.clear_error();
                    return;
                }
                Err(e) => {
                    attempt += 1;
                    if attempt > retry.max_retries {
                        warn!(error = %e, "initial snapshot fetch failed, store stays empty");
                        self.inner.store.set_error(SyncFailure {
                            action: SyncAction::FetchSnapshot,
                            detail: e.to_string(),
                        });
                        return;
                    }
                    warn!(error = %e, attempt, "initial snapshot fetch failed, retrying");
                    sleep(retry.delay_with_jitter(attempt)).await;
                }
            }
        }
    }

    async fn try_fetch(&self) -> Result<Vec<NotificationRecord>> {
        let url = format!("{}/notifications", self.inner.config.api_base);
        let records = self
            .inner
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    /// 乐观地全部标记已读，再异步持久化
    ///
    /// 终态失败时恢复仍在存储中的记录的未读标记。
    pub fn mark_all_as_read(&self) {
        let was_unread = self.inner.store.with(|s| s.mark_all_read());
        let inner = self.inner.clone();
        self.spawn(async move {
            let url = format!("{}/notifications/mark-all-read", inner.config.api_base);
            let result = send_with_retries(&inner, || inner.http.put(&url)).await;
            match result {
                Ok(()) => {
                    debug!("mark-all-read persisted");
                    inner.store.clear_error();
                }
                Err(e) => {
                    warn!(error = %e, "mark-all-read persistence failed, restoring");
                    inner.store.with(|s| s.restore_unread(&was_unread));
                    inner.store.set_error(SyncFailure {
                        action: SyncAction::MarkAllRead,
                        detail: e.to_string(),
                    });
                }
            }
        });
    }

    /// 乐观地删除一条记录，再异步持久化
    ///
    /// 记录不存在则整体 no-op（不发请求）；终态失败时放回原位置。
    pub fn delete(&self, id: &str) {
        let Some((index, record)) = self.inner.store.with(|s| s.remove(id)) else {
            debug!(id, "delete on absent notification, no-op");
            return;
        };
        let inner = self.inner.clone();
        let id = id.to_string();
        self.spawn(async move {
            let url = format!("{}/notifications/{}", inner.config.api_base, id);
            let result = send_with_retries(&inner, || inner.http.delete(&url)).await;
            match result {
                Ok(()) => {
                    debug!(id, "delete persisted");
                    inner.store.clear_error();
                }
                Err(e) => {
                    warn!(id, error = %e, "delete persistence failed, restoring");
                    inner.store.with(|s| s.restore_at(index, record));
                    inner.store.set_error(SyncFailure {
                        action: SyncAction::Delete,
                        detail: e.to_string(),
                    });
                }
            }
        });
    }

    /// 取消全部在途持久化任务（会话销毁时调用）
    pub fn shutdown(&self) {
        self.inner.tasks.lock().expect("task set lock poisoned").abort_all();
    }

    fn spawn(&self, fut: impl std::future::Future<Output = ()> + Send + 'static) {
        let mut tasks = self.inner.tasks.lock().expect("task set lock poisoned");
        // 顺手回收已结束的任务句柄
        while tasks.try_join_next().is_some() {}
        tasks.spawn(fut);
    }
}

/// 按重试配置发送请求；重试耗尽后返回最后的错误
async fn send_with_retries(
    inner: &SyncInner,
    build: impl Fn() -> reqwest::RequestBuilder,
) -> Result<()> {
    let retry = &inner.config.retry;
    let mut attempt = 0u32;
    loop {
        let result = async {
            build().send().await?.error_for_status()?;
            Ok::<(), reqwest::Error>(())
        }
        .await;
        match result {
            Ok(()) => return Ok(()),
            Err(e) => {
                attempt += 1;
                if attempt > retry.max_retries {
                    return Err(e.into());
                }
                debug!(error = %e, attempt, "persistence attempt failed, retrying");
                sleep(retry.delay_with_jitter(attempt)).await;
            }
        }
    }
}
