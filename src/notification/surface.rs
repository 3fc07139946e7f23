//! 消费端订阅面 - 只读快照 + 操作入口
//!
//! UI（铃铛、下拉列表、动态流）只通过这里读取存储、触发同步动作，
//! 不直接接触存储或网络。

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;

use super::record::NotificationRecord;
use super::store::SharedStore;
use super::sync::ReadStateSync;

/// 发布给订阅方的只读快照
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    /// 最新在前的通知序列
    pub notifications: Vec<NotificationRecord>,
    /// 未读数（与记录的 unread 标记保持一致）
    pub unread_count: usize,
    /// 最近一次可恢复的同步失败（成功后清除）
    pub last_error: Option<SyncFailure>,
}

/// 同步动作类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    FetchSnapshot,
    MarkAllRead,
    Delete,
}

impl std::fmt::Display for SyncAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FetchSnapshot => "fetch-snapshot",
            Self::MarkAllRead => "mark-all-read",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// 可恢复的同步失败，暴露给消费端提示用
#[derive(Debug, Clone)]
pub struct SyncFailure {
    pub action: SyncAction,
    pub detail: String,
}

/// 订阅句柄：快照读取 + 变更等待 + 同步动作
#[derive(Debug, Clone)]
pub struct NotificationFeed {
    store: Arc<SharedStore>,
    rx: watch::Receiver<FeedSnapshot>,
    sync: ReadStateSync,
}

impl NotificationFeed {
    pub(crate) fn new(
        store: Arc<SharedStore>,
        rx: watch::Receiver<FeedSnapshot>,
        sync: ReadStateSync,
    ) -> Self {
        Self { store, rx, sync }
    }

    /// 当前快照
    pub fn snapshot(&self) -> FeedSnapshot {
        self.store.snapshot()
    }

    /// 等待下一次变更并返回新快照；会话结束后返回 Err
    pub async fn changed(&mut self) -> Result<FeedSnapshot> {
        self.rx.changed().await?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// 乐观地全部标记已读，并异步持久化
    pub fn mark_all_as_read(&self) {
        self.sync.mark_all_as_read();
    }

    /// 乐观地删除一条记录，并异步持久化
    pub fn delete(&self, id: &str) {
        self.sync.delete(id);
    }
}
