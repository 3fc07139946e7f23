//! 通知存储 - 最新在前、容量上限 50 的有序通知队列
//!
//! `unread_count` 作为显式计数器维护（O(1) 读取），
//! 每次变更后必须与按 `unread` 推导出的数量一致。

use std::collections::VecDeque;
use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{debug, warn};

use super::record::NotificationRecord;
use super::surface::{FeedSnapshot, SyncFailure};

/// 存储容量上限，超出时淘汰最旧记录
pub const STORE_CAPACITY: usize = 50;

/// 通知存储（同步操作，调用后不变式必须成立）
#[derive(Debug, Default)]
pub struct NotificationStore {
    records: VecDeque<NotificationRecord>,
    unread_count: usize,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn get(&self, id: &str) -> Option<&NotificationRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// 按存储顺序（最新在前）迭代
    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    /// 头插一条记录，超限淘汰最旧，然后重算未读数
    ///
    /// 重复 id 直接丢弃（记录日志），保持 id 唯一不变式。
    pub fn insert(&mut self, record: NotificationRecord) {
        if self.records.iter().any(|r| r.id == record.id) {
            warn!(id = %record.id, "duplicate notification id, dropping");
            return;
        }
        self.records.push_front(record);
        while self.records.len() > STORE_CAPACITY {
            if let Some(evicted) = self.records.pop_back() {
                debug!(id = %evicted.id, "evicted oldest notification at capacity");
            }
        }
        self.recount();
    }

    /// 用初始快照替换全部内容（截断到容量上限）
    pub fn replace_all(&mut self, records: Vec<NotificationRecord>) {
        let mut seen = std::collections::HashSet::new();
        self.records = records
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .take(STORE_CAPACITY)
            .collect();
        self.recount();
    }

    /// 将单条记录置为已读；返回记录是否存在
    pub fn mark_one_read(&mut self, id: &str) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                if record.unread {
                    record.unread = false;
                    self.unread_count -= 1;
                }
                self.assert_invariants();
                true
            }
            None => false,
        }
    }

    /// 全部置为已读，计数归零；返回之前未读的 id（补偿用）
    pub fn mark_all_read(&mut self) -> Vec<String> {
        let mut was_unread = Vec::new();
        for record in self.records.iter_mut() {
            if record.unread {
                record.unread = false;
                was_unread.push(record.id.clone());
            }
        }
        self.unread_count = 0;
        self.assert_invariants();
        was_unread
    }

    /// 删除指定记录；不存在则为 no-op
    ///
    /// 返回被删记录及其原位置（补偿恢复用）。
    pub fn remove(&mut self, id: &str) -> Option<(usize, NotificationRecord)> {
        let index = self.records.iter().position(|r| r.id == id)?;
        let record = self.records.remove(index)?;
        if record.unread {
            self.unread_count -= 1;
        }
        self.assert_invariants();
        Some((index, record))
    }

    /// 补偿：恢复指定 id 的未读标记（仍在存储中的才恢复）
    pub fn restore_unread(&mut self, ids: &[String]) {
        for record in self.records.iter_mut() {
            if !record.unread && ids.iter().any(|id| *id == record.id) {
                record.unread = true;
            }
        }
        self.recount();
    }

    /// 补偿：把被删记录放回原位置（位置越界则钳制到末尾）
    pub fn restore_at(&mut self, index: usize, record: NotificationRecord) {
        if self.records.iter().any(|r| r.id == record.id) {
            return;
        }
        let index = index.min(self.records.len());
        self.records.insert(index, record);
        while self.records.len() > STORE_CAPACITY {
            self.records.pop_back();
        }
        self.recount();
    }

    fn recount(&mut self) {
        self.unread_count = self.records.iter().filter(|r| r.unread).count();
        self.assert_invariants();
    }

    fn assert_invariants(&self) {
        debug_assert!(self.records.len() <= STORE_CAPACITY);
        debug_assert_eq!(
            self.unread_count,
            self.records.iter().filter(|r| r.unread).count()
        );
    }
}

/// 会话内共享的存储包装：每次变更后向订阅方发布快照
#[derive(Debug)]
pub struct SharedStore {
    inner: Mutex<StoreInner>,
    tx: watch::Sender<FeedSnapshot>,
}

#[derive(Debug, Default)]
struct StoreInner {
    store: NotificationStore,
    last_error: Option<SyncFailure>,
}

impl SharedStore {
    pub fn new() -> (std::sync::Arc<Self>, watch::Receiver<FeedSnapshot>) {
        let (tx, rx) = watch::channel(FeedSnapshot::default());
        let shared = std::sync::Arc::new(Self {
            inner: Mutex::new(StoreInner::default()),
            tx,
        });
        (shared, rx)
    }

    /// 在锁内执行一次存储变更并发布快照
    pub fn with<R>(&self, f: impl FnOnce(&mut NotificationStore) -> R) -> R {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        let result = f(&mut inner.store);
        self.publish(&inner);
        result
    }

    /// 记录一次可恢复的同步失败并发布
    pub fn set_error(&self, failure: SyncFailure) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        inner.last_error = Some(failure);
        self.publish(&inner);
    }

    /// 一次持久化成功后清除残留错误
    pub fn clear_error(&self) {
        let mut inner = self.inner.lock().expect("store lock poisoned");
        if inner.last_error.take().is_some() {
            self.publish(&inner);
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let inner = self.inner.lock().expect("store lock poisoned");
        Self::make_snapshot(&inner)
    }

    fn publish(&self, inner: &StoreInner) {
        let _ = self.tx.send(Self::make_snapshot(inner));
    }

    fn make_snapshot(inner: &StoreInner) -> FeedSnapshot {
        FeedSnapshot {
            notifications: inner.store.iter().cloned().collect(),
            unread_count: inner.store.unread_count(),
            last_error: inner.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::record::NotificationKind;

    fn record(id: &str) -> NotificationRecord {
        NotificationRecord {
            id: id.to_string(),
            ..NotificationRecord::new(NotificationKind::Info, "title", "message")
        }
    }

    #[test]
    fn test_insert_prepends() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        let ids: Vec<&str> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut store = NotificationStore::new();
        for i in 0..60 {
            store.insert(record(&format!("n{i}")));
        }
        assert_eq!(store.len(), STORE_CAPACITY);
        assert_eq!(store.unread_count(), STORE_CAPACITY);
        // 最旧的 10 条（n0..n9）被淘汰
        assert!(store.get("n9").is_none());
        assert!(store.get("n10").is_some());
        assert_eq!(store.iter().next().unwrap().id, "n59");
    }

    #[test]
    fn test_duplicate_id_is_dropped() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_mark_all_read_zeroes_counter() {
        let mut store = NotificationStore::new();
        for i in 0..5 {
            store.insert(record(&format!("n{i}")));
        }
        let was_unread = store.mark_all_read();
        assert_eq!(was_unread.len(), 5);
        assert_eq!(store.unread_count(), 0);
        assert!(store.iter().all(|r| !r.unread));

        // 再次调用：无未读，计数仍为零
        assert!(store.mark_all_read().is_empty());
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn test_mark_one_read() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        assert!(store.mark_one_read("a"));
        assert_eq!(store.unread_count(), 1);
        // 重复标记不重复扣减
        assert!(store.mark_one_read("a"));
        assert_eq!(store.unread_count(), 1);
        assert!(!store.mark_one_read("missing"));
    }

    #[test]
    fn test_remove_unread_decrements_exactly_one() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        let removed = store.remove("a");
        assert!(removed.is_some());
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        assert!(store.remove("missing").is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_remove_read_record_keeps_counter() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        store.mark_one_read("a");
        store.remove("a");
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn test_restore_unread_only_surviving_records() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        let was_unread = store.mark_all_read();
        store.remove("a");

        store.restore_unread(&was_unread);
        // "a" 已被删除，只有 "b" 恢复未读
        assert_eq!(store.unread_count(), 1);
        assert!(store.get("b").unwrap().unread);
    }

    #[test]
    fn test_restore_at_puts_record_back_in_place() {
        let mut store = NotificationStore::new();
        store.insert(record("a"));
        store.insert(record("b"));
        store.insert(record("c"));
        let (index, removed) = store.remove("b").unwrap();
        assert_eq!(index, 1);

        store.restore_at(index, removed);
        let ids: Vec<&str> = store.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(store.unread_count(), 3);
    }

    #[test]
    fn test_replace_all_truncates_and_recounts() {
        let mut store = NotificationStore::new();
        let mut snapshot: Vec<NotificationRecord> = (0..60).map(|i| record(&format!("n{i}"))).collect();
        snapshot[0].unread = false;
        store.replace_all(snapshot);
        assert_eq!(store.len(), STORE_CAPACITY);
        assert_eq!(store.unread_count(), STORE_CAPACITY - 1);
    }

    #[test]
    fn test_shared_store_publishes_snapshots() {
        let (shared, rx) = SharedStore::new();
        shared.with(|s| s.insert(record("a")));
        let snap = rx.borrow().clone();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.unread_count, 1);
        assert!(snap.last_error.is_none());
    }
}
