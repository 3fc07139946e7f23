//! 通知记录 - 管道内流转的规范化数据结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 通知级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// 通知记录
///
/// `id` 在会话内唯一：初始快照由服务端分配，推送事件在本地生成。
/// 线上 REST 接口使用 camelCase 字段名。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
}

impl NotificationRecord {
    /// 为一条推送事件创建新记录（本地 id，未读）
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
            created_at: Utc::now(),
            unread: true,
        }
    }

    /// 设置深链接（链式调用）
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unread_with_unique_id() {
        let a = NotificationRecord::new(NotificationKind::Info, "t", "m");
        let b = NotificationRecord::new(NotificationKind::Info, "t", "m");
        assert!(a.unread);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let record = NotificationRecord::new(NotificationKind::Warning, "Title", "Body")
            .with_link("/admin/interviews");
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("createdAt"));
        assert!(json.contains("\"kind\":\"warning\""));

        let parsed: NotificationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.link.as_deref(), Some("/admin/interviews"));
    }

    #[test]
    fn test_snapshot_record_without_link_deserializes() {
        let json = r#"{"id":"42","kind":"info","title":"T","message":"M","createdAt":"2026-08-01T10:00:00Z","unread":false}"#;
        let record: NotificationRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "42");
        assert!(!record.unread);
        assert!(record.link.is_none());
    }
}
