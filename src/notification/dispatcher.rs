//! 事件分发器 - 把后端推送事件映射为规范通知记录
//!
//! 顺序约定：先入库、后副作用。副作用触发时存储必须已经一致，
//! UI 观察者响应副作用时能读到新记录。

use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::effects::SideEffectEngine;
use super::event::{EventPayload, InboundEventKind, WireMessage};
use super::record::NotificationRecord;
use super::store::SharedStore;

/// 事件分发器
pub struct EventDispatcher {
    store: Arc<SharedStore>,
    effects: Arc<Mutex<SideEffectEngine>>,
}

impl EventDispatcher {
    pub fn new(store: Arc<SharedStore>, effects: Arc<Mutex<SideEffectEngine>>) -> Self {
        Self { store, effects }
    }

    /// 处理一条入站消息：映射、入库、触发副作用
    ///
    /// 未知事件名被忽略（记录 debug 日志），返回 `None`。
    pub fn dispatch(&self, msg: &WireMessage) -> Option<NotificationRecord> {
        let Some(kind) = InboundEventKind::from_event_name(&msg.event) else {
            debug!(event = %msg.event, "ignoring unknown event");
            return None;
        };
        let payload: EventPayload = serde_json::from_value(msg.payload.clone())
            .unwrap_or_default();

        let record = Self::build_record(kind, &payload);
        info!(
            event = kind.event_name(),
            id = %record.id,
            "notification recorded"
        );

        // 先入库
        self.store.with(|store| store.insert(record.clone()));
        // 后副作用，每条事件最多触发一次
        self.effects
            .lock()
            .expect("effects lock poisoned")
            .fire(&record);

        Some(record)
    }

    /// 根据事件类型与负载构造规范记录
    pub fn build_record(kind: InboundEventKind, payload: &EventPayload) -> NotificationRecord {
        let descriptor = kind.descriptor();
        let message = Self::resolve_message(payload);
        let link = payload
            .link
            .clone()
            .or_else(|| descriptor.link.map(str::to_string));

        let mut record = NotificationRecord::new(descriptor.kind, descriptor.title, message);
        record.link = link;
        record
    }

    /// 负载缺少 message 时合成一条人类可读文案
    fn resolve_message(payload: &EventPayload) -> String {
        if let Some(message) = &payload.message {
            return message.clone();
        }
        let name = payload.name.as_deref().unwrap_or("someone");
        let purpose = payload.purpose.as_deref().unwrap_or("a request");
        format!("From {name} regarding \"{purpose}\"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::effects::{AudioSink, DesktopPort};
    use crate::notification::record::NotificationKind;
    use crate::notification::store::SharedStore;
    use anyhow::Result;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SilentSink;
    impl AudioSink for SilentSink {
        fn activate(&mut self) -> Result<()> {
            Ok(())
        }
        fn play(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct CountingPort {
        shows: Arc<AtomicUsize>,
    }
    impl DesktopPort for CountingPort {
        fn request_permission(&mut self) -> Result<bool> {
            Ok(true)
        }
        fn show(&mut self, _title: &str, _body: &str) -> Result<()> {
            self.shows.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn dispatcher() -> (EventDispatcher, Arc<SharedStore>, Arc<AtomicUsize>) {
        let (store, _rx) = SharedStore::new();
        let shows = Arc::new(AtomicUsize::new(0));
        let mut engine = SideEffectEngine::new(
            Box::new(SilentSink),
            Box::new(CountingPort {
                shows: shows.clone(),
            }),
        );
        engine.init();
        let dispatcher = EventDispatcher::new(store.clone(), Arc::new(Mutex::new(engine)));
        (dispatcher, store, shows)
    }

    fn wire(event: &str, payload: serde_json::Value) -> WireMessage {
        WireMessage {
            event: event.to_string(),
            payload,
        }
    }

    #[test]
    fn test_synthesizes_message_from_name_and_purpose() {
        let payload = EventPayload {
            name: Some("Alice".to_string()),
            purpose: Some("Dev role".to_string()),
            ..Default::default()
        };
        let record = EventDispatcher::build_record(InboundEventKind::Application, &payload);
        assert_eq!(record.message, "From Alice regarding \"Dev role\"");
        assert_eq!(record.title, "New job application");
        assert!(record.unread);
    }

    #[test]
    fn test_payload_message_takes_precedence() {
        let payload = EventPayload {
            message: Some("3 new candidates this week".to_string()),
            name: Some("Alice".to_string()),
            ..Default::default()
        };
        let record = EventDispatcher::build_record(InboundEventKind::CandidateAdded, &payload);
        assert_eq!(record.message, "3 new candidates this week");
        assert_eq!(record.kind, NotificationKind::Success);
    }

    #[test]
    fn test_missing_name_and_purpose_fall_back() {
        let record =
            EventDispatcher::build_record(InboundEventKind::ContactForm, &EventPayload::default());
        assert_eq!(record.message, "From someone regarding \"a request\"");
    }

    #[test]
    fn test_payload_link_overrides_template() {
        let payload = EventPayload {
            link: Some("/admin/interviews/77".to_string()),
            ..Default::default()
        };
        let record = EventDispatcher::build_record(InboundEventKind::InterviewScheduled, &payload);
        assert_eq!(record.link.as_deref(), Some("/admin/interviews/77"));

        let template_only =
            EventDispatcher::build_record(InboundEventKind::InterviewScheduled, &EventPayload::default());
        assert_eq!(template_only.link.as_deref(), Some("/admin/interviews"));
    }

    #[test]
    fn test_dispatch_inserts_then_fires_side_effects() {
        let (dispatcher, store, shows) = dispatcher();
        let record = dispatcher
            .dispatch(&wire(
                "application",
                serde_json::json!({"name": "Alice", "purpose": "Dev role"}),
            ))
            .unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.notifications.len(), 1);
        assert_eq!(snap.notifications[0].id, record.id);
        assert_eq!(snap.unread_count, 1);
        assert_eq!(shows.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let (dispatcher, store, shows) = dispatcher();
        assert!(dispatcher
            .dispatch(&wire("payroll-run", serde_json::Value::Null))
            .is_none());
        assert!(store.snapshot().notifications.is_empty());
        assert_eq!(shows.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_payload_falls_back_to_defaults() {
        let (dispatcher, store, _shows) = dispatcher();
        let record = dispatcher
            .dispatch(&wire("job-posting", serde_json::json!("not an object")))
            .unwrap();
        assert_eq!(record.message, "From someone regarding \"a request\"");
        assert_eq!(store.snapshot().unread_count, 1);
    }
}
