//! Recruit Notify - 招聘后台实时通知客户端

pub mod backoff;
pub mod config;
pub mod notification;
pub mod session;
pub mod transport;
pub mod tui;

pub use backoff::RetryConfig;
pub use config::Config;
pub use notification::{
    AudioSink, AudioUnlockState, DesktopPort, EventDispatcher, EventPayload, FeedSnapshot,
    InboundEventKind, NotificationFeed, NotificationKind, NotificationRecord, NotificationStore,
    PermissionState, ReadStateSync, SharedStore, SideEffectEngine, SyncAction, SyncConfig,
    SyncFailure, WireMessage, STORE_CAPACITY,
};
pub use session::{NotifySession, SessionHandle};
pub use transport::{ConnectionState, Connector, TransportConfig};
