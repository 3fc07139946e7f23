//! 通知管道核心 - 记录、分发、存储、副作用、同步
//!
//! # 设计目标
//! 1. 顺序保证：入站事件严格按到达顺序处理，先入库后副作用
//! 2. 有界存储：最新在前、容量 50，未读计数永不偏离推导值
//! 3. 门控副作用：声音播放受解锁状态机约束，系统通知受权限约束
//! 4. 乐观同步：本地变更先行，持久化失败时补偿恢复并暴露错误

pub mod dispatcher;
pub mod effects;
pub mod event;
pub mod platform;
pub mod record;
pub mod store;
pub mod surface;
pub mod sync;

pub use dispatcher::EventDispatcher;
pub use effects::{AudioSink, AudioUnlockState, DesktopPort, PermissionState, SideEffectEngine};
pub use event::{EventDescriptor, EventPayload, InboundEventKind, WireMessage};
pub use platform::{CommandAudioSink, CommandDesktopPort};
pub use record::{NotificationKind, NotificationRecord};
pub use store::{NotificationStore, SharedStore, STORE_CAPACITY};
pub use surface::{FeedSnapshot, NotificationFeed, SyncAction, SyncFailure};
pub use sync::{ReadStateSync, SyncConfig};
