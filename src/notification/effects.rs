//! 副作用引擎 - 声音提醒解锁门控 + 系统级通知
//!
//! 宿主平台要求声音播放必须先有一次真实用户交互（解锁），
//! 解锁前到达的通知只做可视记录、不出声，这是接受的行为而非缺陷。

use anyhow::Result;
use tracing::{debug, info, warn};

use super::record::NotificationRecord;

/// 音频解锁状态机
///
/// `Locked → Unlocking`：首次用户手势或首次播放尝试；
/// `Unlocking → Unlocked`：音频设备接受激活。
/// 会话内不会回到 `Locked`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioUnlockState {
    Locked,
    Unlocking,
    Unlocked,
}

/// 系统通知权限状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Undetermined,
    Granted,
    Denied,
}

/// 音频输出设备能力契约（会话内只构造一次、复用到会话结束）
pub trait AudioSink: Send {
    /// 设备激活，解锁所需的一次性握手
    fn activate(&mut self) -> Result<()>;
    /// 播放提示音
    fn play(&mut self) -> Result<()>;
}

/// 系统级通知能力契约
pub trait DesktopPort: Send {
    /// 请求显示权限；返回是否被授予
    fn request_permission(&mut self) -> Result<bool>;
    /// 显示一条系统通知
    fn show(&mut self, title: &str, body: &str) -> Result<()>;
}

/// 副作用引擎：每条入站事件最多触发一次副作用
pub struct SideEffectEngine {
    audio_state: AudioUnlockState,
    sink: Box<dyn AudioSink>,
    desktop: Box<dyn DesktopPort>,
    permission: PermissionState,
}

impl SideEffectEngine {
    pub fn new(sink: Box<dyn AudioSink>, desktop: Box<dyn DesktopPort>) -> Self {
        Self {
            audio_state: AudioUnlockState::Locked,
            sink,
            desktop,
            permission: PermissionState::Undetermined,
        }
    }

    /// 启动时调用一次：权限未决时请求一次，之后不再请求
    pub fn init(&mut self) {
        if self.permission != PermissionState::Undetermined {
            return;
        }
        self.permission = match self.desktop.request_permission() {
            Ok(true) => {
                info!("desktop notification permission granted");
                PermissionState::Granted
            }
            Ok(false) => {
                info!("desktop notification permission denied");
                PermissionState::Denied
            }
            Err(e) => {
                warn!(error = %e, "desktop permission request failed");
                PermissionState::Denied
            }
        };
    }

    pub fn audio_state(&self) -> AudioUnlockState {
        self.audio_state
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    /// 用户手势：推进解锁状态机
    pub fn user_gesture(&mut self) {
        match self.audio_state {
            AudioUnlockState::Locked => {
                self.audio_state = AudioUnlockState::Unlocking;
                self.try_activate();
            }
            AudioUnlockState::Unlocking => self.try_activate(),
            AudioUnlockState::Unlocked => {}
        }
    }

    /// 触发一条通知的全部副作用（音频 + 系统通知）
    pub fn fire(&mut self, record: &NotificationRecord) {
        self.attempt_play();
        self.show_desktop(record);
    }

    /// 尝试播放提示音；未解锁时静默降级
    pub fn attempt_play(&mut self) {
        match self.audio_state {
            AudioUnlockState::Locked => {
                // 播放尝试也算一次解锁触发，但本次不出声
                self.audio_state = AudioUnlockState::Unlocking;
                self.try_activate();
                debug!("audio locked, alert recorded without sound");
            }
            AudioUnlockState::Unlocking => {
                self.try_activate();
                debug!("audio still unlocking, alert recorded without sound");
            }
            AudioUnlockState::Unlocked => {
                if let Err(e) = self.sink.play() {
                    warn!(error = %e, "sound playback failed");
                }
            }
        }
    }

    fn try_activate(&mut self) {
        match self.sink.activate() {
            Ok(()) => {
                self.audio_state = AudioUnlockState::Unlocked;
                debug!("audio sink activated");
            }
            Err(e) => debug!(error = %e, "audio sink activation pending"),
        }
    }

    fn show_desktop(&mut self, record: &NotificationRecord) {
        if self.permission != PermissionState::Granted {
            return;
        }
        if let Err(e) = self.desktop.show(&record.title, &record.message) {
            warn!(error = %e, "desktop notification failed");
        }
    }
}
