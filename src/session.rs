//! 通知会话 - 组件装配与事件主循环
//!
//! 音频句柄、传输连接、HTTP 客户端都由会话持有，构造一次、
//! 引用传递给依赖方；多客户端场景下每个连接一个独立会话，
//! 会话之间不共享任何状态。

use anyhow::Result;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::config::Config;
use crate::notification::dispatcher::EventDispatcher;
use crate::notification::effects::{AudioSink, DesktopPort, SideEffectEngine};
use crate::notification::event::WireMessage;
use crate::notification::platform::{CommandAudioSink, CommandDesktopPort};
use crate::notification::store::SharedStore;
use crate::notification::surface::NotificationFeed;
use crate::notification::sync::{ReadStateSync, SyncConfig};
use crate::transport::{ConnectionState, Connector, TransportConfig};

/// 入站事件通道容量（初始拉取期间的事件在此缓冲）
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 一次客户端会话：持有全部组件，消费入站事件直到关闭
pub struct NotifySession {
    store: Arc<SharedStore>,
    effects: Arc<Mutex<SideEffectEngine>>,
    sync: ReadStateSync,
    connector: Arc<Connector>,
    events_rx: mpsc::Receiver<WireMessage>,
    feed_rx: watch::Receiver<crate::notification::surface::FeedSnapshot>,
}

/// 会话控制句柄：用户手势、连接状态、关闭
#[derive(Clone)]
pub struct SessionHandle {
    effects: Arc<Mutex<SideEffectEngine>>,
    sync: ReadStateSync,
    connector: Arc<Connector>,
}

impl NotifySession {
    /// 用平台默认的音频/系统通知实现启动会话
    pub fn start(config: Config) -> Result<Self> {
        let sound_path = config
            .sound_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("assets/alert.wav"));
        Self::start_with_ports(
            config,
            Box::new(CommandAudioSink::new(sound_path)),
            Box::new(CommandDesktopPort::new()),
        )
    }

    /// 注入音频/系统通知实现启动会话（测试用入口）
    pub fn start_with_ports(
        config: Config,
        sink: Box<dyn AudioSink>,
        desktop: Box<dyn DesktopPort>,
    ) -> Result<Self> {
        let (store, feed_rx) = SharedStore::new();

        let mut engine = SideEffectEngine::new(sink, desktop);
        engine.init();
        let effects = Arc::new(Mutex::new(engine));

        let sync = ReadStateSync::new(
            SyncConfig {
                api_base: config.api_base.clone(),
                timeout_secs: config.http_timeout_secs,
                retry: config.persist_retry.clone(),
            },
            store.clone(),
        )?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let connector = Arc::new(Connector::spawn(
            TransportConfig {
                endpoint: config.push_endpoint.clone(),
                reconnect: config.reconnect.clone(),
            },
            events_tx,
        ));

        Ok(Self {
            store,
            effects,
            sync,
            connector,
            events_rx,
            feed_rx,
        })
    }

    /// 消费端订阅面（可多次调用，句柄可克隆）
    pub fn subscribe(&self) -> NotificationFeed {
        NotificationFeed::new(self.store.clone(), self.feed_rx.clone(), self.sync.clone())
    }

    /// 会话控制句柄
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            effects: self.effects.clone(),
            sync: self.sync.clone(),
            connector: self.connector.clone(),
        }
    }

    /// 主循环：先拉初始快照，然后逐条处理入站事件直到传输关闭
    ///
    /// 单消费者顺序处理：一条事件完成入库与副作用后才取下一条。
    pub async fn run(mut self) {
        self.sync.fetch_initial_snapshot().await;

        let dispatcher = EventDispatcher::new(self.store.clone(), self.effects.clone());
        while let Some(msg) = self.events_rx.recv().await {
            dispatcher.dispatch(&msg);
        }
        info!("notification session ended");
    }
}

impl SessionHandle {
    /// 上报一次真实用户交互（推进音频解锁）
    pub fn user_gesture(&self) {
        self.effects
            .lock()
            .expect("effects lock poisoned")
            .user_gesture();
    }

    /// 观察连接状态
    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connector.state()
    }

    /// 关闭会话：断开传输并确定性取消在途持久化任务
    pub fn shutdown(&self) {
        self.connector.shutdown();
        self.sync.shutdown();
    }
}
