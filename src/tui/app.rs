//! TUI 应用状态和主循环
//!
//! 只通过订阅面读取存储、触发动作；首次按键即视为真实用户交互，
//! 用于解锁声音提醒。

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tokio::sync::watch;

use crate::notification::surface::{FeedSnapshot, NotificationFeed};
use crate::session::SessionHandle;
use crate::transport::ConnectionState;

/// 按键轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// TUI 应用状态
pub struct App {
    feed: NotificationFeed,
    handle: SessionHandle,
    conn_rx: watch::Receiver<ConnectionState>,
    pub snapshot: FeedSnapshot,
    pub selected: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(feed: NotificationFeed, handle: SessionHandle) -> Self {
        let conn_rx = handle.connection();
        let snapshot = feed.snapshot();
        Self {
            feed,
            handle,
            conn_rx,
            snapshot,
            selected: 0,
            should_quit: false,
        }
    }

    /// 拉取最新快照并钳制选中位置
    pub fn refresh(&mut self) {
        self.snapshot = self.feed.snapshot();
        if !self.snapshot.notifications.is_empty() {
            self.selected = self.selected.min(self.snapshot.notifications.len() - 1);
        } else {
            self.selected = 0;
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.conn_rx.borrow()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        // 每次按键都是一次真实用户交互
        self.handle.user_gesture();

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.snapshot.notifications.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('r') => self.feed.mark_all_as_read(),
            KeyCode::Char('d') => {
                if let Some(record) = self.snapshot.notifications.get(self.selected) {
                    let id = record.id.clone();
                    self.feed.delete(&id);
                }
            }
            _ => {}
        }
    }
}

pub fn init_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout()))?)
}

pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// 启动动态流界面，直到用户退出
pub async fn run(feed: NotificationFeed, handle: SessionHandle) -> Result<()> {
    let mut terminal = init_terminal()?;
    let mut app = App::new(feed, handle);
    let result = run_loop(&mut terminal, &mut app).await;
    restore_terminal()?;
    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        app.refresh();
        terminal.draw(|frame| super::ui::render(app, frame))?;
        if app.should_quit {
            return Ok(());
        }

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }
}
