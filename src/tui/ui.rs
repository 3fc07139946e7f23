//! TUI 渲染模块

use chrono::Local;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::notification::record::{NotificationKind, NotificationRecord};
use crate::transport::ConnectionState;

use super::app::App;

/// 渲染主界面：状态栏 | 通知列表 | 底部栏
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // 状态栏
            Constraint::Min(3),    // 通知列表
            Constraint::Length(1), // 底部栏
        ])
        .split(area);

    render_status_bar(app, frame, vertical[0]);
    render_list(app, frame, vertical[1]);
    render_footer(app, frame, vertical[2]);
}

fn render_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let conn = match app.connection_state() {
        ConnectionState::Connecting => "connecting",
        ConnectionState::Open => "online",
        ConnectionState::Reconnecting => "reconnecting",
        ConnectionState::Closed => "offline",
    };
    let status = format!(
        " Notifications │ unread: {} │ {}",
        app.snapshot.unread_count, conn
    );
    let style = if app.snapshot.unread_count > 0 {
        Style::default().bg(Color::Blue).fg(Color::White)
    } else {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

fn render_list(app: &App, frame: &mut Frame, area: Rect) {
    let items: Vec<ListItem> = app
        .snapshot
        .notifications
        .iter()
        .map(|record| ListItem::new(format_record(record)))
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" feed "))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White));

    let mut state = ListState::default();
    if !app.snapshot.notifications.is_empty() {
        state.select(Some(app.selected));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let footer = match &app.snapshot.last_error {
        Some(failure) => Paragraph::new(format!(
            " sync failed ({}): {} ",
            failure.action, failure.detail
        ))
        .style(Style::default().fg(Color::Red)),
        None => Paragraph::new(" j/k move │ r mark all read │ d delete │ q quit ")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, area);
}

fn format_record(record: &NotificationRecord) -> Line<'static> {
    let marker = if record.unread { "●" } else { " " };
    let icon = kind_icon(record.kind);
    let time = record
        .created_at
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    Line::from(vec![
        Span::styled(
            format!("{marker} "),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(format!("{icon} "), Style::default().fg(kind_color(record.kind))),
        Span::raw(format!("{time} ")),
        Span::styled(
            record.title.clone(),
            if record.unread {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            },
        ),
        Span::styled(
            format!(" · {}", record.message),
            Style::default().fg(Color::Gray),
        ),
    ])
}

fn kind_icon(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Info => "ℹ",
        NotificationKind::Success => "✔",
        NotificationKind::Warning => "⚠",
        NotificationKind::Error => "✘",
    }
}

fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Info => Color::Cyan,
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
    }
}
