//! 平台集成 - 外部播放器与系统通知命令封装
//!
//! 可执行文件只解析一次并复用；播放/显示通过 `spawn()` 异步执行，
//! 不阻塞调用方。

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::debug;

use super::effects::{AudioSink, DesktopPort};

/// 候选播放器，按顺序探测
const PLAYER_CANDIDATES: &[&str] = &["paplay", "aplay", "afplay", "play"];

/// 候选系统通知程序
const NOTIFIER_CANDIDATES: &[&str] = &["notify-send", "osascript", "terminal-notifier"];

fn resolve_first(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|name| which::which(name).ok())
}

/// 基于外部播放器命令的音频输出
pub struct CommandAudioSink {
    sound_path: PathBuf,
    player: Option<PathBuf>,
}

impl CommandAudioSink {
    pub fn new(sound_path: PathBuf) -> Self {
        Self {
            sound_path,
            player: None,
        }
    }
}

impl AudioSink for CommandAudioSink {
    fn activate(&mut self) -> Result<()> {
        if self.player.is_none() {
            let player = resolve_first(PLAYER_CANDIDATES)
                .ok_or_else(|| anyhow!("no audio player available"))?;
            debug!(player = %player.display(), "resolved audio player");
            self.player = Some(player);
        }
        if !self.sound_path.exists() {
            anyhow::bail!("sound file not found: {}", self.sound_path.display());
        }
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let player = self
            .player
            .as_ref()
            .ok_or_else(|| anyhow!("audio sink not activated"))?;
        Command::new(player)
            .arg(&self.sound_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(())
    }
}

/// 基于外部命令的系统通知端口
pub struct CommandDesktopPort {
    notifier: Option<PathBuf>,
}

impl CommandDesktopPort {
    pub fn new() -> Self {
        Self { notifier: None }
    }
}

impl Default for CommandDesktopPort {
    fn default() -> Self {
        Self::new()
    }
}

impl DesktopPort for CommandDesktopPort {
    fn request_permission(&mut self) -> Result<bool> {
        // 桌面环境没有浏览器式的权限弹窗：找得到通知程序即视为授予
        self.notifier = resolve_first(NOTIFIER_CANDIDATES);
        if let Some(notifier) = &self.notifier {
            debug!(notifier = %notifier.display(), "resolved desktop notifier");
        }
        Ok(self.notifier.is_some())
    }

    fn show(&mut self, title: &str, body: &str) -> Result<()> {
        let notifier = self
            .notifier
            .as_ref()
            .ok_or_else(|| anyhow!("no desktop notifier available"))?;
        let program = notifier
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();

        let mut command = Command::new(notifier);
        match program {
            "osascript" => {
                let script = format!(
                    "display notification \"{}\" with title \"{}\"",
                    body.replace('"', "'"),
                    title.replace('"', "'")
                );
                command.args(["-e", &script]);
            }
            "terminal-notifier" => {
                command.args(["-title", title, "-message", body]);
            }
            // notify-send 及其它同参程序
            _ => {
                command.arg(title).arg(body);
            }
        }
        command.stdout(Stdio::null()).stderr(Stdio::null()).spawn()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_before_activate_is_an_error() {
        let mut sink = CommandAudioSink::new(PathBuf::from("/nonexistent/alert.wav"));
        assert!(sink.play().is_err());
    }

    #[test]
    fn test_activate_rejects_missing_sound_file() {
        let mut sink = CommandAudioSink::new(PathBuf::from("/nonexistent/alert.wav"));
        // 播放器可能存在也可能不存在，但声音文件缺失时必须报错
        assert!(sink.activate().is_err());
    }

    #[test]
    fn test_show_before_permission_is_an_error() {
        let mut port = CommandDesktopPort::new();
        assert!(port.show("title", "body").is_err());
    }
}
