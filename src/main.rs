//! Recruit Notify CLI
//!
//! 招聘后台实时通知客户端：无界面运行或终端动态流

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use recruit_notify::{Config, NotifySession};

#[derive(Parser)]
#[command(name = "rnc")]
#[command(about = "Recruit Notify - 招聘后台实时通知客户端")]
#[command(version)]
struct Cli {
    /// 配置文件路径（默认 ~/.config/recruit-notify/config.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 事件推送 WebSocket 地址
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// REST API 基地址
    #[arg(long, global = true)]
    api: Option<String>,

    /// 提示音文件路径
    #[arg(long, global = true)]
    sound: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 无界面运行：接收并记录通知，Ctrl-C 退出
    Run,
    /// 终端动态流界面
    Feed,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.push_endpoint = endpoint.clone();
    }
    if let Some(api) = &cli.api {
        config.api_base = api.clone();
    }
    if let Some(sound) = &cli.sound {
        config.sound_path = Some(sound.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Run => {
            fmt()
                .with_env_filter(
                    EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| EnvFilter::new("recruit_notify=info")),
                )
                .init();
            run_headless(load_config(&cli)?).await
        }
        Commands::Feed => {
            // TUI 模式不往终端写日志
            run_feed(load_config(&cli)?).await
        }
    }
}

async fn run_headless(config: Config) -> Result<()> {
    let session = NotifySession::start(config)?;
    let handle = session.handle();
    let mut feed = session.subscribe();

    // 记录每次快照变化，作为无界面模式的观察窗口
    tokio::spawn(async move {
        while let Ok(snapshot) = feed.changed().await {
            info!(
                total = snapshot.notifications.len(),
                unread = snapshot.unread_count,
                "feed updated"
            );
        }
    });

    tokio::select! {
        _ = session.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            handle.shutdown();
        }
    }
    Ok(())
}

async fn run_feed(config: Config) -> Result<()> {
    let session = NotifySession::start(config)?;
    let handle = session.handle();
    let feed = session.subscribe();

    let driver = tokio::spawn(session.run());
    let result = recruit_notify::tui::run(feed, handle.clone()).await;

    handle.shutdown();
    driver.abort();
    result
}
