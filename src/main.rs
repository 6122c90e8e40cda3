//! アプリケーションのエントリポイントとランタイム初期化。

use std::path::Path;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;

mod api;
mod app;
mod config;
mod draft_editor;
mod events;
mod forms;
mod input;
mod layout;
mod pager;
mod poller;
mod prefs;
mod shortcuts;
mod status;
mod ui;
mod wizard;
mod worker;

/// 設定ファイルの場所（カレントディレクトリ）。
const CONFIG_FILE: &str = "config.toml";

/// ファイルロギングを初期化し、非同期ガードを生存させる。
fn init_logging(log_file: &str) -> Result<WorkerGuard> {
    // TUIの標準出力を汚さないよう、ファイルへ直接書き込む。
    let path = Path::new(log_file);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = path.file_name().unwrap_or(path.as_os_str());
    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to init logging: {e}"))?;
    tracing::info!("logging to {}", path.display());
    Ok(guard)
}

#[tokio::main]
/// エントリポイント：設定読込→ログ初期化→UI開始→端末復元。
async fn main() -> Result<()> {
    // ログ出力先も設定に含まれるため先に読む。
    let cfg = config::Config::load_or_default(Path::new(CONFIG_FILE))?;
    let _log_guard = init_logging(&cfg.log.file)?;
    tracing::info!("app starting, backend {}", cfg.api.base_url);

    let mut terminal = ui::init_terminal()?;
    let res = app::run_app(&mut terminal, cfg).await;
    // 端末の状態を必ず元に戻す。
    ui::restore_terminal()?;
    if let Err(ref e) = res {
        tracing::error!("app error: {e:#}");
    }
    tracing::info!("app exiting");
    res
}
