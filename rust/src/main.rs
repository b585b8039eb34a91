use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use crf_form_generator::config_store::ConfigStore;
use crf_form_generator::gemini::GeminiClient;
use crf_form_generator::generation_store::GenerationStore;
use crf_form_generator::path_utils::{get_base_dir, resolve_config_path};
use crf_form_generator::server::{AppServer, AppState};

struct Args {
    config: Option<String>,
}

fn main() -> Result<()> {
    let args = parse_args();
    let base_dir = get_base_dir();
    let config_path = resolve_config_path(args.config, &base_dir);

    let config = ConfigStore::new(config_path.clone())
        .with_context(|| format!("設定ファイルエラー: {}", config_path.display()))?;
    let preferred_port = config.server_port();
    let history_max_entries = config.history_max_entries();

    let gemini = GeminiClient::from_env(config.gemini_model())
        .context("Gemini APIクライアントの初期化に失敗しました")?;
    let generations = GenerationStore::new(base_dir, history_max_entries)
        .context("履歴ストアの初期化に失敗しました")?;

    let state = Arc::new(AppState::new(generations, gemini));
    let server =
        AppServer::start(state, preferred_port).context("サーバーの起動に失敗しました")?;

    println!("CRF Form Generator: http://127.0.0.1:{}/", server.port());
    server.wait();
    Ok(())
}

fn parse_args() -> Args {
    let mut config = None;
    let mut args = env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(value) = args.next() {
                config = Some(value);
            }
        }
    }

    Args { config }
}
