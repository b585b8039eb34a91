use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use toml::map::Map;
use toml::Value;

use crate::gemini::DEFAULT_MODEL;

const DEFAULT_SERVER_PORT: i64 = 3000;
const DEFAULT_HISTORY_MAX_ENTRIES: i64 = 20;

/// アプリ設定。TOMLの[app]テーブルだけを持ち、読み込み時に欠落・不正値を
/// 既定値で正規化して書き戻す。APIキーは設定ファイルには置かず、
/// GEMINI_API_KEY環境変数から読む。
#[derive(Debug)]
pub struct ConfigStore {
    pub path: PathBuf,
    doc: Value,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let doc = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("failed to parse TOML: {}", path.display()))?
        } else {
            Value::Table(Map::new())
        };

        let mut store = Self { path, doc };
        store.normalize_doc();
        store.save()?;
        Ok(store)
    }

    pub fn save(&self) -> Result<()> {
        let text = toml::to_string_pretty(&self.doc).context("failed to serialize TOML")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write config: {}", self.path.display()))
    }

    pub fn server_port(&self) -> u16 {
        self.app_table()
            .and_then(|t| t.get("server_port"))
            .and_then(value_to_i64)
            .and_then(|v| u16::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_SERVER_PORT as u16)
    }

    pub fn history_max_entries(&self) -> usize {
        self.app_table()
            .and_then(|t| t.get("history_max_entries"))
            .and_then(value_to_i64)
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_HISTORY_MAX_ENTRIES as usize)
    }

    pub fn gemini_model(&self) -> String {
        self.app_table()
            .and_then(|t| t.get("gemini_model"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    fn normalize_doc(&mut self) {
        if !self.doc.is_table() {
            self.doc = Value::Table(Map::new());
        }

        let app = self.ensure_app_table_mut();

        let port = app
            .get("server_port")
            .and_then(value_to_i64)
            .filter(|v| (1..=65_535).contains(v))
            .unwrap_or(DEFAULT_SERVER_PORT);
        app.insert("server_port".to_string(), Value::Integer(port));

        let max_entries = app
            .get("history_max_entries")
            .and_then(value_to_i64)
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_HISTORY_MAX_ENTRIES);
        app.insert(
            "history_max_entries".to_string(),
            Value::Integer(max_entries),
        );

        let model = app
            .get("gemini_model")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        app.insert("gemini_model".to_string(), Value::String(model));
    }

    fn app_table(&self) -> Option<&Map<String, Value>> {
        self.doc
            .as_table()
            .and_then(|root| root.get("app"))
            .and_then(Value::as_table)
    }

    fn ensure_app_table_mut(&mut self) -> &mut Map<String, Value> {
        if !self.doc.is_table() {
            self.doc = Value::Table(Map::new());
        }
        let root = self
            .doc
            .as_table_mut()
            .expect("root should be table after normalization");
        let app = root
            .entry("app".to_string())
            .or_insert_with(|| Value::Table(Map::new()));
        if !app.is_table() {
            *app = Value::Table(Map::new());
        }
        app.as_table_mut()
            .expect("app should be table after normalization")
    }
}

fn value_to_i64(value: &Value) -> Option<i64> {
    value
        .as_integer()
        .or_else(|| value.as_float().map(|v| v as i64))
        .or_else(|| value.as_str().and_then(|v| v.parse::<i64>().ok()))
}
