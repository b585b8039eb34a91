use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use crate::analysis::{AnalysisResult, Generation};

/// 一覧APIが返す最大件数。
pub const LIST_LIMIT: usize = 20;

/// 生成履歴ストア。generations.jsonに全件を持ち、書き込みは一時ファイル
/// 経由で置き換える。壊れたファイルはバックアップして空で作り直す。
pub struct GenerationStore {
    base_dir: PathBuf,
    generations_json_path: PathBuf,
    max_entries: usize,
}

impl GenerationStore {
    pub fn new(base_dir: PathBuf, max_entries: usize) -> Result<Self> {
        let resolved_max = if max_entries == 0 { LIST_LIMIT } else { max_entries };
        let store = Self {
            generations_json_path: base_dir.join("generations.json"),
            base_dir,
            max_entries: resolved_max,
        };
        store.ensure_files()?;
        Ok(store)
    }

    pub fn append(&mut self, product_model: &str, analysis: &AnalysisResult) -> Result<Generation> {
        let mut entries = self.read_entries()?;
        let now = Local::now();
        let entry = Generation {
            id: self.next_entry_id(now.naive_local(), &entries),
            product_model: product_model.trim().to_string(),
            analysis_result: analysis.clone(),
            created_at: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        entries.push(entry.clone());
        // 上限超過分は古いものから落とす
        let overflow = entries.len().saturating_sub(self.max_entries);
        if overflow > 0 {
            entries.drain(..overflow);
        }
        self.write_entries(&entries)?;
        Ok(entry)
    }

    /// 新しい順の一覧。LIST_LIMIT件まで。
    pub fn list(&self) -> Result<Vec<Generation>> {
        let mut entries = self.read_entries()?;
        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(LIST_LIMIT);
        Ok(entries)
    }

    pub fn find(&self, generation_id: &str) -> Result<Option<Generation>> {
        let generation_id = generation_id.trim();
        if generation_id.is_empty() {
            return Ok(None);
        }
        let entries = self.read_entries()?;
        Ok(entries.into_iter().find(|entry| entry.id == generation_id))
    }

    pub fn delete(&mut self, generation_id: &str) -> Result<bool> {
        let generation_id = generation_id.trim();
        if generation_id.is_empty() {
            return Ok(false);
        }

        let entries = self.read_entries()?;
        let before = entries.len();
        let filtered: Vec<Generation> = entries
            .into_iter()
            .filter(|entry| entry.id != generation_id)
            .collect();
        if filtered.len() == before {
            return Ok(false);
        }
        self.write_entries(&filtered)?;
        Ok(true)
    }

    fn ensure_files(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("failed to create base dir: {}", self.base_dir.display()))?;

        if !self.generations_json_path.exists() {
            return self.write_raw("[]");
        }

        match self.read_entries() {
            Ok(entries) => self.write_entries(&entries),
            Err(_) => {
                let now_tag = Local::now().format("%Y%m%d_%H%M%S").to_string();
                let backup = self
                    .base_dir
                    .join(format!("generations.broken.{}.json", now_tag));
                fs::rename(&self.generations_json_path, backup).with_context(|| {
                    format!(
                        "failed to backup broken generations: {}",
                        self.generations_json_path.display()
                    )
                })?;
                self.write_raw("[]")
            }
        }
    }

    fn read_entries(&self) -> Result<Vec<Generation>> {
        let raw_text = fs::read_to_string(&self.generations_json_path).with_context(|| {
            format!(
                "failed to read json: {}",
                self.generations_json_path.display()
            )
        })?;
        let raw: Value = serde_json::from_str(&raw_text).with_context(|| {
            format!(
                "failed to parse json: {}",
                self.generations_json_path.display()
            )
        })?;

        let Some(array) = raw.as_array() else {
            return Err(anyhow!(
                "json is not an array: {}",
                self.generations_json_path.display()
            ));
        };

        // 個別に壊れたエントリは読み飛ばす
        let entries = array
            .iter()
            .filter_map(|item| serde_json::from_value::<Generation>(item.clone()).ok())
            .filter(|entry| !entry.id.trim().is_empty())
            .collect();
        Ok(entries)
    }

    fn write_entries(&self, entries: &[Generation]) -> Result<()> {
        let payload = serde_json::to_string_pretty(entries)
            .context("failed to serialize generations json")?;
        self.write_raw(&payload)
    }

    fn write_raw(&self, payload: &str) -> Result<()> {
        let target = &self.generations_json_path;
        let tmp_path = target.with_file_name("generations.json.tmp");

        fs::write(&tmp_path, payload)
            .with_context(|| format!("failed to write temp json: {}", tmp_path.display()))?;
        if target.exists() {
            fs::remove_file(target)
                .with_context(|| format!("failed to remove old json: {}", target.display()))?;
        }
        fs::rename(&tmp_path, target)
            .with_context(|| format!("failed to replace json: {}", target.display()))
    }

    fn next_entry_id(&self, now: NaiveDateTime, entries: &[Generation]) -> String {
        let base = now.format("%Y%m%d_%H%M%S").to_string();
        let prefix = format!("{base}_");
        let mut seq: i32 = 1;

        for entry in entries {
            if !entry.id.starts_with(&prefix) {
                continue;
            }
            let parts: Vec<&str> = entry.id.split('_').collect();
            if parts.len() != 3 {
                continue;
            }
            if let Ok(parsed) = parts[2].parse::<i32>() {
                seq = seq.max(parsed + 1);
            }
        }

        format!("{base}_{seq:04}")
    }
}
