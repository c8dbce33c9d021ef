use crate::core::grouping::UNKNOWN_GROUP;
use crate::domain::model::Record;
use crate::utils::text::strip_accents;
use std::collections::HashSet;

pub const DEFAULT_FALLBACK_NAME: &str = "Record_{n}";

/// 去重音、空白換成 `_`，只保留 `[A-Za-z0-9._-]`
pub fn sanitize_component(raw: &str) -> String {
    let stripped = strip_accents(raw.trim());
    let underscored = stripped.split_whitespace().collect::<Vec<_>>().join("_");
    underscored
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

pub fn group_dir(group: &str) -> String {
    let sanitized = sanitize_component(group);
    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        UNKNOWN_GROUP.to_string()
    } else {
        sanitized
    }
}

pub fn fallback_name(pattern: &str, position: usize) -> String {
    pattern.replace("{n}", &position.to_string())
}

/// `{position:03}_{base}.pdf`，base 取名稱欄位，沒有時用 fallback 樣板
pub fn document_file_name(record: &Record, name_column: &str, position: usize, fallback_pattern: &str) -> String {
    let base = record
        .text(name_column)
        .map(|name| sanitize_component(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| sanitize_component(&fallback_name(fallback_pattern, position)));
    format!("{:03}_{}.pdf", position, base)
}

/// 記錄本次批次已產生的路徑，重複時加上 `_2`、`_3` 後綴
#[derive(Debug, Default)]
pub struct PathRegistry {
    used: HashSet<String>,
}

impl PathRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, dir: &str, file_name: &str) -> String {
        let candidate = format!("{}/{}", dir, file_name);
        if self.used.insert(candidate.clone()) {
            return candidate;
        }

        let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
        let mut suffix = 2;
        loop {
            let candidate = format!("{}/{}_{}.pdf", dir, stem, suffix);
            if self.used.insert(candidate.clone()) {
                tracing::debug!("Output name collision, using {}", candidate);
                return candidate;
            }
            suffix += 1;
        }
    }
}
