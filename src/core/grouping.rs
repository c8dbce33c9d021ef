use crate::domain::model::{Record, RecordGroup};
use std::collections::HashMap;

pub const UNKNOWN_GROUP: &str = "Unknown";

/// 依群組欄位分組，群組維持第一次出現的順序；
/// 每組內依名稱欄位（不分大小寫）做穩定排序
pub fn group_and_sort(records: Vec<Record>, group_column: &str, name_column: &str) -> Vec<RecordGroup> {
    let mut groups: Vec<RecordGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = group_key(&record, group_column);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(RecordGroup {
                name: key,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record);
    }

    for group in &mut groups {
        group
            .records
            .sort_by(|a, b| sort_key(a, name_column).cmp(&sort_key(b, name_column)));
        tracing::debug!("Group '{}' has {} records", group.name, group.records.len());
    }

    groups
}

/// 群組值前後空白會去掉（`"Norte "` 與 `"Norte"` 同組），空值歸入 `Unknown`
fn group_key(record: &Record, group_column: &str) -> String {
    record
        .text(group_column)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_GROUP.to_string())
}

fn sort_key(record: &Record, name_column: &str) -> String {
    record
        .text(name_column)
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}
