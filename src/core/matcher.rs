use crate::domain::model::FieldMapping;

/// 自動對應模板欄位與試算表欄位。
///
/// 每個模板欄位依序嘗試，先命中者勝出：
/// 1. 完全相同
/// 2. 不分大小寫相同
/// 3. 不分大小寫的子字串（任一方向），以欄位順序第一個為準
///
/// 沒有命中的欄位不會出現在結果中。
pub fn auto_match<F, C>(template_fields: &[F], columns: &[C]) -> FieldMapping
where
    F: AsRef<str>,
    C: AsRef<str>,
{
    let lowered: Vec<(&str, String)> = columns
        .iter()
        .map(|c| (c.as_ref(), c.as_ref().to_lowercase()))
        .collect();

    let mut mapping = FieldMapping::new();
    for field in template_fields {
        let field = field.as_ref();
        if let Some(column) = match_field(field, &lowered) {
            tracing::debug!("Matched field '{}' -> column '{}'", field, column);
            mapping.insert(field.to_string(), column.to_string());
        } else {
            tracing::debug!("No column matches field '{}'", field);
        }
    }
    mapping
}

fn match_field<'a>(field: &str, columns: &[(&'a str, String)]) -> Option<&'a str> {
    if let Some((column, _)) = columns.iter().find(|(c, _)| *c == field) {
        return Some(*column);
    }

    let field_lower = field.to_lowercase();
    if let Some((column, _)) = columns.iter().find(|(_, lower)| *lower == field_lower) {
        return Some(*column);
    }

    columns
        .iter()
        .find(|(_, lower)| field_lower.contains(lower.as_str()) || lower.contains(&field_lower))
        .map(|(column, _)| *column)
}
