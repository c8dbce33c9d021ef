use crate::domain::model::{CellValue, Record, SheetData, Workbook};
use crate::utils::error::{FillError, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// 讀取試算表（xlsx/xls/xlsb/ods 或 csv），回傳所有工作表名稱與選定工作表的記錄。
/// 未指定工作表時使用第一個。
pub fn parse_workbook(bytes: &[u8], file_name: &str, sheet: Option<&str>) -> Result<Workbook> {
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    if is_csv {
        let name = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string();
        if let Some(requested) = sheet {
            if requested != name {
                return Err(FillError::config(format!(
                    "Sheet '{}' not found (CSV input only has '{}')",
                    requested, name
                )));
            }
        }
        let sheet = parse_csv(bytes, &name)?;
        return Ok(Workbook {
            sheet_names: vec![name],
            sheet,
        });
    }

    parse_excel(bytes, sheet)
}

fn parse_excel(bytes: &[u8], sheet: Option<&str>) -> Result<Workbook> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let sheet_names = workbook.sheet_names();

    let selected = match sheet {
        Some(requested) => sheet_names
            .iter()
            .find(|name| name.as_str() == requested)
            .cloned()
            .ok_or_else(|| {
                FillError::config(format!(
                    "Sheet '{}' not found. Available sheets: {}",
                    requested,
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| FillError::processing("Workbook has no sheets"))?,
    };

    tracing::debug!("Reading sheet '{}' of {:?}", selected, sheet_names);
    let range = workbook.worksheet_range(&selected)?;
    let col_offset = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let mut rows = range.rows();
    let raw_headers: Vec<String> = rows
        .next()
        .map(|row| row.iter().map(|cell| convert_cell(cell).as_text().unwrap_or_default()).collect())
        .unwrap_or_default();
    let headers = build_headers(raw_headers, col_offset);

    let records = collect_records(
        &headers,
        rows.map(|row| row.iter().map(convert_cell).collect::<Vec<_>>()),
    );

    Ok(Workbook {
        sheet_names,
        sheet: SheetData {
            name: selected,
            headers,
            records,
        },
    })
}

fn parse_csv(bytes: &[u8], name: &str) -> Result<SheetData> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let raw_headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let headers = build_headers(raw_headers, 0);

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        rows.push(
            row.iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(field.to_string())
                    }
                })
                .collect::<Vec<_>>(),
        );
    }

    let records = collect_records(&headers, rows.into_iter());
    Ok(SheetData {
        name: name.to_string(),
        headers,
        records,
    })
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateSerial(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(format!("{}", e)),
    }
}

/// 空白標題改用欄位字母，重複標題加上 `_1`、`_2` 後綴
fn build_headers(raw: Vec<String>, col_offset: usize) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, header)| {
            let header = if header.trim().is_empty() {
                column_letter(idx + col_offset)
            } else {
                header
            };
            let count = seen.entry(header.clone()).or_insert(0);
            let unique = if *count == 0 {
                header
            } else {
                format!("{}_{}", header, count)
            };
            *count += 1;
            unique
        })
        .collect()
}

fn collect_records(headers: &[String], rows: impl Iterator<Item = Vec<CellValue>>) -> Vec<Record> {
    let mut records = Vec::new();
    for (idx, cells) in rows.enumerate() {
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        let mut record = Record::new(idx + 1);
        for (col, cell) in cells.into_iter().enumerate() {
            if let Some(header) = headers.get(col) {
                record.data.insert(header.clone(), cell);
            }
        }
        records.push(record);
    }
    records
}

/// 0 -> A, 25 -> Z, 26 -> AA
pub fn column_letter(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
