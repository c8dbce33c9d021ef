use crate::domain::ports::{FormDocument, FormTemplate};
use crate::utils::error::{FillError, Result};
use lopdf::{Document, Object, ObjectId, StringFormat};
use std::collections::HashMap;
use std::sync::Arc;

/// 欄位樹最大深度，避免損壞的 /Kids 形成循環
const MAX_FIELD_DEPTH: usize = 32;

/// AcroForm PDF 模板。解析一次，每筆記錄從 `instantiate` 取得獨立副本
pub struct PdfTemplate {
    document: Document,
    fields: Vec<String>,
    field_ids: Arc<HashMap<String, ObjectId>>,
}

impl PdfTemplate {
    pub async fn from_file(path: &str) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_bytes(&bytes)
    }

    /// 欄位目前的 /V 值
    pub fn field_value(&self, field: &str) -> Option<String> {
        let id = self.field_ids.get(field)?;
        let dict = self.document.get_dictionary(*id).ok()?;
        let value = dict.get(b"V").ok()?.as_str().ok()?;
        Some(decode_text_string(value))
    }
}

impl FormTemplate for PdfTemplate {
    type Document = PdfForm;

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(bytes)?;
        let found = collect_text_fields(&document)?;
        enable_need_appearances(&mut document)?;

        tracing::debug!("PDF template has {} text fields", found.len());
        let fields = found.iter().map(|(name, _)| name.clone()).collect();
        Ok(Self {
            document,
            fields,
            field_ids: Arc::new(found.into_iter().collect()),
        })
    }

    fn field_names(&self) -> &[String] {
        &self.fields
    }

    fn instantiate(&self) -> Result<PdfForm> {
        Ok(PdfForm {
            document: self.document.clone(),
            field_ids: Arc::clone(&self.field_ids),
        })
    }
}

pub struct PdfForm {
    document: Document,
    field_ids: Arc<HashMap<String, ObjectId>>,
}

impl FormDocument for PdfForm {
    fn set_text(&mut self, field: &str, value: &str) -> Result<()> {
        let id = *self
            .field_ids
            .get(field)
            .ok_or_else(|| FillError::FieldNotFound {
                field: field.to_string(),
            })?;
        let dict = self.document.get_dictionary_mut(id)?;
        dict.set(
            "V",
            Object::String(encode_text_string(value), StringFormat::Literal),
        );
        Ok(())
    }

    fn to_bytes(mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Result<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// 走訪 /AcroForm /Fields，回傳所有文字欄位（/FT /Tx，可繼承自父節點）的完整名稱
fn collect_text_fields(doc: &Document) -> Result<Vec<(String, ObjectId)>> {
    let catalog = doc.catalog()?;
    let acroform = match catalog.get(b"AcroForm") {
        Ok(object) => resolve(doc, object)?.as_dict()?,
        Err(_) => {
            tracing::warn!("PDF template has no AcroForm; no fillable fields");
            return Ok(Vec::new());
        }
    };
    let roots = match acroform.get(b"Fields") {
        Ok(object) => resolve(doc, object)?.as_array()?,
        Err(_) => return Ok(Vec::new()),
    };

    let mut found = Vec::new();
    for root in roots {
        if let Ok(id) = root.as_reference() {
            walk_field(doc, id, None, None, 0, &mut found)?;
        }
    }
    Ok(found)
}

fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent_name: Option<&str>,
    inherited_type: Option<&[u8]>,
    depth: usize,
    found: &mut Vec<(String, ObjectId)>,
) -> Result<()> {
    if depth > MAX_FIELD_DEPTH {
        tracing::warn!("Field tree deeper than {} levels, stopping", MAX_FIELD_DEPTH);
        return Ok(());
    }

    let dict = doc.get_dictionary(id)?;
    let partial = dict
        .get(b"T")
        .ok()
        .and_then(|t| t.as_str().ok())
        .map(decode_text_string);
    let name = match (parent_name, partial) {
        (Some(parent), Some(partial)) => Some(format!("{}.{}", parent, partial)),
        (None, Some(partial)) => Some(partial),
        (parent, None) => parent.map(str::to_string),
    };
    let field_type = dict
        .get(b"FT")
        .ok()
        .and_then(|ft| ft.as_name().ok())
        .or(inherited_type);

    // /Kids 帶 /T 的是子欄位，沒有 /T 的只是 widget
    let child_fields: Vec<ObjectId> = dict
        .get(b"Kids")
        .ok()
        .and_then(|kids| resolve(doc, kids).ok())
        .and_then(|kids| kids.as_array().ok())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| kid.as_reference().ok())
                .filter(|kid| {
                    doc.get_dictionary(*kid)
                        .map(|d| d.has(b"T"))
                        .unwrap_or(false)
                })
                .collect()
        })
        .unwrap_or_default();

    if !child_fields.is_empty() {
        for kid in child_fields {
            walk_field(doc, kid, name.as_deref(), field_type, depth + 1, found)?;
        }
    } else if let (Some(name), Some(b"Tx")) = (name, field_type) {
        found.push((name, id));
    }
    Ok(())
}

fn enable_need_appearances(doc: &mut Document) -> Result<()> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let acroform = doc.get_dictionary(root_id)?.get(b"AcroForm").ok().cloned();
    match acroform {
        Some(Object::Reference(id)) => {
            doc.get_dictionary_mut(id)?.set("NeedAppearances", true);
        }
        Some(Object::Dictionary(_)) => {
            if let Ok(Object::Dictionary(inline)) = doc.get_dictionary_mut(root_id)?.get_mut(b"AcroForm") {
                inline.set("NeedAppearances", true);
            }
        }
        _ => {}
    }
    Ok(())
}

/// PDF text string：UTF-16BE（含 BOM）或 PDFDocEncoding（以 Latin-1 近似）
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn encode_text_string(value: &str) -> Vec<u8> {
    if value.is_ascii() {
        return value.as_bytes().to_vec();
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}
