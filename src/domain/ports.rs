use crate::domain::model::{GenerationResult, RecordGroup, SheetData};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 輸出目的地：本地目錄或單一壓縮檔，管線只依賴這個介面
pub trait Storage: Send + Sync {
    /// 準備群組的輸出位置（目錄不存在時建立）
    fn prepare_dir(&self, dir: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// 可填寫的表單模板；`instantiate` 每次都回傳獨立的副本
pub trait FormTemplate: Send + Sync + Sized {
    type Document: FormDocument;

    fn from_bytes(bytes: &[u8]) -> Result<Self>;
    fn field_names(&self) -> &[String];
    fn instantiate(&self) -> Result<Self::Document>;
}

pub trait FormDocument: Send {
    fn set_text(&mut self, field: &str, value: &str) -> Result<()>;
    fn to_bytes(self) -> Result<Vec<u8>>;
}

pub trait ConfigProvider: Send + Sync {
    fn spreadsheet_path(&self) -> &str;
    fn template_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn sheet_name(&self) -> Option<&str>;
    fn group_column(&self) -> &str;
    fn name_column(&self) -> &str;
    fn fallback_name(&self) -> &str;
}

pub struct SourceData<T> {
    pub sheet: SheetData,
    pub template: T,
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Template: FormTemplate;

    fn validate(&self) -> Result<()>;
    async fn extract(&self) -> Result<SourceData<Self::Template>>;
    fn transform(&self, sheet: SheetData) -> Vec<RecordGroup>;
    async fn load(&self, groups: Vec<RecordGroup>, template: &Self::Template) -> GenerationResult;
}
