use crate::core::filename::DEFAULT_FALLBACK_NAME;
use crate::core::transform::TransformRules;
use crate::core::{ConfigProvider, FieldMapping, OverrideMapping};
use crate::utils::error::{FillError, Result};
use crate::utils::validation::{self, Validate, SPREADSHEET_EXTENSIONS, TEMPLATE_EXTENSIONS};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobInfo,
    pub source: SourceConfig,
    pub grouping: GroupingConfig,
    #[serde(default)]
    pub mapping: FieldMapping,
    #[serde(default)]
    pub overrides: OverrideMapping,
    #[serde(default)]
    pub rules: TransformRules,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInfo {
    pub name: String,
    pub description: Option<String>,
    /// 以自動比對結果補足 [mapping] 沒寫到的欄位
    pub auto_map: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub spreadsheet: String,
    pub template: String,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    pub group_column: String,
    pub name_column: String,
    pub fallback_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Directory,
    Zip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    #[serde(default)]
    pub format: OutputFormat,
    pub zip_filename: Option<String>,
    pub report: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

/// `--mapping` 檔案與 suggest_mapping 的輸出格式
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingFile {
    #[serde(default)]
    pub mapping: FieldMapping,
    #[serde(default, skip_serializing_if = "OverrideMapping::is_empty")]
    pub overrides: OverrideMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<TransformRules>,
}

impl MappingFile {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 對應表為空且沒開 `--auto-map` 時回傳 ConfigError，不碰任何輸入檔
    pub fn check(&self, auto_map: bool) -> Result<()> {
        validation::validate_mapping(&self.mapping, auto_map)
    }

    pub fn rules(&self) -> TransformRules {
        self.rules.clone().unwrap_or_default()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FillError::processing(format!("TOML output error: {}", e)))
    }
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    pub fn auto_map(&self) -> bool {
        self.job.auto_map.unwrap_or(false)
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn zip_filename(&self) -> &str {
        self.output.zip_filename.as_deref().unwrap_or("formularios.zip")
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;

        validation::validate_path("source.spreadsheet", &self.source.spreadsheet)?;
        validation::validate_file_extension(
            "source.spreadsheet",
            &self.source.spreadsheet,
            SPREADSHEET_EXTENSIONS,
        )?;
        validation::validate_path("source.template", &self.source.template)?;
        validation::validate_file_extension("source.template", &self.source.template, TEMPLATE_EXTENSIONS)?;

        validation::validate_non_empty_string("grouping.group_column", &self.grouping.group_column)?;
        validation::validate_non_empty_string("grouping.name_column", &self.grouping.name_column)?;
        validation::validate_fallback_pattern("grouping.fallback_name", self.fallback_name())?;

        validation::validate_path("output.path", &self.output.path)?;
        if self.output.format == OutputFormat::Zip {
            validation::validate_file_extension("output.zip_filename", self.zip_filename(), &["zip"])?;
        }

        validation::validate_mapping(&self.mapping, self.auto_map())?;

        for (field, column) in &self.overrides {
            validation::validate_non_empty_string(&format!("overrides.{}", field), column)?;
        }

        Ok(())
    }
}

/// 替換環境變數 (例如 ${SURVEY_DIR})，未定義的保留原樣
fn substitute_env_vars(content: &str) -> String {
    static ENV_VAR: OnceLock<Regex> = OnceLock::new();
    let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .into_owned()
}

impl ConfigProvider for JobConfig {
    fn spreadsheet_path(&self) -> &str {
        &self.source.spreadsheet
    }

    fn template_path(&self) -> &str {
        &self.source.template
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn sheet_name(&self) -> Option<&str> {
        self.source.sheet.as_deref()
    }

    fn group_column(&self) -> &str {
        &self.grouping.group_column
    }

    fn name_column(&self) -> &str {
        &self.grouping.name_column
    }

    fn fallback_name(&self) -> &str {
        self.grouping
            .fallback_name
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_NAME)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
