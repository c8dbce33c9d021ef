use crate::config::toml_config::OutputFormat;
use crate::core::filename::DEFAULT_FALLBACK_NAME;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate, SPREADSHEET_EXTENSIONS, TEMPLATE_EXTENSIONS};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "pdf-form-filler")]
#[command(about = "Fill a PDF form template once per spreadsheet row")]
pub struct CliConfig {
    /// Spreadsheet with one record per row (xlsx, xls, ods, csv)
    #[arg(long)]
    pub spreadsheet: String,

    /// PDF template with fillable text fields
    #[arg(long)]
    pub template: String,

    /// Sheet to read (defaults to the first sheet)
    #[arg(long)]
    pub sheet: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    /// Column whose value decides the output sub-directory
    #[arg(long)]
    pub group_column: String,

    /// Column used to sort records and name the output files
    #[arg(long)]
    pub name_column: String,

    #[arg(long, default_value = DEFAULT_FALLBACK_NAME)]
    pub fallback_name: String,

    /// TOML file with [mapping] / [overrides] tables (see suggest_mapping)
    #[arg(long)]
    pub mapping: Option<String>,

    /// Seed the mapping by matching template fields to column names
    #[arg(long)]
    pub auto_map: bool,

    /// Write a single zip archive instead of a directory tree
    #[arg(long)]
    pub zip: bool,

    #[arg(long, default_value = "formularios.zip")]
    pub zip_filename: String,

    /// Write the run result (counts and errors) as JSON
    #[arg(long)]
    pub report: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

impl CliConfig {
    pub fn output_format(&self) -> OutputFormat {
        if self.zip {
            OutputFormat::Zip
        } else {
            OutputFormat::Directory
        }
    }
}

impl ConfigProvider for CliConfig {
    fn spreadsheet_path(&self) -> &str {
        &self.spreadsheet
    }

    fn template_path(&self) -> &str {
        &self.template
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    fn group_column(&self) -> &str {
        &self.group_column
    }

    fn name_column(&self) -> &str {
        &self.name_column
    }

    fn fallback_name(&self) -> &str {
        &self.fallback_name
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("spreadsheet", &self.spreadsheet)?;
        validation::validate_file_extension("spreadsheet", &self.spreadsheet, SPREADSHEET_EXTENSIONS)?;
        validation::validate_path("template", &self.template)?;
        validation::validate_file_extension("template", &self.template, TEMPLATE_EXTENSIONS)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_non_empty_string("group_column", &self.group_column)?;
        validation::validate_non_empty_string("name_column", &self.name_column)?;
        validation::validate_fallback_pattern("fallback_name", &self.fallback_name)?;
        if let Some(mapping) = &self.mapping {
            validation::validate_file_extension("mapping", mapping, &["toml"])?;
        } else if !self.auto_map {
            return Err(crate::utils::error::FillError::MissingConfigError {
                field: "--mapping <file.toml> or --auto-map".to_string(),
            });
        }
        if self.zip {
            validation::validate_file_extension("zip_filename", &self.zip_filename, &["zip"])?;
        }
        Ok(())
    }
}
