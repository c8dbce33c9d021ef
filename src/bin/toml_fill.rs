use clap::Parser;
use pdf_form_filler::app::mapping::{preview_inputs, resolve_mapping, InputPreview};
use pdf_form_filler::app::run::{execute, print_result, write_report, RunPlan};
use pdf_form_filler::core::grouping::group_and_sort;
use pdf_form_filler::core::ConfigProvider;
use pdf_form_filler::adapters::spreadsheet;
use pdf_form_filler::utils::{logger, validation::Validate};
use pdf_form_filler::{FillError, JobConfig, PdfTemplate};

#[derive(Parser)]
#[command(name = "toml-fill")]
#[command(about = "Fill PDF forms from a TOML job file")]
struct Args {
    /// Path to TOML job file
    #[arg(short, long, default_value = "fill-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show mapping and groups without writing any file
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    logger::init_logger(args.verbose, args.json_logs);

    tracing::info!("🚀 Starting TOML-based PDF form filler");
    tracing::info!("📁 Loading job from: {}", args.config);

    let config = match JobConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        exit_with(&e);
    }
    tracing::info!("✅ Job loaded and validated successfully");

    if let Err(e) = run(config, &args).await {
        exit_with(&e);
    }
    Ok(())
}

async fn run(config: JobConfig, args: &Args) -> Result<(), FillError> {
    let preview = preview_inputs::<PdfTemplate>(&config).await?;
    let mapping = resolve_mapping(&config.mapping, &preview, config.auto_map());

    display_job_summary(&config, &preview, &mapping);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No files will be written");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let plan = RunPlan {
        mapping,
        overrides: config.overrides.clone(),
        rules: config.rules.clone(),
        format: config.output.format,
        zip_filename: config.zip_filename().to_string(),
        monitor: args.monitor.unwrap_or_else(|| config.monitoring_enabled()),
    };
    let report = config.output.report.clone();

    let result = execute(config, plan).await?;
    print_result(&result);

    if let Some(path) = report {
        write_report(&path, &result).await?;
        println!("📝 Report saved to: {}", path);
    }
    Ok(())
}

fn display_job_summary(
    config: &JobConfig,
    preview: &InputPreview,
    mapping: &pdf_form_filler::core::FieldMapping,
) {
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    if let Some(description) = &config.job.description {
        println!("  Description: {}", description);
    }
    println!(
        "  Spreadsheet: {} (sheet '{}', {} records)",
        config.source.spreadsheet, preview.sheet_name, preview.record_count
    );
    println!(
        "  Template: {} ({} text fields)",
        config.source.template,
        preview.template_fields.len()
    );
    println!(
        "  Group by: {} / sort by: {}",
        config.grouping.group_column, config.grouping.name_column
    );
    println!("  Output: {} ({:?})", config.output.path, config.output.format);
    println!();

    println!("🔄 Field Mapping:");
    for (field, column) in mapping {
        let marker = if preview.headers.contains(column) { "" } else { "  ⚠️ column not found" };
        println!("  {} <- {}{}", field, column, marker);
    }
    for field in preview.unmapped_fields(mapping) {
        println!("  {} <- (unmapped)", field);
    }
    for (field, column) in &config.overrides {
        println!("  {} <- {} when value is '{}'", field, column, config.rules.other_sentinel);
    }
    println!();
}

async fn perform_dry_run(config: &JobConfig) -> Result<(), FillError> {
    let bytes = tokio::fs::read(config.spreadsheet_path()).await?;
    let workbook = spreadsheet::parse_workbook(&bytes, config.spreadsheet_path(), config.sheet_name())?;
    let groups = group_and_sort(
        workbook.sheet.records,
        config.group_column(),
        config.name_column(),
    );

    println!("🗂️ Groups ({}):", groups.len());
    for group in &groups {
        println!("  {} - {} records", group.name, group.records.len());
    }
    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
    Ok(())
}

fn exit_with(e: &FillError) -> ! {
    tracing::error!(
        "❌ PDF generation failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(e.exit_code().max(1));
}
