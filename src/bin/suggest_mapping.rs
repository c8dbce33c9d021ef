use anyhow::Context;
use clap::Parser;
use pdf_form_filler::core::matcher::auto_match;
use pdf_form_filler::core::FormTemplate;
use pdf_form_filler::adapters::spreadsheet;
use pdf_form_filler::utils::logger;
use pdf_form_filler::{MappingFile, PdfTemplate};

#[derive(Parser)]
#[command(name = "suggest-mapping")]
#[command(about = "Print a [mapping] table matching template fields to spreadsheet columns")]
struct Args {
    #[arg(long)]
    spreadsheet: String,

    #[arg(long)]
    template: String,

    /// Sheet to read (defaults to the first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Write the mapping to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let bytes = tokio::fs::read(&args.spreadsheet)
        .await
        .with_context(|| format!("reading spreadsheet {}", args.spreadsheet))?;
    let workbook = spreadsheet::parse_workbook(&bytes, &args.spreadsheet, args.sheet.as_deref())
        .with_context(|| format!("parsing spreadsheet {}", args.spreadsheet))?;
    let template = PdfTemplate::from_file(&args.template)
        .await
        .with_context(|| format!("loading template {}", args.template))?;
    tracing::info!(
        "📋 Sheet '{}' has {} columns, template has {} text fields",
        workbook.sheet.name,
        workbook.sheet.headers.len(),
        template.field_names().len()
    );

    let mapping = auto_match(template.field_names(), &workbook.sheet.headers);
    let unmatched: Vec<&String> = template
        .field_names()
        .iter()
        .filter(|field| !mapping.contains_key(field.as_str()))
        .collect();

    let file = MappingFile {
        mapping,
        ..MappingFile::default()
    };
    let mut text = file.to_toml_string()?;
    if !unmatched.is_empty() {
        text.push_str("\n# Unmatched template fields:\n");
        for field in unmatched {
            text.push_str(&format!("# \"{}\" = \"\"\n", field));
        }
    }

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &text)
                .await
                .with_context(|| format!("writing {}", path))?;
            println!("✅ Mapping written to: {}", path);
        }
        None => print!("{}", text),
    }
    Ok(())
}
