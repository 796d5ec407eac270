//! Process command - extract line items from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use tally_core::export::{format_money, table_to_json, write_table};
use tally_core::source::load_text;
use tally_core::{ConfiguredSummarizer, DocumentProcessor, ProcessedDocument, SourceKind, TableFormat};

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (text, PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip the remote summary
    #[arg(long)]
    no_summary: bool,

    /// Show line counters after extraction
    #[arg(long)]
    stats: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON document with summary and table
    Json,
    /// CSV table
    Csv,
    /// Plain text summary and table
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        self.table_format().extension()
    }

    fn table_format(&self) -> TableFormat {
        match self {
            OutputFormat::Json => TableFormat::Json,
            OutputFormat::Csv => TableFormat::Csv,
            OutputFormat::Text => TableFormat::Text,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(dir) = &args.model_dir {
        config.ocr.model_dir = dir.clone();
    }
    if args.no_summary {
        config.summary.enabled = false;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Reading document...");
    let source = {
        let input = args.input.clone();
        let config = config.clone();
        tokio::task::spawn_blocking(move || load_text(&input, &config)).await??
    };
    debug!("Loaded {} chars ({:?})", source.text.len(), source.kind);

    pb.set_message("Extracting line items...");
    let processor = DocumentProcessor::new(ConfiguredSummarizer::from_config(&config.summary));
    let document = processor.process(&source.text).await;

    pb.finish_and_clear();

    let output = render_document(
        &document,
        source.kind,
        args.format,
        &config.export.sheet_name,
    )?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    if args.stats {
        let s = document.stats;
        eprintln!();
        eprintln!(
            "{} {} lines: {} items, {} metadata, {} unmatched, {} malformed, {} noise",
            style("ℹ").blue(),
            s.candidate_lines,
            s.accepted,
            s.skipped_lines,
            s.unmatched_lines,
            s.malformed_lines,
            s.noise_rejected
        );
        eprintln!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            document.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Render a processed document in the requested format.
pub fn render_document(
    document: &ProcessedDocument,
    source: SourceKind,
    format: OutputFormat,
    sheet_name: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let mut value = table_to_json(&document.table, sheet_name)?;
            if let Some(obj) = value.as_object_mut() {
                obj.insert("summary".to_string(), document.summary.clone().into());
                obj.insert("source".to_string(), serde_json::to_value(source)?);
                obj.insert("stats".to_string(), serde_json::to_value(document.stats)?);
                obj.insert(
                    "processed_at".to_string(),
                    serde_json::to_value(document.processed_at)?,
                );
            }
            Ok(format!("{}\n", serde_json::to_string_pretty(&value)?))
        }
        OutputFormat::Csv => Ok(write_table(&document.table, TableFormat::Csv, sheet_name)?),
        OutputFormat::Text => {
            let mut output = String::new();
            output.push_str("Summary:\n");
            for line in document.summary.lines() {
                output.push_str(&format!("  {}\n", line));
            }
            output.push('\n');
            output.push_str(&write_table(&document.table, TableFormat::Text, sheet_name)?);
            output.push('\n');
            output.push_str(&format!(
                "Grand Total: {}\n",
                format_money(document.table.grand_total().net_amount)
            ));
            Ok(output)
        }
    }
}
