use crate::batch::BatchSummary;
use crate::features::{COLUMNS, FeatureRecord};
use anyhow::{Context, Result};
use csv::Writer;
use std::fs::File;
use std::io::{self, Write};
use tracing::{debug, info};

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Header row then one row per record
pub fn write_csv<W: Write>(records: &[FeatureRecord], writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.write_record(record.row())?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(records: &[FeatureRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, records)?;
    writeln!(writer)?;
    Ok(())
}

/// Write to `output_path`, or stdout when it is `None`
pub fn export(records: &[FeatureRecord], format: OutputFormat, output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some(path) => {
            debug!("Exporting {} records as {:?} to {}", records.len(), format, path);
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            match format {
                OutputFormat::Csv => write_csv(records, file)?,
                OutputFormat::Json => write_json(records, file)?,
            }
            info!("Exported {} records to {}", records.len(), path);
        }
        None => {
            let stdout = io::stdout();
            let handle = stdout.lock();
            match format {
                OutputFormat::Csv => write_csv(records, handle)?,
                OutputFormat::Json => write_json(records, handle)?,
            }
        }
    }
    Ok(())
}

pub fn print_run_summary(summary: &BatchSummary) {
    eprintln!("\n=== Extraction Summary ===");
    eprintln!("URLs processed: {}", summary.total_urls);
    eprintln!("Features extracted: {}", summary.successful);
    eprintln!("Not accessible: {}", summary.failed);
    eprintln!("Started: {}", summary.started_at);
    eprintln!("Completed: {}", summary.completed_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tests::sample_record;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("html"), None);
    }

    #[test]
    fn test_csv_header_is_first_line() {
        let mut out = Vec::new();
        write_csv(&[sample_record()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        let row = lines.next().unwrap();
        assert!(row.starts_with("http://www.example.com/wp-login.php,35,15,"));
        assert_eq!(row.split(',').count(), COLUMNS.len());
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_csv_without_records_has_header_only() {
        let mut out = Vec::new();
        write_csv(&[], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", COLUMNS.join(",")));
    }

    #[test]
    fn test_json_array() {
        let mut out = Vec::new();
        write_json(&[sample_record(), sample_record()], &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        let records = value.as_array().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["ratio_intHyperlinks"], serde_json::json!(0.0));
        assert_eq!(records[0]["domain_age"], serde_json::json!(-2));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features.csv");
        export(&[sample_record()], OutputFormat::Csv, path.to_str()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
