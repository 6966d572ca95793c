use clap::Parser;

use crate::export::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "urlfeatures")]
#[command(about = "Extract phishing-detection features from URLs")]
#[command(version)]
pub struct Cli {
    /// Create default configuration file at ./config/urlfeatures.toml
    #[arg(long)]
    pub init: bool,

    /// File with a list of URLs, one per line
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<String>,

    /// URL(s) to extract features from
    #[arg(short, long, value_name = "URL", num_args = 1..)]
    pub url: Vec<String>,

    /// File to write the results to (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,

    /// Number of URLs processed concurrently (default from config)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Output format: 'csv' (default) or 'json'
    #[arg(long, default_value = "csv")]
    pub format: String,

    /// Configuration file (defaults to ./config/urlfeatures.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,

    /// Brand domain list (overrides config)
    #[arg(long, value_name = "FILE")]
    pub brands: Option<String>,

    /// Verbose logging (use -v for per-URL results, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Export execution logs to a file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// Skip requesting external references (ratio_extRedirection and ratio_extErrors become 0)
    #[arg(long)]
    pub no_external_links: bool,
}

impl Cli {
    pub fn has_url_source(&self) -> bool {
        self.file.is_some() || !self.url.is_empty()
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        OutputFormat::parse(&self.format)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.init {
            return Ok(());
        }

        if !self.has_url_source() {
            return Err("A URL source is required (use --url or --file)".to_string());
        }

        if self.output_format().is_none() {
            return Err("Output format must be 'csv' or 'json'".to_string());
        }

        if self.threads == Some(0) {
            return Err("Number of threads must be a positive integer".to_string());
        }

        Ok(())
    }
}
