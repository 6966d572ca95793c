use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,   // Progress bar and final summary only
    Summary = 1,  // Run progress and inaccessible URLs (default)
    Detailed = 2, // Per-URL results
    Debug = 3,    // Everything
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default `tracing` filter directive for this level. Inaccessible URLs
    /// are already reported by `RunLogger`, so library warnings need `-v`.
    pub fn tracing_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Silent | VerbosityLevel::Summary => "urlfeatures=error",
            VerbosityLevel::Detailed => "urlfeatures=warn",
            VerbosityLevel::Debug => "urlfeatures=debug",
        }
    }
}

/// User-facing run log with an optional progress bar over the URL list
#[derive(Clone)]
pub struct RunLogger {
    verbosity: VerbosityLevel,
    progress_bar: Arc<RwLock<Option<ProgressBar>>>,
    started_at: Arc<Mutex<Option<Instant>>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<String>,
}

impl RunLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: Arc::new(RwLock::new(None)),
            started_at: Arc::new(Mutex::new(None)),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: String) -> Self {
        Self {
            log_file_path: Some(log_file_path),
            ..Self::new(verbosity)
        }
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("WARN", message);
        }
    }

    /// Always shown
    pub fn error(&self, message: &str) {
        self.print_message("ERROR", message);
    }

    pub fn detail(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("INFO", message);
        }
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.print_message("DEBUG", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", Local::now().format("%H:%M:%S%.3f"), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Print above the progress bar so it stays pinned at the bottom.
        // `println` is a no-op on a hidden bar, `suspend` is not.
        if let Ok(guard) = self.progress_bar.read() {
            if let Some(pb) = guard.as_ref() {
                pb.suspend(|| eprintln!("{}", msg));
                return;
            }
        }

        eprintln!("{}", msg);
    }

    pub fn start_progress(&self, total_urls: u64) {
        let pb = ProgressBar::new(total_urls);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        pb.set_message("Extracting features...");

        if let Ok(mut guard) = self.progress_bar.write() {
            *guard = Some(pb);
        }
        if let Ok(mut started) = self.started_at.lock() {
            *started = Some(Instant::now());
        }
    }

    /// One URL finished; inaccessible URLs are reported as warnings
    pub fn url_finished(&self, url: &str, accessible: bool) {
        if accessible {
            self.detail(&format!("Features extracted for {}", url));
        } else {
            self.warn(&format!("URL {} not accessible", url));
        }

        if let Ok(guard) = self.progress_bar.read() {
            if let Some(pb) = guard.as_ref() {
                pb.set_message(url.to_string());
                pb.inc(1);
            }
        }
    }

    pub fn finish_progress(&self, final_message: &str) {
        if let Ok(mut guard) = self.progress_bar.write() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
        self.info(final_message);
    }

    /// Seconds since `start_progress`, if it ran
    pub fn elapsed_secs(&self) -> Option<f64> {
        self.started_at
            .lock()
            .ok()
            .and_then(|s| s.map(|t| t.elapsed().as_secs_f64()))
    }

    /// Write every buffered message to the log file
    pub fn export_logs(&self) -> anyhow::Result<()> {
        let Some(ref log_file_path) = self.log_file_path else {
            return Ok(());
        };

        if let Some(parent) = Path::new(log_file_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        if let Ok(buffer) = self.log_buffer.lock() {
            for entry in buffer.iter() {
                writeln!(file, "{}", entry)?;
            }
        }
        file.flush()?;
        Ok(())
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn log_count(&self) -> usize {
        self.log_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}
