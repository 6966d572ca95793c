//! Brand domain list
//!
//! A line-oriented file with one registrable domain per line. It is loaded
//! once into a process-wide table before the first extraction and only read
//! afterwards.

use anyhow::{Result, anyhow, Context};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct BrandList {
    domains: HashSet<String>,
}

impl BrandList {
    /// Build from lines; entries are trimmed and blanks dropped
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        Self { domains }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read brand list: {}", path.display()))?;
        Ok(Self::from_lines(content.lines()))
    }

    /// Exact, case-sensitive match
    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(domain)
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

static BRANDS: OnceLock<Arc<BrandList>> = OnceLock::new();

/// Load the global brand list. A missing or unreadable file leaves the list
/// empty so `domain_in_brand` degrades to 0.
pub fn init(path: &Path) -> Result<()> {
    let list = match BrandList::load(path) {
        Ok(list) => {
            info!("Brand list initialized: {} domains loaded", list.len());
            list
        }
        Err(e) => {
            warn!("{:#} - domain_in_brand will always be 0", e);
            BrandList::default()
        }
    };

    BRANDS
        .set(Arc::new(list))
        .map_err(|_| anyhow!("Brand list already initialized"))
}

/// The global brand list, if `init` has run
pub fn get() -> Option<Arc<BrandList>> {
    BRANDS.get().cloned()
}
