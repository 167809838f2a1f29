use crate::buffer::CircularBuffer;
use crate::capacity;
use crate::policy::OverwritePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub buffer: BufferConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Requested capacity; rounded up to a power of two. <= 0 selects the built-in default.
    pub capacity: i64,
    /// "overwrite" (evict oldest) or "ignore" (drop incoming) when full
    pub policy: OverwritePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Placed between items in listings
    pub separator: String,
    /// Number of most recent values drawn in the report sparkline
    pub spark_width: usize,
}

// ── Defaults ─────────────────────────────────────────────────────────

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: capacity::DEFAULT_CAPACITY as i64, policy: OverwritePolicy::default() }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { separator: ", ".into(), spark_width: 32 }
    }
}

impl BufferConfig {
    pub fn effective_capacity(&self) -> usize {
        capacity::from_signed(self.capacity)
    }

    /// Buffer sized and configured from this section. A capacity the
    /// allocator cannot provide is an error, not an abort.
    pub fn build<T>(&self) -> Result<CircularBuffer<T>> {
        let buf = CircularBuffer::try_with_policy(self.effective_capacity(), self.policy)?;
        Ok(buf)
    }
}

// ── Load / Save ───────────────────────────────────────────────────────

impl Config {
    /// Config from the user's config dir. A missing file is created with the
    /// defaults (best effort); an unreadable one is reported and ignored.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Some(p) => p,
            None    => return Config::default(),
        };
        if !path.exists() {
            if let Err(e) = Self::write_defaults(&path) {
                debug!(path = %path.display(), error = %e, "could not write default config");
            }
            return Config::default();
        }
        match Self::load_from(&path) {
            Ok(c)  => c,
            Err(e) => {
                let reason = format!("{:#}", e);
                warn!(path = %path.display(), error = %reason, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    /// Strict load of an explicit file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let cfg: Config = toml::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(cfg)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("circbuf").join("circbuf.toml"))
    }

    pub fn write_defaults(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = toml::to_string_pretty(&Config::default())?;
        fs::write(path, format!("# circbuf configuration\n# Generated on first run, edit freely\n\n{}", text))?;
        Ok(())
    }
}
