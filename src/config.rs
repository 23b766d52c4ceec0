
use {
    crate::{
        report::{self, ReportLevel},
        utils::errorfmt::ErrorFmt,
    },
    serde::Deserialize,
    std::{
        io,
        path::{Path, PathBuf},
    },
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {}", .0.display())]
    Read(PathBuf, #[source] io::Error),
    #[error("Could not parse the configuration")]
    Parse(#[source] serde_json::Error),
}

/// Settings of the default report sink.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Reports below this level are not logged.
    pub log_level: ReportLevel,
    pub backtrace_on_critical: bool,
    /// Abort the process after a critical report has been logged.
    pub abort_on_critical: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            log_level: ReportLevel::Warning,
            backtrace_on_critical: false,
            abort_on_critical: false,
        }
    }
}

impl ReportConfig {
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Parse)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_json(&s)
    }

    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Using the default report configuration: {}", ErrorFmt(e));
                Self::default()
            }
        }
    }

    pub fn apply(&self) {
        log::debug!("Applying report configuration {:?}", self);
        report::configure(self);
    }
}
