use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
/// Matches the MaxPageSize most directory servers ship with.
pub const DEFAULT_PAGE_SIZE: i32 = 1000;
pub const DEFAULT_CONCURRENCY: usize = 1;

#[derive(Clone, Debug)]
pub struct Config {
    /// Bound applied to the TCP connect and to every LDAP operation.
    pub timeout: Duration,
    /// Entries requested per page of a paged subtree search.
    pub page_size: i32,
    /// Number of targets scanned at the same time.
    pub concurrency: usize,
    /// Directory receiving per-host credential dumps and the host manifest.
    pub output_dir: PathBuf,
    pub quiet: u8,
    pub no_banner: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            output_dir: PathBuf::from("."),
            quiet: 0,
            no_banner: false,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout.is_zero() {
            return Err(ConfigError::Zero { field: "timeout" });
        }
        if self.page_size <= 0 {
            return Err(ConfigError::Zero { field: "page size" });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Zero { field: "concurrency" });
        }
        Ok(())
    }
}
