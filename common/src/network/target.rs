//! # Scan Target Model
//!
//! Defines the directory servers a scan runs against.
//!
//! A target is a `host:port` pair and can come from:
//! * A single argument (e.g., `dc1.example.com`, `10.0.0.5:636`, `[::1]:389`).
//! * A line-oriented host file with one `host:port` entry per line.

use std::fmt;
use std::io::BufRead;
use std::str::FromStr;

use tracing::warn;

use crate::error::TargetError;

/// Port used when a target does not name one.
pub const DEFAULT_LDAP_PORT: u16 = 389;

/// A single directory server to be probed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The `ldap://` URL for this target. IPv6 literals get bracketed.
    pub fn url(&self) -> String {
        if self.host.contains(':') {
            format!("ldap://[{}]:{}", self.host, self.port)
        } else {
            format!("ldap://{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    /// Parses a string into a `Target`.
    ///
    /// Supported formats:
    /// * **Host**: "dc1.example.com" (port defaults to 389).
    /// * **Host and port**: "dc1.example.com:3268".
    /// * **Bracketed IPv6**: "[fe80::1]:389" or "[fe80::1]".
    /// * **Bare IPv6**: "::1" (port defaults to 389).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        if let Some(rest) = s.strip_prefix('[') {
            return parse_bracketed(rest, s);
        }

        match s.matches(':').count() {
            0 => Ok(Target::new(s, DEFAULT_LDAP_PORT)),
            1 => {
                let (host, port) = s.split_once(':').ok_or(TargetError::Empty)?;
                parse_host_port(host, port)
            }
            _ => Ok(Target::new(s, DEFAULT_LDAP_PORT)),
        }
    }
}

fn parse_bracketed(rest: &str, original: &str) -> Result<Target, TargetError> {
    let Some((host, tail)) = rest.split_once(']') else {
        return Err(TargetError::Malformed(original.to_string()));
    };
    if tail.is_empty() {
        return Ok(Target::new(host, DEFAULT_LDAP_PORT));
    }
    match tail.strip_prefix(':') {
        Some(port) => parse_host_port(host, port),
        None => Err(TargetError::Malformed(original.to_string())),
    }
}

fn parse_host_port(host: &str, port: &str) -> Result<Target, TargetError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(TargetError::Empty);
    }
    let port = port
        .trim()
        .parse::<u16>()
        .map_err(|_| TargetError::InvalidPort(port.to_string()))?;
    if port == 0 {
        return Err(TargetError::InvalidPort(port.to_string()));
    }
    Ok(Target::new(host, port))
}

/// Reads `host:port` entries from a host file.
///
/// Blank lines and `#` comments are ignored. Lines without a `:` separator
/// and lines whose port does not parse are skipped with a warning; they never
/// abort the batch.
pub fn load_targets<R: BufRead>(reader: R) -> std::io::Result<Vec<Target>> {
    let mut targets = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((host, port)) = line.rsplit_once(':') else {
            warn!(line = idx + 1, entry = line, "Skipping host file entry without a port separator");
            continue;
        };

        let host = host.trim_start_matches('[').trim_end_matches(']');
        match parse_host_port(host, port) {
            Ok(target) => targets.push(target),
            Err(e) => warn!(line = idx + 1, entry = line, "Skipping host file entry: {e}"),
        }
    }

    Ok(targets)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
