//! Result files: one credential dump per enumerated host plus a host manifest.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use nullbind_common::models::credential::CredentialRecord;
use nullbind_common::network::target::{DEFAULT_LDAP_PORT, Target};
use tracing::info;

pub const MANIFEST_FILE: &str = "nullbind_hosts.lst";

/// `<host>.passwords.lst`, with the port appended when it is not 389.
pub fn dump_path(output_dir: &Path, target: &Target) -> PathBuf {
    let host: String = target
        .host
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let name = if target.port == DEFAULT_LDAP_PORT {
        format!("{host}.passwords.lst")
    } else {
        format!("{host}_{}.passwords.lst", target.port)
    };
    output_dir.join(name)
}

pub fn write_dump(
    output_dir: &Path,
    target: &Target,
    records: &[CredentialRecord],
) -> anyhow::Result<PathBuf> {
    let path = dump_path(output_dir, target);
    info!(host = %target.host, port = target.port, "Dumping passwords into {}", path.display());

    let contents: String = records
        .iter()
        .map(|record| record.dump_line() + "\n")
        .collect();
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

pub fn write_manifest<'a>(
    output_dir: &Path,
    targets: impl IntoIterator<Item = &'a Target>,
) -> anyhow::Result<PathBuf> {
    let path = output_dir.join(MANIFEST_FILE);
    let contents: String = targets
        .into_iter()
        .map(|target| format!("{target}\n"))
        .collect();
    fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}
