//! Credential material harvested from directory entries.

/// Placeholder written wherever an optional attribute was not returned.
pub const NOT_AVAILABLE: &str = "N/A";

/// An entry that carried a password attribute.
///
/// `common_name` and `surname` stay `None` when the server did not return
/// them. The placeholder is substituted only when the record is rendered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialRecord {
    pub distinguished_name: String,
    pub password: Vec<u8>,
    pub common_name: Option<String>,
    pub surname: Option<String>,
}

impl CredentialRecord {
    pub fn new(
        distinguished_name: impl Into<String>,
        password: impl Into<Vec<u8>>,
        common_name: Option<String>,
        surname: Option<String>,
    ) -> Self {
        Self {
            distinguished_name: distinguished_name.into(),
            password: password.into(),
            common_name,
            surname,
        }
    }

    /// Password bytes as text. Non UTF-8 bytes are replaced.
    pub fn password_lossy(&self) -> String {
        String::from_utf8_lossy(&self.password).into_owned()
    }

    pub fn common_name_or_placeholder(&self) -> &str {
        self.common_name.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn surname_or_placeholder(&self) -> &str {
        self.surname.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    /// `dn:password:cn:sn`, one line of a per-host dump file.
    pub fn dump_line(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.distinguished_name,
            self.password_lossy(),
            self.common_name_or_placeholder(),
            self.surname_or_placeholder()
        )
    }
}
