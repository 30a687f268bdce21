use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use serde::Deserialize;
use tracing::warn;

/// One operator record as stored in the credentials file.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorRecord {
    pub username: String,
    /// Argon2 hash in PHC string format
    pub password_hash: String,
}

#[derive(Debug, Deserialize)]
struct OperatorsFile {
    #[serde(default)]
    operators: Vec<OperatorRecord>,
}

/// Read-only directory of operators allowed to log in.
///
/// Loaded once at startup; the server never writes credentials. Lookups are
/// by exact username.
#[derive(Debug, Default)]
pub struct OperatorDirectory {
    records: HashMap<String, OperatorRecord>,
}

impl OperatorDirectory {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read operators file {path:?}"))?;
        let parsed: OperatorsFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse operators file {path:?}"))?;
        Ok(Self::from_records(parsed.operators))
    }

    pub fn from_records(records: Vec<OperatorRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.username.clone(), record))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check a username/password pair against the stored PHC hash.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable to the
    /// caller.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(record) = self.records.get(username) else {
            return false;
        };

        let parsed_hash = match PasswordHash::new(&record.password_hash) {
            Ok(hash) => hash,
            Err(err) => {
                warn!(username, error = %err, "operator record has an unparseable password hash");
                return false;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
    use std::io::Write;

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn directory_with(username: &str, password: &str) -> OperatorDirectory {
        OperatorDirectory::from_records(vec![OperatorRecord {
            username: username.to_owned(),
            password_hash: hash(password),
        }])
    }

    #[test]
    fn verify_accepts_the_stored_password() {
        let directory = directory_with("alice", "correct horse");
        assert!(directory.verify("alice", "correct horse"));
    }

    #[test]
    fn verify_rejects_wrong_password_and_unknown_user() {
        let directory = directory_with("alice", "correct horse");
        assert!(!directory.verify("alice", "battery staple"));
        assert!(!directory.verify("bob", "correct horse"));
    }

    #[test]
    fn verify_rejects_records_with_malformed_hashes() {
        let directory = OperatorDirectory::from_records(vec![OperatorRecord {
            username: "alice".to_owned(),
            password_hash: "not-a-phc-string".to_owned(),
        }]);
        assert!(!directory.verify("alice", "anything"));
    }

    #[test]
    fn load_parses_the_toml_operator_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[[operators]]\nusername = \"alice\"\npassword_hash = \"{}\"",
            hash("correct horse")
        )
        .unwrap();

        let directory = OperatorDirectory::load(file.path()).unwrap();
        assert_eq!(directory.len(), 1);
        assert!(directory.verify("alice", "correct horse"));
    }

    #[test]
    fn load_accepts_a_file_with_no_operators() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# no operators yet").unwrap();

        let directory = OperatorDirectory::load(file.path()).unwrap();
        assert!(directory.is_empty());
    }
}
