use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Location of the embedded SQLite file, relative to the working directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the database file. Not created by `connect()`.
    /// TOML: `store.data_dir`. Default: `data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Database file name inside `data_dir`.
    /// TOML: `store.db_file`. Default: `store.db`.
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_file: default_db_file(),
        }
    }
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>, db_file: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_file: db_file.into(),
        }
    }

    /// `<data_dir>/<db_file>`; relative paths resolve against the process cwd.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_db_file() -> String {
    "store.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_path_joins_dir_and_file() {
        let cfg = StoreConfig::new("/tmp/shop", "rates.db");
        assert_eq!(cfg.database_path(), PathBuf::from("/tmp/shop/rates.db"));
        assert_eq!(
            StoreConfig::default().database_path(),
            PathBuf::from("data/store.db")
        );
    }
}
