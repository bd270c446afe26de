//! Object key layout for backup artifacts.
//!
//! Every backup `N` owns three objects under the `N/` prefix:
//!
//! | Role         | Key                 |
//! |--------------|---------------------|
//! | metadata     | `N/ark-backup.json` |
//! | data archive | `N/N.tar.gz`        |
//! | log          | `N/N.log.gz`        |
//!
//! The layout is shared with existing buckets and must not change. Names are
//! not validated here.

/// Delimiter used to discover backup names at the bucket root.
pub const PREFIX_DELIMITER: &str = "/";

/// File name of the metadata object inside a backup directory.
pub const METADATA_FILE_NAME: &str = "ark-backup.json";

/// Key of the metadata object for a backup.
pub fn metadata_key(backup_name: &str) -> String {
    format!("{}/{}", backup_name, METADATA_FILE_NAME)
}

/// Key of the data archive for a backup.
pub fn backup_key(backup_name: &str) -> String {
    format!("{}/{}.tar.gz", backup_name, backup_name)
}

/// Key of the (optional) log object for a backup.
pub fn log_key(backup_name: &str) -> String {
    format!("{}/{}.log.gz", backup_name, backup_name)
}

/// All three keys of a backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupKeys {
    pub metadata: String,
    pub backup: String,
    pub log: String,
}

impl BackupKeys {
    pub fn for_backup(backup_name: &str) -> Self {
        Self {
            metadata: metadata_key(backup_name),
            backup: backup_key(backup_name),
            log: log_key(backup_name),
        }
    }
}
