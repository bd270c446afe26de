//! Backup records decoded from metadata objects.
//!
//! A metadata object is the JSON form of a versioned `Backup` resource
//! (`apiVersion: ark.heptio.com/v1`, `kind: Backup`). Only the fields this
//! layer and its callers read are modelled; unknown fields are ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// API group/version of backup records.
pub const BACKUP_API_VERSION: &str = "ark.heptio.com/v1";

/// Kind of backup records.
pub const BACKUP_KIND: &str = "Backup";

/// A decoded backup metadata manifest.
///
/// Identity is `metadata.name`, which is also the backup's key prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    pub api_version: String,

    pub kind: String,

    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: BackupSpec,

    #[serde(default)]
    pub status: BackupStatus,
}

impl BackupRecord {
    /// Create a record with the current API version and kind
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            api_version: BACKUP_API_VERSION.to_string(),
            kind: BACKUP_KIND.to_string(),
            metadata: ObjectMeta {
                name: name.into(),
                ..Default::default()
            },
            spec: BackupSpec::default(),
            status: BackupStatus::default(),
        }
    }

    /// Backup name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Serialize to the JSON stored as the metadata object
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Standard object metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
}

/// What a backup was asked to capture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSpec {
    #[serde(default)]
    pub included_namespaces: Vec<String>,

    #[serde(default)]
    pub excluded_namespaces: Vec<String>,

    #[serde(default)]
    pub included_resources: Vec<String>,

    #[serde(default)]
    pub excluded_resources: Vec<String>,

    /// Label selector in its serialized form (e.g. `{"matchLabels": {...}}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_volumes: Option<bool>,

    /// Retention as a duration string (e.g. `720h0m0s`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_cluster_resources: Option<bool>,
}

/// Observed state of a backup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupStatus {
    /// Backup format version
    #[serde(default)]
    pub version: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,

    #[serde(default)]
    pub phase: BackupPhase,

    #[serde(default)]
    pub validation_errors: Vec<String>,
}

/// Lifecycle phase of a backup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackupPhase {
    #[default]
    #[serde(rename = "")]
    Unknown,
    New,
    FailedValidation,
    InProgress,
    Completed,
    Failed,
    Deleting,
}

impl BackupPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupPhase::Unknown => "",
            BackupPhase::New => "New",
            BackupPhase::FailedValidation => "FailedValidation",
            BackupPhase::InProgress => "InProgress",
            BackupPhase::Completed => "Completed",
            BackupPhase::Failed => "Failed",
            BackupPhase::Deleting => "Deleting",
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypeMeta {
    #[serde(default)]
    api_version: String,
    #[serde(default)]
    kind: String,
}

/// Decode a metadata payload fetched from `bucket`/`key`.
///
/// The payload must be a `Backup` of the supported API version; anything else
/// is an [`Error::Decode`] naming the bucket and key.
pub fn decode_backup(bucket: &str, key: &str, data: &[u8]) -> Result<BackupRecord> {
    let decode_err = |message: String| Error::Decode {
        bucket: bucket.to_string(),
        key: key.to_string(),
        message,
    };

    let type_meta: TypeMeta =
        serde_json::from_slice(data).map_err(|e| decode_err(format!("unexpected payload: {}", e)))?;

    if type_meta.api_version != BACKUP_API_VERSION || type_meta.kind != BACKUP_KIND {
        return Err(decode_err(format!(
            "unexpected type for {}/{}: {}, Kind={}",
            bucket, key, type_meta.api_version, type_meta.kind
        )));
    }

    serde_json::from_slice(data).map_err(|e| decode_err(format!("unexpected payload: {}", e)))
}
