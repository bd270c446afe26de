//! Resource transformation contract used by the backup pipeline.
//!
//! An [`ItemAction`] is offered every Kubernetes object the pipeline collects
//! that matches its [`ResourceSelector`]. It may rewrite the object and ask
//! for more resources to be included. Ordering, selection and dispatch live
//! in the pipeline; this crate only persists what the pipeline produces.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::record::BackupRecord;
use crate::Result;

/// Which objects an action wants to see.
///
/// Empty include lists mean "everything"; excludes win over includes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSelector {
    #[serde(default)]
    pub included_namespaces: Vec<String>,
    #[serde(default)]
    pub excluded_namespaces: Vec<String>,
    #[serde(default)]
    pub included_resources: Vec<String>,
    #[serde(default)]
    pub excluded_resources: Vec<String>,
    /// Label selector expression, e.g. `app=web,tier!=cache`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_selector: Option<String>,
}

/// A group/resource pair, e.g. `persistentvolumes` in the core group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupResource {
    pub group: String,
    pub resource: String,
}

impl fmt::Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// An additional object an action asks the pipeline to back up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    pub group_resource: GroupResource,
    /// Empty for cluster-scoped resources
    pub namespace: String,
    pub name: String,
}

/// A Kubernetes object in its generic JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnstructuredObject(pub Map<String, Value>);

impl UnstructuredObject {
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    fn metadata(&self) -> Option<&Map<String, Value>> {
        self.0.get("metadata").and_then(Value::as_object)
    }

    pub fn name(&self) -> Option<&str> {
        self.metadata()?.get("name")?.as_str()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.metadata()?.get("namespace")?.as_str()
    }

    pub fn kind(&self) -> Option<&str> {
        self.0.get("kind")?.as_str()
    }

    pub fn labels(&self) -> BTreeMap<String, String> {
        self.metadata()
            .and_then(|m| m.get("labels"))
            .and_then(Value::as_object)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Set `metadata.labels[key]`, creating the maps as needed.
    pub fn set_label(&mut self, key: &str, value: &str) {
        let metadata = self
            .0
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if !metadata.is_object() {
            *metadata = Value::Object(Map::new());
        }
        if let Value::Object(metadata) = metadata {
            let labels = metadata
                .entry("labels")
                .or_insert_with(|| Value::Object(Map::new()));
            if !labels.is_object() {
                *labels = Value::Object(Map::new());
            }
            if let Value::Object(labels) = labels {
                labels.insert(key.to_string(), Value::String(value.to_string()));
            }
        }
    }
}

/// A per-object transformation invoked by the backup pipeline.
pub trait ItemAction: Send + Sync {
    /// Objects this action applies to.
    fn applies_to(&self) -> Result<ResourceSelector>;

    /// Transform one object of `backup`.
    ///
    /// Returns the (possibly modified) object and any further resources the
    /// pipeline should include.
    fn execute(
        &self,
        item: UnstructuredObject,
        backup: &BackupRecord,
    ) -> Result<(UnstructuredObject, Vec<ResourceIdentifier>)>;
}
