//! Backup artifact storage, the cached listing, and the item action contract.

pub mod cache;
pub mod item_action;
pub mod service;

pub use cache::{BackupCache, BackupSnapshot, CachedBackupService};
pub use item_action::{
    GroupResource, ItemAction, ResourceIdentifier, ResourceSelector, UnstructuredObject,
};
pub use service::{BackupGetter, BackupService, ObjectBackupService};
