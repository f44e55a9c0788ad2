//! Attachment ownership records and the containers their payloads live in.

use super::resource_group::{PUBLIC_CONTAINER, ResourceGroup};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A document, diagram or template instance that may own attachments.
///
/// The caller owns its lifetime; migrations only create attachment rows
/// beneath it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DocumentRef {
    pub group: ResourceGroup,
    pub owner_id: String,
}

impl DocumentRef {
    pub fn new(group: ResourceGroup, owner_id: impl Into<String>) -> Self {
        Self {
            group,
            owner_id: owner_id.into(),
        }
    }
}

/// One physical file linked to one owning document.
///
/// `(owner_id, filename)` is unique within a group's table. Rows are never
/// updated once written.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
pub struct AttachmentRow {
    pub tenant_id: String,
    pub owner_id: String,
    pub container_id: String,
    pub filename: String,
}

impl AttachmentRow {
    /// Column names in the order [`AttachmentRow::into_values`] yields them.
    pub const COLUMNS: [&'static str; 4] = ["tenant_id", "owner_id", "container_id", "filename"];

    pub fn into_values(self) -> Vec<String> {
        vec![self.tenant_id, self.owner_id, self.container_id, self.filename]
    }
}

/// Blob container identifier: a tenant's private container or the shared one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Public,
    Tenant(String),
}

impl ContainerId {
    /// Container holding blobs of `group` for a tenant whose private
    /// container is `tenant_container`.
    pub fn for_group(group: ResourceGroup, tenant_container: &str) -> Self {
        if group.is_public() {
            Self::Public
        } else {
            Self::Tenant(tenant_container.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Public => PUBLIC_CONTAINER,
            Self::Tenant(id) => id,
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
