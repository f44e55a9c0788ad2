//! Ownership categories for attachments.
//!
//! Every attachment row lives in exactly one of three tables, and the table
//! decides which blob container holds the payload. Private categories store
//! their objects in the tenant's container; the community category always
//! uses the shared `public` container.

use crate::errors::MigrationError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Name of the shared container holding community objects.
pub const PUBLIC_CONTAINER: &str = "public";

/// A logical ownership category for attachments.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub enum ResourceGroup {
    /// Attachments of a private project document or diagram.
    Project,

    /// Attachments of a private template.
    Template,

    /// Attachments of a template published to the community catalog.
    Community,
}

impl ResourceGroup {
    #[cfg(test)]
    pub const ALL: [ResourceGroup; 3] = [Self::Project, Self::Template, Self::Community];

    /// Attachment-metadata table holding rows for this group.
    pub fn table(self) -> &'static str {
        match self {
            Self::Project => "project_attachments",
            Self::Template => "template_attachments",
            Self::Community => "community_attachments",
        }
    }

    /// True only for the community group, whose blobs live in [`PUBLIC_CONTAINER`].
    pub fn is_public(self) -> bool {
        matches!(self, Self::Community)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Template => "template",
            Self::Community => "community",
        }
    }
}

impl FromStr for ResourceGroup {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project" => Ok(Self::Project),
            "template" => Ok(Self::Template),
            "community" => Ok(Self::Community),
            other => Err(MigrationError::UnknownResourceGroup(other.to_string())),
        }
    }
}

impl TryFrom<String> for ResourceGroup {
    type Error = MigrationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ResourceGroup> for String {
    fn from(group: ResourceGroup) -> Self {
        group.as_str().to_string()
    }
}

impl fmt::Display for ResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
