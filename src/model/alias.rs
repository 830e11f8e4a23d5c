//! Entity aliases
//!
//! An alias is a named, reusable entity filter stored in the document.
//! Resolution against live entities happens outside this crate; the
//! document only stores and edits the definition.

use serde::{Deserialize, Serialize};

/// Filter definition carried by an alias
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EntityAliasFilter {
    #[serde(rename = "type", default)]
    pub filter_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,

    #[serde(default)]
    pub resolve_multiple: bool,
}

/// A named entity filter, unique by display name within a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityAlias {
    pub id: String,
    pub alias: String,
    pub filter: EntityAliasFilter,
}

impl EntityAlias {
    pub fn new(alias: impl Into<String>, filter: EntityAliasFilter) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            alias: alias.into(),
            filter,
        }
    }
}
