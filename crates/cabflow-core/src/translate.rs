//! Naming rules that map transformation-tool resources onto asset names.
//!
//! Two rules only: source resources get a fixed prefix on their asset key, and
//! the group name is a fixed positional segment of the resource's dotted path.
//! Reading resource properties out of a project manifest is the caller's job.

use serde::{Deserialize, Serialize};

use crate::id::AssetKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceProps {
    pub resource_type: String,
    pub name: String,
    /// Fully-qualified path segments, e.g. `["analytics", "marts", "trips"]`.
    #[serde(default)]
    pub fqn: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTranslator {
    pub source_prefix: String,
    pub group_segment: usize,
}

impl Default for NameTranslator {
    fn default() -> Self {
        Self {
            source_prefix: "taxi_".to_string(),
            group_segment: 1,
        }
    }
}

impl NameTranslator {
    pub fn asset_key(&self, props: &ResourceProps) -> AssetKey {
        if props.resource_type == "source" {
            AssetKey::new(format!("{}{}", self.source_prefix, props.name))
        } else {
            AssetKey::new(props.name.clone())
        }
    }

    pub fn group_name<'a>(&self, props: &'a ResourceProps) -> Option<&'a str> {
        props.fqn.get(self.group_segment).map(String::as_str)
    }
}
