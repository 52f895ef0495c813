//! Catalog matching.
//!
//! Two rules live here and they are deliberately not the same:
//!
//! - [`matches`] decides a single compliance column. Bidirectional substring
//!   containment, except the `visual studio` alias group which accepts any
//!   name containing `vs` or `visual studio`.
//! - [`is_allowed_anywhere`] decides whether a name is unauthorized. It
//!   approves any name containing `vs` or `visual studio` before looking at
//!   the catalog at all, so a name can be authorized without checking any
//!   column.

use crate::model::{CatalogEntry, NormalizedSoftwareName};

const VS_ALIAS_ENTRY: &str = "visual studio";
const VS_ALIASES: [&str; 2] = ["vs", "visual studio"];

fn mentions_visual_studio(name: &str) -> bool {
    VS_ALIASES.iter().any(|alias| name.contains(alias))
}

/// Default rule: either string contains the other (entry lower-cased).
fn contains_either_way(name: &str, entry: &CatalogEntry) -> bool {
    let entry = entry.label().to_lowercase();
    name.contains(&entry) || entry.contains(name)
}

/// Does this name satisfy this catalog entry's column?
pub fn matches(name: &NormalizedSoftwareName, entry: &CatalogEntry) -> bool {
    if entry.label().to_lowercase() == VS_ALIAS_ENTRY {
        return mentions_visual_studio(name.as_str());
    }
    contains_either_way(name.as_str(), entry)
}

/// Is this name approved by anything in the catalog (or the VS shortcut)?
pub fn is_allowed_anywhere(name: &NormalizedSoftwareName, catalog: &[CatalogEntry]) -> bool {
    let name = name.as_str();
    mentions_visual_studio(name) || catalog.iter().any(|entry| contains_either_way(name, entry))
}
