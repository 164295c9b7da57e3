// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Media library resolution: each resolved category becomes one sensor entity.

use crate::client::{CategoryRecord, CollectionKind};
use log::debug;
use std::collections::BTreeMap;

/// A single media library, or all libraries of the same collection kind if grouped.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Library identifiers. Exactly one if not grouped.
    pub ids: Vec<String>,
    /// Library name. The name of the first member library if grouped.
    pub name: String,
    pub kind: CollectionKind,
    pub grouped: bool,
}

impl Category {
    /// Name used for the sensor entity: the collection kind label if grouped, otherwise the
    /// library name.
    pub fn display_name(&self) -> &str {
        if self.grouped {
            self.kind.label()
        } else {
            &self.name
        }
    }
}

/// Filter and optionally group the library views of a user.
///
/// 1. Libraries with an unsupported collection type are dropped.
/// 2. If `include` isn't empty, only libraries with a listed name are kept.
/// 3. If `group` is set, one category per collection kind is created. Its ids are the union of
///    the member library ids, all other fields are taken from the first member. Grouped
///    categories are ordered by collection type, otherwise the server order is kept.
pub fn resolve_categories(
    records: Vec<CategoryRecord>,
    include: &[String],
    group: bool,
) -> Vec<Category> {
    let categories = records.into_iter().filter_map(|record| {
        let Some(kind) = record.kind() else {
            debug!(
                "Ignoring library {} with type {:?}",
                record.name, record.collection_type
            );
            return None;
        };
        if !include.is_empty() && !include.contains(&record.name) {
            debug!("Library {} is not included", record.name);
            return None;
        }
        Some(Category {
            ids: vec![record.id],
            name: record.name,
            kind,
            grouped: false,
        })
    });

    if !group {
        return categories.collect();
    }

    let mut groups: BTreeMap<CollectionKind, Category> = BTreeMap::new();
    for category in categories {
        match groups.get_mut(&category.kind) {
            Some(merged) => {
                for id in category.ids {
                    if !merged.ids.contains(&id) {
                        merged.ids.push(id);
                    }
                }
            }
            None => {
                groups.insert(
                    category.kind,
                    Category {
                        grouped: true,
                        ..category
                    },
                );
            }
        }
    }

    groups.into_values().collect()
}
