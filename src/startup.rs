// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Application startup helpers: build information and sensor platform setup.

use crate::client::MediaServerApi;
use crate::configuration::SensorSettings;
use crate::sensor::{Entity, LatestMediaSensor, resolve_categories};
use const_format::formatcp;
use log::{info, warn};
use std::collections::HashSet;
use std::rc::Rc;

/// Build information like timestamp, git hash, etc.
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
    include!(concat!(env!("OUT_DIR"), "/git_built.rs"));
}

/// Application version built from git version information.
pub const APP_VERSION: &str = formatcp!(
    "{}{}",
    match built_info::GIT_VERSION {
        Some(v) => v,
        None => formatcp!("{}-non-git", built_info::PKG_VERSION),
    },
    match built_info::GIT_DIRTY {
        Some(_) => "-dirty",
        None => "",
    }
);

/// Create one sensor entity per resolved media library.
///
/// Retrieves the library views of the given user, filters them to the supported collection
/// kinds and the optional include list, and groups them per kind if configured.
///
/// An unreachable server results in an empty sensor list, it is never an error.
pub async fn setup_sensors<C: MediaServerApi>(
    client: Rc<C>,
    user_id: &str,
    settings: &SensorSettings,
) -> Vec<LatestMediaSensor<C>> {
    let records = client.list_categories(user_id).await;
    let categories = resolve_categories(records, &settings.include, settings.group_libraries);

    if categories.is_empty() {
        warn!("No supported media libraries found for user {user_id}");
    }

    let mut entity_ids = HashSet::new();
    let mut sensors = Vec::with_capacity(categories.len());
    for category in categories {
        let mut sensor = LatestMediaSensor::new(client.clone(), category, settings.into());
        // library names with the same slug, e.g. `Kids Movies` and `Kids-Movies`
        if entity_ids.contains(sensor.entity_id()) {
            let base = sensor.entity_id().to_string();
            let mut n = 2;
            while entity_ids.contains(&format!("{base}_{n}")) {
                n += 1;
            }
            let unique = format!("{base}_{n}");
            warn!(
                "Duplicate entity id {base} for library {}, using {unique}",
                sensor.category().name
            );
            sensor = sensor.with_entity_id(unique);
        }
        entity_ids.insert(sensor.entity_id().to_string());
        info!("Created sensor {}", sensor.entity_id());
        sensors.push(sensor);
    }

    sensors
}
