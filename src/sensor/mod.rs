// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Latest media sensor entities.
//!
//! One sensor is created per resolved media library. The entity logic is independent of any home
//! automation framework: a host adapter only needs the [`Entity`] capabilities.

mod card;
mod category;

pub use card::*;
pub use category::*;

use crate::client::{MediaItem, MediaServerApi, sort_by_date_created};
use crate::configuration::SensorSettings;
use crate::errors::ServiceError;
use crate::util::slugify;
use log::{debug, error, warn};
use rust_fsm::*;
use serde_json::{Map, Value};
use std::rc::Rc;

/// Sensor status after a successful refresh.
pub const STATUS_ONLINE: &str = "Online";

/// Sensor status after a failed refresh. Only transport failures mark the host as unreachable.
pub fn failure_status(host: &str, error: &ServiceError) -> String {
    match error {
        ServiceError::ServiceUnavailable(_) => format!("{host} cannot be reached"),
        ServiceError::HttpStatus(code) => format!("{host} responded with HTTP status {code}"),
        ServiceError::SerializationError(_) => format!("{host} sent an invalid response"),
        ServiceError::ConfigurationError(_) => format!("Invalid configuration for {host}"),
    }
}

/// Entity capabilities required by a host adapter.
#[allow(async_fn_in_trait)] // single threaded actix runtime, futures don't need to be Send
pub trait Entity {
    type State;

    /// Unique entity identifier, e.g. `sensor.emby_latest_movies`.
    fn entity_id(&self) -> &str;

    fn name(&self) -> String;

    fn state(&self) -> Self::State;

    fn attributes(&self) -> Map<String, Value>;

    /// Update the entity state. Invoked by the host on a fixed interval.
    async fn refresh(&mut self) -> Result<(), ServiceError>;
}

state_machine! {
    derive(Debug)
    SensorMode(Stale)

    Stale(FetchCompleted) => Ready,
    Ready(FetchCompleted) => Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorOptions {
    pub max_items: u32,
    pub use_backdrop: bool,
}

impl From<&SensorSettings> for SensorOptions {
    fn from(settings: &SensorSettings) -> Self {
        Self {
            max_items: settings.max,
            use_backdrop: settings.use_backdrop,
        }
    }
}

/// Serializable entity state for host adapters.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SensorSnapshot {
    pub entity_id: String,
    pub name: String,
    pub friendly_name: String,
    /// Number of items, `None` if no data has been fetched yet.
    pub state: Option<usize>,
    pub status: Option<String>,
    pub attributes: Map<String, Value>,
}

/// Latest added media items of a library or a group of libraries.
pub struct LatestMediaSensor<C> {
    client: Rc<C>,
    category: Category,
    entity_id: String,
    options: SensorOptions,
    items: Vec<MediaItem>,
    status: Option<String>,
    machine: StateMachine<SensorMode>,
}

impl<C: MediaServerApi> LatestMediaSensor<C> {
    pub fn new(client: Rc<C>, category: Category, options: SensorOptions) -> Self {
        let entity_id = format!("sensor.emby_latest_{}", slugify(category.display_name()));
        Self {
            client,
            category,
            entity_id,
            options,
            items: Vec::new(),
            status: None,
            machine: StateMachine::new(),
        }
    }

    /// Replace the entity identifier derived from the category name.
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = entity_id.into();
        self
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn friendly_name(&self) -> String {
        format!("Emby Latest Media {}", self.category.display_name())
    }

    /// Connection status of the last refresh, `None` before the first refresh.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Items of the last refresh, newest first.
    pub fn items(&self) -> &[MediaItem] {
        &self.items
    }

    /// True once the first refresh completed, independent of its outcome.
    pub fn is_ready(&self) -> bool {
        matches!(self.machine.state(), SensorModeState::Ready)
    }

    /// Render the dashboard card of the current items.
    pub fn card(&self) -> Vec<CardEntry> {
        render_card(&self.items, self.options.use_backdrop, |id, kind| {
            self.client.image_url(id, kind)
        })
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            entity_id: self.entity_id.clone(),
            name: self.name(),
            friendly_name: self.friendly_name(),
            state: self.state(),
            status: self.status.clone(),
            attributes: self.attributes(),
        }
    }

    /// Retrieve the items of all libraries of the category.
    ///
    /// Fails only if no library could be retrieved. Items of grouped libraries are merged and
    /// sorted by creation timestamp.
    async fn fetch(&self) -> Result<Vec<MediaItem>, ServiceError> {
        let mut items = Vec::new();
        let mut last_error = None;
        let mut success = false;

        for id in &self.category.ids {
            match self.client.fetch_items(id, self.options.max_items).await {
                Ok(mut library_items) => {
                    success = true;
                    items.append(&mut library_items);
                }
                Err(e) => {
                    error!("[{}] Error retrieving library {id}: {e}", self.entity_id);
                    last_error = Some(e);
                }
            }
        }

        if let (false, Some(e)) = (success, last_error) {
            return Err(e);
        }
        if self.category.ids.len() > 1 {
            sort_by_date_created(&mut items);
        }

        Ok(items)
    }
}

impl<C: MediaServerApi> Entity for LatestMediaSensor<C> {
    type State = Option<usize>;

    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn name(&self) -> String {
        format!("Latest {} on Emby", self.category.display_name())
    }

    fn state(&self) -> Self::State {
        self.is_ready().then_some(self.items.len())
    }

    fn attributes(&self) -> Map<String, Value> {
        if !self.is_ready() {
            return Map::new();
        }
        card_attributes(&self.card())
    }

    async fn refresh(&mut self) -> Result<(), ServiceError> {
        let result = self.fetch().await;
        if let Err(e) = self.machine.consume(&SensorModeInput::FetchCompleted) {
            warn!("[{}] Invalid state transition: {e:?}", self.entity_id);
        }

        match result {
            Ok(items) => {
                debug!("[{}] Retrieved {} items", self.entity_id, items.len());
                self.items = items;
                self.status = Some(STATUS_ONLINE.to_string());
                Ok(())
            }
            Err(e) => {
                self.items.clear();
                self.status = Some(failure_status(self.client.host(), &e));
                Err(e)
            }
        }
    }
}
