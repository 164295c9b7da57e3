// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! In-memory media server for unit tests.

use crate::client::{CategoryRecord, ImageKind, MediaItem, MediaServerApi};
use crate::errors::ServiceError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct FakeServer {
    categories: Vec<CategoryRecord>,
    items: HashMap<String, Vec<MediaItem>>,
    /// Libraries failing with the given error.
    failing: HashMap<String, ServiceError>,
    unreachable: Cell<bool>,
    /// Library ids of all item requests.
    pub requests: RefCell<Vec<String>>,
}

impl FakeServer {
    pub fn with_categories(categories: Vec<CategoryRecord>) -> Self {
        Self {
            categories,
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: Cell::new(true),
            ..Default::default()
        }
    }

    pub fn with_items(mut self, category_id: &str, items: Vec<MediaItem>) -> Self {
        self.items.insert(category_id.to_string(), items);
        self
    }

    pub fn with_unreachable_library(self, category_id: &str) -> Self {
        self.with_failing_library(
            category_id,
            ServiceError::ServiceUnavailable("connection refused".into()),
        )
    }

    pub fn with_failing_library(mut self, category_id: &str, error: ServiceError) -> Self {
        self.failing.insert(category_id.to_string(), error);
        self
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.set(unreachable);
    }
}

impl MediaServerApi for FakeServer {
    fn host(&self) -> &str {
        "emby.test"
    }

    async fn fetch_categories(&self, _user_id: &str) -> Result<Vec<CategoryRecord>, ServiceError> {
        if self.unreachable.get() {
            return Err(ServiceError::ServiceUnavailable("connection refused".into()));
        }
        Ok(self.categories.clone())
    }

    async fn fetch_items(
        &self,
        category_id: &str,
        max_items: u32,
    ) -> Result<Vec<MediaItem>, ServiceError> {
        self.requests.borrow_mut().push(category_id.to_string());
        if self.unreachable.get() {
            return Err(ServiceError::ServiceUnavailable("connection refused".into()));
        }
        if let Some(error) = self.failing.get(category_id) {
            return Err(error.clone());
        }
        let mut items = self.items.get(category_id).cloned().unwrap_or_default();
        items.truncate(max_items as usize);
        Ok(items)
    }

    fn image_url(&self, item_id: &str, kind: ImageKind) -> String {
        format!("http://emby.test/Items/{item_id}/Images/{kind}")
    }
}
