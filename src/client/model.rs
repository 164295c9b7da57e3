// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Emby REST API data structure definitions for JSON deserialization.
//!
//! Only the identifier of a media item is mandatory, all other fields are optional and must be
//! handled if missing.

use serde::Deserialize;

/// Response envelope of the `Views` and `Items` endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ItemsResponse<T> {
    #[serde(rename = "Items", default = "Vec::new")]
    pub items: Vec<T>,
}

/// Server side classification of a media library.
///
/// Only these collection kinds are supported, all other libraries are ignored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum CollectionKind {
    #[strum(serialize = "movies")]
    Movies,
    #[strum(serialize = "music")]
    Music,
    #[strum(serialize = "tvshows")]
    Shows,
}

impl CollectionKind {
    /// Display label of the collection kind.
    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::Movies => "Movies",
            CollectionKind::Music => "Music",
            CollectionKind::Shows => "TV Shows",
        }
    }
}

/// A media library view of a user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CategoryRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub collection_type: Option<String>,
}

impl CategoryRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, collection_type: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            collection_type: collection_type.map(|v| v.to_string()),
        }
    }

    /// Supported collection kind of this library, `None` for all other library types.
    pub fn kind(&self) -> Option<CollectionKind> {
        self.collection_type
            .as_deref()
            .and_then(|t| t.parse::<CollectionKind>().ok())
    }
}

/// Media item type tag. Unknown types are mapped to `Other`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum MediaType {
    Episode,
    Series,
    Movie,
    #[serde(rename = "MusicAlbum")]
    Album,
    Audio,
    #[default]
    #[serde(other)]
    Other,
}

/// Studio reference of a media item, only the name is used.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NameIdPair {
    #[serde(default)]
    pub name: String,
}

/// A single media item as returned by the `Items` endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MediaItem {
    pub id: String,
    #[serde(rename = "Type", default)]
    pub media_type: MediaType,
    pub name: Option<String>,
    pub series_name: Option<String>,
    pub overview: Option<String>,
    /// Season number of an episode.
    pub parent_index_number: Option<u32>,
    /// Episode number within the season.
    pub index_number: Option<u32>,
    /// Duration in 100 ns ticks.
    pub run_time_ticks: Option<i64>,
    pub community_rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub studios: Option<Vec<NameIdPair>>,
    pub artists: Option<Vec<String>>,
    pub album_artist: Option<String>,
    pub premiere_date: Option<String>,
    pub production_year: Option<i32>,
    pub date_created: Option<String>,
    pub parent_backdrop_item_id: Option<String>,
    /// Number of seasons of a series.
    pub child_count: Option<u32>,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            media_type,
            ..Default::default()
        }
    }
}

/// Image type for item image urls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ImageKind {
    Primary,
    Backdrop,
}

/// Sort items by creation timestamp, newest first. Items without timestamp are moved to the end.
///
/// Emby returns ISO 8601 UTC timestamps with a fixed format, which sort lexicographically.
pub fn sort_by_date_created(items: &mut [MediaItem]) {
    items.sort_by(|a, b| b.date_created.cmp(&a.date_created));
}
