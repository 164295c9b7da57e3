// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Media card attribute rendering.
//!
//! The rendered card is a list with a leading template record, followed by one display record per
//! media item. The template record defines the default display lines of the dashboard card, the
//! `$` placeholders refer to the keys of the item records.

use crate::client::{ImageKind, MediaItem, MediaType};
use crate::util::{join_first_three, strip_html};
use chrono::{DateTime, Datelike, Local, NaiveDate};
use log::error;
use serde::Serialize;
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;

pub const ATTRIBUTION: &str = "Data is provided by Emby.";
/// Summary text of items without an overview.
pub const NO_SUMMARY: &str = "No description available.";

const DEFAULT_ICON: &str = "mdi:arrow-down-bold";

/// Default display line templates of the dashboard card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemplateDefaults {
    pub title_default: &'static str,
    pub line1_default: &'static str,
    pub line2_default: &'static str,
    pub line3_default: &'static str,
    pub line4_default: &'static str,
    pub icon: &'static str,
}

pub const TV_DEFAULT: TemplateDefaults = TemplateDefaults {
    title_default: "$title",
    line1_default: "$release",
    line2_default: "$number",
    line3_default: "$episode",
    line4_default: "Runtime: $runtime",
    icon: DEFAULT_ICON,
};

pub const TV_ALTERNATE: TemplateDefaults = TemplateDefaults {
    title_default: "$title",
    line1_default: "$release • $number",
    line2_default: "Average Runtime: $runtime",
    line3_default: "$genres",
    line4_default: "$rating",
    icon: DEFAULT_ICON,
};

pub const MOVIE_DEFAULT: TemplateDefaults = TemplateDefaults {
    title_default: "$title",
    line1_default: "$release",
    line2_default: "Runtime: $runtime",
    line3_default: "$genres",
    line4_default: "$rating",
    icon: DEFAULT_ICON,
};

pub const MUSIC_DEFAULT: TemplateDefaults = TemplateDefaults {
    title_default: "$title",
    line1_default: "$studio • $release",
    line2_default: "Runtime: $runtime",
    line3_default: "$genres",
    line4_default: "",
    icon: DEFAULT_ICON,
};

pub const OTHER_DEFAULT: TemplateDefaults = TemplateDefaults {
    title_default: "$title",
    line1_default: "$release",
    line2_default: "Runtime: $runtime",
    line3_default: "$genres",
    line4_default: "$studio",
    icon: DEFAULT_ICON,
};

/// Display record of a single media item. The key set depends on the media type.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardItem {
    pub title: Option<String>,
    pub episode: Option<String>,
    pub airdate: Option<String>,
    pub release: Option<String>,
    pub number: Option<String>,
    pub runtime: Option<String>,
    pub genres: Option<String>,
    pub studio: Option<String>,
    pub rating: Option<String>,
    pub summary: Option<String>,
    pub poster: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CardEntry {
    Defaults(TemplateDefaults),
    Item(CardItem),
}

/// Rendering variant of a media card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Episodes,
    Series,
    Movies,
    Music,
    Other,
}

impl CardKind {
    /// Card variant for a list of media items.
    ///
    /// Only the first item is inspected: a mixed list, e.g. from grouped libraries, is rendered
    /// completely with the variant of the first item.
    pub fn for_items(items: &[MediaItem]) -> Self {
        match items.first().map(|item| item.media_type) {
            Some(MediaType::Episode) => CardKind::Episodes,
            Some(MediaType::Series) => CardKind::Series,
            Some(MediaType::Movie) => CardKind::Movies,
            Some(MediaType::Album) | Some(MediaType::Audio) => CardKind::Music,
            Some(MediaType::Other) | None => CardKind::Other,
        }
    }

    pub fn defaults(&self) -> TemplateDefaults {
        match self {
            CardKind::Episodes => TV_DEFAULT,
            CardKind::Series => TV_ALTERNATE,
            CardKind::Movies => MOVIE_DEFAULT,
            CardKind::Music => MUSIC_DEFAULT,
            CardKind::Other => OTHER_DEFAULT,
        }
    }
}

/// Render the media card of the given items.
///
/// # Arguments
///
/// * `items`: latest media items, newest first
/// * `use_backdrop`: use the backdrop image as poster instead of the primary image
/// * `image_url`: image url builder for an item id and image kind
pub fn render_card<F>(items: &[MediaItem], use_backdrop: bool, image_url: F) -> Vec<CardEntry>
where
    F: Fn(&str, ImageKind) -> String,
{
    let kind = CardKind::for_items(items);
    let image_kind = if use_backdrop {
        ImageKind::Backdrop
    } else {
        ImageKind::Primary
    };

    let mut card = Vec::with_capacity(items.len() + 1);
    card.push(CardEntry::Defaults(kind.defaults()));

    let render: fn(&MediaItem) -> CardItem = match kind {
        CardKind::Episodes => episode_item,
        CardKind::Series => series_item,
        CardKind::Movies => movie_item,
        CardKind::Music => music_item,
        CardKind::Other => return card,
    };

    for item in items {
        let mut card_item = render(item);
        // episode posters are taken from the series
        let poster_id = match kind {
            CardKind::Episodes => item.parent_backdrop_item_id.as_deref(),
            _ => Some(item.id.as_str()),
        };
        card_item.poster = poster_id.map(|id| image_url(id, image_kind));
        card.push(CardEntry::Item(card_item));
    }

    card
}

/// Entity attributes of a rendered card: the card as JSON string in `data` and the attribution.
pub fn card_attributes(card: &[CardEntry]) -> Map<String, Value> {
    let mut attributes = Map::with_capacity(2);
    match serde_json::to_string(card) {
        Ok(data) => {
            attributes.insert("data".into(), data.into());
        }
        Err(e) => error!("Error serializing card data: {e}"),
    }
    attributes.insert("attribution".into(), ATTRIBUTION.into());
    attributes
}

fn episode_item(item: &MediaItem) -> CardItem {
    CardItem {
        title: Some(item.series_name.clone().unwrap_or_default()),
        episode: Some(item.name.clone().unwrap_or_default()),
        airdate: Some(airdate(item)),
        release: Some(release_year(item)),
        runtime: Some(format_runtime(item.run_time_ticks)),
        number: Some(format_episode_number(
            item.parent_index_number,
            item.index_number,
        )),
        summary: Some(summary(item)),
        id: Some(item.id.clone()),
        ..Default::default()
    }
}

fn series_item(item: &MediaItem) -> CardItem {
    CardItem {
        title: Some(item.name.clone().unwrap_or_default()),
        airdate: Some(airdate(item)),
        release: Some(release_year(item)),
        number: Some(format!("{} season(s)", item.child_count.unwrap_or(1))),
        runtime: Some(format_runtime(item.run_time_ticks)),
        genres: Some(join_list(item.genres.as_deref())),
        rating: Some(format_rating(item.community_rating)),
        summary: Some(summary(item)),
        id: Some(item.id.clone()),
        ..Default::default()
    }
}

fn movie_item(item: &MediaItem) -> CardItem {
    let studios = item
        .studios
        .as_ref()
        .map(|studios| {
            studios
                .iter()
                .map(|s| s.name.as_str())
                .filter(|name| !name.is_empty())
                .collect::<Vec<_>>()
        });

    CardItem {
        title: Some(item.name.clone().unwrap_or_default()),
        release: Some(release_year(item)),
        runtime: Some(format_runtime(item.run_time_ticks)),
        genres: Some(join_list(item.genres.as_deref())),
        studio: Some(join_list(studios.as_deref())),
        rating: Some(format_rating(item.community_rating)),
        summary: Some(summary(item)),
        id: Some(item.id.clone()),
        ..Default::default()
    }
}

fn music_item(item: &MediaItem) -> CardItem {
    let artists = match item.artists.as_deref() {
        Some(artists) if !artists.is_empty() => join_first_three(artists),
        _ => item.album_artist.clone().unwrap_or_default(),
    };

    CardItem {
        title: Some(item.name.clone().unwrap_or_default()),
        studio: Some(artists),
        release: Some(release_year(item)),
        runtime: Some(format_runtime(item.run_time_ticks)),
        genres: Some(join_list(item.genres.as_deref())),
        summary: Some(summary(item)),
        id: Some(item.id.clone()),
        ..Default::default()
    }
}

fn join_list<S: AsRef<str>>(values: Option<&[S]>) -> String {
    values.map(join_first_three).unwrap_or_default()
}

/// Runtime in minutes from a duration in 100 ns ticks. Empty if not available.
pub fn format_runtime(ticks: Option<i64>) -> String {
    ticks
        .map(|ticks| {
            let micros = ticks as f64 / 10.0;
            let seconds = micros / 1_000_000.0;
            (seconds / 60.0).to_string()
        })
        .unwrap_or_default()
}

/// Star rating with one decimal place, e.g. `★ 8.7`. Empty if not available.
pub fn format_rating(rating: Option<f64>) -> String {
    rating.map(|r| format!("★ {r:.1}")).unwrap_or_default()
}

/// Season and episode number, e.g. `S01E05`, or `Season 2 Special` without episode number.
pub fn format_episode_number(season: Option<u32>, episode: Option<u32>) -> String {
    match (season, episode) {
        (Some(season), Some(episode)) => format!("S{season:02}E{episode:02}"),
        (Some(season), None) => format!("Season {season} Special"),
        (None, _) => String::new(),
    }
}

/// Release year from the premiere date, falling back to the production year.
pub fn release_year(item: &MediaItem) -> String {
    item.premiere_date
        .as_deref()
        .and_then(parse_year)
        .or(item.production_year)
        .map(|year| year.to_string())
        .unwrap_or_default()
}

fn parse_year(date: &str) -> Option<i32> {
    if let Ok(date) = DateTime::parse_from_rfc3339(date) {
        return Some(date.year());
    }
    date.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year())
}

fn airdate(item: &MediaItem) -> String {
    item.premiere_date
        .clone()
        .unwrap_or_else(|| Local::now().to_rfc3339())
}

fn summary(item: &MediaItem) -> String {
    let summary = item.overview.as_deref().map(strip_html).unwrap_or_default();
    if summary.is_empty() {
        NO_SUMMARY.to_string()
    } else {
        summary
    }
}
