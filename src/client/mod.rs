// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Emby media server REST API client.
//!
//! The client only issues plain GET requests: library views of a user, latest items of a library,
//! and image url construction. There are no retries and no caching, the next scheduled sensor
//! refresh is the only retry mechanism.

use crate::configuration::{ENV_TRACE_RESPONSES, EmbySettings};
use crate::errors::ServiceError;
use crate::util::bool_from_env;
use log::{debug, error, trace, warn};
use serde::de::DeserializeOwned;
use url::Url;

mod model;
#[cfg(test)]
pub(crate) mod test_support;

pub use model::*;

/// Request header for the API key of item requests.
pub const TOKEN_HEADER: &str = "X-Emby-Token";

/// Item types to include in the latest media lists.
pub const INCLUDE_ITEM_TYPES: [&str; 5] = ["Movie", "Series", "Episode", "MusicAlbum", "Audio"];

/// Additional item fields to retrieve for the card attributes.
pub const ITEM_FIELDS: [&str; 11] = [
    "Overview",
    "Genres",
    "Studios",
    "Artists",
    "CommunityRating",
    "RunTimeTicks",
    "ParentIndexNumber",
    "IndexNumber",
    "ProductionYear",
    "PremiereDate",
    "DateCreated",
];

/// Max accepted response body size.
const MAX_BODY_SIZE: usize = 8 * 1024 * 1024;

/// Media server operations required by the sensor entities.
///
/// The `fetch_*` methods report every failure, the `list_*` wrappers implement the silent-degrade
/// contract: failures are logged and an empty result is returned.
#[allow(async_fn_in_trait)] // single threaded actix runtime, futures don't need to be Send
pub trait MediaServerApi {
    /// Server host name for status messages.
    fn host(&self) -> &str;

    /// Retrieve all library views of the given user.
    async fn fetch_categories(&self, user_id: &str) -> Result<Vec<CategoryRecord>, ServiceError>;

    /// Retrieve the latest added items of a library, newest first.
    async fn fetch_items(
        &self,
        category_id: &str,
        max_items: u32,
    ) -> Result<Vec<MediaItem>, ServiceError>;

    /// Image url of an item. No network request is made.
    fn image_url(&self, item_id: &str, kind: ImageKind) -> String;

    /// Like [`fetch_categories`](Self::fetch_categories), but returns an empty list on error.
    async fn list_categories(&self, user_id: &str) -> Vec<CategoryRecord> {
        match self.fetch_categories(user_id).await {
            Ok(categories) => categories,
            Err(e) => {
                warn!("Host {} is not available: {e}", self.host());
                Vec::new()
            }
        }
    }

    /// Like [`fetch_items`](Self::fetch_items), but returns an empty list on error.
    async fn list_items(&self, category_id: &str, max_items: u32) -> Vec<MediaItem> {
        match self.fetch_items(category_id, max_items).await {
            Ok(items) => items,
            Err(e) => {
                error!("Error retrieving items of library {category_id}: {e}");
                Vec::new()
            }
        }
    }
}

/// Install the aws-lc-rs crypto provider as process-level default for rustls, if none is set yet.
///
/// Must be called before creating an http client. Repeated calls are no-ops.
pub fn install_crypto_provider() {
    if rustls::crypto::CryptoProvider::get_default().is_none() {
        // a concurrent installation is fine as well
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    }
}

/// Emby REST API client.
///
/// Creating the underlying http client is sufficient once per process, the same instance is shared
/// with all sensor entities.
pub struct EmbyClient {
    http: awc::Client,
    /// Server base url without path, e.g. `http://emby.local:8096/`
    base_url: Url,
    host: String,
    api_key: String,
    /// List single episodes instead of grouping them per series.
    episodes: bool,
    trace_responses: bool,
}

impl EmbyClient {
    pub fn new(settings: &EmbySettings, episodes: bool) -> Result<Self, ServiceError> {
        let base_url = settings.base_url()?;
        install_crypto_provider();
        let http = awc::ClientBuilder::new()
            .timeout(settings.request_timeout)
            .finish();

        Ok(Self {
            http,
            base_url,
            host: settings.host.clone(),
            api_key: settings.api_key().to_string(),
            episodes,
            trace_responses: bool_from_env(ENV_TRACE_RESPONSES),
        })
    }

    /// Library views url of a user. The api key is passed as query parameter.
    pub fn views_url(&self, user_id: &str) -> Result<Url, ServiceError> {
        let mut url = self.base_url.join(&format!("Users/{user_id}/Views"))?;
        url.query_pairs_mut().append_pair("api_key", &self.api_key);
        Ok(url)
    }

    /// Latest items url of a library.
    pub fn items_url(&self, category_id: &str, max_items: u32) -> Result<Url, ServiceError> {
        let mut url = self.base_url.join("emby/Items")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("ParentId", category_id)
                .append_pair("IncludeItemTypes", &INCLUDE_ITEM_TYPES.join(","))
                .append_pair("Fields", &ITEM_FIELDS.join(","))
                .append_pair("SortBy", "DateCreated")
                .append_pair("SortOrder", "Descending")
                .append_pair("Limit", &max_items.to_string());
            if self.episodes {
                query.append_pair("GroupItems", "False");
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &Url,
        with_token: bool,
    ) -> Result<T, ServiceError> {
        // don't log the query, it might contain the api key
        debug!("Making API call on {}", url.path());

        let mut request = self.http.get(url.as_str());
        if with_token {
            request = request.insert_header((TOKEN_HEADER, self.api_key.as_str()));
        }

        let mut response = request.send().await?;
        if !response.status().is_success() {
            return Err(ServiceError::HttpStatus(response.status().as_u16()));
        }

        let body = response.body().limit(MAX_BODY_SIZE).await?;
        if self.trace_responses {
            trace!("[{}] {}", url.path(), String::from_utf8_lossy(&body));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

impl MediaServerApi for EmbyClient {
    fn host(&self) -> &str {
        &self.host
    }

    async fn fetch_categories(&self, user_id: &str) -> Result<Vec<CategoryRecord>, ServiceError> {
        let url = self.views_url(user_id)?;
        let response: ItemsResponse<CategoryRecord> = self.get_json(&url, false).await?;
        debug!("Found {} library views", response.items.len());
        Ok(response.items)
    }

    async fn fetch_items(
        &self,
        category_id: &str,
        max_items: u32,
    ) -> Result<Vec<MediaItem>, ServiceError> {
        let url = self.items_url(category_id, max_items)?;
        let response: ItemsResponse<MediaItem> = self.get_json(&url, true).await?;

        // server side sorting and limit are not supported by all server versions
        let mut items = response.items;
        sort_by_date_created(&mut items);
        items.truncate(max_items as usize);

        Ok(items)
    }

    fn image_url(&self, item_id: &str, kind: ImageKind) -> String {
        format!(
            "{}Items/{item_id}/Images/{kind}?maxHeight=360&maxWidth=640&quality=90",
            self.base_url
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> EmbySettings {
        let mut settings = EmbySettings::new(
            server.address().ip().to_string(),
            server.address().port(),
            "secret",
        );
        settings.request_timeout = Duration::from_millis(500);
        settings
    }

    fn client() -> EmbyClient {
        EmbyClient::new(&EmbySettings::new("emby.local", 8096, "secret"), true).unwrap()
    }

    #[actix::test]
    async fn image_url_uses_fixed_size_and_quality() {
        let client = client();

        assert_eq!(
            "http://emby.local:8096/Items/123/Images/Primary?maxHeight=360&maxWidth=640&quality=90",
            client.image_url("123", ImageKind::Primary)
        );
        assert_eq!(
            "http://emby.local:8096/Items/123/Images/Backdrop?maxHeight=360&maxWidth=640&quality=90",
            client.image_url("123", ImageKind::Backdrop)
        );
    }

    #[actix::test]
    async fn image_url_with_ssl() {
        let mut settings = EmbySettings::new("emby.local", 8920, "secret");
        settings.ssl = true;
        let client = EmbyClient::new(&settings, true).unwrap();

        assert!(
            client
                .image_url("1", ImageKind::Primary)
                .starts_with("https://emby.local:8920/Items/1/")
        );
    }

    #[actix::test]
    async fn client_creation_installs_crypto_provider() {
        let mut settings = EmbySettings::new("emby.local", 8920, "secret");
        settings.ssl = true;

        let client = EmbyClient::new(&settings, true);

        assert!(client.is_ok());
        assert!(rustls::crypto::CryptoProvider::get_default().is_some());
        // idempotent
        install_crypto_provider();
    }

    #[actix::test]
    async fn views_url_contains_user_and_api_key() {
        let url = client().views_url("abc").unwrap();

        assert_eq!(
            "http://emby.local:8096/Users/abc/Views?api_key=secret",
            url.as_str()
        );
    }

    #[actix::test]
    async fn items_url_query() {
        let url = client().items_url("lib1", 7).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!("/emby/Items", url.path());
        assert!(query.contains(&("ParentId".into(), "lib1".into())));
        assert!(query.contains(&(
            "IncludeItemTypes".into(),
            "Movie,Series,Episode,MusicAlbum,Audio".into()
        )));
        assert!(query.contains(&("SortBy".into(), "DateCreated".into())));
        assert!(query.contains(&("SortOrder".into(), "Descending".into())));
        assert!(query.contains(&("Limit".into(), "7".into())));
        assert!(query.contains(&("GroupItems".into(), "False".into())));
        assert!(!query.iter().any(|(k, _)| k == "api_key"));
    }

    #[actix::test]
    async fn items_url_without_single_episodes() {
        let client = EmbyClient::new(&EmbySettings::new("emby.local", 8096, "secret"), false)
            .unwrap();
        let url = client.items_url("lib1", 5).unwrap();

        assert!(!url.query_pairs().any(|(k, _)| k == "GroupItems"));
    }

    #[actix::test]
    async fn fetch_categories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Users/user1/Views"))
            .and(query_param("api_key", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    { "Name": "Movies", "Id": "1", "CollectionType": "movies" },
                    { "Name": "Shows", "Id": "2", "CollectionType": "tvshows" }
                ],
                "TotalRecordCount": 2
            })))
            .expect(1)
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        let categories = client.list_categories("user1").await;

        assert_eq!(
            vec![
                CategoryRecord::new("1", "Movies", Some("movies")),
                CategoryRecord::new("2", "Shows", Some("tvshows"))
            ],
            categories
        );
    }

    #[actix::test]
    async fn fetch_categories_timeout_returns_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "Items": [] }))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        let result = client.fetch_categories("user1").await;
        assert!(
            matches!(result, Err(ServiceError::ServiceUnavailable(_))),
            "Expected timeout error: {result:?}"
        );
        assert!(client.list_categories("user1").await.is_empty());
    }

    #[actix::test]
    async fn fetch_categories_with_http_error_returns_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        assert_eq!(
            Err(ServiceError::HttpStatus(401)),
            client.fetch_categories("user1").await
        );
        assert!(client.list_categories("user1").await.is_empty());
    }

    #[actix::test]
    async fn fetch_items_sends_token_and_sorts_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .and(header(TOKEN_HEADER, "secret"))
            .and(query_param("ParentId", "lib1"))
            .and(query_param("Limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    { "Id": "a", "Type": "Movie", "DateCreated": "2024-01-01T00:00:00.0000000Z" },
                    { "Id": "b", "Type": "Movie", "DateCreated": "2024-05-01T00:00:00.0000000Z" },
                    { "Id": "c", "Type": "Movie", "DateCreated": "2024-03-01T00:00:00.0000000Z" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        let items = client.fetch_items("lib1", 2).await.unwrap();

        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(vec!["b", "c"], ids);
    }

    #[actix::test]
    async fn fetch_items_with_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/emby/Items"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Items": [] })))
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        assert_eq!(Ok(vec![]), client.fetch_items("lib1", 5).await);
    }

    #[actix::test]
    async fn fetch_items_with_server_error_returns_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        assert!(client.list_items("lib1", 5).await.is_empty());
    }

    #[actix::test]
    async fn fetch_items_with_invalid_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;
        let client = EmbyClient::new(&settings_for(&server), true).unwrap();

        let result = client.fetch_items("lib1", 5).await;
        assert!(
            matches!(result, Err(ServiceError::SerializationError(_))),
            "Expected serialization error: {result:?}"
        );
    }

    #[actix::test]
    async fn connection_refused_returns_empty_list() {
        // nothing listens on the discard port
        let mut settings = EmbySettings::new("127.0.0.1", 9, "secret");
        settings.request_timeout = Duration::from_millis(500);
        let client = EmbyClient::new(&settings, true).unwrap();

        assert!(client.list_categories("user1").await.is_empty());
        assert!(client.list_items("lib1", 5).await.is_empty());
    }
}
