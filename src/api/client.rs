use crate::api::models::{GroupSettings, NewNotice, Notice};
use log::debug;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client as HttpClient, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid base url {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base url {0} cannot carry a path")]
    CannotBeABase(String),

    #[error("invalid api key header: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status} from {endpoint}")]
    Status { status: StatusCode, endpoint: String },

    #[error("notice {0} not found")]
    NotFound(i64),

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// The one configured entry point for every notice-board backend call.
pub struct ApiClient {
    http: HttpClient,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, ApiError> {
        let base = Url::parse(base_url).map_err(|source| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiError::CannotBeABase(base_url.to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            let mut value = HeaderValue::from_str(key)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }
        let http = HttpClient::builder().default_headers(headers).build()?;
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::CannotBeABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn check(resp: Response) -> Result<Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(ApiError::Status {
                status,
                endpoint: resp.url().path().to_string(),
            })
        }
    }

    /// Reach the backend through the notice list endpoint and report the HTTP status.
    pub async fn ping(&self) -> Result<u16, ApiError> {
        let url = self.endpoint(&["notices"])?;
        let resp = self.http.get(url).send().await?;
        Ok(resp.status().as_u16())
    }

    pub async fn list_notices(&self) -> Result<Vec<Notice>, ApiError> {
        let url = self.endpoint(&["notices"])?;
        debug!("GET {}", url);
        let resp = Self::check(self.http.get(url).send().await?)?;
        let json: Value = resp.json().await?;
        let items = if json.is_array() {
            json
        } else if let Some(arr) = json.get("notices").filter(|v| v.is_array()) {
            arr.clone()
        } else if let Some(arr) = json.get("data").filter(|v| v.is_array()) {
            arr.clone()
        } else {
            return Err(ApiError::Decode("notice list is not an array".into()));
        };
        serde_json::from_value(items).map_err(|e| ApiError::Decode(e.to_string()))
    }

    pub async fn get_notice(&self, id: i64) -> Result<Notice, ApiError> {
        let url = self.endpoint(&["notices", &id.to_string()])?;
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id));
        }
        let json: Value = Self::check(resp)?.json().await?;
        if json.is_null() {
            return Err(ApiError::NotFound(id));
        }
        serde_json::from_value(json).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Post a notice. The created record is returned when the backend echoes one back.
    pub async fn create_notice(&self, body: &NewNotice) -> Result<Option<Notice>, ApiError> {
        let url = self.endpoint(&["notices"])?;
        debug!("POST {}", url);
        let resp = Self::check(self.http.post(url).json(body).send().await?)?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice::<Notice>(&bytes).ok())
    }

    pub async fn delete_notice(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&["notices", &id.to_string()]).await
    }

    pub async fn clear_all(&self) -> Result<(), ApiError> {
        self.delete(&["notices", "clear-all"]).await
    }

    pub async fn delete_group(&self, group: &str) -> Result<(), ApiError> {
        self.delete(&["notices", "group", group]).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ApiError> {
        let url = self.endpoint(segments)?;
        debug!("DELETE {}", url);
        Self::check(self.http.delete(url).send().await?)?;
        Ok(())
    }

    pub async fn official_groups(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint(&["notices", "settings", "groups"])?;
        debug!("GET {}", url);
        let resp = Self::check(self.http.get(url).send().await?)?;
        let json: Value = resp.json().await?;
        parse_group_list(&json).ok_or_else(|| {
            ApiError::Decode("group settings are neither a list nor a string".into())
        })
    }

    /// Replace the backend's official group list wholesale.
    pub async fn save_official_groups(&self, groups: &[String]) -> Result<(), ApiError> {
        let url = self.endpoint(&["notices", "settings", "groups"])?;
        debug!("POST {} ({} groups)", url, groups.len());
        let body = GroupSettings { groups: groups.to_vec() };
        Self::check(self.http.post(url).json(&body).send().await?)?;
        Ok(())
    }
}

/// Accepts `["a","b"]`, `"a, b"`, or either of those under a `groups` key.
pub fn parse_group_list(json: &Value) -> Option<Vec<String>> {
    let clean = |s: &str| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    };
    match json {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str())
                .filter_map(clean)
                .collect(),
        ),
        Value::String(joined) => Some(joined.split(',').filter_map(clean).collect()),
        Value::Null => Some(Vec::new()),
        Value::Object(map) => map.get("groups").and_then(parse_group_list),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Some("1234567890abcdef")).unwrap()
    }

    #[test]
    fn group_list_shapes() {
        let strings = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(parse_group_list(&json!(["A", " B ", ""])), Some(strings(&["A", "B"])));
        assert_eq!(
            parse_group_list(&json!("Chemistry, .Net Framework Project,")),
            Some(strings(&["Chemistry", ".Net Framework Project"]))
        );
        assert_eq!(parse_group_list(&json!({"groups": ["X"]})), Some(vec!["X".to_string()]));
        assert_eq!(parse_group_list(&json!(null)), Some(vec![]));
        assert_eq!(parse_group_list(&json!(42)), None);
    }

    #[test]
    fn rejects_relative_base_url() {
        assert!(matches!(
            ApiClient::new("localhost", None),
            Err(ApiError::InvalidBaseUrl { .. })
        ));
    }

    #[tokio::test]
    async fn lists_notices_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices"))
            .and(header("x-api-key", "1234567890abcdef"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "name": "A",
                    "message": "m",
                    "category": "General",
                    "groupName": "Chemistry",
                    "createdAt": "2024-01-01T00:00:00Z"
                },
                {"id": 2, "name": "B", "message": "n", "category": null, "createdAt": null}
            ])))
            .mount(&server)
            .await;

        let notices = client_for(&server).list_notices().await.unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[1].group_name, None);
        assert_eq!(notices[1].category, "");
    }

    #[tokio::test]
    async fn missing_notice_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/9"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).get_notice(9).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(9)));
    }

    #[tokio::test]
    async fn server_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notices/clear-all"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).clear_all().await.unwrap_err();
        match err {
            ApiError::Status { status, endpoint } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(endpoint, "/notices/clear-all");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn group_deletion_encodes_name() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/notices/group/Drama%20Club"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server).delete_group("Drama Club").await.unwrap();
    }

    #[tokio::test]
    async fn settings_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/notices/settings/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("Physics,Chemistry")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/notices/settings/groups"))
            .and(body_json(json!({"groups": ["Physics", "Chemistry", "Drama"]})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut groups = client.official_groups().await.unwrap();
        assert_eq!(groups, vec!["Physics", "Chemistry"]);
        groups.push("Drama".into());
        client.save_official_groups(&groups).await.unwrap();
    }

    #[tokio::test]
    async fn create_tolerates_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/notices"))
            .and(body_json(json!({
                "title": "T",
                "content": "C",
                "category": "General",
                "groupName": "All Groups"
            })))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let body = NewNotice {
            title: "T".into(),
            content: "C".into(),
            category: Some("General".into()),
            group_name: Some("All Groups".into()),
            approved_groups: None,
        };
        let created = client_for(&server).create_notice(&body).await.unwrap();
        assert!(created.is_none());
    }
}
