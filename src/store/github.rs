//! Content store backed by the GitHub repository contents API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL, EXPIRES, PRAGMA};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{ContentItem, ContentStore, PutResult};
use crate::config::{HttpConfig, RepositoryConfig};
use crate::session::{Credential, Identity, Session, SessionProvider};
use crate::{GitDropError, Result};

/// Media type requested from the API.
const API_MEDIA_TYPE: &str = "application/vnd.github+json";

/// API version header value.
const API_VERSION: &str = "2022-11-28";

#[derive(Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

#[derive(Serialize)]
struct PutBody<'a> {
    message: &'a str,
    content: &'a str,
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    message: &'a str,
    sha: &'a str,
    branch: &'a str,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// HTTP client for one repository branch.
pub struct GitHubStore {
    client: Client,
    api_base: Url,
    owner: String,
    repo: String,
    branch: String,
    session: Arc<dyn SessionProvider>,
}

impl GitHubStore {
    /// Create a store for the configured repository.
    ///
    /// Requests are authorized with whatever `session` supplies at call time.
    pub fn new(
        repository: &RepositoryConfig,
        http: &HttpConfig,
        session: Arc<dyn SessionProvider>,
    ) -> Result<Self> {
        let api_base = Url::parse(&repository.api_base_url)
            .map_err(|e| GitDropError::Config(format!("invalid API base URL: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(GitDropError::Config(format!(
                "API base URL cannot be a base: {api_base}"
            )));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(http.connect_timeout_secs))
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(http.user_agent.as_str())
            .build()
            .map_err(|e| GitDropError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base,
            owner: repository.owner.clone(),
            repo: repository.repo.clone(),
            branch: repository.branch.clone(),
            session,
        })
    }

    /// Resolve `credential` to an identity with `GET /user`.
    ///
    /// This is how a token is validated before it becomes a session.
    pub async fn authenticate(&self, credential: Credential) -> Result<Session> {
        let url = self.endpoint(["user"]);
        debug!("GET /user");

        let response = self
            .request(Method::GET, url, &credential)
            .send()
            .await?;
        let response = check_status(response, "user").await?;
        let identity: Identity = response.json().await?;

        Ok(Session {
            token: credential,
            identity,
        })
    }

    fn credential(&self) -> Result<Credential> {
        self.session
            .request_capability()
            .ok_or(GitDropError::AuthRequired)
    }

    /// API base joined with `segments`, each percent-encoded.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn contents_url(&self, path: &str) -> Url {
        let prefix = ["repos", self.owner.as_str(), self.repo.as_str(), "contents"];
        let segments = path.split('/').filter(|s| !s.is_empty());
        self.endpoint(prefix.into_iter().chain(segments))
    }

    fn request(&self, method: Method, url: Url, credential: &Credential) -> RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(credential.expose())
            .header(ACCEPT, API_MEDIA_TYPE)
            .header("X-GitHub-Api-Version", API_VERSION)
    }
}

/// Headers that keep every cache layer out of the way.
fn no_cache_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(EXPIRES, HeaderValue::from_static("0"));
    headers
}

/// Turn a non-success response into the matching error kind.
async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    Err(status_error(status, message, path))
}

/// Map an HTTP status to the error taxonomy.
fn status_error(status: StatusCode, message: String, path: &str) -> GitDropError {
    match status {
        StatusCode::UNAUTHORIZED => GitDropError::AuthRequired,
        StatusCode::NOT_FOUND => GitDropError::NotFound(path.to_string()),
        StatusCode::CONFLICT => GitDropError::Conflict(message),
        // The API reports a missing or mismatched sha as 422 as well.
        StatusCode::UNPROCESSABLE_ENTITY if message.to_lowercase().contains("sha") => {
            GitDropError::Conflict(message)
        }
        _ => GitDropError::Remote {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl ContentStore for GitHubStore {
    async fn get_contents(&self, path: &str) -> Result<Vec<ContentItem>> {
        let credential = self.credential()?;
        let mut url = self.contents_url(path);
        url.query_pairs_mut()
            .append_pair("ref", &self.branch)
            .append_pair("t", &chrono::Utc::now().timestamp_millis().to_string());
        debug!(path, "GET contents");

        let response = self
            .request(Method::GET, url, &credential)
            .headers(no_cache_headers())
            .send()
            .await?;
        let response = check_status(response, path).await?;

        match response.json::<ContentsResponse>().await? {
            ContentsResponse::Listing(items) => Ok(items),
            ContentsResponse::Single(item) => Ok(vec![item]),
        }
    }

    async fn put_object(
        &self,
        path: &str,
        content: &str,
        message: &str,
        version_token: Option<&str>,
    ) -> Result<PutResult> {
        let credential = self.credential()?;
        let url = self.contents_url(path);
        let body = PutBody {
            message,
            content,
            branch: &self.branch,
            sha: version_token,
        };
        debug!(path, update = version_token.is_some(), "PUT contents");

        let response = self
            .request(Method::PUT, url, &credential)
            .headers(no_cache_headers())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, path).await?;
        let data: PutResponse = response.json().await?;

        Ok(PutResult {
            version_token: data.content.sha,
        })
    }

    async fn delete_object(&self, path: &str, version_token: &str, message: &str) -> Result<()> {
        let credential = self.credential()?;
        let url = self.contents_url(path);
        let body = DeleteBody {
            message,
            sha: version_token,
            branch: &self.branch,
        };
        debug!(path, "DELETE contents");

        let response = self
            .request(Method::DELETE, url, &credential)
            .headers(no_cache_headers())
            .json(&body)
            .send()
            .await?;
        check_status(response, path).await?;

        Ok(())
    }
}
