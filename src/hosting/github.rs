//! GitHub REST client (blocking)

use super::{Commit, CommitQuery, HostError, HostResult, HostingService, NewRelease, PublishedRelease};
use crate::core::config::Settings;
use crate::core::error::{ReleaseError, ReleaseResult};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

const CLIENT_AGENT: &str = concat!("simple-release/", env!("CARGO_PKG_VERSION"));
const MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

/// GitHub API client
pub struct GitHubClient {
  api_url: String,
  token: Option<String>,
  client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
  sha: String,
  commit: ApiCommitDetail,
  author: Option<ApiUser>,
}

#[derive(Debug, Deserialize)]
struct ApiCommitDetail {
  message: String,
  author: Option<ApiSignature>,
}

#[derive(Debug, Deserialize)]
struct ApiSignature {
  name: Option<String>,
  date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
  login: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
  message: Option<String>,
}

impl From<ApiCommit> for Commit {
  fn from(raw: ApiCommit) -> Self {
    let signature = raw.commit.author;
    let author_login = raw
      .author
      .map(|user| user.login)
      .or_else(|| signature.as_ref().and_then(|s| s.name.clone()))
      .unwrap_or_else(|| "unknown".to_string());
    let authored_at = signature.and_then(|s| s.date).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

    Commit {
      sha: raw.sha,
      author_login,
      message: raw.commit.message,
      authored_at,
    }
  }
}

impl GitHubClient {
  /// Build a client from run settings
  pub fn new(settings: &Settings) -> ReleaseResult<Self> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_AGENT));
    headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));

    let client = Client::builder()
      .default_headers(headers)
      .timeout(settings.timeout)
      .build()
      .map_err(|e| ReleaseError::message(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self {
      api_url: settings.api_url.clone(),
      token: settings.token.clone(),
      client,
    })
  }

  fn url(&self, owner: &str, repo: &str, resource: &str) -> String {
    format!("{}/repos/{}/{}/{}", self.api_url, owner, repo, resource)
  }

  fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
    match &self.token {
      Some(token) => request.bearer_auth(token),
      None => request,
    }
  }

  fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> HostResult<T> {
    let response = self
      .authorize(request)
      .send()
      .map_err(|e| HostError::Transport(e.to_string()))?;

    decode(response)
  }
}

fn decode<T: DeserializeOwned>(response: Response) -> HostResult<T> {
  let status = response.status();
  if !status.is_success() {
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
      .ok()
      .and_then(|body| body.message)
      .unwrap_or(text);
    return Err(HostError::Status {
      status: status.as_u16(),
      message,
    });
  }

  response.json::<T>().map_err(|e| HostError::Decode(e.to_string()))
}

impl HostingService for GitHubClient {
  fn list_commits(&self, owner: &str, repo: &str, query: &CommitQuery) -> HostResult<Vec<Commit>> {
    let mut params = vec![
      ("per_page", query.per_page.to_string()),
      ("page", query.page.to_string()),
    ];
    if let Some(since) = query.since {
      params.push(("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }

    debug!(owner, repo, page = query.page, "listing commits");
    let request = self.client.get(self.url(owner, repo, "commits")).query(&params);
    let commits: Vec<ApiCommit> = self.send(request)?;

    Ok(commits.into_iter().map(Commit::from).collect())
  }

  fn create_release(&self, owner: &str, repo: &str, release: &NewRelease) -> HostResult<PublishedRelease> {
    debug!(owner, repo, tag = %release.tag_name, "creating release");
    let request = self.client.post(self.url(owner, repo, "releases")).json(release);
    self.send(request)
  }
}
