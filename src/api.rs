// API client module: a small blocking HTTP client for the accounts API
// (login, profile), the exchange API (groups) and the maven repository
// (uploads). Calls are sequential; nothing here spawns work.

use crate::config::Config;
use crate::error::{PublishError, Result};
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::Path;
use tracing::debug;

#[cfg(test)]
use mockall::automock;

/// Bearer token issued by the login endpoint. Authenticated calls take it
/// as an argument, so none can be made before login succeeded.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        SessionToken(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// Login request payload.
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    access_token: String,
}

/// Response of `GET /api/me`. Only the fields the workflow reads are
/// modelled; the rest of the document is ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub user: User,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub contributor_of_organizations: Vec<Organization>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub group_id: String,
}

/// Remote operations used by the publish workflow.
#[cfg_attr(test, automock)]
pub trait ExchangeApi {
    fn login(&self, credentials: &Credentials) -> Result<SessionToken>;

    fn user_profile(&self, token: &SessionToken) -> Result<UserProfile>;

    fn groups(&self, token: &SessionToken, organization_id: &str) -> Result<Vec<Group>>;

    /// Stream the file at `path` as the body of a PUT to `url`.
    fn upload(&self, token: &SessionToken, url: &str, path: &Path) -> Result<()>;
}

/// `ExchangeApi` over HTTP, with base URIs taken from `Config`.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self> {
        // Uploads can run for minutes; the blocking client otherwise aborts
        // every request after 30 seconds.
        let client = Client::builder().timeout(None).build()?;
        Ok(ApiClient { client, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn authorized(&self, builder: RequestBuilder, token: &SessionToken) -> RequestBuilder {
        builder.header(AUTHORIZATION, token.bearer())
    }

    pub(crate) fn login_request(&self, credentials: &Credentials) -> RequestBuilder {
        let url = format!("{}/login", self.config.cs_site_api.base_uri);
        self.client
            .post(url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(credentials)
    }

    pub(crate) fn user_profile_request(&self, token: &SessionToken) -> RequestBuilder {
        let url = format!("{}/api/me", self.config.cs_site_api.base_uri);
        self.authorized(self.client.get(url), token)
    }

    pub(crate) fn groups_request(&self, token: &SessionToken, organization_id: &str) -> RequestBuilder {
        let url = format!(
            "{}/api/v1/organizations/{}/groups",
            self.config.exchange_api.base_uri, organization_id
        );
        self.authorized(self.client.get(url), token)
    }

    pub(crate) fn upload_request(&self, token: &SessionToken, url: &str, body: Body) -> RequestBuilder {
        self.authorized(self.client.put(url), token).body(body)
    }
}

impl ExchangeApi for ApiClient {
    fn login(&self, credentials: &Credentials) -> Result<SessionToken> {
        debug!(username = %credentials.username, "logging in");
        let res = self.login_request(credentials).send()?;
        let resp: LoginResponse = decode(check(res)?)?;
        Ok(SessionToken::new(resp.access_token))
    }

    fn user_profile(&self, token: &SessionToken) -> Result<UserProfile> {
        debug!("fetching user profile");
        let res = self.user_profile_request(token).send()?;
        decode(check(res)?)
    }

    fn groups(&self, token: &SessionToken, organization_id: &str) -> Result<Vec<Group>> {
        debug!(organization_id, "fetching groups");
        let res = self.groups_request(token, organization_id).send()?;
        decode(check(res)?)
    }

    fn upload(&self, token: &SessionToken, url: &str, path: &Path) -> Result<()> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        debug!(url, path = %path.display(), bytes = len, "uploading");
        let res = self.upload_request(token, url, Body::sized(file, len)).send()?;
        check(res)?;
        Ok(())
    }
}

/// Turn non-success statuses into a classified `PublishError`.
fn check(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    debug!(%status, body = %body, "request rejected");
    Err(PublishError::from_status(status, body))
}

fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let text = res.text()?;
    Ok(serde_json::from_str(&text)?)
}
