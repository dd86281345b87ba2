//! HTTP fetch adapter for the upstream game API.
//!
//! Wraps `reqwest` with the session-cookie relay, XML parsing into
//! [`XmlNode`], and the typed fetch-error taxonomy. All upstream endpoints
//! are cookie-authenticated GETs returning XML.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::upstream::xml::XmlNode;

/// Failure modes of one upstream fetch. Callers decide whether a failure
/// aborts the whole operation (schedule fetches) or skips one unit of work
/// (boxscore fetches inside the per-match loop).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned status {0}")]
    Status(StatusCode),
    #[error("upstream response was not valid XML: {0}")]
    InvalidXml(#[from] roxmltree::Error),
}

/// The upstream endpoints the analysis and batch paths consume.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// `schedule.aspx?teamid=&season=`
    async fn schedule(&self, team_id: &str, season: u32, session: &str)
        -> Result<XmlNode, FetchError>;

    /// `boxscore.aspx?matchid=`
    async fn boxscore(&self, match_id: &str, session: &str) -> Result<XmlNode, FetchError>;

    /// `player.aspx?playerid=`
    async fn player(&self, player_id: &str, session: &str) -> Result<XmlNode, FetchError>;
}

pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch one endpoint and parse the body as XML. The session cookie is
    /// forwarded only when non-empty.
    pub async fn fetch_xml(
        &self,
        path: &str,
        query: &[(&str, &str)],
        session: &str,
    ) -> Result<XmlNode, FetchError> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, path))
            .query(query);
        if !session.is_empty() {
            request = request.header(COOKIE, session);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = response.text().await?;
        Ok(XmlNode::parse(&body)?)
    }

    /// Authenticate against `login.aspx`. Returns the upstream session
    /// cookie pairs on success, `None` when the upstream rejects the
    /// credentials or issues no session cookie (the two are reported
    /// identically).
    pub async fn login(&self, login: &str, code: &str) -> Result<Option<String>, FetchError> {
        let url = format!(
            "{}/login.aspx?login={}&code={}",
            self.base_url,
            urlencoding::encode(login),
            urlencoding::encode(code),
        );

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let cookie_pairs = cookie_pairs(&response);
        let body = response.text().await?;

        // The upstream answers 200 even for bad credentials; success is
        // signalled by a <loggedIn> element in the body.
        if !body.contains("<loggedIn") {
            return Ok(None);
        }
        Ok(cookie_pairs.filter(|pairs| !pairs.is_empty()))
    }

    /// Invalidate an upstream session via `logout.aspx?session=`.
    pub async fn logout(&self, session: &str) -> Result<(), FetchError> {
        let response = self
            .http
            .get(format!("{}/logout.aspx", self.base_url))
            .query(&[("session", session)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        Ok(())
    }
}

/// Collect `name=value` pairs from the response's Set-Cookie headers,
/// dropping attributes like Path or HttpOnly.
fn cookie_pairs(response: &reqwest::Response) -> Option<String> {
    let pairs: Vec<String> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .map(|pair| pair.trim().to_string())
        .filter(|pair| !pair.is_empty())
        .collect();

    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[async_trait]
impl GameApi for UpstreamClient {
    async fn schedule(
        &self,
        team_id: &str,
        season: u32,
        session: &str,
    ) -> Result<XmlNode, FetchError> {
        self.fetch_xml(
            "schedule.aspx",
            &[("teamid", team_id), ("season", &season.to_string())],
            session,
        )
        .await
    }

    async fn boxscore(&self, match_id: &str, session: &str) -> Result<XmlNode, FetchError> {
        self.fetch_xml("boxscore.aspx", &[("matchid", match_id)], session)
            .await
    }

    async fn player(&self, player_id: &str, session: &str) -> Result<XmlNode, FetchError> {
        self.fetch_xml("player.aspx", &[("playerid", player_id)], session)
            .await
    }
}
