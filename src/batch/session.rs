//! Authenticated upstream session for the batch binaries.
//!
//! Unlike the web path, which relays the browser's session cookie, the
//! batch binaries own their session: they log in with credentials from the
//! environment, count queries, and re-authenticate after the configured
//! budget (the upstream invalidates busy sessions). A `governor` rate
//! limiter spaces the requests out.

use std::num::NonZeroU32;

use anyhow::{bail, Context, Result};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::config::{AppConfig, Secrets};
use crate::upstream::{GameApi, UpstreamClient, XmlNode};

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct BatchSession {
    client: UpstreamClient,
    login: String,
    code: SecretString,
    session: String,
    query_count: u32,
    reauth_limit: u32,
    limiter: Limiter,
}

impl BatchSession {
    /// Log in with `UPSTREAM_LOGIN` / `UPSTREAM_CODE` from the environment.
    pub async fn open(config: &AppConfig, secrets: Secrets) -> Result<Self> {
        let (Some(login), Some(code)) = (secrets.upstream_login, secrets.upstream_code) else {
            bail!("UPSTREAM_LOGIN and UPSTREAM_CODE must be set");
        };

        let per_second = NonZeroU32::new(config.batch.requests_per_second.max(1))
            .expect("max(1) is non-zero");
        let mut session = Self {
            client: UpstreamClient::new(&config.upstream)?,
            login,
            code,
            session: String::new(),
            query_count: 0,
            reauth_limit: config.batch.reauth_query_limit,
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
        };
        session.authenticate().await?;
        Ok(session)
    }

    async fn authenticate(&mut self) -> Result<()> {
        let cookie = self
            .client
            .login(&self.login, self.code.expose_secret())
            .await
            .context("Upstream login request failed")?;
        match cookie {
            Some(pairs) => {
                info!("Upstream login successful");
                self.session = pairs;
                self.query_count = 0;
                Ok(())
            }
            None => bail!("Upstream login rejected"),
        }
    }

    async fn before_query(&mut self) -> Result<()> {
        if self.query_count >= self.reauth_limit {
            info!(limit = self.reauth_limit, "Query budget reached, re-authenticating");
            let _ = self.client.logout(&self.session).await;
            self.authenticate().await.context("Re-authentication failed")?;
        }
        self.limiter.until_ready().await;
        self.query_count += 1;
        Ok(())
    }

    pub async fn schedule(&mut self, team_id: &str, season: u32) -> Result<XmlNode> {
        self.before_query().await?;
        Ok(self.client.schedule(team_id, season, &self.session).await?)
    }

    pub async fn boxscore(&mut self, match_id: &str) -> Result<XmlNode> {
        self.before_query().await?;
        Ok(self.client.boxscore(match_id, &self.session).await?)
    }

    pub async fn player(&mut self, player_id: &str) -> Result<XmlNode> {
        self.before_query().await?;
        Ok(self.client.player(player_id, &self.session).await?)
    }

    /// Invalidate the session. Failures are ignored; the upstream expires
    /// idle sessions on its own.
    pub async fn close(self) {
        let _ = self.client.logout(&self.session).await;
        info!("Upstream session closed");
    }
}
