//! Unread count for a Gmail inbox.
//!
//! Each poll trades the configured refresh token for a short-lived access
//! token and reads the INBOX label.  No token is cached between polls.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::{DataPoint, DataSource};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct Label {
    #[serde(rename = "messagesUnread", default)]
    messages_unread: u64,
}

struct Credentials {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

pub struct GmailUnreadSource {
    desc: SourceDescriptor,
    http: reqwest::Client,
}

impl GmailUnreadSource {
    pub fn new(desc: SourceDescriptor, http: reqwest::Client) -> Self {
        Self { desc, http }
    }

    fn credentials(&self) -> Result<Credentials, SourceError> {
        let options = &self.desc.options;
        match (
            options.str("client_id"),
            options.str("client_secret"),
            options.str("refresh_token"),
        ) {
            (Some(client_id), Some(client_secret), Some(refresh_token)) => Ok(Credentials {
                client_id,
                client_secret,
                refresh_token,
            }),
            _ => Err(SourceError::config_with_detail(
                "Missing Gmail OAuth config",
                "Set client_id, client_secret, refresh_token.",
            )),
        }
    }

    async fn access_token(&self, creds: &Credentials) -> Result<String, SourceError> {
        let token_uri = self.desc.options.str_or("token_uri", DEFAULT_TOKEN_URI);
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("refresh_token", creds.refresh_token.as_str()),
        ];
        let token = self
            .http
            .post(token_uri)
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl DataSource for GmailUnreadSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let creds = self.credentials()?;
        let token = self.access_token(&creds).await?;

        let api_base = self.desc.options.str_or("api_base", DEFAULT_API_BASE);
        let label = self
            .http
            .get(format!("{}/gmail/v1/users/me/labels/INBOX", api_base.trim_end_matches('/')))
            .bearer_auth(token)
            .send()
            .await?
            .error_for_status()?
            .json::<Label>()
            .await?;

        Ok(DataPoint::ok(self.name(), format!("{} unread", label.messages_unread)))
    }
}
