use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::app::{AppError, Result};
use crate::config::PiHoleConfig;
use crate::domain::AdListEntry;
use crate::remote::token::find_token;
use crate::remote::RemoteListService;

const LOGIN_PATH: &str = "/admin/index.php";
const GROUPS_PATH: &str = "/admin/scripts/pi-hole/php/groups.php";
const API_PATH: &str = "/admin/api.php";

/// SQLite error text `add_adlist` returns when the address is already listed.
const DUPLICATE_ADDRESS: &str = "UNIQUE constraint failed";

/// Client for the Pi-hole v5 admin interface.
///
/// Mutations go through `groups.php`, which checks a CSRF token scraped from
/// the HTML of the login response. The PHP session lives in the cookie jar.
pub struct PiHoleClient {
    host: String,
    client: Client,
    token: String,
    pwhash: String,
}

#[derive(Debug, Deserialize)]
struct AdListsResponse {
    #[serde(default)]
    data: Vec<AdListEntry>,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueriesResponse {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl PiHoleClient {
    pub fn new(config: &PiHoleConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .user_agent(concat!("adlist-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            host: config.host.trim_end_matches('/').to_string(),
            client,
            token: String::new(),
            pwhash: String::new(),
        })
    }

    /// Log in and pick up the session token. An empty token afterwards means
    /// the password was rejected.
    pub async fn auth(&mut self, password: &str) -> Result<()> {
        self.pwhash = password_hash(password);

        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .form(&[("pw", password)])
            .send()
            .await?
            .error_for_status()?;

        self.token = find_token(&response.text().await?);
        if self.token.is_empty() {
            return Err(AppError::Auth(format!(
                "no session token returned by {}",
                self.host
            )));
        }

        tracing::info!("Authenticated against {}", self.host);
        Ok(())
    }

    /// Distinct domains the service let through, optionally for one client.
    pub async fn non_blocked_hosts(&self, client: Option<&str>) -> Result<BTreeSet<String>> {
        let mut params = vec![("getAllQueries", ""), ("auth", self.pwhash.as_str())];
        if let Some(client) = client.filter(|c| !c.is_empty()) {
            params.push(("client", client));
        }

        let response = self
            .client
            .get(self.url(API_PATH))
            .query(&params)
            .send()
            .await?;

        if !is_json(&response) {
            tracing::warn!("Query log returned a non-JSON response");
            return Ok(BTreeSet::new());
        }

        let body: QueriesResponse = serde_json::from_str(&response.text().await?)
            .map_err(|e| AppError::InvalidResponse(e.to_string()))?;

        Ok(body
            .data
            .iter()
            .filter_map(|row| row.get(2).and_then(Value::as_str))
            .map(String::from)
            .collect())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }

    async fn post_groups(&self, form: &[(&str, String)]) -> Result<Response> {
        Ok(self
            .client
            .post(self.url(GROUPS_PATH))
            .form(form)
            .send()
            .await?)
    }

    /// Take the token from a non-JSON page. A page without one means the
    /// session is gone.
    fn refresh_token(&mut self, body: &str) -> Result<()> {
        let token = find_token(body);
        if token.is_empty() {
            return Err(AppError::Auth("session token lost".into()));
        }
        tracing::debug!("Refreshed session token from non-JSON response");
        self.token = token;
        Ok(())
    }

    /// Interpret a `groups.php` mutation response. A non-JSON body carries a
    /// fresh page, so the token is refreshed from it before reporting failure.
    async fn mutation_result(&mut self, response: Response) -> Result<()> {
        let json = is_json(&response);
        let body = response.text().await?;

        if !json {
            self.refresh_token(&body)?;
            return Err(AppError::RemoteMutation("non-JSON response".into()));
        }

        let result: MutationResponse =
            serde_json::from_str(&body).map_err(|e| AppError::InvalidResponse(e.to_string()))?;

        if result.success {
            Ok(())
        } else {
            Err(AppError::RemoteMutation(
                result.message.unwrap_or_else(|| "request rejected".into()),
            ))
        }
    }
}

#[async_trait]
impl RemoteListService for PiHoleClient {
    async fn list_entries(&mut self) -> Result<Vec<AdListEntry>> {
        // One retry after picking up a fresh token from a non-JSON reply.
        let mut attempts = 0;
        let body = loop {
            let form = [
                ("action", "get_adlists".to_string()),
                ("token", self.token.clone()),
            ];
            let response = self.post_groups(&form).await?;
            let json = is_json(&response);
            let body = response.text().await?;

            if json {
                break body;
            }
            self.refresh_token(&body)?;
            attempts += 1;
            if attempts > 1 {
                return Err(AppError::InvalidResponse(
                    "ad-list query keeps returning non-JSON".into(),
                ));
            }
            tracing::warn!("Ad-list query returned a non-JSON response, retrying");
        };

        let body: AdListsResponse =
            serde_json::from_str(&body).map_err(|e| AppError::InvalidResponse(e.to_string()))?;

        tracing::debug!("Fetched {} ad-list entries", body.data.len());
        Ok(body.data)
    }

    async fn create_entry(&mut self, address: &str) -> Result<()> {
        let form = [
            ("action", "add_adlist".to_string()),
            ("address", address.to_string()),
            ("token", self.token.clone()),
        ];
        let response = self.post_groups(&form).await?;

        match self.mutation_result(response).await {
            Err(AppError::RemoteMutation(msg)) if msg.contains(DUPLICATE_ADDRESS) => Err(
                AppError::Lookup(format!("{} already exists remotely", address)),
            ),
            other => other,
        }
    }

    async fn set_enabled(
        &mut self,
        id: i64,
        enabled: bool,
        comment: Option<&str>,
        groups: Option<&[i64]>,
    ) -> Result<()> {
        let mut form = vec![
            ("action", "edit_adlist".to_string()),
            ("id", id.to_string()),
            ("status", u8::from(enabled).to_string()),
            ("token", self.token.clone()),
        ];
        if let Some(comment) = comment {
            form.push(("comment", comment.to_string()));
        }
        if let Some(groups) = groups {
            form.extend(groups.iter().map(|g| ("groups", g.to_string())));
        }

        let response = self.post_groups(&form).await?;
        self.mutation_result(response).await
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

/// The `auth` parameter of `api.php`: hex SHA-256 applied twice.
pub fn password_hash(password: &str) -> String {
    let once = hex::encode(Sha256::digest(password.as_bytes()));
    hex::encode(Sha256::digest(once.as_bytes()))
}
