// WarcraftLogs v2 GraphQL client: report metadata and per-fight tables.

pub mod token;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::config::WarcraftLogsCredentials;
use crate::error::LookupError;
use crate::metrics;

use token::{TokenCache, TokenResponse};

const REPORT_QUERY: &str = r#"
query GetReport($reportId: String!) {
  reportData {
    report(code: $reportId) {
      title
      owner { name }
      startTime
      endTime
      zone { name }
      fights { id name startTime endTime kill fightPercentage difficulty size }
    }
  }
}"#;

const DAMAGE_QUERY: &str = r#"
query GetDamage($reportId: String!, $fightIDs: [Int]!) {
  reportData {
    report(code: $reportId) {
      table(dataType: DamageDone, fightIDs: $fightIDs)
    }
  }
}"#;

const HEALING_QUERY: &str = r#"
query GetHealing($reportId: String!, $fightIDs: [Int]!) {
  reportData {
    report(code: $reportId) {
      table(dataType: Healing, fightIDs: $fightIDs)
    }
  }
}"#;

// ── Report model ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FightOutcome {
    Kill,
    Wipe,
    /// Trash pulls carry no kill flag.
    Trash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    pub id: i64,
    pub name: String,
    /// Milliseconds from report start.
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default)]
    pub kill: Option<bool>,
    /// Boss health remaining at the end of the pull, 0-100.
    #[serde(default, rename(deserialize = "fightPercentage"))]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
}

impl Fight {
    pub fn outcome(&self) -> FightOutcome {
        match self.kill {
            Some(true) => FightOutcome::Kill,
            Some(false) => FightOutcome::Wipe,
            None => FightOutcome::Trash,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FightSummary {
    #[serde(flatten)]
    pub fight: Fight,
    pub outcome: FightOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub code: String,
    pub title: String,
    pub owner: Option<String>,
    /// Epoch milliseconds.
    pub start_time: i64,
    pub end_time: i64,
    pub zone: Option<String>,
    pub fights: Vec<FightSummary>,
}

/// One ranked row of a damage or healing table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry {
    pub name: String,
    pub class: String,
    pub spec: String,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Damage,
    Healing,
}

impl TableKind {
    fn query(self) -> &'static str {
        match self {
            TableKind::Damage => DAMAGE_QUERY,
            TableKind::Healing => HEALING_QUERY,
        }
    }
}

// ── Raw GraphQL shapes ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReportEnvelope<R> {
    #[serde(rename = "reportData")]
    report_data: ReportData<R>,
}

#[derive(Debug, Deserialize)]
struct ReportData<R> {
    report: Option<R>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReport {
    title: String,
    owner: Option<Named>,
    start_time: i64,
    end_time: i64,
    zone: Option<Named>,
    #[serde(default)]
    fights: Vec<Fight>,
}

#[derive(Debug, Deserialize)]
struct RawTableReport {
    table: TableScalar,
}

#[derive(Debug, Deserialize)]
struct TableScalar {
    data: TableData,
}

#[derive(Debug, Deserialize)]
struct TableData {
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    name: String,
    #[serde(rename = "type", default)]
    class: String,
    /// `Class-Spec`, e.g. `Mage-Fire`.
    #[serde(default)]
    icon: String,
    #[serde(default)]
    total: f64,
}

impl From<RawEntry> for TableEntry {
    fn from(raw: RawEntry) -> Self {
        let spec = raw
            .icon
            .split_once('-')
            .map(|(_, spec)| spec.to_string())
            .unwrap_or_default();
        TableEntry {
            name: raw.name,
            class: raw.class,
            spec,
            total: raw.total,
        }
    }
}

// ── Capability ────────────────────────────────────────────────────────

#[async_trait]
pub trait CombatLogLookup: Send + Sync {
    async fn report(&self, code: &str) -> Result<ReportSummary, LookupError>;

    async fn fight_table(
        &self,
        code: &str,
        fight_id: i64,
        kind: TableKind,
    ) -> Result<Vec<TableEntry>, LookupError>;
}

/// Report code from a `.../reports/<code>` URL.
pub fn extract_report_id(url: &str) -> Option<&str> {
    let start = url.find("reports/")? + "reports/".len();
    let rest = &url[start..];
    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

// ── Client ────────────────────────────────────────────────────────────

/// Long-lived WarcraftLogs client. Owns its token cache; concurrent callers
/// wait on one refresh instead of each exchanging credentials.
pub struct WarcraftLogsClient {
    client: Client,
    token_url: String,
    api_url: String,
    credentials: WarcraftLogsCredentials,
    tokens: Mutex<TokenCache>,
}

impl WarcraftLogsClient {
    pub fn new(
        credentials: WarcraftLogsCredentials,
        token_url: &str,
        api_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token_url: token_url.to_string(),
            api_url: api_url.to_string(),
            credentials,
            tokens: Mutex::new(TokenCache::new()),
        }
    }

    async fn access_token(&self) -> Result<String, LookupError> {
        let mut cache = self.tokens.lock().await;
        let now = Utc::now();
        if let Some(token) = cache.valid_token(now) {
            return Ok(token.to_string());
        }

        tracing::debug!("Requesting WarcraftLogs access token");
        let response = self
            .client
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::error!("WarcraftLogs token exchange failed: {}", response.status());
            return Err(LookupError::Service("Failed to get access token".into()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Service(format!("invalid token response: {e}")))?;
        Ok(cache.store(token, now).to_string())
    }

    /// Run a GraphQL query and return its `data` object.
    pub async fn query(&self, query: &str, variables: Value) -> Result<Value, LookupError> {
        let started = Instant::now();
        let result = self.send_query(query, variables).await;
        metrics::record_upstream("warcraftlogs", &result, started.elapsed());
        result
    }

    async fn send_query(&self, query: &str, variables: Value) -> Result<Value, LookupError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // Revoked early; the next call exchanges credentials again.
            self.tokens.lock().await.clear();
        }
        if !status.is_success() {
            return Err(LookupError::Service(format!(
                "WarcraftLogs API error: {status}"
            )));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Service(format!("invalid WarcraftLogs response: {e}")))?;

        if let Some(first) = body.errors.first() {
            return Err(LookupError::Service(first.message.clone()));
        }
        body.data
            .ok_or_else(|| LookupError::Service("WarcraftLogs returned no data".into()))
    }

    async fn report_field<R: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<R, LookupError> {
        let data = self.query(query, variables).await?;
        let envelope: ReportEnvelope<R> = serde_json::from_value(data)
            .map_err(|e| LookupError::Service(format!("unexpected report shape: {e}")))?;
        envelope
            .report_data
            .report
            .ok_or_else(|| LookupError::NotFound("Report".into()))
    }
}

#[async_trait]
impl CombatLogLookup for WarcraftLogsClient {
    async fn report(&self, code: &str) -> Result<ReportSummary, LookupError> {
        let raw: RawReport = self
            .report_field(REPORT_QUERY, json!({ "reportId": code }))
            .await?;

        Ok(ReportSummary {
            code: code.to_string(),
            title: raw.title,
            owner: raw.owner.map(|o| o.name),
            start_time: raw.start_time,
            end_time: raw.end_time,
            zone: raw.zone.map(|z| z.name),
            fights: raw
                .fights
                .into_iter()
                .map(|fight| FightSummary {
                    outcome: fight.outcome(),
                    fight,
                })
                .collect(),
        })
    }

    async fn fight_table(
        &self,
        code: &str,
        fight_id: i64,
        kind: TableKind,
    ) -> Result<Vec<TableEntry>, LookupError> {
        let raw: RawTableReport = self
            .report_field(
                kind.query(),
                json!({ "reportId": code, "fightIDs": [fight_id] }),
            )
            .await?;

        let mut entries: Vec<TableEntry> = raw
            .table
            .data
            .entries
            .into_iter()
            .map(TableEntry::from)
            .collect();
        entries.sort_by(|a, b| b.total.total_cmp(&a.total));
        Ok(entries)
    }
}
