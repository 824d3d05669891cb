// Raider.IO data model, lookup capabilities, and the REST client.

pub mod season;

use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::metrics;

// ── Data model ────────────────────────────────────────────────────────

/// Per-role breakdown of one season's score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleScores {
    pub all: f64,
    pub dps: f64,
    pub healer: f64,
    pub tank: f64,
    pub spec_0: f64,
    pub spec_1: f64,
    pub spec_2: f64,
    pub spec_3: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonScore {
    /// Opaque season id such as `season-tww-1`.
    pub season: String,
    #[serde(default)]
    pub scores: RoleScores,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Affix {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub wowhead_url: String,
}

/// A single timed keystone run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub dungeon: String,
    #[serde(default)]
    pub short_name: String,
    pub mythic_level: u32,
    pub completed_at: DateTime<Utc>,
    pub clear_time_ms: u64,
    #[serde(default)]
    pub par_time_ms: u64,
    /// 0-3; 0 means the key was depleted.
    #[serde(default)]
    pub num_keystone_upgrades: u8,
    #[serde(default)]
    pub map_challenge_mode_id: i64,
    #[serde(default)]
    pub zone_id: i64,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub affixes: Vec<Affix>,
    #[serde(default)]
    pub url: String,
}

/// Character profile as returned by `/characters/profile`.
///
/// Optional record groups are only populated when requested through
/// [`ProfileFields`]; absent groups deserialize as empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterProfile {
    pub name: String,
    pub race: String,
    pub class: String,
    pub active_spec_name: String,
    pub active_spec_role: String,
    pub gender: String,
    pub faction: String,
    pub achievement_points: i64,
    pub thumbnail_url: String,
    pub region: String,
    pub realm: String,
    pub last_crawled_at: Option<DateTime<Utc>>,
    pub profile_url: String,
    pub mythic_plus_scores_by_season: Vec<SeasonScore>,
    pub mythic_plus_recent_runs: Vec<Run>,
    pub mythic_plus_best_runs: Vec<Run>,
    pub mythic_plus_alternate_runs: Vec<Run>,
    pub mythic_plus_highest_level_runs: Vec<Run>,
}

/// Current weekly affixes for a region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AffixSummary {
    pub region: String,
    pub title: String,
    pub leaderboard_url: String,
    pub affix_details: Vec<Affix>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Guild {
    pub name: String,
    pub faction: String,
    pub realm: String,
}

/// One row of a dungeon leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardEntry {
    pub name: String,
    pub class: String,
    pub race: String,
    pub faction: String,
    pub spec: String,
    pub guild: Option<Guild>,
    pub realm: String,
    pub region: String,
    pub score: f64,
    pub url: String,
}

/// A page of `/mythic-plus/runs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonRuns {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Leaderboard filter for [`RunsLookup::dungeon_runs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunsQuery {
    pub region: String,
    /// Dungeon slug, or `all`.
    pub dungeon: String,
    /// Affix slug combination, `current` or `all`.
    pub affixes: String,
    pub page: u32,
}

// ── Field selection ───────────────────────────────────────────────────

/// How much season-score history to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonDepth {
    Current,
    All,
}

/// Selects which optional record groups Raider.IO populates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileFields {
    pub season_scores: Option<SeasonDepth>,
    pub recent_runs: bool,
    pub best_runs: bool,
    pub alternate_runs: bool,
    pub highest_level_runs: bool,
}

impl ProfileFields {
    /// Current season scores plus every run list.
    pub fn current_season() -> Self {
        Self {
            season_scores: Some(SeasonDepth::Current),
            recent_runs: true,
            best_runs: true,
            alternate_runs: true,
            highest_level_runs: true,
        }
    }

    /// Full season history plus every run list.
    pub fn all_seasons() -> Self {
        Self {
            season_scores: Some(SeasonDepth::All),
            ..Self::current_season()
        }
    }

    /// Comma-joined value for the `fields` query parameter.
    pub fn to_query(&self) -> String {
        let mut parts = Vec::new();
        match self.season_scores {
            Some(SeasonDepth::Current) => parts.push("mythic_plus_scores_by_season:current"),
            Some(SeasonDepth::All) => parts.push("mythic_plus_scores_by_season:all"),
            None => {}
        }
        if self.recent_runs {
            parts.push("mythic_plus_recent_runs");
        }
        if self.best_runs {
            parts.push("mythic_plus_best_runs");
        }
        if self.alternate_runs {
            parts.push("mythic_plus_alternate_runs");
        }
        if self.highest_level_runs {
            parts.push("mythic_plus_highest_level_runs");
        }
        parts.join(",")
    }
}

impl Default for ProfileFields {
    fn default() -> Self {
        Self::current_season()
    }
}

impl FromStr for ProfileFields {
    type Err = LookupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = ProfileFields {
            season_scores: None,
            recent_runs: false,
            best_runs: false,
            alternate_runs: false,
            highest_level_runs: false,
        };
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token {
                "mythic_plus_scores_by_season" | "mythic_plus_scores_by_season:current" => {
                    fields.season_scores = Some(SeasonDepth::Current)
                }
                "mythic_plus_scores_by_season:all" => fields.season_scores = Some(SeasonDepth::All),
                "mythic_plus_recent_runs" => fields.recent_runs = true,
                "mythic_plus_best_runs" => fields.best_runs = true,
                "mythic_plus_alternate_runs" => fields.alternate_runs = true,
                "mythic_plus_highest_level_runs" => fields.highest_level_runs = true,
                other => {
                    return Err(LookupError::InvalidInput(format!(
                        "unsupported profile field: {other}"
                    )))
                }
            }
        }
        Ok(fields)
    }
}

// ── Capabilities ──────────────────────────────────────────────────────

/// Resolve a character profile by region/realm/name.
#[async_trait]
pub trait CharacterLookup: Send + Sync {
    async fn lookup_character(
        &self,
        region: &str,
        realm: &str,
        name: &str,
        fields: &ProfileFields,
    ) -> Result<CharacterProfile, LookupError>;
}

/// Fetch the affixes active this week.
#[async_trait]
pub trait AffixLookup: Send + Sync {
    async fn current_affixes(&self, region: &str) -> Result<AffixSummary, LookupError>;
}

/// Page through dungeon leaderboard runs.
#[async_trait]
pub trait RunsLookup: Send + Sync {
    async fn dungeon_runs(&self, query: &RunsQuery) -> Result<DungeonRuns, LookupError>;
}

// ── REST client ───────────────────────────────────────────────────────

/// Error body Raider.IO returns on 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Client for the public Raider.IO v1 API.
#[derive(Clone)]
pub struct RaiderIoClient {
    client: Client,
    base_url: String,
}

impl RaiderIoClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, LookupError> {
        let started = Instant::now();
        let result = self.fetch(path, query, what).await;
        metrics::record_upstream("raiderio", &result, started.elapsed());
        result
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        what: &str,
    ) -> Result<T, LookupError> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Raider.IO answers unknown characters with 400 + "Could not find requested character".
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.message)
                .unwrap_or_default();
            if status == StatusCode::NOT_FOUND
                || message.to_ascii_lowercase().contains("could not find")
            {
                return Err(LookupError::NotFound(what.to_string()));
            }
            return Err(LookupError::Service(format!(
                "Raider.IO API error: {status}"
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LookupError::Service(format!("invalid Raider.IO response: {e}")))
    }
}

#[async_trait]
impl CharacterLookup for RaiderIoClient {
    async fn lookup_character(
        &self,
        region: &str,
        realm: &str,
        name: &str,
        fields: &ProfileFields,
    ) -> Result<CharacterProfile, LookupError> {
        let fields = fields.to_query();
        self.get_json(
            "/characters/profile",
            &[
                ("region", region),
                ("realm", realm),
                ("name", name),
                ("fields", fields.as_str()),
            ],
            "Character",
        )
        .await
    }
}

#[async_trait]
impl AffixLookup for RaiderIoClient {
    async fn current_affixes(&self, region: &str) -> Result<AffixSummary, LookupError> {
        self.get_json("/mythic-plus/affixes", &[("region", region)], "Affixes")
            .await
    }
}

#[async_trait]
impl RunsLookup for RaiderIoClient {
    async fn dungeon_runs(&self, query: &RunsQuery) -> Result<DungeonRuns, LookupError> {
        let page = query.page.to_string();
        self.get_json(
            "/mythic-plus/runs",
            &[
                ("region", query.region.as_str()),
                ("dungeon", query.dungeon.as_str()),
                ("affixes", query.affixes.as_str()),
                ("page", page.as_str()),
            ],
            "Dungeon runs",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    const PROFILE_JSON: &str = r#"{
        "name": "Foo",
        "race": "Orc",
        "class": "Warrior",
        "active_spec_name": "Arms",
        "active_spec_role": "DPS",
        "gender": "male",
        "faction": "horde",
        "achievement_points": 12000,
        "thumbnail_url": "https://render.worldofwarcraft.com/foo.jpg",
        "region": "us",
        "realm": "Area 52",
        "last_crawled_at": "2024-10-01T12:00:00.000Z",
        "profile_url": "https://raider.io/characters/us/area-52/Foo",
        "mythic_plus_scores_by_season": [
            {"season": "season-tww-1", "scores": {"all": 2750.5, "dps": 2750.5, "healer": 0, "tank": 0, "spec_0": 2750.5, "spec_1": 0, "spec_2": 0, "spec_3": 0}},
            {"season": "season-df-4", "scores": {"all": 3100.0}}
        ],
        "mythic_plus_best_runs": [
            {
                "dungeon": "The Stonevault",
                "short_name": "SV",
                "mythic_level": 12,
                "completed_at": "2024-09-30T03:12:45.000Z",
                "clear_time_ms": 1925000,
                "par_time_ms": 1980000,
                "num_keystone_upgrades": 1,
                "map_challenge_mode_id": 501,
                "zone_id": 14883,
                "score": 320.4,
                "affixes": [{"id": 10, "name": "Fortified", "description": "", "icon": "ability_toughness", "wowhead_url": ""}],
                "url": "https://raider.io/mythic-plus-runs/season-tww-1/1"
            }
        ]
    }"#;

    fn client_for(server: &ServerGuard) -> RaiderIoClient {
        RaiderIoClient::new(&server.url(), "test-agent", Duration::from_secs(5))
    }

    #[test]
    fn test_profile_fields_query() {
        assert_eq!(
            ProfileFields::all_seasons().to_query(),
            "mythic_plus_scores_by_season:all,mythic_plus_recent_runs,mythic_plus_best_runs,mythic_plus_alternate_runs,mythic_plus_highest_level_runs"
        );
        let parsed: ProfileFields = "mythic_plus_scores_by_season:current,mythic_plus_best_runs"
            .parse()
            .unwrap();
        assert_eq!(parsed.season_scores, Some(SeasonDepth::Current));
        assert!(parsed.best_runs);
        assert!(!parsed.recent_runs);
    }

    #[test]
    fn test_profile_fields_rejects_unknown() {
        let err = "gear,mythic_plus_best_runs".parse::<ProfileFields>().unwrap_err();
        assert!(matches!(err, LookupError::InvalidInput(_)));
    }

    #[test]
    fn test_profile_deserializes_with_missing_groups() {
        let profile: CharacterProfile = serde_json::from_str(PROFILE_JSON).unwrap();
        assert_eq!(profile.mythic_plus_scores_by_season.len(), 2);
        assert_eq!(profile.mythic_plus_scores_by_season[1].scores.all, 3100.0);
        assert_eq!(profile.mythic_plus_scores_by_season[1].scores.dps, 0.0);
        assert!(profile.mythic_plus_recent_runs.is_empty());
        assert_eq!(profile.mythic_plus_best_runs[0].num_keystone_upgrades, 1);
        assert_eq!(profile.mythic_plus_best_runs[0].affixes[0].name, "Fortified");
    }

    #[tokio::test]
    async fn test_lookup_character_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/characters/profile")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("region".into(), "us".into()),
                Matcher::UrlEncoded("realm".into(), "Area 52".into()),
                Matcher::UrlEncoded("name".into(), "Foo".into()),
                Matcher::UrlEncoded(
                    "fields".into(),
                    ProfileFields::all_seasons().to_query(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PROFILE_JSON)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let profile = client
            .lookup_character("us", "Area 52", "Foo", &ProfileFields::all_seasons())
            .await
            .unwrap();

        assert_eq!(profile.name, "Foo");
        assert_eq!(profile.class, "Warrior");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_character_not_found_on_400() {
        let mut server = Server::new_async().await;
        let _api = server
            .mock("GET", "/characters/profile")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"statusCode":400,"error":"Bad Request","message":"Could not find requested character"}"#,
            )
            .create_async()
            .await;

        let err = client_for(&server)
            .lookup_character("us", "Area 52", "Nobody", &ProfileFields::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_lookup_character_service_error_on_500() {
        let mut server = Server::new_async().await;
        let _api = server
            .mock("GET", "/characters/profile")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let err = client_for(&server)
            .lookup_character("us", "Area 52", "Foo", &ProfileFields::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Service(_)));
    }

    #[tokio::test]
    async fn test_current_affixes() {
        let mut server = Server::new_async().await;
        let _api = server
            .mock("GET", "/mythic-plus/affixes")
            .match_query(Matcher::UrlEncoded("region".into(), "eu".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"region":"eu","title":"Xal'atath's Bargain: Ascendant, Fortified",
                    "leaderboard_url":"https://raider.io/mythic-plus-rankings/season-tww-1/all/eu/leaderboards",
                    "affix_details":[{"id":148,"name":"Xal'atath's Bargain: Ascendant","description":"d","icon":"i","wowhead_url":"w"},
                                     {"id":10,"name":"Fortified","description":"d","icon":"i","wowhead_url":"w"}]}"#,
            )
            .create_async()
            .await;

        let affixes = client_for(&server).current_affixes("eu").await.unwrap();
        assert_eq!(affixes.affix_details.len(), 2);
        assert_eq!(affixes.affix_details[1].name, "Fortified");
    }

    #[tokio::test]
    async fn test_dungeon_runs() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/mythic-plus/runs")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("region".into(), "us".into()),
                Matcher::UrlEncoded("dungeon".into(), "the-stonevault".into()),
                Matcher::UrlEncoded("affixes".into(), "current".into()),
                Matcher::UrlEncoded("page".into(), "2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"leaderboard":[
                    {"name":"Foo","class":"Warrior","race":"Orc","faction":"horde","spec":"Arms",
                     "guild":{"name":"Method","faction":"horde","realm":"Tarren Mill"},
                     "realm":"Tarren Mill","region":"eu","score":3450.2,"url":"https://raider.io/x"},
                    {"name":"Bar","class":"Priest","score":3300.0}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let runs = client_for(&server)
            .dungeon_runs(&RunsQuery {
                region: "us".into(),
                dungeon: "the-stonevault".into(),
                affixes: "current".into(),
                page: 2,
            })
            .await
            .unwrap();

        assert_eq!(runs.leaderboard.len(), 2);
        assert_eq!(runs.leaderboard[0].guild.as_ref().unwrap().name, "Method");
        assert!(runs.leaderboard[1].guild.is_none());
        assert_eq!(runs.leaderboard[1].score, 3300.0);
        mock.assert_async().await;
    }
}
