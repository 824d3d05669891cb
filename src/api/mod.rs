// HTTP API routes (character proxy, warband discovery, combat logs, rosters)

use axum::{
    extract::{Json, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::error::{require_non_empty, LookupError};
use crate::llms_txt::LLMS_TXT;
use crate::metrics;
use crate::overview::CharacterOverview;
use crate::profile_url::{parse_profile_url, ProfileLinks};
use crate::raiderio::{AffixLookup, CharacterLookup, ProfileFields, RunsLookup, RunsQuery};
use crate::roster::{MemberInput, RosterInput, RosterStore, StrategyInput};
use crate::warband::{analyze_warband, WarbandOptions, WarbandRequest};
use crate::warcraftlogs::{extract_report_id, CombatLogLookup, TableKind};

const DEFAULT_REGION: &str = "us";
const CHARACTER_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=60";
const AFFIXES_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=300";

// ── Request types ─────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CharacterParams {
    pub region: Option<String>,
    pub realm: Option<String>,
    pub name: Option<String>,
    pub fields: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarbandParams {
    pub region: Option<String>,
    pub realm: Option<String>,
    pub name: Option<String>,
    /// Raider.IO profile URL; overrides the other fields when it parses.
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RegionParams {
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunsParams {
    pub region: Option<String>,
    pub dungeon: Option<String>,
    pub affixes: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportParams {
    pub url: Option<String>,
    pub code: Option<String>,
}

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub characters: Arc<dyn CharacterLookup>,
    pub affixes: Arc<dyn AffixLookup>,
    pub runs: Arc<dyn RunsLookup>,
    /// `None` when no WarcraftLogs credentials are configured.
    pub combat_logs: Option<Arc<dyn CombatLogLookup>>,
    pub rosters: RosterStore,
    pub warband: WarbandOptions,
}

// ── Error helpers ─────────────────────────────────────────────────────

fn json_error(status: StatusCode, msg: &str) -> impl IntoResponse {
    (status, Json(json!({ "error": msg })))
}

fn error_status(e: &LookupError) -> StatusCode {
    match e {
        LookupError::NotFound(_) => StatusCode::NOT_FOUND,
        LookupError::Service(_) => StatusCode::BAD_GATEWAY,
        LookupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LookupError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn lookup_error(e: LookupError) -> Response {
    let status = error_status(&e);
    match &e {
        LookupError::InvalidInput(msg) => json_error(status, msg).into_response(),
        LookupError::Service(msg) => {
            tracing::error!("Upstream error: {msg}");
            json_error(status, msg).into_response()
        }
        _ => json_error(status, &e.to_string()).into_response(),
    }
}

/// Character routes answer a uniform message for any missing character.
fn character_error(e: LookupError) -> Response {
    if e.is_not_found() {
        return json_error(StatusCode::NOT_FOUND, "Character not found").into_response();
    }
    lookup_error(e)
}

fn region_or_default(region: Option<String>) -> String {
    region
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| DEFAULT_REGION.to_string())
}

// ── Router ────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        // Raider.IO
        .route("/api/character", get(get_character))
        .route("/api/character/overview", get(get_character_overview))
        .route("/api/affixes", get(get_affixes))
        .route("/api/runs", get(get_runs))
        .route("/api/warband", get(get_warband))
        .route("/api/links", get(get_links))
        // WarcraftLogs
        .route("/api/logs/report", get(get_report))
        .route(
            "/api/logs/report/{code}/fights/{fight_id}/damage",
            get(get_damage_table),
        )
        .route(
            "/api/logs/report/{code}/fights/{fight_id}/healing",
            get(get_healing_table),
        )
        // Rosters
        .route("/api/rosters", get(list_rosters).post(create_roster))
        .route(
            "/api/rosters/{id}",
            get(get_roster).put(update_roster).delete(delete_roster),
        )
        .route("/api/rosters/{id}/members", post(add_member))
        .route(
            "/api/rosters/{id}/members/{member_id}",
            put(update_member).delete(remove_member),
        )
        .route("/api/rosters/{id}/summary", get(get_roster_summary))
        // Strategy notes
        .route("/api/strategies", get(list_strategies).post(create_strategy))
        .route(
            "/api/strategies/{id}",
            put(update_strategy).delete(delete_strategy),
        )
        // Operations
        .route("/metrics", get(get_metrics))
        .route("/llms.txt", get(get_llms_txt))
        .with_state(state)
}

// ── Raider.IO handlers ────────────────────────────────────────────────

struct CharacterKey {
    region: String,
    realm: String,
    name: String,
}

impl CharacterKey {
    fn from_params(
        region: Option<String>,
        realm: Option<String>,
        name: Option<String>,
    ) -> Result<Self, LookupError> {
        let realm = realm.unwrap_or_default();
        let name = name.unwrap_or_default();
        Ok(Self {
            region: region_or_default(region),
            realm: require_non_empty("realm", &realm)?.to_string(),
            name: require_non_empty("name", &name)?.to_string(),
        })
    }
}

async fn get_character(
    State(state): State<AppState>,
    Query(params): Query<CharacterParams>,
) -> Response {
    let key = match CharacterKey::from_params(params.region, params.realm, params.name) {
        Ok(key) => key,
        Err(e) => return lookup_error(e),
    };
    let fields = match params.fields.as_deref().map(str::parse::<ProfileFields>) {
        None => ProfileFields::default(),
        Some(Ok(fields)) => fields,
        Some(Err(e)) => return lookup_error(e),
    };

    match state
        .characters
        .lookup_character(&key.region, &key.realm, &key.name, &fields)
        .await
    {
        Ok(profile) => (
            [(header::CACHE_CONTROL, CHARACTER_CACHE_CONTROL)],
            Json(profile),
        )
            .into_response(),
        Err(e) => character_error(e),
    }
}

async fn get_character_overview(
    State(state): State<AppState>,
    Query(params): Query<CharacterParams>,
) -> Response {
    let key = match CharacterKey::from_params(params.region, params.realm, params.name) {
        Ok(key) => key,
        Err(e) => return lookup_error(e),
    };
    match state
        .characters
        .lookup_character(&key.region, &key.realm, &key.name, &ProfileFields::all_seasons())
        .await
    {
        Ok(profile) => (
            [(header::CACHE_CONTROL, CHARACTER_CACHE_CONTROL)],
            Json(CharacterOverview::from_profile(&profile)),
        )
            .into_response(),
        Err(e) => character_error(e),
    }
}

async fn get_affixes(
    State(state): State<AppState>,
    Query(params): Query<RegionParams>,
) -> Response {
    let region = region_or_default(params.region);
    match state.affixes.current_affixes(&region).await {
        Ok(affixes) => (
            [(header::CACHE_CONTROL, AFFIXES_CACHE_CONTROL)],
            Json(affixes),
        )
            .into_response(),
        Err(e) => lookup_error(e),
    }
}

fn param_or(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

async fn get_runs(State(state): State<AppState>, Query(params): Query<RunsParams>) -> Response {
    let query = RunsQuery {
        region: region_or_default(params.region),
        dungeon: param_or(params.dungeon, "all"),
        affixes: param_or(params.affixes, "current"),
        page: params.page.unwrap_or(0),
    };
    match state.runs.dungeon_runs(&query).await {
        Ok(runs) => (
            [(header::CACHE_CONTROL, CHARACTER_CACHE_CONTROL)],
            Json(runs),
        )
            .into_response(),
        Err(e) => lookup_error(e),
    }
}

/// A parseable `url` wins; otherwise the raw fields are used, with an
/// unparseable `url` standing in for a missing name.
fn warband_request(params: WarbandParams) -> WarbandRequest {
    if let Some(profile) = params.url.as_deref().and_then(parse_profile_url) {
        return WarbandRequest {
            region: profile.region,
            realm: profile.realm,
            name: profile.name,
        };
    }
    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .or(params.url)
        .unwrap_or_default();
    WarbandRequest {
        region: region_or_default(params.region),
        realm: params.realm.unwrap_or_default(),
        name: name.trim().to_string(),
    }
}

async fn get_warband(
    State(state): State<AppState>,
    Query(params): Query<WarbandParams>,
) -> Response {
    let request = warband_request(params);
    match analyze_warband(state.characters.as_ref(), &request, &state.warband).await {
        Ok(analysis) => (StatusCode::OK, Json(analysis)).into_response(),
        Err(e) => character_error(e),
    }
}

async fn get_links(Query(params): Query<CharacterParams>) -> Response {
    match CharacterKey::from_params(params.region, params.realm, params.name) {
        Ok(key) => Json(ProfileLinks::new(&key.region, &key.realm, &key.name)).into_response(),
        Err(e) => lookup_error(e),
    }
}

// ── WarcraftLogs handlers ─────────────────────────────────────────────

fn combat_logs(state: &AppState) -> Result<&Arc<dyn CombatLogLookup>, LookupError> {
    state.combat_logs.as_ref().ok_or_else(|| {
        LookupError::Unavailable("WarcraftLogs credentials are not configured".into())
    })
}

fn report_code(params: &ReportParams) -> Result<String, LookupError> {
    if let Some(code) = params.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        return Ok(code.to_string());
    }
    let url = params.url.as_deref().unwrap_or_default();
    require_non_empty("url", url)?;
    extract_report_id(url)
        .map(str::to_string)
        .ok_or_else(|| LookupError::InvalidInput("invalid WarcraftLogs report URL".into()))
}

async fn get_report(
    State(state): State<AppState>,
    Query(params): Query<ReportParams>,
) -> Response {
    let result = async {
        let logs = combat_logs(&state)?;
        let code = report_code(&params)?;
        logs.report(&code).await
    }
    .await;
    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn fight_table(state: &AppState, code: &str, fight_id: i64, kind: TableKind) -> Response {
    let result = match combat_logs(state) {
        Ok(logs) => logs.fight_table(code, fight_id, kind).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn get_damage_table(
    State(state): State<AppState>,
    Path((code, fight_id)): Path<(String, i64)>,
) -> Response {
    fight_table(&state, &code, fight_id, TableKind::Damage).await
}

async fn get_healing_table(
    State(state): State<AppState>,
    Path((code, fight_id)): Path<(String, i64)>,
) -> Response {
    fight_table(&state, &code, fight_id, TableKind::Healing).await
}

// ── Roster handlers ───────────────────────────────────────────────────

async fn list_rosters(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.rosters.list_rosters())
}

async fn create_roster(
    State(state): State<AppState>,
    Json(req): Json<RosterInput>,
) -> Response {
    match state.rosters.create_roster(req) {
        Ok(roster) => (StatusCode::CREATED, Json(roster)).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn get_roster(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.rosters.get_roster(&id) {
        Ok(roster) => Json(roster).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn update_roster(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RosterInput>,
) -> Response {
    match state.rosters.update_roster(&id, req) {
        Ok(roster) => Json(roster).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn delete_roster(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.rosters.delete_roster(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        json_error(StatusCode::NOT_FOUND, "Roster not found").into_response()
    }
}

async fn get_roster_summary(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.rosters.get_roster(&id) {
        Ok(roster) => Json(roster.role_summary()).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn add_member(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MemberInput>,
) -> Response {
    match state.rosters.add_member(&id, req) {
        Ok(member) => (StatusCode::CREATED, Json(member)).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn update_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(String, String)>,
    Json(req): Json<MemberInput>,
) -> Response {
    match state.rosters.update_member(&id, &member_id, req) {
        Ok(member) => Json(member).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn remove_member(
    State(state): State<AppState>,
    Path((id, member_id)): Path<(String, String)>,
) -> Response {
    match state.rosters.remove_member(&id, &member_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => lookup_error(e),
    }
}

// ── Strategy handlers ─────────────────────────────────────────────────

async fn list_strategies(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.rosters.list_strategies())
}

async fn create_strategy(
    State(state): State<AppState>,
    Json(req): Json<StrategyInput>,
) -> Response {
    match state.rosters.create_strategy(req) {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn update_strategy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StrategyInput>,
) -> Response {
    match state.rosters.update_strategy(&id, req) {
        Ok(note) => Json(note).into_response(),
        Err(e) => lookup_error(e),
    }
}

async fn delete_strategy(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.rosters.delete_strategy(&id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        json_error(StatusCode::NOT_FOUND, "Strategy not found").into_response()
    }
}

// ── Operations ────────────────────────────────────────────────────────

async fn get_metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

async fn get_llms_txt() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], LLMS_TXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            error_status(&LookupError::NotFound("Report".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_status(&LookupError::Service("boom".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            error_status(&LookupError::InvalidInput("name is required".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_status(&LookupError::Unavailable("no creds".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_warband_request_prefers_url() {
        let request = warband_request(WarbandParams {
            region: Some("eu".into()),
            realm: Some("Draenor".into()),
            name: Some("Ignored".into()),
            url: Some("https://raider.io/characters/US/area-52/Thrall".into()),
        });
        assert_eq!(request.region, "us");
        assert_eq!(request.realm, "area 52");
        assert_eq!(request.name, "Thrall");
    }

    #[test]
    fn test_warband_request_unparseable_url_is_name() {
        let request = warband_request(WarbandParams {
            region: None,
            realm: Some("Stormrage".into()),
            name: None,
            url: Some(" Jaina ".into()),
        });
        assert_eq!(request.region, "us");
        assert_eq!(request.realm, "Stormrage");
        assert_eq!(request.name, "Jaina");
    }

    #[test]
    fn test_report_code_sources() {
        let by_code = ReportParams {
            url: None,
            code: Some("aBc123".into()),
        };
        assert_eq!(report_code(&by_code).unwrap(), "aBc123");

        let by_url = ReportParams {
            url: Some("https://www.warcraftlogs.com/reports/XyZ789#fight=3".into()),
            code: None,
        };
        assert_eq!(report_code(&by_url).unwrap(), "XyZ789");

        let bad = ReportParams {
            url: Some("https://example.com/nothing".into()),
            code: None,
        };
        assert!(matches!(report_code(&bad), Err(LookupError::InvalidInput(_))));
        assert!(matches!(
            report_code(&ReportParams::default()),
            Err(LookupError::InvalidInput(_))
        ));
    }
}
