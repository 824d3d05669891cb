// Display-ready character summary built from a Raider.IO profile.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::format::{format_time, Role, ScoreTier, UpgradeTier};
use crate::profile_url::ProfileLinks;
use crate::raiderio::season::{current_season, season_name, sort_seasons};
use crate::raiderio::{CharacterProfile, Run, SeasonScore};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonLine {
    pub season: String,
    pub name: String,
    pub score: f64,
    pub dps: f64,
    pub healer: f64,
    pub tank: f64,
    pub tier: ScoreTier,
    pub css_class: &'static str,
}

impl From<&SeasonScore> for SeasonLine {
    fn from(season: &SeasonScore) -> Self {
        let score = season.scores.all;
        let tier = ScoreTier::from_score(score);
        Self {
            season: season.season.clone(),
            name: season_name(&season.season),
            score,
            dps: season.scores.dps,
            healer: season.scores.healer,
            tank: season.scores.tank,
            tier,
            css_class: tier.css_class(),
        }
    }
}

/// Aggregates over a character's season history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStats {
    pub seasons_played: usize,
    pub peak_score: f64,
    /// Newest season reaching `peak_score`.
    pub peak_season: String,
    pub peak_season_name: String,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    /// Newest season minus the one before it; a missing previous season counts as 0.
    pub trend: f64,
}

impl SeasonStats {
    /// `seasons` must already be newest first. `None` for an empty history.
    pub fn from_sorted(seasons: &[SeasonScore]) -> Option<Self> {
        let newest = seasons.first()?;
        let scores = seasons.iter().map(|s| s.scores.all);
        let max_score = scores.clone().fold(f64::NEG_INFINITY, f64::max);
        let min_score = scores.clone().fold(f64::INFINITY, f64::min);
        let average_score = scores.sum::<f64>() / seasons.len() as f64;

        let peak = seasons
            .iter()
            .find(|s| s.scores.all == max_score)
            .unwrap_or(newest);
        let previous = seasons.get(1).map_or(0.0, |s| s.scores.all);

        Some(Self {
            seasons_played: seasons.len(),
            peak_score: max_score,
            peak_season: peak.season.clone(),
            peak_season_name: season_name(&peak.season),
            average_score,
            min_score,
            max_score,
            trend: newest.scores.all - previous,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLine {
    pub dungeon: String,
    pub short_name: String,
    pub mythic_level: u32,
    pub clear_time: String,
    pub par_time: String,
    pub upgrade: UpgradeTier,
    pub stars: &'static str,
    pub upgrade_css_class: &'static str,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
    pub url: String,
}

impl From<&Run> for RunLine {
    fn from(run: &Run) -> Self {
        let upgrade = UpgradeTier::from_upgrades(run.num_keystone_upgrades);
        Self {
            dungeon: run.dungeon.clone(),
            short_name: run.short_name.clone(),
            mythic_level: run.mythic_level,
            clear_time: format_time(run.clear_time_ms),
            par_time: format_time(run.par_time_ms),
            upgrade,
            stars: upgrade.stars(),
            upgrade_css_class: upgrade.css_class(),
            score: run.score,
            completed_at: run.completed_at,
            url: run.url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterOverview {
    pub name: String,
    pub class: String,
    pub spec: String,
    pub role: Role,
    pub role_icon: &'static str,
    pub region: String,
    pub realm: String,
    pub thumbnail_url: String,
    pub last_crawled_at: Option<DateTime<Utc>>,
    /// First season in upstream order, if the profile has any.
    pub current_season: Option<SeasonLine>,
    /// Newest first.
    pub seasons: Vec<SeasonLine>,
    pub season_stats: Option<SeasonStats>,
    pub best_runs: Vec<RunLine>,
    pub recent_runs: Vec<RunLine>,
    pub links: ProfileLinks,
}

impl CharacterOverview {
    pub fn from_profile(profile: &CharacterProfile) -> Self {
        let role = Role::parse(&profile.active_spec_role);
        let current_season = current_season(profile).and_then(|id| {
            profile
                .mythic_plus_scores_by_season
                .iter()
                .find(|s| s.season == id)
                .map(SeasonLine::from)
        });
        let sorted = sort_seasons(&profile.mythic_plus_scores_by_season);
        let season_stats = SeasonStats::from_sorted(&sorted);
        let seasons = sorted.iter().map(SeasonLine::from).collect();

        let mut best_runs: Vec<RunLine> =
            profile.mythic_plus_best_runs.iter().map(RunLine::from).collect();
        best_runs.sort_by(|a, b| b.mythic_level.cmp(&a.mythic_level));

        Self {
            name: profile.name.clone(),
            class: profile.class.clone(),
            spec: profile.active_spec_name.clone(),
            role,
            role_icon: role.icon(),
            region: profile.region.clone(),
            realm: profile.realm.clone(),
            thumbnail_url: profile.thumbnail_url.clone(),
            last_crawled_at: profile.last_crawled_at,
            current_season,
            seasons,
            season_stats,
            best_runs,
            recent_runs: profile.mythic_plus_recent_runs.iter().map(RunLine::from).collect(),
            links: ProfileLinks::new(&profile.region, &profile.realm, &profile.name),
        }
    }
}
