// Warband discovery: resolve a main character, probe alt-name guesses on the
// same realm, and compute per-season maxima across everything found.
//
// Known limitation: a same-named character belonging to another player is
// included if it resolves. Nothing here can tell the two apart.

pub mod alt_names;
pub mod score;

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{require_non_empty, LookupError};
use crate::metrics;
use crate::raiderio::{CharacterLookup, CharacterProfile, ProfileFields};

pub use alt_names::generate_alt_names;
pub use score::{current_season_score, highest_season_score};

/// Who to analyze.
#[derive(Debug, Clone)]
pub struct WarbandRequest {
    pub region: String,
    pub realm: String,
    pub name: String,
}

/// Bounds on candidate probing.
#[derive(Debug, Clone)]
pub struct WarbandOptions {
    /// Max candidate lookups in flight.
    pub concurrency: usize,
    /// A candidate that takes longer than this is dropped.
    pub candidate_timeout: Duration,
}

impl Default for WarbandOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            candidate_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarbandCharacter {
    pub character: CharacterProfile,
    pub is_main: bool,
    pub highest_season_score: f64,
    pub current_season_score: f64,
}

impl WarbandCharacter {
    fn new(character: CharacterProfile, is_main: bool) -> Self {
        let highest_season_score = highest_season_score(&character);
        let current_season_score = current_season_score(&character);
        Self {
            character,
            is_main,
            highest_season_score,
            current_season_score,
        }
    }
}

/// Best score for one season and who achieved it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonBest {
    pub score: f64,
    pub character: String,
    pub character_class: String,
    pub character_spec: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarbandAnalysis {
    /// Sorted by each character's own highest season score, descending.
    pub characters: Vec<WarbandCharacter>,
    pub highest_scores_by_season_across_warband: BTreeMap<String, SeasonBest>,
    pub total_characters: usize,
    pub main_character: WarbandCharacter,
}

impl WarbandAnalysis {
    /// Assemble the analysis from the main profile and any resolved alts.
    ///
    /// Season attribution goes to the first character (main, then alts in the
    /// given order) that reaches the season's maximum.
    pub fn build(main: CharacterProfile, alts: Vec<CharacterProfile>) -> Self {
        let main_character = WarbandCharacter::new(main, true);
        let mut characters = Vec::with_capacity(alts.len() + 1);
        characters.push(main_character.clone());
        characters.extend(alts.into_iter().map(|c| WarbandCharacter::new(c, false)));

        let highest_scores_by_season_across_warband = season_bests(&characters);

        characters.sort_by(|a, b| b.highest_season_score.total_cmp(&a.highest_season_score));

        Self {
            total_characters: characters.len(),
            characters,
            highest_scores_by_season_across_warband,
            main_character,
        }
    }
}

fn season_bests(characters: &[WarbandCharacter]) -> BTreeMap<String, SeasonBest> {
    let mut bests: BTreeMap<String, SeasonBest> = BTreeMap::new();
    for wc in characters {
        let profile = &wc.character;
        for season in &profile.mythic_plus_scores_by_season {
            let score = season.scores.all;
            let replace = bests
                .get(&season.season)
                .map_or(true, |best| score > best.score);
            if replace {
                bests.insert(
                    season.season.clone(),
                    SeasonBest {
                        score,
                        character: profile.name.clone(),
                        character_class: profile.class.clone(),
                        character_spec: profile.active_spec_name.clone(),
                    },
                );
            }
        }
    }
    bests
}

/// Discover the warband around `request.name`.
///
/// Only the main-character lookup can fail the call. Candidate failures,
/// misses and timeouts just leave that candidate out.
pub async fn analyze_warband(
    lookup: &dyn CharacterLookup,
    request: &WarbandRequest,
    options: &WarbandOptions,
) -> Result<WarbandAnalysis, LookupError> {
    let region = require_non_empty("region", &request.region)?;
    let realm = require_non_empty("realm", &request.realm)?;
    let name = require_non_empty("name", &request.name)?;
    let fields = ProfileFields::all_seasons();

    let main = match lookup.lookup_character(region, realm, name, &fields).await {
        Ok(profile) => profile,
        Err(LookupError::NotFound(_)) => {
            tracing::info!("Warband main character {name}-{realm} ({region}) not found");
            return Err(LookupError::NotFound(format!("Character {name}")));
        }
        Err(e) => {
            tracing::error!("Warband main character lookup failed for {name}-{realm}: {e}");
            return Err(e);
        }
    };

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(name.to_lowercase());
    seen.insert(main.name.to_lowercase());

    // Upstream names are case-insensitive; probe each spelling once.
    let mut probed = seen.clone();
    let candidates: Vec<String> = generate_alt_names(name)
        .into_iter()
        .filter(|c| probed.insert(c.to_lowercase()))
        .collect();

    let timeout = options.candidate_timeout;
    let results: Vec<(String, Option<CharacterProfile>)> = stream::iter(candidates)
        .map(|candidate| {
            let fields = &fields;
            async move {
                let outcome = tokio::time::timeout(
                    timeout,
                    lookup.lookup_character(region, realm, &candidate, fields),
                )
                .await;
                let profile = match outcome {
                    Ok(Ok(profile)) => {
                        metrics::WARBAND_CANDIDATES_TOTAL
                            .with_label_values(&["found"])
                            .inc();
                        Some(profile)
                    }
                    Ok(Err(e)) => {
                        tracing::debug!("Alt candidate {candidate} skipped: {e}");
                        metrics::WARBAND_CANDIDATES_TOTAL
                            .with_label_values(&["missing"])
                            .inc();
                        None
                    }
                    Err(_) => {
                        tracing::debug!("Alt candidate {candidate} timed out");
                        metrics::WARBAND_CANDIDATES_TOTAL
                            .with_label_values(&["timeout"])
                            .inc();
                        None
                    }
                };
                (candidate, profile)
            }
        })
        .buffered(options.concurrency.max(1))
        .collect()
        .await;

    let mut alts = Vec::new();
    for (candidate, profile) in results {
        let Some(profile) = profile else { continue };
        if !seen.insert(profile.name.to_lowercase()) {
            tracing::debug!("Alt candidate {candidate} resolved to already-known {}", profile.name);
            continue;
        }
        alts.push(profile);
    }

    let analysis = WarbandAnalysis::build(main, alts);
    metrics::WARBAND_SIZE.observe(analysis.total_characters as f64);
    tracing::info!(
        "Warband for {name}-{realm} ({region}): {} character(s)",
        analysis.total_characters
    );
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raiderio::{RoleScores, SeasonScore};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn profile(name: &str, class: &str, spec: &str, seasons: &[(&str, f64)]) -> CharacterProfile {
        CharacterProfile {
            name: name.to_string(),
            class: class.to_string(),
            active_spec_name: spec.to_string(),
            region: "us".to_string(),
            realm: "Area 52".to_string(),
            mythic_plus_scores_by_season: seasons
                .iter()
                .map(|(season, all)| SeasonScore {
                    season: season.to_string(),
                    scores: RoleScores {
                        all: *all,
                        ..Default::default()
                    },
                })
                .collect(),
            ..Default::default()
        }
    }

    /// In-memory lookup keyed by lower-cased name.
    #[derive(Default)]
    struct FakeLookup {
        characters: HashMap<String, CharacterProfile>,
        broken: HashSet<String>,
        slow: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeLookup {
        fn with(mut self, p: CharacterProfile) -> Self {
            self.characters.insert(p.name.to_lowercase(), p);
            self
        }

        fn broken(mut self, name: &str) -> Self {
            self.broken.insert(name.to_lowercase());
            self
        }

        fn slow(mut self, p: CharacterProfile) -> Self {
            self.slow.insert(p.name.to_lowercase());
            self.with(p)
        }
    }

    #[async_trait]
    impl CharacterLookup for FakeLookup {
        async fn lookup_character(
            &self,
            _region: &str,
            _realm: &str,
            name: &str,
            fields: &ProfileFields,
        ) -> Result<CharacterProfile, LookupError> {
            assert_eq!(fields, &ProfileFields::all_seasons());
            self.calls.lock().unwrap().push(name.to_string());
            let key = name.to_lowercase();
            if self.broken.contains(&key) {
                return Err(LookupError::Service("rate limited".into()));
            }
            if self.slow.contains(&key) {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            self.characters
                .get(&key)
                .cloned()
                .ok_or_else(|| LookupError::NotFound("Character".into()))
        }
    }

    fn request(name: &str) -> WarbandRequest {
        WarbandRequest {
            region: "us".into(),
            realm: "Area 52".into(),
            name: name.into(),
        }
    }

    #[tokio::test]
    async fn test_main_not_found_is_fatal() {
        let lookup = FakeLookup::default();
        let err = analyze_warband(&lookup, &request("Thrall"), &WarbandOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        // No candidates probed after the main lookup failed.
        assert_eq!(lookup.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_main_service_error_is_fatal() {
        let lookup = FakeLookup::default().broken("Thrall");
        let err = analyze_warband(&lookup, &request("Thrall"), &WarbandOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::Service(_)));
    }

    #[tokio::test]
    async fn test_empty_name_rejected_before_lookup() {
        let lookup = FakeLookup::default();
        let err = analyze_warband(&lookup, &request("  "), &WarbandOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LookupError::InvalidInput(_)));
        assert!(lookup.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_two_alts_found() {
        let lookup = FakeLookup::default()
            .with(profile(
                "Thrall",
                "Shaman",
                "Enhancement",
                &[("season-tww-1", 2100.0), ("season-df-4", 2600.0)],
            ))
            .with(profile(
                "Thrallalt",
                "Warrior",
                "Protection",
                &[("season-tww-1", 2450.0), ("season-df-3", 1900.0)],
            ))
            .with(profile("Thrall2", "Mage", "Frost", &[("season-df-4", 3050.0)]))
            .broken("Thrallbank");

        let analysis = analyze_warband(&lookup, &request("Thrall"), &WarbandOptions::default())
            .await
            .unwrap();

        assert_eq!(analysis.total_characters, 3);
        assert!(analysis.main_character.is_main);
        assert_eq!(analysis.main_character.character.name, "Thrall");
        assert_eq!(analysis.characters.iter().filter(|c| c.is_main).count(), 1);

        let order: Vec<&str> = analysis
            .characters
            .iter()
            .map(|c| c.character.name.as_str())
            .collect();
        assert_eq!(order, vec!["Thrall2", "Thrall", "Thrallalt"]);

        let bests = &analysis.highest_scores_by_season_across_warband;
        assert_eq!(bests.len(), 3);
        assert_eq!(bests["season-tww-1"].score, 2450.0);
        assert_eq!(bests["season-tww-1"].character, "Thrallalt");
        assert_eq!(bests["season-tww-1"].character_class, "Warrior");
        assert_eq!(bests["season-df-4"].score, 3050.0);
        assert_eq!(bests["season-df-4"].character_spec, "Frost");
        assert_eq!(bests["season-df-3"].score, 1900.0);
    }

    #[tokio::test]
    async fn test_case_variants_probed_once() {
        let lookup = FakeLookup::default().with(profile("Thrall", "Shaman", "Elemental", &[]));
        analyze_warband(&lookup, &request("Thrall"), &WarbandOptions::default())
            .await
            .unwrap();

        let calls = lookup.calls.lock().unwrap();
        let lowered: HashSet<String> = calls.iter().map(|c| c.to_lowercase()).collect();
        assert_eq!(lowered.len(), calls.len());
    }

    #[tokio::test]
    async fn test_no_alts_still_succeeds() {
        let lookup = FakeLookup::default().with(profile("Jaina", "Mage", "Frost", &[]));
        let analysis = analyze_warband(&lookup, &request("Jaina"), &WarbandOptions::default())
            .await
            .unwrap();
        assert_eq!(analysis.total_characters, 1);
        assert_eq!(analysis.main_character.highest_season_score, 0.0);
        assert!(analysis.highest_scores_by_season_across_warband.is_empty());
    }

    #[tokio::test]
    async fn test_slow_candidate_dropped() {
        let lookup = FakeLookup::default()
            .with(profile("Jaina", "Mage", "Frost", &[("season-tww-1", 1000.0)]))
            .slow(profile("Jainaalt", "Priest", "Holy", &[("season-tww-1", 2000.0)]));
        let options = WarbandOptions {
            concurrency: 4,
            candidate_timeout: Duration::from_millis(50),
        };

        let analysis = analyze_warband(&lookup, &request("Jaina"), &options)
            .await
            .unwrap();
        assert_eq!(analysis.total_characters, 1);
        assert_eq!(
            analysis.highest_scores_by_season_across_warband["season-tww-1"].character,
            "Jaina"
        );
    }

    #[tokio::test]
    async fn test_sequential_and_parallel_agree() {
        let lookup = FakeLookup::default()
            .with(profile("Varian", "Warrior", "Arms", &[("season-tww-1", 1500.0)]))
            .with(profile("Varianalt", "Rogue", "Subtlety", &[("season-tww-1", 1700.0)]))
            .with(profile("Varian7", "Druid", "Feral", &[("season-sl-2", 900.0)]));

        let sequential = WarbandOptions {
            concurrency: 1,
            ..Default::default()
        };
        let parallel = WarbandOptions {
            concurrency: 16,
            ..Default::default()
        };
        let a = analyze_warband(&lookup, &request("Varian"), &sequential)
            .await
            .unwrap();
        let b = analyze_warband(&lookup, &request("Varian"), &parallel)
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_build_keeps_first_on_tie() {
        let analysis = WarbandAnalysis::build(
            profile("Anduin", "Priest", "Holy", &[("season-tww-1", 2000.0)]),
            vec![profile("Anduinalt", "Paladin", "Holy", &[("season-tww-1", 2000.0)])],
        );
        // Either attribution is acceptable; the score itself is not.
        let best = &analysis.highest_scores_by_season_across_warband["season-tww-1"];
        assert_eq!(best.score, 2000.0);
        assert!(best.character == "Anduin" || best.character == "Anduinalt");
    }

    #[test]
    fn test_analysis_serializes_camel_case() {
        let analysis = WarbandAnalysis::build(
            profile("Sylvanas", "Hunter", "Marksmanship", &[("season-df-1", 1234.5)]),
            vec![],
        );
        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["totalCharacters"], 1);
        assert_eq!(json["mainCharacter"]["isMain"], true);
        assert_eq!(
            json["highestScoresBySeasonAcrossWarband"]["season-df-1"]["characterClass"],
            "Hunter"
        );
        assert_eq!(json["characters"][0]["highestSeasonScore"], 1234.5);
    }
}
