// Season score extraction for a single character.

use crate::raiderio::CharacterProfile;

/// Highest aggregate score across every season on record, 0 when none.
pub fn highest_season_score(profile: &CharacterProfile) -> f64 {
    profile
        .mythic_plus_scores_by_season
        .iter()
        .map(|s| s.scores.all)
        .fold(0.0, f64::max)
}

/// Aggregate score of the first listed season, 0 when none.
pub fn current_season_score(profile: &CharacterProfile) -> f64 {
    profile
        .mythic_plus_scores_by_season
        .first()
        .map(|s| s.scores.all)
        .unwrap_or(0.0)
}
