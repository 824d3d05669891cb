// Season id lookup table and recency ordering.
//
// Season ids are opaque strings (`season-tww-1`); recency comes from the
// expansion token embedded in the id, then the trailing season number.

use std::cmp::Ordering;

use super::{CharacterProfile, SeasonScore};

const SEASON_NAMES: &[(&str, &str)] = &[
    ("season-df-1", "Dragonflight Season 1"),
    ("season-df-2", "Dragonflight Season 2"),
    ("season-df-3", "Dragonflight Season 3"),
    ("season-df-4", "Dragonflight Season 4"),
    ("season-tww-1", "The War Within Season 1"),
    ("season-tww-2", "The War Within Season 2"),
    ("season-sl-1", "Shadowlands Season 1"),
    ("season-sl-2", "Shadowlands Season 2"),
    ("season-sl-3", "Shadowlands Season 3"),
    ("season-sl-4", "Shadowlands Season 4"),
    ("season-bfa-1", "Battle for Azeroth Season 1"),
    ("season-bfa-2", "Battle for Azeroth Season 2"),
    ("season-bfa-3", "Battle for Azeroth Season 3"),
    ("season-bfa-4", "Battle for Azeroth Season 4"),
];

// Checked in order; first token contained in the id wins.
const EXPANSION_RANKS: &[(&str, u32)] = &[("tww", 1000), ("df", 900), ("sl", 800), ("bfa", 700)];

/// Human-readable name for a season id.
///
/// Unknown ids fall back to hyphens-as-spaces with every word capitalized.
pub fn season_name(season_id: &str) -> String {
    if let Some((_, name)) = SEASON_NAMES.iter().find(|(id, _)| *id == season_id) {
        return (*name).to_string();
    }
    season_id
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Expansion rank, higher is newer. 0 for unrecognized ids.
pub fn expansion_rank(season_id: &str) -> u32 {
    EXPANSION_RANKS
        .iter()
        .find(|(token, _)| season_id.contains(token))
        .map(|(_, rank)| *rank)
        .unwrap_or(0)
}

/// Trailing `-<digits>` of the id, or 0.
pub fn season_number(season_id: &str) -> u32 {
    season_id
        .rsplit_once('-')
        .and_then(|(_, tail)| {
            if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
                tail.parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

/// Comparator placing newer seasons first.
pub fn newest_first(a: &str, b: &str) -> Ordering {
    expansion_rank(b)
        .cmp(&expansion_rank(a))
        .then_with(|| season_number(b).cmp(&season_number(a)))
}

/// Copy of `seasons` sorted newest first. Stable for equal keys.
pub fn sort_seasons(seasons: &[SeasonScore]) -> Vec<SeasonScore> {
    let mut sorted = seasons.to_vec();
    sorted.sort_by(|a, b| newest_first(&a.season, &b.season));
    sorted
}

/// The season Raider.IO lists first for this character.
pub fn current_season(profile: &CharacterProfile) -> Option<&str> {
    profile
        .mythic_plus_scores_by_season
        .first()
        .map(|s| s.season.as_str())
}
