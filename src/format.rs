// Display categorization for scores, keystone upgrades, clear times and roles.

use serde::{Deserialize, Serialize};

/// Score color bands, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    Orange,
    Pink,
    Purple,
    Blue,
    Green,
    Yellow,
    Gray,
}

const SCORE_THRESHOLDS: &[(f64, ScoreTier)] = &[
    (3000.0, ScoreTier::Orange),
    (2500.0, ScoreTier::Pink),
    (2000.0, ScoreTier::Purple),
    (1500.0, ScoreTier::Blue),
    (1000.0, ScoreTier::Green),
    (500.0, ScoreTier::Yellow),
];

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        SCORE_THRESHOLDS
            .iter()
            .find(|(min, _)| score >= *min)
            .map(|(_, tier)| *tier)
            .unwrap_or(ScoreTier::Gray)
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ScoreTier::Orange => "text-orange-400",
            ScoreTier::Pink => "text-pink-400",
            ScoreTier::Purple => "text-purple-400",
            ScoreTier::Blue => "text-blue-400",
            ScoreTier::Green => "text-green-400",
            ScoreTier::Yellow => "text-yellow-400",
            ScoreTier::Gray => "text-gray-400",
        }
    }
}

/// Keystone result by upgrade count. Exact match, no ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpgradeTier {
    Gold,
    Silver,
    Bronze,
    Depleted,
}

impl UpgradeTier {
    pub fn from_upgrades(upgrades: u8) -> Self {
        match upgrades {
            3 => UpgradeTier::Gold,
            2 => UpgradeTier::Silver,
            1 => UpgradeTier::Bronze,
            _ => UpgradeTier::Depleted,
        }
    }

    pub fn stars(self) -> &'static str {
        match self {
            UpgradeTier::Gold => "★★★",
            UpgradeTier::Silver => "★★",
            UpgradeTier::Bronze => "★",
            UpgradeTier::Depleted => "",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            UpgradeTier::Gold => "text-yellow-400",
            UpgradeTier::Silver => "text-gray-300",
            UpgradeTier::Bronze => "text-orange-600",
            UpgradeTier::Depleted => "text-red-400",
        }
    }
}

/// `m:ss`, sub-second remainder truncated.
pub fn format_time(time_ms: u64) -> String {
    let total_seconds = time_ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Tank,
    Healer,
    Dps,
    Unknown,
}

impl Role {
    /// Case-insensitive; anything unrecognized is `Unknown`.
    pub fn parse(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "tank" => Role::Tank,
            "healer" => Role::Healer,
            "dps" => Role::Dps,
            _ => Role::Unknown,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Role::Tank => "🛡️",
            Role::Healer => "❤️",
            Role::Dps => "⚔️",
            Role::Unknown => "❓",
        }
    }
}
