// Alternate-character name guesses derived from a main character's name.
//
// There is no upstream source for "characters on the same account", so this
// produces a small fixed set of plausible names to probe. Output is
// deterministic and deduplicated (first occurrence kept).

use std::collections::HashSet;

/// Utility words plus class/role shorthand commonly tacked onto alt names.
const SUFFIXES: &[&str] = &["alt", "bank", "twink", "dk", "dh", "heal", "tank"];

const PREFIXES: &[&str] = &["alt", "bank", "twink"];

const TRUNCATE_LEN: usize = 4;

/// Candidate alt names for `base_name`.
pub fn generate_alt_names(base_name: &str) -> Vec<String> {
    let lower = base_name.to_lowercase();
    let mut candidates = Vec::new();

    for suffix in SUFFIXES {
        candidates.push(format!("{base_name}{suffix}"));
        candidates.push(format!("{lower}{suffix}"));
    }

    for prefix in PREFIXES {
        candidates.push(format!("{prefix}{base_name}"));
        candidates.push(format!("{prefix}{lower}"));
    }

    if base_name.chars().count() > TRUNCATE_LEN {
        let short: String = base_name.chars().take(TRUNCATE_LEN).collect();
        candidates.push(format!("{short}alt"));
        candidates.push(format!("{short}bank"));
        candidates.push(short);
    }

    for digit in 1..=9 {
        candidates.push(format!("{base_name}{digit}"));
        candidates.push(format!("{lower}{digit}"));
    }

    let mut seen = HashSet::new();
    candidates.retain(|name| seen.insert(name.clone()));
    candidates
}
