// Profile URL parsing and outbound profile links.

use reqwest::Url;
use serde::Serialize;

const CHARACTERS_SEGMENT: &str = "/characters/";

/// Character identity pulled out of a profile URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRef {
    pub region: String,
    pub realm: String,
    pub name: String,
}

/// Parse `.../characters/<region>/<realm>/<name>`.
///
/// Returns `None` for anything else; callers fall back to treating the
/// input as a raw name + realm.
pub fn parse_profile_url(url: &str) -> Option<ProfileRef> {
    let start = url.find(CHARACTERS_SEGMENT)? + CHARACTERS_SEGMENT.len();
    let rest = &url[start..];
    let rest = rest.split(['?', '#']).next().unwrap_or(rest);

    let mut segments = rest.split('/');
    let region = segments.next().filter(|s| !s.is_empty())?;
    let realm = segments.next().filter(|s| !s.is_empty())?;
    let name = segments.next().filter(|s| !s.is_empty())?;

    Some(ProfileRef {
        region: region.to_lowercase(),
        realm: realm.replace('-', " "),
        name: name.to_string(),
    })
}

/// External profile pages for one character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileLinks {
    pub raiderio: String,
    pub warcraftlogs: String,
    pub wowprogress: String,
}

impl ProfileLinks {
    pub fn new(region: &str, realm: &str, name: &str) -> Self {
        Self {
            raiderio: raiderio_url(name, realm, region),
            warcraftlogs: warcraftlogs_url(name, realm, region),
            wowprogress: wowprogress_url(name, realm, region),
        }
    }
}

pub fn raiderio_url(name: &str, realm: &str, region: &str) -> String {
    encoded_link("https://raider.io/characters/", &[region, realm, name])
}

/// WarcraftLogs expects an upper-case region.
pub fn warcraftlogs_url(name: &str, realm: &str, region: &str) -> String {
    let region = region.to_uppercase();
    encoded_link(
        "https://www.warcraftlogs.com/character/",
        &[&region, realm, name],
    )
}

pub fn wowprogress_url(name: &str, realm: &str, region: &str) -> String {
    encoded_link("https://www.wowprogress.com/character/", &[region, realm, name])
}

fn encoded_link(base: &str, segments: &[&str]) -> String {
    let mut url = Url::parse(base).expect("link base is an absolute URL");
    url.path_segments_mut()
        .expect("link base has a path")
        .pop_if_empty()
        .extend(segments);
    url.into()
}
