// LLM-friendly documentation endpoint content.

pub const LLMS_TXT: &str = r#"# WoW Tools API
> Mythic+ character lookups, warband alt discovery, combat-log summaries and raid rosters for World of Warcraft.

## API Base URL
/api/

## Authentication
None. WarcraftLogs endpoints need server-side credentials and answer 503 without them.

## Key Endpoints
- GET /api/character?region=&realm=&name=&fields= - Raider.IO character profile
- GET /api/character/overview?region=&realm=&name= - Profile with season history, formatted runs and links
- GET /api/affixes?region= - Current weekly affixes
- GET /api/runs?region=&dungeon=&affixes=&page= - Dungeon leaderboard runs (dungeon defaults to all, affixes to current)
- GET /api/warband?region=&realm=&name= - Discover alts and best scores per season
- GET /api/warband?url= - Same, from a Raider.IO profile URL
- GET /api/links?region=&realm=&name= - Raider.IO, WarcraftLogs and WoWProgress profile links
- GET /api/logs/report?url= or ?code= - Combat-log report summary with fights
- GET /api/logs/report/{code}/fights/{fight_id}/damage - Damage done, highest first
- GET /api/logs/report/{code}/fights/{fight_id}/healing - Healing done, highest first
- GET/POST /api/rosters - List/create raid rosters
- GET/PUT/DELETE /api/rosters/{id} - Get/update/delete a roster
- POST /api/rosters/{id}/members - Add a member
- PUT/DELETE /api/rosters/{id}/members/{member_id} - Update/remove a member
- GET /api/rosters/{id}/summary - Members and confirmed members per role
- GET/POST /api/strategies - List/create boss strategy notes
- PUT/DELETE /api/strategies/{id} - Update/delete a strategy note
- GET /metrics - Prometheus metrics
- GET /health - Liveness

## Errors
JSON `{"error": "..."}` with 400 (bad input), 404 (not found), 502 (upstream failure) or 503 (not configured).

## Warband discovery
Alts are found by probing name variants (suffixes, prefixes, a 4-letter stem and digits) on the same realm.
Characters that merely share a generated name are indistinguishable from real alts.
"#;
