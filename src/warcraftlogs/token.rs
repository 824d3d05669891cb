// OAuth client-credentials token cache.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Tokens are treated as expired this many seconds before the server says so.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Body of a successful client-credentials exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Holds at most one bearer token and its effective expiry instant.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
    token: Option<CachedToken>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached token if `now` is still before its expiry.
    pub fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        self.token
            .as_ref()
            .filter(|t| now < t.expires_at)
            .map(|t| t.access_token.as_str())
    }

    /// Cache a freshly issued token, applying [`EXPIRY_MARGIN_SECS`].
    ///
    /// A lifetime outside chrono's range is stored as already expired.
    pub fn store(&mut self, response: TokenResponse, issued_at: DateTime<Utc>) -> &str {
        let lifetime = response.expires_in.saturating_sub(EXPIRY_MARGIN_SECS);
        let expires_at = Duration::try_seconds(lifetime)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .unwrap_or(issued_at);
        let cached = self.token.insert(CachedToken {
            access_token: response.access_token,
            expires_at,
        });
        &cached.access_token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.token.as_ref().map(|t| t.expires_at)
    }

    pub fn clear(&mut self) {
        self.token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response(token: &str, expires_in: i64) -> TokenResponse {
        TokenResponse {
            access_token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }

    #[test]
    fn test_empty_cache_has_no_token() {
        let cache = TokenCache::new();
        assert!(cache.valid_token(Utc::now()).is_none());
    }

    #[test]
    fn test_token_valid_until_margin() {
        let issued = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let mut cache = TokenCache::new();
        assert_eq!(cache.store(response("abc", 3600), issued), "abc");

        assert_eq!(
            cache.expires_at(),
            Some(issued + Duration::seconds(3600 - 60))
        );
        assert_eq!(
            cache.valid_token(issued + Duration::seconds(3539)),
            Some("abc")
        );
        assert!(cache.valid_token(issued + Duration::seconds(3540)).is_none());
    }

    #[test]
    fn test_store_replaces_previous() {
        let issued = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let mut cache = TokenCache::new();
        cache.store(response("old", 3600), issued);
        cache.store(response("new", 3600), issued + Duration::seconds(10));
        assert_eq!(cache.valid_token(issued + Duration::seconds(20)), Some("new"));

        cache.clear();
        assert!(cache.valid_token(issued).is_none());
    }

    #[test]
    fn test_short_lived_token_is_immediately_stale() {
        let issued = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let mut cache = TokenCache::new();
        cache.store(response("brief", 30), issued);
        assert!(cache.valid_token(issued).is_none());
    }

    #[test]
    fn test_out_of_range_lifetime_is_expired() {
        let issued = Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap();
        let mut cache = TokenCache::new();

        cache.store(response("huge", i64::MAX), issued);
        assert_eq!(cache.expires_at(), Some(issued));
        assert!(cache.valid_token(issued).is_none());

        cache.store(response("negative", i64::MIN), issued);
        assert_eq!(cache.expires_at(), Some(issued));
        assert!(cache.valid_token(issued).is_none());
    }
}
