use std::sync::LazyLock;

use axum::http::HeaderMap;
use regex::Regex;

/// Primary header MAG boxes send their address in.
pub const MAC_HEADER: &str = "x-mac";
/// Alternate header some firmwares use instead.
pub const MAC_HEADER_ALT: &str = "mac";
/// Address echoed back when the box did not identify itself.
pub const PLACEHOLDER_MAC: &str = "00:1A:79:00:00:00";

static MAC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-Fa-f]{2}:){5}[0-9A-Fa-f]{2}$").expect("valid MAC regex")
});

/// Canonical registry key: uppercase with every colon removed.
pub fn normalize(raw: &str) -> String {
    raw.to_uppercase().replace(':', "")
}

/// Strict `HH:HH:HH:HH:HH:HH` check used by registration.
pub fn is_valid_mac(raw: &str) -> bool {
    MAC_PATTERN.is_match(raw)
}

/// Device address as supplied by the caller plus its normalized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub raw: String,
    pub normalized: String,
}

impl DeviceIdentity {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    /**
        Pick the first non-empty candidate in priority order:
        primary header, alternate header, query parameter.

        Returns `None` when the box sent no address at all.
    */
    pub fn from_candidates(
        primary: Option<&str>,
        alternate: Option<&str>,
        query: Option<&str>,
    ) -> Option<Self> {
        [primary, alternate, query]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.is_empty())
            .map(Self::new)
    }

    /// Resolve the identity of an inbound portal request.
    pub fn from_request(headers: &HeaderMap, query_mac: Option<&str>) -> Option<Self> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        Self::from_candidates(header(MAC_HEADER), header(MAC_HEADER_ALT), query_mac)
    }
}

/// Raw address of an optional identity, or the placeholder.
pub fn display_mac(identity: Option<&DeviceIdentity>) -> &str {
    identity.map(|id| id.raw.as_str()).unwrap_or(PLACEHOLDER_MAC)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_normalize_case_and_delimiters() {
        assert_eq!(normalize("aa:bb:cc:dd:ee:ff"), normalize("AABBCCDDEEFF"));
        assert_eq!(normalize("aa:bb:cc:dd:ee:ff"), "AABBCCDDEEFF");
    }

    #[test]
    fn test_normalize_idempotent() {
        let once = normalize("00:1a:79:Ab:cD:eF");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_normalize_does_not_validate() {
        assert_eq!(normalize("not-a-mac"), "NOT-A-MAC");
    }

    #[test]
    fn test_valid_mac() {
        assert!(is_valid_mac("AA:BB:CC:DD:EE:FF"));
        assert!(is_valid_mac("00:1a:79:ab:cd:ef"));
    }

    #[test]
    fn test_invalid_mac() {
        assert!(!is_valid_mac("AABBCCDDEEFF"));
        assert!(!is_valid_mac("GG:HH:II:JJ:KK:LL"));
        assert!(!is_valid_mac("AA:BB:CC:DD:EE"));
        assert!(!is_valid_mac("AA:BB:CC:DD:EE:FF:00"));
        assert!(!is_valid_mac("AA-BB-CC-DD-EE-FF"));
        assert!(!is_valid_mac(""));
    }

    #[test]
    fn test_candidate_priority() {
        let id = DeviceIdentity::from_candidates(
            Some("00:1A:79:00:00:01"),
            Some("00:1A:79:00:00:02"),
            Some("00:1A:79:00:00:03"),
        )
        .unwrap();
        assert_eq!(id.raw, "00:1A:79:00:00:01");

        let id = DeviceIdentity::from_candidates(None, Some("00:1a:79:00:00:02"), None).unwrap();
        assert_eq!(id.normalized, "001A79000002");

        let id = DeviceIdentity::from_candidates(None, None, Some("00:1A:79:00:00:03")).unwrap();
        assert_eq!(id.raw, "00:1A:79:00:00:03");
    }

    #[test]
    fn test_empty_candidates_fall_through() {
        let id = DeviceIdentity::from_candidates(Some(""), Some(""), Some("aa:bb")).unwrap();
        assert_eq!(id.normalized, "AABB");

        assert!(DeviceIdentity::from_candidates(Some(""), None, Some("")).is_none());
        assert!(DeviceIdentity::from_candidates(None, None, None).is_none());
    }

    #[test]
    fn test_from_request_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("mac", HeaderValue::from_static("00:1a:79:00:00:02"));
        let id = DeviceIdentity::from_request(&headers, Some("00:1A:79:00:00:03")).unwrap();
        assert_eq!(id.raw, "00:1a:79:00:00:02");

        headers.insert("x-mac", HeaderValue::from_static("00:1a:79:00:00:01"));
        let id = DeviceIdentity::from_request(&headers, None).unwrap();
        assert_eq!(id.raw, "00:1a:79:00:00:01");
    }

    #[test]
    fn test_display_mac() {
        assert_eq!(display_mac(None), PLACEHOLDER_MAC);
        let id = DeviceIdentity::new("aa:bb:cc:dd:ee:ff");
        assert_eq!(display_mac(Some(&id)), "aa:bb:cc:dd:ee:ff");
    }
}
