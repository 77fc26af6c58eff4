use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A first-party cookie with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub expires: DateTime<Utc>,
    pub path: String,
    #[serde(default)]
    pub secure: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            expires,
            path: "/".to_string(),
            secure: false,
        }
    }

    /// Cookie written by a script running on `page`: site-wide path,
    /// `SameSite=Lax`, and `Secure` when the page itself is served over https.
    pub fn for_page(
        name: impl Into<String>,
        value: impl Into<String>,
        lifetime: Duration,
        now: DateTime<Utc>,
        page: &Url,
    ) -> Self {
        let mut cookie = Self::new(name, value, now + lifetime);
        cookie.secure = page.scheme() == "https";
        cookie
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now
    }

    /// Render the cookie the way a script assigns it to `document.cookie`.
    pub fn to_set_cookie_header(&self) -> String {
        let mut header = format!(
            "{}={}; expires={}; path={}; SameSite=Lax",
            self.name,
            self.value,
            self.expires.format("%a, %d %b %Y %H:%M:%S GMT"),
            self.path,
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Split a `document.cookie` string into name/value pairs.
///
/// Names are trimmed and compared exactly by callers, so `xredirectSuppressed`
/// never stands in for `redirectSuppressed`. Pairs without `=` are skipped.
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_set_cookie_header() {
        let now = Utc.with_ymd_and_hms(2024, 12, 3, 10, 0, 0).unwrap();
        let page = Url::parse("https://www.example.org/").unwrap();
        let cookie = Cookie::for_page("redirectSuppressed", "true", Duration::days(1), now, &page);

        assert_eq!(
            cookie.to_set_cookie_header(),
            "redirectSuppressed=true; expires=Wed, 04 Dec 2024 10:00:00 GMT; path=/; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn test_plain_http_page_is_not_secure() {
        let now = Utc.with_ymd_and_hms(2024, 12, 3, 10, 0, 0).unwrap();
        let page = Url::parse("http://localhost:8080/").unwrap();
        let cookie = Cookie::for_page("originatingUrl", "x", Duration::seconds(1800), now, &page);

        assert!(!cookie.secure);
        assert!(!cookie.to_set_cookie_header().contains("Secure"));
    }

    #[test]
    fn test_expiry_is_absolute() {
        let now = Utc.with_ymd_and_hms(2024, 12, 3, 10, 0, 0).unwrap();
        let cookie = Cookie::new("a", "b", now + Duration::minutes(30));

        assert!(!cookie.is_expired(now + Duration::minutes(29)));
        assert!(cookie.is_expired(now + Duration::minutes(30)));
    }

    #[test]
    fn test_jar_entry_ignores_unknown_attributes() {
        let cookie: Cookie = serde_json::from_str(
            r#"{"name":"a","value":"b","expires":"2024-12-03T10:00:00Z","path":"/","same_site":"Strict"}"#,
        )
        .unwrap();

        assert!(!cookie.secure);
        assert!(cookie.to_set_cookie_header().ends_with("; path=/; SameSite=Lax"));
    }

    #[test]
    fn test_parse_cookie_header() {
        let pairs = parse_cookie_header("xredirectSuppressed=1; originatingUrl=https://a.org/p?x=1 ;junk; =v");

        assert_eq!(
            pairs,
            vec![
                ("xredirectSuppressed".to_string(), "1".to_string()),
                ("originatingUrl".to_string(), "https://a.org/p?x=1".to_string()),
            ]
        );
        assert!(!pairs.iter().any(|(name, _)| name == "redirectSuppressed"));
    }
}
