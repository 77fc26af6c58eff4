//! Where the visitor came from, and how to show and return to it.

use tracing::warn;
use url::Url;

use crate::host::Window;
use crate::protocol::{self, NO_REDIRECT_PARAM, ORIGINATING_URL_PARAM};
use crate::storage::CookieStore;

/// Label used when no origin can be named.
pub const FALLBACK_LABEL: &str = "the website";

/// Every place the originating page might be recorded, read once at load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginSources {
    /// `originating-url` query parameter.
    pub param: Option<String>,
    /// Origin cookie left by an earlier page view.
    pub cookie: Option<String>,
    /// `document.referrer`.
    pub referrer: Option<String>,
}

impl OriginSources {
    pub fn read<W, S>(window: &W, cookies: &S, cookie_name: &str) -> Self
    where
        W: Window + ?Sized,
        S: CookieStore + ?Sized,
    {
        Self {
            param: protocol::param(window.location(), ORIGINATING_URL_PARAM),
            cookie: cookies.get(cookie_name).filter(|value| !value.is_empty()),
            referrer: window
                .referrer()
                .filter(|value| !value.is_empty())
                .map(str::to_string),
        }
    }

    /// The query parameter, if it is safe to persist and navigate to.
    pub fn trusted_param(&self) -> Option<Url> {
        self.param.as_deref().and_then(protocol::navigable_url)
    }

    /// First http(s) origin among the parameter and the cookie.
    pub fn trusted_origin(&self) -> Option<Url> {
        self.trusted_param()
            .or_else(|| self.cookie.as_deref().and_then(protocol::navigable_url))
    }

    /// Raw value the link text is derived from: parameter, cookie, referrer.
    pub fn display_source(&self) -> Option<&str> {
        self.param
            .as_deref()
            .or(self.cookie.as_deref())
            .or(self.referrer.as_deref())
    }

    pub fn link_label(&self) -> String {
        self.display_source()
            .and_then(extract_label)
            .unwrap_or_else(|| FALLBACK_LABEL.to_string())
    }

    /// `href` for the return link. Untrusted origins never end up here.
    pub fn link_href(&self) -> String {
        self.trusted_origin()
            .map(String::from)
            .unwrap_or_else(|| "#".to_string())
    }

    /// Where clicking the return link goes: the origin (or referrer, or this
    /// page) with `no-redirect` set, so the dispatcher stands down.
    pub fn back_target(&self, location: &Url) -> String {
        let candidate = self
            .trusted_origin()
            .map(String::from)
            .or_else(|| self.referrer.clone())
            .unwrap_or_else(|| protocol::page_base(location));

        match protocol::navigable_url(&candidate) {
            Some(mut target) => {
                protocol::set_param(&mut target, NO_REDIRECT_PARAM, "");
                target.into()
            }
            None => {
                warn!(candidate = %candidate, "return target is not an http(s) URL, going back to this page");
                format!("{}?{}", protocol::page_base(location), NO_REDIRECT_PARAM)
            }
        }
    }
}

/// Human label for an origin: the hostname for web URLs, a page name for
/// local files. `None` when nothing better than the raw input is available.
pub fn extract_label(source: &str) -> Option<String> {
    let label = match Url::parse(source) {
        Ok(url) => label_from_url(&url),
        Err(_) => label_from_unparsed(source),
    }?;

    (!label.is_empty() && label != source).then_some(label)
}

fn label_from_url(url: &Url) -> Option<String> {
    match url.scheme() {
        "file" => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(|name| strip_html_suffix(name).to_string()),
        _ => url.host_str().map(str::to_string),
    }
}

fn label_from_unparsed(source: &str) -> Option<String> {
    let host_start = ["https://", "http://"]
        .iter()
        .filter_map(|prefix| source.find(prefix).map(|at| at + prefix.len()))
        .min();
    if let Some(start) = host_start {
        let host = source[start..].split('/').next().unwrap_or_default();
        return (!host.is_empty()).then(|| host.to_string());
    }

    if source.to_ascii_lowercase().starts_with("file:///") {
        let name = source.rsplit('/').next().unwrap_or_default();
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".html") || lower.ends_with(".htm") {
            return Some(strip_html_suffix(name).to_string());
        }
    }

    None
}

fn strip_html_suffix(name: &str) -> &str {
    let lower = name.to_ascii_lowercase();
    [".html", ".htm"]
        .iter()
        .find(|suffix| lower.ends_with(*suffix))
        .map(|suffix| &name[..name.len() - suffix.len()])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(param: Option<&str>, cookie: Option<&str>, referrer: Option<&str>) -> OriginSources {
        OriginSources {
            param: param.map(str::to_string),
            cookie: cookie.map(str::to_string),
            referrer: referrer.map(str::to_string),
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(extract_label("https://a.org/p").as_deref(), Some("a.org"));
        assert_eq!(extract_label("http://localhost:3000/x").as_deref(), Some("localhost"));
        assert_eq!(
            extract_label("file:///Users/me/site/Landing.HTML").as_deref(),
            Some("Landing")
        );
        assert_eq!(extract_label("file:///tmp/page.htm").as_deref(), Some("page"));
        assert_eq!(extract_label("file:///").as_deref(), None);
        assert_eq!(extract_label("file:///tmp/.html").as_deref(), None);
    }

    #[test]
    fn test_unparseable_labels() {
        assert_eq!(extract_label("https://exa mple.org/p").as_deref(), Some("exa mple.org"));
        assert_eq!(extract_label("garbage"), None);
        assert_eq!(extract_label("javascript:alert(1)"), None);
    }

    #[test]
    fn test_label_precedence() {
        let all = sources(Some("https://param.org/"), Some("https://cookie.org/"), Some("https://ref.org/"));
        assert_eq!(all.link_label(), "param.org");

        let no_param = sources(None, Some("https://cookie.org/"), Some("https://ref.org/"));
        assert_eq!(no_param.link_label(), "cookie.org");

        let referrer_only = sources(None, None, Some("https://ref.org/"));
        assert_eq!(referrer_only.link_label(), "ref.org");

        assert_eq!(OriginSources::default().link_label(), FALLBACK_LABEL);
    }

    #[test]
    fn test_untrusted_param_is_not_linked() {
        let hostile = sources(Some("javascript:alert(1)"), Some("https://cookie.org/p"), None);
        assert_eq!(hostile.link_href(), "https://cookie.org/p");
        assert_eq!(hostile.link_label(), FALLBACK_LABEL);

        let nothing = sources(Some("javascript:alert(1)"), None, None);
        assert_eq!(nothing.link_href(), "#");
    }

    #[test]
    fn test_back_target_prefers_origin() {
        let here = Url::parse("https://support.example.org/donate?tx=ABC").unwrap();
        let origin = sources(Some("https://a.org/p?utm=x"), None, Some("https://ref.org/"));
        assert_eq!(origin.back_target(&here), "https://a.org/p?utm=x&no-redirect=");

        let referrer = sources(None, None, Some("https://ref.org/home"));
        assert_eq!(referrer.back_target(&here), "https://ref.org/home?no-redirect=");

        assert_eq!(
            OriginSources::default().back_target(&here),
            "https://support.example.org/donate?no-redirect="
        );
    }

    #[test]
    fn test_back_target_falls_back_to_this_page() {
        let here = Url::parse("https://support.example.org/donate?tx=ABC").unwrap();
        let local = sources(None, None, Some("file:///tmp/landing.html"));
        assert_eq!(
            local.back_target(&here),
            "https://support.example.org/donate?no-redirect"
        );
    }
}
