//! Names and helpers shared by the dispatcher and the return banner.
//!
//! The two components never talk to each other directly; these query
//! parameters and cookies are the whole contract between them.

use url::Url;

/// Overrides "today" for pre-launch testing.
pub const SIMULATE_DATE_PARAM: &str = "simulate-date";
/// Visitor opt-out; also appended by the banner's return link.
pub const NO_REDIRECT_PARAM: &str = "no-redirect";
/// Presence-only marker added to every redirect.
pub const WAS_REDIRECTED_PARAM: &str = "was-redirected";
/// Full URL of the page the visitor was redirected away from.
pub const ORIGINATING_URL_PARAM: &str = "originating-url";

pub const DEFAULT_SUPPRESSION_COOKIE: &str = "redirectSuppressed";
pub const DEFAULT_ORIGIN_COOKIE: &str = "originatingUrl";

/// Parse `candidate` and accept it only as an `http`/`https` URL.
pub fn navigable_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

pub fn has_param(url: &Url, name: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == name)
}

/// First value of `name`, with empty values treated as absent.
pub fn param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Copy of `url` with every `name` parameter dropped. Other parameters keep
/// their order, and the fragment is left alone.
pub fn without_param(url: &Url, name: &str) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(key, _)| key != name)
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(&kept);
    }
    stripped
}

/// Set `name` to `value`, replacing the first occurrence in place and
/// dropping any later ones. Appends when the parameter is absent.
pub fn set_param(url: &mut Url, name: &str, value: &str) {
    let mut replaced = false;
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter_map(|(key, existing)| {
            if key != name {
                Some((key, existing))
            } else if replaced {
                None
            } else {
                replaced = true;
                Some((key, value.to_string()))
            }
        })
        .collect();

    if !replaced {
        pairs.push((name.to_string(), value.to_string()));
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
}

/// `origin + path` of a page, without query or fragment.
pub fn page_base(url: &Url) -> String {
    format!("{}{}", url.origin().ascii_serialization(), url.path())
}
