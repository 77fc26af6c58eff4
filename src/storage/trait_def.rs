use crate::models::Cookie;

/// Per-origin cookie store shared by every script on the site.
///
/// Implementations hide expired cookies from `get`; nothing has to clear a
/// cookie for its lifetime to end.
pub trait CookieStore {
    /// Value of a live cookie named exactly `name`.
    fn get(&self, name: &str) -> Option<String>;

    /// Create or overwrite a cookie. Writing an already-expired cookie
    /// removes it, as a browser would.
    fn set(&mut self, cookie: Cookie);

    /// Remove a cookie immediately.
    fn clear(&mut self, name: &str);

    /// True when a live cookie with a non-empty value exists.
    fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_empty())
    }
}
