use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::host::Clock;
use crate::models::Cookie;
use crate::storage::CookieStore;

/// Cookie store held in memory, with expiry judged against an injected clock.
pub struct MemoryCookieStore {
    cookies: BTreeMap<String, Cookie>,
    clock: Arc<dyn Clock>,
}

impl MemoryCookieStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            cookies: BTreeMap::new(),
            clock,
        }
    }

    pub fn with_cookies(clock: Arc<dyn Clock>, cookies: impl IntoIterator<Item = Cookie>) -> Self {
        let mut store = Self::new(clock);
        for cookie in cookies {
            store.set(cookie);
        }
        store
    }

    /// Full live cookie, attributes included.
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        let now = self.clock.now();
        self.cookies.get(name).filter(|cookie| !cookie.is_expired(now))
    }

    pub fn live_cookies(&self) -> impl Iterator<Item = &Cookie> {
        let now = self.clock.now();
        self.cookies.values().filter(move |cookie| !cookie.is_expired(now))
    }

    /// What a page script would read from `document.cookie`.
    pub fn document_cookie(&self) -> String {
        self.live_cookies()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Drop cookies whose expiry has passed. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now();
        let before = self.cookies.len();
        self.cookies.retain(|_, cookie| !cookie.is_expired(now));
        before - self.cookies.len()
    }
}

impl fmt::Debug for MemoryCookieStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCookieStore")
            .field("cookies", &self.cookies)
            .finish_non_exhaustive()
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|cookie| cookie.value.clone())
    }

    fn set(&mut self, cookie: Cookie) {
        if cookie.is_expired(self.clock.now()) {
            self.cookies.remove(&cookie.name);
        } else {
            self.cookies.insert(cookie.name.clone(), cookie);
        }
    }

    fn clear(&mut self, name: &str) {
        self.cookies.remove(name);
    }
}
