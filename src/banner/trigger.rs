use serde::Serialize;

use crate::host::{Document, Window};
use crate::protocol::{self, WAS_REDIRECTED_PARAM};
use crate::storage::CookieStore;

/// Page state that decides whether the return banner appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TriggerSignals {
    pub was_redirected: bool,
    pub embedded: bool,
    /// The origin cookie existed before this page wrote anything.
    pub origin_cookie: bool,
    pub body_available: bool,
}

impl TriggerSignals {
    pub fn observe<P, S>(page: &P, cookies: &S, origin_cookie: &str) -> Self
    where
        P: Window + Document + ?Sized,
        S: CookieStore + ?Sized,
    {
        Self {
            was_redirected: protocol::has_param(page.location(), WAS_REDIRECTED_PARAM),
            embedded: page.is_embedded(),
            origin_cookie: cookies.contains(origin_cookie),
            body_available: page.has_body(),
        }
    }

    pub fn should_show(&self) -> bool {
        self.body_available && (self.was_redirected || self.embedded || self.origin_cookie)
    }
}
