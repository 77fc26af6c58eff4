use serde::Serialize;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{ConfigError, DispatcherConfig, DispatcherSettings};
use crate::host::{Clock, Window};
use crate::models::Cookie;
use crate::protocol::{self, NO_REDIRECT_PARAM};
use crate::storage::CookieStore;

use super::builder::build_redirect_url;
use super::suppression::{decide, DispatchDecision, SuppressionSignals};
use super::today::resolve_today;

/// What one dispatcher run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub decision: DispatchDecision,
    /// `Set-Cookie` form of the suppression cookie, if one was written.
    pub suppression_cookie: Option<String>,
    pub navigated_to: Option<String>,
}

/// Entry-page component: redirects on configured dates, at most once per
/// suppression window.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Validate raw settings. On failure the error is logged and returned so
    /// the caller can leave the page alone.
    pub fn from_settings(settings: DispatcherSettings) -> Result<Self, ConfigError> {
        DispatcherConfig::try_from(settings)
            .map(Self::new)
            .inspect_err(|err| error!(error = %err, "dispatcher disabled: invalid configuration"))
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Evaluate the page once and act on the decision.
    ///
    /// The suppression cookie is always written before navigation starts.
    pub fn run<W, S>(&self, window: &mut W, cookies: &mut S, clock: &dyn Clock) -> DispatchOutcome
    where
        W: Window + ?Sized,
        S: CookieStore + ?Sized,
    {
        let location = window.location().clone();
        let signals = SuppressionSignals {
            opt_out: protocol::has_param(&location, NO_REDIRECT_PARAM),
            suppressed: cookies.contains(&self.config.suppression_cookie),
        };

        let decision = decide(&self.config, signals, || {
            let today = resolve_today(&location, self.config.date_format, clock);
            debug!(
                today = %today.format(self.config.date_format),
                configured_dates = ?self.config.rules.configured_keys(),
                "checking dates"
            );
            today
        });

        let suppression_cookie = decision
            .writes_suppression()
            .then(|| self.write_suppression(cookies, clock, &location));

        let navigated_to = match &decision {
            DispatchDecision::NoRules => {
                debug!("no redirect dates configured");
                None
            }
            DispatchDecision::OptOut => {
                info!("no-redirect present, suppressing redirects");
                None
            }
            DispatchDecision::Suppressed => {
                debug!(cookie = %self.config.suppression_cookie, "redirect suppressed by cookie");
                None
            }
            DispatchDecision::Redirect {
                day, destination, ..
            } => {
                // `decide` only yields a navigable destination, so the bare
                // fallback covers builder failures that parsing cannot see.
                let target = match build_redirect_url(destination, &location) {
                    Ok(target) => target,
                    Err(err) => {
                        warn!(error = %err, "failed to build redirect URL, using bare destination");
                        destination.clone()
                    }
                };
                info!(day = %day, destination = %destination, "match found, redirecting");
                window.navigate(&target);
                Some(target)
            }
            DispatchDecision::InvalidDestination {
                day, destination, ..
            } => {
                error!(day = %day, destination = %destination, "invalid redirect URL configured");
                None
            }
            DispatchDecision::NoMatch { day } => {
                debug!(day = %day, "no match found for current date");
                None
            }
        };

        DispatchOutcome {
            decision,
            suppression_cookie,
            navigated_to,
        }
    }

    fn write_suppression<S>(&self, cookies: &mut S, clock: &dyn Clock, location: &Url) -> String
    where
        S: CookieStore + ?Sized,
    {
        let cookie = Cookie::for_page(
            self.config.suppression_cookie.as_str(),
            "true",
            self.config.suppression_duration,
            clock.now(),
            location,
        );
        let header = cookie.to_set_cookie_header();
        debug!(cookie = %header, "writing suppression cookie");
        cookies.set(cookie);
        header
    }
}
