use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{BannerConfig, BannerSettings, ConfigError};
use crate::host::{BannerHandle, Clock, Document, Window};
use crate::models::Cookie;
use crate::protocol::{self, ORIGINATING_URL_PARAM};
use crate::storage::CookieStore;

use super::layout;
use super::origin::OriginSources;
use super::trigger::TriggerSignals;
use super::view::{render_link_text, BannerView};

/// The mounted "go back" link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReturnLink {
    pub banner: BannerHandle,
    pub view: BannerView,
    #[serde(skip)]
    sources: OriginSources,
}

impl ReturnLink {
    /// Handle a click: leave for the originating page with `no-redirect` set,
    /// instead of following the raw `href`.
    pub fn click<W: Window + ?Sized>(&self, window: &mut W) -> String {
        let target = self.sources.back_target(window.location());
        info!(target_url = %target, "returning to originating page");
        window.navigate(&target);
        target
    }
}

/// What one banner run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerOutcome {
    pub signals: TriggerSignals,
    /// `Set-Cookie` form of the origin cookie, if the parameter was persisted.
    pub origin_cookie: Option<String>,
    /// Address-bar URL after the parameter was stripped.
    pub rewritten_url: Option<String>,
    pub link: Option<ReturnLink>,
}

/// Destination-page component: carries the originating URL across the
/// address-bar cleanup and offers a way back.
#[derive(Debug, Clone)]
pub struct ReturnBanner {
    config: BannerConfig,
}

impl ReturnBanner {
    pub fn new(config: BannerConfig) -> Self {
        Self { config }
    }

    pub fn from_settings(settings: BannerSettings) -> Result<Self, ConfigError> {
        BannerConfig::try_from(settings)
            .map(Self::new)
            .inspect_err(|err| error!(error = %err, "return banner disabled: invalid configuration"))
    }

    pub fn config(&self) -> &BannerConfig {
        &self.config
    }

    /// Run once on page load.
    ///
    /// Trigger signals and origin sources are read before anything is
    /// written, so a cookie set during this run never counts as "arrived
    /// earlier". The origin cookie is written before the address bar is
    /// rewritten.
    pub fn run<P, S>(&self, page: &mut P, cookies: &mut S, clock: &dyn Clock) -> BannerOutcome
    where
        P: Window + Document + ?Sized,
        S: CookieStore + ?Sized,
    {
        let signals = TriggerSignals::observe(page, cookies, &self.config.origin_cookie);
        let sources = OriginSources::read(page, cookies, &self.config.origin_cookie);

        let (origin_cookie, rewritten_url) = self.propagate(page, cookies, clock, &sources);

        let link = if signals.should_show() {
            Some(self.mount(page, sources))
        } else {
            debug!(?signals, "return banner not shown");
            None
        };

        BannerOutcome {
            signals,
            origin_cookie,
            rewritten_url,
            link,
        }
    }

    fn propagate<P, S>(
        &self,
        page: &mut P,
        cookies: &mut S,
        clock: &dyn Clock,
        sources: &OriginSources,
    ) -> (Option<String>, Option<String>)
    where
        P: Window + ?Sized,
        S: CookieStore + ?Sized,
    {
        let Some(origin) = sources.trusted_param() else {
            if let Some(raw) = sources.param.as_deref() {
                warn!(originating_url = %raw, "ignoring originating-url that is not an http(s) URL");
            }
            return (None, None);
        };

        let cookie = Cookie::for_page(
            self.config.origin_cookie.as_str(),
            origin.as_str(),
            self.config.cookie_lifetime,
            clock.now(),
            page.location(),
        );
        let header = cookie.to_set_cookie_header();
        debug!(cookie = %header, "persisting originating URL");
        cookies.set(cookie);

        let cleaned = protocol::without_param(page.location(), ORIGINATING_URL_PARAM);
        page.replace_history(&cleaned);

        (Some(header), Some(cleaned.into()))
    }

    fn mount<P: Document + ?Sized>(&self, page: &mut P, sources: OriginSources) -> ReturnLink {
        let view = BannerView {
            text: render_link_text(&self.config.link_text_template, &sources.link_label()),
            href: sources.link_href(),
            banner_style: self.config.banner_style.clone(),
            link_style: self.config.link_style.clone(),
        };

        let banner = page.mount_banner(&view);
        layout::attach(page, banner);
        info!(text = %view.text, href = %view.href, "return banner shown");

        ReturnLink {
            banner,
            view,
            sources,
        }
    }
}
