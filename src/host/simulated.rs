use url::Url;

use crate::banner::layout::run_layout_task;
use crate::banner::BannerView;
use crate::host::{BannerHandle, Document, LayoutTask, Window};

/// Height a banner renders at until a resize says otherwise.
const DEFAULT_BANNER_HEIGHT: u32 = 48;

/// A banner attached to a [`SimulatedPage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountedBanner {
    pub view: BannerView,
    laid_out: bool,
}

impl MountedBanner {
    pub fn is_laid_out(&self) -> bool {
        self.laid_out
    }
}

/// In-memory page used by tests and the simulator CLI.
///
/// Nothing happens asynchronously: queued animation frames run only when
/// [`run_animation_frames`](Self::run_animation_frames) is called, and resize
/// listeners only on [`resize`](Self::resize).
#[derive(Debug, Clone)]
pub struct SimulatedPage {
    location: Url,
    referrer: Option<String>,
    embedded: bool,
    body: bool,
    banner_height: u32,
    navigations: Vec<String>,
    history: Vec<Url>,
    banners: Vec<MountedBanner>,
    body_margin_top: Option<u32>,
    pending_frames: Vec<LayoutTask>,
    resize_listeners: Vec<LayoutTask>,
}

impl SimulatedPage {
    pub fn new(location: Url) -> Self {
        Self {
            location,
            referrer: None,
            embedded: false,
            body: true,
            banner_height: DEFAULT_BANNER_HEIGHT,
            navigations: Vec::new(),
            history: Vec::new(),
            banners: Vec::new(),
            body_margin_top: None,
            pending_frames: Vec::new(),
            resize_listeners: Vec::new(),
        }
    }

    pub fn parse(location: &str) -> Result<Self, url::ParseError> {
        Url::parse(location).map(Self::new)
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        let referrer = referrer.into();
        self.referrer = (!referrer.is_empty()).then_some(referrer);
        self
    }

    pub fn embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    /// Page whose script runs before `<body>` exists.
    pub fn without_body(mut self) -> Self {
        self.body = false;
        self
    }

    pub fn with_banner_height(mut self, px: u32) -> Self {
        self.banner_height = px;
        self
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }

    pub fn last_navigation(&self) -> Option<&str> {
        self.navigations.last().map(String::as_str)
    }

    /// Every URL written with `replace_history`, oldest first.
    pub fn history(&self) -> &[Url] {
        &self.history
    }

    pub fn banners(&self) -> &[MountedBanner] {
        &self.banners
    }

    pub fn body_margin_top(&self) -> Option<u32> {
        self.body_margin_top
    }

    pub fn pending_frames(&self) -> usize {
        self.pending_frames.len()
    }

    pub fn resize_listener_count(&self) -> usize {
        self.resize_listeners.len()
    }

    /// Lay out mounted banners, then run the frame callbacks queued so far.
    pub fn run_animation_frames(&mut self) {
        for banner in &mut self.banners {
            banner.laid_out = true;
        }
        let tasks = std::mem::take(&mut self.pending_frames);
        for task in tasks {
            run_layout_task(self, task);
        }
    }

    /// Change the viewport so banners render at `banner_height`, then fire
    /// resize listeners.
    pub fn resize(&mut self, banner_height: u32) {
        self.banner_height = banner_height;
        for banner in &mut self.banners {
            banner.laid_out = true;
        }
        let listeners = self.resize_listeners.clone();
        for task in listeners {
            run_layout_task(self, task);
        }
    }
}

impl Window for SimulatedPage {
    fn location(&self) -> &Url {
        &self.location
    }

    fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    fn is_embedded(&self) -> bool {
        self.embedded
    }

    fn navigate(&mut self, target: &str) {
        tracing::debug!(target_url = %target, "simulated navigation");
        self.navigations.push(target.to_string());
    }

    fn replace_history(&mut self, url: &Url) {
        self.location = url.clone();
        self.history.push(url.clone());
    }
}

impl Document for SimulatedPage {
    fn has_body(&self) -> bool {
        self.body
    }

    fn mount_banner(&mut self, view: &BannerView) -> BannerHandle {
        self.banners.push(MountedBanner {
            view: view.clone(),
            laid_out: false,
        });
        BannerHandle(self.banners.len() - 1)
    }

    fn banner_height(&self, banner: BannerHandle) -> Option<u32> {
        self.banners
            .get(banner.0)
            .filter(|mounted| mounted.laid_out)
            .map(|_| self.banner_height)
    }

    fn set_body_margin_top(&mut self, px: u32) {
        self.body_margin_top = Some(px);
    }

    fn request_animation_frame(&mut self, task: LayoutTask) {
        self.pending_frames.push(task);
    }

    fn add_resize_listener(&mut self, task: LayoutTask) {
        self.resize_listeners.push(task);
    }
}
