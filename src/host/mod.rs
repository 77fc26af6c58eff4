//! The page environment the dispatcher and banner run in.
//!
//! Address bar, navigation and DOM access sit behind these traits so the
//! decision logic can be driven by a real browser binding or by
//! [`SimulatedPage`] in tests and the CLI.

pub mod clock;
pub mod simulated;

use url::Url;

use crate::banner::BannerView;

pub use clock::{Clock, ManualClock, SystemClock};
pub use simulated::{MountedBanner, SimulatedPage};

/// Browsing-context side of a page: where it is and where it can go.
pub trait Window {
    /// Full current URL, including query and fragment.
    fn location(&self) -> &Url;

    /// `document.referrer`, if the browser supplied one.
    fn referrer(&self) -> Option<&str>;

    /// True when the page is framed by a different top-level context.
    fn is_embedded(&self) -> bool;

    /// Leave the page for `target`.
    fn navigate(&mut self, target: &str);

    /// Rewrite the address bar in place, without reloading.
    fn replace_history(&mut self, url: &Url);
}

/// Identifies a banner mounted into a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BannerHandle(pub usize);

/// Work the document runs later, on the next frame or on resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutTask {
    /// Push page content down by the banner's rendered height.
    AdjustBodyMargin(BannerHandle),
}

/// DOM side of a page.
pub trait Document {
    fn has_body(&self) -> bool;

    /// Append a banner to the body and return its handle.
    fn mount_banner(&mut self, view: &BannerView) -> BannerHandle;

    /// Rendered height in pixels. `None` until the banner has been laid out.
    fn banner_height(&self, banner: BannerHandle) -> Option<u32>;

    fn set_body_margin_top(&mut self, px: u32);

    /// Run `task` once, after the next layout.
    fn request_animation_frame(&mut self, task: LayoutTask);

    /// Run `task` on every viewport resize for the life of the page.
    fn add_resize_listener(&mut self, task: LayoutTask);
}
