//! Destination-page return banner.

pub mod layout;
pub mod origin;
pub mod return_banner;
pub mod trigger;
pub mod view;

pub use origin::{extract_label, OriginSources, FALLBACK_LABEL};
pub use return_banner::{BannerOutcome, ReturnBanner, ReturnLink};
pub use trigger::TriggerSignals;
pub use view::{render_link_text, BannerView};
