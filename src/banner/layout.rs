use tracing::debug;

use crate::host::{BannerHandle, Document, LayoutTask};

/// Execute deferred layout work. Hosts call this from their frame and resize
/// callbacks.
pub fn run_layout_task<D: Document + ?Sized>(document: &mut D, task: LayoutTask) {
    match task {
        LayoutTask::AdjustBodyMargin(banner) => adjust_body_margin(document, banner),
    }
}

/// Push page content below the fixed banner by its rendered height.
pub fn adjust_body_margin<D: Document + ?Sized>(document: &mut D, banner: BannerHandle) {
    if !document.has_body() {
        return;
    }
    match document.banner_height(banner) {
        Some(height) => document.set_body_margin_top(height),
        None => debug!(?banner, "banner not laid out yet, margin unchanged"),
    }
}

/// Schedule the first margin adjustment and keep it current on resize.
pub fn attach<D: Document + ?Sized>(document: &mut D, banner: BannerHandle) {
    document.request_animation_frame(LayoutTask::AdjustBodyMargin(banner));
    document.add_resize_listener(LayoutTask::AdjustBodyMargin(banner));
}
