use serde::Serialize;

/// Placeholder in the link text template that receives the origin label.
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Everything needed to draw the banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BannerView {
    pub text: String,
    pub href: String,
    pub banner_style: String,
    pub link_style: String,
}

/// Fill the first `{domain}` in `template` with `label`.
pub fn render_link_text(template: &str, label: &str) -> String {
    template.replacen(DOMAIN_PLACEHOLDER, label, 1)
}
