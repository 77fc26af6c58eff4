use thiserror::Error;
use url::form_urlencoded;
use url::Url;

use crate::protocol::{ORIGINATING_URL_PARAM, WAS_REDIRECTED_PARAM};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("destination '{destination}' is not a valid URL: {source}")]
    InvalidDestination {
        destination: String,
        #[source]
        source: url::ParseError,
    },
}

/// Build the navigation target for a redirect away from `current`.
///
/// All of the current page's query parameters are carried over, followed by
/// `was-redirected=` and `originating-url=<current URL>`. They are appended to
/// the destination with `?` or `&`, leaving the destination's own parameters
/// as written. A destination fragment stays at the end.
pub fn build_redirect_url(destination: &str, current: &Url) -> Result<String, BuildError> {
    Url::parse(destination).map_err(|source| BuildError::InvalidDestination {
        destination: destination.to_string(),
        source,
    })?;

    let mut params = form_urlencoded::Serializer::new(String::new());
    for (name, value) in current.query_pairs() {
        params.append_pair(&name, &value);
    }
    params.append_pair(WAS_REDIRECTED_PARAM, "");
    params.append_pair(ORIGINATING_URL_PARAM, current.as_str());
    let query = params.finish();

    let (base, fragment) = match destination.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (destination, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };

    let mut target = format!("{base}{separator}{query}");
    if let Some(fragment) = fragment {
        target.push('#');
        target.push_str(fragment);
    }
    Ok(target)
}
