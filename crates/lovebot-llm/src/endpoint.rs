//! Base URL handling shared by the providers.

use lovebot_core::error::{LovebotError, LovebotResult};
use url::Url;

/// Validate a configured base URL, falling back to `default`. The result has
/// no trailing slash so paths can be appended with `format!("{}/path")`.
pub(crate) fn base_url(configured: Option<&str>, default: &str) -> LovebotResult<String> {
    let raw = configured.unwrap_or(default);
    let url = Url::parse(raw).map_err(|e| {
        LovebotError::Configuration(format!("Invalid base_url '{}': {}", raw, e))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LovebotError::Configuration(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}
