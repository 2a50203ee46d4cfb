use crate::utils::error::{LinkError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(LinkError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LinkError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Accepts an absolute request path (`/foo`) or anything carrying a scheme
/// (`http://`, `mailto:x`), parseable as a full URL or not.
///
/// Paths and hostless URLs cannot be fetched; they surface later as a
/// request-construction failure, not as bad input.
pub fn validate_request_url(raw: &str) -> Result<()> {
    if raw.starts_with('/') || has_scheme(raw) || Url::parse(raw).is_ok() {
        return Ok(());
    }
    Err(LinkError::invalid_work(format!("url {:?} is invalid", raw)))
}

/// `scheme ":" ...` with scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn has_scheme(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Checks the URL count against `max_count_urls`, then every URL.
pub fn validate_batch(urls: &[String], max_count_urls: usize) -> Result<()> {
    if urls.len() > max_count_urls {
        return Err(LinkError::invalid_work(format!(
            "max number of urls is {}",
            max_count_urls
        )));
    }
    urls.iter().try_for_each(|u| validate_request_url(u))
}
