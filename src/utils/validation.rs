use crate::utils::error::{LocalityError, Result};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> LocalityError {
    LocalityError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// Upstream and generation endpoints: absolute http(s) URLs with a host.
pub fn validate_http_url(field_name: &str, url_str: &str) -> Result<()> {
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("not an absolute URL: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            field_name,
            url_str,
            format!("endpoint must use http or https, not {}", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid(field_name, url_str, "endpoint has no host"));
    }
    Ok(())
}

/// The snapshot store is a single file, so the path must name one.
pub fn validate_snapshot_path(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() || path.contains('\0') {
        return Err(invalid(field_name, path, "snapshot store path is empty or contains NUL"));
    }
    if path.ends_with('/') || Path::new(path).file_name().is_none() {
        return Err(invalid(field_name, path, "snapshot store path must name a file"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(LocalityError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LocalityError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
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
    if !(value >= min && value <= max) {
        return Err(LocalityError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}
