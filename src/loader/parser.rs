//! YAML parser for endpoint definitions
//!
//! Parses and validates endpoint YAML files.

use crate::config::{EndpointConfig, PaginationDef};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Load an endpoint definition from a file path
///
/// # Examples
///
/// ```ignore
/// let endpoint = load_endpoint("./customers.yaml")?;
/// ```
pub fn load_endpoint(path: impl AsRef<Path>) -> Result<EndpointConfig> {
    let path = path.as_ref();

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read endpoint file '{}': {e}",
                path.display()
            ))
        }
    })?;

    let endpoint = load_endpoint_from_str(&content)?;
    debug!(path = %path.display(), endpoint = %endpoint.name, "Loaded endpoint definition");
    Ok(endpoint)
}

/// Load an endpoint definition from a YAML string
pub fn load_endpoint_from_str(yaml: &str) -> Result<EndpointConfig> {
    let def: EndpointConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse endpoint YAML: {e}")))?;

    validate_endpoint(&def)?;
    Ok(def)
}

/// Validate an endpoint definition
pub fn validate_endpoint(def: &EndpointConfig) -> Result<()> {
    if def.kind != "endpoint" {
        return Err(Error::invalid_value(
            "kind",
            format!("expected 'endpoint', got '{}'", def.kind),
        ));
    }

    if def.name.trim().is_empty() {
        return Err(Error::config("Endpoint name cannot be empty"));
    }

    if def.base_url.trim().is_empty() {
        return Err(Error::config(format!(
            "Endpoint '{}' base_url cannot be empty",
            def.name
        )));
    }
    Url::parse(&def.base_url).map_err(|e| {
        Error::invalid_value("base_url", format!("'{}' is not a URL: {e}", def.base_url))
    })?;

    if def.path.trim().is_empty() {
        return Err(Error::config(format!(
            "Endpoint '{}' path cannot be empty",
            def.name
        )));
    }

    if def.response.items_path.trim().is_empty() {
        return Err(Error::missing_field("response.items_path"));
    }

    if def.limit == Some(0) {
        return Err(Error::invalid_value("limit", "page size must be positive"));
    }

    if !def.request.filter_template.contains("{key}") {
        return Err(Error::invalid_value(
            "request.filter_template",
            "template must contain '{key}'",
        ));
    }

    validate_pagination(def)
}

fn validate_pagination(def: &EndpointConfig) -> Result<()> {
    match &def.pagination {
        PaginationDef::Cursor {
            cursor_param,
            next_cursor_path,
            ..
        } => {
            if cursor_param.trim().is_empty() {
                return Err(Error::missing_field("pagination.cursor_param"));
            }
            if next_cursor_path.trim().is_empty() {
                return Err(Error::missing_field("pagination.next_cursor_path"));
            }
        }
        PaginationDef::Offset { offset_param } => {
            if offset_param.trim().is_empty() {
                return Err(Error::missing_field("pagination.offset_param"));
            }
            if def.response.total_path.is_none() {
                return Err(Error::config(format!(
                    "Endpoint '{}' uses offset pagination but has no response.total_path",
                    def.name
                )));
            }
        }
    }

    Ok(())
}
