//! Method handlers and the capability descriptor advertised by `initialize`.
//!
//! The descriptor is a fixed literal rather than something derived from the
//! method table; when a tool is added to [`default_method_table`] it has to
//! be added to [`get_tool_definitions`] as well.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::catalog::create_catalog_for;
use crate::errors::{CatalogError, Result};
use crate::types::CatalogRequest;

use super::dispatcher::MethodTable;

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_SHUTDOWN: &str = "shutdown";
pub const METHOD_EXIT: &str = "exit";
pub const METHOD_CATALOG_CREATE: &str = "catalog/create";

/// A tool definition advertised in the `initialize` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Method name clients call.
    pub name: String,
    /// Human-readable description of what the tool does.
    pub description: String,
    /// JSON Schema describing the tool's parameters.
    pub parameters: Value,
}

/// Returns the tools this server advertises.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![ToolDefinition {
        name: METHOD_CATALOG_CREATE.to_string(),
        description: "Creates a catalog of all files in a directory, saving it as a TSV file."
            .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "target_dir": {
                    "type": "string",
                    "description": "The absolute path of the directory to catalog."
                },
                "output_file": {
                    "type": "string",
                    "description": "The absolute path where the output TSV file will be saved."
                }
            },
            "required": ["target_dir", "output_file"]
        }),
    }]
}

/// Builds the method table served by every JSON-RPC front-end.
pub fn default_method_table() -> MethodTable {
    MethodTable::builder()
        .request(METHOD_INITIALIZE, handle_initialize)
        .notification(METHOD_SHUTDOWN, handle_shutdown)
        .exit(METHOD_EXIT)
        .request(METHOD_CATALOG_CREATE, handle_catalog_create)
        .build()
}

/// Handles `initialize`. Parameters are accepted and ignored.
fn handle_initialize(_params: Option<Value>) -> Result<Value> {
    Ok(json!({
        "capabilities": {
            "tools": get_tool_definitions()
        }
    }))
}

/// Handles the `shutdown` notification. Nothing to release.
fn handle_shutdown(_params: Option<Value>) -> Result<Value> {
    info!("shutdown requested");
    Ok(Value::Null)
}

/// Handles `catalog/create`.
fn handle_catalog_create(params: Option<Value>) -> Result<Value> {
    let request = parse_catalog_params(params.as_ref())?;
    let summary = create_catalog_for(&request)?;

    Ok(json!({
        "status": "success",
        "message": format!("Catalog created for {}", summary.target_dir),
        "file_count": summary.file_count,
    }))
}

/// Extracts `target_dir` and `output_file`, naming the first missing field.
fn parse_catalog_params(params: Option<&Value>) -> Result<CatalogRequest> {
    let target_dir = required_str(params, "target_dir")?;
    let output_file = required_str(params, "output_file")?;
    Ok(CatalogRequest::new(target_dir, output_file))
}

fn required_str<'a>(params: Option<&'a Value>, name: &str) -> Result<&'a str> {
    let value = params
        .and_then(|p| p.get(name))
        .ok_or_else(|| CatalogError::InvalidParams {
            message: format!("Missing parameter: '{}'", name),
        })?;

    value.as_str().ok_or_else(|| CatalogError::InvalidParams {
        message: format!("Parameter '{}' must be a string", name),
    })
}
