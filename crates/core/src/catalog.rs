//! Folder/service catalog model and the views derived from it
//!
//! This module contains zero I/O operations and is fully testable with fixture data.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// Sentinel used when the server omits a layer type
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Sentinel returned when a server does not report `currentVersion`
pub const VERSION_NOT_AVAILABLE: &str = "Version information not available.";

/// Sentinel rendered when a service name lookup finds nothing
pub const SERVICE_NOT_FOUND: &str = "Service not found.";

// ============================================================================
// Domain Models
// ============================================================================

/// One service entry as reported by a folder listing
///
/// `service_type` is `None` when the server omitted it; untyped services
/// never show up in the type-based views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDescriptor {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

/// Contents of a single `services` listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderListing {
    pub services: Vec<ServiceDescriptor>,
    pub folders: Vec<String>,
}

/// A folder of the service hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub path: String,
    pub services: Vec<ServiceDescriptor>,
    pub children: Vec<FolderNode>,
}

// ============================================================================
// Pure Parsing Functions
// ============================================================================

impl FolderListing {
    /// Read a listing response, substituting empty lists for missing fields
    ///
    /// Services without a `name` are dropped; services without a `type` are
    /// kept untyped. Non-string folder names are ignored.
    pub fn from_value(value: &Value) -> Self {
        let services = value
            .get("services")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let name = entry.get("name")?.as_str()?;
                        let service_type = entry
                            .get("type")
                            .and_then(Value::as_str)
                            .map(str::to_string);
                        Some(ServiceDescriptor {
                            name: name.to_string(),
                            service_type,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let folders = value
            .get("folders")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        FolderListing { services, folders }
    }
}

/// Extract `currentVersion` as display text
///
/// The server reports it as a number (`11.1`) or a string; anything else
/// yields [`VERSION_NOT_AVAILABLE`].
pub fn parse_version(value: &Value) -> String {
    match value.get("currentVersion") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => VERSION_NOT_AVAILABLE.to_string(),
    }
}

/// Path of a sub-folder under `parent`
///
/// Segments are joined with a single `/` and the result always carries one
/// leading `/`. `child_path("/", "a")` is `/a`, `child_path("/b", "/c")` is `/b/c`.
pub fn child_path(parent: &str, name: &str) -> String {
    let parent = parent.trim_matches('/');
    let name = name.trim_matches('/');

    match (parent.is_empty(), name.is_empty()) {
        (true, _) => format!("/{name}"),
        (false, true) => format!("/{parent}"),
        (false, false) => format!("/{parent}/{name}"),
    }
}

// ============================================================================
// Derived Views
// ============================================================================

impl FolderNode {
    pub const ROOT_PATH: &'static str = "/";

    pub fn is_root(&self) -> bool {
        self.path == Self::ROOT_PATH
    }

    /// Pre-order iterator over this node and all of its descendants
    pub fn iter(&self) -> PreOrder<'_> {
        PreOrder { stack: vec![self] }
    }

    /// Paths of every non-root folder, in pre-order
    pub fn folder_paths(&self) -> Vec<String> {
        self.iter()
            .filter(|node| !node.is_root())
            .map(|node| node.path.clone())
            .collect()
    }

    /// Every service of the tree, concatenated in pre-order
    pub fn all_services(&self) -> Vec<ServiceDescriptor> {
        self.iter()
            .flat_map(|node| node.services.iter().cloned())
            .collect()
    }

    /// Distinct service types across the tree
    pub fn distinct_service_types(&self) -> BTreeSet<String> {
        self.iter()
            .flat_map(|node| node.services.iter())
            .filter_map(|service| service.service_type.clone())
            .collect()
    }

    /// Names of the services whose type equals `service_type`, in pre-order
    pub fn services_by_type(&self, service_type: &str) -> Vec<String> {
        self.iter()
            .flat_map(|node| node.services.iter())
            .filter(|service| service.service_type.as_deref() == Some(service_type))
            .map(|service| service.name.clone())
            .collect()
    }

    /// Type of the first service named `name`
    ///
    /// `None` when no service has that name or the match is untyped.
    pub fn service_type_by_name(&self, name: &str) -> Option<&str> {
        self.iter()
            .flat_map(|node| node.services.iter())
            .find(|service| service.name == name)
            .and_then(|service| service.service_type.as_deref())
    }

    /// Total number of folders in the tree, root included
    pub fn folder_count(&self) -> usize {
        self.iter().count()
    }
}

/// Iterative pre-order traversal of a [`FolderNode`] tree
pub struct PreOrder<'a> {
    stack: Vec<&'a FolderNode>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a FolderNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ============================================================================
// Tests
// ============================================================================
