// src/catalog/model.rs

use serde::{Deserialize, Serialize};

/// A product whose APIs are documented by the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    /// Display name shown in listings and page titles.
    pub name: String,
    /// URL-safe identifier used by the public documentation pages.
    pub slug: String,
}

/// A stored OpenAPI document. The `yaml` field holds the raw text exactly
/// as uploaded; it is only parsed when endpoints are listed or a merged
/// document is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiSpec {
    pub id: i64,
    pub name: String,
    pub yaml: String,
}

/// Listing view of a stored spec, without the document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub id: i64,
    pub name: String,
}

/// A published version of a project, e.g. `v1` or `2024-06`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVersion {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
}

/// Ties one endpoint of a stored spec to a project version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionAssociation {
    pub id: i64,
    pub version_id: i64,
    #[serde(rename = "apiSpecId")]
    pub spec_id: i64,
    pub endpoint_path: String,
    pub endpoint_method: String,
}

/// Association fields as submitted by clients when saving a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssociation {
    #[serde(rename = "apiSpecId")]
    pub spec_id: i64,
    pub endpoint_path: String,
    pub endpoint_method: String,
}

/// Derives the URL slug for a project name: lowercase, alphanumeric runs
/// separated by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_dash = true;
        }
    }
    slug
}
