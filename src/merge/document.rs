// This file contains the merge engine that consolidates operations picked
// from several OpenAPI source documents into a single OpenAPI 3.0.0 document.

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use super::refs::{collect_refs, ComponentRef};

/// Version stamped on every document the merge engine produces.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// The HTTP methods that count as operations inside a path item.
/// Anything else (`parameters`, `summary`, vendor extensions) is ignored.
pub const OPERATION_METHODS: [&str; 8] = [
    "get", "post", "put", "delete", "patch", "options", "head", "trace",
];

/// Description used when at least one selected operation made it into the
/// merged document.
pub const CONSOLIDATED_DESCRIPTION: &str =
    "Consolidated documentation generated by the API hub.";

/// Description used on the placeholder document that is produced when no
/// selected operation could be resolved.
pub const EMPTY_VERSION_DESCRIPTION: &str =
    "No endpoints are associated with this version.";

/// Identifier of a stored source document.
pub type SpecId = i64;

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("could not parse source document {id}: {source}")]
    InvalidDocument {
        id: SpecId,
        source: serde_yaml::Error,
    },
}

/// Parses the stored text of a source document. YAML and JSON are both
/// accepted since YAML is a superset of JSON.
pub fn parse_document(source: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(source)
}

/// One operation exposed by a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// The path template, e.g. `/pets/{petId}`.
    pub path: String,
    /// The method key exactly as it appears in the document.
    pub method: String,
}

/// Lists every operation of a parsed OpenAPI document.
///
/// Path item keys are matched against [`OPERATION_METHODS`] case
/// insensitively, but the original casing is preserved in the result.
pub fn list_endpoints(document: &Value) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        return endpoints;
    };
    for (path, item) in paths {
        let Some(operations) = item.as_object() else {
            continue;
        };
        for method in operations.keys() {
            if OPERATION_METHODS.contains(&method.to_ascii_lowercase().as_str()) {
                endpoints.push(Endpoint {
                    path: path.clone(),
                    method: method.clone(),
                });
            }
        }
    }
    endpoints
}

/// The `info` block of the merged document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl DocumentInfo {
    /// Builds the info block with the standard consolidated description.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> DocumentInfo {
        DocumentInfo {
            title: title.into(),
            version: version.into(),
            description: CONSOLIDATED_DESCRIPTION.to_string(),
        }
    }
}

/// A single "take this operation from that document" instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSelection {
    /// The source document the operation is copied from.
    pub spec_id: SpecId,
    /// Path template as stored, matched literally against the document.
    pub path: String,
    /// Method key as stored, matched literally against the path item.
    pub method: String,
}

/// The parsed source documents a merge draws from, keyed by spec id.
///
/// Registration order matters: when several documents define a component,
/// a tag or a server with the same identity, the document registered first
/// wins. Registering the same id twice keeps the first document.
#[derive(Debug, Default)]
pub struct SourceSet {
    documents: IndexMap<SpecId, Value>,
}

impl SourceSet {
    pub fn new() -> SourceSet {
        SourceSet::default()
    }

    /// Registers an already parsed document. The first registration of an
    /// id wins; later ones are ignored.
    pub fn insert(&mut self, id: SpecId, document: Value) {
        self.documents.entry(id).or_insert(document);
    }

    /// Parses and registers a stored document. Ids already present are
    /// skipped without parsing.
    pub fn insert_yaml(&mut self, id: SpecId, source: &str) -> Result<(), MergeError> {
        if self.documents.contains_key(&id) {
            return Ok(());
        }
        let document =
            parse_document(source).map_err(|source| MergeError::InvalidDocument { id, source })?;
        self.documents.insert(id, document);
        Ok(())
    }

    pub fn contains(&self, id: SpecId) -> bool {
        self.documents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in registration order.
    fn iter(&self) -> impl Iterator<Item = &Value> {
        self.documents.values()
    }

    /// Looks up one operation by literal path and method key. A null stub
    /// (`get:` with no body) counts as absent.
    fn operation(&self, id: SpecId, path: &str, method: &str) -> Option<&Value> {
        self.documents
            .get(&id)?
            .get("paths")?
            .get(path)?
            .get(method)
            .filter(|operation| !operation.is_null())
    }

    /// Finds a component definition, searching documents in registration
    /// order and returning the first match. Null stubs are skipped so a
    /// later document can still supply the real definition.
    fn find_component(&self, reference: &ComponentRef) -> Option<&Value> {
        self.iter().find_map(|document| {
            document
                .get("components")?
                .get(reference.kind.as_str())?
                .get(reference.name.as_str())
                .filter(|definition| !definition.is_null())
        })
    }
}

/// Merges the selected operations into one OpenAPI document.
///
/// Selections whose operation does not exist in the named source document
/// are skipped. Components referenced (directly or transitively) by the
/// copied operations are carried over, resolving each reference against the
/// documents in registration order and keeping the first match. Tags are
/// carried only when an operation uses them and are deduplicated by name;
/// servers are deduplicated by url.
///
/// When nothing resolves at all the result is a minimal placeholder
/// document with empty `paths` and [`EMPTY_VERSION_DESCRIPTION`].
pub fn merge_documents(
    info: &DocumentInfo,
    selections: &[OperationSelection],
    sources: &SourceSet,
) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    let mut used_tags: BTreeSet<String> = BTreeSet::new();
    let mut seen_refs: BTreeSet<String> = BTreeSet::new();
    let mut pending_refs: VecDeque<String> = VecDeque::new();

    // Seed the document with the selected operations.
    for selection in selections {
        let Some(operation) =
            sources.operation(selection.spec_id, &selection.path, &selection.method)
        else {
            tracing::debug!(
                spec_id = selection.spec_id,
                path = %selection.path,
                method = %selection.method,
                "selection skipped, operation not present in source document"
            );
            continue;
        };
        let operation = operation.clone();

        if let Some(tags) = operation.get("tags").and_then(Value::as_array) {
            for tag in tags {
                if let Some(name) = tag.as_str() {
                    used_tags.insert(name.to_string());
                }
            }
        }
        enqueue_refs(&operation, &mut seen_refs, &mut pending_refs);

        let item = paths
            .entry(selection.path.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(item) = item.as_object_mut() {
            item.insert(selection.method.clone(), operation);
        }
    }

    if paths.is_empty() {
        return placeholder_document(info);
    }

    // Resolve the reference closure breadth-first. Every reference enters
    // the queue at most once, so the loop terminates even with reference
    // cycles in the sources.
    let mut components: Map<String, Value> = Map::new();
    while let Some(raw) = pending_refs.pop_front() {
        let Some(reference) = ComponentRef::parse(&raw) else {
            continue;
        };
        let Some(definition) = sources.find_component(&reference) else {
            tracing::debug!(reference = %raw, "reference does not resolve in any source document");
            continue;
        };
        let definition = definition.clone();
        enqueue_refs(&definition, &mut seen_refs, &mut pending_refs);

        let bucket = components
            .entry(reference.kind.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(bucket) = bucket.as_object_mut() {
            bucket.insert(reference.name.clone(), definition);
        }
    }

    // Carry servers from every document, and tags only when some copied
    // operation uses them.
    let mut servers: Vec<Value> = Vec::new();
    let mut tags: Vec<Value> = Vec::new();
    for document in sources.iter() {
        if let Some(document_servers) = document.get("servers").and_then(Value::as_array) {
            servers.extend(document_servers.iter().cloned());
        }
        if let Some(document_tags) = document.get("tags").and_then(Value::as_array) {
            for tag in document_tags {
                let used = tag
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| used_tags.contains(name))
                    .unwrap_or(false);
                if used {
                    tags.push(tag.clone());
                }
            }
        }
    }
    dedup_by_field(&mut tags, "name");
    dedup_by_field(&mut servers, "url");

    json!({
        "openapi": OPENAPI_VERSION,
        "info": info,
        "paths": paths,
        "components": components,
        "tags": tags,
        "servers": servers,
    })
}

/// Collects the references of `value` and queues the ones not seen before.
fn enqueue_refs(value: &Value, seen: &mut BTreeSet<String>, pending: &mut VecDeque<String>) {
    let mut found = BTreeSet::new();
    collect_refs(value, &mut found);
    for reference in found {
        if seen.insert(reference.clone()) {
            pending.push_back(reference);
        }
    }
}

/// Keeps the first entry for each distinct string value of `field`.
/// Entries without a string at `field` all count as carrying the same
/// key, so only the first of them survives.
fn dedup_by_field(entries: &mut Vec<Value>, field: &str) {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut kept_keyless = false;
    entries.retain(|entry| match entry.get(field).and_then(Value::as_str) {
        Some(key) => seen.insert(key.to_string()),
        None => {
            if kept_keyless {
                false
            } else {
                kept_keyless = true;
                true
            }
        }
    });
}

fn placeholder_document(info: &DocumentInfo) -> Value {
    json!({
        "openapi": OPENAPI_VERSION,
        "info": {
            "title": info.title,
            "version": info.version,
            "description": EMPTY_VERSION_DESCRIPTION,
        },
        "paths": {},
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.0",
            "info": { "title": "Petstore", "version": "1.0.0" },
            "paths": {
                "/pets": {
                    "get": { "summary": "List pets", "responses": { "200": { "description": "ok" } } },
                    "post": { "summary": "Create a pet", "responses": { "201": { "description": "created" } } },
                    "parameters": [ { "name": "tenant", "in": "header" } ],
                    "x-rate-limit": 100
                },
                "/pets/{petId}": {
                    "DELETE": { "responses": { "204": { "description": "gone" } } }
                }
            }
        })
    }

    #[test]
    fn test_list_endpoints_skips_non_method_keys() {
        let endpoints = list_endpoints(&petstore());
        assert_eq!(endpoints.len(), 3);
        assert!(endpoints.contains(&Endpoint {
            path: "/pets".to_string(),
            method: "get".to_string(),
        }));
        assert!(endpoints.contains(&Endpoint {
            path: "/pets".to_string(),
            method: "post".to_string(),
        }));
    }

    #[test]
    fn test_list_endpoints_preserves_method_casing() {
        let endpoints = list_endpoints(&petstore());
        assert!(endpoints.contains(&Endpoint {
            path: "/pets/{petId}".to_string(),
            method: "DELETE".to_string(),
        }));
    }

    #[test]
    fn test_list_endpoints_of_empty_document() {
        assert!(list_endpoints(&json!({})).is_empty());
        assert!(list_endpoints(&json!({ "paths": "oops" })).is_empty());
        assert!(list_endpoints(&json!({ "paths": { "/x": 3 } })).is_empty());
    }

    #[test]
    fn test_parse_document_accepts_yaml_and_json() {
        let from_yaml = parse_document("openapi: 3.0.0\npaths: {}\n").unwrap();
        assert_eq!(from_yaml["openapi"], "3.0.0");
        let from_json = parse_document(r#"{"openapi": "3.0.0", "paths": {}}"#).unwrap();
        assert_eq!(from_json["openapi"], "3.0.0");
    }

    #[test]
    fn test_parse_document_rejects_malformed_input() {
        assert!(parse_document("openapi: [unclosed").is_err());
    }

    #[test]
    fn test_source_set_keeps_first_document_per_id() {
        let mut sources = SourceSet::new();
        sources.insert(1, json!({ "marker": "first" }));
        sources.insert(1, json!({ "marker": "second" }));
        assert_eq!(sources.len(), 1);
        assert_eq!(sources.documents[&1]["marker"], "first");
    }

    #[test]
    fn test_insert_yaml_reports_offending_spec_id() {
        let mut sources = SourceSet::new();
        let err = sources.insert_yaml(7, "openapi: [unclosed").unwrap_err();
        assert!(err.to_string().contains("source document 7"));
        assert!(sources.is_empty());
    }

    #[test]
    fn test_merge_without_selections_is_placeholder() {
        let info = DocumentInfo::new("Demo", "v1");
        let merged = merge_documents(&info, &[], &SourceSet::new());
        assert_eq!(merged["openapi"], OPENAPI_VERSION);
        assert_eq!(merged["paths"], json!({}));
        assert_eq!(merged["info"]["description"], EMPTY_VERSION_DESCRIPTION);
        // The placeholder deliberately has no components, tags or servers.
        assert!(merged.get("components").is_none());
        assert!(merged.get("tags").is_none());
        assert!(merged.get("servers").is_none());
    }

    #[test]
    fn test_merge_keeps_caller_supplied_info() {
        let mut sources = SourceSet::new();
        sources.insert(1, petstore());
        let info = DocumentInfo::new("Demo - v1", "v1");
        let selections = [OperationSelection {
            spec_id: 1,
            path: "/pets".to_string(),
            method: "get".to_string(),
        }];
        let merged = merge_documents(&info, &selections, &sources);
        assert_eq!(merged["info"]["title"], "Demo - v1");
        assert_eq!(merged["info"]["version"], "v1");
        assert_eq!(merged["info"]["description"], CONSOLIDATED_DESCRIPTION);
        assert_eq!(merged["components"], json!({}));
    }
}
