// src/merge/refs.rs

use std::collections::BTreeSet;

use serde_json::Value;

/// Prefix shared by every reference that points into the `components`
/// section of an OpenAPI document.
pub const COMPONENTS_PREFIX: &str = "#/components/";

/// A `$ref` that has been resolved into its component coordinates.
///
/// `#/components/schemas/Pet` becomes `kind = "schemas"`, `name = "Pet"`.
/// Segments past the component name (`#/components/schemas/Pet/properties/id`)
/// are dropped so the reference resolves to the root component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRef {
    /// The component bucket, e.g. `schemas`, `responses`, `parameters`.
    pub kind: String,
    /// The component key inside that bucket.
    pub name: String,
}

impl ComponentRef {
    /// Parses a raw `$ref` string into component coordinates.
    ///
    /// Returns `None` for anything that does not point into `#/components/`,
    /// including external references (`./common.yaml#/...`), other local
    /// pointers (`#/definitions/...`) and malformed fragments.
    pub fn parse(raw: &str) -> Option<ComponentRef> {
        let rest = raw.strip_prefix(COMPONENTS_PREFIX)?;
        let mut segments = rest.split('/');
        let kind = segments.next()?;
        let name = segments.next()?;
        if kind.is_empty() || name.is_empty() {
            return None;
        }
        Some(ComponentRef {
            kind: kind.to_string(),
            name: name.to_string(),
        })
    }
}

/// Walks a JSON value and collects every `$ref` string reachable from it.
///
/// Only entries whose value is a string are collected; a `$ref` key holding
/// an object or array is treated as ordinary data and traversed like any
/// other value. The set keeps references unique and ordered.
pub fn collect_refs(value: &Value, refs: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, entry) in map {
                if key == "$ref" {
                    if let Some(target) = entry.as_str() {
                        refs.insert(target.to_string());
                        continue;
                    }
                }
                collect_refs(entry, refs);
            }
        }
        Value::Array(entries) => {
            for entry in entries {
                collect_refs(entry, refs);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn refs_of(value: &Value) -> BTreeSet<String> {
        let mut refs = BTreeSet::new();
        collect_refs(value, &mut refs);
        refs
    }

    #[test]
    fn test_collects_nothing_from_scalars() {
        assert!(refs_of(&json!(null)).is_empty());
        assert!(refs_of(&json!(42)).is_empty());
        assert!(refs_of(&json!("#/components/schemas/Pet")).is_empty());
    }

    #[test]
    fn test_collects_refs_at_any_depth() {
        let value = json!({
            "responses": {
                "200": {
                    "content": {
                        "application/json": {
                            "schema": { "$ref": "#/components/schemas/Pet" }
                        }
                    }
                }
            },
            "parameters": [
                { "$ref": "#/components/parameters/PageSize" }
            ]
        });
        let refs = refs_of(&value);
        assert_eq!(refs.len(), 2);
        assert!(refs.contains("#/components/schemas/Pet"));
        assert!(refs.contains("#/components/parameters/PageSize"));
    }

    #[test]
    fn test_duplicate_refs_collapse() {
        let value = json!({
            "a": { "$ref": "#/components/schemas/Pet" },
            "b": { "$ref": "#/components/schemas/Pet" }
        });
        assert_eq!(refs_of(&value).len(), 1);
    }

    #[test]
    fn test_non_string_ref_values_are_traversed() {
        let value = json!({
            "$ref": { "$ref": "#/components/schemas/Inner" }
        });
        let refs = refs_of(&value);
        assert_eq!(refs.len(), 1);
        assert!(refs.contains("#/components/schemas/Inner"));
    }

    #[test]
    fn test_parses_component_coordinates() {
        let parsed = ComponentRef::parse("#/components/schemas/Pet").unwrap();
        assert_eq!(parsed.kind, "schemas");
        assert_eq!(parsed.name, "Pet");
    }

    #[test]
    fn test_deep_pointers_resolve_to_root_component() {
        let parsed = ComponentRef::parse("#/components/schemas/Pet/properties/id").unwrap();
        assert_eq!(parsed.kind, "schemas");
        assert_eq!(parsed.name, "Pet");
    }

    #[test]
    fn test_rejects_refs_outside_components() {
        assert_eq!(ComponentRef::parse("#/definitions/Pet"), None);
        assert_eq!(ComponentRef::parse("#/components"), None);
        assert_eq!(ComponentRef::parse("http://example.com/spec.yaml"), None);
        assert_eq!(ComponentRef::parse("./common.yaml#/components/schemas/Pet"), None);
        assert_eq!(ComponentRef::parse("#/components//Pet"), None);
        assert_eq!(ComponentRef::parse("#/components/schemas/"), None);
    }
}
