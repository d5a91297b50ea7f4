// This file contains the public documentation routes: the merged OpenAPI
// document of a version and the HTML page that renders it with Swagger UI.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use serde_json::Value;

use crate::catalog::{Project, ProjectVersion};
use crate::merge::{merge_documents, DocumentInfo, OperationSelection, SourceSet};

use super::{ApiError, AppState};

/// GET /docs/versions/:id
///
/// Builds the consolidated OpenAPI document of a version from its
/// associations. Versions without resolvable associations yield a
/// placeholder document, still with status 200.
pub async fn version_document(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let (version, project) = state
        .store
        .get_version(version_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("version not found".to_string()))?;
    let associations = state.store.list_associations(version_id).await?;

    // Load each referenced source document once, in association order.
    let mut sources = SourceSet::new();
    for association in &associations {
        if sources.contains(association.spec_id) {
            continue;
        }
        let Some(spec) = state.store.get_spec(association.spec_id).await? else {
            tracing::debug!(
                spec_id = association.spec_id,
                "association points at a deleted spec, skipping"
            );
            continue;
        };
        sources
            .insert_yaml(spec.id, &spec.yaml)
            .map_err(ApiError::SpecGeneration)?;
    }

    let selections: Vec<OperationSelection> = associations
        .iter()
        .map(|association| OperationSelection {
            spec_id: association.spec_id,
            path: association.endpoint_path.clone(),
            method: association.endpoint_method.clone(),
        })
        .collect();

    let info = DocumentInfo::new(
        format!("{} - {}", project.name, version.name),
        version.name,
    );
    let merged = merge_documents(&info, &selections, &sources);
    tracing::debug!(
        version_id,
        selections = selections.len(),
        sources = sources.len(),
        "merged document generated"
    );
    Ok(Json(merged))
}

/// GET /docs/:slug
///
/// Serves the Swagger UI page of a project with a version selector.
pub async fn project_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ApiError> {
    let project = state
        .store
        .find_project_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::NotFound("project not found".to_string()))?;
    // list_versions is name-ascending; show the highest name first.
    let mut versions = state.store.list_versions(project.id).await?;
    versions.reverse();
    Ok(Html(render_project_page(&project, &versions)))
}

fn render_project_page(project: &Project, versions: &[ProjectVersion]) -> String {
    let options: String = versions
        .iter()
        .map(|version| {
            format!(
                r#"<option value="{}">{}</option>"#,
                version.id, version.name
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{name} - API documentation</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
  <style>
    body {{ margin: 0; }}
    .hub-topbar {{ display: flex; align-items: center; gap: 1rem; padding: 0.75rem 1.25rem; background: #1b1b1b; color: #ffffff; }}
    .hub-topbar h1 {{ font-size: 1.1rem; margin: 0; }}
    .hub-topbar select {{ margin-left: auto; padding: 0.25rem; }}
  </style>
</head>
<body>
  <div class="hub-topbar">
    <h1>{name}</h1>
    <select id="version-select">{options}</select>
  </div>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
  <script>
    const select = document.getElementById('version-select');
    function render(versionId) {{
      window.ui = SwaggerUIBundle({{
        url: '/docs/versions/' + versionId,
        dom_id: '#swagger-ui',
      }});
    }}
    select.addEventListener('change', function () {{ render(select.value); }});
    if (select.value) {{
      render(select.value);
    }}
  </script>
</body>
</html>
"#,
        name = project.name,
        options = options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_lists_versions_as_options() {
        let project = Project {
            id: 1,
            name: "Petstore".to_string(),
            slug: "petstore".to_string(),
        };
        let versions = vec![
            ProjectVersion {
                id: 11,
                project_id: 1,
                name: "v2".to_string(),
            },
            ProjectVersion {
                id: 10,
                project_id: 1,
                name: "v1".to_string(),
            },
        ];
        let page = render_project_page(&project, &versions);
        assert!(page.contains("<h1>Petstore</h1>"));
        assert!(page.contains(r#"<option value="11">v2</option>"#));
        assert!(page.contains(r#"<option value="10">v1</option>"#));
        assert!(page.contains("/docs/versions/"));
    }

    #[test]
    fn test_page_without_versions_empty_selector() {
        let project = Project {
            id: 1,
            name: "Petstore".to_string(),
            slug: "petstore".to_string(),
        };
        let page = render_project_page(&project, &[]);
        assert!(page.contains(r#"<select id="version-select"></select>"#));
    }
}
