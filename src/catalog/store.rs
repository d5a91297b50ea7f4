// This file contains the storage port for the catalog plus the in-memory
// implementation used by the standalone server and the test suite.

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use super::model::{
    slugify, ApiSpec, NewAssociation, Project, ProjectVersion, SpecSummary, VersionAssociation,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A row the operation depends on does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The backing store failed. Reserved for stores backed by an external
    /// database; the in-memory store never produces it.
    #[error("catalog store error: {0}")]
    Backend(String),
}

/// Storage port for projects, specs, versions and associations.
///
/// Deletes cascade: removing a project removes its versions and their
/// associations, removing a spec or version removes the associations that
/// point at it. Deletes of absent rows succeed silently.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Projects ordered by name.
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;
    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>, StoreError>;
    async fn create_project(&self, name: String) -> Result<Project, StoreError>;
    /// Renames a project, keeping its slug stable so published
    /// documentation links keep working. `None` when the id is unknown.
    async fn rename_project(&self, id: i64, name: String) -> Result<Option<Project>, StoreError>;
    async fn delete_project(&self, id: i64) -> Result<(), StoreError>;

    /// Spec summaries ordered by name.
    async fn list_specs(&self) -> Result<Vec<SpecSummary>, StoreError>;
    async fn get_spec(&self, id: i64) -> Result<Option<ApiSpec>, StoreError>;
    async fn create_spec(&self, name: String, yaml: String) -> Result<ApiSpec, StoreError>;
    async fn update_spec(
        &self,
        id: i64,
        name: String,
        yaml: String,
    ) -> Result<Option<ApiSpec>, StoreError>;
    async fn delete_spec(&self, id: i64) -> Result<(), StoreError>;

    /// Versions of one project ordered by name.
    async fn list_versions(&self, project_id: i64) -> Result<Vec<ProjectVersion>, StoreError>;
    /// A version together with its owning project.
    async fn get_version(&self, id: i64)
        -> Result<Option<(ProjectVersion, Project)>, StoreError>;
    /// Fails with [`StoreError::NotFound`] when the project is unknown.
    async fn create_version(
        &self,
        project_id: i64,
        name: String,
    ) -> Result<ProjectVersion, StoreError>;
    async fn delete_version(&self, id: i64) -> Result<(), StoreError>;

    /// Associations of one version in the order they were saved.
    async fn list_associations(
        &self,
        version_id: i64,
    ) -> Result<Vec<VersionAssociation>, StoreError>;
    /// Replaces the whole association set of a version in one step.
    /// Fails with [`StoreError::NotFound`] when the version is unknown.
    async fn replace_associations(
        &self,
        version_id: i64,
        entries: Vec<NewAssociation>,
    ) -> Result<Vec<VersionAssociation>, StoreError>;
}

#[derive(Debug, Default)]
struct CatalogState {
    next_id: i64,
    projects: BTreeMap<i64, Project>,
    specs: BTreeMap<i64, ApiSpec>,
    versions: BTreeMap<i64, ProjectVersion>,
    associations: BTreeMap<i64, VersionAssociation>,
}

impl CatalogState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Catalog kept entirely in process memory behind a [`RwLock`].
///
/// Ids are monotonically increasing, so iterating the id-keyed maps visits
/// rows in insertion order.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> MemoryCatalog {
        MemoryCatalog::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|project| project.slug == slug)
            .cloned())
    }

    async fn create_project(&self, name: String) -> Result<Project, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let project = Project {
            id,
            slug: slugify(&name),
            name,
        };
        state.projects.insert(id, project.clone());
        Ok(project)
    }

    async fn rename_project(&self, id: i64, name: String) -> Result<Option<Project>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.projects.get_mut(&id).map(|project| {
            project.name = name;
            project.clone()
        }))
    }

    async fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.projects.remove(&id);
        let version_ids: Vec<i64> = state
            .versions
            .values()
            .filter(|version| version.project_id == id)
            .map(|version| version.id)
            .collect();
        state.versions.retain(|_, version| version.project_id != id);
        state
            .associations
            .retain(|_, association| !version_ids.contains(&association.version_id));
        Ok(())
    }

    async fn list_specs(&self) -> Result<Vec<SpecSummary>, StoreError> {
        let state = self.state.read().await;
        let mut specs: Vec<SpecSummary> = state
            .specs
            .values()
            .map(|spec| SpecSummary {
                id: spec.id,
                name: spec.name.clone(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(specs)
    }

    async fn get_spec(&self, id: i64) -> Result<Option<ApiSpec>, StoreError> {
        let state = self.state.read().await;
        Ok(state.specs.get(&id).cloned())
    }

    async fn create_spec(&self, name: String, yaml: String) -> Result<ApiSpec, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id();
        let spec = ApiSpec { id, name, yaml };
        state.specs.insert(id, spec.clone());
        Ok(spec)
    }

    async fn update_spec(
        &self,
        id: i64,
        name: String,
        yaml: String,
    ) -> Result<Option<ApiSpec>, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.specs.get_mut(&id).map(|spec| {
            spec.name = name;
            spec.yaml = yaml;
            spec.clone()
        }))
    }

    async fn delete_spec(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.specs.remove(&id);
        state
            .associations
            .retain(|_, association| association.spec_id != id);
        Ok(())
    }

    async fn list_versions(&self, project_id: i64) -> Result<Vec<ProjectVersion>, StoreError> {
        let state = self.state.read().await;
        let mut versions: Vec<ProjectVersion> = state
            .versions
            .values()
            .filter(|version| version.project_id == project_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(versions)
    }

    async fn get_version(
        &self,
        id: i64,
    ) -> Result<Option<(ProjectVersion, Project)>, StoreError> {
        let state = self.state.read().await;
        let Some(version) = state.versions.get(&id) else {
            return Ok(None);
        };
        Ok(state
            .projects
            .get(&version.project_id)
            .map(|project| (version.clone(), project.clone())))
    }

    async fn create_version(
        &self,
        project_id: i64,
        name: String,
    ) -> Result<ProjectVersion, StoreError> {
        let mut state = self.state.write().await;
        if !state.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound("project"));
        }
        let id = state.next_id();
        let version = ProjectVersion {
            id,
            project_id,
            name,
        };
        state.versions.insert(id, version.clone());
        Ok(version)
    }

    async fn delete_version(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.versions.remove(&id);
        state
            .associations
            .retain(|_, association| association.version_id != id);
        Ok(())
    }

    async fn list_associations(
        &self,
        version_id: i64,
    ) -> Result<Vec<VersionAssociation>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .associations
            .values()
            .filter(|association| association.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn replace_associations(
        &self,
        version_id: i64,
        entries: Vec<NewAssociation>,
    ) -> Result<Vec<VersionAssociation>, StoreError> {
        let mut state = self.state.write().await;
        if !state.versions.contains_key(&version_id) {
            return Err(StoreError::NotFound("version"));
        }
        state
            .associations
            .retain(|_, association| association.version_id != version_id);
        let mut created = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = state.next_id();
            let association = VersionAssociation {
                id,
                version_id,
                spec_id: entry.spec_id,
                endpoint_path: entry.endpoint_path,
                endpoint_method: entry.endpoint_method,
            };
            state.associations.insert(id, association.clone());
            created.push(association);
        }
        Ok(created)
    }
}
