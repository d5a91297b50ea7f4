// This file contains the catalog module: the entities managed by the hub
// and the storage port they live behind.

pub mod model;
pub mod store;

pub use model::{
    slugify, ApiSpec, NewAssociation, Project, ProjectVersion, SpecSummary, VersionAssociation,
};
pub use store::{CatalogStore, MemoryCatalog, StoreError};
