pub mod document;
pub mod refs;

pub use document::{
    list_endpoints, merge_documents, parse_document, DocumentInfo, Endpoint, MergeError,
    OperationSelection, SourceSet, SpecId, CONSOLIDATED_DESCRIPTION, EMPTY_VERSION_DESCRIPTION,
    OPENAPI_VERSION, OPERATION_METHODS,
};
pub use refs::{collect_refs, ComponentRef, COMPONENTS_PREFIX};
