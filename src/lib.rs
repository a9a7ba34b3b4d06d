//! Rewrites container image references inside Kubernetes workload manifests,
//! driven by an environment-scoped versions file. Runs as a transform step in
//! a declarative configuration-build pipeline: the pipeline supplies parsed
//! documents and a file loader, this crate locates container entries by name
//! and replaces their image field, leaving every other part of the document
//! untouched.

pub mod config;
pub mod image_reference;
pub mod loader;
pub mod shapes;
pub mod transform;
pub mod tree;
pub mod versions;

pub use config::{parse_config, TransformConfig};
pub use image_reference::{split, ImageOverride};
pub use loader::{DocumentLoader, FsLoader};
pub use shapes::{
    FixedShapeMatcher, RecursiveNameMatcher, ShapeMatcher, ShapeSpec, WORKLOAD_SHAPES,
};
pub use transform::{ContainerRewriter, RewriteError};
pub use tree::{ResourceId, TreeNode};
pub use versions::{load_version_table, VersionTable, VersionsError};
