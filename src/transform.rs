use crate::config::{parse_config, TransformConfig};
use crate::loader::DocumentLoader;
use crate::shapes::{FixedShapeMatcher, ShapeMatcher};
use crate::tree::TreeNode;
use crate::versions::{load_version_table, VersionTable, VersionsError};
use std::fmt;
use tracing::debug;

/// Kind whose documents are schema fragments, never rewrite targets.
static SCHEMA_DEFINITION_KIND: &str = "CustomResourceDefinition";

#[derive(Debug)]
pub enum RewriteError {
    /// A located container-list field is not a list, or one of its entries
    /// is not a mapping.
    UnexpectedFieldShape {
        expected: &'static str,
        found: &'static str,
    },
}

impl std::error::Error for RewriteError {}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::UnexpectedFieldShape { expected, found } => write!(
                f,
                "unexpected shape in container list: expected a {} but found a {}",
                expected, found
            ),
        }
    }
}

/// Rewrites container image references in workload documents according to a
/// version table. Constructed once per transform run; `rewrite` takes
/// `&self`, so a caller may process documents independently.
#[derive(Debug)]
pub struct ContainerRewriter<M: ShapeMatcher = FixedShapeMatcher> {
    versions: VersionTable,
    matcher: M,
}

impl ContainerRewriter<FixedShapeMatcher> {
    /// Rewriter over the fixed table of recognized workload shapes.
    pub fn new(versions: VersionTable) -> Self {
        ContainerRewriter::with_matcher(versions, FixedShapeMatcher)
    }

    /// Builds the rewriter from a parsed transform configuration, loading
    /// the version table for the configured environment through the loader.
    pub fn from_config(
        loader: &dyn DocumentLoader,
        config: &TransformConfig,
    ) -> Result<Self, VersionsError> {
        let versions = load_version_table(loader, &config.versions_file_path, &config.environment)?;
        Ok(ContainerRewriter::new(versions))
    }

    /// Builds the rewriter straight from the raw transform configuration
    /// document supplied by the pipeline.
    pub fn from_config_bytes(loader: &dyn DocumentLoader, data: &[u8]) -> anyhow::Result<Self> {
        let config = parse_config(data)?;
        Ok(ContainerRewriter::from_config(loader, &config)?)
    }
}

impl<M: ShapeMatcher> ContainerRewriter<M> {
    /// Rewriter with an explicit container-matching strategy.
    pub fn with_matcher(versions: VersionTable, matcher: M) -> Self {
        ContainerRewriter { versions, matcher }
    }

    /// Rewrites the image references of matched containers in one document.
    pub fn rewrite<N: TreeNode>(&self, document: &mut N) -> Result<(), RewriteError> {
        // Containers fields inside a CRD are schema fragments, not runtime
        // specs.
        if document
            .resource_id()
            .is_some_and(|id| id.kind == SCHEMA_DEFINITION_KIND)
        {
            return Ok(());
        }
        self.matcher
            .for_each_container_list(document, &mut |list| self.rewrite_container_list(list))
    }

    /// Rewrites every document of a collection, stopping at the first error.
    pub fn rewrite_all<N: TreeNode>(&self, documents: &mut [N]) -> Result<(), RewriteError> {
        for document in documents {
            self.rewrite(document)?;
        }
        Ok(())
    }

    fn rewrite_container_list<N: TreeNode>(&self, list: &mut N) -> Result<(), RewriteError> {
        let found = list.node_kind();
        let Some(entries) = list.elements_mut() else {
            return Err(RewriteError::UnexpectedFieldShape {
                expected: "list",
                found,
            });
        };
        for entry in entries {
            if !entry.is_mapping() {
                return Err(RewriteError::UnexpectedFieldShape {
                    expected: "mapping",
                    found: entry.node_kind(),
                });
            }
            let Some(name) = entry.field("name").and_then(N::as_str) else {
                continue;
            };
            let name = name.trim().to_string();
            let Some(image) = entry.field("image").and_then(N::as_str) else {
                continue;
            };
            let image = image.trim();
            let Some(image_override) = self.versions.get(&name) else {
                continue;
            };
            let merged = image_override.merge(image);
            debug!("Rewriting container {} image {} to {}", name, image, merged);
            entry.set_field("image", &merged);
        }
        Ok(())
    }
}
