use crate::transform::RewriteError;
use crate::tree::{ResourceId, TreeNode};

/// Where a workload kind keeps its container list, as a field path from the
/// document root.
#[derive(Debug)]
pub struct ShapeSpec {
    pub kind: &'static str,
    pub group: &'static str,
    pub path: &'static [&'static str],
}

impl ShapeSpec {
    pub fn matches(&self, id: &ResourceId) -> bool {
        self.kind == id.kind && self.group == id.group
    }
}

const POD_TEMPLATE_CONTAINERS: &[&str] = &["spec", "template", "spec", "containers"];

/// Container-list locations for the recognized workload kinds.
pub static WORKLOAD_SHAPES: &[ShapeSpec] = &[
    ShapeSpec {
        kind: "Pod",
        group: "",
        path: &["spec", "containers"],
    },
    ShapeSpec {
        kind: "PodTemplate",
        group: "",
        path: &["template", "spec", "containers"],
    },
    ShapeSpec {
        kind: "ReplicationController",
        group: "",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "Deployment",
        group: "apps",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "ReplicaSet",
        group: "apps",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "StatefulSet",
        group: "apps",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "DaemonSet",
        group: "apps",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "Job",
        group: "batch",
        path: POD_TEMPLATE_CONTAINERS,
    },
    ShapeSpec {
        kind: "CronJob",
        group: "batch",
        path: &["spec", "jobTemplate", "spec", "template", "spec", "containers"],
    },
];

/// Strategy for locating candidate container lists inside one document.
pub trait ShapeMatcher {
    fn for_each_container_list<N: TreeNode>(
        &self,
        document: &mut N,
        visit: &mut dyn FnMut(&mut N) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError>;
}

/// Table-driven matcher over the recognized workload shapes. Unrecognized
/// kinds and absent paths yield no candidates.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedShapeMatcher;

impl ShapeMatcher for FixedShapeMatcher {
    fn for_each_container_list<N: TreeNode>(
        &self,
        document: &mut N,
        visit: &mut dyn FnMut(&mut N) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError> {
        let Some(id) = document.resource_id() else {
            return Ok(());
        };
        for shape in WORKLOAD_SHAPES.iter().filter(|shape| shape.matches(&id)) {
            if let Some(list) = navigate_mut(document, shape.path) {
                visit(list)?;
            }
        }
        Ok(())
    }
}

fn navigate_mut<'a, N: TreeNode>(node: &'a mut N, path: &[&str]) -> Option<&'a mut N> {
    let mut current = node;
    for step in path.iter().copied() {
        current = current.field_mut(step)?;
    }
    Some(current)
}

static CONTAINER_FIELDS: [&str; 2] = ["containers", "initContainers"];

/// Fallback matcher that searches the whole tree for fields literally named
/// `containers` or `initContainers`. Prone to false positives on unrelated
/// fields carrying those names.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecursiveNameMatcher;

impl ShapeMatcher for RecursiveNameMatcher {
    fn for_each_container_list<N: TreeNode>(
        &self,
        document: &mut N,
        visit: &mut dyn FnMut(&mut N) -> Result<(), RewriteError>,
    ) -> Result<(), RewriteError> {
        find_container_fields(document, visit)
    }
}

fn find_container_fields<N: TreeNode>(
    node: &mut N,
    visit: &mut dyn FnMut(&mut N) -> Result<(), RewriteError>,
) -> Result<(), RewriteError> {
    let mut found = false;
    for field in CONTAINER_FIELDS {
        if let Some(list) = node.field_mut(field) {
            visit(list)?;
            found = true;
        }
    }
    if found {
        return Ok(());
    }
    // No container field at this level, keep descending through nested
    // mappings and lists of mappings.
    for value in node.values_mut() {
        if value.is_mapping() {
            find_container_fields(value, visit)?;
        } else if value.is_list() {
            for element in value.elements_mut().unwrap_or(&mut []) {
                if element.is_mapping() {
                    find_container_fields(element, visit)?;
                }
            }
        }
    }
    Ok(())
}
