use serde_yaml_ng::Value;

/// Kind and API group identity of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceId {
    pub kind: String,
    pub group: String,
}

impl ResourceId {
    /// Builds the identity from the `kind` and `apiVersion` field values.
    /// The group is the segment before `/` in the apiVersion; core-group
    /// documents (`apiVersion: v1`) have an empty group.
    pub fn new(kind: &str, api_version: &str) -> Self {
        let group = match api_version.split_once('/') {
            Some((group, _version)) => group,
            None => "",
        };
        ResourceId {
            kind: kind.to_string(),
            group: group.to_string(),
        }
    }
}

/// Field-level view of a structured-document tree node. The rewriter engine
/// depends only on these primitives, never on a serialization format.
pub trait TreeNode: Sized {
    /// Kind/group identity of a document node, if it declares a `kind`.
    fn resource_id(&self) -> Option<ResourceId>;

    /// Named field of a mapping node.
    fn field(&self, name: &str) -> Option<&Self>;

    fn field_mut(&mut self, name: &str) -> Option<&mut Self>;

    /// Sets a named field of a mapping node to a scalar string value. An
    /// existing field keeps its position in the mapping. A no-op on
    /// non-mapping nodes.
    fn set_field(&mut self, name: &str, value: &str);

    /// String scalar content of this node.
    fn as_str(&self) -> Option<&str>;

    fn is_mapping(&self) -> bool;

    fn is_list(&self) -> bool;

    /// Elements of a list node.
    fn elements_mut(&mut self) -> Option<&mut [Self]>;

    /// Values of a mapping node; empty for any other node.
    fn values_mut(&mut self) -> Vec<&mut Self>;

    /// Short label of the node's shape, for error messages.
    fn node_kind(&self) -> &'static str;
}

impl TreeNode for Value {
    fn resource_id(&self) -> Option<ResourceId> {
        let kind = self.field("kind")?.as_str()?;
        let api_version = self
            .field("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or("");
        Some(ResourceId::new(kind, api_version))
    }

    fn field(&self, name: &str) -> Option<&Self> {
        self.get(name)
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.get_mut(name)
    }

    fn set_field(&mut self, name: &str, value: &str) {
        if let Some(mapping) = self.as_mapping_mut() {
            mapping.insert(
                Value::String(name.to_string()),
                Value::String(value.to_string()),
            );
        }
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }

    fn is_mapping(&self) -> bool {
        Value::is_mapping(self)
    }

    fn is_list(&self) -> bool {
        self.is_sequence()
    }

    fn elements_mut(&mut self) -> Option<&mut [Self]> {
        self.as_sequence_mut().map(Vec::as_mut_slice)
    }

    fn values_mut(&mut self) -> Vec<&mut Self> {
        match self.as_mapping_mut() {
            Some(mapping) => mapping.iter_mut().map(|(_key, value)| value).collect(),
            None => Vec::new(),
        }
    }

    fn node_kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) | Value::Number(_) | Value::String(_) => "scalar",
            Value::Sequence(_) => "list",
            Value::Mapping(_) => "mapping",
            Value::Tagged(_) => "tagged value",
        }
    }
}
