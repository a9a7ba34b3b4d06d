use serde::Deserialize;

/// Splits an image reference into its name and tag parts, using either the
/// colon `:` or at `@` separator. The returned tag keeps its separator; it is
/// empty when the reference carries neither a tag nor a digest.
pub fn split(reference: &str) -> (&str, &str) {
    // A registry host may carry a port (myregistry.local:5000/app:1.0), so a
    // tag colon only counts when it sits after the first slash.
    let colon = match reference.find('/') {
        None => reference.rfind(':'),
        Some(slash) => match reference[slash..].rfind(':') {
            Some(local) if local > 0 => Some(slash + local),
            _ => None,
        },
    };
    let at = reference.rfind('@');

    match colon.or(at) {
        Some(i) => reference.split_at(i),
        None => (reference, ""),
    }
}

/// One desired replacement for parts of an image reference, as declared in
/// the versions file. Unset and empty fields leave the original part alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageOverride {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub digest: Option<String>,
}

impl ImageOverride {
    /// Applies the override to an image reference and returns the merged
    /// reference. The digest is checked after the tag, so it wins whenever
    /// both are set.
    pub fn merge(&self, original: &str) -> String {
        let (name, suffix) = split(original);
        let name = match non_empty(&self.name) {
            Some(name) => name,
            None => name,
        };
        let mut suffix = suffix.to_string();
        if let Some(tag) = non_empty(&self.tag) {
            suffix = format!(":{}", tag);
        }
        if let Some(digest) = non_empty(&self.digest) {
            suffix = format!("@{}", digest);
        }
        format!("{}{}", name, suffix)
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}
