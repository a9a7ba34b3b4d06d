use crate::image_reference::ImageOverride;
use crate::loader::DocumentLoader;
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Desired image overrides for one environment, keyed by container name.
/// Built once per transform run and read-only afterward.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct VersionTable(BTreeMap<String, ImageOverride>);

impl VersionTable {
    pub fn get(&self, container_name: &str) -> Option<&ImageOverride> {
        self.0.get(container_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ImageOverride)> for VersionTable {
    fn from_iter<I: IntoIterator<Item = (String, ImageOverride)>>(iter: I) -> Self {
        VersionTable(iter.into_iter().collect())
    }
}

#[derive(Debug, Deserialize)]
struct VersionsFile {
    #[serde(default)]
    environments: BTreeMap<String, VersionTable>,
}

#[derive(Debug)]
pub enum VersionsError {
    Load {
        path: PathBuf,
        source: anyhow::Error,
    },
    Parse {
        path: PathBuf,
        source: anyhow::Error,
    },
    MissingEnvVar {
        name: String,
        path: PathBuf,
    },
    EnvironmentNotFound {
        environment: String,
        path: PathBuf,
    },
}

impl std::error::Error for VersionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VersionsError::Load { source, .. } | VersionsError::Parse { source, .. } => {
                Some(source.as_ref())
            }
            VersionsError::MissingEnvVar { .. } | VersionsError::EnvironmentNotFound { .. } => None,
        }
    }
}

impl fmt::Display for VersionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionsError::Load { path, .. } => {
                write!(f, "failed to read versions file {}", path.display())
            }
            VersionsError::Parse { path, .. } => {
                write!(f, "failed to parse versions file {}", path.display())
            }
            VersionsError::MissingEnvVar { name, path } => write!(
                f,
                "versions file {} references missing environment variable {}",
                path.display(),
                name
            ),
            VersionsError::EnvironmentNotFound { environment, path } => write!(
                f,
                "versions for the environment {} was not found in {}",
                environment,
                path.display()
            ),
        }
    }
}

/// Loads the version table for one environment from the versions file,
/// resolved relative to the loader root. The file may be YAML or JSON; a
/// `.json` extension selects the JSON parser.
pub fn load_version_table(
    loader: &dyn DocumentLoader,
    versions_file_path: &str,
    environment: &str,
) -> Result<VersionTable, VersionsError> {
    let path = loader.root().join(versions_file_path);
    info!(
        "Loading versions for environment {} from file {}",
        environment,
        path.display()
    );

    let data = loader.load(&path).map_err(|source| VersionsError::Load {
        path: path.clone(),
        source,
    })?;
    let text = String::from_utf8(data).map_err(|err| VersionsError::Parse {
        path: path.clone(),
        source: anyhow::Error::new(err),
    })?;
    let expanded = expand_env_vars(&text, &path)?;
    let file = parse_versions(&path, &expanded).map_err(|source| VersionsError::Parse {
        path: path.clone(),
        source,
    })?;

    let mut environments = file.environments;
    match environments.remove(environment) {
        Some(table) => {
            debug!(
                "Loaded {} container overrides for environment {}",
                table.len(),
                environment
            );
            Ok(table)
        }
        None => Err(VersionsError::EnvironmentNotFound {
            environment: environment.to_string(),
            path,
        }),
    }
}

fn parse_versions(path: &Path, text: &str) -> anyhow::Result<VersionsFile> {
    if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(text).context("Failed to parse versions file as JSON")
    } else {
        serde_yaml_ng::from_str(text).context("Failed to parse versions file as YAML")
    }
}

/// Replaces `${VAR}` placeholders with environment variable values before
/// the file is parsed.
fn expand_env_vars(input: &str, path: &Path) -> Result<String, VersionsError> {
    let re = Regex::new(r"\$\{([^}]+)}").map_err(|err| VersionsError::Parse {
        path: path.to_path_buf(),
        source: anyhow::Error::new(err).context("Invalid regex pattern for env var substitution"),
    })?;

    let mut missing = None;
    let expanded = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env::var(var_name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| var_name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(VersionsError::MissingEnvVar {
            name,
            path: path.to_path_buf(),
        }),
        None => Ok(expanded.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::FsLoader;
    use std::fs;

    fn loader_with_file(file_name: &str, content: &str) -> (tempfile::TempDir, FsLoader) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join(file_name), content).expect("Failed to write versions file");
        let loader = FsLoader::new(dir.path());
        (dir, loader)
    }

    #[test]
    fn test_load_version_table_for_environment() {
        let yaml_content = r#"
        environments:
          production:
            magna-carta:
              name: magna/carta
              tag: "1"
          staging:
            magna-carta:
              name: magna/carta
              tag: "2"
            the-container:
              digest: 6a92cd1fcdc8d8cdec60f33dda4db2cb1fcdcacf3410a8e05b3741f44a9b5998
        "#;
        let (_dir, loader) = loader_with_file("versions.yaml", yaml_content);

        let table =
            load_version_table(&loader, "versions.yaml", "staging").expect("Should load versions");

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("magna-carta"),
            Some(&ImageOverride {
                name: Some("magna/carta".to_string()),
                tag: Some("2".to_string()),
                digest: None,
            })
        );
        assert!(table.get("unknown").is_none());
    }

    #[test]
    fn test_load_version_table_from_json() {
        let json_content = r#"{
          "environments": {
            "staging": {
              "the-container": { "tag": "new-v1" }
            }
          }
        }"#;
        let (_dir, loader) = loader_with_file("versions.json", json_content);

        let table =
            load_version_table(&loader, "versions.json", "staging").expect("Should load versions");

        assert_eq!(
            table.get("the-container"),
            Some(&ImageOverride {
                name: None,
                tag: Some("new-v1".to_string()),
                digest: None,
            })
        );
    }

    #[test]
    fn test_environment_not_found() {
        let (_dir, loader) = loader_with_file("versions.yaml", "environments:\n  staging: {}\n");

        let err = load_version_table(&loader, "versions.yaml", "production").unwrap_err();

        match &err {
            VersionsError::EnvironmentNotFound { environment, path } => {
                assert_eq!(environment, "production");
                assert!(path.ends_with("versions.yaml"));
            }
            other => panic!("Unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("production"));
    }

    #[test]
    fn test_absent_environments_mapping_behaves_as_empty() {
        let (_dir, loader) = loader_with_file("versions.yaml", "{}\n");

        let err = load_version_table(&loader, "versions.yaml", "staging").unwrap_err();

        assert!(matches!(err, VersionsError::EnvironmentNotFound { .. }));
    }

    #[test]
    fn test_missing_versions_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let loader = FsLoader::new(dir.path());

        let err = load_version_table(&loader, "versions.yaml", "staging").unwrap_err();

        assert!(matches!(err, VersionsError::Load { .. }));
    }

    #[test]
    fn test_unparseable_versions_file() {
        let (_dir, loader) = loader_with_file("versions.yaml", "environments: [not, a, mapping]\n");

        let err = load_version_table(&loader, "versions.yaml", "staging").unwrap_err();

        assert!(matches!(err, VersionsError::Parse { .. }));
    }

    #[test]
    fn test_expands_env_vars_in_versions_file() {
        unsafe {
            env::set_var("VERSIONS_TEST_TAG", "expanded-v2");
        }
        let yaml_content = r#"
        environments:
          staging:
            the-container:
              tag: ${VERSIONS_TEST_TAG}
        "#;
        let (_dir, loader) = loader_with_file("versions.yaml", yaml_content);

        let table =
            load_version_table(&loader, "versions.yaml", "staging").expect("Should load versions");

        assert_eq!(
            table.get("the-container").and_then(|o| o.tag.as_deref()),
            Some("expanded-v2")
        );
        unsafe {
            env::remove_var("VERSIONS_TEST_TAG");
        }
    }

    #[test]
    fn test_missing_env_var_fails_the_load() {
        let yaml_content = r#"
        environments:
          staging:
            the-container:
              tag: ${VERSIONS_TEST_MISSING_VAR}
        "#;
        let (_dir, loader) = loader_with_file("versions.yaml", yaml_content);

        let err = load_version_table(&loader, "versions.yaml", "staging").unwrap_err();

        match err {
            VersionsError::MissingEnvVar { name, .. } => {
                assert_eq!(name, "VERSIONS_TEST_MISSING_VAR");
            }
            other => panic!("Unexpected error: {:?}", other),
        }
    }
}
