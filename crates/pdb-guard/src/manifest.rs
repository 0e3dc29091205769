//! Loading of Kubernetes object manifests from YAML (or JSON) files.
use std::path::{Path, PathBuf};

use k8s_openapi::{Resource, api::policy::v1::PodDisruptionBudget};
use serde::de::DeserializeOwned;
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

/// The field holding the API version of a manifest.
const API_VERSION_KEY: &str = "apiVersion";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read manifest {path:?}"))]
    ReadManifest {
        source: std::io::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to parse manifest {path:?} as YAML"))]
    ParseYaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },

    #[snafu(display("failed to deserialize manifest {path:?} as {kind}"))]
    DeserializeObject {
        source: serde_yaml::Error,
        path: PathBuf,
        kind: &'static str,
    },
}

/// A Kubernetes object which can be loaded from a manifest file.
pub trait Manifest: Resource + DeserializeOwned {
    /// Older API versions of the same kind whose schema is compatible with
    /// [`Resource::API_VERSION`] for everything read from it.
    const LEGACY_API_VERSIONS: &'static [&'static str] = &[];

    /// Reads and deserializes the manifest at `path`.
    fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).context(ReadManifestSnafu { path })?;

        Self::from_yaml(&contents, path)
    }

    /// Deserializes a manifest from `contents`. `path` is only used for error
    /// reporting.
    fn from_yaml(contents: &str, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(contents).context(ParseYamlSnafu { path })?;

        if let Some(api_version) = value.get_mut(API_VERSION_KEY)
            && api_version
                .as_str()
                .is_some_and(|version| Self::LEGACY_API_VERSIONS.contains(&version))
        {
            tracing::debug!(
                manifest.path = %path.display(),
                from = ?api_version.as_str(),
                to = Self::API_VERSION,
                "upgrading legacy API version"
            );
            *api_version = serde_yaml::Value::from(Self::API_VERSION);
        }

        serde_yaml::from_value(value).context(DeserializeObjectSnafu {
            path,
            kind: Self::KIND,
        })
    }
}

impl Manifest for PodDisruptionBudget {
    const LEGACY_API_VERSIONS: &'static [&'static str] = &["policy/v1beta1"];
}

impl Manifest for k8s_openapi::api::apps::v1::Deployment {}
