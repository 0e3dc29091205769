//! Triggers a rolling restart of a [`Deployment`] the same way
//! `kubectl rollout restart` does: by stamping the pod template with the
//! current time, which changes the template hash.
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use k8s_openapi::api::apps::v1::Deployment;
use kube::{
    Api, Client, Config,
    api::{Patch, PatchParams},
    config::{InferConfigError, KubeConfigOptions, Kubeconfig, KubeconfigError},
};
use serde_json::json;
use snafu::{ResultExt, Snafu};

type Result<T, E = Error> = std::result::Result<T, E>;

/// The pod template annotation used by `kubectl rollout restart`.
pub const RESTARTED_AT_ANNOTATION: &str = "kubectl.kubernetes.io/restartedAt";

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("failed to read kubeconfig {path:?}"))]
    ReadKubeconfig {
        source: KubeconfigError,
        path: PathBuf,
    },

    #[snafu(display("failed to load client configuration from kubeconfig {path:?}"))]
    LoadKubeconfig {
        source: KubeconfigError,
        path: PathBuf,
    },

    #[snafu(display("failed to infer client configuration"))]
    InferConfig { source: InferConfigError },

    #[snafu(display("failed to create Kubernetes client"))]
    CreateClient { source: kube::Error },

    #[snafu(display("failed to get Deployment {namespace}/{name}"))]
    GetDeployment {
        source: kube::Error,
        namespace: String,
        name: String,
    },

    #[snafu(display("failed to patch {namespace}/{name}"))]
    PatchDeployment {
        source: kube::Error,
        namespace: String,
        name: String,
    },
}

/// Creates a Kubernetes client.
///
/// If `kubeconfig` is given, the client is configured from that file (using
/// its current context). Otherwise the configuration is inferred from the
/// environment: `KUBECONFIG`, `~/.kube/config` or the in-cluster service
/// account.
pub async fn create_client(kubeconfig: Option<&Path>) -> Result<Client> {
    let config = match kubeconfig {
        Some(path) => {
            tracing::debug!(kubeconfig.path = %path.display(), "loading kubeconfig");

            let kubeconfig = Kubeconfig::read_from(path).context(ReadKubeconfigSnafu { path })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context(LoadKubeconfigSnafu { path })?
        }
        None => Config::infer().await.context(InferConfigSnafu)?,
    };

    Client::try_from(config).context(CreateClientSnafu)
}

/// Builds the strategic merge patch which sets [`RESTARTED_AT_ANNOTATION`] on
/// the pod template to `restarted_at`, formatted as RFC 3339 with second
/// precision.
pub fn restart_patch(restarted_at: Timestamp) -> serde_json::Value {
    let restarted_at = restarted_at.strftime("%Y-%m-%dT%H:%M:%SZ").to_string();

    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        RESTARTED_AT_ANNOTATION: restarted_at
                    }
                }
            }
        }
    })
}

/// Triggers a rolling restart of the Deployment `name`.
///
/// If `namespace` is [`None`], the default namespace of `client` is used.
/// Returns the patched Deployment.
pub async fn restart(client: Client, namespace: Option<&str>, name: &str) -> Result<Deployment> {
    let namespace = namespace.unwrap_or_else(|| client.default_namespace()).to_owned();
    let api: Api<Deployment> = Api::namespaced(client, &namespace);

    let deployment = api.get(name).await.context(GetDeploymentSnafu {
        namespace: &namespace,
        name,
    })?;
    tracing::debug!(
        k8s.namespace = %namespace,
        k8s.deployment.name = name,
        k8s.deployment.generation = ?deployment.metadata.generation,
        "fetched Deployment"
    );

    let patch = restart_patch(Timestamp::now());
    let patched = api
        .patch(name, &PatchParams::default(), &Patch::Strategic(&patch))
        .await
        .context(PatchDeploymentSnafu {
            namespace: &namespace,
            name,
        })?;

    tracing::info!(
        k8s.namespace = %namespace,
        k8s.deployment.name = name,
        "triggered rolling restart"
    );

    Ok(patched)
}
