use std::collections::BTreeMap;

use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

/// The parts of a workload that are relevant when checking a disruption
/// budget against it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkloadSpec {
    pub name: String,
    pub namespace: Option<String>,

    /// The declared replica count, `None` if it was not set.
    pub replicas: Option<i32>,

    /// Labels of the pod template, which is what a budget selector is matched
    /// against.
    pub labels: BTreeMap<String, String>,
}

impl WorkloadSpec {
    /// Kubernetes defaults an unset replica count to one.
    pub const DEFAULT_REPLICAS: u32 = 1;

    /// The replica count used for all budget arithmetic.
    ///
    /// This is the declared count if it is positive and [`Self::DEFAULT_REPLICAS`]
    /// otherwise, so it is never zero.
    pub fn effective_replicas(&self) -> u32 {
        self.replicas
            .and_then(|replicas| u32::try_from(replicas).ok())
            .filter(|replicas| *replicas > 0)
            .unwrap_or(Self::DEFAULT_REPLICAS)
    }
}

impl From<&Deployment> for WorkloadSpec {
    fn from(deployment: &Deployment) -> Self {
        let spec = deployment.spec.as_ref();

        Self {
            name: deployment.name_any(),
            namespace: deployment.namespace(),
            replicas: spec.and_then(|spec| spec.replicas),
            labels: spec
                .and_then(|spec| spec.template.metadata.as_ref())
                .and_then(|metadata| metadata.labels.clone())
                .unwrap_or_default(),
        }
    }
}
