//! Disruption budget policies and the checks which decide whether a budget is
//! compatible with the workload it governs.
//!
//! A [`BudgetPolicy`] is usually created from a Kubernetes
//! [`PodDisruptionBudget`], a [`WorkloadSpec`] from a
//! [`Deployment`](k8s_openapi::api::apps::v1::Deployment). Both are then handed
//! to [`check`], which first matches the selector and then validates the
//! threshold arithmetic:
//!
//! ```
//! use pdb_guard::{
//!     budget::{BudgetPolicy, Threshold, ValidatorOptions, Verdict, check},
//!     int_or_percent::IntOrPercent,
//!     workload::WorkloadSpec,
//! };
//!
//! let policy = BudgetPolicy {
//!     name: "web".to_owned(),
//!     threshold: Threshold::MaxUnavailable(IntOrPercent::Literal(1).into()),
//!     ..Default::default()
//! };
//! let workload = WorkloadSpec {
//!     name: "web".to_owned(),
//!     replicas: Some(3),
//!     ..Default::default()
//! };
//!
//! let verdict = check(&policy, &workload, &ValidatorOptions::default()).unwrap();
//! assert_eq!(verdict, Verdict::Valid);
//! ```
use k8s_openapi::{
    api::policy::v1::PodDisruptionBudget, apimachinery::pkg::util::intstr::IntOrString,
};
use kube::ResourceExt;
use snafu::{ResultExt, Snafu};

use crate::{
    int_or_percent::{IntOrPercentInput, ParseIntOrPercentError},
    selector::{Selector, applies},
    workload::WorkloadSpec,
};

mod validate;

pub use validate::*;

type Result<T, E = Error> = std::result::Result<T, E>;

/// The reasons a disruption budget can be rejected.
///
/// The messages of [`Error::InfeasibleBudget`] and [`Error::VacuousBudget`] are
/// relied upon by existing tooling and must not change.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The threshold could not be parsed.
    #[snafu(display("PodDisruptionBudget({policy}): {field} is malformed"))]
    MalformedThreshold {
        source: ParseIntOrPercentError,
        policy: String,
        field: ThresholdField,
    },

    /// Every replica could be disrupted at the same time.
    #[snafu(display(
        "PodDisruptionBudget({policy}): {field}({threshold}) is greater than or equal to Deployment({workload}) replicas({replicas})"
    ))]
    InfeasibleBudget {
        policy: String,
        field: ThresholdField,
        threshold: String,
        workload: String,
        replicas: u32,
    },

    /// No replica could ever be disrupted.
    #[snafu(display("PodDisruptionBudget({policy}): {field}({threshold}) is less than 1"))]
    VacuousBudget {
        policy: String,
        field: ThresholdField,
        threshold: String,
    },
}

impl Error {
    /// Returns `true` if the budget itself was judged to be unusable, as
    /// opposed to not being parsable.
    pub fn is_budget_violation(&self) -> bool {
        matches!(
            self,
            Self::InfeasibleBudget { .. } | Self::VacuousBudget { .. }
        )
    }
}

/// The two fields a disruption budget can express its threshold with.
///
/// Displays as the manifest field name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum ThresholdField {
    #[strum(serialize = "maxUnavailable")]
    MaxUnavailable,

    #[strum(serialize = "minAvailable")]
    MinAvailable,
}

/// The single constraint of a disruption budget.
///
/// Kubernetes rejects budgets that set both `maxUnavailable` and
/// `minAvailable`, but a manifest on disk can still contain both. In that case
/// `maxUnavailable` takes precedence and `minAvailable` is ignored, see
/// [`Threshold::from_fields`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Threshold {
    MaxUnavailable(IntOrPercentInput),
    MinAvailable(IntOrPercentInput),

    /// Neither field is set, nothing to check.
    #[default]
    None,
}

impl Threshold {
    /// Builds the threshold from the two optional manifest fields of the
    /// budget named `policy`.
    pub fn from_fields(
        policy: &str,
        max_unavailable: Option<&IntOrString>,
        min_available: Option<&IntOrString>,
    ) -> Result<Self> {
        let (field, value) = match (max_unavailable, min_available) {
            (Some(max_unavailable), min_available) => {
                if min_available.is_some() {
                    tracing::info!(
                        k8s.pdb.name = policy,
                        "both maxUnavailable and minAvailable are set, ignoring minAvailable"
                    );
                }

                (ThresholdField::MaxUnavailable, max_unavailable)
            }
            (None, Some(min_available)) => (ThresholdField::MinAvailable, min_available),
            (None, None) => return Ok(Self::None),
        };

        let value = IntOrPercentInput::try_from(value)
            .context(MalformedThresholdSnafu { policy, field })?;

        Ok(match field {
            ThresholdField::MaxUnavailable => Self::MaxUnavailable(value),
            ThresholdField::MinAvailable => Self::MinAvailable(value),
        })
    }

    /// Returns the field and value of the constraint, [`None`] if there is no
    /// constraint.
    pub fn constraint(&self) -> Option<(ThresholdField, &IntOrPercentInput)> {
        match self {
            Self::MaxUnavailable(value) => Some((ThresholdField::MaxUnavailable, value)),
            Self::MinAvailable(value) => Some((ThresholdField::MinAvailable, value)),
            Self::None => None,
        }
    }
}

/// A disruption budget, reduced to what is needed to check it against a
/// workload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BudgetPolicy {
    pub name: String,
    pub namespace: Option<String>,
    pub selector: Selector,
    pub threshold: Threshold,
}

impl BudgetPolicy {
    /// Returns whether this budget governs `workload`, which is decided by the
    /// selector matching the pod template labels alone.
    pub fn targets(&self, workload: &WorkloadSpec) -> bool {
        applies(&self.selector, &workload.labels)
    }

    /// Returns `false` only if both objects declare a namespace and they
    /// differ.
    pub fn shares_namespace_with(&self, workload: &WorkloadSpec) -> bool {
        match (&self.namespace, &workload.namespace) {
            (Some(policy_namespace), Some(workload_namespace)) => {
                policy_namespace == workload_namespace
            }
            _ => true,
        }
    }
}

impl TryFrom<&PodDisruptionBudget> for BudgetPolicy {
    type Error = Error;

    fn try_from(pdb: &PodDisruptionBudget) -> Result<Self> {
        let name = pdb.name_any();
        let spec = pdb.spec.as_ref();

        let selector = spec
            .and_then(|spec| spec.selector.as_ref())
            .map(Selector::from)
            .unwrap_or_default();
        let threshold = Threshold::from_fields(
            &name,
            spec.and_then(|spec| spec.max_unavailable.as_ref()),
            spec.and_then(|spec| spec.min_available.as_ref()),
        )?;

        Ok(Self {
            namespace: pdb.namespace(),
            name,
            selector,
            threshold,
        })
    }
}
