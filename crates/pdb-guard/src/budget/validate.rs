use std::fmt::Display;

use snafu::ensure;

use super::{BudgetPolicy, InfeasibleBudgetSnafu, Result, ThresholdField, VacuousBudgetSnafu};
use crate::{int_or_percent::Rounding, workload::WorkloadSpec};

/// Options which influence the budget arithmetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// How percentages are turned into a whole number of replicas. Defaults to
    /// [`Rounding::Up`], which is what the Kubernetes disruption controller
    /// uses.
    pub rounding: Rounding,

    /// Treat a budget as not applicable if it lives in a different namespace
    /// than the workload. Off by default, only the selector decides.
    pub same_namespace_only: bool,
}

/// The successful outcomes of [`check`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// The budget does not govern the workload, nothing was validated.
    NotApplicable,

    /// The budget governs the workload and its thresholds are sound.
    Valid,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("namespace or label selector not matched"),
            Self::Valid => f.write_str("valid"),
        }
    }
}

/// Concrete replica counts a threshold resolves to for one workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Bounds {
    /// Replicas guaranteed to stay up.
    healthy: i64,

    /// Replicas that may be disrupted at the same time.
    disruptions_allowed: i64,
}

impl Bounds {
    fn new(field: ThresholdField, resolved: i64, replicas: u32) -> Self {
        let replicas = i64::from(replicas);

        match field {
            ThresholdField::MaxUnavailable => Self {
                healthy: replicas - resolved,
                disruptions_allowed: resolved,
            },
            ThresholdField::MinAvailable => Self {
                healthy: resolved,
                disruptions_allowed: replicas - resolved,
            },
        }
    }
}

/// Checks that `policy` neither allows disrupting every replica of `workload`
/// nor forbids any disruption at all.
///
/// This does not check whether the policy applies to the workload, see
/// [`check`] for that.
pub fn validate(
    policy: &BudgetPolicy,
    workload: &WorkloadSpec,
    options: &ValidatorOptions,
) -> Result<()> {
    let Some((field, threshold)) = policy.threshold.constraint() else {
        tracing::debug!(
            k8s.pdb.name = %policy.name,
            "budget has neither maxUnavailable nor minAvailable set"
        );
        return Ok(());
    };

    let replicas = workload.effective_replicas();
    let resolved = threshold.value.resolve(replicas, options.rounding);
    let bounds = Bounds::new(field, resolved, replicas);

    tracing::debug!(
        k8s.pdb.name = %policy.name,
        k8s.deployment.name = %workload.name,
        %field,
        %threshold,
        resolved,
        replicas,
        healthy = bounds.healthy,
        disruptions_allowed = bounds.disruptions_allowed,
        "resolved budget threshold"
    );

    let infeasible = InfeasibleBudgetSnafu {
        policy: &policy.name,
        field,
        threshold: &threshold.input,
        workload: &workload.name,
        replicas,
    };
    let vacuous = VacuousBudgetSnafu {
        policy: &policy.name,
        field,
        threshold: &threshold.input,
    };

    match field {
        ThresholdField::MaxUnavailable => {
            ensure!(bounds.healthy >= 1, infeasible);
            ensure!(bounds.disruptions_allowed >= 1, vacuous);
        }
        ThresholdField::MinAvailable => {
            ensure!(bounds.healthy >= 1, vacuous);
            ensure!(bounds.disruptions_allowed >= 1, infeasible);
        }
    }

    Ok(())
}

/// Matches `policy` against `workload` and validates it if it applies.
///
/// A budget that does not apply is not an error, it results in
/// [`Verdict::NotApplicable`].
pub fn check(
    policy: &BudgetPolicy,
    workload: &WorkloadSpec,
    options: &ValidatorOptions,
) -> Result<Verdict> {
    if options.same_namespace_only && !policy.shares_namespace_with(workload) {
        tracing::debug!(
            k8s.pdb.name = %policy.name,
            k8s.pdb.namespace = ?policy.namespace,
            k8s.deployment.namespace = ?workload.namespace,
            "budget lives in another namespace than the workload"
        );
        return Ok(Verdict::NotApplicable);
    }

    if !policy.targets(workload) {
        tracing::debug!(
            k8s.pdb.name = %policy.name,
            k8s.pdb.selector = %policy.selector,
            k8s.deployment.name = %workload.name,
            "budget does not apply to workload"
        );
        return Ok(Verdict::NotApplicable);
    }

    validate(policy, workload, options)?;
    Ok(Verdict::Valid)
}
