//! Decides whether a disruption budget governs a workload by matching its label
//! selector against the workload's pod template labels.
use std::{collections::BTreeMap, fmt::Display};

use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

/// A predicate over a set of labels.
///
/// Callers only depend on this trait, so selector grammars beyond plain
/// equality can be added as new [`Selector`] variants later on.
pub trait LabelMatcher {
    /// Returns `true` if `labels` satisfy this matcher.
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool;
}

/// Every key/value pair must be present in the labels with exactly that value.
/// An empty map matches everything.
impl LabelMatcher for BTreeMap<String, String> {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.iter()
            .all(|(key, value)| labels.get(key).is_some_and(|label| label == value))
    }
}

/// The label selector of a disruption budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
    /// Equality-only matching, the `matchLabels` part of a Kubernetes
    /// [`LabelSelector`].
    MatchLabels(BTreeMap<String, String>),
}

impl Default for Selector {
    fn default() -> Self {
        Self::MatchLabels(BTreeMap::new())
    }
}

impl LabelMatcher for Selector {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::MatchLabels(match_labels) => match_labels.matches(labels),
        }
    }
}

impl From<&LabelSelector> for Selector {
    /// Only `matchLabels` are taken into account, `matchExpressions` are not
    /// evaluated.
    fn from(selector: &LabelSelector) -> Self {
        if let Some(expressions) = selector.match_expressions.as_ref().filter(|e| !e.is_empty()) {
            tracing::debug!(
                k8s.selector.expressions = expressions.len(),
                "ignoring matchExpressions of label selector"
            );
        }

        Self::MatchLabels(selector.match_labels.clone().unwrap_or_default())
    }
}

impl Display for Selector {
    /// Renders the selector in the query string format used by the
    /// Kubernetes API, e.g. `app=web,tier=frontend`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MatchLabels(match_labels) => {
                let pairs = match_labels
                    .iter()
                    .map(|(key, value)| format!("{key}={value}"))
                    .collect::<Vec<_>>();

                f.write_str(&pairs.join(","))
            }
        }
    }
}

/// Returns whether `selector` applies to a workload with the given pod
/// template `labels`.
pub fn applies(selector: &impl LabelMatcher, labels: &BTreeMap<String, String>) -> bool {
    selector.matches(labels)
}
