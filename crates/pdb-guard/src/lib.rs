//! Checks whether a PodDisruptionBudget is compatible with the Deployment it
//! governs, before either of them is rolled out.
//!
//! A budget is rejected if it would allow every replica to be disrupted at the
//! same time, or if it forbids voluntary disruptions altogether. The checks
//! live in [`budget`], everything else is plumbing around them.
//!
//! ## Crate Features
//!
//! - `clap` derives [`clap::ValueEnum`] for enums which are useful as CLI
//!   arguments, like [`int_or_percent::Rounding`].

pub mod budget;
pub mod int_or_percent;
pub mod manifest;
pub mod restart;
pub mod selector;
pub mod workload;

// External re-exports
pub use k8s_openapi;
pub use kube;
