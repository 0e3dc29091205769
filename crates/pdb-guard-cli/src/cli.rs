use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pdb_guard::int_or_percent::Rounding;
use pdb_guard_telemetry::TelemetryOptions;

#[derive(Debug, PartialEq, Eq, Parser)]
#[command(
    name = "pdb-guard",
    author,
    version,
    about = "Catch PodDisruptionBudgets that would block or endanger a rollout"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    // IMPORTANT: All (flattened) sub structs should be placed at the end to ensure the help
    // headings are correct.
    #[command(flatten)]
    pub telemetry: TelemetryOptions,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Check that a PodDisruptionBudget is compatible with a Deployment.
    ///
    /// Prints nothing if the budget is valid, a note if it does not apply to
    /// the Deployment and the reason (exiting with 1) if it is not valid.
    Validate(ValidateArguments),

    /// Trigger a rolling restart of a Deployment.
    Restart(RestartArguments),
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct ValidateArguments {
    /// Path to a PodDisruptionBudget manifest.
    #[arg(long, value_name = "FILE", env = "PDB_MANIFEST")]
    pub pdb: PathBuf,

    /// Path to a Deployment manifest.
    #[arg(long, value_name = "FILE", env = "DEPLOYMENT_MANIFEST")]
    pub deploy: PathBuf,

    /// How percentages are rounded to whole replicas.
    #[arg(long, env, value_enum, default_value_t = Rounding::Up)]
    pub percentage_rounding: Rounding,

    /// Only check budgets that live in the namespace of the Deployment.
    ///
    /// By default the label selector alone decides whether a budget applies.
    #[arg(long, env)]
    pub same_namespace_only: bool,
}

#[derive(Debug, PartialEq, Eq, Args)]
pub struct RestartArguments {
    /// Name of the Deployment to restart.
    pub name: String,

    /// Namespace of the Deployment, defaults to the namespace of the current
    /// kubeconfig context.
    #[arg(long, short = 'n', env = "DEPLOYMENT_NAMESPACE")]
    pub namespace: Option<String>,

    /// Path to a kubeconfig file. If not set, the configuration is inferred
    /// from `KUBECONFIG`, `~/.kube/config` or the in-cluster environment.
    #[arg(long, value_name = "FILE", env = "KUBECONFIG_PATH")]
    pub kubeconfig: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert()
    }

    #[test]
    fn parse_validate() {
        let cli = Cli::try_parse_from([
            "pdb-guard",
            "validate",
            "--pdb",
            "pdb.yaml",
            "--deploy",
            "deploy.yaml",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Command::Validate(ValidateArguments {
                pdb: PathBuf::from("pdb.yaml"),
                deploy: PathBuf::from("deploy.yaml"),
                percentage_rounding: Rounding::Up,
                same_namespace_only: false,
            })
        );
    }

    #[test]
    fn parse_same_namespace_only() {
        let cli = Cli::try_parse_from([
            "pdb-guard",
            "validate",
            "--pdb",
            "pdb.yaml",
            "--deploy",
            "deploy.yaml",
            "--same-namespace-only",
        ])
        .unwrap();

        let Command::Validate(arguments) = cli.command else {
            panic!("expected the validate subcommand");
        };
        assert!(arguments.same_namespace_only);
    }

    #[rstest]
    #[case("up", Rounding::Up)]
    #[case("down", Rounding::Down)]
    fn parse_percentage_rounding(#[case] input: &str, #[case] expected: Rounding) {
        let cli = Cli::try_parse_from([
            "pdb-guard",
            "validate",
            "--pdb",
            "pdb.yaml",
            "--deploy",
            "deploy.yaml",
            "--percentage-rounding",
            input,
        ])
        .unwrap();

        let Command::Validate(arguments) = cli.command else {
            panic!("expected the validate subcommand");
        };
        assert_eq!(arguments.percentage_rounding, expected);
    }

    #[test]
    fn parse_restart() {
        let cli =
            Cli::try_parse_from(["pdb-guard", "restart", "web", "-n", "production"]).unwrap();

        assert_eq!(
            cli.command,
            Command::Restart(RestartArguments {
                name: "web".to_owned(),
                namespace: Some("production".to_owned()),
                kubeconfig: None,
            })
        );
    }

    #[test]
    fn validate_requires_both_manifests() {
        assert!(Cli::try_parse_from(["pdb-guard", "validate", "--pdb", "pdb.yaml"]).is_err());
    }
}
