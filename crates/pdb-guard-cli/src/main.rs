use std::process::ExitCode;

use clap::Parser;
use pdb_guard::{
    budget::{self, BudgetPolicy, ValidatorOptions, Verdict},
    k8s_openapi::api::{apps::v1::Deployment, policy::v1::PodDisruptionBudget},
    manifest::{self, Manifest},
    restart,
    workload::WorkloadSpec,
};
use pdb_guard_telemetry::Tracing;
use snafu::{Report, ResultExt, Snafu};

use crate::cli::{Cli, Command, RestartArguments, ValidateArguments};

mod cli;

const SERVICE_NAME: &str = "pdb-guard";

#[derive(Debug, Snafu)]
enum Error {
    #[snafu(display("failed to initialize logging"))]
    InitTracing {
        source: pdb_guard_telemetry::logging::Error,
    },

    #[snafu(display("failed to load PodDisruptionBudget"))]
    LoadPodDisruptionBudget { source: manifest::Error },

    #[snafu(display("failed to load Deployment"))]
    LoadDeployment { source: manifest::Error },

    #[snafu(transparent)]
    Budget { source: budget::Error },

    #[snafu(display("failed to restart Deployment"))]
    RestartDeployment { source: restart::Error },
}

/// A line the binary prints, and the stream it goes to.
#[derive(Debug, PartialEq, Eq)]
enum Output {
    Stdout(String),
    Stderr(String),
}

impl Output {
    /// What is printed for a successful check. A valid budget is reported by
    /// the exit code alone.
    fn for_verdict(verdict: Verdict) -> Option<Self> {
        match verdict {
            Verdict::NotApplicable => Some(Self::Stdout(verdict.to_string())),
            Verdict::Valid => None,
        }
    }

    /// Budget violations are printed as a single line without any
    /// decoration, everything else as a report including the chain of causes.
    fn for_error(error: Error) -> Self {
        match error {
            Error::Budget { source } if source.is_budget_violation() => {
                Self::Stderr(source.to_string())
            }
            error => Self::Stderr(Report::from_error(error).to_string()),
        }
    }

    fn print(&self) {
        match self {
            Self::Stdout(line) => println!("{line}"),
            Self::Stderr(line) => eprintln!("{line}"),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _tracing_guard = match Tracing::init(SERVICE_NAME, cli.telemetry).context(InitTracingSnafu)
    {
        Ok(tracing_guard) => tracing_guard,
        Err(error) => return fail(error),
    };

    let result = match cli.command {
        Command::Validate(arguments) => validate(&arguments).map(Output::for_verdict),
        Command::Restart(arguments) => restart_deployment(arguments).await.map(|()| None),
    };

    match result {
        Ok(output) => {
            if let Some(output) = output {
                output.print();
            }
            ExitCode::SUCCESS
        }
        Err(error) => fail(error),
    }
}

fn fail(error: Error) -> ExitCode {
    Output::for_error(error).print();
    ExitCode::FAILURE
}

/// Loads both manifests and checks the budget against the Deployment.
fn validate(arguments: &ValidateArguments) -> Result<Verdict, Error> {
    let pdb =
        PodDisruptionBudget::from_file(&arguments.pdb).context(LoadPodDisruptionBudgetSnafu)?;
    let deployment = Deployment::from_file(&arguments.deploy).context(LoadDeploymentSnafu)?;

    let policy = BudgetPolicy::try_from(&pdb)?;
    let workload = WorkloadSpec::from(&deployment);
    let options = ValidatorOptions {
        rounding: arguments.percentage_rounding,
        same_namespace_only: arguments.same_namespace_only,
    };

    tracing::info!(
        k8s.pdb.name = %policy.name,
        k8s.deployment.name = %workload.name,
        rounding = %options.rounding,
        "checking PodDisruptionBudget"
    );

    Ok(budget::check(&policy, &workload, &options)?)
}

async fn restart_deployment(arguments: RestartArguments) -> Result<(), Error> {
    let RestartArguments {
        name,
        namespace,
        kubeconfig,
    } = arguments;

    let client = restart::create_client(kubeconfig.as_deref())
        .await
        .context(RestartDeploymentSnafu)?;
    restart::restart(client, namespace.as_deref(), &name)
        .await
        .context(RestartDeploymentSnafu)?;

    Ok(())
}
