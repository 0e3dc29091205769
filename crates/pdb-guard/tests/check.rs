use std::path::PathBuf;

use k8s_openapi::api::{apps::v1::Deployment, policy::v1::PodDisruptionBudget};
use pdb_guard::{
    budget::{BudgetPolicy, ValidatorOptions, Verdict, check},
    manifest::Manifest,
    workload::WorkloadSpec,
};
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn check_fixtures(
    pdb: &str,
    deployment: &str,
    options: &ValidatorOptions,
) -> Result<Verdict, String> {
    let pdb = PodDisruptionBudget::from_file(fixture(pdb)).unwrap();
    let deployment = Deployment::from_file(fixture(deployment)).unwrap();

    let policy = BudgetPolicy::try_from(&pdb).map_err(|error| error.to_string())?;
    let workload = WorkloadSpec::from(&deployment);

    check(&policy, &workload, options).map_err(|error| error.to_string())
}

#[rstest]
#[case("pdb-max-unavailable-1.yaml", "deployment-3-replicas.yaml", Ok(Verdict::Valid))]
#[case("pdb-min-available-50-percent.yaml", "deployment-3-replicas.yaml", Ok(Verdict::Valid))]
#[case("pdb-legacy-max-unavailable.yaml", "deployment-3-replicas.yaml", Ok(Verdict::Valid))]
#[case(
    "pdb-other-selector.yaml",
    "deployment-3-replicas.yaml",
    Ok(Verdict::NotApplicable)
)]
#[case(
    "pdb-other-namespace.yaml",
    "deployment-3-replicas.yaml",
    Err("PodDisruptionBudget(web): maxUnavailable(0) is less than 1".to_owned())
)]
#[case(
    "pdb-max-unavailable-100-percent.yaml",
    "deployment-3-replicas.yaml",
    Err("PodDisruptionBudget(web): maxUnavailable(100%) is greater than or equal to Deployment(web) replicas(3)".to_owned())
)]
#[case(
    "pdb-min-available-90-percent.yaml",
    "deployment-3-replicas.yaml",
    Err("PodDisruptionBudget(web): minAvailable(90%) is greater than or equal to Deployment(web) replicas(3)".to_owned())
)]
#[case(
    "pdb-max-unavailable-1.yaml",
    "deployment-no-replicas.yaml",
    Err("PodDisruptionBudget(web): maxUnavailable(1) is greater than or equal to Deployment(web) replicas(1)".to_owned())
)]
#[case(
    "pdb-malformed.yaml",
    "deployment-3-replicas.yaml",
    Err("PodDisruptionBudget(web): maxUnavailable is malformed".to_owned())
)]
fn check_manifests(
    #[case] pdb: &str,
    #[case] deployment: &str,
    #[case] expected: Result<Verdict, String>,
) {
    assert_eq!(
        check_fixtures(pdb, deployment, &ValidatorOptions::default()),
        expected
    );
}

#[rstest]
#[case("pdb-other-namespace.yaml", Ok(Verdict::NotApplicable))]
#[case("pdb-max-unavailable-1.yaml", Ok(Verdict::Valid))]
fn check_manifests_within_namespace(
    #[case] pdb: &str,
    #[case] expected: Result<Verdict, String>,
) {
    let options = ValidatorOptions {
        same_namespace_only: true,
        ..Default::default()
    };

    assert_eq!(
        check_fixtures(pdb, "deployment-3-replicas.yaml", &options),
        expected
    );
}
