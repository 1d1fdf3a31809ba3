//! Runner tests against the stub provisioning binary
//!
//! Verify the exact flag sets passed to the binary, output parsing, and how
//! failures surface.

mod common;

use common::StubTofu;
use infratest::tofu;

#[test]
fn test_init_passes_backend_config_flags() {
    let stub = StubTofu::new();
    let mut options = stub.options();
    options
        .backend_config
        .insert("container_name".to_string(), "tfstate".to_string());
    options
        .backend_config
        .insert("resource_group_name".to_string(), "rg-backend".to_string());

    tofu::init(&options).unwrap();

    let invocations = stub.invocations();
    assert_eq!(invocations.len(), 1);
    assert_eq!(
        invocations[0],
        "init -input=false -backend-config=container_name=tfstate \
         -backend-config=resource_group_name=rg-backend"
    );
}

#[test]
fn test_init_and_apply_runs_in_order() {
    let stub = StubTofu::new();
    tofu::init_and_apply(&stub.options()).unwrap();

    let invocations = stub.invocations();
    assert_eq!(invocations.len(), 2);
    assert!(invocations[0].starts_with("init"));
    assert_eq!(invocations[1], "apply -input=false -auto-approve");
}

#[test]
fn test_destroy_is_non_interactive() {
    let stub = StubTofu::new();
    tofu::destroy(&stub.options()).unwrap();

    assert_eq!(
        stub.invocations(),
        vec!["destroy -input=false -auto-approve".to_string()]
    );
}

#[test]
fn test_vars_are_passed_to_apply_and_destroy() {
    let stub = StubTofu::new();
    let mut options = stub.options();
    options
        .vars
        .insert("location".to_string(), "westeurope".to_string());

    tofu::apply(&options).unwrap();
    tofu::destroy(&options).unwrap();

    for line in stub.invocations() {
        assert!(line.ends_with("-var location=westeurope"), "missing var in: {line}");
    }
}

#[test]
fn test_output_trims_trailing_newline() {
    let stub = StubTofu::new();
    let value = tofu::output(&stub.options(), "resource_group_name").unwrap();
    assert_eq!(value, common::RESOURCE_GROUP);
}

#[test]
fn test_unknown_output_fails_with_stderr() {
    let stub = StubTofu::new();
    let err = tofu::output(&stub.options(), "no_such_output").unwrap_err();
    assert!(err.to_string().contains("stub: unknown output no_such_output"));
}

#[test]
fn test_output_map_keeps_string_outputs_only() {
    let stub = StubTofu::new();
    let outputs = tofu::output_map(&stub.options()).unwrap();

    assert_eq!(outputs.len(), 5);
    assert_eq!(outputs["resource_group_name"], common::RESOURCE_GROUP);
    assert_eq!(outputs["resource_suffix"], common::RESOURCE_SUFFIX);
    assert!(!outputs.contains_key("replica_counts"));
}

#[test]
fn test_stack_outputs_read_all_five_names() {
    let stub = StubTofu::new();
    let outputs = infratest::StackOutputs::read(&stub.options()).unwrap();

    assert_eq!(outputs.resource_group_name, common::RESOURCE_GROUP);
    assert_eq!(outputs.key_vault_name, common::KEY_VAULT);
    assert_eq!(outputs.container_registry_name, common::CONTAINER_REGISTRY);
    assert_eq!(outputs.resource_suffix, common::RESOURCE_SUFFIX);
    assert_eq!(
        outputs.principal_ids().main_service_principal_id,
        common::MAIN_PRINCIPAL
    );
}

#[test]
fn test_failed_apply_surfaces_stderr() {
    let stub = StubTofu::new();
    let err = tofu::init_and_apply(&stub.failing_options("apply")).unwrap_err();

    assert!(err.to_string().contains("stub: forced apply failure"));
    // init succeeded before apply failed
    assert_eq!(stub.count("init"), 1);
    assert_eq!(stub.count("apply"), 1);
}
