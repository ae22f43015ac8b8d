#![cfg(test)]

use regacl_core::config::DeclaredConfig;
use regacl_core::error::ReconcileError;
use regacl_core::flags::{InheritanceFlags, PropagationFlags};
use regacl_core::rights::core;
use regacl_core::testing::{init_tracing, InMemoryHost};
use regacl_core::types::AceType;
use regacl_core::{Ace, MutationOp, RawAce, Reconciler};

// --- Fixtures ---

const DEFAULT_PERMISSIONS: &str = r#"{
    "target": "hklm:software",
    "inherit_from_parent": false,
    "owner": "Administrators",
    "permissions": [
        {
            "IdentityReference": "CREATOR OWNER",
            "RegistryRights": "FullControl",
            "AccessControlType": "Allow",
            "IsInherited": false,
            "InheritanceFlags": "ContainerInherit",
            "PropagationFlags": "InheritOnly"
        }
    ]
}"#;

// A single-entry dump, the way the host prints it: an object, not an array.
const SYSTEM_DUMP: &str = r#"{"IdentityReference":{"Value":"NT AUTHORITY\\SYSTEM"},"RegistryRights":983103,
    "AccessControlType":0,"IsInherited":true,"InheritanceFlags":3,"PropagationFlags":0}"#;

fn host_with_inherited_system() -> InMemoryHost {
    let host = InMemoryHost::new();
    let parent = RawAce::parse_list(SYSTEM_DUMP).expect("fixture parses");
    assert_eq!(parent.len(), 1);
    let system = Ace::explicit(host.identity("SYSTEM"), core::FULL_CONTROL, AceType::Allow)
        .with_flags(InheritanceFlags::decode(parent[0].inheritance).unwrap(), PropagationFlags::None);
    host.insert_key("hklm:software", "SYSTEM", vec![], vec![system]);
    host
}

// --- Tests ---

#[test]
fn test_default_permissions_apply_then_no_changes() {
    init_tracing();
    let host = host_with_inherited_system();
    let config = DeclaredConfig::from_json_str(DEFAULT_PERMISSIONS).expect("declaration parses");
    let reconciler = Reconciler::new(&host, &host, &host);

    let first = reconciler.reconcile(&config).expect("apply failed");
    let names: Vec<String> = first.plan.operations.iter().map(|op| op.to_string()).collect();
    assert_eq!(names.len(), 3, "{:?}", names);
    assert_eq!(names[0], "SetOwner(BUILTIN\\Administrators)");
    assert!(names[1].starts_with("AddAccessRule(Allow CREATOR OWNER FullControl"));
    assert_eq!(names[2], "SetInheritanceProtection(true)");

    let second = reconciler.reconcile(&config).expect("re-apply failed");
    assert!(second.plan.is_empty(), "expected no changes, got {:?}", second.plan.operations);
    assert_eq!(host.executed().len(), 1);
}

#[test]
fn test_plan_serializes_for_executors() {
    let host = host_with_inherited_system();
    let config = DeclaredConfig::from_json_str(DEFAULT_PERMISSIONS).unwrap();
    let outcome = Reconciler::new(&host, &host, &host).plan(&config).unwrap();

    let json = serde_json::to_value(&outcome.plan).expect("plan serializes");
    assert_eq!(json["operations"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["operations"][2]["SetInheritanceProtection"]["block_inheritance"], true);
    assert_eq!(json["target"]["root"], "LocalMachine");
}

#[test]
fn test_unsupported_root_from_declaration() {
    let host = InMemoryHost::new();
    let config = DeclaredConfig::from_json_str(r#"{"target":"HKEY_CURRENT_USER\\Software"}"#).unwrap();
    let err = Reconciler::new(&host, &host, &host).reconcile(&config).unwrap_err();
    assert_eq!(err, ReconcileError::UnsupportedRoot("HKEY_CURRENT_USER\\Software".into()));
}

#[test]
fn test_owner_only_declaration() {
    let host = host_with_inherited_system();
    let config = DeclaredConfig::from_json_str(r#"{"target":"hklm:software","owner":"BUILTIN\\Administrators"}"#).unwrap();
    let reconciler = Reconciler::new(&host, &host, &host);
    let outcome = reconciler.reconcile(&config).unwrap();
    assert!(matches!(outcome.plan.operations.as_slice(), [MutationOp::SetOwner(_)]));
    assert!(reconciler.plan(&config).unwrap().is_compliant());
}
