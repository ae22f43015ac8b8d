#![no_main]

// Harness: reconcile_cycle
// Focus: raw ACEs with arbitrary field values never abort a cycle; bad ones become warnings.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use regacl_core::config::DeclaredConfig;
use regacl_core::testing::InMemoryHost;
use regacl_core::types::PurgeMode;
use regacl_core::{RawAce, RawIdentity, Reconciler};

#[derive(Arbitrary, Debug, Clone)]
struct RawFrame {
    account: u8,
    rights: i64,
    ace_type: i64,
    inherited: bool,
    inheritance: i64,
    propagation: i64,
}

const ACCOUNTS: &[&str] = &["BUILTIN\\Users", "Everyone", "NT AUTHORITY\\SYSTEM", "S-1-15-3-1024-1", "CONTOSO\\ghost"];

fuzz_target!(|frames: Vec<RawFrame>| {
    let host = InMemoryHost::new();
    host.insert_key("hklm:software", "SYSTEM", vec![], vec![]);
    for f in &frames {
        host.push_raw_ace(
            "hklm:software",
            RawAce {
                identity: RawIdentity { value: ACCOUNTS[f.account as usize % ACCOUNTS.len()].to_string() },
                rights: f.rights,
                ace_type: f.ace_type,
                inherited: f.inherited,
                inheritance: f.inheritance,
                propagation: f.propagation,
            },
        );
    }

    let config = DeclaredConfig {
        target: "hklm:software".to_string(),
        owner: None,
        inherit_from_parent: None,
        permissions: Vec::new(),
        purge: PurgeMode::All,
    };
    let outcome = Reconciler::new(&host, &host, &host).plan(&config).expect("decode failures are not fatal");
    assert_eq!(
        outcome.snapshot.ordinary.len() + outcome.snapshot.capability.len() + outcome.warnings().len(),
        frames.len()
    );
});
