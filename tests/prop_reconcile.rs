use proptest::prelude::*;
use regacl_core::config::{DeclaredAce, DeclaredConfig};
use regacl_core::flags::{InheritanceFlags, PropagationFlags};
use regacl_core::rights::{self, core};
use regacl_core::testing::InMemoryHost;
use regacl_core::types::{AceType, PurgeMode};
use regacl_core::{Ace, MutationOp, Reconciler};

const KEY: &str = "hklm:software\\vendor";
const ACCOUNTS: &[&str] = &["Users", "Everyone", "SYSTEM", "CREATOR OWNER"];
const MASKS: &[u32] = &[core::READ_KEY, core::WRITE_KEY, core::FULL_CONTROL, core::QUERY_VALUES | core::SET_VALUE];
const INHERITANCE: &[InheritanceFlags] =
    &[InheritanceFlags::None, InheritanceFlags::ContainerInherit, InheritanceFlags::ContainerAndObjectInherit];
const PROPAGATION: &[PropagationFlags] =
    &[PropagationFlags::None, PropagationFlags::InheritOnly, PropagationFlags::NoPropagateInheritOnly];

/// Indices into the tables above; turned into ACEs once a host exists.
type Spec = (usize, usize, bool, usize, usize);

fn spec() -> impl Strategy<Value = Spec> {
    (0..ACCOUNTS.len(), 0..MASKS.len(), any::<bool>(), 0..INHERITANCE.len(), 0..PROPAGATION.len())
}

fn to_ace(host: &InMemoryHost, (account, mask, deny, inh, prop): Spec) -> Ace {
    let ace_type = if deny { AceType::Deny } else { AceType::Allow };
    Ace::explicit(host.identity(ACCOUNTS[account]), MASKS[mask], ace_type).with_flags(INHERITANCE[inh], PROPAGATION[prop])
}

fn to_declared((account, mask, deny, inh, prop): Spec, inherited: bool) -> DeclaredAce {
    DeclaredAce {
        identity: ACCOUNTS[account].to_string(),
        rights: rights::decode(MASKS[mask]),
        ace_type: if deny { "Deny" } else { "Allow" }.to_string(),
        inherited,
        inheritance: INHERITANCE[inh].label().to_string(),
        propagation: PROPAGATION[prop].label().to_string(),
    }
}

fn mode() -> impl Strategy<Value = PurgeMode> {
    prop::sample::select(vec![PurgeMode::Off, PurgeMode::Listed, PurgeMode::All])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Applying a plan and re-reading always yields compliance for the same declaration.
    #[test]
    fn prop_one_cycle_converges(
        current in prop::collection::vec(spec(), 0..6),
        desired in prop::collection::vec(spec(), 0..5),
        purge in mode(),
        owner in 0..ACCOUNTS.len(),
        inherit in prop::option::of(any::<bool>()),
    ) {
        let host = InMemoryHost::new();
        let explicit = current.iter().map(|s| to_ace(&host, *s)).collect();
        host.insert_key(KEY, "SYSTEM", explicit, vec![]);

        let config = DeclaredConfig {
            target: KEY.to_string(),
            owner: Some(ACCOUNTS[owner].to_string()),
            inherit_from_parent: inherit,
            permissions: desired.into_iter().map(|s| to_declared(s, false)).collect(),
            purge,
        };

        let reconciler = Reconciler::new(&host, &host, &host);
        reconciler.reconcile(&config).unwrap();
        let after = reconciler.plan(&config).unwrap();
        // Without a parent, re-enabling inheritance cannot bring anything in.
        if inherit != Some(true) {
            prop_assert!(after.is_compliant(), "still out of sync: {:?}", after.plan.operations);
        } else {
            prop_assert!(after.verdict.owner_in_sync && after.verdict.permissions_in_sync);
        }
    }

    /// Declared inherited entries belong to the parent: off and listed plans never remove
    /// anything on their account, however the explicit entries look.
    #[test]
    fn prop_declared_inherited_entries_never_remove(
        current in prop::collection::vec(spec(), 0..6),
        explicit in prop::collection::vec(spec(), 0..3),
        inherited in prop::collection::vec(spec(), 1..4),
        purge in prop::sample::select(vec![PurgeMode::Off, PurgeMode::Listed]),
    ) {
        let host = InMemoryHost::new();
        let existing: Vec<Ace> = current.iter().map(|s| to_ace(&host, *s)).collect();
        host.insert_key(KEY, "SYSTEM", existing, vec![]);

        let mut permissions: Vec<DeclaredAce> = explicit.iter().map(|s| to_declared(*s, false)).collect();
        permissions.extend(inherited.iter().map(|s| to_declared(*s, true)));
        let config = DeclaredConfig {
            target: KEY.to_string(),
            owner: None,
            inherit_from_parent: None,
            permissions,
            purge,
        };

        let outcome = Reconciler::new(&host, &host, &host).plan(&config).unwrap();
        let explicit_identities: Vec<_> = explicit.iter().map(|s| host.identity(ACCOUNTS[s.0])).collect();
        for op in &outcome.plan.operations {
            match op {
                MutationOp::RemoveNonInheritedAces(identity) => {
                    prop_assert!(explicit_identities.contains(identity), "removal driven by inherited entry: {}", op);
                }
                MutationOp::RemoveAccessRule(ace) | MutationOp::AddAccessRule(ace) => {
                    prop_assert!(!ace.inherited, "inherited entry targeted: {}", op);
                }
                _ => {}
            }
        }
    }
}
