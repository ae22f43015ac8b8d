//!
//! Inheritance and propagation flag codecs.
//!
//! Unlike the rights mask these are closed enumerations: value 3 in either table is a
//! composite with its own comma-joined label, and any value outside the table is an
//! error rather than something to decompose.

use crate::error::{ReconcileError, Result};
use std::fmt;

/// How an ACE is passed down to child objects.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum InheritanceFlags {
    #[default]
    None = 0,
    ContainerInherit = 1,
    ContainerAndObjectInherit = 3,
}

/// How an inheritable ACE propagates once it reaches a child.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum PropagationFlags {
    #[default]
    None = 0,
    InheritOnly = 2,
    NoPropagateInheritOnly = 3,
}

const INHERITANCE: &[(InheritanceFlags, &str)] = &[
    (InheritanceFlags::None, "None"),
    (InheritanceFlags::ContainerInherit, "ContainerInherit"),
    (InheritanceFlags::ContainerAndObjectInherit, "ContainerInherit, ObjectInherit"),
];

const PROPAGATION: &[(PropagationFlags, &str)] = &[
    (PropagationFlags::None, "None"),
    (PropagationFlags::InheritOnly, "InheritOnly"),
    (PropagationFlags::NoPropagateInheritOnly, "NoPropagateInherit, InheritOnly"),
];

/// Collapses whitespace around commas so `"A,B"` and `"A, B"` look the same.
fn canonical_label(label: &str) -> String {
    label.split(',').map(str::trim).collect::<Vec<_>>().join(", ")
}

macro_rules! flag_codec {
    ($ty:ty, $table:expr, $kind:literal) => {
        impl $ty {
            pub fn bits(self) -> u8 {
                self as u8
            }

            pub fn label(self) -> &'static str {
                $table
                    .iter()
                    .find(|(flag, _)| *flag == self)
                    .map(|(_, label)| *label)
                    .unwrap_or("None")
            }

            /// Decodes the numeric value a host reports.
            pub fn decode(value: i64) -> Result<Self> {
                $table
                    .iter()
                    .find(|(flag, _)| i64::from(flag.bits()) == value)
                    .map(|(flag, _)| *flag)
                    .ok_or_else(|| ReconcileError::InvalidFlag { kind: $kind, value: value.to_string() })
            }

            /// Encodes a declared label.
            pub fn encode(label: &str) -> Result<Self> {
                let wanted = canonical_label(label);
                $table
                    .iter()
                    .find(|(_, known)| *known == wanted)
                    .map(|(flag, _)| *flag)
                    .ok_or_else(|| ReconcileError::InvalidFlag { kind: $kind, value: label.to_string() })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

flag_codec!(InheritanceFlags, INHERITANCE, "InheritanceFlags");
flag_codec!(PropagationFlags, PROPAGATION, "PropagationFlags");
