//!
//! Permission codec for registry access masks.
//! Translates between the numeric `RightsMask` an ACE carries and the comma-joined
//! symbolic form a declaration uses (e.g. `"QueryValues, SetValue"` or `"FullControl"`).

use crate::error::{ReconcileError, Result};
use crate::types::RightsMask;

/// Named registry rights. Several entries are composites of other entries.
pub mod core {
    use super::RightsMask;

    pub const QUERY_VALUES: RightsMask = 0x0000_0001;
    pub const SET_VALUE: RightsMask = 0x0000_0002;
    pub const CREATE_SUB_KEY: RightsMask = 0x0000_0004;
    pub const ENUMERATE_SUB_KEYS: RightsMask = 0x0000_0008;
    pub const NOTIFY: RightsMask = 0x0000_0010;
    pub const CREATE_LINK: RightsMask = 0x0000_0020;
    pub const DELETE: RightsMask = 0x0001_0000;
    pub const READ_PERMISSIONS: RightsMask = 0x0002_0000;
    pub const CHANGE_PERMISSIONS: RightsMask = 0x0004_0000;
    pub const TAKE_OWNERSHIP: RightsMask = 0x0008_0000;

    /// ReadPermissions | QueryValues | EnumerateSubKeys | Notify.
    pub const READ_KEY: RightsMask = 0x0002_0019;
    /// ReadPermissions | SetValue | CreateSubKey.
    pub const WRITE_KEY: RightsMask = 0x0002_0006;
    /// Every specific and standard right above.
    pub const FULL_CONTROL: RightsMask = 0x000F_003F;

    pub const GENERIC_ALL: RightsMask = 0x1000_0000;
    pub const GENERIC_EXECUTE: RightsMask = 0x2000_0000;
    pub const GENERIC_WRITE: RightsMask = 0x4000_0000;
    pub const GENERIC_READ: RightsMask = 0x8000_0000;
}

/// The permission table in lookup priority order.
///
/// This is deliberately a slice and not a map: `decode` first looks for an entry whose
/// mask equals the input exactly, and only then falls back to collecting every entry
/// whose bits are all present.
pub const PERMISSIONS: &[(RightsMask, &str)] = &[
    (core::QUERY_VALUES, "QueryValues"),
    (core::SET_VALUE, "SetValue"),
    (core::CREATE_SUB_KEY, "CreateSubKey"),
    (core::ENUMERATE_SUB_KEYS, "EnumerateSubKeys"),
    (core::NOTIFY, "Notify"),
    (core::CREATE_LINK, "CreateLink"),
    (core::READ_KEY, "ReadKey"),
    (core::WRITE_KEY, "WriteKey"),
    (core::DELETE, "Delete"),
    (core::READ_PERMISSIONS, "ReadPermissions"),
    (core::CHANGE_PERMISSIONS, "ChangePermissions"),
    (core::TAKE_OWNERSHIP, "TakeOwnership"),
    (core::FULL_CONTROL, "FullControl"),
    (core::GENERIC_ALL, "GENERIC_ALL"),
    (core::GENERIC_WRITE, "GENERIC_WRITE"),
    (core::GENERIC_EXECUTE, "GENERIC_EXECUTE"),
    (core::GENERIC_READ, "GENERIC_READ"),
];

/// Union of every bit some table entry names.
pub const KNOWN_BITS: RightsMask = {
    let mut bits = 0;
    let mut i = 0;
    while i < PERMISSIONS.len() {
        bits |= PERMISSIONS[i].0;
        i += 1;
    }
    bits
};

/// Decodes a mask into its symbolic form.
///
/// An exact match on a table entry wins, so `0x20019` is `"ReadKey"` even though it also
/// contains ReadPermissions, QueryValues, EnumerateSubKeys and Notify. Any other mask is
/// decomposed into every entry it fully contains, sorted and joined with `", "`. Bits no
/// entry names are dropped; a mask with no named bits decodes to the empty string.
pub fn decode(mask: RightsMask) -> String {
    if let Some((_, label)) = PERMISSIONS.iter().find(|(m, _)| *m == mask) {
        return (*label).to_string();
    }

    let mut labels: Vec<&str> = PERMISSIONS
        .iter()
        .filter(|(m, _)| m & mask == *m)
        .map(|(_, label)| *label)
        .collect();
    labels.sort_unstable();
    labels.join(", ")
}

/// Encodes a comma-joined list of labels into a mask.
///
/// Every token must name a table entry exactly (surrounding whitespace is ignored).
/// `decode(encode(s)) == s` only holds for strings `decode` produced; hand-written lists
/// such as `"ReadKey, WriteKey"` encode fine but decode back to their bit union.
pub fn encode(symbolic: &str) -> Result<RightsMask> {
    symbolic.split(',').map(str::trim).try_fold(0, |acc, token| {
        PERMISSIONS
            .iter()
            .find(|(_, label)| *label == token)
            .map(|(m, _)| acc | m)
            .ok_or_else(|| ReconcileError::InvalidPermission(token.to_string()))
    })
}

/// Reduces a raw mask to the bits the codec can express, by way of its symbolic form.
///
/// Fails with `InvalidPermission` when no named bit is present, since such a mask has no
/// symbolic form to compare against.
pub fn normalise(mask: RightsMask) -> Result<RightsMask> {
    let symbolic = decode(mask);
    if symbolic.is_empty() {
        return Err(ReconcileError::InvalidPermission(format!("{:#x}", mask)));
    }
    encode(&symbolic)
}

/// Reinterprets a mask reported as a signed 32-bit integer (or its unsigned form).
pub fn from_raw(raw: i64) -> Result<RightsMask> {
    u32::try_from(raw)
        .or_else(|_| i32::try_from(raw).map(|signed| signed as u32))
        .map_err(|_| ReconcileError::InvalidPermission(raw.to_string()))
}
