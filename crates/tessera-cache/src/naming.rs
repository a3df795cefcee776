//! Instance and composite region naming.
//!
//! An instance is named `<kind>` or `<kind>.<manager>`; a region across all
//! instances is named `<instance>.<region>`. Decoding splits on the first
//! separator, so it only recovers the instance name of manager-less
//! instances. Code that needs both parts keeps them alongside the composite
//! key instead of decoding it (see [`crate::RegionKey`]).

use crate::ProviderKind;
use tessera_core::{TesseraError, TesseraResult};

/// Separator between name segments.
pub const SEPARATOR: char = '.';

/// Region name substituted for blank region names.
pub const EMPTY_REGION: &str = "EMPTY";

/// Builds the encoded instance name for a kind and manager.
///
/// A blank manager name yields the bare kind name.
#[must_use]
pub fn instance_name(kind: &ProviderKind, manager_name: &str) -> String {
    let manager_name = manager_name.trim();
    if manager_name.is_empty() {
        kind.name().to_string()
    } else {
        format!("{}{}{}", kind.name(), SEPARATOR, manager_name)
    }
}

/// Returns `region_name`, or [`EMPTY_REGION`] when it is blank.
#[must_use]
pub fn region_or_empty(region_name: &str) -> &str {
    if region_name.trim().is_empty() {
        EMPTY_REGION
    } else {
        region_name
    }
}

/// Builds the composite key of a region.
#[must_use]
pub fn encode(instance_name: &str, region_name: &str) -> String {
    format!("{}{}{}", instance_name, SEPARATOR, region_or_empty(region_name))
}

/// Splits a composite key on its first separator.
pub fn decode(composite_key: &str) -> TesseraResult<(&str, &str)> {
    composite_key
        .split_once(SEPARATOR)
        .ok_or_else(|| TesseraError::InvalidRegionKey(composite_key.to_string()))
}

/// Returns the part of a composite key before the first separator.
pub fn decode_instance_name(composite_key: &str) -> TesseraResult<&str> {
    decode(composite_key).map(|(instance, _)| instance)
}

/// Returns the part of a composite key after the first separator.
pub fn decode_region_name(composite_key: &str) -> TesseraResult<&str> {
    decode(composite_key).map(|(_, region)| region)
}
