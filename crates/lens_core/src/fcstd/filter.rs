//! Which registry records become scene nodes on their own.

use super::registry::{ObjectRecord, Registry};

/// True if `record` should be converted into its own scene node.
///
/// Assemblies are synthesized later from their children. Geometry that
/// other objects link to is only shown when an assembly claims it, so a
/// shape used as the base of a boolean isn't drawn twice.
pub fn eligible(record: &ObjectRecord, registry: &Registry) -> bool {
    if record.is_assembly() {
        return false;
    }
    if record.file.is_none() || !record.visible {
        return false;
    }
    if record.inbound_links > 0 {
        return registry
            .parent_of(record)
            .is_some_and(ObjectRecord::is_assembly);
    }
    true
}
