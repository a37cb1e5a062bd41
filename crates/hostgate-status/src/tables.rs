//! redb table definitions for the host-status registry.

use redb::TableDefinition;

/// Host status records keyed by `{tenant}:{application}/{host}`.
pub const HOST_STATUS: TableDefinition<&str, &[u8]> = TableDefinition::new("host_status");
