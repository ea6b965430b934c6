//! redb table definitions for the report store.

use redb::TableDefinition;

/// Raw report bytes keyed by report name (e.g. `status-1718000000`).
pub const REPORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");
