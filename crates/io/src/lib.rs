// Project I/O operations

pub mod autosave;
pub mod csv;
pub mod gsheet;
pub mod project;
pub mod store;

/// Store schema version.
/// Increment when the kv payload shapes change in a way old builds can't read.
pub const STORE_FORMAT_VERSION: u32 = 1;
