//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | project          | Project/store codes                      |
//! | 10-19   | validate         | Field validation codes                   |
//! | 20-29   | fetch            | Remote sheet / vision API codes          |

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Project (3-9)
// =============================================================================

/// No project exists in the store.
pub const EXIT_NO_PROJECT: u8 = 3;

/// Store error (database unreachable or corrupt).
pub const EXIT_STORE: u8 = 4;

// =============================================================================
// Validate (10-19)
// =============================================================================

/// An edit was rejected by field validation.
pub const EXIT_VALIDATION: u8 = 10;

// =============================================================================
// Fetch (20-29)
// =============================================================================

/// Network/HTTP error fetching a remote sheet or calling the vision API.
pub const EXIT_NETWORK: u8 = 20;

/// Vision API configured without a usable key.
pub const EXIT_AI_MISSING_KEY: u8 = 21;
