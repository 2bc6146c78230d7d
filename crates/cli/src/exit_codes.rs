//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `lmap` exit codes.
//! Exit codes are part of the shell contract; scripts branch on them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success                                             |
//! | 1    | General error (unreadable input data, storage)      |
//! | 2    | CLI usage error (bad arguments)                     |
//! | 3    | Invalid config or ops file                          |
//! | 4    | Apply finished with rejected operations             |
//! | 5    | Apply finished but the save hit the storage quota   |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unreadable data files, storage backend failures.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config or ops file failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// One or more apply operations were rejected; the rest were applied
/// and, unless --dry-run, saved.
pub const EXIT_CONFLICTS: u8 = 4;

/// Operations applied but the final save was rejected for quota even
/// after purging stale entries. The saved state is unchanged.
pub const EXIT_SAVE_DEGRADED: u8 = 5;
