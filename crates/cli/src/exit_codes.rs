//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                                   |
//! |------|-----------------------------------------------------------|
//! | 0    | Success                                                   |
//! | 1    | General error (unspecified)                               |
//! | 2    | CLI usage error (bad args)                                |
//! | 3    | File could not be read or written                         |
//! | 4    | Config file could not be parsed or failed validation      |
//! | 5    | Data does not fit the people-table schema                 |

use rollcall_dedup::DedupError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// IO error - missing roster, unwritable output directory, bad JSON artifact.
pub const EXIT_IO: u8 = 3;

/// Config error - TOML syntax, unknown key, or a value rejected by validation.
pub const EXIT_CONFIG: u8 = 4;

/// Schema error - a row with the wrong field count, a non-0/1 membership flag,
/// a missing schema column, or a membership in an unknown organization.
pub const EXIT_SCHEMA: u8 = 5;

/// Map an engine error to its exit code.
pub fn dedup_exit_code(err: &DedupError) -> u8 {
    match err {
        DedupError::ConfigParse(_) | DedupError::ConfigValidation(_) => EXIT_CONFIG,
        DedupError::RowShape { .. }
        | DedupError::FlagParse { .. }
        | DedupError::MissingColumn { .. }
        | DedupError::UnknownOrganization(_) => EXIT_SCHEMA,
        DedupError::Io(_) => EXIT_IO,
    }
}
