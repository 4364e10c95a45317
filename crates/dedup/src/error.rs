use std::fmt;

#[derive(Debug)]
pub enum DedupError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad separator, unknown required column, etc.).
    ConfigValidation(String),
    /// A people-table row does not have the schema's field count.
    RowShape { row: Vec<String>, expected: usize, found: usize },
    /// A membership refers to an organization outside the run's organization set.
    UnknownOrganization(String),
    /// An organization flag cell is not 0/1.
    FlagParse { row: usize, column: String, value: String },
    /// Missing required column in input data.
    MissingColumn { origin: String, column: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for DedupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::RowShape { row, expected, found } => {
                write!(f, "malformed row: expected {expected} fields, found {found}: {row:?}")
            }
            Self::UnknownOrganization(org) => write!(f, "unknown organization: {org}"),
            Self::FlagParse { row, column, value } => {
                write!(f, "row {row}, column '{column}': cannot parse membership flag '{value}'")
            }
            Self::MissingColumn { origin, column } => {
                write!(f, "{origin}: missing column '{column}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for DedupError {}
