use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HacError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine rejected command `{command}`: {reason}")]
    Command { command: String, reason: String },

    #[error("engine input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("engine has been closed")]
    Closed,

    #[error("atom buffer `{buffer}` has {len} entries, expected {expected}")]
    BufferLength {
        buffer: &'static str,
        len: usize,
        expected: usize,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error("buffer averaging: {0}")]
    Averaging(String),

    #[error("buffer width {width} leaves no room between the slabs of a box {length} long")]
    OverlappingBuffers { width: f64, length: f64 },

    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum HacError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("atom id {id} is out of range for {natoms} local atoms")]
    AtomIdOutOfRange { id: usize, natoms: usize },

    #[error("field shape mismatch: expected {expected:?}, found {found:?}")]
    FieldShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("cannot reduce an empty set of field blocks")]
    EmptyReduction,

    #[error("failed to parse {what} at line {line}: {message}")]
    Parse {
        what: &'static str,
        line: usize,
        message: String,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HacError {
    pub(crate) fn parse(what: &'static str, line: usize, message: impl Into<String>) -> Self {
        HacError::Parse {
            what,
            line,
            message: message.into(),
        }
    }
}
