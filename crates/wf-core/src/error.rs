use thiserror::Error;

pub type WfResult<T> = Result<T, WfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Bracket does not contain a root: {what}")]
    NoBracket { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
