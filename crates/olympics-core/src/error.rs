use thiserror::Error;

/// Errors raised while interpreting values returned by the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Value `{value}` is not numeric")]
    NotNumeric { value: String },

    #[error("Athlete name must not be empty")]
    EmptyName,
}

pub type Result<T> = std::result::Result<T, CoreError>;
