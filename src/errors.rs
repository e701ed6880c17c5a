use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodeDepsError {
    #[error("schema error: {0}")]
    SchemaError(String),
    #[error("query error: {0}")]
    QueryError(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl CodeDepsError {
    pub fn schema<T: Into<String>>(msg: T) -> Self {
        CodeDepsError::SchemaError(msg.into())
    }

    pub fn query<T: Into<String>>(msg: T) -> Self {
        CodeDepsError::QueryError(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        CodeDepsError::InvalidInput(msg.into())
    }
}
