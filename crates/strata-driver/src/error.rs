use std::fmt;

use strata_model::InvalidAddress;
use strata_store::StoreError;

#[derive(Debug)]
pub enum DriverError {
    Store(StoreError),
    TableNotFound(String),
    TableAlreadyExists(String),
    FamilyNotFound { table: String, family: String },
    InvalidArgument(String),
    /// Table metadata record failed to (de)serialize.
    Meta(String),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Store(e) => write!(f, "store error: {e}"),
            DriverError::TableNotFound(name) => write!(f, "table not found: {name}"),
            DriverError::TableAlreadyExists(name) => {
                write!(f, "table already exists: {name}")
            }
            DriverError::FamilyNotFound { table, family } => {
                write!(f, "family not found: {table}/{family}")
            }
            DriverError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            DriverError::Meta(msg) => write!(f, "metadata error: {msg}"),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<StoreError> for DriverError {
    fn from(e: StoreError) -> Self {
        DriverError::Store(e)
    }
}

impl From<InvalidAddress> for DriverError {
    fn from(e: InvalidAddress) -> Self {
        DriverError::InvalidArgument(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for DriverError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        DriverError::Meta(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for DriverError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        DriverError::Meta(e.to_string())
    }
}
