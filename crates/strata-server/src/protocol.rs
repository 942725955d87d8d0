use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use strata_driver::DriverError;
use strata_model::{FamilyDescriptor, Row, Timestamp};

/// One variant per driver operation, plus `Ping` for operator liveness
/// probes. Frames are a 4-byte big-endian length followed by the msgpack
/// body, in both directions.
#[derive(Debug, Serialize, Deserialize)]
pub enum Request {
    Ping,
    TableExists {
        table: String,
    },
    CreateTable {
        table: String,
        families: Vec<FamilyDescriptor>,
    },
    DropTable {
        table: String,
    },
    TruncateTable {
        table: String,
    },
    AddFamily {
        table: String,
        family: FamilyDescriptor,
    },
    RemoveFamily {
        table: String,
        family: String,
    },
    ModifyFamily {
        table: String,
        family: FamilyDescriptor,
    },
    ListTables,
    Update {
        table: String,
        row_id: String,
        values: Vec<(String, Vec<u8>)>,
        timestamp: Option<Timestamp>,
    },
    Delete {
        table: String,
        row_id: String,
    },
    Get {
        table: String,
        row_id: String,
        column: String,
        versions: u32,
        timestamp: Option<Timestamp>,
    },
    GetColumns {
        table: String,
        row_id: String,
        columns: Vec<String>,
        timestamp: Option<Timestamp>,
    },
    Scan {
        table: String,
        start_row: Option<String>,
        stop_row: Option<String>,
        columns: Vec<String>,
        limit: Option<u64>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Bool(bool),
    RowId(String),
    Cells(Vec<Vec<u8>>),
    Columns(Option<HashMap<String, Vec<u8>>>),
    Rows(Vec<Row>),
    Tables(Vec<String>),
    Error(RemoteError),
}

/// Driver failures in wire form. The client rehydrates these into its own
/// error type, so precondition violations stay typed across the process
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteError {
    TableNotFound(String),
    TableAlreadyExists(String),
    FamilyNotFound { table: String, family: String },
    InvalidArgument(String),
    NoSuchOperation(String),
    Backend(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::TableNotFound(name) => write!(f, "table not found: {name}"),
            RemoteError::TableAlreadyExists(name) => {
                write!(f, "table already exists: {name}")
            }
            RemoteError::FamilyNotFound { table, family } => {
                write!(f, "family not found: {table}/{family}")
            }
            RemoteError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            RemoteError::NoSuchOperation(msg) => write!(f, "no such operation: {msg}"),
            RemoteError::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<DriverError> for RemoteError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::TableNotFound(name) => RemoteError::TableNotFound(name),
            DriverError::TableAlreadyExists(name) => RemoteError::TableAlreadyExists(name),
            DriverError::FamilyNotFound { table, family } => {
                RemoteError::FamilyNotFound { table, family }
            }
            DriverError::InvalidArgument(msg) => RemoteError::InvalidArgument(msg),
            DriverError::Store(e) => RemoteError::Backend(e.to_string()),
            DriverError::Meta(msg) => RemoteError::Backend(msg),
        }
    }
}
