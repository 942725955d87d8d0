use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use strata_model::{FamilyDescriptor, Row, Timestamp};
use strata_server::protocol::{RemoteError, Request, Response};

/// Backend error fragments that indicate a lost connection rather than a
/// real driver failure. Only these make a remote error worth a retry.
const LOST_CONNECTION_PATTERNS: &[&str] = &[
    "connection reset",
    "connection refused",
    "broken pipe",
    "connection closed",
    "timed out",
];

#[derive(Debug)]
pub enum ClientError {
    /// The remote endpoint cannot be reached or the session is gone.
    Connection { addr: String, message: String },
    Io(std::io::Error),
    Serialization(String),
    Remote(RemoteError),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Connection { addr, message } => {
                write!(f, "cannot reach {addr}: {message}")
            }
            ClientError::Io(e) => write!(f, "io error: {e}"),
            ClientError::Serialization(msg) => write!(f, "serialization error: {msg}"),
            ClientError::Remote(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::Io(e)
    }
}

impl From<rmp_serde::encode::Error> for ClientError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for ClientError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}

impl From<RemoteError> for ClientError {
    fn from(e: RemoteError) -> Self {
        ClientError::Remote(e)
    }
}

impl ClientError {
    /// Failures worth one reconnect-and-retry: transport-level errors, plus
    /// remote backend errors matching a known lost-connection pattern.
    /// Precondition and argument errors never qualify.
    pub fn is_lost_connection(&self) -> bool {
        match self {
            ClientError::Connection { .. } | ClientError::Io(_) => true,
            ClientError::Remote(RemoteError::Backend(msg)) => {
                let msg = msg.to_ascii_lowercase();
                LOST_CONNECTION_PATTERNS.iter().any(|p| msg.contains(p))
            }
            _ => false,
        }
    }
}

/// Connection settings for one endpoint.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub connect_timeout: Duration,
    /// Applied to every socket read and write. A timed-out call leaves the
    /// connection suspect; the facade reconnects rather than reusing it.
    pub call_timeout: Option<Duration>,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            call_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Blocking wire client: one TCP connection, length-prefixed msgpack frames,
/// one typed method per remote operation. No internal retries; recovery
/// lives in the `Adapter`.
#[derive(Debug)]
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    pub fn connect(addr: &str, config: &ConnectConfig) -> Result<Self, ClientError> {
        let sockets = addr.to_socket_addrs().map_err(|e| ClientError::Connection {
            addr: addr.to_string(),
            message: e.to_string(),
        })?;

        let mut stream = None;
        let mut last_err = None;
        for socket in sockets {
            match TcpStream::connect_timeout(&socket, config.connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = stream.ok_or_else(|| ClientError::Connection {
            addr: addr.to_string(),
            message: last_err
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no addresses resolved".to_string()),
        })?;

        stream.set_read_timeout(config.call_timeout)?;
        stream.set_write_timeout(config.call_timeout)?;

        let reader = BufReader::new(stream.try_clone()?);
        let writer = BufWriter::new(stream);
        Ok(Self { reader, writer })
    }

    fn request(&mut self, request: Request) -> Result<Response, ClientError> {
        let bytes = rmp_serde::to_vec(&request)?;
        let len = (bytes.len() as u32).to_be_bytes();
        self.writer.write_all(&len)?;
        self.writer.write_all(&bytes)?;
        self.writer.flush()?;

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf)?;
        let len = u32::from_be_bytes(len_buf) as usize;

        let mut msg_buf = vec![0u8; len];
        self.reader.read_exact(&mut msg_buf)?;

        let response: Response = rmp_serde::from_slice(&msg_buf)?;
        Ok(response)
    }

    fn expect_ok(&mut self, request: Request) -> Result<(), ClientError> {
        match self.request(request)? {
            Response::Ok => Ok(()),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    pub fn ping(&mut self) -> Result<(), ClientError> {
        self.expect_ok(Request::Ping)
    }

    // ── Schema operations ───────────────────────────────────────

    pub fn table_exists(&mut self, table: &str) -> Result<bool, ClientError> {
        match self.request(Request::TableExists {
            table: table.to_string(),
        })? {
            Response::Bool(b) => Ok(b),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    pub fn create_table(
        &mut self,
        table: &str,
        families: &[FamilyDescriptor],
    ) -> Result<(), ClientError> {
        self.expect_ok(Request::CreateTable {
            table: table.to_string(),
            families: families.to_vec(),
        })
    }

    pub fn drop_table(&mut self, table: &str) -> Result<(), ClientError> {
        self.expect_ok(Request::DropTable {
            table: table.to_string(),
        })
    }

    pub fn truncate_table(&mut self, table: &str) -> Result<(), ClientError> {
        self.expect_ok(Request::TruncateTable {
            table: table.to_string(),
        })
    }

    pub fn add_family(&mut self, table: &str, family: &FamilyDescriptor) -> Result<(), ClientError> {
        self.expect_ok(Request::AddFamily {
            table: table.to_string(),
            family: family.clone(),
        })
    }

    pub fn remove_family(&mut self, table: &str, family: &str) -> Result<(), ClientError> {
        self.expect_ok(Request::RemoveFamily {
            table: table.to_string(),
            family: family.to_string(),
        })
    }

    pub fn modify_family(
        &mut self,
        table: &str,
        family: &FamilyDescriptor,
    ) -> Result<(), ClientError> {
        self.expect_ok(Request::ModifyFamily {
            table: table.to_string(),
            family: family.clone(),
        })
    }

    pub fn list_tables(&mut self) -> Result<Vec<String>, ClientError> {
        match self.request(Request::ListTables)? {
            Response::Tables(t) => Ok(t),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    // ── Point operations ────────────────────────────────────────

    pub fn update(
        &mut self,
        table: &str,
        row_id: &str,
        values: &[(String, Vec<u8>)],
        timestamp: Option<Timestamp>,
    ) -> Result<String, ClientError> {
        match self.request(Request::Update {
            table: table.to_string(),
            row_id: row_id.to_string(),
            values: values.to_vec(),
            timestamp,
        })? {
            Response::RowId(id) => Ok(id),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    pub fn delete(&mut self, table: &str, row_id: &str) -> Result<(), ClientError> {
        self.expect_ok(Request::Delete {
            table: table.to_string(),
            row_id: row_id.to_string(),
        })
    }

    pub fn get(
        &mut self,
        table: &str,
        row_id: &str,
        column: &str,
        versions: u32,
        timestamp: Option<Timestamp>,
    ) -> Result<Vec<Vec<u8>>, ClientError> {
        match self.request(Request::Get {
            table: table.to_string(),
            row_id: row_id.to_string(),
            column: column.to_string(),
            versions,
            timestamp,
        })? {
            Response::Cells(cells) => Ok(cells),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    pub fn get_columns(
        &mut self,
        table: &str,
        row_id: &str,
        columns: &[String],
        timestamp: Option<Timestamp>,
    ) -> Result<Option<HashMap<String, Vec<u8>>>, ClientError> {
        match self.request(Request::GetColumns {
            table: table.to_string(),
            row_id: row_id.to_string(),
            columns: columns.to_vec(),
            timestamp,
        })? {
            Response::Columns(columns) => Ok(columns),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    // ── Scans ───────────────────────────────────────────────────

    pub fn scan(
        &mut self,
        table: &str,
        start_row: Option<&str>,
        stop_row: Option<&str>,
        columns: &[String],
        limit: Option<u64>,
    ) -> Result<Vec<Row>, ClientError> {
        match self.request(Request::Scan {
            table: table.to_string(),
            start_row: start_row.map(|s| s.to_string()),
            stop_row: stop_row.map(|s| s.to_string()),
            columns: columns.to_vec(),
            limit,
        })? {
            Response::Rows(rows) => Ok(rows),
            Response::Error(e) => Err(e.into()),
            other => Err(ClientError::Serialization(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }
}
