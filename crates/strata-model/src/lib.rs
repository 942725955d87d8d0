mod column;
mod row;
mod schema;
mod timestamp;

pub use column::{ColumnAddress, InvalidAddress, ROW_ID_KEY};
pub use row::Row;
pub use schema::{Compression, FamilyDescriptor, TableSchema};
pub use timestamp::Timestamp;
