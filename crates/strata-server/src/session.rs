use std::sync::Arc;

use strata_driver::{Driver, DriverError};
use strata_store::Store;

use crate::protocol::{Request, Response};

/// Per-connection dispatcher: one enumerated driver call per request.
pub struct Session<S: Store> {
    driver: Arc<Driver<S>>,
}

impl<S: Store> Session<S> {
    pub fn new(driver: Arc<Driver<S>>) -> Self {
        Self { driver }
    }

    pub fn handle(&self, request: Request) -> Response {
        match request {
            Request::Ping => Response::Ok,
            Request::TableExists { table } => {
                respond(self.driver.table_exists(&table).map(Response::Bool))
            }
            Request::CreateTable { table, families } => respond(
                self.driver
                    .create_table(&table, families)
                    .map(|()| Response::Ok),
            ),
            Request::DropTable { table } => {
                respond(self.driver.drop_table(&table).map(|()| Response::Ok))
            }
            Request::TruncateTable { table } => {
                respond(self.driver.truncate_table(&table).map(|()| Response::Ok))
            }
            Request::AddFamily { table, family } => {
                respond(self.driver.add_family(&table, family).map(|()| Response::Ok))
            }
            Request::RemoveFamily { table, family } => respond(
                self.driver
                    .remove_family(&table, &family)
                    .map(|()| Response::Ok),
            ),
            Request::ModifyFamily { table, family } => respond(
                self.driver
                    .modify_family(&table, family)
                    .map(|()| Response::Ok),
            ),
            Request::ListTables => respond(self.driver.list_tables().map(Response::Tables)),
            Request::Update {
                table,
                row_id,
                values,
                timestamp,
            } => respond(
                self.driver
                    .update(&table, &row_id, &values, timestamp)
                    .map(Response::RowId),
            ),
            Request::Delete { table, row_id } => {
                respond(self.driver.delete(&table, &row_id).map(|()| Response::Ok))
            }
            Request::Get {
                table,
                row_id,
                column,
                versions,
                timestamp,
            } => respond(
                self.driver
                    .get(&table, &row_id, &column, versions, timestamp)
                    .map(Response::Cells),
            ),
            Request::GetColumns {
                table,
                row_id,
                columns,
                timestamp,
            } => respond(
                self.driver
                    .get_columns(&table, &row_id, &columns, timestamp)
                    .map(Response::Columns),
            ),
            Request::Scan {
                table,
                start_row,
                stop_row,
                columns,
                limit,
            } => respond(
                self.driver
                    .scan(
                        &table,
                        start_row.as_deref(),
                        stop_row.as_deref(),
                        &columns,
                        limit,
                    )
                    .map(Response::Rows),
            ),
        }
    }
}

fn respond(result: Result<Response, DriverError>) -> Response {
    match result {
        Ok(response) => response,
        Err(e) => Response::Error(e.into()),
    }
}
