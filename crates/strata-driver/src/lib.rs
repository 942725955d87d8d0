mod catalog;
mod driver;
mod encoding;
mod error;

pub use driver::Driver;
pub use error::DriverError;
