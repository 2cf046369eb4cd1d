pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod layout;
pub mod mapper;
pub mod process;
pub mod store;

pub use error::{Error, Result};
pub use mapper::{map_all, map_rows, ColumnScheme, IndicatorSpec, SeriesRecord};
pub use process::{extract_rows, Row};
