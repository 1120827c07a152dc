//! RusTs Core - point model shared by the RusTs write tools
//!
//! - `Timestamp`: Nanosecond-precision Unix epoch timestamps
//! - `Tag`: Key-value pair for series identification
//! - `FieldValue` / `Field`: Typed, named measurement values
//! - `Point`: A single data point with timestamp, tags, and fields
//! - `line_protocol`: InfluxDB line protocol encoding for points

pub mod error;
pub mod line_protocol;
pub mod types;

pub use error::{CoreError, Result};
pub use line_protocol::{encode_point, encode_points};
pub use types::*;
