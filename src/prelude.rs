//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use dotlog::prelude::*;
//!
//! #[derive(Record)]
//! struct Timeout {
//!     #[record(format = "{}ms")]
//!     after: u64,
//! }
//!
//! let timeout = Timeout { after: 250 };
//! assert_eq!(timeout.to_dotted_string("rpc").unwrap(), "rpc.after=250ms");
//! log_error!(&timeout, "request failed");
//! ```
//!
//! # What's Included
//!
//! - **[`Record`]** and **[`RecordExt`]**: declaring and rendering records
//! - **[`log_error!`]**: the logging macro
//! - **[`Logger`]**: configuring the pipeline

pub use crate::{Logger, Record, RecordExt, log_error};
