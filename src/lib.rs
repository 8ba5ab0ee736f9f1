#![deny(
    missing_docs,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Dotted-path `key=value` rendering of records, and a structured error
//! logger built on it.
//!
//! ## Overview
//!
//! Declare a record type once and get two things from the declaration:
//!
//! - a **stringifier** that renders the record as a single line of
//!   `path=value` tokens into a bounded buffer, such as
//!   `myline.start.x=10 myline.start.y=20 myline.label=MainLine`;
//! - a **key/value extractor** that turns the same record into an ordered
//!   list of owned pairs, which the **logging pipeline** combines with a
//!   message into lines such as `bad thing 7 x="1" y="2"`.
//!
//! ## Quick Example
//!
//! ```
//! use dotlog::{Record, RecordExt, log_error};
//!
//! #[derive(Record)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! #[derive(Record)]
//! struct Line {
//!     #[record(nested)]
//!     start: Point,
//!     #[record(nested)]
//!     end: Point,
//!     label: &'static str,
//! }
//!
//! let line = Line {
//!     start: Point { x: 10, y: 20 },
//!     end: Point { x: 30, y: 40 },
//!     label: "MainLine",
//! };
//!
//! let mut buf = [0u8; 128];
//! let written = line.render_into(&mut buf, "myline").unwrap();
//! assert_eq!(
//!     &buf[..written],
//!     b"myline.start.x=10 myline.start.y=20 myline.end.x=30 myline.end.y=40 myline.label=MainLine"
//! );
//!
//! dotlog::Logger::new().replace();
//! log_error!(&line.start, "bad thing {}", 7);
//! // stderr: bad thing 7 x="10" y="20"
//! ```
//!
//! ## Core Concepts
//!
//! A **record** is a named, ordered list of fields described by
//! [`FieldDescriptor`]s. A field is either a scalar, rendered with a Rust
//! format string such as `"{}"` or `"{:#x}"`, or another record, which is
//! spliced in place with its name appended to the dotted prefix. See
//! [`record`].
//!
//! The **stringifier** ([`render`]) writes into a caller-provided byte buffer,
//! keeps it NUL-terminated, and never leaves a partial field behind. An empty
//! buffer turns a call into a sizing pass. Each record type has exactly one
//! stringifier, its [`Record::render_to`], which a type may override.
//!
//! The **extractor** ([`kv`]) produces a [`KvList`] whose keys are the same
//! dotted paths the stringifier writes, and whose values are the same
//! rendered scalars.
//!
//! The **pipeline** ([`logger`]) renders the message of a
//! [`log_error!`] call, runs the extractor the macro picked for the record's
//! static type, formats the line with a [`LineFormatter`], and hands it to a
//! [`Sink`].
//!
//! ## Ecosystem
//!
//! - **[`dotlog-tracing`]** - a [`Sink`] forwarding lines to `tracing`.
//!
//! [`dotlog-tracing`]: https://docs.rs/dotlog-tracing
//!
//! ## Features
//!
//! - `derive` (default): `#[derive(Record)]`.
//! - `json`: the `formatter::Json` line formatter.

extern crate self as dotlog;

#[macro_use]
mod macros;

pub mod formatter;
pub mod kv;
pub mod logger;
pub mod prelude;
pub mod record;
pub mod render;
pub mod sink;

mod record_ext;

/// Derives [`Record`](trait@Record) for a struct with named fields.
///
/// Field attributes:
///
/// - `#[record(format = "...")]` renders a scalar with the given format string
///   instead of `"{}"`.
/// - `#[record(nested)]` marks a field holding another record.
/// - `#[record(rename = "...")]` uses a different key segment.
/// - `#[record(skip)]` leaves the field out.
///
/// Container attributes:
///
/// - `#[record(name = "...")]` overrides [`Record::NAME`].
/// - `#[record(render_with = "path")]` replaces the generated stringifier
///   with `fn(&Self, &mut Renderer<'_>) -> Result<(), RenderError>`.
///
/// # Examples
///
/// ```
/// use dotlog::{Record, RecordExt};
///
/// #[derive(Record)]
/// struct Reading {
///     #[record(format = "{:.2}")]
///     celsius: f64,
///     #[record(format = "{:#x}", rename = "status")]
///     code: u32,
///     #[record(skip)]
///     _raw: Vec<u8>,
/// }
///
/// let reading = Reading { celsius: 21.4, code: 255, _raw: Vec::new() };
/// assert_eq!(reading.to_dotted_string("").unwrap(), "celsius=21.40 status=0xff");
/// ```
#[cfg(feature = "derive")]
#[cfg_attr(docsrs, doc(cfg(feature = "derive")))]
pub use dotlog_derive::Record;

pub use self::{
    formatter::{LineFormatter, Logfmt},
    kv::{KeyValuePair, KvList},
    logger::{Details, Event, Logger, LoggerAlreadyInstalledError, init},
    record::{FieldDescriptor, FieldKind, FieldVisitor, Record},
    record_ext::RecordExt,
    render::{Dotted, RenderError, Renderer},
    sink::{OutputStream, Sink, StreamSink},
};

// Not public API. Referenced by macro-generated code.
#[doc(hidden)]
pub mod __private {
    #[doc(hidden)]
    pub use core::format_args;

    #[doc(hidden)]
    pub use crate::logger::Event;

    #[doc(hidden)]
    #[inline]
    pub fn log_global(event: Event<'_>) {
        crate::logger::log_global(event);
    }

    /// Compile-time selection of the extractor for a record argument.
    ///
    /// `(&&Wrap(&value)).details()` resolves to [`RecordKind`] when the
    /// referenced type implements [`Record`](crate::Record) and to
    /// [`UnknownKind`] otherwise, since method lookup tries the receiver
    /// with more references first.
    #[doc(hidden)]
    pub mod kind {
        use crate::{logger::Details, record::Record};

        #[doc(hidden)]
        pub struct Wrap<'a, T: ?Sized>(pub &'a T);

        #[doc(hidden)]
        pub trait RecordKind {
            fn details(&self) -> Details;
        }

        impl<R> RecordKind for &Wrap<'_, &R>
        where
            R: Record + ?Sized,
        {
            #[inline(always)]
            fn details(&self) -> Details {
                Details::of_record(Some(*self.0))
            }
        }

        impl<R> RecordKind for &Wrap<'_, Option<&R>>
        where
            R: Record + ?Sized,
        {
            #[inline(always)]
            fn details(&self) -> Details {
                Details::of_record(*self.0)
            }
        }

        #[doc(hidden)]
        pub trait UnknownKind {
            fn details(&self) -> Details;
        }

        impl<T> UnknownKind for Wrap<'_, &T>
        where
            T: ?Sized,
        {
            #[inline(always)]
            fn details(&self) -> Details {
                Details::of_unknown(Some(*self.0))
            }
        }

        impl<T> UnknownKind for Wrap<'_, Option<&T>>
        where
            T: ?Sized,
        {
            #[inline(always)]
            fn details(&self) -> Details {
                Details::of_unknown(*self.0)
            }
        }
    }
}
