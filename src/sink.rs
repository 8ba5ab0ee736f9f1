//! Sinks: where finished lines go.
//!
//! A [`Sink`] receives every formatted line together with the logger's
//! [`OutputStream`]. The default [`StreamSink`] writes the line and a newline
//! to that stream and flushes it. Other sinks are free to ignore the stream,
//! e.g. to capture lines in tests or to forward them to another logging
//! system.
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//!
//! use dotlog::sink::{OutputStream, Sink};
//!
//! let captured = Arc::new(Mutex::new(Vec::new()));
//! let sink = {
//!     let captured = Arc::clone(&captured);
//!     move |line: &str, _stream: &OutputStream| captured.lock().unwrap().push(line.to_owned())
//! };
//!
//! sink.write_line("hello", &OutputStream::Stderr);
//! assert_eq!(*captured.lock().unwrap(), ["hello"]);
//! ```

use std::{
    fmt,
    io::{self, Write},
    sync::{Arc, Mutex, PoisonError},
};

/// A writer shared between the logger and its owner.
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

/// The stream a logger writes to.
///
/// Besides carrying finished lines to [`StreamSink`], the stream receives the
/// pipeline's own diagnostics (uninitialized logger, failed formatter).
#[derive(Clone, Default)]
pub enum OutputStream {
    /// The process's standard error.
    #[default]
    Stderr,
    /// The process's standard output.
    Stdout,
    /// Any other writer, e.g. a file or an in-memory buffer.
    Writer(SharedWriter),
}

impl OutputStream {
    /// Wraps `writer` in a new shared stream.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotlog::sink::OutputStream;
    ///
    /// let stream = OutputStream::writer(Vec::<u8>::new());
    /// stream.write_line("hello").unwrap();
    /// ```
    pub fn writer<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self::Writer(Arc::new(Mutex::new(writer)))
    }

    /// Writes `line`, a newline, and flushes.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        self.with_writer(|writer| {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            writer.flush()
        })
    }

    /// Writes pre-formatted arguments, a newline, and flushes.
    pub(crate) fn write_fmt_line(&self, args: fmt::Arguments<'_>) -> io::Result<()> {
        self.with_writer(|writer| {
            writer.write_fmt(args)?;
            writer.write_all(b"\n")?;
            writer.flush()
        })
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        match self {
            Self::Stderr => f(&mut io::stderr().lock()),
            Self::Stdout => f(&mut io::stdout().lock()),
            Self::Writer(writer) => {
                let mut guard = writer.lock().unwrap_or_else(PoisonError::into_inner);
                f(&mut *guard)
            }
        }
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stderr => f.write_str("Stderr"),
            Self::Stdout => f.write_str("Stdout"),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Writes a finished line somewhere.
///
/// Delivery is best effort: sinks have no way to report failure to the
/// caller of the pipeline.
pub trait Sink: 'static + Send + Sync {
    /// Delivers `line`, which carries no trailing newline.
    fn write_line(&self, line: &str, stream: &OutputStream);
}

impl<F> Sink for F
where
    F: Fn(&str, &OutputStream) + 'static + Send + Sync,
{
    fn write_line(&self, line: &str, stream: &OutputStream) {
        self(line, stream);
    }
}

/// The default sink: writes each line plus a newline to the stream and
/// flushes it.
#[derive(Copy, Clone, Debug, Default)]
pub struct StreamSink;

impl Sink for StreamSink {
    fn write_line(&self, line: &str, stream: &OutputStream) {
        if let Err(error) = stream.write_line(line) {
            tracing::debug!(target: "dotlog", %error, ?stream, "sink could not write line");
        }
    }
}
