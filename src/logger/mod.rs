//! The structured error logging pipeline.
//!
//! A [`Logger`] owns three pieces: a [`LineFormatter`] that combines the
//! message with the record's key/value pairs, a [`Sink`] that delivers the
//! finished line, and the [`OutputStream`] used by the default sink and by the
//! pipeline's own diagnostics.
//!
//! # Quick Start
//!
//! ```rust
//! use dotlog::{Record, log_error};
//!
//! #[derive(Record)]
//! struct FileError {
//!     path: &'static str,
//!     code: i32,
//! }
//!
//! // Logfmt lines on standard error
//! dotlog::Logger::new().replace();
//!
//! let error = FileError { path: "/etc/app.conf", code: 2 };
//! log_error!(&error, "could not open config after {} attempts", 3);
//! // could not open config after 3 attempts path="/etc/app.conf" code="2"
//! ```
//!
//! # Pipeline
//!
//! For every call:
//!
//! 1. The message is rendered into a fixed buffer of 1024 bytes. Longer
//!    messages are cut and end in `...(msg_truncated)`.
//! 2. Without a formatter or a sink the pipeline writes
//!    `[dotlog critical] logging system not initialized; message: <message>`
//!    to the stream and stops.
//! 3. The formatter combines the message with the extracted pairs. If it
//!    fails, the raw message is written to the stream with a warning.
//! 4. The sink delivers the line.
//!
//! Logging never panics and never reports an error to the caller.
//!
//! # Global and Injected Loggers
//!
//! [`log_error!`](crate::log_error) uses the logger installed with
//! [`Logger::install`], [`Logger::replace`] or [`init`]. The same macro
//! accepts an explicit logger with `logger = ...`, which is the way to test
//! code without touching global state:
//!
//! ```rust
//! use dotlog::{Logger, log_error, sink::OutputStream};
//!
//! let logger = Logger::new().stream(OutputStream::writer(Vec::<u8>::new()));
//! log_error!(logger = logger, "retrying in {}s", 5);
//! ```

mod message;
mod slot;

use core::{fmt, ptr};
use std::sync::Arc;

use self::{message::MessageBuffer, slot::LoggerSlot};
use crate::{
    formatter::{LineFormatter, Logfmt},
    kv::{self, KvList},
    record::Record,
    sink::{OutputStream, Sink, StreamSink},
};

static LOGGER: LoggerSlot = LoggerSlot::new();

/// Used when no logger has been installed.
static FALLBACK: Logger = Logger::unconfigured();

/// The structured details accompanying one log call.
///
/// Produced by the type dispatcher inside
/// [`log_error!`](crate::log_error): records get their key/value pairs
/// extracted, values of any other type get the single `unknown_error_type`
/// pair.
pub struct Details {
    pairs: Option<KvList>,
    address: Option<*const ()>,
}

impl Details {
    /// Details for a call without a record.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            pairs: None,
            address: None,
        }
    }

    /// Extracts the pairs of `record`.
    #[must_use]
    pub fn of_record<R>(record: Option<&R>) -> Self
    where
        R: Record + ?Sized,
    {
        Self {
            pairs: kv::extract(record),
            address: record.map(|record| ptr::from_ref(record).cast()),
        }
    }

    /// Describes a value whose type has no record declaration.
    #[must_use]
    pub fn of_unknown<T>(value: Option<&T>) -> Self
    where
        T: ?Sized,
    {
        Self {
            pairs: kv::extract_unknown(value),
            address: value.map(|value| ptr::from_ref(value).cast()),
        }
    }

    /// The extracted pairs, if any.
    #[must_use]
    pub fn pairs(&self) -> Option<&KvList> {
        self.pairs.as_ref()
    }

    /// Returns `true` if a record or other value was given.
    #[must_use]
    pub fn has_record(&self) -> bool {
        self.address.is_some()
    }
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Details")
            .field("pairs", &self.pairs)
            .field("address", &self.address)
            .finish()
    }
}

/// One call into the pipeline.
#[derive(Debug)]
pub struct Event<'a> {
    details: Details,
    message: fmt::Arguments<'a>,
    format: &'static str,
}

impl<'a> Event<'a> {
    /// Creates an event without details.
    ///
    /// `format` is the raw format string of `message`; it is reported in
    /// place of the message if one of the arguments fails to format.
    #[must_use]
    pub fn new(message: fmt::Arguments<'a>, format: &'static str) -> Self {
        Self {
            details: Details::none(),
            message,
            format,
        }
    }

    /// Attaches structured details.
    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = details;
        self
    }
}

/// A formatter, a sink and an output stream.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
///
/// use dotlog::{Logger, Record, log_error, sink::OutputStream};
///
/// #[derive(Record)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let lines = Arc::new(Mutex::new(Vec::new()));
/// let logger = Logger::new().sink({
///     let lines = Arc::clone(&lines);
///     move |line: &str, _: &OutputStream| lines.lock().unwrap().push(line.to_owned())
/// });
///
/// log_error!(logger = logger, &Point { x: 1, y: 2 }, "bad thing {}", 7);
/// assert_eq!(*lines.lock().unwrap(), [r#"bad thing 7 x="1" y="2""#]);
/// ```
pub struct Logger {
    formatter: Option<Box<dyn LineFormatter>>,
    sink: Option<Box<dyn Sink>>,
    stream: OutputStream,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("formatter", &self.formatter.is_some())
            .field("sink", &self.sink.is_some())
            .field("stream", &self.stream)
            .finish()
    }
}

/// Error returned when installing a logger while another one is installed.
///
/// Contains the logger that was rejected.
#[derive(thiserror::Error)]
#[error("a logger is already installed globally")]
pub struct LoggerAlreadyInstalledError(pub Logger);

impl fmt::Debug for LoggerAlreadyInstalledError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerAlreadyInstalledError").finish()
    }
}

impl Logger {
    /// Creates a logger writing [`Logfmt`] lines to standard error.
    #[must_use]
    pub fn new() -> Self {
        Self {
            formatter: Some(Box::new(Logfmt)),
            sink: Some(Box::new(StreamSink)),
            stream: OutputStream::Stderr,
        }
    }

    /// Creates a logger with neither formatter nor sink.
    ///
    /// Every call through it writes the "not initialized" diagnostic.
    #[must_use]
    pub const fn unconfigured() -> Self {
        Self {
            formatter: None,
            sink: None,
            stream: OutputStream::Stderr,
        }
    }

    /// Sets the line formatter.
    #[must_use]
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: LineFormatter,
    {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// Sets the sink.
    #[must_use]
    pub fn sink<S>(mut self, sink: S) -> Self
    where
        S: Sink,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Sets the output stream.
    #[must_use]
    pub fn stream(mut self, stream: OutputStream) -> Self {
        self.stream = stream;
        self
    }

    /// Removes the formatter, leaving the logger uninitialized.
    #[must_use]
    pub fn without_formatter(mut self) -> Self {
        self.formatter = None;
        self
    }

    /// Removes the sink, leaving the logger uninitialized.
    #[must_use]
    pub fn without_sink(mut self) -> Self {
        self.sink = None;
        self
    }

    /// Returns `true` if both a formatter and a sink are set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.formatter.is_some() && self.sink.is_some()
    }

    /// The stream lines and diagnostics are written to.
    #[must_use]
    pub fn output_stream(&self) -> &OutputStream {
        &self.stream
    }

    /// Installs the logger globally.
    ///
    /// If a logger is already installed, returns an error
    /// [`LoggerAlreadyInstalledError`] containing this logger.
    ///
    /// See also [`replace`](Self::replace), which never fails.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotlog::Logger;
    ///
    /// # Logger::uninstall();
    /// Logger::new().install().expect("no logger installed yet");
    /// assert!(Logger::new().install().is_err());
    /// # Logger::uninstall();
    /// ```
    pub fn install(self) -> Result<(), LoggerAlreadyInstalledError> {
        let configured = self.is_configured();
        LOGGER.install(self).map_err(LoggerAlreadyInstalledError)?;
        tracing::debug!(target: "dotlog", configured, "installed global logger");
        Ok(())
    }

    /// Installs the logger globally, returning the one it replaces.
    pub fn replace(self) -> Option<Arc<Logger>> {
        let configured = self.is_configured();
        let previous = LOGGER.replace(self);
        tracing::debug!(
            target: "dotlog",
            configured,
            had_previous = previous.is_some(),
            "replaced global logger"
        );
        previous
    }

    /// Removes the global logger, returning it.
    ///
    /// Subsequent global calls write the "not initialized" diagnostic to
    /// standard error.
    pub fn uninstall() -> Option<Arc<Logger>> {
        LOGGER.take()
    }

    /// The globally installed logger, if any.
    #[must_use]
    pub fn current() -> Option<Arc<Logger>> {
        LOGGER.current()
    }

    /// Runs one event through the pipeline.
    pub fn log(&self, event: Event<'_>) {
        let Event {
            details,
            message,
            format,
        } = event;

        let mut buffer = MessageBuffer::new();
        buffer.render(message, format);
        if buffer.is_truncated() {
            tracing::debug!(target: "dotlog", format, "message truncated");
        }
        let message = buffer.as_str();

        let (Some(formatter), Some(sink)) = (&self.formatter, &self.sink) else {
            self.diagnostic(format_args!(
                "[dotlog critical] logging system not initialized; message: {message}"
            ));
            return;
        };

        let Details { pairs, address } = details;
        let line = formatter.format_line(message, pairs.as_deref().unwrap_or_default());
        let pairs_missing = pairs.is_none();
        drop(pairs);

        match line {
            Some(line) => sink.write_line(&line, &self.stream),
            None => {
                tracing::debug!(target: "dotlog", format, "formatter failed");
                self.diagnostic(format_args!(
                    "[dotlog warning] formatter failed; raw message: {message}"
                ));
                if let (Some(address), true) = (address, pairs_missing) {
                    self.diagnostic(format_args!(
                        "[dotlog warning] record details may have failed to extract (record at {address:p})"
                    ));
                }
            }
        }
    }

    /// Logs `message` with the pairs extracted from `record`.
    ///
    /// This is the function form of `log_error!(logger = ..., record, ...)`
    /// for callers that already hold [`fmt::Arguments`].
    pub fn log_error<R>(&self, record: Option<&R>, message: fmt::Arguments<'_>)
    where
        R: Record + ?Sized,
    {
        let format = message.as_str().unwrap_or("<formatted message>");
        self.log(Event::new(message, format).with_details(Details::of_record(record)));
    }

    fn diagnostic(&self, line: fmt::Arguments<'_>) {
        if let Err(error) = self.stream.write_fmt_line(line) {
            tracing::debug!(target: "dotlog", %error, "could not write diagnostic");
        }
    }
}

/// Configures the global logger, replacing any previous one.
///
/// A `stream` of `None` selects standard error.
///
/// # Examples
///
/// ```rust
/// use dotlog::{formatter::Logfmt, sink::StreamSink};
///
/// dotlog::init(Logfmt, StreamSink, None);
/// # dotlog::Logger::uninstall();
/// ```
pub fn init<F, S>(formatter: F, sink: S, stream: Option<OutputStream>)
where
    F: LineFormatter,
    S: Sink,
{
    Logger::unconfigured()
        .formatter(formatter)
        .sink(sink)
        .stream(stream.unwrap_or_default())
        .replace();
}

/// Runs `event` through the global logger.
pub(crate) fn log_global(event: Event<'_>) {
    match LOGGER.current() {
        Some(logger) => logger.log(event),
        None => FALLBACK.log(event),
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, Write},
        sync::Mutex,
    };

    use super::*;
    use crate::kv::KeyValuePair;

    #[derive(crate::Record)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(crate::Record)]
    struct Empty {}

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logger_with_buffer() -> (Logger, Buffer) {
        let buffer = Buffer::default();
        let logger = Logger::new().stream(OutputStream::writer(buffer.clone()));
        (logger, buffer)
    }

    fn failing_formatter(_message: &str, _pairs: &[KeyValuePair]) -> Option<String> {
        None
    }

    static_assertions::assert_impl_all!(Logger: Send, Sync, fmt::Debug);
    static_assertions::assert_impl_all!(LoggerAlreadyInstalledError: std::error::Error);

    #[test]
    fn test_record_line() {
        let (logger, buffer) = logger_with_buffer();
        let point = Point { x: 1, y: 2 };
        logger.log(
            Event::new(format_args!("bad thing {}", 7), "bad thing {}")
                .with_details(Details::of_record(Some(&point))),
        );
        assert_eq!(buffer.contents(), "bad thing 7 x=\"1\" y=\"2\"\n");
    }

    #[test]
    fn test_message_only_line() {
        let (logger, buffer) = logger_with_buffer();
        logger.log(Event::new(format_args!("plain"), "plain"));
        logger.log_error::<Point>(None, format_args!("no record"));
        assert_eq!(buffer.contents(), "plain\nno record\n");
    }

    #[test]
    fn test_unknown_details() {
        let (logger, buffer) = logger_with_buffer();
        let value = 5u16;
        logger.log(Event::new(format_args!("odd"), "odd").with_details(Details::of_unknown(Some(&value))));
        let expected = format!("odd unknown_error_type=\"unhandled_type_at_address_{:p}\"\n", &value);
        assert_eq!(buffer.contents(), expected);
    }

    #[test]
    fn test_unconfigured_logger_writes_critical_line() {
        let buffer = Buffer::default();
        let logger = Logger::new()
            .without_sink()
            .stream(OutputStream::writer(buffer.clone()));
        assert!(!logger.is_configured());
        logger.log(Event::new(format_args!("lost {}", 1), "lost {}"));
        assert_eq!(
            buffer.contents(),
            "[dotlog critical] logging system not initialized; message: lost 1\n"
        );
    }

    #[test]
    fn test_formatter_failure_warns() {
        let (logger, buffer) = logger_with_buffer();
        let logger = logger.formatter(failing_formatter);
        logger.log(
            Event::new(format_args!("boom"), "boom")
                .with_details(Details::of_record(Some(&Point { x: 1, y: 1 }))),
        );
        assert_eq!(buffer.contents(), "[dotlog warning] formatter failed; raw message: boom\n");
    }

    #[test]
    fn test_formatter_failure_with_missing_pairs_warns_twice() {
        let (logger, buffer) = logger_with_buffer();
        let logger = logger.formatter(failing_formatter);
        let empty = Empty {};
        logger.log(Event::new(format_args!("boom"), "boom").with_details(Details::of_record(Some(&empty))));
        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[dotlog warning] formatter failed; raw message: boom");
        assert_eq!(
            lines[1],
            format!(
                "[dotlog warning] record details may have failed to extract (record at {:p})",
                &empty
            )
        );
    }

    #[test]
    fn test_truncated_message_reaches_formatter() {
        let (logger, buffer) = logger_with_buffer();
        let long = "z".repeat(2000);
        logger.log(Event::new(format_args!("{long}"), "{long}"));
        let contents = buffer.contents();
        let line = contents.strip_suffix('\n').unwrap();
        assert_eq!(line.len(), 1023);
        assert!(line.ends_with("...(msg_truncated)"));
    }

    #[test]
    fn test_custom_sink_receives_stream() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::new().stream(OutputStream::Stdout).sink({
            let seen = Arc::clone(&seen);
            move |line: &str, stream: &OutputStream| {
                seen.lock().unwrap().push(format!("{line} -> {stream:?}"));
            }
        });
        logger.log(Event::new(format_args!("hi"), "hi"));
        assert_eq!(*seen.lock().unwrap(), ["hi -> Stdout"]);
    }

    #[test]
    fn test_details_accessors() {
        let none = Details::none();
        assert!(!none.has_record());
        assert!(none.pairs().is_none());

        let details = Details::of_record(Some(&Point { x: 3, y: 4 }));
        assert!(details.has_record());
        assert_eq!(details.pairs().map(|pairs| pairs.len()), Some(2));

        let absent = Details::of_record::<Point>(None);
        assert!(!absent.has_record());
    }
}
