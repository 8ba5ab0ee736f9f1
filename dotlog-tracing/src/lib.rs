#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! A [`dotlog`] sink that forwards finished log lines to [`tracing`].
//!
//! Use this when an application already routes its diagnostics through a
//! tracing subscriber: the lines produced by `dotlog::log_error!` become
//! tracing events under the target `dotlog` and are filtered, formatted and
//! exported like every other event.
//!
//! # Quick Start
//!
//! ```
//! use dotlog::{Logger, Record, log_error};
//! use dotlog_tracing::TracingSink;
//! use tracing_subscriber::{Registry, layer::SubscriberExt};
//!
//! // 1. Set up tracing as usual
//! let subscriber = Registry::default().with(tracing_subscriber::fmt::layer());
//! tracing::subscriber::set_global_default(subscriber).expect("failed to set subscriber");
//!
//! // 2. Send dotlog lines to tracing
//! Logger::new().sink(TracingSink::new()).replace();
//!
//! // 3. Log normally
//! #[derive(Record)]
//! struct Timeout {
//!     after_ms: u64,
//! }
//! log_error!(&Timeout { after_ms: 250 }, "request failed");
//! ```
//!
//! Output:
//! ```text
//! 2025-01-01T00:00:00.000000Z ERROR dotlog: request failed after_ms="250"
//! ```
//!
//! The [`OutputStream`] configured on the logger is not used for lines; the
//! subscriber decides where they go.

use dotlog::{OutputStream, Sink};
use tracing::Level;

/// Emits each line as a tracing event with target `dotlog`.
///
/// The line is the event's message. Events are emitted at
/// [`Level::ERROR`] unless configured otherwise.
///
/// # Examples
///
/// ```
/// use dotlog::Logger;
/// use dotlog_tracing::TracingSink;
/// use tracing::Level;
///
/// let logger = Logger::new().sink(TracingSink::new().with_level(Level::WARN));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TracingSink {
    level: Level,
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingSink {
    /// Creates a sink emitting events at [`Level::ERROR`].
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: Level::ERROR,
        }
    }

    /// Sets the level of the emitted events.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The level of the emitted events.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }
}

impl Sink for TracingSink {
    fn write_line(&self, line: &str, _stream: &OutputStream) {
        match self.level {
            Level::ERROR => tracing::error!(target: "dotlog", "{line}"),
            Level::WARN => tracing::warn!(target: "dotlog", "{line}"),
            Level::INFO => tracing::info!(target: "dotlog", "{line}"),
            Level::DEBUG => tracing::debug!(target: "dotlog", "{line}"),
            _ => tracing::trace!(target: "dotlog", "{line}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        fmt,
        sync::{Arc, Mutex},
    };

    use dotlog::{Logger, Record, log_error};
    use tracing::{
        Event, Subscriber,
        field::{Field, Visit},
    };
    use tracing_subscriber::{Layer, Registry, layer::Context, layer::SubscriberExt};

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Captured {
        level: Level,
        target: String,
        message: String,
    }

    #[derive(Clone, Default)]
    struct CaptureLayer(Arc<Mutex<Vec<Captured>>>);

    impl CaptureLayer {
        /// Captured events, without dotlog's own debug diagnostics.
        fn lines(&self) -> Vec<Captured> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|event| event.level != Level::DEBUG)
                .cloned()
                .collect()
        }
    }

    impl<S> Layer<S> for CaptureLayer
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            struct MessageVisitor(String);

            impl Visit for MessageVisitor {
                fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                    if field.name() == "message" {
                        self.0 = format!("{value:?}");
                    }
                }
            }

            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            self.0.lock().unwrap().push(Captured {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                message: visitor.0,
            });
        }
    }

    #[derive(Record)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn capture<F: FnOnce()>(f: F) -> Vec<Captured> {
        let layer = CaptureLayer::default();
        let subscriber = Registry::default().with(layer.clone());
        tracing::subscriber::with_default(subscriber, f);
        layer.lines()
    }

    #[test]
    fn test_line_becomes_error_event() {
        let logger = Logger::new().sink(TracingSink::new());
        let events = capture(|| {
            log_error!(logger = logger, &Point { x: 1, y: 2 }, "bad thing {}", 7);
        });
        assert_eq!(
            events,
            [Captured {
                level: Level::ERROR,
                target: "dotlog".to_owned(),
                message: r#"bad thing 7 x="1" y="2""#.to_owned(),
            }]
        );
    }

    #[test]
    fn test_configured_level() {
        let logger = Logger::new().sink(TracingSink::new().with_level(Level::WARN));
        let events = capture(|| {
            log_error!(logger = logger, "disk almost full");
        });
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::WARN);
        assert_eq!(events[0].message, "disk almost full");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TracingSink::default().level(), Level::ERROR);
        assert_eq!(TracingSink::new().with_level(Level::TRACE).level(), Level::TRACE);
    }
}
