use core::fmt::{self, Write};

/// The capacity of the message buffer, terminator slot included.
pub(crate) const MESSAGE_CAPACITY: usize = 1024;

/// Appended to a message that had to be cut short.
pub(crate) const TRUNCATION_MARKER: &str = "...(msg_truncated)";

/// A fixed-size buffer holding the rendered user message of one log call.
///
/// At most `MESSAGE_CAPACITY - 1` bytes are kept. Writes never split a
/// character, and a truncated message always ends in [`TRUNCATION_MARKER`].
pub(crate) struct MessageBuffer {
    buf: [u8; MESSAGE_CAPACITY],
    len: usize,
    truncated: bool,
}

impl MessageBuffer {
    const LIMIT: usize = MESSAGE_CAPACITY - 1;

    pub(crate) const fn new() -> Self {
        Self {
            buf: [0; MESSAGE_CAPACITY],
            len: 0,
            truncated: false,
        }
    }

    /// Renders `message`, falling back to a notice naming `format` when one
    /// of the message's arguments fails to format.
    pub(crate) fn render(&mut self, message: fmt::Arguments<'_>, format: &str) {
        if self.write_fmt(message).is_err() && !self.truncated {
            tracing::debug!(target: "dotlog", format, "message argument failed to format");
            self.clear();
            // Our own writer only fails by truncating, which is handled below.
            let _ = write!(self, "[dotlog] failed to render message; format: {format}");
        }
        if self.truncated {
            self.mark_truncated();
        }
    }

    pub(crate) fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub(crate) fn is_truncated(&self) -> bool {
        self.truncated
    }

    fn clear(&mut self) {
        self.len = 0;
        self.truncated = false;
    }

    fn mark_truncated(&mut self) {
        let mut keep = self.len.min(Self::LIMIT - TRUNCATION_MARKER.len());
        while !self.as_str().is_char_boundary(keep) {
            keep -= 1;
        }
        self.len = keep;
        self.push(TRUNCATION_MARKER);
    }

    fn push(&mut self, s: &str) {
        self.buf[self.len..self.len + s.len()].copy_from_slice(s.as_bytes());
        self.len += s.len();
    }
}

impl Write for MessageBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.truncated {
            return Err(fmt::Error);
        }
        let room = Self::LIMIT - self.len;
        if s.len() <= room {
            self.push(s);
            return Ok(());
        }

        let mut fits = room;
        while !s.is_char_boundary(fits) {
            fits -= 1;
        }
        self.push(&s[..fits]);
        self.truncated = true;
        Err(fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    fn rendered(message: fmt::Arguments<'_>, format: &str) -> (String, bool) {
        let mut buffer = MessageBuffer::new();
        buffer.render(message, format);
        (buffer.as_str().to_owned(), buffer.is_truncated())
    }

    #[test]
    fn test_short_message_is_kept() {
        let (message, truncated) = rendered(format_args!("bad thing {}", 7), "bad thing {}");
        assert_eq!(message, "bad thing 7");
        assert!(!truncated);
    }

    #[test]
    fn test_exactly_full_message_is_not_truncated() {
        let long = "a".repeat(MESSAGE_CAPACITY - 1);
        let (message, truncated) = rendered(format_args!("{long}"), "{long}");
        assert_eq!(message, long);
        assert!(!truncated);
    }

    #[test]
    fn test_long_message_ends_with_marker() {
        let long = "a".repeat(5000);
        let (message, truncated) = rendered(format_args!("{long}"), "{long}");
        assert!(truncated);
        assert_eq!(message.len(), MESSAGE_CAPACITY - 1);
        assert!(message.ends_with(TRUNCATION_MARKER));
        assert!(message.starts_with("aaaa"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let long = "é".repeat(1000);
        let (message, truncated) = rendered(format_args!("x{long}"), "x{long}");
        assert!(truncated);
        assert!(message.len() < MESSAGE_CAPACITY);
        assert!(message.ends_with(TRUNCATION_MARKER));
        let body = message.strip_suffix(TRUNCATION_MARKER).unwrap();
        assert!(body.strip_prefix('x').unwrap().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_failed_argument_is_replaced() {
        let (message, truncated) = rendered(format_args!("oops {}", Broken), "oops {}");
        assert_eq!(message, "[dotlog] failed to render message; format: oops {}");
        assert!(!truncated);
    }
}
