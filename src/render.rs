//! The bounded, prefix-aware stringifier.
//!
//! Rendering turns a [`Record`] into a single line of space separated
//! `path=value` tokens:
//!
//! ```text
//! myline.start.x=10 myline.start.y=20 myline.end.x=30 myline.end.y=40 myline.label=MainLine
//! ```
//!
//! The path of a field is the prefix, a `.`, and the field name, or just the
//! field name when the prefix is empty. Values are written with the field's
//! formatting hint and are neither quoted nor escaped. Nested records are
//! spliced in place with the extended prefix. There is no leading or trailing
//! space and no newline.
//!
//! [`render`] writes into a caller-provided byte buffer and keeps it
//! NUL-terminated, so the result can be handed to code expecting a C string.
//! Every append is checked against the remaining capacity; a field that does
//! not fit aborts the render with [`RenderError::CapacityExceeded`] and the
//! buffer is cut off at the start of that field. An empty buffer turns the
//! call into a sizing pass that reports how many bytes a full render needs.
//!
//! ```rust
//! use dotlog::{Record, render};
//!
//! #[derive(Record)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let point = Point { x: 10, y: 20 };
//! let mut buf = [0u8; 64];
//!
//! let written = render::render(&mut buf, Some(&point), "mypoint").unwrap();
//! assert_eq!(&buf[..written], b"mypoint.x=10 mypoint.y=20");
//! assert_eq!(buf[written], 0);
//!
//! assert_eq!(render::render(&mut [], Some(&point), "mypoint"), Ok(written));
//! ```

use core::fmt;

use crate::record::{FieldVisitor, Record};

/// Errors that abort a render.
///
/// Neither variant leaves a partial field behind: when rendering into a byte
/// buffer, the buffer is NUL-terminated at the start of the field that failed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum RenderError {
    /// The output does not fit in the destination buffer, terminator
    /// included.
    #[error("rendered record does not fit in a buffer of {capacity} bytes")]
    CapacityExceeded {
        /// The size of the destination buffer.
        capacity: usize,
    },
    /// A field value's formatting implementation reported an error.
    #[error("a field value failed to format")]
    Format,
}

/// Where rendered bytes go.
enum Target<'a> {
    /// A bounded buffer. One byte is always kept free for the terminator.
    Slice(&'a mut [u8]),
    /// Nothing is written; only the length is tracked.
    Measure,
    /// An unbounded formatter.
    Fmt(&'a mut dyn fmt::Write),
}

/// The write head of a render.
///
/// The pending separator is emitted lazily, right before the first byte of
/// the next token, so a nested record that renders nothing leaves no stray
/// space behind.
struct Output<'a> {
    target: Target<'a>,
    len: usize,
    pending_separator: bool,
}

impl Output<'_> {
    fn push_str(&mut self, s: &str) -> Result<(), RenderError> {
        if self.pending_separator {
            self.pending_separator = false;
            self.push_raw(" ")?;
        }
        self.push_raw(s)
    }

    fn push_raw(&mut self, s: &str) -> Result<(), RenderError> {
        match &mut self.target {
            Target::Slice(buf) => {
                let end = self.len + s.len();
                if end >= buf.len() {
                    return Err(RenderError::CapacityExceeded {
                        capacity: buf.len(),
                    });
                }
                buf[self.len..end].copy_from_slice(s.as_bytes());
            }
            Target::Measure => {}
            Target::Fmt(writer) => writer.write_str(s).map_err(|_| RenderError::Format)?,
        }
        self.len += s.len();
        Ok(())
    }

    /// Drops everything written from `at` onwards and terminates there.
    fn cut(&mut self, at: usize) {
        self.pending_separator = false;
        self.len = at;
        if let Target::Slice(buf) = &mut self.target {
            buf[at..].fill(0);
        }
    }

    fn terminate(&mut self) {
        if let Target::Slice(buf) = &mut self.target {
            buf[self.len] = 0;
        }
    }
}

/// The per-call state of a render.
///
/// A `Renderer` is handed to [`Record::render_to`]. Custom stringifiers use
/// [`scalar`](Self::scalar), [`token`](Self::token) and
/// [`nested`](Self::nested) to emit their fields; the renderer takes care of
/// separators, the dotted prefix and the capacity checks, so custom output
/// composes with generated output.
pub struct Renderer<'a> {
    output: Output<'a>,
    path: String,
    first: bool,
}

impl<'a> Renderer<'a> {
    fn new(target: Target<'a>, prefix: &str) -> Self {
        Self {
            output: Output {
                target,
                len: 0,
                pending_separator: false,
            },
            path: String::from(prefix),
            first: true,
        }
    }

    /// The dotted prefix of the record currently being rendered.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.path
    }

    /// The number of bytes written so far.
    #[must_use]
    pub fn written(&self) -> usize {
        self.output.len
    }

    /// Renders every field of `record` with the generated format.
    ///
    /// This is the default body of [`Record::render_to`].
    pub fn render_fields<R>(&mut self, record: &R) -> Result<(), RenderError>
    where
        R: Record + ?Sized,
    {
        record.visit_fields(&mut FieldWriter { out: self })
    }

    /// Emits `name=value` for a scalar field.
    pub fn scalar(&mut self, name: &str, value: fmt::Arguments<'_>) -> Result<(), RenderError> {
        self.token(name, |writer| writer.write_fmt(value))
    }

    /// Emits `name=` followed by whatever `value` writes.
    ///
    /// The token is either written completely or not at all.
    pub fn token<F>(&mut self, name: &str, value: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut dyn fmt::Write) -> fmt::Result,
    {
        let start = self.output.len;
        match self.write_token(name, value) {
            Ok(()) => {
                self.first = false;
                Ok(())
            }
            Err(error) => {
                self.output.cut(start);
                Err(error)
            }
        }
    }

    fn write_token<F>(&mut self, name: &str, value: F) -> Result<(), RenderError>
    where
        F: FnOnce(&mut dyn fmt::Write) -> fmt::Result,
    {
        if !self.first {
            self.output.push_str(" ")?;
        }
        if !self.path.is_empty() {
            self.output.push_str(&self.path)?;
            self.output.push_str(".")?;
        }
        self.output.push_str(name)?;
        self.output.push_str("=")?;

        let mut writer = ValueWriter {
            output: &mut self.output,
            error: None,
        };
        let result = value(&mut writer);
        match (result, writer.error) {
            (_, Some(error)) => Err(error),
            (Ok(()), None) => Ok(()),
            (Err(fmt::Error), None) => Err(RenderError::Format),
        }
    }

    /// Splices the rendering of `record` in place, under `name`.
    ///
    /// The nested record's own stringifier is used, with the prefix extended
    /// by `name`.
    pub fn nested<R>(&mut self, name: &str, record: &R) -> Result<(), RenderError>
    where
        R: Record + ?Sized,
    {
        let start = self.output.len;
        let path_len = self.path.len();
        let outer_first = self.first;
        // An enclosing level may still owe a separator.
        let owed_separator = self.output.pending_separator;

        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(name);
        self.output.pending_separator = owed_separator || !outer_first;
        self.first = true;

        let result = record.render_to(self);

        self.path.truncate(path_len);
        self.first = outer_first;

        match result {
            Ok(()) => {
                if self.output.len > start {
                    self.first = false;
                    self.output.pending_separator = false;
                } else {
                    self.output.pending_separator = owed_separator;
                }
                Ok(())
            }
            Err(error) => {
                self.output.cut(start);
                Err(error)
            }
        }
    }
}

/// Forwards `fmt::Write` calls to the output, remembering why a write failed.
struct ValueWriter<'o, 'a> {
    output: &'o mut Output<'a>,
    error: Option<RenderError>,
}

impl fmt::Write for ValueWriter<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.output.push_str(s).map_err(|error| {
            self.error = Some(error);
            fmt::Error
        })
    }
}

/// The visitor behind the generated stringifier.
struct FieldWriter<'r, 'a> {
    out: &'r mut Renderer<'a>,
}

impl FieldVisitor for FieldWriter<'_, '_> {
    type Error = RenderError;

    fn scalar(&mut self, name: &'static str, value: fmt::Arguments<'_>) -> Result<(), RenderError> {
        self.out.scalar(name, value)
    }

    fn nested<R>(&mut self, name: &'static str, record: &R) -> Result<(), RenderError>
    where
        R: Record + ?Sized,
    {
        self.out.nested(name, record)
    }
}

/// Renders `record` into `buf` under `prefix`.
///
/// Returns the number of bytes written, not counting the NUL terminator that
/// follows them.
///
/// - A `None` record renders as the empty string.
/// - An empty `buf` is a sizing call: nothing is written and the exact number
///   of bytes a full render needs is returned.
/// - On error `buf` is still NUL-terminated, at the start of the field that
///   could not be written, and every byte after the terminator is zero.
///
/// # Examples
///
/// ```rust
/// use dotlog::{Record, RenderError, render::render};
///
/// #[derive(Record)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let mut buf = [0xffu8; 12];
/// let result = render(&mut buf, Some(&Point { x: 10, y: 20 }), "mypoint");
/// assert_eq!(result, Err(RenderError::CapacityExceeded { capacity: 12 }));
/// assert_eq!(buf, [0u8; 12]);
///
/// let mut buf = [0xffu8; 4];
/// assert_eq!(render::<Point>(&mut buf, None, "mypoint"), Ok(0));
/// assert_eq!(buf[0], 0);
/// ```
pub fn render<R>(buf: &mut [u8], record: Option<&R>, prefix: &str) -> Result<usize, RenderError>
where
    R: Record + ?Sized,
{
    if buf.is_empty() {
        return match record {
            Some(record) => measure(record, prefix),
            None => Ok(0),
        };
    }
    let Some(record) = record else {
        buf[0] = 0;
        return Ok(0);
    };

    let mut renderer = Renderer::new(Target::Slice(buf), prefix);
    let result = record.render_to(&mut renderer);
    if result.is_err() {
        let at = renderer.output.len;
        renderer.output.cut(at);
    }
    result?;
    renderer.output.terminate();
    Ok(renderer.output.len)
}

/// Returns the number of bytes [`render`] would write for `record` given an
/// unbounded buffer, not counting the terminator.
pub fn measure<R>(record: &R, prefix: &str) -> Result<usize, RenderError>
where
    R: Record + ?Sized,
{
    let mut renderer = Renderer::new(Target::Measure, prefix);
    record.render_to(&mut renderer)?;
    Ok(renderer.output.len)
}

/// Renders `record` into a freshly allocated string.
///
/// The record is measured first and then rendered into an exactly sized
/// buffer.
pub fn to_dotted_string<R>(record: &R, prefix: &str) -> Result<String, RenderError>
where
    R: Record + ?Sized,
{
    let len = measure(record, prefix)?;
    let mut buf = vec![0u8; len + 1];
    let written = render(&mut buf, Some(record), prefix)?;
    buf.truncate(written);
    String::from_utf8(buf).map_err(|_| RenderError::Format)
}

/// Returns a value whose [`Display`](fmt::Display) implementation renders
/// `record` under `prefix`.
///
/// # Examples
///
/// ```rust
/// use dotlog::{Record, render::dotted};
///
/// #[derive(Record)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let point = Point { x: 1, y: 2 };
/// assert_eq!(format!("[{}]", dotted(&point, "p")), "[p.x=1 p.y=2]");
/// ```
#[must_use]
pub fn dotted<'a, R>(record: &'a R, prefix: &'a str) -> Dotted<'a, R>
where
    R: Record + ?Sized,
{
    Dotted { record, prefix }
}

/// A record paired with a prefix, displayed in dotted form.
///
/// Created by [`dotted`].
pub struct Dotted<'a, R: ?Sized> {
    record: &'a R,
    prefix: &'a str,
}

impl<R> fmt::Display for Dotted<'_, R>
where
    R: Record + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::new(Target::Fmt(f), self.prefix);
        self.record.render_to(&mut renderer).map_err(|_| fmt::Error)
    }
}

impl<R> fmt::Debug for Dotted<'_, R>
where
    R: Record + ?Sized,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dotted")
            .field("record", &R::NAME)
            .field("prefix", &self.prefix)
            .finish()
    }
}
