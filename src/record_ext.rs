//! Method-call access to rendering and extraction.
//!
//! [`RecordExt`] is implemented for every [`Record`] and forwards to the free
//! functions in [`crate::render`] and [`crate::kv`]:
//!
//! ```rust
//! use dotlog::{Record, RecordExt};
//!
//! #[derive(Record)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let point = Point { x: 10, y: 20 };
//! assert_eq!(point.to_dotted_string("mypoint").unwrap(), "mypoint.x=10 mypoint.y=20");
//! assert_eq!(point.to_pairs().unwrap().len(), 2);
//! ```

use crate::{
    kv::{self, KvList},
    record::Record,
    render::{self, Dotted, RenderError},
};

/// Extension methods available on every [`Record`].
pub trait RecordExt: Record {
    /// Renders `self` into `buf`. See [`render::render`].
    fn render_into(&self, buf: &mut [u8], prefix: &str) -> Result<usize, RenderError> {
        render::render(buf, Some(self), prefix)
    }

    /// Renders `self` into a new string. See [`render::to_dotted_string`].
    fn to_dotted_string(&self, prefix: &str) -> Result<String, RenderError> {
        render::to_dotted_string(self, prefix)
    }

    /// Wraps `self` for use with `{}`. See [`render::dotted`].
    fn dotted<'a>(&'a self, prefix: &'a str) -> Dotted<'a, Self> {
        render::dotted(self, prefix)
    }

    /// Extracts the key/value pairs of `self`. See [`kv::extract`].
    fn to_pairs(&self) -> Option<KvList> {
        kv::extract(Some(self))
    }
}

impl<R> RecordExt for R where R: Record + ?Sized {}
