//! The declarative record model.
//!
//! A record type is a named, ordered list of fields. Each field is described
//! by a [`FieldDescriptor`]: its name, which is used verbatim as a segment of
//! the dotted key, and its [`FieldKind`], which is either a scalar with a
//! formatting hint or a nested record.
//!
//! Record types are normally declared with `#[derive(Record)]`, which
//! generates the descriptor table and the field walk from the struct
//! definition:
//!
//! ```rust
//! use dotlog::Record;
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
//! assert_eq!(Line::FIELDS.len(), 3);
//! assert_eq!(Line::FIELDS[0].name, "start");
//! assert!(Line::FIELDS[0].is_nested());
//! ```
//!
//! Both the stringifier ([`crate::render`]) and the key/value extractor
//! ([`crate::kv`]) are [`FieldVisitor`]s driven by the same
//! [`Record::visit_fields`] walk, so the two always agree on keys, order and
//! values.

use core::fmt;

use crate::render::{RenderError, Renderer};

/// The kind of a single field in a record declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// A leaf value, rendered with a Rust format string holding exactly one
    /// placeholder, such as `"{}"`, `"{:?}"` or `"{:#x}"`.
    Scalar {
        /// The format string used to render the value.
        format: &'static str,
    },
    /// Another record type, rendered recursively with an extended prefix.
    Nested {
        /// The name of the nested record type.
        type_name: &'static str,
    },
}

/// Declaration-time metadata for one field of a record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    /// The field name, used verbatim as the rendered key segment.
    pub name: &'static str,
    /// Whether the field is a scalar or a nested record.
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// The formatting hint used for scalars declared without one.
    pub const DEFAULT_FORMAT: &'static str = "{}";

    /// Describes a scalar field rendered with `format`.
    #[must_use]
    pub const fn scalar(name: &'static str, format: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Scalar { format },
        }
    }

    /// Describes a field holding the record type named `type_name`.
    #[must_use]
    pub const fn nested(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Nested { type_name },
        }
    }

    /// Returns `true` if this field holds a nested record.
    #[must_use]
    pub const fn is_nested(&self) -> bool {
        matches!(self.kind, FieldKind::Nested { .. })
    }
}

/// Receives the fields of a record in declaration order.
///
/// Implementations decide what a scalar or a nested record turns into. The
/// stringifier writes `path=value` tokens, the extractor collects owned
/// key/value pairs, and a counting visitor sizes allocations up front.
pub trait FieldVisitor {
    /// The error that aborts the walk.
    type Error;

    /// Visits a scalar field. `value` is already bound to the field's
    /// formatting hint.
    fn scalar(&mut self, name: &'static str, value: fmt::Arguments<'_>) -> Result<(), Self::Error>;

    /// Visits a field holding a nested record.
    fn nested<R>(&mut self, name: &'static str, record: &R) -> Result<(), Self::Error>
    where
        R: Record + ?Sized;
}

/// A statically declared, ordered aggregate of named fields.
///
/// Implement this with `#[derive(Record)]`. A hand-written implementation is
/// also fine and is the way to give a type a stringifier that deviates from
/// the generated format: override [`render_to`](Record::render_to) and every
/// record that nests this type will call the override.
///
/// # Examples
///
/// ```rust
/// use dotlog::{FieldDescriptor, FieldVisitor, Record, RecordExt, RenderError, Renderer};
///
/// struct Feature {
///     id: i32,
///     name: &'static str,
/// }
///
/// impl Record for Feature {
///     const NAME: &'static str = "Feature";
///     const FIELDS: &'static [FieldDescriptor] = &[
///         FieldDescriptor::scalar("id", "{}"),
///         FieldDescriptor::scalar("name", "{}"),
///     ];
///
///     fn visit_fields<V: FieldVisitor>(&self, visitor: &mut V) -> Result<(), V::Error> {
///         visitor.scalar("id", format_args!("{}", self.id))?;
///         visitor.scalar("name", format_args!("{}", self.name))
///     }
///
///     fn render_to(&self, out: &mut Renderer<'_>) -> Result<(), RenderError> {
///         out.scalar("id", format_args!("#{}", self.id))?;
///         out.scalar("name", format_args!("{:?}", self.name))
///     }
/// }
///
/// let feature = Feature { id: 7, name: "turbo" };
/// assert_eq!(
///     feature.to_dotted_string("feat").unwrap(),
///     r#"feat.id=#7 feat.name="turbo""#
/// );
/// ```
pub trait Record {
    /// The name of the record type.
    const NAME: &'static str;

    /// The field descriptors, in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    /// Walks the fields in declaration order, handing each to `visitor`.
    fn visit_fields<V>(&self, visitor: &mut V) -> Result<(), V::Error>
    where
        V: FieldVisitor;

    /// The stringifier for this record type.
    ///
    /// The default writes every field as a `path=value` token through
    /// [`Renderer::render_fields`].
    fn render_to(&self, out: &mut Renderer<'_>) -> Result<(), RenderError> {
        out.render_fields(self)
    }
}

impl<R> Record for Box<R>
where
    R: Record + ?Sized,
{
    const NAME: &'static str = R::NAME;
    const FIELDS: &'static [FieldDescriptor] = R::FIELDS;

    fn visit_fields<V>(&self, visitor: &mut V) -> Result<(), V::Error>
    where
        V: FieldVisitor,
    {
        (**self).visit_fields(visitor)
    }

    fn render_to(&self, out: &mut Renderer<'_>) -> Result<(), RenderError> {
        (**self).render_to(out)
    }
}

/// Counts the scalar leaves reachable from `record`, depth first.
#[must_use]
pub fn leaf_count<R>(record: &R) -> usize
where
    R: Record + ?Sized,
{
    struct Counter(usize);

    impl FieldVisitor for Counter {
        type Error = core::convert::Infallible;

        fn scalar(&mut self, _name: &'static str, _value: fmt::Arguments<'_>) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }

        fn nested<R>(&mut self, _name: &'static str, record: &R) -> Result<(), Self::Error>
        where
            R: Record + ?Sized,
        {
            record.visit_fields(self)
        }
    }

    let mut counter = Counter(0);
    match record.visit_fields(&mut counter) {
        Ok(()) => counter.0,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    #[derive(Record)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Record)]
    struct Line {
        #[record(nested)]
        start: Point,
        #[record(nested)]
        end: Point,
        label: &'static str,
    }

    #[derive(Record)]
    struct Empty {}

    #[derive(Record)]
    struct Reading {
        #[record(format = "{:.2}")]
        celsius: f64,
        #[record(format = "{:#x}")]
        code: u32,
    }

    #[test]
    fn test_descriptor_table_follows_declaration_order() {
        assert_eq!(Point::NAME, "Point");
        assert_eq!(
            Point::FIELDS,
            &[
                FieldDescriptor::scalar("x", "{}"),
                FieldDescriptor::scalar("y", "{}"),
            ]
        );
        assert_eq!(
            Line::FIELDS,
            &[
                FieldDescriptor::nested("start", "Point"),
                FieldDescriptor::nested("end", "Point"),
                FieldDescriptor::scalar("label", "{}"),
            ]
        );
        assert!(Empty::FIELDS.is_empty());
    }

    #[test]
    fn test_format_hints_are_recorded() {
        assert_eq!(
            Reading::FIELDS,
            &[
                FieldDescriptor::scalar("celsius", "{:.2}"),
                FieldDescriptor::scalar("code", "{:#x}"),
            ]
        );
    }

    #[test]
    fn test_leaf_count_recurses() {
        let line = Line {
            start: Point { x: 1, y: 2 },
            end: Point { x: 3, y: 4 },
            label: "l",
        };
        assert_eq!(leaf_count(&Point { x: 0, y: 0 }), 2);
        assert_eq!(leaf_count(&line), 5);
        assert_eq!(leaf_count(&Empty {}), 0);
        assert_eq!(leaf_count(&Box::new(line)), 5);
    }
}
