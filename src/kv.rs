//! Owned key/value extraction.
//!
//! [`extract`] walks a record depth first, in declaration order, and returns
//! one [`KeyValuePair`] per scalar leaf. Keys are dotted paths and values are
//! the scalars rendered with their formatting hints, so the list carries the
//! same information as the stringifier output in [`crate::render`]:
//!
//! ```rust
//! use dotlog::{Record, kv};
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
//!     label: &'static str,
//! }
//!
//! let line = Line { start: Point { x: 1, y: 2 }, label: "main" };
//! let pairs = kv::extract(Some(&line)).unwrap();
//!
//! let keys: Vec<_> = pairs.iter().map(|pair| pair.key()).collect();
//! assert_eq!(keys, ["start.x", "start.y", "label"]);
//! assert_eq!(pairs[2].value(), "main");
//! ```
//!
//! "No pairs" is always `None`, never an empty list. Dropping a [`KvList`]
//! releases every key and value it owns.

use core::{fmt, ops::Deref, ptr};

use crate::record::{FieldVisitor, Record, leaf_count};

/// The key of the single pair produced for values of an unregistered type.
pub const UNKNOWN_TYPE_KEY: &str = "unknown_error_type";

/// A dotted key and the rendered value of one scalar leaf.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyValuePair {
    key: String,
    value: String,
}

impl KeyValuePair {
    /// Creates a pair from an already rendered key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The dotted path of the leaf, e.g. `start.x`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The leaf rendered with its formatting hint.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Splits the pair into its key and value.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.key, self.value)
    }
}

/// The ordered pairs produced by one extraction.
///
/// A `KvList` is never empty; the absence of pairs is expressed as `None` by
/// the functions that produce one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KvList(Vec<KeyValuePair>);

impl KvList {
    /// Wraps `pairs`, returning `None` when there are none.
    #[must_use]
    pub fn from_pairs(pairs: Vec<KeyValuePair>) -> Option<Self> {
        if pairs.is_empty() { None } else { Some(Self(pairs)) }
    }

    /// The pairs as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[KeyValuePair] {
        &self.0
    }

    /// Unwraps the list into its pairs.
    #[must_use]
    pub fn into_vec(self) -> Vec<KeyValuePair> {
        self.0
    }
}

impl Deref for KvList {
    type Target = [KeyValuePair];

    fn deref(&self) -> &[KeyValuePair] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a KvList {
    type Item = &'a KeyValuePair;
    type IntoIter = core::slice::Iter<'a, KeyValuePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for KvList {
    type Item = KeyValuePair;
    type IntoIter = std::vec::IntoIter<KeyValuePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Why an extraction was abandoned.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
enum ExtractError {
    #[error("allocation failed")]
    Alloc,
    #[error("a field value failed to format")]
    Format,
}

/// Extracts the scalar leaves of `record` as owned key/value pairs.
///
/// Returns `None` when `record` is `None`, when the record has no scalar
/// leaves, when an allocation fails, or when a value fails to format. On
/// failure everything allocated so far is released.
///
/// Identical input always produces identical pairs, in the same order.
pub fn extract<R>(record: Option<&R>) -> Option<KvList>
where
    R: Record + ?Sized,
{
    let record = record?;
    let leaves = leaf_count(record);
    if leaves == 0 {
        return None;
    }

    let mut collector = PairCollector {
        path: String::new(),
        pairs: Vec::new(),
    };
    let result = collector
        .pairs
        .try_reserve_exact(leaves)
        .map_err(|_| ExtractError::Alloc)
        .and_then(|()| record.visit_fields(&mut collector));

    match result {
        Ok(()) => KvList::from_pairs(collector.pairs),
        Err(error) => {
            tracing::debug!(target: "dotlog", record = R::NAME, %error, "key/value extraction failed");
            None
        }
    }
}

/// The extractor for values whose type has no record declaration.
///
/// Produces the single pair
/// `unknown_error_type = unhandled_type_at_address_<address>` for a present
/// value and `None` for an absent one.
///
/// # Examples
///
/// ```rust
/// use dotlog::kv::{UNKNOWN_TYPE_KEY, extract_unknown};
///
/// let value = 42u64;
/// let pairs = extract_unknown(Some(&value)).unwrap();
/// assert_eq!(pairs.len(), 1);
/// assert_eq!(pairs[0].key(), UNKNOWN_TYPE_KEY);
/// assert!(pairs[0].value().starts_with("unhandled_type_at_address_0x"));
///
/// assert!(extract_unknown::<u64>(None).is_none());
/// ```
pub fn extract_unknown<T>(record: Option<&T>) -> Option<KvList>
where
    T: ?Sized,
{
    let address = ptr::from_ref(record?).cast::<()>();
    KvList::from_pairs(vec![KeyValuePair::new(
        UNKNOWN_TYPE_KEY,
        format!("unhandled_type_at_address_{address:p}"),
    )])
}

struct PairCollector {
    path: String,
    pairs: Vec<KeyValuePair>,
}

impl PairCollector {
    fn key_for(&self, name: &str) -> Result<String, ExtractError> {
        let separator = usize::from(!self.path.is_empty());
        let mut key = String::new();
        key.try_reserve_exact(self.path.len() + separator + name.len())
            .map_err(|_| ExtractError::Alloc)?;
        if separator == 1 {
            key.push_str(&self.path);
            key.push('.');
        }
        key.push_str(name);
        Ok(key)
    }
}

impl FieldVisitor for PairCollector {
    type Error = ExtractError;

    fn scalar(&mut self, name: &'static str, value: fmt::Arguments<'_>) -> Result<(), ExtractError> {
        let key = self.key_for(name)?;

        let mut writer = FallibleString::default();
        if fmt::write(&mut writer, value).is_err() {
            return Err(if writer.alloc_failed {
                ExtractError::Alloc
            } else {
                ExtractError::Format
            });
        }

        self.pairs
            .try_reserve(1)
            .map_err(|_| ExtractError::Alloc)?;
        self.pairs.push(KeyValuePair {
            key,
            value: writer.buf,
        });
        Ok(())
    }

    fn nested<R>(&mut self, name: &'static str, record: &R) -> Result<(), ExtractError>
    where
        R: Record + ?Sized,
    {
        let path_len = self.path.len();
        self.path
            .try_reserve(name.len() + 1)
            .map_err(|_| ExtractError::Alloc)?;
        if !self.path.is_empty() {
            self.path.push('.');
        }
        self.path.push_str(name);

        let result = record.visit_fields(self);
        self.path.truncate(path_len);
        result
    }
}

/// A `String` writer that reports allocation failure instead of aborting.
#[derive(Default)]
struct FallibleString {
    buf: String,
    alloc_failed: bool,
}

impl fmt::Write for FallibleString {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.buf.try_reserve(s.len()).is_err() {
            self.alloc_failed = true;
            return Err(fmt::Error);
        }
        self.buf.push_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Record, render};

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
    struct OnlyEmpty {
        #[record(nested)]
        inner: Empty,
    }

    #[derive(Record)]
    struct Quirky {
        #[record(format = "{:?}")]
        quoted: &'static str,
        #[record(format = "{:08.3}")]
        padded: f32,
    }

    struct Broken;

    impl fmt::Display for Broken {
        fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
            Err(fmt::Error)
        }
    }

    #[derive(Record)]
    struct HasBroken {
        ok: u8,
        broken: Broken,
    }

    fn sample_line() -> Line {
        Line {
            start: Point { x: 10, y: 20 },
            end: Point { x: 30, y: 40 },
            label: "MainLine",
        }
    }

    fn as_tuples(list: &KvList) -> Vec<(&str, &str)> {
        list.iter().map(|pair| (pair.key(), pair.value())).collect()
    }

    #[test]
    fn test_extract_point() {
        let pairs = extract(Some(&Point { x: 1, y: 2 })).unwrap();
        assert_eq!(as_tuples(&pairs), [("x", "1"), ("y", "2")]);
    }

    #[test]
    fn test_extract_nested_uses_dotted_keys() {
        let pairs = extract(Some(&sample_line())).unwrap();
        assert_eq!(
            as_tuples(&pairs),
            [
                ("start.x", "10"),
                ("start.y", "20"),
                ("end.x", "30"),
                ("end.y", "40"),
                ("label", "MainLine"),
            ]
        );
    }

    #[test]
    fn test_extract_none_and_empty() {
        assert!(extract::<Point>(None).is_none());
        assert!(extract(Some(&Empty {})).is_none());
        assert!(extract(Some(&OnlyEmpty { inner: Empty {} })).is_none());
    }

    #[test]
    fn test_extract_respects_format_hints() {
        let pairs = extract(Some(&Quirky {
            quoted: "a b",
            padded: 1.5,
        }))
        .unwrap();
        assert_eq!(as_tuples(&pairs), [("quoted", "\"a b\""), ("padded", "0001.500")]);
    }

    #[test]
    fn test_extract_format_failure_yields_none() {
        assert!(extract(Some(&HasBroken { ok: 1, broken: Broken })).is_none());
    }

    #[test]
    fn test_extract_agrees_with_render() {
        let line = sample_line();
        let pairs = extract(Some(&line)).unwrap();
        let rendered = render::to_dotted_string(&line, "").unwrap();
        let tokens: Vec<(&str, &str)> = rendered
            .split(' ')
            .map(|token| token.split_once('=').unwrap())
            .collect();
        assert_eq!(as_tuples(&pairs), tokens);
    }

    #[test]
    fn test_extract_is_deterministic() {
        let line = sample_line();
        assert_eq!(extract(Some(&line)), extract(Some(&line)));
    }

    #[test]
    fn test_extract_unknown_reports_address() {
        let value = [1u8, 2, 3];
        let pairs = extract_unknown(Some(&value)).unwrap();
        let expected = format!("unhandled_type_at_address_{:p}", &value);
        assert_eq!(as_tuples(&pairs), [(UNKNOWN_TYPE_KEY, expected.as_str())]);
        assert!(extract_unknown::<str>(None).is_none());
    }

    #[test]
    fn test_kv_list_never_empty() {
        assert!(KvList::from_pairs(Vec::new()).is_none());
        let list = KvList::from_pairs(vec![KeyValuePair::new("a", "b")]).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.into_vec()[0].clone().into_parts(),
            ("a".to_owned(), "b".to_owned())
        );
    }
}
