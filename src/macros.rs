/// Logs a message, optionally with a structured record.
///
/// The message arguments follow the same rules as [`format!()`].
///
/// [`format!()`]: std::format
///
/// ## Without a record
///
/// When the first argument is a string literal, only the message is logged:
///
/// ```
/// # use dotlog::log_error;
/// log_error!("cache miss for key {}", 42);
/// ```
///
/// ## With a record
///
/// Any other first argument is the record: a reference, or an `Option` of a
/// reference. The extractor is picked at compile time from its type. Types
/// implementing [`Record`](crate::Record) have their fields extracted; any
/// other type is logged as `unknown_error_type="unhandled_type_at_address_…"`.
///
/// ```
/// use dotlog::{Record, log_error};
///
/// #[derive(Record)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let point = Point { x: 1, y: 2 };
/// log_error!(&point, "bad thing {}", 7);
///
/// let missing: Option<&Point> = None;
/// log_error!(missing, "nothing to show");
///
/// let opaque = std::time::Duration::from_secs(1);
/// log_error!(&opaque, "not a record");
/// ```
///
/// ## With an explicit logger
///
/// Prefix the arguments with `logger = <expr>` to bypass the global logger:
///
/// ```
/// use dotlog::{Logger, log_error};
///
/// let logger = Logger::new();
/// log_error!(logger = logger, "took {} ms", 12);
/// log_error!(logger = &logger, &std::f64::consts::PI, "pi");
/// ```
#[macro_export]
macro_rules! log_error {
    (logger = $logger:expr, $fmt:literal $($arg:tt)*) => {
        ($logger).log($crate::__private::Event::new(
            $crate::__private::format_args!($fmt $($arg)*),
            $fmt,
        ))
    };
    (logger = $logger:expr, $record:expr, $fmt:literal $($arg:tt)*) => {
        {
            use $crate::__private::kind::*;
            let record = $record;
            let details = (&&Wrap(&record)).details();
            ($logger).log(
                $crate::__private::Event::new($crate::__private::format_args!($fmt $($arg)*), $fmt)
                    .with_details(details),
            )
        }
    };
    ($fmt:literal $($arg:tt)*) => {
        $crate::__private::log_global($crate::__private::Event::new(
            $crate::__private::format_args!($fmt $($arg)*),
            $fmt,
        ))
    };
    ($record:expr, $fmt:literal $($arg:tt)*) => {
        {
            use $crate::__private::kind::*;
            let record = $record;
            let details = (&&Wrap(&record)).details();
            $crate::__private::log_global(
                $crate::__private::Event::new($crate::__private::format_args!($fmt $($arg)*), $fmt)
                    .with_details(details),
            )
        }
    };
}
