//! JSON output and injected loggers.
//!
//! This example shows how to:
//! 1. Use the `Json` formatter instead of logfmt
//! 2. Capture lines with a closure sink
//! 3. Log through an explicit `Logger` instead of the global one

use std::sync::{Arc, Mutex};

use dotlog::{Logger, OutputStream, Record, formatter::Json, log_error};

#[derive(Record)]
struct Request {
    method: &'static str,
    path: &'static str,
}

#[derive(Record)]
struct HttpError {
    #[record(rename = "status")]
    code: u16,
    #[record(nested)]
    request: Request,
}

fn main() {
    let error = HttpError {
        code: 503,
        request: Request {
            method: "GET",
            path: "/api/v1/items",
        },
    };

    // Global logger writing JSON lines to standard output
    Logger::new()
        .formatter(Json)
        .stream(OutputStream::Stdout)
        .replace();
    log_error!(&error, "upstream unavailable after {} retries", 3);

    // An injected logger capturing lines in memory
    let captured = Arc::new(Mutex::new(Vec::new()));
    let logger = Logger::new().formatter(Json).sink({
        let captured = Arc::clone(&captured);
        move |line: &str, _: &OutputStream| {
            if let Ok(mut lines) = captured.lock() {
                lines.push(line.to_owned());
            }
        }
    });
    log_error!(logger = logger, &error.request, "slow request");

    if let Ok(lines) = captured.lock() {
        for line in lines.iter() {
            println!("captured: {line}");
        }
    }
}
