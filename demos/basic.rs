//! Basic introduction to dotlog.
//!
//! This example demonstrates the fundamental pieces:
//! 1. Declaring records with `#[derive(Record)]`
//! 2. Rendering them into a bounded buffer
//! 3. Logging errors with structured details through `log_error!`

use dotlog::{Logfmt, OutputStream, RenderError, Renderer, StreamSink, prelude::*};

#[derive(Record)]
struct Point {
    x: i32,
    y: i32,
}

/// Nested records are spliced in with an extended prefix.
#[derive(Record)]
struct Line {
    #[record(nested)]
    start: Point,
    #[record(nested)]
    end: Point,
    label: &'static str,
}

/// A record with its own stringifier. Records nesting it use it too.
#[derive(Record)]
#[record(render_with = "render_feature")]
struct Feature {
    id: i32,
    #[record(format = "{:?}")]
    name: Option<&'static str>,
}

fn render_feature(feature: &Feature, out: &mut Renderer<'_>) -> Result<(), RenderError> {
    out.scalar("id", format_args!("#{}", feature.id))?;
    out.scalar("name", format_args!("{}", feature.name.unwrap_or("unnamed")))
}

#[derive(Record)]
struct Product {
    sku: u32,
    #[record(nested)]
    feature: Feature,
}

fn main() {
    println!("=== Rendering ===\n");

    let line = Line {
        start: Point { x: 10, y: 20 },
        end: Point { x: 30, y: 40 },
        label: "MainLine",
    };

    // A buffer that is large enough
    let mut buf = [0u8; 128];
    match line.render_into(&mut buf, "myline") {
        Ok(len) => println!("{} bytes: {}", len, String::from_utf8_lossy(&buf[..len])),
        Err(error) => println!("render failed: {error}"),
    }

    // A buffer that is too small keeps the fields that fit
    let mut small = [0u8; 40];
    if let Err(error) = line.render_into(&mut small, "myline") {
        let end = small.iter().position(|&b| b == 0).unwrap_or(small.len());
        println!("{error}; kept: {}", String::from_utf8_lossy(&small[..end]));
    }

    // Custom stringifiers compose with generated ones
    let product = Product {
        sku: 9001,
        feature: Feature {
            id: 101,
            name: Some("SuperSpeed"),
        },
    };
    println!("{}", product.dotted("item"));

    println!("\n=== Logging ===\n");

    // Logfmt lines on standard output
    dotlog::init(Logfmt, StreamSink, Some(OutputStream::Stdout));

    log_error!(&line.start, "bad thing {}", 7);
    log_error!(&product, "feature rollout failed for {} users", 12);
    log_error!(&std::time::Duration::from_secs(3), "no record declared for this type");
    log_error!("just a message");
}
