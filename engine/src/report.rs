//! Utilities for structured reporting of algorithm runs.
//!
//! Key/value pairs reported through the `report!` macro are collected in a
//! thread local JSON object and printed to stdout when the guard returned by
//! `enable_reporting` is dropped. Without the guard, reporting is a no-op,
//! so library code can report unconditionally. With the `report-to-stderr`
//! feature, reported keys are additionally echoed to stderr as they happen.

use serde_json::{Map, Value};
use std::cell::RefCell;

pub use serde_json::json;

pub mod benchmark;
pub use benchmark::*;

#[derive(Debug, Default)]
struct Reporter {
    values: Map<String, Value>,
}

thread_local! {
    static REPORTER: RefCell<Option<Reporter>> = RefCell::new(None);
}

pub fn report(key: String, val: Value) {
    if cfg!(feature = "report-to-stderr") {
        eprintln!("{}: {}", key, val);
    }
    report_silent(key, val)
}

pub fn report_silent(key: String, val: Value) {
    REPORTER.with(|reporter| {
        if let Some(r) = reporter.borrow_mut().as_mut() {
            r.values.insert(key, val);
        }
    });
}

#[macro_export]
macro_rules! report {
    ($k:expr, $($json:tt)+) => { $crate::report::report($k.to_string(), $crate::report::json!($($json)+)) };
}

#[macro_export]
macro_rules! report_silent {
    ($k:expr, $($json:tt)+) => { $crate::report::report_silent($k.to_string(), $crate::report::json!($($json)+)) };
}

/// Prints the collected report as one JSON object on drop.
#[must_use]
pub struct ReportingGuard(());

impl Drop for ReportingGuard {
    fn drop(&mut self) {
        REPORTER.with(|reporter| {
            if let Some(r) = reporter.borrow_mut().take() {
                println!("{}", Value::Object(r.values));
            }
        });
    }
}

pub fn enable_reporting(program: &str) -> ReportingGuard {
    REPORTER.with(|reporter| reporter.replace(Some(Reporter::default())));

    report!("program", program);
    report!("args", std::env::args().collect::<Vec<String>>());

    ReportingGuard(())
}
