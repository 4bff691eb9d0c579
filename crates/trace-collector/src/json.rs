//! Chrome Trace Event JSON emitter: a straightforward serializer over a
//! [`SamplesSnapshot`], so a snapshot can be fed directly into
//! `chrome://tracing` or the Perfetto UI without a separate tool.

use crate::sample::TimePoint;
use crate::snapshot::SamplesSnapshot;
use serde_json::{json, Map, Number, Value};
use std::str::FromStr;

/// Escapes `"` and `\` in strings destined for the emitted JSON, so a
/// category or span name containing a quote can't produce invalid JSON.
fn escape(s: &str) -> String {
    if !s.contains(['"', '\\']) {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len() + 4);
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

/// Formats a timestamp as integer microseconds, a decimal point, and
/// exactly three zero-padded digits of remainder nanoseconds, preserving
/// sub-microsecond precision that a plain `f64` would round away.
/// `serde_json`'s `arbitrary_precision` feature is enabled in this
/// crate's `Cargo.toml` specifically so this exact decimal text
/// round-trips through `Value` unchanged rather than being reparsed into
/// a lossy `f64`.
fn format_timestamp(ts: TimePoint) -> Number {
    let (micros, nanos_remainder) = ts.as_micros_fractional();
    Number::from_str(&format!("{micros}.{nanos_remainder:03}"))
        .expect("a fixed integer.3-digit-fraction string is always a well-formed JSON number")
}

/// Builds the minimal Chrome Trace Event JSON object: `{"traceEvents":
/// [...]}`, one metadata event per named thread followed by one
/// Begin/End event per sample. `pid` is fixed at `0` — this crate has no
/// concept of a process id worth distinguishing.
pub fn to_chrome_trace_json(snapshot: &SamplesSnapshot) -> Value {
    let mut events = Vec::with_capacity(snapshot.size() + snapshot.thread_ids().len());

    for tid in snapshot.thread_ids() {
        if let Some(name) = snapshot.thread_name(tid) {
            if !name.is_empty() {
                events.push(json!({
                    "ph": "M",
                    "pid": 0,
                    "tid": tid,
                    "name": "thread_name",
                    "args": { "name": escape(name) },
                }));
            }
        }
    }

    for sample in snapshot.samples() {
        let mut event = Map::new();
        event.insert(
            "ph".to_string(),
            Value::String(sample.kind.phase_char().to_string()),
        );
        event.insert("cat".to_string(), Value::String(escape(sample.category)));
        event.insert("name".to_string(), Value::String(escape(sample.name)));
        event.insert(
            "tid".to_string(),
            Value::Number(Number::from(sample.thread_id)),
        );
        event.insert(
            "ts".to_string(),
            Value::Number(format_timestamp(sample.timestamp)),
        );
        event.insert("pid".to_string(), Value::Number(Number::from(0u64)));
        events.push(Value::Object(event));
    }

    json!({ "traceEvents": events })
}
