//! Text exposition that tolerates metric families without samples.

use std::io::Write;

use prometheus::proto::{MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Encodes `families` in the Prometheus text format, in the given order.
///
/// `TextEncoder` refuses families without samples. Those are written as their
/// `# HELP` and `# TYPE` lines alone, so a scrape still advertises metrics that have
/// no data yet.
pub fn encode(families: &[MetricFamily]) -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    for family in families {
        if family.get_metric().is_empty() {
            write_description(family, &mut buffer)?;
        } else {
            encoder.encode(std::slice::from_ref(family), &mut buffer)?;
        }
    }

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

fn write_description(family: &MetricFamily, buffer: &mut Vec<u8>) -> std::io::Result<()> {
    let name = family.get_name();
    if !family.get_help().is_empty() {
        writeln!(buffer, "# HELP {} {}", name, escape_help(family.get_help()))?;
    }
    writeln!(buffer, "# TYPE {} {}", name, type_name(family.get_field_type()))
}

fn escape_help(help: &str) -> String {
    help.replace('\\', r"\\").replace('\n', r"\n")
}

fn type_name(kind: MetricType) -> &'static str {
    match kind {
        MetricType::COUNTER => "counter",
        MetricType::GAUGE => "gauge",
        MetricType::HISTOGRAM => "histogram",
        MetricType::SUMMARY => "summary",
        MetricType::UNTYPED => "untyped",
    }
}
