//! Writes records to stdout for the downstream metrics pipeline.

use jolokia_gatherer_collector::{
    Accumulator,
    FieldValue,
    GatherError,
    Record,
};
use jolokia_gatherer_config::OutputFormat;
use std::{
    fmt::Write as _,
    io::Write,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    },
};

/// Field name used in line protocol for a value flattened under the empty key.
const SCALAR_FIELD: &str = "value";

/// Formats every record onto `writer`; errors are logged and counted.
pub struct WriterAccumulator<W> {
    format: OutputFormat,
    writer: Mutex<W>,
    errors: AtomicUsize,
}

impl WriterAccumulator<std::io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, std::io::stdout())
    }
}

impl<W: Write + Send> WriterAccumulator<W> {
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer: Mutex::new(writer),
            errors: AtomicUsize::new(0),
        }
    }

    /// Errors reported since the last call.
    pub fn take_error_count(&self) -> usize {
        self.errors.swap(0, Ordering::Relaxed)
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap()
    }

    fn render(&self, record: &Record) -> Option<String> {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(record) {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!(measurement = %record.measurement, "failed to encode record: {e}");
                    None
                }
            },
            OutputFormat::Line => line_protocol(record),
        }
    }
}

impl<W: Write + Send> Accumulator for WriterAccumulator<W> {
    fn add_fields(&self, record: Record) {
        let Some(line) = self.render(&record) else {
            return;
        };
        let mut writer = self.writer.lock().unwrap();
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            error!("failed to write record: {e}");
        }
    }

    fn add_error(&self, error: GatherError) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        warn!(kind = error.kind(), "{error}");
    }
}

/// Renders `record` as one InfluxDB line protocol line, or `None` when nothing in it can be
/// represented (no finite field).
pub fn line_protocol(record: &Record) -> Option<String> {
    let mut line = escape(&record.measurement, &[',', ' ']);

    for (key, value) in &record.tags {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        let _ = write!(line, ",{}={}", escape(key, &[',', '=', ' ']), escape(value, &[',', '=', ' ']));
    }

    let mut fields = Vec::with_capacity(record.fields.len());
    for (key, value) in &record.fields {
        let key = if key.is_empty() { SCALAR_FIELD } else { key.as_str() };
        let value = match value {
            FieldValue::Float(v) if v.is_finite() => v.to_string(),
            FieldValue::Float(_) => continue,
            FieldValue::Bool(v) => v.to_string(),
            FieldValue::String(v) => format!("\"{}\"", escape(v, &['"'])),
        };
        fields.push(format!("{}={value}", escape(key, &[',', '=', ' '])));
    }
    if fields.is_empty() {
        debug!(measurement = %record.measurement, "record has no representable field, dropping");
        return None;
    }

    let timestamp = record.timestamp.timestamp_nanos_opt().unwrap_or_default();
    let _ = write!(line, " {} {timestamp}", fields.join(","));
    Some(line)
}

/// Backslash-escapes `special` characters and backslashes themselves.
fn escape(raw: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '\\' || special.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::DateTime;
    use jolokia_gatherer_collector::{
        Fields,
        Tags,
    };
    use pretty_assertions::assert_eq;

    fn record(fields: Fields) -> Record {
        Record {
            measurement: "heap memory,usage".to_string(),
            tags: Tags::from([
                ("HostName".to_string(), "ECS7".to_string()),
                ("URI".to_string(), "127.0.0.1:7016".to_string()),
                ("team".to_string(), "a=b c".to_string()),
                ("empty".to_string(), String::new()),
            ]),
            fields,
            timestamp: DateTime::from_timestamp(1446129191, 0).unwrap(),
        }
    }

    #[test]
    fn line_protocol_escapes_and_orders() {
        let fields = Fields::from([
            ("used".to_string(), FieldValue::Float(203288528.0)),
            ("max".to_string(), FieldValue::Float(-1.5)),
            ("Verbose".to_string(), FieldValue::Bool(false)),
            ("Name".to_string(), FieldValue::String(r#"say "hi""#.to_string())),
        ]);
        assert_eq!(
            line_protocol(&record(fields)).unwrap(),
            r#"heap\ memory\,usage,HostName=ECS7,URI=127.0.0.1:7016,team=a\=b\ c Name="say \"hi\"",Verbose=false,max=-1.5,used=203288528 1446129191000000000"#
        );
    }

    #[test]
    fn line_protocol_names_scalar_field() {
        let fields = Fields::from([(String::new(), FieldValue::Float(5.0))]);
        let line = line_protocol(&record(fields)).unwrap();
        assert!(line.contains(" value=5 "));
    }

    #[test]
    fn line_protocol_drops_unrepresentable_records() {
        assert_eq!(line_protocol(&record(Fields::new())), None);
        let fields = Fields::from([("x".to_string(), FieldValue::Float(f64::NAN))]);
        assert_eq!(line_protocol(&record(fields)), None);
    }

    #[test]
    fn json_lines() {
        let sink = WriterAccumulator::new(OutputFormat::Json, Vec::new());
        sink.add_fields(record(Fields::from([("used".to_string(), FieldValue::Float(4.0))])));
        sink.add_fields(record(Fields::from([("up".to_string(), FieldValue::Bool(true))])));
        let output = String::from_utf8(sink.into_inner()).unwrap();

        let lines: Vec<serde_json::Value> = output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["measurement"], "heap memory,usage");
        assert_eq!(lines[0]["fields"]["used"], 4.0);
        assert_eq!(lines[0]["tags"]["HostName"], "ECS7");
        assert_eq!(lines[0]["timestamp"], "2015-10-29T14:33:11Z");
        assert_eq!(lines[1]["fields"]["up"], true);
    }

    #[test]
    fn errors_are_counted() {
        let sink = WriterAccumulator::new(OutputFormat::Line, Vec::new());
        sink.add_error(GatherError::MissingValue {
            server: "127.0.0.1:7016".to_string(),
            mbean: "java.lang:type=Memory".to_string(),
            attribute: String::new(),
        });
        assert_eq!(sink.take_error_count(), 1);
        assert_eq!(sink.take_error_count(), 0);
        assert!(sink.into_inner().is_empty());
    }
}
