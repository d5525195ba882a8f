//! Line-protocol encoding: `<prefix>,<k>=<v>,... <field>=<value>`.
//!
//! Tag and field text is written verbatim. Commas, spaces and `=` are not
//! escaped, so callers must hand in already-clean identifiers.

use std::fmt::{self, Write};

use super::{MetricSample, MetricValue};

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Fixed { value, places } => write!(f, "{:.*}", *places, value),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Render one sample as a single line (no terminator).
pub fn encode_sample(sample: &MetricSample, out: &mut String) {
    out.push_str(&sample.prefix);
    for (k, v) in &sample.tags {
        let _ = write!(out, ",{k}={v}");
    }
    let _ = write!(out, " {}={}", sample.field, sample.value);
}

/// Render a batch: one line per sample, `\n`-joined, no trailing newline.
pub fn encode(samples: &[MetricSample]) -> String {
    let mut out = String::with_capacity(samples.len() * 48);
    for (i, sample) in samples.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        encode_sample(sample, &mut out);
    }
    out
}

// ─── Builder ─────────────────────────────────────────────────────

/// Accumulates samples for one flush, stamping each with the `source`
/// tag ahead of any caller tags.
pub struct MetricBuilder {
    source: String,
    samples: Vec<MetricSample>,
}

impl MetricBuilder {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            samples: Vec::with_capacity(16),
        }
    }

    pub fn add(
        &mut self,
        prefix: &str,
        field: &str,
        value: impl Into<MetricValue>,
        tags: &[(&str, &str)],
    ) {
        let mut all_tags = Vec::with_capacity(tags.len() + 1);
        all_tags.push(("source".to_string(), self.source.clone()));
        all_tags.extend(tags.iter().map(|(k, v)| (k.to_string(), v.to_string())));

        self.samples.push(MetricSample {
            prefix: prefix.to_string(),
            tags: all_tags,
            field: field.to_string(),
            value: value.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn encode(&self) -> String {
        encode(&self.samples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(prefix: &str, tags: &[(&str, &str)], field: &str, value: MetricValue) -> MetricSample {
        MetricSample {
            prefix: prefix.into(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            field: field.into(),
            value,
        }
    }

    #[test]
    fn single_sample_exact_text() {
        let s = sample(
            "request",
            &[("source", "svc1"), ("method", "GET")],
            "total",
            MetricValue::Integer(3),
        );
        assert_eq!(encode(&[s]), "request,source=svc1,method=GET total=3");
    }

    #[test]
    fn batch_is_newline_joined_without_trailer() {
        let batch = vec![
            sample("users", &[("source", "a")], "active", MetricValue::Integer(0)),
            sample("pizza", &[("source", "a")], "revenue", MetricValue::Float(0.0076)),
            sample("system", &[("source", "a")], "cpu_usage", MetricValue::fixed2(12.3456)),
        ];
        let text = encode(&batch);
        assert_eq!(
            text,
            "users,source=a active=0\npizza,source=a revenue=0.0076\nsystem,source=a cpu_usage=12.35"
        );
        assert_eq!(text.lines().count(), 3);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn empty_batch_is_empty_string() {
        assert_eq!(encode(&[]), "");
    }

    #[test]
    fn values_use_natural_text() {
        assert_eq!(MetricValue::Float(20.0).to_string(), "20");
        assert_eq!(MetricValue::Float(12.5).to_string(), "12.5");
        assert_eq!(MetricValue::fixed2(7.0).to_string(), "7.00");
        assert_eq!(MetricValue::Text("ok".into()).to_string(), "ok");
    }

    #[test]
    fn builder_puts_source_first_and_keeps_tag_order() {
        let mut b = MetricBuilder::new("svc1");
        b.add("request", "total", 5u64, &[("zeta", "1"), ("alpha", "2")]);
        b.add("users", "active", 2u64, &[]);
        assert_eq!(
            b.encode(),
            "request,source=svc1,zeta=1,alpha=2 total=5\nusers,source=svc1 active=2"
        );
    }

    #[test]
    fn separators_are_not_escaped() {
        let mut b = MetricBuilder::new("svc 1");
        b.add("request", "total", 1u64, &[("method", "a,b")]);
        assert_eq!(b.encode(), "request,source=svc 1,method=a,b total=1");
    }
}
