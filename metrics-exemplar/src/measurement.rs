//! Sampled measurements and the exemplars produced from them.
use std::time::SystemTime;

use opentelemetry::{
    trace::{SpanContext, SpanId, TraceContextExt as _, TraceId},
    Context, KeyValue,
};

use crate::Value;

/// A measurement retained by a reservoir, ready for export.
///
/// `trace_id` and `span_id` hold the 16-byte trace identifier and 8-byte span identifier of the span that was active
/// when the measurement was offered. Both are empty when no sampled span was active.
#[derive(Clone, Debug, PartialEq)]
pub struct Exemplar {
    /// Attributes of the measurement that were dropped by the aggregation it belongs to.
    pub filtered_attributes: Vec<KeyValue>,

    /// The time the measurement was offered.
    pub time: SystemTime,

    /// The measured value.
    pub value: Value,

    /// Trace identifier of the active span, or empty.
    pub trace_id: Vec<u8>,

    /// Span identifier of the active span, or empty.
    pub span_id: Vec<u8>,
}

impl Default for Exemplar {
    fn default() -> Self {
        Self {
            filtered_attributes: Vec::new(),
            time: SystemTime::UNIX_EPOCH,
            value: Value::default(),
            trace_id: Vec::new(),
            span_id: Vec::new(),
        }
    }
}

/// A single reservoir slot.
///
/// Slots are allocated once and then overwritten in place. A slot that has never been written, or that was
/// invalidated by a drain, is skipped during collection.
#[derive(Debug)]
pub(crate) struct Measurement {
    dropped_attributes: Vec<KeyValue>,
    time: SystemTime,
    value: Value,
    span_context: SpanContext,
    valid: bool,
}

impl Measurement {
    pub(crate) fn empty() -> Self {
        Self {
            dropped_attributes: Vec::new(),
            time: SystemTime::UNIX_EPOCH,
            value: Value::default(),
            span_context: SpanContext::empty_context(),
            valid: false,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.valid
    }

    /// Overwrites this slot, reusing its attribute buffer.
    pub(crate) fn record(&mut self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        self.dropped_attributes.clear();
        self.dropped_attributes.extend_from_slice(dropped);
        self.time = time;
        self.value = value;
        self.span_context.clone_from(cx.span().span_context());
        self.valid = true;
    }

    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Writes this measurement into `dest`, reusing the buffers `dest` already owns.
    pub(crate) fn write_exemplar(&self, dest: &mut Exemplar) {
        dest.filtered_attributes.clear();
        dest.filtered_attributes.extend_from_slice(&self.dropped_attributes);
        dest.time = self.time;
        dest.value = self.value;

        dest.trace_id.clear();
        dest.span_id.clear();
        if self.span_context.is_sampled() {
            let trace_id = self.span_context.trace_id();
            if trace_id != TraceId::INVALID {
                dest.trace_id.extend_from_slice(&trace_id.to_bytes());
            }

            let span_id = self.span_context.span_id();
            if span_id != SpanId::INVALID {
                dest.span_id.extend_from_slice(&span_id.to_bytes());
            }
        }
    }

    pub(crate) fn to_exemplar(&self) -> Exemplar {
        let mut exemplar = Exemplar::default();
        self.write_exemplar(&mut exemplar);
        exemplar
    }
}
