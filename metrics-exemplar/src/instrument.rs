//! Exemplar sampling for `metrics` handles.
//!
//! These wrappers sit in front of an existing [`HistogramFn`] or [`CounterFn`] implementation: every update is
//! forwarded to the inner handle unchanged, and also offered to a [`FilteredReservoir`] against the current
//! OpenTelemetry context. They can be handed to [`metrics::Histogram::from_arc`] and
//! [`metrics::Counter::from_arc`] like any other handle.
use metrics::{CounterFn, HistogramFn};
use opentelemetry::{Context, KeyValue};

use crate::{Exemplar, FilteredReservoir, Filter, Reservoir};

/// A histogram handle that samples exemplars of the values it records.
pub struct ExemplarHistogram<H, F = crate::ExemplarFilter, R = Box<dyn Reservoir>> {
    inner: H,
    reservoir: FilteredReservoir<F, R>,
    dropped_attributes: Vec<KeyValue>,
}

impl<H, F, R> ExemplarHistogram<H, F, R>
where
    F: Filter,
    R: Reservoir,
{
    /// Creates a new `ExemplarHistogram`.
    ///
    /// `dropped_attributes` are attached to every exemplar sampled by this handle.
    pub fn new(inner: H, reservoir: FilteredReservoir<F, R>, dropped_attributes: Vec<KeyValue>) -> Self {
        Self { inner, reservoir, dropped_attributes }
    }

    /// Collects the exemplars sampled since the last collection into `dest`, replacing its contents.
    pub fn collect_exemplars(&self, dest: &mut Vec<Exemplar>) {
        self.reservoir.collect(dest);
    }

    /// Returns a reference to the wrapped handle.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H, F, R> HistogramFn for ExemplarHistogram<H, F, R>
where
    H: HistogramFn,
    F: Filter,
    R: Reservoir,
{
    fn record(&self, value: f64) {
        self.inner.record(value);
        self.reservoir.offer(&Context::current(), value, &self.dropped_attributes);
    }
}

/// A counter handle that samples exemplars of its increments.
///
/// Increments are sampled as integer values. Absolute updates are forwarded, but not sampled.
pub struct ExemplarCounter<C, F = crate::ExemplarFilter, R = Box<dyn Reservoir>> {
    inner: C,
    reservoir: FilteredReservoir<F, R>,
    dropped_attributes: Vec<KeyValue>,
}

impl<C, F, R> ExemplarCounter<C, F, R>
where
    F: Filter,
    R: Reservoir,
{
    /// Creates a new `ExemplarCounter`.
    ///
    /// `dropped_attributes` are attached to every exemplar sampled by this handle.
    pub fn new(inner: C, reservoir: FilteredReservoir<F, R>, dropped_attributes: Vec<KeyValue>) -> Self {
        Self { inner, reservoir, dropped_attributes }
    }

    /// Collects the exemplars sampled since the last collection into `dest`, replacing its contents.
    pub fn collect_exemplars(&self, dest: &mut Vec<Exemplar>) {
        self.reservoir.collect(dest);
    }

    /// Returns a reference to the wrapped handle.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C, F, R> CounterFn for ExemplarCounter<C, F, R>
where
    C: CounterFn,
    F: Filter,
    R: Reservoir,
{
    fn increment(&self, value: u64) {
        self.inner.increment(value);
        let value = i64::try_from(value).unwrap_or(i64::MAX);
        self.reservoir.offer(&Context::current(), value, &self.dropped_attributes);
    }

    fn absolute(&self, value: u64) {
        self.inner.absolute(value);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    };

    use metrics::{CounterFn, HistogramFn};
    use opentelemetry::KeyValue;

    use super::{ExemplarCounter, ExemplarHistogram};
    use crate::measurement::test_util::{context, TRACE_ID};
    use crate::{AlwaysOnFilter, FilteredReservoir, FixedSizeReservoir, HistogramReservoir, TraceBasedFilter, Value};

    #[derive(Default)]
    struct Recorded {
        count: AtomicU64,
        last: AtomicU64,
    }

    impl HistogramFn for Recorded {
        fn record(&self, value: f64) {
            self.count.fetch_add(1, Ordering::Relaxed);
            self.last.store(value.to_bits(), Ordering::Relaxed);
        }
    }

    impl CounterFn for Recorded {
        fn increment(&self, value: u64) {
            self.count.fetch_add(1, Ordering::Relaxed);
            self.last.fetch_add(value, Ordering::Relaxed);
        }

        fn absolute(&self, value: u64) {
            self.last.store(value, Ordering::Relaxed);
        }
    }

    #[test]
    fn histogram_forwards_and_samples() {
        let reservoir = FilteredReservoir::new(AlwaysOnFilter, HistogramReservoir::new(vec![1.0, 10.0]));
        let histogram = Arc::new(ExemplarHistogram::new(
            Recorded::default(),
            reservoir,
            vec![KeyValue::new("user", "ferris")],
        ));

        let handle = metrics::Histogram::from_arc(Arc::clone(&histogram));
        handle.record(0.5);
        handle.record(5.0);
        handle.record(50.0);
        handle.record(7.0);

        assert_eq!(histogram.inner().count.load(Ordering::Relaxed), 4);
        assert_eq!(f64::from_bits(histogram.inner().last.load(Ordering::Relaxed)), 7.0);

        let mut dest = Vec::new();
        histogram.collect_exemplars(&mut dest);
        let values = dest.iter().map(|e| e.value).collect::<Vec<_>>();
        assert_eq!(values, vec![Value::from(0.5), Value::from(7.0), Value::from(50.0)]);
        assert!(dest.iter().all(|e| e.filtered_attributes == vec![KeyValue::new("user", "ferris")]));
    }

    #[test]
    fn histogram_uses_current_context() {
        let reservoir = FilteredReservoir::new(TraceBasedFilter, FixedSizeReservoir::with_seed(4, 1));
        let histogram = ExemplarHistogram::new(Recorded::default(), reservoir, Vec::new());

        histogram.record(1.0);
        {
            let _guard = context(true).attach();
            histogram.record(2.0);
        }
        histogram.record(3.0);

        assert_eq!(histogram.inner().count.load(Ordering::Relaxed), 3);

        let mut dest = Vec::new();
        histogram.collect_exemplars(&mut dest);
        assert_eq!(dest.len(), 1);
        assert_eq!(dest[0].value, Value::from(2.0));
        assert_eq!(dest[0].trace_id, TRACE_ID.to_vec());
    }

    #[test]
    fn counter_samples_increments_only() {
        let reservoir = FilteredReservoir::new(AlwaysOnFilter, FixedSizeReservoir::with_seed(8, 1));
        let counter = ExemplarCounter::new(Recorded::default(), reservoir, Vec::new());

        counter.increment(3);
        counter.absolute(100);
        counter.increment(u64::MAX);

        let mut dest = Vec::new();
        counter.collect_exemplars(&mut dest);
        let values = dest.iter().map(|e| e.value).collect::<Vec<_>>();
        assert_eq!(values, vec![Value::from(3i64), Value::from(i64::MAX)]);
        assert_eq!(counter.inner().count.load(Ordering::Relaxed), 2);
    }
}
