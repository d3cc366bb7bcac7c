use std::time::SystemTime;

use opentelemetry::{Context, KeyValue};
use tracing::debug;

use crate::{Exemplar, Reservoir, Storage, Value, ValueType};

/// A reservoir holding the most recent measurement for each bucket of a histogram.
///
/// A histogram with `n` bucket boundaries has `n + 1` buckets: one for each boundary, holding the values less than or
/// equal to that boundary and greater than the previous one, plus an overflow bucket for the values greater than the
/// last boundary. The reservoir keeps one slot per bucket and every offer overwrites the slot of the bucket its value
/// falls into, so the collected exemplars are the last measurement seen for each bucket since the previous
/// collection.
#[derive(Debug)]
pub struct HistogramReservoir {
    storage: Storage,
    bounds: Box<[f64]>,
}

impl HistogramReservoir {
    /// Creates a new `HistogramReservoir` for the given bucket boundaries.
    ///
    /// The boundaries are sorted in ascending order if they are not already. NaN boundaries are discarded.
    pub fn new<B>(bounds: B) -> Self
    where
        B: Into<Vec<f64>>,
    {
        let mut bounds = bounds.into();
        bounds.retain(|bound| !bound.is_nan());
        bounds.sort_unstable_by(f64::total_cmp);

        debug!(buckets = bounds.len() + 1, "Creating histogram exemplar reservoir.");
        Self { storage: Storage::new(bounds.len() + 1), bounds: bounds.into_boxed_slice() }
    }

    /// Returns the bucket boundaries, in ascending order.
    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Returns the index of the bucket `x` falls into.
    fn bucket_index(&self, x: f64) -> usize {
        self.bounds.partition_point(|bound| *bound < x)
    }
}

impl Reservoir for HistogramReservoir {
    /// Overwrites the exemplar of the bucket `value` falls into.
    ///
    /// # Panics
    ///
    /// Panics if `value` is of type [`ValueType::Unknown`].
    fn offer(&self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        let x = match value.value_type() {
            ValueType::Int64 => value.as_i64() as f64,
            ValueType::Float64 => value.as_f64(),
            ValueType::Unknown => panic!("histogram reservoir offered a value of unknown type"),
        };

        self.storage.store(self.bucket_index(x), cx, time, value, dropped);
    }

    fn collect(&self, dest: &mut Vec<Exemplar>) {
        self.storage.drain(dest);
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use opentelemetry::Context;
    use proptest::prelude::*;

    use super::HistogramReservoir;
    use crate::{Reservoir, Value};

    fn offer(reservoir: &HistogramReservoir, value: impl Into<Value>) {
        reservoir.offer(&Context::new(), SystemTime::now(), value.into(), &[]);
    }

    fn collected_values(reservoir: &HistogramReservoir) -> Vec<Value> {
        let mut dest = Vec::new();
        reservoir.collect(&mut dest);
        dest.into_iter().map(|e| e.value).collect()
    }

    #[test]
    fn one_exemplar_per_bucket() {
        let reservoir = HistogramReservoir::new(vec![1.0, 2.0]);
        assert_eq!(reservoir.bucket_index(0.5), 0);
        assert_eq!(reservoir.bucket_index(1.5), 1);
        assert_eq!(reservoir.bucket_index(2.5), 2);

        offer(&reservoir, 0.5);
        offer(&reservoir, 1.5);
        offer(&reservoir, 2.5);
        offer(&reservoir, 0.6);

        assert_eq!(collected_values(&reservoir), vec![Value::from(0.6), Value::from(1.5), Value::from(2.5)]);
    }

    #[test]
    fn boundary_values_fall_in_lower_bucket() {
        let reservoir = HistogramReservoir::new(vec![1.0, 2.0]);
        assert_eq!(reservoir.bucket_index(1.0), 0);
        assert_eq!(reservoir.bucket_index(2.0), 1);
        assert_eq!(reservoir.bucket_index(f64::INFINITY), 2);
        assert_eq!(reservoir.bucket_index(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn integers_are_bucketed_as_floats() {
        let reservoir = HistogramReservoir::new(vec![10.0, 100.0]);
        offer(&reservoir, 5i64);
        offer(&reservoir, 500i64);

        assert_eq!(collected_values(&reservoir), vec![Value::from(5i64), Value::from(500i64)]);
    }

    #[test]
    fn unsorted_bounds_are_sorted() {
        let reservoir = HistogramReservoir::new(vec![5.0, 1.0, 3.0]);
        assert_eq!(reservoir.bounds(), &[1.0, 3.0, 5.0]);
        assert_eq!(reservoir.bucket_index(2.0), 1);
    }

    #[test]
    fn nan_bounds_are_discarded() {
        let reservoir = HistogramReservoir::new(vec![-f64::NAN, 2.0, f64::NAN, 1.0]);
        assert_eq!(reservoir.bounds(), &[1.0, 2.0]);
        assert_eq!(reservoir.bucket_index(0.5), 0);
        assert_eq!(reservoir.bucket_index(1.5), 1);
        assert_eq!(reservoir.bucket_index(2.5), 2);

        offer(&reservoir, 0.5);
        offer(&reservoir, 1.5);
        offer(&reservoir, 2.5);
        assert_eq!(collected_values(&reservoir), vec![Value::from(0.5), Value::from(1.5), Value::from(2.5)]);
    }

    #[test]
    fn no_bounds_is_a_single_bucket() {
        let reservoir = HistogramReservoir::new(Vec::new());
        offer(&reservoir, -1.0);
        offer(&reservoir, 1.0);
        assert_eq!(collected_values(&reservoir), vec![Value::from(1.0)]);
    }

    #[test]
    fn collect_starts_a_new_window() {
        let reservoir = HistogramReservoir::new(vec![1.0]);
        offer(&reservoir, 0.5);
        offer(&reservoir, 1.5);
        assert_eq!(collected_values(&reservoir).len(), 2);
        assert!(collected_values(&reservoir).is_empty());

        offer(&reservoir, 2.0);
        assert_eq!(collected_values(&reservoir), vec![Value::from(2.0)]);
    }

    #[test]
    #[should_panic(expected = "unknown type")]
    fn unknown_value_panics() {
        let reservoir = HistogramReservoir::new(vec![1.0]);
        offer(&reservoir, Value::default());
    }

    proptest! {
        #[test]
        fn bucket_index_brackets_value(
            mut bounds in proptest::collection::vec(-1_000.0f64..1_000.0, 0..16),
            x in -2_000.0f64..2_000.0,
        ) {
            bounds.sort_unstable_by(f64::total_cmp);
            let reservoir = HistogramReservoir::new(bounds.clone());
            let idx = reservoir.bucket_index(x);

            prop_assert!(idx <= bounds.len());
            if idx < bounds.len() {
                prop_assert!(x <= bounds[idx]);
            }
            if idx > 0 {
                prop_assert!(x > bounds[idx - 1]);
            }
        }
    }
}
