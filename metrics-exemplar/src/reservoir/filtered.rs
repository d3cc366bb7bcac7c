use std::time::SystemTime;

use opentelemetry::{Context, KeyValue};

use crate::{Exemplar, ExemplarFilter, Filter, Reservoir, Value};

/// A reservoir paired with the filter that decides what is offered to it.
///
/// This is the object an aggregator holds for each of its time series: every measurement recorded for the series is
/// passed to [`offer`][FilteredReservoir::offer], and only those passing the filter reach the reservoir. The
/// measurement timestamp is taken after filtering, so filtered-out measurements cost nothing beyond the filter check.
#[derive(Debug)]
pub struct FilteredReservoir<F = ExemplarFilter, R = Box<dyn Reservoir>> {
    filter: F,
    reservoir: R,
}

impl<F, R> FilteredReservoir<F, R>
where
    F: Filter,
    R: Reservoir,
{
    /// Creates a new `FilteredReservoir`.
    pub fn new(filter: F, reservoir: R) -> Self {
        Self { filter, reservoir }
    }

    /// Offers a measurement taken in `cx` to the reservoir, if the filter allows it.
    pub fn offer<V>(&self, cx: &Context, value: V, dropped: &[KeyValue])
    where
        V: Into<Value>,
    {
        if self.filter.should_offer(cx) {
            self.reservoir.offer(cx, SystemTime::now(), value.into(), dropped);
        }
    }

    /// Collects the retained exemplars into `dest`, replacing its contents.
    pub fn collect(&self, dest: &mut Vec<Exemplar>) {
        self.reservoir.collect(dest);
    }

    /// Returns a reference to the filter.
    pub fn filter(&self) -> &F {
        &self.filter
    }

    /// Returns a reference to the reservoir.
    pub fn reservoir(&self) -> &R {
        &self.reservoir
    }
}
