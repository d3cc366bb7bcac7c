//! Exemplar reservoirs.
use std::{sync::Arc, time::SystemTime};

use opentelemetry::{Context, KeyValue};

use crate::{Exemplar, Value};

mod filtered;
pub use self::filtered::FilteredReservoir;

mod fixed;
pub use self::fixed::FixedSizeReservoir;

mod histogram;
pub use self::histogram::HistogramReservoir;

/// A bounded store of exemplars.
///
/// Reservoirs are handed every measurement that passes the owning pipeline's [`Filter`][crate::Filter], and decide
/// on their own which of those to retain. Collecting a reservoir moves the retained exemplars out and starts a new
/// sampling window.
///
/// Both methods take `&self`: reservoirs are expected to be shared between the threads recording measurements and
/// the thread exporting them.
pub trait Reservoir: Send + Sync {
    /// Offers a measurement to the reservoir.
    ///
    /// `cx` is the context the measurement was taken in, and is used to correlate the exemplar with the active span.
    /// `dropped` holds the measurement's attributes that are not part of the aggregated series.
    fn offer(&self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]);

    /// Collects the retained exemplars into `dest`, replacing its contents.
    fn collect(&self, dest: &mut Vec<Exemplar>);
}

impl<R: Reservoir + ?Sized> Reservoir for Box<R> {
    fn offer(&self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        (**self).offer(cx, time, value, dropped);
    }

    fn collect(&self, dest: &mut Vec<Exemplar>) {
        (**self).collect(dest);
    }
}

impl<R: Reservoir + ?Sized> Reservoir for Arc<R> {
    fn offer(&self, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        (**self).offer(cx, time, value, dropped);
    }

    fn collect(&self, dest: &mut Vec<Exemplar>) {
        (**self).collect(dest);
    }
}

/// A [`Reservoir`] that retains nothing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DropReservoir;

impl Reservoir for DropReservoir {
    fn offer(&self, _cx: &Context, _time: SystemTime, _value: Value, _dropped: &[KeyValue]) {}

    fn collect(&self, dest: &mut Vec<Exemplar>) {
        dest.clear();
    }
}
