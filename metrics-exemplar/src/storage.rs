//! Fixed-capacity measurement storage.
use std::time::SystemTime;

use opentelemetry::{Context, KeyValue};
use parking_lot::{Mutex, MutexGuard};

use crate::{measurement::Measurement, Exemplar, Value};

/// A fixed number of measurement slots, each guarded by its own lock.
///
/// `Storage` is the building block reservoirs keep their samples in. Its length is set at construction and never
/// changes. Writes to different slots do not contend with each other, and collection locks one slot at a time, so a
/// reader always observes a complete measurement.
///
/// Reservoirs decide *which* slot a measurement goes into; `Storage` only holds them.
#[derive(Debug)]
pub struct Storage {
    slots: Box<[Mutex<Measurement>]>,
}

impl Storage {
    /// Creates a new `Storage` with `len` empty slots.
    pub fn new(len: usize) -> Self {
        let slots = (0..len).map(|_| Mutex::new(Measurement::empty())).collect::<Vec<_>>();
        Self { slots: slots.into_boxed_slice() }
    }

    /// Returns the number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if this storage has no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Overwrites the slot at `idx` with the given measurement.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub fn store(&self, idx: usize, cx: &Context, time: SystemTime, value: Value, dropped: &[KeyValue]) {
        self.lock(idx).record(cx, time, value, dropped);
    }

    /// Locks the slot at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub(crate) fn lock(&self, idx: usize) -> MutexGuard<'_, Measurement> {
        self.slots[idx].lock()
    }

    /// Copies every occupied slot into `dest`.
    ///
    /// `dest` is overwritten: on return it holds exactly the collected exemplars, in slot order. Entries already in
    /// `dest` are reused, as is its allocated capacity, so collecting into the same buffer on every export does not
    /// allocate once the buffer has grown to size.
    ///
    /// The slots themselves are left untouched.
    pub fn collect(&self, dest: &mut Vec<Exemplar>) {
        self.collect_inner(dest, false);
    }

    /// Copies every occupied slot into `dest`, then marks every slot empty.
    ///
    /// Behaves like [`collect`][Storage::collect], except that a slot is emptied while its lock is still held, so a
    /// measurement is either part of this collection or of the next one, never both.
    pub fn drain(&self, dest: &mut Vec<Exemplar>) {
        self.collect_inner(dest, true);
    }

    fn collect_inner(&self, dest: &mut Vec<Exemplar>, invalidate: bool) {
        let mut n = 0;
        for slot in self.slots.iter() {
            let mut measurement = slot.lock();
            if !measurement.is_valid() {
                continue;
            }

            if n < dest.len() {
                measurement.write_exemplar(&mut dest[n]);
            } else {
                dest.push(measurement.to_exemplar());
            }
            n += 1;

            if invalidate {
                measurement.invalidate();
            }
        }
        dest.truncate(n);
    }
}
