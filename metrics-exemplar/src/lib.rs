//! Bounded exemplar reservoirs.
//!
//! An exemplar is a single raw measurement retained next to an aggregated metric, along with the trace and span that
//! were active when it was recorded. Exemplars let an aggregate such as a latency histogram be debugged by jumping
//! from one of its buckets straight to a trace that contributed to it.
//!
//! Since every measurement is a candidate, exemplars are kept in bounded [reservoirs][Reservoir]:
//!
//! - [`FixedSizeReservoir`] keeps a uniform random sample of a fixed size, using reservoir sampling
//! - [`HistogramReservoir`] keeps the most recent measurement for each bucket of a histogram
//!
//! Which measurements are offered to a reservoir in the first place is decided by a [`Filter`]. By default, only
//! measurements taken while a sampled span is active are offered; see [`ExemplarFilter`].
//!
//! # Usage
//!
//! ```
//! use metrics_exemplar::{Aggregation, ExemplarBuilder, ExemplarFilter};
//! use opentelemetry::{Context, KeyValue};
//!
//! // One builder can produce a reservoir for every time series an aggregator tracks.
//! let builder = ExemplarBuilder::new().with_filter(ExemplarFilter::AlwaysOn);
//! let reservoir = builder
//!     .build(&Aggregation::ExplicitBucketHistogram { boundaries: vec![0.1, 0.5, 1.0] })
//!     .expect("failed to build reservoir");
//!
//! // Measurements are offered along with the context they were taken in, and any attributes that the aggregation
//! // does not keep.
//! reservoir.offer(&Context::current(), 0.25, &[KeyValue::new("user", "ferris")]);
//! reservoir.offer(&Context::current(), 0.75, &[]);
//!
//! // Exporters periodically collect the exemplars, which starts a new sampling window.
//! let mut exemplars = Vec::new();
//! reservoir.collect(&mut exemplars);
//! assert_eq!(exemplars.len(), 2);
//! ```
//!
//! # Concurrency
//!
//! All reservoirs are `Send + Sync` and take `&self` for both offering and collecting, so they can be shared between
//! the threads recording measurements and the thread exporting them without further synchronization.
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]
#![deny(missing_docs)]

mod builder;
pub use self::builder::{default_reservoir, Aggregation, BuildError, ExemplarBuilder};

mod filter;
pub use self::filter::{
    AlwaysOffFilter, AlwaysOnFilter, ExemplarFilter, Filter, ParseFilterError, TraceBasedFilter,
};

pub mod instrument;

mod measurement;
pub use self::measurement::Exemplar;

mod reservoir;
pub use self::reservoir::{
    DropReservoir, FilteredReservoir, FixedSizeReservoir, HistogramReservoir, Reservoir,
};

mod storage;
pub use self::storage::Storage;

mod value;
pub use self::value::{Value, ValueType};
