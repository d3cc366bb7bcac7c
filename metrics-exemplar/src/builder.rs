use std::{num::NonZeroUsize, thread};

use thiserror::Error;
use tracing::debug;

use crate::{
    DropReservoir, ExemplarFilter, FilteredReservoir, FixedSizeReservoir, HistogramReservoir, ParseFilterError,
    Reservoir,
};

const MAX_EXPONENTIAL_HISTOGRAM_RESERVOIR_SIZE: usize = 20;

/// Errors that could occur while building an exemplar reservoir.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The exemplar filter name could not be parsed.
    #[error(transparent)]
    InvalidFilter(#[from] ParseFilterError),

    /// The histogram bucket boundaries cannot be used for bucketing exemplars.
    #[error("invalid histogram boundaries: {reason}")]
    InvalidBoundaries {
        /// Details about why the boundaries are invalid.
        reason: String,
    },

    /// A fixed-size reservoir capacity of zero was requested.
    #[error("fixed-size reservoir capacity must be greater than zero")]
    ZeroCapacity,
}

/// The aggregation a reservoir collects exemplars for.
///
/// Determines which kind of reservoir is used by default.
#[derive(Clone, Debug, PartialEq)]
pub enum Aggregation {
    /// Values are summed.
    Sum,

    /// Only the last value is kept.
    LastValue,

    /// Values are counted into buckets with explicit boundaries.
    ExplicitBucketHistogram {
        /// Bucket boundaries.
        boundaries: Vec<f64>,
    },

    /// Values are counted into base-2 exponential buckets.
    Base2ExponentialHistogram {
        /// Maximum number of buckets.
        max_size: u32,
    },
}

/// Returns the default reservoir for the given aggregation.
///
/// - explicit bucket histograms with at least one boundary get a [`HistogramReservoir`] over their boundaries
/// - exponential histograms get a [`FixedSizeReservoir`] holding the smaller of their maximum bucket count and 20
/// - everything else gets a [`FixedSizeReservoir`] sized to the available parallelism of the machine
pub fn default_reservoir(aggregation: &Aggregation) -> Box<dyn Reservoir> {
    select_reservoir(aggregation, None, None)
}

fn select_reservoir(aggregation: &Aggregation, fixed_size: Option<usize>, seed: Option<u64>) -> Box<dyn Reservoir> {
    let fixed = |capacity: usize| -> Box<dyn Reservoir> {
        match seed {
            Some(seed) => Box::new(FixedSizeReservoir::with_seed(capacity, seed)),
            None => Box::new(FixedSizeReservoir::new(capacity)),
        }
    };

    match aggregation {
        Aggregation::ExplicitBucketHistogram { boundaries } if !boundaries.is_empty() => {
            Box::new(HistogramReservoir::new(boundaries.clone()))
        }
        Aggregation::Base2ExponentialHistogram { max_size } => {
            fixed((*max_size as usize).clamp(1, MAX_EXPONENTIAL_HISTOGRAM_RESERVOIR_SIZE))
        }
        _ => fixed(fixed_size.unwrap_or_else(|| {
            thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1)
        })),
    }
}

/// Builder for exemplar reservoirs.
///
/// Produces one [`FilteredReservoir`] per call to [`build`][ExemplarBuilder::build], so a single builder can be kept
/// around by an aggregator and used for every time series it creates.
#[derive(Clone, Debug, Default)]
pub struct ExemplarBuilder {
    filter: ExemplarFilter,
    fixed_size_capacity: Option<usize>,
    seed: Option<u64>,
}

impl ExemplarBuilder {
    /// Creates a new `ExemplarBuilder` with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the exemplar filter.
    ///
    /// When the filter is [`ExemplarFilter::AlwaysOff`], built reservoirs retain nothing and allocate no storage.
    ///
    /// Defaults to [`ExemplarFilter::TraceBased`].
    #[must_use]
    pub fn with_filter(mut self, filter: ExemplarFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the exemplar filter by name.
    ///
    /// Accepts the names `always_on`, `always_off`, and `trace_based`, matched case-insensitively.
    ///
    /// # Errors
    ///
    /// If the name is not one of the above, an error will be returned.
    pub fn with_filter_name<N>(mut self, name: N) -> Result<Self, BuildError>
    where
        N: AsRef<str>,
    {
        self.filter = name.as_ref().parse()?;
        Ok(self)
    }

    /// Sets the capacity of fixed-size reservoirs built for sums, last-value aggregations, and explicit bucket
    /// histograms without any boundaries.
    ///
    /// Explicit bucket histograms with boundaries and exponential histograms are not affected.
    ///
    /// Defaults to the available parallelism of the machine.
    #[must_use]
    pub fn with_fixed_size_capacity(mut self, capacity: usize) -> Self {
        self.fixed_size_capacity = Some(capacity);
        self
    }

    /// Seeds the random number generator of every fixed-size reservoir built.
    ///
    /// Every reservoir built from this builder makes the same sequence of sampling decisions, which is mainly useful
    /// for tests.
    ///
    /// Defaults to seeding each reservoir from the thread-local generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the configured exemplar filter.
    pub fn filter(&self) -> ExemplarFilter {
        self.filter
    }

    /// Builds a reservoir for the given aggregation.
    ///
    /// # Errors
    ///
    /// If the aggregation is an explicit bucket histogram with a NaN boundary, or a fixed-size capacity of zero was
    /// configured, an error will be returned.
    pub fn build(&self, aggregation: &Aggregation) -> Result<FilteredReservoir, BuildError> {
        if let Aggregation::ExplicitBucketHistogram { boundaries } = aggregation {
            if let Some(idx) = boundaries.iter().position(|bound| bound.is_nan()) {
                return Err(BuildError::InvalidBoundaries { reason: format!("boundary at index {idx} is NaN") });
            }
        }

        if self.fixed_size_capacity == Some(0) {
            return Err(BuildError::ZeroCapacity);
        }

        let reservoir: Box<dyn Reservoir> = if self.filter == ExemplarFilter::AlwaysOff {
            Box::new(DropReservoir)
        } else {
            select_reservoir(aggregation, self.fixed_size_capacity, self.seed)
        };

        debug!(filter = %self.filter, ?aggregation, "Built exemplar reservoir.");
        Ok(FilteredReservoir::new(self.filter, reservoir))
    }
}
