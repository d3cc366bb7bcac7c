//! Exemplar filters.
//!
//! A filter decides whether a measurement is offered to a reservoir at all. Filtering is the job of whatever owns the
//! reservoir, such as [`FilteredReservoir`][crate::FilteredReservoir]; reservoirs themselves accept everything they
//! are offered.
use std::{fmt, str::FromStr};

use opentelemetry::{trace::TraceContextExt as _, Context};
use thiserror::Error;

/// Decides whether a measurement taken in a given context should be offered to a reservoir.
pub trait Filter: Send + Sync {
    /// Returns `true` if a measurement taken in `cx` should be offered to a reservoir.
    fn should_offer(&self, cx: &Context) -> bool;
}

/// A [`Filter`] that offers every measurement.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AlwaysOnFilter;

impl Filter for AlwaysOnFilter {
    fn should_offer(&self, _cx: &Context) -> bool {
        true
    }
}

/// A [`Filter`] that offers no measurements.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AlwaysOffFilter;

impl Filter for AlwaysOffFilter {
    fn should_offer(&self, _cx: &Context) -> bool {
        false
    }
}

/// A [`Filter`] that offers measurements taken while a sampled span is active.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TraceBasedFilter;

impl Filter for TraceBasedFilter {
    fn should_offer(&self, cx: &Context) -> bool {
        cx.span().span_context().is_sampled()
    }
}

/// Error returned when parsing an unknown [`ExemplarFilter`] name.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
#[error("unknown exemplar filter `{name}`, expected one of `always_on`, `always_off`, or `trace_based`")]
pub struct ParseFilterError {
    name: String,
}

/// One of the built-in filters, selectable by name.
///
/// The names are the ones used by OpenTelemetry configuration: `always_on`, `always_off`, and `trace_based`.
///
/// Defaults to [`ExemplarFilter::TraceBased`].
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ExemplarFilter {
    /// Behaves like [`AlwaysOnFilter`].
    AlwaysOn,

    /// Behaves like [`AlwaysOffFilter`].
    AlwaysOff,

    /// Behaves like [`TraceBasedFilter`].
    #[default]
    TraceBased,
}

impl ExemplarFilter {
    /// Returns the configuration name of this filter.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExemplarFilter::AlwaysOn => "always_on",
            ExemplarFilter::AlwaysOff => "always_off",
            ExemplarFilter::TraceBased => "trace_based",
        }
    }
}

impl Filter for ExemplarFilter {
    fn should_offer(&self, cx: &Context) -> bool {
        match self {
            ExemplarFilter::AlwaysOn => AlwaysOnFilter.should_offer(cx),
            ExemplarFilter::AlwaysOff => AlwaysOffFilter.should_offer(cx),
            ExemplarFilter::TraceBased => TraceBasedFilter.should_offer(cx),
        }
    }
}

impl fmt::Display for ExemplarFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExemplarFilter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("always_on") {
            Ok(ExemplarFilter::AlwaysOn)
        } else if name.eq_ignore_ascii_case("always_off") {
            Ok(ExemplarFilter::AlwaysOff)
        } else if name.eq_ignore_ascii_case("trace_based") {
            Ok(ExemplarFilter::TraceBased)
        } else {
            Err(ParseFilterError { name: name.to_string() })
        }
    }
}
