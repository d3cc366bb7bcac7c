//! Measurement values.

/// The kind of number held by a [`Value`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No value has been set.
    ///
    /// This is the kind of [`Value::default`], and is never produced by converting a number.
    #[default]
    Unknown,

    /// A 64-bit signed integer.
    Int64,

    /// A 64-bit floating point number.
    Float64,
}

/// A measurement value, either a 64-bit integer or a 64-bit float.
///
/// Values are stored as their raw 64-bit pattern alongside a tag describing how to interpret it. The typed accessors
/// are lenient: reading a value as the wrong kind returns zero instead of failing, so callers that care about the
/// distinction should check [`value_type`][Value::value_type] first.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Value {
    kind: ValueType,
    bits: u64,
}

impl Value {
    /// Creates a `Value` holding the given integer.
    pub const fn from_i64(value: i64) -> Self {
        Self { kind: ValueType::Int64, bits: value as u64 }
    }

    /// Creates a `Value` holding the given float.
    pub fn from_f64(value: f64) -> Self {
        Self { kind: ValueType::Float64, bits: value.to_bits() }
    }

    /// Returns the kind of number held by this value.
    pub const fn value_type(&self) -> ValueType {
        self.kind
    }

    /// Returns the value as an integer, or `0` if it does not hold an integer.
    pub const fn as_i64(&self) -> i64 {
        match self.kind {
            ValueType::Int64 => self.bits as i64,
            _ => 0,
        }
    }

    /// Returns the value as a float, or `0.0` if it does not hold a float.
    pub fn as_f64(&self) -> f64 {
        match self.kind {
            ValueType::Float64 => f64::from_bits(self.bits),
            _ => 0.0,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::from_i64(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::from_f64(value)
    }
}
