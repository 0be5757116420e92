//! Value types that flow through ports.
//!
//! The set of types is closed: every [`ValueType`] carries a [`TypeTag`] used to gate
//! connections and a zero value used as its canonical default.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VectorError;

/// Compatibility marker of a port. Two ports may be linked only when their tags are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TypeTag(&'static str);

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    Vector,
}

impl ValueType {
    pub const ALL: [ValueType; 2] = [ValueType::Number, ValueType::Vector];

    pub fn tag(self) -> TypeTag {
        match self {
            ValueType::Number => TypeTag("number"),
            ValueType::Vector => TypeTag("vector"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Number => "Number",
            ValueType::Vector => "Vector",
        }
    }

    /// Handle color used by the canvas. A rendering hint only; `connect` decides on tags.
    pub fn color(self) -> &'static str {
        match self {
            ValueType::Number => "#f00",
            ValueType::Vector => "#ff0",
        }
    }

    pub fn zero(self) -> Value {
        match self {
            ValueType::Number => Value::Number(0.0),
            ValueType::Vector => Value::Vector(GraphVector::default()),
        }
    }

    /// Resolve a type from its tag or display name, ignoring case.
    pub fn from_name(name: &str) -> Option<ValueType> {
        ValueType::ALL.into_iter().find(|ty| {
            ty.tag().as_str().eq_ignore_ascii_case(name) || ty.name().eq_ignore_ascii_case(name)
        })
    }
}

/// A runtime value carried on a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Vector(GraphVector),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::Vector(_) => ValueType::Vector,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Vector(_) => None,
        }
    }

    pub fn as_vector(&self) -> Option<&GraphVector> {
        match self {
            Value::Vector(v) => Some(v),
            Value::Number(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<GraphVector> for Value {
    fn from(v: GraphVector) -> Self {
        Value::Vector(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Vector(v) => write!(f, "{v}"),
        }
    }
}

/// Ordered list of scalars whose length is fixed when it is built.
///
/// Operations over two vectors require equal lengths and fail with
/// [`VectorError::DimensionMismatch`] otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphVector(Vec<f64>);

impl GraphVector {
    pub fn new(components: Vec<f64>) -> Self {
        GraphVector(components)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> &[f64] {
        &self.0
    }

    pub fn component(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    // Missing components read as zero.
    pub fn x(&self) -> f64 {
        self.component(0).unwrap_or(0.0)
    }

    pub fn y(&self) -> f64 {
        self.component(1).unwrap_or(0.0)
    }

    pub fn z(&self) -> f64 {
        self.component(2).unwrap_or(0.0)
    }

    fn check_len(&self, other: &GraphVector, op: &'static str) -> Result<(), VectorError> {
        if self.len() == other.len() {
            Ok(())
        } else {
            Err(VectorError::DimensionMismatch {
                op,
                left: self.len(),
                right: other.len(),
            })
        }
    }

    pub fn add(&self, other: &GraphVector) -> Result<GraphVector, VectorError> {
        self.check_len(other, "add")?;
        Ok(self.zip_with(other, |a, b| a + b))
    }

    pub fn sub(&self, other: &GraphVector) -> Result<GraphVector, VectorError> {
        self.check_len(other, "subtract")?;
        Ok(self.zip_with(other, |a, b| a - b))
    }

    pub fn dot(&self, other: &GraphVector) -> Result<f64, VectorError> {
        self.check_len(other, "take the dot product of")?;
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }

    pub fn scale(&self, s: f64) -> GraphVector {
        GraphVector(self.0.iter().map(|c| c * s).collect())
    }

    pub fn norm_squared(&self) -> f64 {
        self.0.iter().map(|c| c * c).sum()
    }

    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Keep at most the first `len` components.
    pub fn truncate(&self, len: usize) -> GraphVector {
        GraphVector(self.0.iter().take(len).copied().collect())
    }

    /// Exactly `len` components: extra ones are dropped, missing ones are zero.
    pub fn resized(&self, len: usize) -> GraphVector {
        GraphVector((0..len).map(|i| self.component(i).unwrap_or(0.0)).collect())
    }

    fn zip_with(&self, other: &GraphVector, op: impl Fn(f64, f64) -> f64) -> GraphVector {
        GraphVector(self.0.iter().zip(&other.0).map(|(a, b)| op(*a, *b)).collect())
    }
}

impl From<Vec<f64>> for GraphVector {
    fn from(components: Vec<f64>) -> Self {
        GraphVector(components)
    }
}

impl<const N: usize> From<[f64; N]> for GraphVector {
    fn from(components: [f64; N]) -> Self {
        GraphVector(components.to_vec())
    }
}

impl fmt::Display for GraphVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{c}")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_distinct_per_type() {
        assert_ne!(ValueType::Number.tag(), ValueType::Vector.tag());
        assert_eq!(ValueType::Number.tag(), ValueType::Number.tag());
    }

    #[test]
    fn zero_values_match_their_type() {
        for ty in ValueType::ALL {
            assert_eq!(ty.zero().value_type(), ty);
        }
        assert_eq!(ValueType::Vector.zero(), Value::Vector(GraphVector::default()));
    }

    #[test]
    fn from_name_accepts_tag_and_label() {
        assert_eq!(ValueType::from_name("vector"), Some(ValueType::Vector));
        assert_eq!(ValueType::from_name("Number"), Some(ValueType::Number));
        assert_eq!(ValueType::from_name("matrix"), None);
    }

    #[test]
    fn vector_arithmetic() {
        let a = GraphVector::from([1.0, 2.0, 3.0]);
        let b = GraphVector::from([4.0, 5.0, 6.0]);
        assert_eq!(a.add(&b).unwrap(), GraphVector::from([5.0, 7.0, 9.0]));
        assert_eq!(b.sub(&a).unwrap(), GraphVector::from([3.0, 3.0, 3.0]));
        assert_eq!(a.dot(&b).unwrap(), 32.0);
        assert_eq!(a.scale(2.0), GraphVector::from([2.0, 4.0, 6.0]));
        assert_eq!(GraphVector::from([3.0, 4.0]).norm(), 5.0);
    }

    #[test]
    fn unequal_lengths_are_rejected() {
        let a = GraphVector::from([1.0, 2.0]);
        let b = GraphVector::from([1.0, 2.0, 3.0]);
        let err = a.dot(&b).unwrap_err();
        assert_eq!(
            err,
            VectorError::DimensionMismatch {
                op: "take the dot product of",
                left: 2,
                right: 3
            }
        );
        assert!(a.add(&b).is_err());
        assert!(a.sub(&b).is_err());
    }

    #[test]
    fn truncate_and_resize() {
        let v = GraphVector::from([1.0, 2.0, 3.0]);
        assert_eq!(v.truncate(2), GraphVector::from([1.0, 2.0]));
        assert_eq!(v.truncate(5), v);
        assert_eq!(
            GraphVector::from([1.0]).resized(3),
            GraphVector::from([1.0, 0.0, 0.0])
        );
        assert_eq!(GraphVector::from([1.0]).z(), 0.0);
    }

    #[test]
    fn display_matches_canvas_labels() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(
            Value::Vector(GraphVector::from([1.0, 2.5, 3.0])).to_string(),
            "[1, 2.5, 3]"
        );
    }

    #[test]
    fn values_serialize_as_plain_json() {
        let json = serde_json::to_string(&Value::Vector(GraphVector::from([1.0, 2.0]))).unwrap();
        assert_eq!(json, "[1.0,2.0]");
        let parsed: Value = serde_json::from_str("3").unwrap();
        assert_eq!(parsed, Value::Number(3.0));
        let parsed: Value = serde_json::from_str("[1, 2]").unwrap();
        assert_eq!(parsed, Value::Vector(GraphVector::from([1.0, 2.0])));
    }
}
