//! Error types shared by the graph, the node definitions and the evaluator.

use thiserror::Error;

use crate::graph::{Endpoint, NodeId};
use crate::types::ValueType;

/// Failure of a vector operation on operands of unequal length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VectorError {
    #[error("cannot {op} vectors of length {left} and {right}")]
    DimensionMismatch {
        op: &'static str,
        left: usize,
        right: usize,
    },
}

/// Reason a connection attempt was rejected. A rejected connect never mutates the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("port types differ: output is {output:?}, input is {input:?}")]
    IncompatibleTypes { output: ValueType, input: ValueType },
    #[error("input {0} already has a connection")]
    PortOccupied(Endpoint),
    #[error("a connection needs exactly one output and one input endpoint")]
    DirectionMismatch,
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("{0} does not exist on its node")]
    PortOutOfRange(Endpoint),
}

/// General failure of graph operations and evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node {0} does not exist")]
    NodeNotFound(NodeId),
    #[error("{0} does not exist on its node")]
    PortOutOfRange(Endpoint),
    #[error("unknown node kind '{0}'")]
    UnknownKind(String),
    #[error("invalid parameters for {kind}: {reason}")]
    InvalidParams { kind: &'static str, reason: String },
    #[error("node {0} is not a constant source")]
    NotAConstant(NodeId),
    #[error("node {0} is not a display sink")]
    NotADisplay(NodeId),
    #[error("{kind} takes {expected} inputs, got {found}")]
    Arity {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("value of type {found:?} where {expected:?} was expected")]
    TypeMismatch {
        expected: ValueType,
        found: ValueType,
    },
    #[error(transparent)]
    Vector(#[from] VectorError),
    #[error("cycle detected while evaluating node {node}")]
    CycleDetected { node: NodeId },
}
