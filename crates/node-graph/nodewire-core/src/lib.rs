//! nodewire-core: typed port graph and pull-based evaluation engine.
//!
//! Nodes are spawned from a closed set of [`NodeKind`]s, wired output-to-input through a
//! [`PortGraph`] that enforces type tags and single-producer inputs, and evaluated on demand by
//! pulling values from upstream.

pub mod definition;
pub mod error;
pub mod eval;
pub mod graph;
pub mod node;
pub mod schema;
pub mod types;

pub use definition::{NodeDefinition, NodeKind, NodeParams, PortDirection, PortSpec};
pub use error::{ConnectError, GraphError, VectorError};
pub use graph::{Connection, ConnectionId, Endpoint, NodeId, PortGraph};
pub use node::{DisplayObserver, InputPort, NodeInstance, OutputPort};
pub use schema::registry;
pub use types::{GraphVector, TypeTag, Value, ValueType};
