//! The port graph: live node instances and the typed connections between their ports.
//!
//! Every input port holds at most one connection, every output port any number of them, and
//! a connection only ever links an output to an input carrying the same [`TypeTag`]. Each
//! connection is recorded on both of its endpoints; the mutators below keep the two records
//! in step and leave the graph untouched when they reject a request.

use std::fmt;

use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::definition::{NodeKind, NodeParams, PortDirection};
use crate::error::{ConnectError, GraphError};
use crate::node::NodeInstance;
use crate::types::{TypeTag, Value, ValueType};

/// Stable identity of a node. Ids are never reused within one graph.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

/// One side of a connection: a port on a node, addressed by direction and position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub direction: PortDirection,
    pub index: usize,
}

impl Endpoint {
    pub fn input(node: NodeId, index: usize) -> Self {
        Endpoint {
            node,
            direction: PortDirection::Input,
            index,
        }
    }

    pub fn output(node: NodeId, index: usize) -> Self {
        Endpoint {
            node,
            direction: PortDirection::Output,
            index,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} of node {}", self.direction, self.index, self.node)
    }
}

/// A directed edge from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub output: Endpoint,
    pub input: Endpoint,
}

#[derive(Debug, Default)]
pub struct PortGraph {
    pub(crate) nodes: HashMap<NodeId, NodeInstance>,
    next_node: u64,
    next_connection: u64,
}

impl PortGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node of `kind` with every port unconnected.
    pub fn add_node(&mut self, kind: NodeKind, params: NodeParams) -> Result<NodeId, GraphError> {
        let definition = kind.definition(&params)?;
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let node = definition.create_instance(id, params);
        debug!("added {} node {} ({})", kind.type_id(), id, node.label());
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Spawn a node by kind id or sidebar label.
    pub fn spawn(&mut self, kind_name: &str, params: NodeParams) -> Result<NodeId, GraphError> {
        self.add_node(NodeKind::from_name(kind_name)?, params)
    }

    /// Remove a node together with every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        let num_inputs = node.num_inputs();
        let downstream: Vec<Endpoint> = node
            .outputs()
            .iter()
            .flat_map(|port| port.links().iter().map(|conn| conn.input))
            .collect();

        for index in 0..num_inputs {
            self.disconnect_input(id, index)?;
        }
        for input in downstream {
            self.disconnect_input(input.node, input.index)?;
        }
        self.nodes.remove(&id);
        debug!("removed node {id}");
        Ok(())
    }

    /// Remove every node.
    pub fn clear(&mut self) {
        let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        ids.sort();
        for id in ids {
            if let Err(err) = self.remove_node(id) {
                warn!("clear could not remove node {id}: {err}");
            }
        }
    }

    /// Link an output to an input. Returns `false`, leaving the graph unchanged, when the link
    /// is not allowed. See [`PortGraph::try_connect`] for the reason.
    pub fn connect(&mut self, a: Endpoint, b: Endpoint) -> bool {
        match self.try_connect(a, b) {
            Ok(_) => true,
            Err(err) => {
                debug!("connect rejected: {err}");
                false
            }
        }
    }

    /// Link an output to an input, accepting the two endpoints in either order.
    pub fn try_connect(&mut self, a: Endpoint, b: Endpoint) -> Result<Connection, ConnectError> {
        let (output, input) = match (a.direction, b.direction) {
            (PortDirection::Output, PortDirection::Input) => (a, b),
            (PortDirection::Input, PortDirection::Output) => (b, a),
            _ => return Err(ConnectError::DirectionMismatch),
        };

        let out_node = self
            .nodes
            .get(&output.node)
            .ok_or(ConnectError::NodeNotFound(output.node))?;
        let out_type = out_node
            .output_type(output.index)
            .ok_or(ConnectError::PortOutOfRange(output))?;
        let in_node = self
            .nodes
            .get(&input.node)
            .ok_or(ConnectError::NodeNotFound(input.node))?;
        let in_type = in_node
            .input_type(input.index)
            .ok_or(ConnectError::PortOutOfRange(input))?;

        if in_node.inputs[input.index].link().is_some() {
            return Err(ConnectError::PortOccupied(input));
        }
        if out_type.tag() != in_type.tag() {
            return Err(ConnectError::IncompatibleTypes {
                output: out_type,
                input: in_type,
            });
        }

        let conn = Connection {
            id: ConnectionId(self.next_connection),
            output,
            input,
        };
        self.next_connection += 1;
        // Both lookups succeeded above and nothing was removed since.
        if let Some(node) = self.nodes.get_mut(&input.node) {
            node.inputs[input.index].attach(conn);
        }
        if let Some(node) = self.nodes.get_mut(&output.node) {
            node.outputs[output.index].attach(conn);
        }
        debug!("connected {output} -> {input}");
        Ok(conn)
    }

    /// Drop the connection feeding `index` on `node`, if any, and return it.
    ///
    /// A display sink losing its input also loses its observed value.
    pub fn disconnect_input(
        &mut self,
        node: NodeId,
        index: usize,
    ) -> Result<Option<Connection>, GraphError> {
        let target = self
            .nodes
            .get_mut(&node)
            .ok_or(GraphError::NodeNotFound(node))?;
        let port = target
            .inputs
            .get_mut(index)
            .ok_or(GraphError::PortOutOfRange(Endpoint::input(node, index)))?;
        let Some(conn) = port.detach() else {
            return Ok(None);
        };
        if let Some(state) = target.display_state_mut() {
            state.set(None);
        }
        if let Some(source) = self.nodes.get_mut(&conn.output.node) {
            if let Some(port) = source.outputs.get_mut(conn.output.index) {
                port.detach(conn.id);
            }
        }
        debug!("disconnected {} -> {}", conn.output, conn.input);
        Ok(Some(conn))
    }

    pub fn connected_input(&self, node: NodeId, index: usize) -> Option<&Connection> {
        self.nodes
            .get(&node)
            .and_then(|n| n.inputs().get(index))
            .and_then(|port| port.link())
    }

    pub fn connected_outputs(&self, node: NodeId, index: usize) -> &[Connection] {
        self.nodes
            .get(&node)
            .and_then(|n| n.outputs().get(index))
            .map(|port| port.links())
            .unwrap_or(&[])
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeInstance> {
        self.nodes.get(&id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> Vec<&NodeInstance> {
        let mut nodes: Vec<&NodeInstance> = self.nodes.values().collect();
        nodes.sort_by_key(|node| node.id());
        nodes
    }

    /// All live connections in id order.
    pub fn connections(&self) -> Vec<Connection> {
        let mut conns: Vec<Connection> = self
            .nodes
            .values()
            .flat_map(|node| node.inputs().iter().filter_map(|port| port.link().copied()))
            .collect();
        conns.sort_by_key(|conn| conn.id);
        conns
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn port_type(&self, endpoint: Endpoint) -> Option<ValueType> {
        let node = self.nodes.get(&endpoint.node)?;
        match endpoint.direction {
            PortDirection::Input => node.input_type(endpoint.index),
            PortDirection::Output => node.output_type(endpoint.index),
        }
    }

    pub fn port_tag(&self, endpoint: Endpoint) -> Option<TypeTag> {
        self.port_type(endpoint).map(ValueType::tag)
    }

    /// Handle color for rendering. `connect` remains the authority on what may be linked.
    pub fn port_color(&self, endpoint: Endpoint) -> Option<&'static str> {
        self.port_type(endpoint).map(ValueType::color)
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.label = label.into();
        Ok(())
    }

    /// Replace the stored constant of a source node. The new value must keep the node's type.
    pub fn set_constant(&mut self, id: NodeId, value: Value) -> Result<(), GraphError> {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        node.set_constant(value)?;
        if let Some(value) = node.constant() {
            debug!("constant {id} set to {value}");
        }
        Ok(())
    }

    pub fn constant(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(&id).and_then(NodeInstance::constant)
    }

    /// Last value recorded by a display sink, `None` when it shows nothing.
    pub fn display_value(&self, id: NodeId) -> Option<&Value> {
        self.nodes.get(&id).and_then(NodeInstance::display_value)
    }

    /// Subscribe to changes of a display sink's observed value, replacing any prior observer.
    pub fn observe_display<F>(&mut self, id: NodeId, observer: F) -> Result<(), GraphError>
    where
        F: FnMut(Option<&Value>) + 'static,
    {
        let node = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        let state = node
            .display_state_mut()
            .ok_or(GraphError::NotADisplay(id))?;
        state.subscribe(Box::new(observer));
        Ok(())
    }
}
