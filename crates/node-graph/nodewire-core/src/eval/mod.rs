//! Pull-based evaluation of the port graph.
//!
//! Evaluating a node first checks that every input port is connected, then recursively
//! evaluates each upstream node and picks the value at the connection's output index, and
//! finally runs the node's own behaviour on the resolved values. A missing input anywhere
//! upstream yields `Ok(None)`; a failing processor yields `Err` and aborts the request.
//!
//! Results are not cached: a node feeding two consumers is computed once per consumer. The
//! recursion tracks the nodes on the current path so a cycle is reported as
//! [`GraphError::CycleDetected`] instead of recursing forever. Diamonds are not cycles.

use log::{trace, warn};

use crate::definition::PortDirection;
use crate::error::GraphError;
use crate::graph::{Connection, Endpoint, NodeId, PortGraph};
use crate::types::Value;


impl PortGraph {
    /// Evaluate `id`, returning one value per output port or `None` when an input is missing.
    ///
    /// Display sinks return `Some(vec![])` and record their input as the observed value; with a
    /// missing input they return `None` and show nothing. When evaluation fails the observed
    /// value is left as it was.
    pub fn evaluate(&mut self, id: NodeId) -> Result<Option<Vec<Value>>, GraphError> {
        let mut path = Vec::new();
        let inputs = self.resolve_inputs(id, &mut path)?;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;

        let Some(inputs) = inputs else {
            trace!("node {id} has a missing input");
            if let Some(state) = node.display_state_mut() {
                state.set(None);
            }
            return Ok(None);
        };

        let outputs = node.process(&inputs)?;
        if let Some(state) = node.display_state_mut() {
            state.set(inputs.into_iter().next());
        }
        Ok(Some(outputs))
    }

    /// Evaluate the node owning `endpoint` and return the value on that output port.
    pub fn evaluate_output(&self, endpoint: Endpoint) -> Result<Option<Value>, GraphError> {
        let node = self
            .nodes
            .get(&endpoint.node)
            .ok_or(GraphError::NodeNotFound(endpoint.node))?;
        if endpoint.direction != PortDirection::Output || endpoint.index >= node.num_outputs() {
            return Err(GraphError::PortOutOfRange(endpoint));
        }
        let outputs = self.pull(endpoint.node, &mut Vec::new())?;
        Ok(outputs.and_then(|values| values.into_iter().nth(endpoint.index)))
    }

    /// Re-evaluate every display sink in id order.
    ///
    /// A sink whose evaluation fails is cleared and its error reported; the graph itself is left
    /// as it was.
    pub fn refresh_displays(&mut self) -> Vec<(NodeId, Result<Option<Value>, GraphError>)> {
        let mut sinks: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.is_display())
            .map(|node| node.id())
            .collect();
        sinks.sort();

        sinks
            .into_iter()
            .map(|id| {
                let result = match self.evaluate(id) {
                    Ok(_) => Ok(self.display_value(id).cloned()),
                    Err(err) => {
                        warn!("display {id} failed to evaluate: {err}");
                        if let Some(state) = self
                            .nodes
                            .get_mut(&id)
                            .and_then(|node| node.display_state_mut())
                        {
                            state.set(None);
                        }
                        Err(err)
                    }
                };
                (id, result)
            })
            .collect()
    }

    /// Upstream evaluation. Read-only: sinks never sit upstream of anything.
    fn pull(
        &self,
        id: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Result<Option<Vec<Value>>, GraphError> {
        let Some(inputs) = self.resolve_inputs(id, path)? else {
            return Ok(None);
        };
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        trace!("processing node {id} ({})", node.label());
        node.process(&inputs).map(Some)
    }

    fn resolve_inputs(
        &self,
        id: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Result<Option<Vec<Value>>, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))?;
        if path.contains(&id) {
            warn!("cycle through node {id}, path {path:?}");
            return Err(GraphError::CycleDetected { node: id });
        }

        // Every port must be connected before anything upstream is evaluated.
        let mut links: Vec<Connection> = Vec::with_capacity(node.num_inputs());
        for port in node.inputs() {
            match port.link() {
                Some(conn) => links.push(*conn),
                None => return Ok(None),
            }
        }

        path.push(id);
        let resolved = self.pull_links(&links, path);
        path.pop();
        resolved
    }

    fn pull_links(
        &self,
        links: &[Connection],
        path: &mut Vec<NodeId>,
    ) -> Result<Option<Vec<Value>>, GraphError> {
        let mut values = Vec::with_capacity(links.len());
        for conn in links {
            let Some(outputs) = self.pull(conn.output.node, path)? else {
                return Ok(None);
            };
            let value = outputs
                .into_iter()
                .nth(conn.output.index)
                .ok_or(GraphError::PortOutOfRange(conn.output))?;
            values.push(value);
        }
        Ok(Some(values))
    }
}
