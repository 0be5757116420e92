//! Live node instances and their per-port connection bookkeeping.

use std::fmt;

use crate::definition::{NodeKind, PortSpec, Processor};
use crate::error::GraphError;
use crate::graph::{Connection, ConnectionId, NodeId};
use crate::types::{TypeTag, Value, ValueType};

/// Input slot: a typed port holding at most one connection.
#[derive(Debug, Clone)]
pub struct InputPort {
    spec: PortSpec,
    link: Option<Connection>,
}

impl InputPort {
    pub(crate) fn new(spec: PortSpec) -> Self {
        InputPort { spec, link: None }
    }

    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    pub fn tag(&self) -> TypeTag {
        self.spec.value_type.tag()
    }

    pub fn link(&self) -> Option<&Connection> {
        self.link.as_ref()
    }

    pub(crate) fn attach(&mut self, conn: Connection) {
        self.link = Some(conn);
    }

    pub(crate) fn detach(&mut self) -> Option<Connection> {
        self.link.take()
    }
}

/// Output slot: a typed port feeding any number of connections.
#[derive(Debug, Clone)]
pub struct OutputPort {
    spec: PortSpec,
    links: Vec<Connection>,
}

impl OutputPort {
    pub(crate) fn new(spec: PortSpec) -> Self {
        OutputPort {
            spec,
            links: Vec::new(),
        }
    }

    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    pub fn tag(&self) -> TypeTag {
        self.spec.value_type.tag()
    }

    pub fn links(&self) -> &[Connection] {
        &self.links
    }

    pub(crate) fn attach(&mut self, conn: Connection) {
        self.links.push(conn);
    }

    pub(crate) fn detach(&mut self, id: ConnectionId) {
        self.links.retain(|conn| conn.id != id);
    }
}

/// Callback notified whenever a display sink's observed value changes.
pub type DisplayObserver = Box<dyn FnMut(Option<&Value>)>;

/// Observed value of a display sink plus its optional subscriber.
#[derive(Default)]
pub struct DisplayState {
    observed: Option<Value>,
    observer: Option<DisplayObserver>,
}

impl DisplayState {
    pub fn observed(&self) -> Option<&Value> {
        self.observed.as_ref()
    }

    pub(crate) fn set(&mut self, value: Option<Value>) {
        if self.observed == value {
            return;
        }
        self.observed = value;
        if let Some(observer) = self.observer.as_mut() {
            observer(self.observed.as_ref());
        }
    }

    pub(crate) fn subscribe(&mut self, observer: DisplayObserver) {
        self.observer = Some(observer);
    }
}

impl fmt::Debug for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayState")
            .field("observed", &self.observed)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// Processing behaviour bound to an instance at creation.
pub enum Behavior {
    Pure(Processor),
    Constant(Value),
    Display(DisplayState),
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::Pure(_) => f.write_str("Pure"),
            Behavior::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Behavior::Display(state) => f.debug_tuple("Display").field(state).finish(),
        }
    }
}

/// A node living in a [`PortGraph`](crate::graph::PortGraph).
#[derive(Debug)]
pub struct NodeInstance {
    pub(crate) id: NodeId,
    pub(crate) kind: NodeKind,
    pub(crate) label: String,
    pub(crate) inputs: Vec<InputPort>,
    pub(crate) outputs: Vec<OutputPort>,
    pub(crate) behavior: Behavior,
}

impl NodeInstance {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn inputs(&self) -> &[InputPort] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputPort] {
        &self.outputs
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_source(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn is_sink(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Stored value of a constant source.
    pub fn constant(&self) -> Option<&Value> {
        match &self.behavior {
            Behavior::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Observed value of a display sink.
    pub fn display_value(&self) -> Option<&Value> {
        match &self.behavior {
            Behavior::Display(state) => state.observed(),
            _ => None,
        }
    }

    pub fn is_display(&self) -> bool {
        matches!(self.behavior, Behavior::Display(_))
    }

    pub(crate) fn display_state_mut(&mut self) -> Option<&mut DisplayState> {
        match &mut self.behavior {
            Behavior::Display(state) => Some(state),
            _ => None,
        }
    }

    pub(crate) fn set_constant(&mut self, value: Value) -> Result<(), GraphError> {
        let Behavior::Constant(current) = &mut self.behavior else {
            return Err(GraphError::NotAConstant(self.id));
        };
        let expected = current.value_type();
        if value.value_type() != expected {
            return Err(GraphError::TypeMismatch {
                expected,
                found: value.value_type(),
            });
        }
        *current = value;
        Ok(())
    }

    pub(crate) fn input_type(&self, index: usize) -> Option<ValueType> {
        self.inputs.get(index).map(|port| port.spec.value_type)
    }

    pub(crate) fn output_type(&self, index: usize) -> Option<ValueType> {
        self.outputs.get(index).map(|port| port.spec.value_type)
    }

    /// Run the bound behaviour on already-resolved inputs.
    ///
    /// Display sinks produce no outputs here; recording the observed value is the caller's job
    /// so that upstream pulls can stay read-only.
    pub(crate) fn process(&self, inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
        match &self.behavior {
            Behavior::Pure(processor) => processor(inputs),
            Behavior::Constant(value) => Ok(vec![value.clone()]),
            Behavior::Display(_) => Ok(Vec::new()),
        }
    }
}
