//! Node kinds and the immutable definitions built from them.
//!
//! [`NodeKind`] is the closed registry of everything a user can spawn. A kind turns into a
//! [`NodeDefinition`] (name, ordered typed ports, processing behaviour), and a definition
//! turns into a live [`NodeInstance`] with its own bound state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::NodeId;
use crate::node::{Behavior, DisplayState, InputPort, NodeInstance, OutputPort};
use crate::types::{GraphVector, Value, ValueType};

/// Pure processing function: positional inputs in, positional outputs out.
pub type Processor = fn(&[Value]) -> Result<Vec<Value>, GraphError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// One named, typed slot on a definition. Its position in the input or output list is its
/// argument or return position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSpec {
    pub name: &'static str,
    pub value_type: ValueType,
}

impl PortSpec {
    pub const fn new(name: &'static str, value_type: ValueType) -> Self {
        PortSpec { name, value_type }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    // Sources
    Number,
    VectorConstant,

    // Vector operations
    DotProduct,
    ScaleVector,
    Vector2Splitter,
    Vector3Splitter,
    TruncateVector2,
    TruncateVector3,
    Vector2,
    Vector3,
    VectorNorm,

    // Sinks
    Display,
}

impl NodeKind {
    pub const ALL: [NodeKind; 12] = [
        NodeKind::Number,
        NodeKind::VectorConstant,
        NodeKind::DotProduct,
        NodeKind::ScaleVector,
        NodeKind::Vector2Splitter,
        NodeKind::Vector3Splitter,
        NodeKind::TruncateVector2,
        NodeKind::TruncateVector3,
        NodeKind::Vector2,
        NodeKind::Vector3,
        NodeKind::VectorNorm,
        NodeKind::Display,
    ];

    /// Stable identifier, identical to the serde name.
    pub fn type_id(self) -> &'static str {
        match self {
            NodeKind::Number => "number",
            NodeKind::VectorConstant => "vectorconstant",
            NodeKind::DotProduct => "dotproduct",
            NodeKind::ScaleVector => "scalevector",
            NodeKind::Vector2Splitter => "vector2splitter",
            NodeKind::Vector3Splitter => "vector3splitter",
            NodeKind::TruncateVector2 => "truncatevector2",
            NodeKind::TruncateVector3 => "truncatevector3",
            NodeKind::Vector2 => "vector2",
            NodeKind::Vector3 => "vector3",
            NodeKind::VectorNorm => "vectornorm",
            NodeKind::Display => "display",
        }
    }

    /// Label shown in the sidebar.
    pub fn label(self) -> &'static str {
        match self {
            NodeKind::Number => "Number",
            NodeKind::VectorConstant => "Vector",
            NodeKind::DotProduct => "Dot Product",
            NodeKind::ScaleVector => "Scale Vector",
            NodeKind::Vector2Splitter => "Component Split-2",
            NodeKind::Vector3Splitter => "Component Split-3",
            NodeKind::TruncateVector2 => "Truncate-2",
            NodeKind::TruncateVector3 => "Truncate-3",
            NodeKind::Vector2 => "Vector2",
            NodeKind::Vector3 => "Vector3",
            NodeKind::VectorNorm => "Length",
            NodeKind::Display => "Display",
        }
    }

    pub fn category(self) -> &'static str {
        match self {
            NodeKind::Number | NodeKind::VectorConstant => "Constants",
            NodeKind::Display => "Output",
            _ => "Vector",
        }
    }

    /// Look a kind up by type id or sidebar label.
    pub fn from_name(name: &str) -> Result<NodeKind, GraphError> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.type_id() == name || kind.label() == name)
            .ok_or_else(|| GraphError::UnknownKind(name.to_string()))
    }

    /// Build the definition for this kind. Only sources and sinks read `params`.
    pub fn definition(self, params: &NodeParams) -> Result<NodeDefinition, GraphError> {
        use ValueType::{Number, Vector};

        let pure = |inputs: Vec<PortSpec>, outputs: Vec<PortSpec>, processor: Processor| {
            NodeDefinition {
                kind: self,
                name: self.label(),
                inputs,
                outputs,
                processing: Processing::Pure(processor),
            }
        };

        let def = match self {
            NodeKind::Number | NodeKind::VectorConstant => NodeDefinition {
                kind: self,
                name: self.label(),
                inputs: vec![],
                outputs: vec![PortSpec::new("Value", self.constant_type(params)?)],
                processing: Processing::Source,
            },
            // Typed per instance instead of a wildcard input, since tags must match exactly.
            NodeKind::Display => NodeDefinition {
                kind: self,
                name: self.label(),
                inputs: vec![PortSpec::new(
                    "node",
                    params.value_type.unwrap_or(ValueType::Number),
                )],
                outputs: vec![],
                processing: Processing::Sink,
            },
            NodeKind::DotProduct => pure(
                vec![PortSpec::new("v1", Vector), PortSpec::new("v2", Vector)],
                vec![PortSpec::new("dp", Number)],
                dot_product,
            ),
            NodeKind::ScaleVector => pure(
                vec![PortSpec::new("s", Number), PortSpec::new("v", Vector)],
                vec![PortSpec::new("sv", Vector)],
                scale_vector,
            ),
            NodeKind::Vector2Splitter => pure(
                vec![PortSpec::new("vector", Vector)],
                vec![PortSpec::new("x", Number), PortSpec::new("y", Number)],
                split_vector2,
            ),
            NodeKind::Vector3Splitter => pure(
                vec![PortSpec::new("vector", Vector)],
                vec![
                    PortSpec::new("x", Number),
                    PortSpec::new("y", Number),
                    PortSpec::new("z", Number),
                ],
                split_vector3,
            ),
            NodeKind::TruncateVector2 => pure(
                vec![PortSpec::new("v", Vector)],
                vec![PortSpec::new("vt", Vector)],
                truncate_vector2,
            ),
            NodeKind::TruncateVector3 => pure(
                vec![PortSpec::new("v", Vector)],
                vec![PortSpec::new("vt", Vector)],
                truncate_vector3,
            ),
            NodeKind::Vector2 => pure(
                vec![PortSpec::new("x", Number), PortSpec::new("y", Number)],
                vec![PortSpec::new("v", Vector)],
                build_vector2,
            ),
            NodeKind::Vector3 => pure(
                vec![
                    PortSpec::new("x", Number),
                    PortSpec::new("y", Number),
                    PortSpec::new("z", Number),
                ],
                vec![PortSpec::new("v", Vector)],
                build_vector3,
            ),
            NodeKind::VectorNorm => pure(
                vec![PortSpec::new("v", Vector)],
                vec![PortSpec::new("n", Number)],
                vector_norm,
            ),
        };
        Ok(def)
    }

    fn constant_type(self, params: &NodeParams) -> Result<ValueType, GraphError> {
        let declared = match self {
            NodeKind::VectorConstant => ValueType::Vector,
            _ => ValueType::Number,
        };
        match &params.value {
            Some(value) if value.value_type() != declared => Err(GraphError::InvalidParams {
                kind: self.label(),
                reason: format!(
                    "constant value is a {} but the node holds a {}",
                    value.value_type().name(),
                    declared.name()
                ),
            }),
            _ => Ok(declared),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Spawn-time arguments. Kinds ignore the fields they have no use for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParams {
    /// Initial constant of a source node; the type's zero when absent.
    pub value: Option<Value>,
    /// Input type of a display sink; `Number` when absent.
    pub value_type: Option<ValueType>,
    /// Instance label; the kind's label when absent.
    pub label: Option<String>,
}

impl NodeParams {
    pub fn with_value(value: impl Into<Value>) -> Self {
        NodeParams {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn with_type(value_type: ValueType) -> Self {
        NodeParams {
            value_type: Some(value_type),
            ..Default::default()
        }
    }
}

/// How a definition turns inputs into outputs.
#[derive(Clone, Copy)]
pub enum Processing {
    Pure(Processor),
    /// Emits the instance's stored constant.
    Source,
    /// Records its single input on the instance's display slot; declares no outputs.
    Sink,
}

impl fmt::Debug for Processing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Processing::Pure(_) => f.write_str("Pure"),
            Processing::Source => f.write_str("Source"),
            Processing::Sink => f.write_str("Sink"),
        }
    }
}

/// Immutable shape and behaviour of a node.
#[derive(Debug, Clone)]
pub struct NodeDefinition {
    pub kind: NodeKind,
    pub name: &'static str,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub processing: Processing,
}

impl NodeDefinition {
    /// Create a live instance whose ports mirror this definition, binding per-instance state.
    pub fn create_instance(self, id: NodeId, params: NodeParams) -> NodeInstance {
        let behavior = match self.processing {
            Processing::Pure(processor) => Behavior::Pure(processor),
            Processing::Source => {
                let ty = self
                    .outputs
                    .first()
                    .map(|port| port.value_type)
                    .unwrap_or(ValueType::Number);
                Behavior::Constant(params.value.unwrap_or_else(|| ty.zero()))
            }
            Processing::Sink => Behavior::Display(DisplayState::default()),
        };
        NodeInstance {
            id,
            kind: self.kind,
            label: params.label.unwrap_or_else(|| self.name.to_string()),
            inputs: self.inputs.into_iter().map(InputPort::new).collect(),
            outputs: self.outputs.into_iter().map(OutputPort::new).collect(),
            behavior,
        }
    }
}

fn args<'a, const N: usize>(
    kind: &'static str,
    inputs: &'a [Value],
) -> Result<&'a [Value; N], GraphError> {
    inputs.try_into().map_err(|_| GraphError::Arity {
        kind,
        expected: N,
        found: inputs.len(),
    })
}

fn number(value: &Value) -> Result<f64, GraphError> {
    value.as_number().ok_or(GraphError::TypeMismatch {
        expected: ValueType::Number,
        found: value.value_type(),
    })
}

fn vector(value: &Value) -> Result<&GraphVector, GraphError> {
    value.as_vector().ok_or(GraphError::TypeMismatch {
        expected: ValueType::Vector,
        found: value.value_type(),
    })
}

fn dot_product(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v1, v2] = args::<2>("Dot Product", inputs)?;
    Ok(vec![Value::Number(vector(v1)?.dot(vector(v2)?)?)])
}

fn scale_vector(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [s, v] = args::<2>("Scale Vector", inputs)?;
    Ok(vec![Value::Vector(vector(v)?.scale(number(s)?))])
}

fn split_vector2(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v] = args::<1>("Component Split-2", inputs)?;
    let v = vector(v)?;
    Ok(vec![Value::Number(v.x()), Value::Number(v.y())])
}

fn split_vector3(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v] = args::<1>("Component Split-3", inputs)?;
    let v = vector(v)?;
    Ok(vec![
        Value::Number(v.x()),
        Value::Number(v.y()),
        Value::Number(v.z()),
    ])
}

fn truncate_vector2(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v] = args::<1>("Truncate-2", inputs)?;
    Ok(vec![Value::Vector(vector(v)?.resized(2))])
}

fn truncate_vector3(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v] = args::<1>("Truncate-3", inputs)?;
    Ok(vec![Value::Vector(vector(v)?.resized(3))])
}

fn build_vector2(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [x, y] = args::<2>("Vector2", inputs)?;
    Ok(vec![Value::Vector(GraphVector::from([
        number(x)?,
        number(y)?,
    ]))])
}

fn build_vector3(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [x, y, z] = args::<3>("Vector3", inputs)?;
    Ok(vec![Value::Vector(GraphVector::from([
        number(x)?,
        number(y)?,
        number(z)?,
    ]))])
}

fn vector_norm(inputs: &[Value]) -> Result<Vec<Value>, GraphError> {
    let [v] = args::<1>("Length", inputs)?;
    Ok(vec![Value::Number(vector(v)?.norm())])
}
