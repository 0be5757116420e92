//! Serializable description of every value type and node kind, consumed by the sidebar to
//! list spawnable nodes and color port handles.

use serde::Serialize;

use crate::definition::{NodeKind, NodeParams, PortSpec};
use crate::error::GraphError;
use crate::types::{TypeTag, Value, ValueType};

#[derive(Debug, Clone, Serialize)]
pub struct TypeSignature {
    pub id: ValueType,
    pub name: &'static str,
    pub tag: TypeTag,
    pub color: &'static str,
    pub zero: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Number,
    Vector,
    Type,
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub id: &'static str,
    pub ty: ParamType,
    pub label: &'static str,
    pub doc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_json: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSignature {
    pub type_id: NodeKind,
    pub name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    pub params: Vec<ParamSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub version: &'static str,
    pub types: Vec<TypeSignature>,
    pub nodes: Vec<NodeSignature>,
}

fn label_param() -> ParamSpec {
    ParamSpec {
        id: "label",
        ty: ParamType::Text,
        label: "Label",
        doc: "Name shown under the node.",
        default_json: None,
    }
}

fn params_for(kind: NodeKind) -> Vec<ParamSpec> {
    let mut params = match kind {
        NodeKind::Number => vec![ParamSpec {
            id: "value",
            ty: ParamType::Number,
            label: "Value",
            doc: "",
            default_json: Some(serde_json::json!(0.0)),
        }],
        NodeKind::VectorConstant => vec![ParamSpec {
            id: "value",
            ty: ParamType::Vector,
            label: "Value",
            doc: "Components of the vector.",
            default_json: Some(serde_json::json!([])),
        }],
        NodeKind::Display => vec![ParamSpec {
            id: "value_type",
            ty: ParamType::Type,
            label: "Shows",
            doc: "Type accepted by the display input.",
            default_json: Some(serde_json::json!(ValueType::Number)),
        }],
        _ => vec![],
    };
    params.push(label_param());
    params
}

fn signature(kind: NodeKind) -> Result<NodeSignature, GraphError> {
    let def = kind.definition(&NodeParams::default())?;
    Ok(NodeSignature {
        type_id: kind,
        name: def.name,
        category: kind.category(),
        inputs: def.inputs,
        outputs: def.outputs,
        params: params_for(kind),
    })
}

/// Describe every type and node kind with their default port layout.
pub fn registry() -> Result<Registry, GraphError> {
    let types = ValueType::ALL
        .into_iter()
        .map(|ty| TypeSignature {
            id: ty,
            name: ty.name(),
            tag: ty.tag(),
            color: ty.color(),
            zero: ty.zero(),
        })
        .collect();
    let nodes = NodeKind::ALL
        .into_iter()
        .map(signature)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Registry {
        version: env!("CARGO_PKG_VERSION"),
        types,
        nodes,
    })
}
