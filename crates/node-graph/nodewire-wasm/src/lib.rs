//! JavaScript bindings for the port graph.
//!
//! Node ids cross the boundary as `u32`. Values cross as JSON: a number for `Number`, an
//! array of numbers for `Vector`, and `null` when there is nothing to show.

use nodewire_core::{
    registry, Endpoint, NodeId, NodeInstance, NodeParams, PortDirection, PortGraph, Value,
};
use serde_json::json;
use wasm_bindgen::prelude::*;

fn node_id(id: u32) -> NodeId {
    NodeId(u64::from(id))
}

fn js_id(id: NodeId) -> Result<u32, String> {
    u32::try_from(id.0).map_err(|_| format!("node id {id} does not fit in a u32"))
}

fn parse_params(json: Option<&str>) -> Result<NodeParams, String> {
    match json.map(str::trim) {
        None | Some("") => Ok(NodeParams::default()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| format!("invalid params: {e}")),
    }
}

fn parse_value(json: &str) -> Result<Value, String> {
    serde_json::from_str(json).map_err(|e| format!("invalid value: {e}"))
}

fn parse_direction(raw: &str) -> Result<PortDirection, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "input" | "in" => Ok(PortDirection::Input),
        "output" | "out" => Ok(PortDirection::Output),
        other => Err(format!("unknown port direction '{other}'")),
    }
}

fn endpoint(node: u32, direction: &str, index: u32) -> Result<Endpoint, String> {
    Ok(Endpoint {
        node: node_id(node),
        direction: parse_direction(direction)?,
        index: index as usize,
    })
}

fn value_json(value: Option<&Value>) -> serde_json::Value {
    match value {
        Some(value) => json!(value),
        None => serde_json::Value::Null,
    }
}

fn node_json(graph: &PortGraph, node: &NodeInstance) -> serde_json::Value {
    let inputs: Vec<_> = node
        .inputs()
        .iter()
        .map(|port| {
            json!({
                "name": port.spec().name,
                "type": port.tag(),
                "color": port.spec().value_type.color(),
                "connection": port.link().map(|c| c.id),
            })
        })
        .collect();
    let outputs: Vec<_> = node
        .outputs()
        .iter()
        .map(|port| {
            json!({
                "name": port.spec().name,
                "type": port.tag(),
                "color": port.spec().value_type.color(),
                "connections": port.links().iter().map(|c| c.id).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({
        "id": node.id(),
        "kind": node.kind(),
        "name": node.kind().label(),
        "label": node.label(),
        "inputs": inputs,
        "outputs": outputs,
        "constant": value_json(graph.constant(node.id())),
        "display": value_json(graph.display_value(node.id())),
    })
}

fn nodes_snapshot(graph: &PortGraph) -> serde_json::Value {
    let nodes: Vec<_> = graph
        .nodes()
        .into_iter()
        .map(|node| node_json(graph, node))
        .collect();
    serde_json::Value::Array(nodes)
}

fn connections_snapshot(graph: &PortGraph) -> serde_json::Value {
    let connections: Vec<_> = graph
        .connections()
        .into_iter()
        .map(|c| {
            json!({
                "id": c.id,
                "from": { "node": c.output.node, "port": c.output.index },
                "to": { "node": c.input.node, "port": c.input.index },
            })
        })
        .collect();
    serde_json::Value::Array(connections)
}

fn refresh_report(graph: &mut PortGraph) -> serde_json::Value {
    let report: Vec<_> = graph
        .refresh_displays()
        .into_iter()
        .map(|(id, result)| match result {
            Ok(value) => json!({ "node": id, "value": value_json(value.as_ref()) }),
            Err(err) => json!({ "node": id, "value": null, "error": err.to_string() }),
        })
        .collect();
    serde_json::Value::Array(report)
}

/// Link two endpoints and refresh every display, returning the refresh report.
///
/// A link into a display is evaluated first; when that evaluation fails the link is undone and
/// the error returned, so a display is never left wired to a producer it cannot show.
fn connect_link(
    graph: &mut PortGraph,
    a: Endpoint,
    b: Endpoint,
) -> Result<serde_json::Value, String> {
    let conn = graph.try_connect(a, b).map_err(|e| e.to_string())?;
    let target = conn.input.node;
    if graph.node(target).is_some_and(NodeInstance::is_display) {
        if let Err(err) = graph.evaluate(target) {
            graph
                .disconnect_input(target, conn.input.index)
                .map_err(|e| e.to_string())?;
            return Err(err.to_string());
        }
    }
    Ok(refresh_report(graph))
}

fn spawn_node(graph: &mut PortGraph, kind: &str, params_json: Option<&str>) -> Result<u32, String> {
    let params = parse_params(params_json)?;
    let id = graph.spawn(kind, params).map_err(|e| e.to_string())?;
    js_id(id)
}

fn evaluate_json(graph: &mut PortGraph, id: u32) -> Result<String, String> {
    let outputs = graph.evaluate(node_id(id)).map_err(|e| e.to_string())?;
    let json = match outputs {
        Some(values) => json!(values),
        None => serde_json::Value::Null,
    };
    serde_json::to_string(&json).map_err(|e| e.to_string())
}

fn set_constant_json(
    graph: &mut PortGraph,
    id: u32,
    value_json: &str,
) -> Result<serde_json::Value, String> {
    let value = parse_value(value_json)?;
    graph
        .set_constant(node_id(id), value)
        .map_err(|e| e.to_string())?;
    Ok(refresh_report(graph))
}

fn node_schemas_json() -> Result<String, String> {
    let registry = registry().map_err(|e| e.to_string())?;
    serde_json::to_string(&registry).map_err(|e| e.to_string())
}

#[wasm_bindgen]
#[derive(Default)]
pub struct WasmGraph {
    graph: PortGraph,
}

#[wasm_bindgen]
impl WasmGraph {
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGraph {
        #[cfg(feature = "console_error")]
        console_error_panic_hook::set_once();
        WasmGraph::default()
    }

    /// Spawn a node by kind id or sidebar label; `params_json` may carry `value`, `value_type`
    /// and `label`.
    #[wasm_bindgen]
    pub fn spawn(&mut self, kind: &str, params_json: Option<String>) -> Result<u32, JsValue> {
        spawn_node(&mut self.graph, kind, params_json.as_deref()).map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen]
    pub fn remove(&mut self, id: u32) -> Result<(), JsValue> {
        self.graph
            .remove_node(node_id(id))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Connect an output to an input. Displays are refreshed when the link is made; a display
    /// that fails to evaluate its new input refuses the link and this returns `false`.
    #[wasm_bindgen]
    pub fn connect(&mut self, out_node: u32, out_port: u32, in_node: u32, in_port: u32) -> bool {
        connect_link(
            &mut self.graph,
            Endpoint::output(node_id(out_node), out_port as usize),
            Endpoint::input(node_id(in_node), in_port as usize),
        )
        .is_ok()
    }

    /// Connect two endpoints given in either order, as a drag gesture produces them, and
    /// return the display refresh report. Errors carry the reason the link was refused.
    #[wasm_bindgen]
    pub fn connect_endpoints(
        &mut self,
        a_node: u32,
        a_direction: &str,
        a_port: u32,
        b_node: u32,
        b_direction: &str,
        b_port: u32,
    ) -> Result<String, JsValue> {
        let a = endpoint(a_node, a_direction, a_port).map_err(|e| JsValue::from_str(&e))?;
        let b = endpoint(b_node, b_direction, b_port).map_err(|e| JsValue::from_str(&e))?;
        connect_link(&mut self.graph, a, b)
            .map(|report| report.to_string())
            .map_err(|e| JsValue::from_str(&e))
    }

    /// Returns whether a connection was removed.
    #[wasm_bindgen]
    pub fn disconnect_input(&mut self, id: u32, port: u32) -> Result<bool, JsValue> {
        self.graph
            .disconnect_input(node_id(id), port as usize)
            .map(|removed| removed.is_some())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Evaluate a node and return its outputs as a JSON array, or `null` when an input is
    /// missing.
    #[wasm_bindgen]
    pub fn evaluate(&mut self, id: u32) -> Result<String, JsValue> {
        evaluate_json(&mut self.graph, id).map_err(|e| JsValue::from_str(&e))
    }

    /// Replace a constant and return the display refresh report, in which displays that can no
    /// longer evaluate carry an `error`.
    #[wasm_bindgen]
    pub fn set_constant(&mut self, id: u32, value_json: &str) -> Result<String, JsValue> {
        set_constant_json(&mut self.graph, id, value_json)
            .map(|report| report.to_string())
            .map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen]
    pub fn display_value(&self, id: u32) -> String {
        value_json(self.graph.display_value(node_id(id))).to_string()
    }

    /// Re-evaluate every display and report `{ node, value, error? }` for each.
    #[wasm_bindgen]
    pub fn refresh_displays(&mut self) -> String {
        refresh_report(&mut self.graph).to_string()
    }

    #[wasm_bindgen]
    pub fn port_color(&self, id: u32, direction: &str, port: u32) -> Option<String> {
        let endpoint = endpoint(id, direction, port).ok()?;
        self.graph.port_color(endpoint).map(str::to_string)
    }

    #[wasm_bindgen]
    pub fn set_label(&mut self, id: u32, label: &str) -> Result<(), JsValue> {
        self.graph
            .set_label(node_id(id), label)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen]
    pub fn nodes_json(&self) -> String {
        nodes_snapshot(&self.graph).to_string()
    }

    #[wasm_bindgen]
    pub fn connections_json(&self) -> String {
        connections_snapshot(&self.graph).to_string()
    }
}

/// Expose the node schema registry as JSON for tooling/UI.
#[wasm_bindgen]
pub fn get_node_schemas_json() -> Result<String, JsValue> {
    node_schemas_json().map_err(|e| JsValue::from_str(&e))
}
