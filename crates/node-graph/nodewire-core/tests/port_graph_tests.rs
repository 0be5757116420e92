use anyhow::{anyhow, Result};
use nodewire_core::{
    ConnectError, Endpoint, GraphVector, NodeId, NodeKind, NodeParams, PortGraph, Value,
    ValueType,
};

fn spawn(graph: &mut PortGraph, kind: &str) -> Result<NodeId> {
    Ok(graph.spawn(kind, NodeParams::default())?)
}

fn number(graph: &mut PortGraph, n: f64) -> Result<NodeId> {
    Ok(graph.spawn("Number", NodeParams::with_value(n))?)
}

fn vector(graph: &mut PortGraph, components: &[f64]) -> Result<NodeId> {
    Ok(graph.spawn(
        "Vector",
        NodeParams::with_value(GraphVector::new(components.to_vec())),
    )?)
}

/// No connection anywhere in the graph mentions `id`.
fn assert_unreferenced(graph: &PortGraph, id: NodeId) {
    for conn in graph.connections() {
        assert_ne!(conn.input.node, id, "dangling input reference in {conn:?}");
        assert_ne!(conn.output.node, id, "dangling output reference in {conn:?}");
    }
    for node in graph.nodes() {
        for port in node.outputs() {
            assert!(port.links().iter().all(|c| c.input.node != id));
        }
        for port in node.inputs() {
            assert!(port.link().map_or(true, |c| c.output.node != id));
        }
    }
}

#[test]
fn test_numbers_cannot_feed_dot_product() -> Result<()> {
    let mut graph = PortGraph::new();
    let three = number(&mut graph, 3.0)?;
    let four = number(&mut graph, 4.0)?;
    let dot = spawn(&mut graph, "Dot Product")?;

    assert!(!graph.connect(Endpoint::output(three, 0), Endpoint::input(dot, 0)));
    assert!(!graph.connect(Endpoint::output(four, 0), Endpoint::input(dot, 1)));
    assert_eq!(
        graph.try_connect(Endpoint::output(three, 0), Endpoint::input(dot, 0)),
        Err(ConnectError::IncompatibleTypes {
            output: ValueType::Number,
            input: ValueType::Vector,
        })
    );
    assert!(graph.connections().is_empty());
    assert!(graph.connected_outputs(three, 0).is_empty());
    assert!(graph.connected_input(dot, 0).is_none());
    Ok(())
}

#[test]
fn test_length_of_vector2() -> Result<()> {
    let mut graph = PortGraph::new();
    let x = number(&mut graph, 3.0)?;
    let y = number(&mut graph, 4.0)?;
    let v = spawn(&mut graph, "Vector2")?;
    let len = spawn(&mut graph, "Length")?;
    assert!(graph.connect(Endpoint::output(x, 0), Endpoint::input(v, 0)));
    assert!(graph.connect(Endpoint::output(y, 0), Endpoint::input(v, 1)));
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(len, 0)));

    let out = graph.evaluate(len)?.ok_or_else(|| anyhow!("length has no value"))?;
    assert_eq!(out, vec![Value::Number(5.0)]);
    Ok(())
}

#[test]
fn test_scale_vector_without_scalar_is_none() -> Result<()> {
    let mut graph = PortGraph::new();
    let s = number(&mut graph, 2.0)?;
    let v = vector(&mut graph, &[1.0, 2.0, 3.0])?;
    let scale = spawn(&mut graph, "Scale Vector")?;
    assert!(graph.connect(Endpoint::output(s, 0), Endpoint::input(scale, 0)));
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(scale, 1)));
    assert!(graph.evaluate(scale)?.is_some());

    graph.disconnect_input(scale, 0)?;
    assert_eq!(graph.evaluate(scale)?, None);
    Ok(())
}

#[test]
fn test_fan_out_consumers_are_independent() -> Result<()> {
    let mut graph = PortGraph::new();
    let v = vector(&mut graph, &[1.0, 2.0, 3.0])?;
    let split2 = spawn(&mut graph, "Component Split-2")?;
    let split3 = spawn(&mut graph, "Component Split-3")?;
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(split2, 0)));
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(split3, 0)));
    assert_eq!(graph.connected_outputs(v, 0).len(), 2);

    let two = graph.evaluate(split2)?;
    let three = graph.evaluate(split3)?;
    assert_eq!(two, Some(vec![Value::Number(1.0), Value::Number(2.0)]));
    assert_eq!(
        three,
        Some(vec![
            Value::Number(1.0),
            Value::Number(2.0),
            Value::Number(3.0)
        ])
    );
    // Order of evaluation does not matter.
    assert_eq!(graph.evaluate(split2)?, two);
    Ok(())
}

#[test]
fn test_disconnect_clears_display() -> Result<()> {
    let mut graph = PortGraph::new();
    let v = vector(&mut graph, &[3.0, 4.0])?;
    let len = spawn(&mut graph, "Length")?;
    let display = spawn(&mut graph, "Display")?;
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(len, 0)));
    assert!(graph.connect(Endpoint::output(len, 0), Endpoint::input(display, 0)));

    assert_eq!(graph.evaluate(display)?, Some(vec![]));
    assert_eq!(graph.display_value(display), Some(&Value::Number(5.0)));

    let removed = graph.disconnect_input(display, 0)?;
    assert!(removed.is_some());
    assert_eq!(graph.display_value(display), None);
    assert!(graph.connected_outputs(len, 0).is_empty());
    Ok(())
}

#[test]
fn test_removing_upstream_clears_display() -> Result<()> {
    let mut graph = PortGraph::new();
    let n = number(&mut graph, 1.0)?;
    let display = spawn(&mut graph, "Display")?;
    assert!(graph.connect(Endpoint::output(n, 0), Endpoint::input(display, 0)));
    graph.evaluate(display)?;
    assert!(graph.display_value(display).is_some());

    graph.remove_node(n)?;
    assert_eq!(graph.display_value(display), None);
    Ok(())
}

#[test]
fn test_input_holds_one_connection() -> Result<()> {
    let mut graph = PortGraph::new();
    let a = number(&mut graph, 1.0)?;
    let b = number(&mut graph, 2.0)?;
    let v = spawn(&mut graph, "Vector2")?;
    assert!(graph.connect(Endpoint::output(a, 0), Endpoint::input(v, 0)));
    assert_eq!(
        graph.try_connect(Endpoint::output(b, 0), Endpoint::input(v, 0)),
        Err(ConnectError::PortOccupied(Endpoint::input(v, 0)))
    );
    let conn = graph.connected_input(v, 0).copied();
    assert_eq!(conn.map(|c| c.output.node), Some(a));
    assert!(graph.connected_outputs(b, 0).is_empty());

    // Freed input accepts the other producer.
    graph.disconnect_input(v, 0)?;
    assert!(graph.connect(Endpoint::output(b, 0), Endpoint::input(v, 0)));
    assert_eq!(graph.connections().len(), 1);
    Ok(())
}

#[test]
fn test_fan_in_invariant_after_mixed_operations() -> Result<()> {
    let mut graph = PortGraph::new();
    let sources: Vec<NodeId> = (0..4)
        .map(|i| number(&mut graph, i as f64))
        .collect::<Result<_>>()?;
    let v3 = spawn(&mut graph, "Vector3")?;
    let v2 = spawn(&mut graph, "Vector2")?;

    for (i, src) in sources.iter().enumerate() {
        for target in [v3, v2] {
            for port in 0..3 {
                graph.connect(Endpoint::output(*src, 0), Endpoint::input(target, port));
            }
        }
        if i == 1 {
            graph.disconnect_input(v3, 1)?;
        }
    }
    graph.remove_node(sources[0])?;

    let conns = graph.connections();
    for node in graph.nodes() {
        for (index, port) in node.inputs().iter().enumerate() {
            let incoming = conns
                .iter()
                .filter(|c| c.input == Endpoint::input(node.id(), index))
                .count();
            assert!(incoming <= 1);
            assert_eq!(incoming, usize::from(port.link().is_some()));
        }
    }
    let per_input = graph.connections().iter().fold(
        std::collections::HashMap::<Endpoint, usize>::new(),
        |mut acc, c| {
            *acc.entry(c.input).or_default() += 1;
            acc
        },
    );
    assert!(per_input.values().all(|count| *count == 1));
    Ok(())
}

#[test]
fn test_remove_node_leaves_no_references() -> Result<()> {
    let mut graph = PortGraph::new();
    let v = vector(&mut graph, &[1.0, 2.0, 3.0])?;
    let s = number(&mut graph, 2.0)?;
    let scale = spawn(&mut graph, "Scale Vector")?;
    let len = spawn(&mut graph, "Length")?;
    let split = spawn(&mut graph, "Component Split-3")?;
    assert!(graph.connect(Endpoint::output(s, 0), Endpoint::input(scale, 0)));
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(scale, 1)));
    assert!(graph.connect(Endpoint::output(scale, 0), Endpoint::input(len, 0)));
    assert!(graph.connect(Endpoint::output(scale, 0), Endpoint::input(split, 0)));

    graph.remove_node(scale)?;
    assert!(!graph.contains(scale));
    assert_unreferenced(&graph, scale);
    assert!(graph.connections().is_empty());
    assert!(graph.connected_outputs(v, 0).is_empty());
    assert!(graph.connected_input(len, 0).is_none());
    assert_eq!(graph.evaluate(len)?, None);
    Ok(())
}

#[test]
fn test_remove_node_with_self_loop() -> Result<()> {
    let mut graph = PortGraph::new();
    let trunc = spawn(&mut graph, "Truncate-3")?;
    assert!(graph.connect(Endpoint::output(trunc, 0), Endpoint::input(trunc, 0)));
    graph.remove_node(trunc)?;
    assert!(graph.is_empty());
    assert!(graph.connections().is_empty());
    Ok(())
}

#[test]
fn test_rejected_connect_changes_nothing() -> Result<()> {
    let mut graph = PortGraph::new();
    let n = number(&mut graph, 1.0)?;
    let v = vector(&mut graph, &[1.0])?;
    let scale = spawn(&mut graph, "Scale Vector")?;
    assert!(graph.connect(Endpoint::output(n, 0), Endpoint::input(scale, 0)));
    let before = graph.connections();

    let attempts = [
        (Endpoint::output(v, 0), Endpoint::input(scale, 0)),
        (Endpoint::output(n, 0), Endpoint::input(scale, 1)),
        (Endpoint::output(n, 0), Endpoint::output(v, 0)),
        (Endpoint::input(scale, 0), Endpoint::input(scale, 1)),
        (Endpoint::output(n, 3), Endpoint::input(scale, 1)),
    ];
    for (a, b) in attempts {
        assert!(!graph.connect(a, b), "{a} / {b} should be rejected");
    }
    assert_eq!(graph.connections(), before);
    assert_eq!(graph.connected_outputs(n, 0).len(), 1);
    assert!(graph.connected_outputs(v, 0).is_empty());
    assert!(graph.connected_input(scale, 1).is_none());
    Ok(())
}

#[test]
fn test_typed_display_accepts_vectors() -> Result<()> {
    let mut graph = PortGraph::new();
    let v = vector(&mut graph, &[1.0, 2.0])?;
    let number_display = spawn(&mut graph, "Display")?;
    let vector_display = graph.add_node(
        NodeKind::Display,
        NodeParams::with_type(ValueType::Vector),
    )?;
    assert!(!graph.connect(Endpoint::output(v, 0), Endpoint::input(number_display, 0)));
    assert!(graph.connect(Endpoint::output(v, 0), Endpoint::input(vector_display, 0)));
    graph.evaluate(vector_display)?;
    assert_eq!(
        graph.display_value(vector_display).map(ToString::to_string),
        Some("[1, 2]".to_string())
    );
    Ok(())
}

#[test]
fn test_unknown_kind_is_rejected() {
    let mut graph = PortGraph::new();
    assert!(graph.spawn("Matrix", NodeParams::default()).is_err());
    assert!(graph.is_empty());
}
