//! Expression DAG — the front end that records an add/mul computation as a
//! graph instead of evaluating it once and throwing the structure away.
//!
//! A [`Value`] is a handle into a shared [`Graph`] arena (an index, not an
//! `Rc<Node>`), so `Value + Value` and `Value * Value` can implement
//! `std::ops::Add`/`std::ops::Mul` by value while every constructed node
//! still lives at a stable `NodeId`. Operator overloading on handles into a
//! shared arena keeps the DAG free of `Rc` cycles.

use std::cell::RefCell;
use std::ops::{Add, Mul};
use std::rc::Rc;
use std::str::FromStr;

use serde::Serialize;

use crate::field::{ArithmetizationMode, FieldElement};

/// Index of a node within a [`Graph`]'s arena.
pub type NodeId = usize;

/// The operator that produced a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Const,
    Var,
    Add,
    Mul,
}

#[derive(Clone, Debug)]
struct Node {
    op: Op,
    children: [Option<NodeId>; 2],
    data: FieldElement,
    is_constant: bool,
    witness_index: Option<usize>,
}

/// Shared arena backing every [`Value`] built against it.
///
/// One `Graph` corresponds to one logical build: per spec, the
/// arithmetization mode should be fixed for the lifetime of a graph rather
/// than switched mid-construction.
pub struct Graph {
    mode: ArithmetizationMode,
    nodes: RefCell<Vec<Node>>,
    witness: RefCell<Vec<FieldElement>>,
}

impl Graph {
    /// Start a fresh arena pinned to the current thread-local active mode.
    pub fn new() -> Rc<Self> {
        Self::with_mode(crate::field::active_mode())
    }

    /// Start a fresh arena pinned to `mode` for its whole lifetime.
    pub fn with_mode(mode: ArithmetizationMode) -> Rc<Self> {
        Rc::new(Self {
            mode,
            nodes: RefCell::new(Vec::new()),
            witness: RefCell::new(Vec::new()),
        })
    }

    /// The arithmetization mode this arena is pinned to.
    pub fn mode(&self) -> ArithmetizationMode {
        self.mode
    }

    /// The witness vector in creation order — one entry per non-constant
    /// node, matching spec's "append to the witness vector and record its
    /// assigned index."
    pub fn witness(&self) -> Vec<FieldElement> {
        self.witness.borrow().clone()
    }

    fn push(self: &Rc<Self>, node: Node) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(node);
        id
    }

    fn data_of(&self, id: NodeId) -> FieldElement {
        self.nodes.borrow()[id].data
    }
}

/// A handle into a [`Graph`]'s arena: the public, operator-overloadable
/// value type the rest of the crate (and external callers) build DAGs with.
#[derive(Clone)]
pub struct Value {
    graph: Rc<Graph>,
    id: NodeId,
}

impl Value {
    /// Quantize a host real into a fresh constant or variable node.
    fn from_field(graph: &Rc<Graph>, data: FieldElement, is_constant: bool) -> Self {
        let witness_index = if is_constant {
            None
        } else {
            let mut w = graph.witness.borrow_mut();
            let idx = w.len();
            w.push(data);
            Some(idx)
        };
        let node = Node {
            op: if is_constant { Op::Const } else { Op::Var },
            children: [None, None],
            data,
            is_constant,
            witness_index,
        };
        let id = graph.push(node);
        Value { graph: graph.clone(), id }
    }

    /// A non-constant input variable, quantized under `graph`'s mode.
    pub fn variable(graph: &Rc<Graph>, value: f64) -> Self {
        let data = FieldElement::quantize(graph.mode(), value);
        Self::from_field(graph, data, false)
    }

    /// A constant, quantized under `graph`'s mode.
    pub fn constant(graph: &Rc<Graph>, value: f64) -> Self {
        let data = FieldElement::quantize(graph.mode(), value);
        Self::from_field(graph, data, true)
    }

    fn graph(&self) -> &Rc<Graph> {
        &self.graph
    }

    /// This node's field value.
    pub fn data(&self) -> FieldElement {
        self.graph.data_of(self.id)
    }

    /// This value's arena index.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether this node was built from constants only (no witness entry).
    pub fn is_constant(&self) -> bool {
        self.graph.nodes.borrow()[self.id].is_constant
    }

    fn coerce(&self, other: impl Into<ValueOrScalar>) -> Value {
        match other.into() {
            ValueOrScalar::Value(v) => v,
            ValueOrScalar::Scalar(x) => Value::constant(self.graph(), x),
        }
    }

    fn binary_op(&self, other: Value, op: Op) -> Value {
        debug_assert!(
            Rc::ptr_eq(&self.graph, &other.graph),
            "Values from different graphs cannot be combined"
        );
        let lhs = self.data();
        let rhs = other.data();
        let data = match op {
            Op::Add => lhs.add(&rhs),
            Op::Mul => lhs.mul(&rhs),
            _ => unreachable!("binary_op only called for Add/Mul"),
        }
        .expect("field operands share a mode by construction");
        let is_constant = self.is_constant() && other.is_constant();
        let node = Node {
            op,
            children: [Some(self.id), Some(other.id)],
            data,
            is_constant,
            witness_index: None,
        };
        // Operation results are themselves witness-tracked like the
        // original's `Value` constructor, unless both operands are
        // constant (constant folding stays constant).
        let id = {
            let graph = self.graph.clone();
            if is_constant {
                graph.push(node)
            } else {
                let mut w = graph.witness.borrow_mut();
                let widx = w.len();
                w.push(data);
                drop(w);
                let mut node = node;
                node.witness_index = Some(widx);
                graph.push(node)
            }
        };
        Value { graph: self.graph.clone(), id }
    }

    /// Non-native ReLU: evaluate the predicate on the host and multiply by
    /// the constant 0 or 1 Value, so the proved circuit only ever contains
    /// ADD and MUL gates.
    pub fn relu(&self) -> Value {
        let positive = self.data().dequantize() > 0.0;
        let gate = if positive {
            Value::constant(self.graph(), 1.0)
        } else {
            Value::constant(self.graph(), 0.0)
        };
        self.binary_op(gate, Op::Mul)
    }

    /// Serialize to the `{const}` / `{var}` / `{operation}` tree consumed
    /// by the downstream layering compiler.
    pub fn to_dag_json(&self) -> String {
        serde_json::to_string_pretty(&self.serialize()).expect("DAG tree is always valid JSON")
    }

    fn serialize(&self) -> DagNode {
        let nodes = self.graph.nodes.borrow();
        let node = &nodes[self.id];
        match node.op {
            Op::Const => DagNode::Const {
                const_value: serde_json::Number::from_str(&crate::field::fr_to_decimal_string(
                    node.data.as_scalar(),
                ))
                .expect("a decimal digit string is always a valid JSON number"),
            },
            Op::Var => DagNode::Var {
                var: node.witness_index.expect("Var node always has a witness index"),
            },
            Op::Add | Op::Mul => {
                let left_id = node.children[0].unwrap();
                let right_id = node.children[1].unwrap();
                drop(nodes);
                let left = Value { graph: self.graph.clone(), id: left_id }.serialize();
                let right = Value { graph: self.graph.clone(), id: right_id }.serialize();
                DagNode::Operation {
                    op: if node.op == Op::Add { "add" } else { "mul" },
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }

    pub(crate) fn op(&self) -> Op {
        self.graph.nodes.borrow()[self.id].op
    }

    pub(crate) fn children(&self) -> [Option<NodeId>; 2] {
        self.graph.nodes.borrow()[self.id].children
    }

    pub(crate) fn witness_index(&self) -> Option<usize> {
        self.graph.nodes.borrow()[self.id].witness_index
    }

    pub(crate) fn graph_rc(&self) -> Rc<Graph> {
        self.graph.clone()
    }

    /// A handle to a different node in the same arena — cheap, since the
    /// arena is append-only and keyed by index.
    pub(crate) fn clone_at(&self, id: NodeId) -> Value {
        Value { graph: self.graph.clone(), id }
    }
}

/// Matches `expander_main.py`'s `Value.serialize`: externally tagged so a
/// constant serializes as `{"const":{"const_value":N}}`, not the bare
/// `{"const_value":N}` an untagged encoding would produce — the downstream
/// layering compiler's JSON handshake (spec.md §6) requires the wrapper.
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum DagNode {
    Const { const_value: serde_json::Number },
    Var { var: usize },
    Operation { op: &'static str, left: Box<DagNode>, right: Box<DagNode> },
}

enum ValueOrScalar {
    Value(Value),
    Scalar(f64),
}

impl From<Value> for ValueOrScalar {
    fn from(v: Value) -> Self {
        ValueOrScalar::Value(v)
    }
}
impl From<f64> for ValueOrScalar {
    fn from(x: f64) -> Self {
        ValueOrScalar::Scalar(x)
    }
}
impl From<i32> for ValueOrScalar {
    fn from(x: i32) -> Self {
        ValueOrScalar::Scalar(x as f64)
    }
}

impl<T> Add<T> for Value
where
    T: Into<ValueOrScalar>,
{
    type Output = Value;
    fn add(self, other: T) -> Value {
        let rhs = self.coerce(other);
        self.binary_op(rhs, Op::Add)
    }
}

impl<T> Mul<T> for Value
where
    T: Into<ValueOrScalar>,
{
    type Output = Value;
    fn mul(self, other: T) -> Value {
        let rhs = self.coerce(other);
        self.binary_op(rhs, Op::Mul)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::ArithmetizationMode;

    #[test]
    fn mul_of_two_variables_serializes_as_operation() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let a = Value::variable(&g, 1.0);
        let b = Value::variable(&g, 2.0);
        let dag = a * b;
        assert_eq!(dag.data().dequantize(), 2.0);
        let json = dag.to_dag_json();
        assert!(json.contains("\"operation\""));
        assert!(json.contains("\"op\": \"mul\""));
    }

    #[test]
    fn constant_serializes_as_wrapped_decimal_residue() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let c = Value::constant(&g, 5.0);
        let json = c.to_dag_json();
        assert!(json.contains("\"const\""));
        assert!(json.contains("\"const_value\": 5"));
    }

    #[test]
    fn witness_vector_grows_in_creation_order() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let a = Value::variable(&g, 1.0);
        let b = Value::variable(&g, 2.0);
        let _sum = a.clone() + b.clone();
        // two leaves + one non-constant op result = 3 witness entries
        assert_eq!(g.witness().len(), 3);
        assert_eq!(a.witness_index(), Some(0));
        assert_eq!(b.witness_index(), Some(1));
    }

    #[test]
    fn relu_only_ever_emits_add_and_mul_gates() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let a = Value::variable(&g, -3.0);
        let r = a.relu();
        assert_eq!(r.data().dequantize(), 0.0);
        assert_eq!(r.op(), Op::Mul);
    }

    #[test]
    fn constant_folding_does_not_grow_witness() {
        let g = Graph::with_mode(ArithmetizationMode::Pure);
        let before = g.witness().len();
        let c = Value::constant(&g, 2.0) * Value::constant(&g, 3.0);
        assert_eq!(g.witness().len(), before);
        assert!(c.is_constant());
    }
}
