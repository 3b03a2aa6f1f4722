use crate::utils::{
    binop, build_expr, build_expr_at, build_fixture, dec, detached, int, list, name, nodes_of,
    string,
};
use rustc_hash::FxHashSet;
use serde_json::json;
use snek_ast::{equality::NodeRef, filter::NodeFilter, nodes::NodeKind};

#[test]
fn test_equality_ignores_location() {
    let expr = binop(int(1), "Add", name("x"));
    let (a, a_id) = build_expr_at(expr.clone(), 1);
    let (b, b_id) = build_expr_at(expr, 40);
    assert_ne!(
        a.find_node(a_id).unwrap().location,
        b.find_node(b_id).unwrap().location
    );
    assert_eq!(a.node_ref(a_id).unwrap(), b.node_ref(b_id).unwrap());
    assert_eq!(
        a.structural_hash(a_id).unwrap(),
        b.structural_hash(b_id).unwrap()
    );
}

#[test]
fn test_equality_is_an_equivalence() {
    let expr = list(vec![int(1), string("a"), binop(name("y"), "Sub", dec("0.5"))]);
    let (a, a_id) = build_expr_at(expr.clone(), 1);
    let (b, b_id) = build_expr_at(expr.clone(), 2);
    let (c, c_id) = build_expr_at(expr, 3);
    let (a, a_again, b, c) = (
        a.node_ref(a_id).unwrap(),
        a.node_ref(a_id).unwrap(),
        b.node_ref(b_id).unwrap(),
        c.node_ref(c_id).unwrap(),
    );
    assert_eq!(a, a_again);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(b, c);
    assert_eq!(a, c);
}

#[test]
fn test_differences_in_semantic_fields_are_detected() {
    let cases = [
        (int(1), int(2)),
        (int(1), dec("1.0")),
        (name("x"), string("x")),
        (binop(int(1), "Add", int(2)), binop(int(1), "Sub", int(2))),
        (binop(int(1), "Add", int(2)), binop(int(2), "Add", int(1))),
        (list(vec![int(1)]), list(vec![int(1), int(1)])),
        (list(vec![int(1)]), json!({"ast_type": "Tuple", "elements": [int(1)]})),
    ];
    for (left, right) in cases {
        let (a, a_id) = build_expr(left.clone());
        let (b, b_id) = build_expr(right.clone());
        assert_ne!(
            a.node_ref(a_id).unwrap(),
            b.node_ref(b_id).unwrap(),
            "{left} should differ from {right}"
        );
    }
}

#[test]
fn test_folded_literal_equals_parsed_literal() {
    let (mut arena, id) = build_expr(binop(int(1), "Add", int(2)));
    let folded = arena.evaluate(id).unwrap();
    let (parsed, parsed_id) = build_expr(int(3));
    assert_eq!(
        arena.node_ref(folded).unwrap(),
        parsed.node_ref(parsed_id).unwrap()
    );
}

#[test]
fn test_synthesized_node_equals_parsed_node() {
    let (mut arena, id) = build_expr(binop(name("a"), "Mult", int(4)));
    let synthesized = detached(&mut arena, &binop(name("a"), "Mult", int(4)));
    assert_eq!(arena.find_node(synthesized).unwrap().location, None);
    assert!(arena.nodes_equal(id, synthesized));
    assert!(!arena.nodes_equal(id, 9999));
}

#[test]
fn test_annotations_do_not_affect_equality() {
    let (mut arena, id) = build_expr(name("x"));
    let copy = arena.deep_copy(id).unwrap();
    arena
        .annotate(id, "type", json!({"name": "uint256"}))
        .unwrap();
    assert!(arena.nodes_equal(id, copy));
    assert_eq!(arena.structural_hash(id), arena.structural_hash(copy));
}

#[test]
fn test_node_refs_deduplicate_in_hash_sets() {
    let arena = build_fixture("token");
    let senders = arena.get_descendants(
        arena.root().unwrap(),
        &NodeFilter::new()
            .kind(NodeKind::Attribute)
            .field("attr", "sender"),
    );
    assert_eq!(senders.len(), 4);
    let unique: FxHashSet<NodeRef> = senders
        .iter()
        .map(|id| arena.node_ref(*id).unwrap())
        .collect();
    assert_eq!(unique.len(), 1);

    let names: FxHashSet<NodeRef> = nodes_of(&arena, NodeKind::Name)
        .into_iter()
        .map(|id| arena.node_ref(id).unwrap())
        .collect();
    assert!(names.len() > 1);
    assert!(names.iter().all(|n| n.node.kind == NodeKind::Name));
}
