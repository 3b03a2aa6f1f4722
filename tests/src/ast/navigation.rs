use crate::utils::{binop, build_expr, build_fixture, fixture_source, int, name, nodes_of};
use serde_json::json;
use snek_ast::{
    errors::AstError,
    filter::{KindFilter, NodeFilter},
    nodes::{NodeClass, NodeKind, Value},
};

#[test]
fn test_children_of_binop_filtered_by_literal_class() {
    let (arena, id) = build_expr(binop(int(1), "Add", int(2)));
    let node = arena.find_node(id).unwrap();
    let (left, right) = (node.child("left").unwrap(), node.child("right").unwrap());

    let children = arena.get_children(id, &NodeFilter::from(NodeClass::Constant));
    assert_eq!(children, vec![left, right]);

    let descendants = arena.get_descendants(id, &NodeFilter::from(NodeClass::Constant));
    assert_eq!(descendants, vec![left, right]);

    let reversed = arena.get_children(id, &NodeFilter::from(NodeClass::Constant).reverse());
    assert_eq!(reversed, vec![right, left]);
}

#[test]
fn test_children_are_in_declared_field_order() {
    let (arena, id) = build_expr(binop(name("a"), "Sub", int(2)));
    let kinds: Vec<NodeKind> = arena
        .get_children(id, &NodeFilter::new())
        .iter()
        .map(|child| arena.find_node(*child).unwrap().kind)
        .collect();
    assert_eq!(kinds, vec![NodeKind::Name, NodeKind::Sub, NodeKind::Int]);
}

#[test]
fn test_descendants_are_pre_order() {
    let (arena, id) = build_expr(binop(binop(int(1), "Mult", name("b")), "Add", int(3)));
    let kinds = |ids: Vec<u32>| -> Vec<NodeKind> {
        ids.iter()
            .map(|id| arena.find_node(*id).unwrap().kind)
            .collect()
    };
    assert_eq!(
        kinds(arena.get_descendants(id, &NodeFilter::new().include_self())),
        vec![
            NodeKind::BinOp,
            NodeKind::BinOp,
            NodeKind::Int,
            NodeKind::Mult,
            NodeKind::Name,
            NodeKind::Add,
            NodeKind::Int,
        ]
    );
    assert_eq!(
        kinds(arena.get_descendants(id, &NodeFilter::new().reverse())),
        vec![
            NodeKind::Int,
            NodeKind::Add,
            NodeKind::BinOp,
            NodeKind::Name,
            NodeKind::Mult,
            NodeKind::Int,
        ]
    );
}

#[test]
fn test_filtering_continues_below_non_matching_nodes() {
    let arena = build_fixture("token");
    let root = arena.root().unwrap();
    let ints = arena.get_descendants(root, &NodeFilter::from(NodeKind::Int));
    let values: Vec<String> = ints
        .iter()
        .map(|id| arena.find_node(*id).unwrap().value("value").unwrap().to_string())
        .collect();
    assert_eq!(
        values,
        vec!["10", "18", "10", "18", "1000", "0", "1", "8", "1", "2", "3", "2", "3", "2", "98"]
    );
}

#[test]
fn test_kind_sets_match_any_member() {
    let arena = build_fixture("token");
    let root = arena.root().unwrap();
    let filter = NodeFilter::new().kind([NodeKind::Return, NodeKind::Break]);
    let kinds: Vec<NodeKind> = arena
        .get_descendants(root, &filter)
        .iter()
        .map(|id| arena.find_node(*id).unwrap().kind)
        .collect();
    assert_eq!(
        kinds,
        vec![NodeKind::Return, NodeKind::Return, NodeKind::Break, NodeKind::Return]
    );
    assert!(kinds.iter().all(|kind| kind.is_terminus()));
}

#[test]
fn test_field_filters_match_stored_values_exactly() {
    let arena = build_fixture("token");
    let root = arena.root().unwrap();
    let amounts = arena.get_descendants(
        root,
        &NodeFilter::new().kind(NodeKind::Name).field("id", "amount"),
    );
    assert_eq!(amounts.len(), 6);

    let public = arena.get_descendants(
        root,
        &NodeFilter::new().kind(NodeKind::Call).field("func.id", "public"),
    );
    assert_eq!(public.len(), 2);

    let decorated = arena.get_descendants(
        root,
        &NodeFilter::new()
            .kind(NodeKind::Name)
            .field_any("id", vec![Value::from("view"), Value::from("external")]),
    );
    assert_eq!(decorated.len(), 4);

    let no_coercion = arena.get_descendants(root, &NodeFilter::new().field("value", 10_i64));
    assert_eq!(no_coercion.len(), 2);
    let no_coercion = arena.get_descendants(root, &NodeFilter::new().field("value", "10"));
    assert!(no_coercion.is_empty());

    let constants = arena.get_descendants(root, &NodeFilter::new().field("is_constant", true));
    assert_eq!(constants.len(), 2);
}

#[test]
fn test_ancestor_lookup() {
    let arena = build_fixture("token");
    let root = arena.root().unwrap();
    let zero = arena
        .get_descendants(root, &NodeFilter::new().kind(NodeKind::Int).field("value", 0_i64))[0];

    let function = arena
        .get_ancestor(zero, &KindFilter::from(NodeKind::FunctionDef))
        .unwrap();
    assert_eq!(
        arena.find_node(function).unwrap().str_value("name"),
        Some("fee_for")
    );

    let statement = arena.get_ancestor(zero, &KindFilter::Any).unwrap();
    assert_eq!(arena.find_node(statement).unwrap().kind, NodeKind::Return);
    assert_eq!(arena.find_parent_node(zero), Some(statement));

    let branch = arena
        .get_ancestor(zero, &KindFilter::from([NodeKind::If, NodeKind::For]))
        .unwrap();
    assert_eq!(arena.find_node(branch).unwrap().kind, NodeKind::If);

    assert_eq!(
        arena.get_ancestor(zero, &KindFilter::from(NodeKind::InterfaceDef)),
        Err(AstError::NotFound { id: zero })
    );
    assert_eq!(
        arena.get_ancestor(root, &KindFilter::Any),
        Err(AstError::NotFound { id: root })
    );
    assert_eq!(arena.find_ancestor(root, &KindFilter::Any), None);
}

#[test]
fn test_container_body_access() {
    let arena = build_fixture("token");
    let root = arena.root_node().unwrap();
    let transfer = root.body_get(6).unwrap();
    assert!(root.body_contains(transfer));
    assert_eq!(root.body_get(8), None);

    let transfer = arena.find_node(transfer).unwrap();
    assert_eq!(transfer.str_value("name"), Some("transfer"));
    assert_eq!(transfer.body_len(), 4);
    let statements: Vec<NodeKind> = transfer
        .body()
        .iter()
        .map(|id| arena.find_node(*id).unwrap().kind)
        .collect();
    assert_eq!(
        statements,
        vec![NodeKind::Assert, NodeKind::AugAssign, NodeKind::AugAssign, NodeKind::Return]
    );
    let nested = transfer.body_get(0).unwrap();
    assert!(!root.body_contains(nested));

    let ret = arena.find_node(transfer.body_get(3).unwrap()).unwrap();
    assert!(!ret.kind.is_container());
    assert!(ret.body().is_empty());
}

#[test]
fn test_node_source_slices_original_text() {
    let arena = build_fixture("token");
    let code = fixture_source("token");
    let returns = nodes_of(&arena, NodeKind::Return);
    assert_eq!(arena.node_source(returns[0], &code), Some("return True"));

    let decimals = nodes_of(&arena, NodeKind::VariableDecl)[3];
    assert_eq!(
        arena.node_source(decimals, &code),
        Some("DECIMALS: constant(uint256) = 10 ** 18")
    );
}

#[test]
fn test_annotations_side_table() {
    let (mut arena, id) = build_expr(name("x"));
    assert_eq!(arena.annotation(id, "type"), None);
    arena.annotate(id, "type", json!("uint256")).unwrap();
    assert_eq!(arena.annotation(id, "type"), Some(&json!("uint256")));
    assert_eq!(
        arena.annotate(9999, "type", json!(null)),
        Err(AstError::NotFound { id: 9999 })
    );
}
