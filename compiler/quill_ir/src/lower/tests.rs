use pretty_assertions::assert_eq;

use super::*;
use crate::ast::build::*;
use crate::node::{LambdaId, Number};

fn lower_ok(script: &Script) -> SharedTree {
    let interner = SharedInterner::new();
    match lower(script, &interner) {
        Ok(tree) => tree,
        Err(e) => panic!("lowering failed: {e}"),
    }
}

/// All identifier references to `name`, in arena order.
fn refs_to(tree: &SyntaxTree, name: &str) -> Vec<VarRef> {
    (0..tree.len())
        .map(|i| tree.kind(NodeId::new(u32::try_from(i).unwrap_or(u32::MAX))))
        .filter_map(|kind| match kind {
            NodeKind::Identifier(var) if tree.name(var.name()) == name => Some(var),
            _ => None,
        })
        .collect()
}

fn first_lambda(tree: &SyntaxTree) -> LambdaId {
    (0..tree.len())
        .find_map(|i| match tree.kind(NodeId::new(u32::try_from(i).unwrap_or(u32::MAX))) {
            NodeKind::Lambda(id) => Some(id),
            _ => None,
        })
        .unwrap_or(LambdaId(u32::MAX))
}

#[test]
fn int_literals_pick_the_smallest_kind() {
    let tree = lower_ok(&script(&[], vec![int(5), int(1 << 40)]));
    let stmts = tree.children(tree.root());
    assert_eq!(tree.kind(stmts[0]), NodeKind::Number(Number::Int(5)));
    assert_eq!(tree.kind(stmts[1]), NodeKind::Number(Number::Long(1 << 40)));
}

#[test]
fn params_occupy_leading_slots() {
    let tree = lower_ok(&script(&["a", "b"], vec![add(ident("a"), ident("b"))]));
    let frame = tree.root_frame().map(|f| (f.param_count(), f.size()));
    assert_eq!(frame, Some((2, 2)));
    match refs_to(&tree, "b").as_slice() {
        [VarRef::Local(local)] => assert_eq!((local.hops, local.slot), (0, 1)),
        other => panic!("unexpected refs {other:?}"),
    }
}

#[test]
fn var_is_visible_after_its_block() {
    let tree = lower_ok(&script(
        &[],
        vec![block(vec![var("x", Some(int(1)))]), ident("x")],
    ));
    assert!(matches!(refs_to(&tree, "x").as_slice(), [VarRef::Local(_)]));
}

#[test]
fn let_is_invisible_after_its_block() {
    let tree = lower_ok(&script(
        &[],
        vec![block(vec![let_("x", Some(int(1)))]), ident("x")],
    ));
    assert!(matches!(refs_to(&tree, "x").as_slice(), [VarRef::Context(_)]));
}

#[test]
fn redeclaring_in_the_same_block_reuses_the_slot() {
    let tree = lower_ok(&script(
        &[],
        vec![var("x", Some(int(1))), var("x", Some(int(2)))],
    ));
    assert_eq!(tree.root_frame().map(FrameLayout::size), Some(1));
}

#[test]
fn lambda_reads_captured_slot_through_one_hop() {
    let tree = lower_ok(&script(
        &[],
        vec![
            var("n", Some(int(1))),
            var("f", Some(lambda(&["x"], add(ident("x"), ident("n"))))),
        ],
    ));
    match refs_to(&tree, "n").as_slice() {
        [VarRef::Local(local)] => assert_eq!((local.hops, local.slot), (1, 0)),
        other => panic!("unexpected refs {other:?}"),
    }
    match refs_to(&tree, "x").as_slice() {
        [VarRef::Local(local)] => assert_eq!((local.hops, local.slot), (0, 0)),
        other => panic!("unexpected refs {other:?}"),
    }
}

#[test]
fn recursive_lambda_records_its_binding_slot() {
    let body = ternary(
        lt(ident("n"), int(2)),
        int(1),
        mul(ident("n"), fcall("fact", vec![sub(ident("n"), int(1))])),
    );
    let tree = lower_ok(&script(
        &[],
        vec![var("fact", Some(lambda(&["n"], body))), fcall("fact", vec![int(5)])],
    ));
    assert_eq!(tree.lambda(first_lambda(&tree)).self_slot, Some(0));
}

#[test]
fn non_recursive_lambda_has_no_binding_slot() {
    let tree = lower_ok(&script(
        &[],
        vec![var("inc", Some(lambda(&["n"], add(ident("n"), int(1)))))],
    ));
    assert_eq!(tree.lambda(first_lambda(&tree)).self_slot, None);
}

#[test]
fn yield_marks_only_its_own_frame_as_generator() {
    let tree = lower_ok(&script(
        &[],
        vec![var("g", Some(lambda(&[], block(vec![yield_(Some(int(1)))]))))],
    ));
    assert_eq!(tree.root_frame().map(|f| f.generator), Some(false));
    let lambda = tree.lambda(first_lambda(&tree));
    assert!(tree.frame(lambda.frame).generator);

    let tree = lower_ok(&script(&[], vec![yield_(Some(int(1)))]));
    assert_eq!(tree.root_frame().map(|f| f.generator), Some(true));
}

#[test]
fn foreach_iterable_sees_the_outer_binding() {
    let tree = lower_ok(&script(
        &[],
        vec![
            var("x", Some(array(vec![int(1)]))),
            foreach(DeclKind::Let, "x", ident("x"), block(vec![ident("x")])),
        ],
    ));
    let slots: Vec<u32> = refs_to(&tree, "x")
        .into_iter()
        .filter_map(|var| match var {
            VarRef::Local(local) => Some(local.slot),
            VarRef::Context(_) => None,
        })
        .collect();
    assert_eq!(slots, vec![0, 1]);
}

#[test]
fn optional_children_are_invalid() {
    let tree = lower_ok(&script(&[], vec![if_(boolean(true), int(1))]));
    let stmt = tree.children(tree.root())[0];
    assert_eq!(tree.child_count(stmt), 3);
    assert!(!tree.child(stmt, 2).is_valid());
}

#[test]
fn spans_attach_to_wrapped_nodes() {
    let tree = lower_ok(&script(&[], vec![int(7).at(Span::new(3, 4))]));
    let stmt = tree.children(tree.root())[0];
    assert_eq!(tree.span(stmt), Span::new(3, 4));
}

#[test]
fn const_requires_initializer() {
    let bad = Script {
        params: Vec::new(),
        return_type: None,
        body: vec![Ast::Declare {
            kind: DeclKind::Const,
            name: "k".to_owned(),
            ty: None,
            init: None,
        }],
    };
    let err = lower(&bad, &SharedInterner::new()).err();
    assert!(matches!(err, Some(LowerError::ConstWithoutInit { .. })));
}

#[test]
fn literal_is_not_an_assignment_target() {
    let err = lower(&script(&[], vec![assign(int(1), int(2))]), &SharedInterner::new()).err();
    assert!(matches!(err, Some(LowerError::InvalidAssignTarget { .. })));
}

#[test]
fn duplicate_parameters_are_rejected() {
    let err = lower(&script(&["a", "a"], vec![]), &SharedInterner::new()).err();
    assert!(matches!(err, Some(LowerError::DuplicateParameter { .. })));
}
