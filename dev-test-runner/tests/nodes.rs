mod common;

use common::*;
use dev_test_runner::*;

#[test]
fn absent_single_reference_is_rejected() {
    let err = ExprAdd::new(int32(), None::<ExprRef>, int_imm(2)).unwrap_err();
    assert_eq!(err, InvariantViolation { family: "Expr", variant: "add", field: "a", index: None });

    let err = ExprLoad::new(None::<TypeRef>, local(0)).unwrap_err();
    assert_eq!(err.field, "ty");
}

#[test]
fn plural_reference_may_be_empty_but_not_hold_holes() {
    let empty = StmtBlock::new(Vec::<StmtRef>::new()).unwrap();
    assert_eq!(empty.downcast::<StmtBlock>().unwrap().stmts.len(), 0);

    let err = TypeStruct::new(vec![Some(int32()), None, Some(boolean())]).unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(err.to_string(), "Type.struct: owned reference `members`[1] is absent");
}

#[test]
fn struct_collects_members_in_order_and_no_scalars() {
    let ty = TypeStruct::new(vec![int32(), boolean()]).unwrap();
    let mut sink = Vec::new();
    ty.collect_children(&mut sink);
    assert_eq!(sink.len(), 2);
    assert_eq!(sink[0], NodeRef::Type(&*int32()));
    assert_eq!(sink[1], NodeRef::Type(&*boolean()));

    // scalars only: nothing to collect
    let scalar_only = int32();
    let mut sink = Vec::new();
    scalar_only.collect_children(&mut sink);
    assert!(sink.is_empty());
}

#[test]
fn common_fields_are_collected_first() {
    let expr = add(int_imm(1), int_imm(2));
    let mut sink = Vec::new();
    expr.collect_children(&mut sink);
    let kinds: Vec<_> = sink.iter().map(|child| child.variant()).collect();
    assert_eq!(kinds, [NodeVariant::Type, NodeVariant::Expr, NodeVariant::Expr]);
}

#[test]
fn downcast_checks_the_tag() {
    let mut expr = add(int_imm(1), int_imm(2));
    assert!(expr.is::<ExprAdd>());
    assert_eq!(expr.op(), ExprOp::Add);

    let err = expr.downcast::<ExprSub>().unwrap_err();
    assert_eq!(err, VariantMismatch { family: "Expr", expected: "sub", found: "add" });

    let payload = expr.downcast_mut::<ExprAdd>().unwrap();
    payload.b = int_imm(5);
    let b = &expr.downcast::<ExprAdd>().unwrap().b;
    assert_eq!(b.downcast::<ExprIntImm>().unwrap().lit, 5);
}

#[test]
fn payload_can_be_taken_by_value() {
    let Expr { ty, kind } = *int_imm(9);
    assert_eq!(ty, int32());
    let imm = ExprIntImm::from_kind(kind).unwrap();
    assert_eq!(imm.lit, 9);

    let Expr { kind, .. } = *add(int_imm(1), int_imm(2));
    assert!(ExprIntImm::from_kind(kind).is_err());
}

#[test]
fn structurally_identical_trees_compare_equal() {
    assert_eq!(block(vec![store(1, 2), nop()]), block(vec![store(1, 2), nop()]));
    assert_ne!(block(vec![store(1, 2)]), block(vec![store(1, 3)]));
}

#[test]
fn umbrella_node_tracks_its_family() {
    let node = Node::from(store(0, 1));
    assert_eq!(node.variant(), NodeVariant::Stmt);
    assert!(matches!(node.as_node_ref(), NodeRef::Stmt(stmt) if stmt.op() == StmtOp::Store));
    assert_eq!(NodeRef::from(&*int32()).variant(), NodeVariant::Type);
}
