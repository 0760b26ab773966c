//! Small tree builders shared by the integration tests.
#![allow(dead_code)]

use dev_test_runner::*;

pub fn int32() -> TypeRef {
    Box::new(TypeInt::new(32, true).unwrap())
}

pub fn boolean() -> TypeRef {
    Box::new(TypeBool::new().unwrap())
}

pub fn float32() -> TypeRef {
    Box::new(TypeFloat::new(32).unwrap())
}

pub fn int_imm(lit: i64) -> ExprRef {
    Box::new(ExprIntImm::new(int32(), lit).unwrap())
}

pub fn float_imm(lit: f64) -> ExprRef {
    Box::new(ExprFloatImm::new(float32(), lit).unwrap())
}

pub fn add(a: ExprRef, b: ExprRef) -> ExprRef {
    Box::new(ExprAdd::new(int32(), a, b).unwrap())
}

pub fn local(handle: usize) -> MemoryRef {
    let ty = Box::new(TypePointer::new(int32(), 7).unwrap());
    Box::new(MemoryFunctionVariable::new(ty, Vec::<ExprRef>::new(), handle).unwrap())
}

pub fn store(handle: usize, lit: i64) -> StmtRef {
    Box::new(StmtStore::new(local(handle), int_imm(lit)).unwrap())
}

pub fn nop() -> StmtRef {
    Box::new(StmtNop::new().unwrap())
}

pub fn block(stmts: Vec<StmtRef>) -> StmtRef {
    Box::new(StmtBlock::new(stmts).unwrap())
}
