//! Single-variant functor adapters.
//!
//! A trait method cannot be specialized per generic variant type, so each
//! adapter overrides the family dispatch hook and checks the tag there: a
//! matching node goes to the callback (which then owns any recursion), every
//! other node takes the default route.
use super::{Codegen, GenOptions, stored_ty};
use crate::ir::Family;

pub(super) fn emit(cg: &mut Codegen, fam: &Family, _opts: &GenOptions) {
    emit_visitor(cg, fam);
    cg.blank();
    emit_mutator(cg, fam);
}

fn emit_visitor(cg: &mut Codegen, fam: &Family) {
    let ty = fam.ty_name();
    let code = fam.code.lower_snake();
    let name = format!("{ty}FunctorVisitor");
    let bounds = format!("T: {}, F: FnMut(&{ty}, &T)", fam.variant_trait());

    cg.line(format!("/// [`Visitor`] that hands every `T` node of the `{ty}` family to `f`."));
    cg.open(format!("pub struct {name}<T, F> {{"));
    cg.line("f: F,");
    cg.line("_variant: ::std::marker::PhantomData<fn(&T)>,");
    cg.close("}");
    cg.blank();
    cg.open(format!("impl<{bounds}> {name}<T, F> {{"));
    cg.open("pub fn new(f: F) -> Self {");
    cg.line("Self { f, _variant: ::std::marker::PhantomData }");
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.open(format!("impl<{bounds}> Visitor for {name}<T, F> {{"));
    cg.open(format!("fn visit_{code}(&mut self, node: &{ty}) {{"));
    cg.open("match node.downcast::<T>() {");
    cg.line("Ok(variant) => (self.f)(node, variant),");
    cg.line(format!("Err(_) => dispatch_{code}(self, node),"));
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.open(format!("pub fn visit_{code}_functor<{bounds}>(node: &{ty}, f: F) {{"));
    cg.line(format!("{name}::<T, F>::new(f).visit_{code}(node)"));
    cg.close("}");
}

fn emit_mutator(cg: &mut Codegen, fam: &Family) {
    let ty = fam.ty_name();
    let code = fam.code.lower_snake();
    let r = fam.ref_name();
    let name = format!("{ty}FunctorMutator");
    let mut args: Vec<String> = fam.common.iter().map(|f| stored_ty(&f.ty)).collect();
    args.push("T".to_string());
    let bounds = format!("T: {}, F: FnMut({}) -> {r}", fam.variant_trait(), args.join(", "));
    let common: Vec<String> = fam.common.iter().map(|f| f.name.lower_snake()).collect();
    let mut binds = common.clone();
    binds.push("kind".to_string());
    let binds = binds.join(", ");
    let mut call = common;
    call.push("variant".to_string());

    cg.line(format!("/// [`Mutator`] that replaces every `T` node of the `{ty}` family with the"));
    cg.line("/// result of `f`, given the node's common fields and its payload.");
    cg.open(format!("pub struct {name}<T, F> {{"));
    cg.line("f: F,");
    cg.line("_variant: ::std::marker::PhantomData<fn(T)>,");
    cg.close("}");
    cg.blank();
    cg.open(format!("impl<{bounds}> {name}<T, F> {{"));
    cg.open("pub fn new(f: F) -> Self {");
    cg.line("Self { f, _variant: ::std::marker::PhantomData }");
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.open(format!("impl<{bounds}> Mutator for {name}<T, F> {{"));
    cg.open(format!("fn mutate_{code}(&mut self, node: {r}) -> {r} {{"));
    cg.open("if !node.is::<T>() {");
    cg.line(format!("return dispatch_mutate_{code}(self, node);"));
    cg.close("}");
    cg.line(format!("let {ty} {{ {binds} }} = *node;"));
    cg.open("match T::from_kind(kind) {");
    cg.line(format!("Ok(variant) => (self.f)({}),", call.join(", ")));
    cg.line(format!("Err(kind) => dispatch_mutate_{code}(self, Box::new({ty} {{ {binds} }})),"));
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.open(format!("pub fn mutate_{code}_functor<{bounds}>(node: {r}, f: F) -> {r} {{"));
    cg.line(format!("{name}::<T, F>::new(f).mutate_{code}(node)"));
    cg.close("}");
}

// ------------------------------- Tests ------------------------------------ //
