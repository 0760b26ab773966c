//! The `Visitor` and `Mutator` protocols.
//!
//! One trait each spans every family. Each family gets a dispatch hook
//! (`visit_expr`) and one hook per variant (`visit_expr_add`); every default
//! body delegates to the matching item in `walk.rs`, so overriding a hook
//! replaces exactly that step of the traversal.
use super::{Artifact, Codegen, GenOptions, functor, stored_ty};
use crate::ir::Schema;

pub fn emit(schema: &Schema, opts: &GenOptions) -> Artifact {
    let mut cg = Codegen::new();
    cg.header("Traversal protocols and functor adapters.");
    emit_visitor(&mut cg, schema);
    cg.blank();
    emit_mutator(&mut cg, schema);
    for fam in &schema.families {
        cg.blank();
        functor::emit(&mut cg, fam, opts);
    }
    Artifact { file_name: "visitor.rs".to_string(), contents: cg.into_string() }
}

fn emit_visitor(cg: &mut Codegen, schema: &Schema) {
    cg.line("/// Read-only pre-order traversal. Every hook defaults to visiting the");
    cg.line("/// node's children.");
    cg.open("pub trait Visitor {");
    cg.open("fn visit(&mut self, node: NodeRef<'_>) {");
    cg.open("match node {");
    for fam in &schema.families {
        cg.line(format!("NodeRef::{}(node) => self.visit_{}(node),", fam.ty_name(), fam.code.lower_snake()));
    }
    cg.close("}");
    cg.close("}");
    for fam in &schema.families {
        let code = fam.code.lower_snake();
        let ty = fam.ty_name();
        cg.blank();
        cg.open(format!("fn visit_{code}(&mut self, node: &{ty}) {{"));
        cg.line(format!("dispatch_{code}(self, node)"));
        cg.close("}");
        for variant in &fam.variants {
            let hook = fam.hook_suffix(variant);
            cg.blank();
            cg.open(format!("fn visit_{hook}(&mut self, node: &{ty}, variant: &{}) {{", fam.variant_ty(variant)));
            cg.line(format!("walk_{hook}(self, node, variant)"));
            cg.close("}");
        }
    }
    cg.close("}");
}

fn emit_mutator(cg: &mut Codegen, schema: &Schema) {
    cg.line("/// Owning rewrite. Each hook consumes a node and returns its replacement,");
    cg.line("/// which may hold a different variant of the same family.");
    cg.open("pub trait Mutator {");
    cg.open("fn mutate(&mut self, node: Node) -> Node {");
    cg.open("match node {");
    for fam in &schema.families {
        cg.line(format!(
            "Node::{0}(node) => Node::{0}(self.mutate_{1}(node)),",
            fam.ty_name(),
            fam.code.lower_snake()
        ));
    }
    cg.close("}");
    cg.close("}");
    for fam in &schema.families {
        let code = fam.code.lower_snake();
        let r = fam.ref_name();
        cg.blank();
        cg.open(format!("fn mutate_{code}(&mut self, node: {r}) -> {r} {{"));
        cg.line(format!("dispatch_mutate_{code}(self, node)"));
        cg.close("}");

        let params: Vec<String> = fam
            .common
            .iter()
            .map(|f| format!("{}: {}", f.name.lower_snake(), stored_ty(&f.ty)))
            .collect();
        let mut args: Vec<String> = fam.common.iter().map(|f| f.name.lower_snake()).collect();
        args.push("variant".to_string());
        for variant in &fam.variants {
            let hook = fam.hook_suffix(variant);
            let mut params = params.clone();
            params.push(format!("variant: {}", fam.variant_ty(variant)));
            cg.blank();
            cg.open(format!("fn mutate_{hook}(&mut self, {}) -> {r} {{", params.join(", ")));
            cg.line(format!("rebuild_{hook}(self, {})", args.join(", ")));
            cg.close("}");
        }
    }
    cg.close("}");
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::sample_schema;

    fn src() -> String {
        emit(&sample_schema(), &GenOptions::default()).contents
    }

    #[test]
    fn visitor_has_a_hook_per_family_and_variant() {
        let src = src();
        assert!(src.contains("NodeRef::Expr(node) => self.visit_expr(node),"));
        assert!(src.contains("fn visit_ty(&mut self, node: &Type) {\n        dispatch_ty(self, node)"));
        assert!(src.contains("fn visit_expr_add(&mut self, node: &Expr, variant: &ExprAdd) {\n        walk_expr_add(self, node, variant)"));
        let visitor = &src[..src.find("pub trait Mutator").unwrap()];
        assert_eq!(visitor.matches("fn visit_").count(), 2 + 6);
    }

    #[test]
    fn mutator_hooks_take_common_fields_then_payload() {
        let src = src();
        assert!(src.contains("Node::Type(node) => Node::Type(self.mutate_ty(node)),"));
        assert!(src.contains("fn mutate_expr_add(&mut self, ty: TypeRef, variant: ExprAdd) -> ExprRef {\n        rebuild_expr_add(self, ty, variant)"));
        assert!(src.contains("fn mutate_ty_int(&mut self, variant: TypeInt) -> TypeRef {"));
    }
}
