//! Default traversal bodies behind the `Visitor` and `Mutator` hooks.
//!
//! `dispatch_*` routes a family node to its variant hook with one exhaustive
//! match. `walk_*` (read-only) and `rebuild_*` (owning) descend into the
//! owned-reference fields, common fields first, in declaration order.
use super::{Artifact, Codegen, GenOptions, referenced, stored_ty};
use crate::ir::{Family, Field, FieldType, Schema, Variant};

pub fn emit(schema: &Schema, _opts: &GenOptions) -> Artifact {
    let mut cg = Codegen::new();
    cg.header("Default traversal for every family.");
    for fam in &schema.families {
        emit_dispatch(&mut cg, fam);
        for variant in &fam.variants {
            emit_walk(&mut cg, schema, fam, variant);
        }
        emit_dispatch_mutate(&mut cg, fam);
        for variant in &fam.variants {
            emit_rebuild(&mut cg, schema, fam, variant);
        }
    }
    Artifact { file_name: "walk.rs".to_string(), contents: cg.into_string() }
}

fn emit_dispatch(cg: &mut Codegen, fam: &Family) {
    let code = fam.code.lower_snake();
    cg.open(format!(
        "pub fn dispatch_{code}<V: Visitor + ?Sized>(visitor: &mut V, node: &{}) {{",
        fam.ty_name()
    ));
    cg.open("match &node.kind {");
    for variant in &fam.variants {
        cg.line(format!(
            "{}::{}(variant) => visitor.visit_{}(node, variant),",
            fam.kind_name(),
            variant.name.pascal(),
            fam.hook_suffix(variant)
        ));
    }
    cg.close("}");
    cg.close("}");
    cg.blank();
}

fn emit_walk(cg: &mut Codegen, schema: &Schema, fam: &Family, variant: &Variant) {
    let refs = |fields: &[Field]| fields.iter().any(|f| f.ty.is_reference());
    let (common, own) = (refs(&fam.common), refs(&variant.fields));
    cg.open(format!(
        "pub fn walk_{}<V: Visitor + ?Sized>({}: &mut V, {}: &{}, {}: &{}) {{",
        fam.hook_suffix(variant),
        unused_prefix("visitor", common || own),
        unused_prefix("node", common),
        fam.ty_name(),
        unused_prefix("variant", own),
        fam.variant_ty(variant),
    ));
    visit_fields(cg, schema, &fam.common, "node");
    visit_fields(cg, schema, &variant.fields, "variant");
    cg.close("}");
    cg.blank();
}

fn visit_fields(cg: &mut Codegen, schema: &Schema, fields: &[Field], owner: &str) {
    for field in fields {
        let Some(target) = referenced(schema, &field.ty) else { continue };
        let hook = format!("visit_{}", target.code.lower_snake());
        let name = field.name.lower_snake();
        if matches!(field.ty, FieldType::Plural { .. }) {
            cg.open(format!("for child in &{owner}.{name} {{"));
            cg.line(format!("visitor.{hook}(&**child);"));
            cg.close("}");
        } else {
            cg.line(format!("visitor.{hook}(&*{owner}.{name});"));
        }
    }
}

fn emit_dispatch_mutate(cg: &mut Codegen, fam: &Family) {
    let code = fam.code.lower_snake();
    let common = common_names(fam);
    cg.open(format!(
        "pub fn dispatch_mutate_{code}<M: Mutator + ?Sized>(mutator: &mut M, node: {}) -> {} {{",
        fam.ref_name(),
        fam.ref_name()
    ));
    let mut binds = common.clone();
    binds.push("kind".to_string());
    cg.line(format!("let {} {{ {} }} = *node;", fam.ty_name(), binds.join(", ")));
    cg.open("match kind {");
    for variant in &fam.variants {
        let mut args = common.clone();
        args.push("variant".to_string());
        cg.line(format!(
            "{}::{}(variant) => mutator.mutate_{}({}),",
            fam.kind_name(),
            variant.name.pascal(),
            fam.hook_suffix(variant),
            args.join(", ")
        ));
    }
    cg.close("}");
    cg.close("}");
    cg.blank();
}

fn emit_rebuild(cg: &mut Codegen, schema: &Schema, fam: &Family, variant: &Variant) {
    let any_ref = fam.effective_fields(variant).any(|f| f.ty.is_reference());
    let mut params = vec![format!("{}: &mut M", unused_prefix("mutator", any_ref))];
    for field in &fam.common {
        params.push(format!("{}: {}", field.name.lower_snake(), stored_ty(&field.ty)));
    }
    params.push(format!("variant: {}", fam.variant_ty(variant)));
    cg.open(format!(
        "pub fn rebuild_{}<M: Mutator + ?Sized>({}) -> {} {{",
        fam.hook_suffix(variant),
        params.join(", "),
        fam.ref_name()
    ));
    mutate_fields(cg, schema, &fam.common);
    let own: Vec<String> = variant.fields.iter().map(|f| f.name.lower_snake()).collect();
    let payload = if own.is_empty() {
        format!("{} {{}}", fam.variant_ty(variant))
    } else {
        format!("{} {{ {} }}", fam.variant_ty(variant), own.join(", "))
    };
    cg.line(format!("let {payload} = variant;"));
    mutate_fields(cg, schema, &variant.fields);
    let mut inits = common_names(fam);
    inits.push(format!("kind: {}::{}({payload})", fam.kind_name(), variant.name.pascal()));
    cg.line(format!("Box::new({} {{ {} }})", fam.ty_name(), inits.join(", ")));
    cg.close("}");
    cg.blank();
}

fn mutate_fields(cg: &mut Codegen, schema: &Schema, fields: &[Field]) {
    for field in fields {
        let Some(target) = referenced(schema, &field.ty) else { continue };
        let hook = format!("mutate_{}", target.code.lower_snake());
        let name = field.name.lower_snake();
        if matches!(field.ty, FieldType::Plural { .. }) {
            cg.line(format!(
                "let {name} = {name}.into_iter().map(|child| mutator.{hook}(child)).collect::<Vec<_>>();"
            ));
        } else {
            cg.line(format!("let {name} = mutator.{hook}({name});"));
        }
    }
}

fn common_names(fam: &Family) -> Vec<String> {
    fam.common.iter().map(|f| f.name.lower_snake()).collect()
}

fn unused_prefix(name: &str, used: bool) -> String {
    if used { name.to_string() } else { format!("_{name}") }
}

// ------------------------------- Tests ------------------------------------ //
