//! Node structures: the family base struct, its closed `Kind` enum, one
//! payload struct per variant with a validated constructor, and the
//! umbrella `NodeVariant` / `NodeRef` / `Node` types shared by every family.
use super::{Artifact, Codegen, GenOptions, family_file, stored_ty, tag};
use crate::ir::{Family, Field, FieldType, Schema, Variant};

pub fn emit_family(fam: &Family, opts: &GenOptions) -> Artifact {
    let mut cg = Codegen::new();
    cg.header(&format!("{} node structures.", fam.ty_name()));
    emit_base(&mut cg, fam, opts);
    emit_kind(&mut cg, fam);
    emit_variant_trait(&mut cg, fam);
    for variant in &fam.variants {
        cg.blank();
        emit_variant(&mut cg, fam, variant, opts);
    }
    Artifact { file_name: family_file(fam, "node"), contents: cg.into_string() }
}

fn emit_base(cg: &mut Codegen, fam: &Family, opts: &GenOptions) {
    let ty = fam.ty_name();
    let kind = fam.kind_name();
    let tag = fam.tag_name();
    let tag_field = fam.tag_field.lower_snake();
    let bound = fam.variant_trait();
    let mismatch = opts.rt("VariantMismatch");

    cg.line(format!("/// Owned handle to a [`{ty}`]; the holder is the unique owner."));
    cg.line(format!("pub type {} = Box<{ty}>;", fam.ref_name()));
    cg.blank();
    cg.line(format!("/// A node of the `{ty}` family. The variant is fixed at construction."));
    cg.line("#[derive(Debug, Clone, PartialEq)]");
    cg.open(format!("pub struct {ty} {{"));
    for field in &fam.common {
        cg.line(format!("pub {}: {},", field.name.lower_snake(), stored_ty(&field.ty)));
    }
    cg.line(format!("pub kind: {kind},"));
    cg.close("}");
    cg.blank();

    cg.open(format!("impl {ty} {{"));
    cg.open(format!("pub fn {tag_field}(&self) -> {tag} {{"));
    cg.line(format!("self.kind.{tag_field}()"));
    cg.close("}");
    cg.blank();
    cg.open(format!("pub fn is<T: {bound}>(&self) -> bool {{"));
    cg.line(format!("self.{tag_field}() == T::TAG"));
    cg.close("}");
    cg.blank();
    cg.open(format!("pub fn downcast<T: {bound}>(&self) -> Result<&T, {mismatch}> {{"));
    cg.line(format!(
        "T::project(&self.kind).ok_or_else(|| {mismatch}::new(\"{ty}\", T::TAG.name(), self.{tag_field}().name()))"
    ));
    cg.close("}");
    cg.blank();
    cg.open(format!("pub fn downcast_mut<T: {bound}>(&mut self) -> Result<&mut T, {mismatch}> {{"));
    cg.line(format!("let found = self.{tag_field}().name();"));
    cg.line(format!("T::project_mut(&mut self.kind).ok_or_else(|| {mismatch}::new(\"{ty}\", T::TAG.name(), found))"));
    cg.close("}");
    cg.blank();
    cg.line("/// Direct children in field order: common fields, then the variant's.");
    cg.open("pub fn collect_children<'a>(&'a self, sink: &mut Vec<NodeRef<'a>>) {");
    push_children(cg, &fam.common, "self");
    cg.open("match &self.kind {");
    for variant in &fam.variants {
        cg.line(format!(
            "{kind}::{}(variant) => variant.collect_children(sink),",
            variant.name.pascal()
        ));
    }
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();
}

fn emit_kind(cg: &mut Codegen, fam: &Family) {
    let kind = fam.kind_name();
    let tag = fam.tag_name();
    cg.line(format!("/// Variant payload of a [`{}`].", fam.ty_name()));
    cg.line("#[derive(Debug, Clone, PartialEq)]");
    cg.open(format!("pub enum {kind} {{"));
    for variant in &fam.variants {
        cg.line(format!("{}({}),", variant.name.pascal(), fam.variant_ty(variant)));
    }
    cg.close("}");
    cg.blank();
    cg.open(format!("impl {kind} {{"));
    cg.open(format!("pub fn {}(&self) -> {tag} {{", fam.tag_field.lower_snake()));
    cg.open("match self {");
    for variant in &fam.variants {
        let case = variant.name.pascal();
        cg.line(format!("{kind}::{case}(_) => {tag}::{case},"));
    }
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();
}

fn emit_variant_trait(cg: &mut Codegen, fam: &Family) {
    let kind = fam.kind_name();
    cg.line(format!("/// Implemented by every `{}` variant payload.", fam.ty_name()));
    cg.open(format!("pub trait {}: Sized {{", fam.variant_trait()));
    cg.line(format!("const TAG: {};", fam.tag_name()));
    cg.line(format!("fn project(kind: &{kind}) -> Option<&Self>;"));
    cg.line(format!("fn project_mut(kind: &mut {kind}) -> Option<&mut Self>;"));
    cg.line(format!("fn from_kind(kind: {kind}) -> Result<Self, {kind}>;"));
    cg.close("}");
}

fn emit_variant(cg: &mut Codegen, fam: &Family, variant: &Variant, opts: &GenOptions) {
    let ty = fam.ty_name();
    let kind = fam.kind_name();
    let vty = fam.variant_ty(variant);
    let case = variant.name.pascal();

    cg.line(format!("/// `{}.{}`", ty, variant.name.lower_snake()));
    cg.line("#[derive(Debug, Clone, PartialEq)]");
    if variant.fields.is_empty() {
        cg.line(format!("pub struct {vty} {{}}"));
    } else {
        cg.open(format!("pub struct {vty} {{"));
        for field in &variant.fields {
            cg.line(format!("pub {}: {},", field.name.lower_snake(), stored_ty(&field.ty)));
        }
        cg.close("}");
    }
    cg.blank();

    cg.open(format!("impl {vty} {{"));
    emit_constructor(cg, fam, variant, opts);
    cg.blank();
    let has_refs = variant.fields.iter().any(|f| f.ty.is_reference());
    let sink = if has_refs { "sink" } else { "_sink" };
    cg.open(format!("pub fn collect_children<'a>(&'a self, {sink}: &mut Vec<NodeRef<'a>>) {{"));
    push_children(cg, &variant.fields, "self");
    cg.close("}");
    cg.close("}");
    cg.blank();

    // `_ => ..` is unreachable when the family has a single variant
    let single = fam.variants.len() == 1;
    cg.open(format!("impl {} for {vty} {{", fam.variant_trait()));
    cg.line(format!("const TAG: {} = {}::{case};", fam.tag_name(), fam.tag_name()));
    cg.blank();
    if single {
        cg.line("#[allow(unreachable_patterns)]");
    }
    cg.open(format!("fn project(kind: &{kind}) -> Option<&Self> {{"));
    cg.open("match kind {");
    cg.line(format!("{kind}::{case}(variant) => Some(variant),"));
    cg.line("_ => None,");
    cg.close("}");
    cg.close("}");
    cg.blank();
    if single {
        cg.line("#[allow(unreachable_patterns)]");
    }
    cg.open(format!("fn project_mut(kind: &mut {kind}) -> Option<&mut Self> {{"));
    cg.open("match kind {");
    cg.line(format!("{kind}::{case}(variant) => Some(variant),"));
    cg.line("_ => None,");
    cg.close("}");
    cg.close("}");
    cg.blank();
    if single {
        cg.line("#[allow(unreachable_patterns)]");
    }
    cg.open(format!("fn from_kind(kind: {kind}) -> Result<Self, {kind}> {{"));
    cg.open("match kind {");
    cg.line(format!("{kind}::{case}(variant) => Ok(variant),"));
    cg.line("other => Err(other),");
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();

    cg.open(format!("impl ::std::convert::From<{vty}> for {kind} {{"));
    cg.open(format!("fn from(variant: {vty}) -> {kind} {{"));
    cg.line(format!("{kind}::{case}(variant)"));
    cg.close("}");
    cg.close("}");
}

/// `ExprAdd::new(ty, a, b) -> Result<Expr, InvariantViolation>`
///
/// Owned references arrive as `impl Into<Option<_>>` so an absent child is
/// expressible and rejected here rather than at the call site.
fn emit_constructor(cg: &mut Codegen, fam: &Family, variant: &Variant, opts: &GenOptions) {
    let ty = fam.ty_name();
    let fields: Vec<&Field> = fam.effective_fields(variant).collect();

    cg.line(format!("/// Build a `{ty}` holding this variant. Every owned reference must be present."));
    if fields.len() > 7 {
        cg.line("#[allow(clippy::new_ret_no_self, clippy::too_many_arguments)]");
    } else {
        cg.line("#[allow(clippy::new_ret_no_self)]");
    }
    if fields.is_empty() {
        cg.open(format!("pub fn new() -> Result<{ty}, {}> {{", opts.rt("InvariantViolation")));
    } else {
        cg.open("pub fn new(");
        for field in &fields {
            cg.line(format!("{}: {},", field.name.lower_snake(), param_ty(&field.ty)));
        }
        cg.close_open(format!(") -> Result<{ty}, {}> {{", opts.rt("InvariantViolation")));
    }
    for field in &fields {
        let name = field.name.lower_snake();
        let at = format!("\"{ty}\", \"{}\", \"{name}\"", variant.name.lower_snake());
        match &field.ty {
            FieldType::Scalar { .. } => {}
            FieldType::Single { family } => {
                let r = format!("{}Ref", family.pascal());
                cg.line(format!("let {name} = {}::<{r}>({name}.into(), {at})?;", opts.rt("require")));
            }
            FieldType::Plural { family } => {
                let r = format!("{}Ref", family.pascal());
                cg.line(format!(
                    "let {name} = {}::<{r}>({name}.into_iter().map(|child| -> Option<{r}> {{ child.into() }}), {at})?;",
                    opts.rt("require_all")
                ));
            }
        }
    }
    let common: Vec<String> = fam.common.iter().map(|f| f.name.lower_snake()).collect();
    let own: Vec<String> = variant.fields.iter().map(|f| f.name.lower_snake()).collect();
    let payload = if own.is_empty() {
        format!("{} {{}}", fam.variant_ty(variant))
    } else {
        format!("{} {{ {} }}", fam.variant_ty(variant), own.join(", "))
    };
    let mut inits = common;
    inits.push(format!("kind: {}::{}({payload})", fam.kind_name(), variant.name.pascal()));
    cg.line(format!("Ok({ty} {{ {} }})", inits.join(", ")));
    cg.close("}");
}

fn param_ty(ty: &FieldType) -> String {
    match ty {
        FieldType::Scalar { rust } => rust.clone(),
        FieldType::Single { family } => format!("impl ::std::convert::Into<Option<{}Ref>>", family.pascal()),
        FieldType::Plural { family } => {
            format!(
                "impl ::std::iter::IntoIterator<Item = impl ::std::convert::Into<Option<{}Ref>>>",
                family.pascal()
            )
        }
    }
}

/// Push owned-reference fields of `owner` onto `sink`, in field order.
fn push_children(cg: &mut Codegen, fields: &[Field], owner: &str) {
    for field in fields {
        let name = field.name.lower_snake();
        match &field.ty {
            FieldType::Scalar { .. } => {}
            FieldType::Single { family } => {
                cg.line(format!("sink.push(NodeRef::{}(&*{owner}.{name}));", family.pascal()));
            }
            FieldType::Plural { family } => {
                cg.open(format!("for child in &{owner}.{name} {{"));
                cg.line(format!("sink.push(NodeRef::{}(&**child));", family.pascal()));
                cg.close("}");
            }
        }
    }
}

// ------------------------------- Umbrella --------------------------------- //

pub fn emit_umbrella(schema: &Schema, opts: &GenOptions) -> Artifact {
    let mut cg = Codegen::new();
    cg.header("Umbrella node types spanning every family.");

    let cases: Vec<String> = schema.families.iter().map(|f| f.ty_name()).collect();
    let names: Vec<String> = schema.families.iter().map(|f| f.name.lower_snake()).collect();
    tag::emit_closed_enum(&mut cg, opts, "NodeVariant", "Node", "NODE_VARIANT_COUNT", &cases, &names);
    cg.blank();

    cg.line("/// Borrowed node of any family.");
    cg.line("#[derive(Debug, Clone, Copy, PartialEq)]");
    cg.open("pub enum NodeRef<'a> {");
    for fam in &schema.families {
        cg.line(format!("{}(&'a {}),", fam.ty_name(), fam.ty_name()));
    }
    cg.close("}");
    cg.blank();
    cg.open("impl<'a> NodeRef<'a> {");
    cg.open("pub fn variant(self) -> NodeVariant {");
    cg.open("match self {");
    for fam in &schema.families {
        cg.line(format!("NodeRef::{0}(_) => NodeVariant::{0},", fam.ty_name()));
    }
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.open("pub fn collect_children(self, sink: &mut Vec<NodeRef<'a>>) {");
    cg.open("match self {");
    for fam in &schema.families {
        cg.line(format!("NodeRef::{}(node) => node.collect_children(sink),", fam.ty_name()));
    }
    cg.close("}");
    cg.close("}");
    cg.close("}");
    for fam in &schema.families {
        let ty = fam.ty_name();
        cg.blank();
        cg.open(format!("impl<'a> ::std::convert::From<&'a {ty}> for NodeRef<'a> {{"));
        cg.open(format!("fn from(node: &'a {ty}) -> NodeRef<'a> {{"));
        cg.line(format!("NodeRef::{ty}(node)"));
        cg.close("}");
        cg.close("}");
    }
    cg.blank();

    cg.line("/// Owned node of any family.");
    cg.line("#[derive(Debug, Clone, PartialEq)]");
    cg.open("pub enum Node {");
    for fam in &schema.families {
        cg.line(format!("{}({}),", fam.ty_name(), fam.ref_name()));
    }
    cg.close("}");
    cg.blank();
    cg.open("impl Node {");
    cg.open("pub fn variant(&self) -> NodeVariant {");
    cg.line("self.as_node_ref().variant()");
    cg.close("}");
    cg.blank();
    cg.open("pub fn as_node_ref(&self) -> NodeRef<'_> {");
    cg.open("match self {");
    for fam in &schema.families {
        cg.line(format!("Node::{0}(node) => NodeRef::{0}(&**node),", fam.ty_name()));
    }
    cg.close("}");
    cg.close("}");
    cg.close("}");
    for fam in &schema.families {
        let ty = fam.ty_name();
        let r = fam.ref_name();
        cg.blank();
        cg.open(format!("impl ::std::convert::From<{r}> for Node {{"));
        cg.open(format!("fn from(node: {r}) -> Node {{"));
        cg.line(format!("Node::{ty}(node)"));
        cg.close("}");
        cg.close("}");
    }

    Artifact { file_name: "node.rs".to_string(), contents: cg.into_string() }
}

// ------------------------------- Tests ------------------------------------ //
