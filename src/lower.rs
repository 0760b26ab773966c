//! Resolve raw declarations into the typed IR.
//!
//! All-or-nothing: either every family, variant and field resolves and every
//! generated name is unique, or the first problem comes back as a
//! [`SchemaError`] and no [`Schema`] exists.
use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::decl::{Entries, FamilyDecl, SchemaDecl};
use crate::ident::Identifier;
use crate::ir::{Family, Field, FieldType, Schema, Variant};

// ------------------------------- Errors ----------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("failed to read schema {origin}: {message}")]
    Read { origin: String, message: String },

    #[error("failed to decode schema {origin} at `{path}`: {message}")]
    Decode { origin: String, path: String, message: String },

    #[error("schema declares no families")]
    Empty,

    #[error("{at}: `{name}` is not a valid {what} name")]
    InvalidName { at: String, what: &'static str, name: String },

    #[error("{at}: {what} name `{name}` is reserved")]
    ReservedName { at: String, what: &'static str, name: String },

    #[error("family `{name}` collides with family `{first}`")]
    DuplicateFamily { name: String, first: String },

    #[error("family `{family}` reuses short code `{code}` of family `{first}`")]
    DuplicateCode { family: String, code: String, first: String },

    #[error("{family}: variant `{name}` collides with variant `{first}`")]
    DuplicateVariant { family: String, name: String, first: String },

    #[error("{at}: field `{name}` collides with field `{first}`")]
    DuplicateField { at: String, name: String, first: String },

    #[error("family `{family}` declares no variants")]
    EmptyFamily { family: String },

    #[error("{at}: malformed type `{ty}`: {reason}")]
    MalformedType { at: String, ty: String, reason: &'static str },

    #[error("{at}: type `{ty}` does not name a declared family")]
    UnknownFamily { at: String, ty: String },

    #[error("generated name `{name}` is produced by both {first} and {second}")]
    NameCollision { name: String, first: String, second: String },
}

// ------------------------------- Policy ----------------------------------- //

const PLURAL_MARKER: &str = "[]";

static PATH_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static regex")
});

static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
        "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait",
        "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
        "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
    ]
    .into_iter()
    .collect()
});

/// Names generated code binds as locals or parameters.
const RESERVED_FIELDS: &[&str] = &["kind", "node", "variant", "visitor", "mutator", "sink", "child"];

/// Type names generated code uses unqualified, plus its generic parameters.
const RESERVED_TYPES: &[&str] = &[
    "Self", "Box", "Vec", "Option", "Result", "String", "Sized", "Some", "None", "Ok", "Err",
    "FnMut", "From", "Into", "IntoIterator", "Iterator", "TryFrom", "Node", "NodeRef", "NodeVariant",
    "Visitor", "Mutator", "V", "M", "T", "F",
];

/// Items the shared umbrella file defines besides the reserved types.
const UMBRELLA_ITEMS: &[&str] = &["NODE_VARIANT_COUNT"];

/// Methods generated on every base structure; the tag accessor must not shadow them.
const RESERVED_METHODS: &[&str] = &["is", "downcast", "downcast_mut", "collect_children"];

// ------------------------------- Lowering --------------------------------- //

pub fn lower_to_ir(decl: &SchemaDecl) -> Result<Schema, SchemaError> {
    if decl.families.is_empty() {
        return Err(SchemaError::Empty);
    }

    // 1) family headers first, so field types can reference any family
    let mut heads = Vec::<Head>::with_capacity(decl.families.len());
    for (raw_name, fam) in decl.families.iter() {
        let head = lower_head(raw_name, fam)?;
        if let Some(prev) = heads.iter().find(|h| h.name == head.name) {
            return Err(SchemaError::DuplicateFamily { name: raw_name.to_string(), first: prev.raw.clone() });
        }
        if let Some(prev) = heads.iter().find(|h| h.code == head.code) {
            return Err(SchemaError::DuplicateCode {
                family: raw_name.to_string(),
                code: fam.code.clone(),
                first: prev.raw.clone(),
            });
        }
        heads.push(head);
    }
    let known: Vec<Identifier> = heads.iter().map(|h| h.name.clone()).collect();

    // 2) fields and variants
    let mut families = Vec::with_capacity(heads.len());
    for (head, (_, fam)) in heads.into_iter().zip(decl.families.iter()) {
        families.push(lower_family(head, fam, &known)?);
    }

    let schema = Schema { families };
    check_generated_names(&schema)?;
    tracing::debug!(families = schema.families.len(), "schema resolved");
    Ok(schema)
}

struct Head {
    raw: String,
    name: Identifier,
    code: Identifier,
    tag_enum: Identifier,
    tag_field: Identifier,
}

fn lower_head(raw_name: &str, fam: &FamilyDecl) -> Result<Head, SchemaError> {
    let at = raw_name.to_string();
    let name = parse_name(raw_name, &at, "family")?;
    if RESERVED_TYPES.contains(&name.pascal().as_str()) {
        return Err(SchemaError::ReservedName { at, what: "family", name: raw_name.to_string() });
    }
    let code = parse_name(&fam.code, &at, "short code")?;
    let tag_enum = parse_name(&fam.tag_enum, &at, "tag enumeration")?;
    let tag_field = parse_name(&fam.tag_field, &at, "tag field")?;
    let accessor = tag_field.lower_snake();
    if KEYWORDS.contains(accessor.as_str()) || RESERVED_METHODS.contains(&accessor.as_str()) {
        return Err(SchemaError::ReservedName { at, what: "tag field", name: fam.tag_field.clone() });
    }
    Ok(Head { raw: raw_name.to_string(), name, code, tag_enum, tag_field })
}

fn lower_family(head: Head, fam: &FamilyDecl, known: &[Identifier]) -> Result<Family, SchemaError> {
    let common_at = format!("{}.<common>", head.raw);
    let common = lower_fields(&fam.common, &common_at, &[], known)?;

    if fam.variants.is_empty() {
        return Err(SchemaError::EmptyFamily { family: head.raw });
    }
    let mut variants = Vec::<(String, Variant)>::with_capacity(fam.variants.len());
    for (raw_variant, fields) in fam.variants.iter() {
        let at = format!("{}.{}", head.raw, raw_variant);
        let name = parse_name(raw_variant, &at, "variant")?;
        if name.pascal() == "Self" {
            return Err(SchemaError::ReservedName { at, what: "variant", name: raw_variant.to_string() });
        }
        if let Some((first, _)) = variants.iter().find(|(_, v)| v.name == name) {
            return Err(SchemaError::DuplicateVariant {
                family: head.raw.clone(),
                name: raw_variant.to_string(),
                first: first.clone(),
            });
        }
        let fields = lower_fields(fields, &at, &common, known)?;
        variants.push((raw_variant.to_string(), Variant { name, fields }));
    }

    Ok(Family {
        name: head.name,
        code: head.code,
        tag_enum: head.tag_enum,
        tag_field: head.tag_field,
        common,
        variants: variants.into_iter().map(|(_, v)| v).collect(),
    })
}

/// `inherited` are fields already in scope (the family's common fields);
/// new names must not collide with them either.
fn lower_fields(
    decls: &Entries<String>,
    at: &str,
    inherited: &[Field],
    known: &[Identifier],
) -> Result<Vec<Field>, SchemaError> {
    let mut out = Vec::<Field>::with_capacity(decls.len());
    let mut raw_names = Vec::<&str>::with_capacity(decls.len());
    for (raw_field, raw_ty) in decls.iter() {
        let field_at = format!("{at}.{raw_field}");
        let name = parse_name(raw_field, &field_at, "field")?;
        let snake = name.lower_snake();
        if KEYWORDS.contains(snake.as_str()) || RESERVED_FIELDS.contains(&snake.as_str()) {
            return Err(SchemaError::ReservedName { at: field_at, what: "field", name: raw_field.to_string() });
        }
        let clash = inherited
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.name.lower_snake())
            .or_else(|| out.iter().zip(&raw_names).find(|(f, _)| f.name == name).map(|(_, r)| r.to_string()));
        if let Some(first) = clash {
            return Err(SchemaError::DuplicateField { at: at.to_string(), name: raw_field.to_string(), first });
        }
        let ty = classify_type(raw_ty, &field_at, known)?;
        out.push(Field { name, ty });
        raw_names.push(raw_field);
    }
    Ok(out)
}

fn parse_name(raw: &str, at: &str, what: &'static str) -> Result<Identifier, SchemaError> {
    Identifier::parse(raw).ok_or_else(|| SchemaError::InvalidName {
        at: at.to_string(),
        what,
        name: raw.to_string(),
    })
}

/// Classify a declared type string.
///
/// - a trailing `[]` marks plurality and is stripped first
/// - a single path segment starting uppercase must name a declared family
/// - anything else is a scalar path, emitted verbatim (`Vec<..>` if plural)
pub fn classify_type(raw: &str, at: &str, known: &[Identifier]) -> Result<FieldType, SchemaError> {
    let malformed = |reason| SchemaError::MalformedType { at: at.to_string(), ty: raw.to_string(), reason };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(malformed("empty type"));
    }
    let (base, plural) = match trimmed.strip_suffix(PLURAL_MARKER) {
        Some(base) => (base.trim_end(), true),
        None => (trimmed, false),
    };
    if base.is_empty() {
        return Err(malformed("plurality marker without a type name"));
    }
    if base.contains(['[', ']']) {
        return Err(malformed("only a single trailing `[]` is allowed"));
    }
    let segments: Vec<&str> = base.split("::").collect();
    if segments.iter().any(|s| !PATH_SEGMENT.is_match(s)) {
        return Err(malformed("expected an identifier or `::` path"));
    }

    let is_reference = segments.len() == 1 && base.starts_with(|c: char| c.is_ascii_uppercase());
    if !is_reference {
        let rust = if plural { format!("Vec<{base}>") } else { base.to_string() };
        return Ok(FieldType::Scalar { rust });
    }

    let family = Identifier::parse(base)
        .filter(|id| known.contains(id))
        .ok_or_else(|| SchemaError::UnknownFamily { at: at.to_string(), ty: raw.to_string() })?;
    Ok(if plural { FieldType::Plural { family } } else { FieldType::Single { family } })
}

/// Every generated type and function name must be unique across the schema
/// and must not shadow names generated code relies on.
fn check_generated_names(schema: &Schema) -> Result<(), SchemaError> {
    let mut seen: HashMap<String, String> =
        UMBRELLA_ITEMS.iter().map(|item| (item.to_string(), "the umbrella node file".to_string())).collect();
    let mut claim = |name: String, owner: String| -> Result<(), SchemaError> {
        if RESERVED_TYPES.contains(&name.as_str()) {
            return Err(SchemaError::NameCollision { name, first: "the generated runtime".to_string(), second: owner });
        }
        if let Some(first) = seen.get(&name) {
            return Err(SchemaError::NameCollision { name, first: first.clone(), second: owner });
        }
        seen.insert(name, owner);
        Ok(())
    };

    for fam in &schema.families {
        let owner = format!("family `{}`", fam.ty_name());
        let code = fam.code.lower_snake();
        // types
        for name in [
            fam.ty_name(),
            fam.ref_name(),
            fam.kind_name(),
            fam.variant_trait(),
            fam.tag_name(),
            format!("{}FunctorVisitor", fam.ty_name()),
            format!("{}FunctorMutator", fam.ty_name()),
            format!("{}_VARIANT_COUNT", fam.code.upper_snake()),
        ] {
            claim(name, owner.clone())?;
        }
        // family-level functions
        for name in [
            format!("visit_{code}"),
            format!("mutate_{code}"),
            format!("dispatch_{code}"),
            format!("dispatch_mutate_{code}"),
            format!("visit_{code}_functor"),
            format!("mutate_{code}_functor"),
        ] {
            claim(name, owner.clone())?;
        }
        for variant in &fam.variants {
            let owner = format!("variant `{}.{}`", fam.ty_name(), variant.name);
            let hook = fam.hook_suffix(variant);
            claim(fam.variant_ty(variant), owner.clone())?;
            for name in [
                format!("visit_{hook}"),
                format!("mutate_{hook}"),
                format!("walk_{hook}"),
                format!("rebuild_{hook}"),
            ] {
                claim(name, owner.clone())?;
            }
        }
    }
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn lower_src(src: &str) -> Result<Schema, SchemaError> {
        lower_to_ir(&SchemaDecl::parse_named("inline", src).unwrap())
    }

    fn expr_schema(extra_variant: &str) -> String {
        format!(
            r#"{{ "families": {{
                "Type": {{ "code": "ty", "tag_enum": "TypeClass", "tag_field": "cls",
                    "variants": {{ "int": {{ "nbit": "u32" }}, "struct": {{ "members": "Type[]" }} }} }},
                "Expr": {{ "code": "expr", "tag_enum": "ExprOp", "tag_field": "op",
                    "common": {{ "ty": "Type" }},
                    "variants": {{ "add": {{ "a": "Expr", "b": "Expr" }}{extra_variant} }} }}
            }} }}"#
        )
    }

    #[test]
    fn resolves_references_and_scalars() {
        let schema = lower_src(&expr_schema("")).unwrap();
        assert_eq!(schema.families.len(), 2);
        let ty = &schema.families[0];
        assert_eq!(ty.variants[0].fields[0].ty, FieldType::Scalar { rust: "u32".into() });
        let members = &ty.variants[1].fields[0].ty;
        assert_eq!(members, &FieldType::Plural { family: Identifier::parse("Type").unwrap() });

        let expr = &schema.families[1];
        let add = &expr.variants[0];
        let order: Vec<_> = expr.effective_fields(add).map(|f| f.name.lower_snake()).collect();
        assert_eq!(order, ["ty", "a", "b"]);
    }

    #[test]
    fn classify_handles_markers_and_paths() {
        let known = [Identifier::parse("Expr").unwrap()];
        assert_eq!(
            classify_type("u32[]", "t", &known).unwrap(),
            FieldType::Scalar { rust: "Vec<u32>".into() }
        );
        assert_eq!(
            classify_type("std::num::NonZeroU32", "t", &known).unwrap(),
            FieldType::Scalar { rust: "std::num::NonZeroU32".into() }
        );
        assert!(matches!(classify_type("Expr[]", "t", &known), Ok(FieldType::Plural { .. })));
        assert!(matches!(classify_type("", "t", &known), Err(SchemaError::MalformedType { .. })));
        assert!(matches!(classify_type("[]", "t", &known), Err(SchemaError::MalformedType { .. })));
        assert!(matches!(classify_type("Expr[][]", "t", &known), Err(SchemaError::MalformedType { .. })));
        assert!(matches!(classify_type("Vec<u32>", "t", &known), Err(SchemaError::MalformedType { .. })));
        assert!(matches!(classify_type("Stmt", "t", &known), Err(SchemaError::UnknownFamily { .. })));
    }

    #[test]
    fn unknown_reference_names_the_field() {
        let src = expr_schema(r#", "load": { "src_ptr": "Memory" }"#);
        let err = lower_src(&src).unwrap_err();
        assert_eq!(err, SchemaError::UnknownFamily { at: "Expr.load.src_ptr".into(), ty: "Memory".into() });
    }

    #[test]
    fn variant_collision_after_normalization() {
        let src = expr_schema(r#", "bool_imm": {}, "BoolImm": {}"#);
        let err = lower_src(&src).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateVariant { ref name, ref first, .. } if name == "BoolImm" && first == "bool_imm"));
    }

    #[test]
    fn variant_field_may_not_shadow_common_field() {
        let src = expr_schema(r#", "cast": { "Ty": "Type" }"#);
        assert!(matches!(lower_src(&src), Err(SchemaError::DuplicateField { .. })));
    }

    #[test]
    fn duplicate_codes_and_families_are_fatal() {
        let dup_code = r#"{ "families": {
            "A": { "code": "x", "tag_enum": "AOp", "tag_field": "op", "variants": { "a": {} } },
            "B": { "code": "x", "tag_enum": "BOp", "tag_field": "op", "variants": { "b": {} } } } }"#;
        assert!(matches!(lower_src(dup_code), Err(SchemaError::DuplicateCode { .. })));

        let dup_family = r#"{ "families": {
            "MemRef": { "code": "a", "tag_enum": "AOp", "tag_field": "op", "variants": { "a": {} } },
            "mem_ref": { "code": "b", "tag_enum": "BOp", "tag_field": "op", "variants": { "b": {} } } } }"#;
        assert!(matches!(lower_src(dup_family), Err(SchemaError::DuplicateFamily { .. })));
    }

    #[test]
    fn reserved_and_colliding_names_are_rejected() {
        let keyword_field = expr_schema(r#", "cast": { "type": "u32" }"#);
        assert!(matches!(lower_src(&keyword_field), Err(SchemaError::ReservedName { .. })));

        let internal_field = expr_schema(r#", "cast": { "kind": "u32" }"#);
        assert!(matches!(lower_src(&internal_field), Err(SchemaError::ReservedName { .. })));

        // `ExprKind` is already the payload enum of `Expr`
        let generated = expr_schema(r#", "kind": {}"#);
        assert!(matches!(lower_src(&generated), Err(SchemaError::NameCollision { .. })));
    }

    #[test]
    fn variant_count_consts_may_not_collide() {
        let umbrella_code = r#"{ "families": {
            "Graph": { "code": "node", "tag_enum": "GraphOp", "tag_field": "op", "variants": { "edge": {} } } } }"#;
        let err = lower_src(umbrella_code).unwrap_err();
        assert!(matches!(err, SchemaError::NameCollision { ref name, .. } if name == "NODE_VARIANT_COUNT"));
    }

    #[test]
    fn prelude_trait_names_are_reserved() {
        for name in ["From", "Into", "IntoIterator"] {
            let src = format!(
                r#"{{ "families": {{ "{name}": {{ "code": "x", "tag_enum": "XOp", "tag_field": "op", "variants": {{ "a": {{}} }} }} }} }}"#
            );
            assert!(matches!(lower_src(&src), Err(SchemaError::ReservedName { what: "family", .. })), "{name}");
        }
        let tag = r#"{ "families": {
            "Op": { "code": "op", "tag_enum": "Into", "tag_field": "op", "variants": { "a": {} } } } }"#;
        assert!(matches!(lower_src(tag), Err(SchemaError::NameCollision { ref name, .. }) if name == "Into"));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert_eq!(lower_src(r#"{ "families": {} }"#).unwrap_err(), SchemaError::Empty);
        let no_variants = r#"{ "families": { "A": { "code": "a", "tag_enum": "AOp", "tag_field": "op", "variants": {} } } }"#;
        assert!(matches!(lower_src(no_variants), Err(SchemaError::EmptyFamily { .. })));
    }
}
