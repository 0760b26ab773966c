//! Rust source synthesis from the resolved schema.
//!
//! Every synthesizer is a pure function `(&Schema, &GenOptions) -> Artifact`.
//! Artifacts are fragments meant to be `include!`d side by side into one
//! consumer module: they reference each other's items unqualified and never
//! emit `use` declarations.
pub mod functor;
pub mod node;
pub mod tag;
pub mod visit;
pub mod walk;

use rayon::prelude::*;

use crate::ir::{Family, FieldType, Schema};

// ------------------------------- Options ---------------------------------- //

#[derive(Debug, Clone)]
pub struct GenOptions {
    /// Path generated code uses to reach [`crate::runtime`].
    pub runtime_path: String,
    /// Synthesize per-family artifacts on the rayon pool.
    pub parallel: bool,
}

impl Default for GenOptions {
    fn default() -> Self {
        Self {
            runtime_path: "::nodegen::runtime".to_string(),
            parallel: true,
        }
    }
}

impl GenOptions {
    /// `::nodegen::runtime::<item>`
    pub(crate) fn rt(&self, item: &str) -> String {
        format!("{}::{}", self.runtime_path, item)
    }
}

/// One generated file: a name relative to the output directory plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

// ------------------------------- Writer ----------------------------------- //

/// Line-oriented source buffer with block indentation.
#[derive(Debug, Default)]
pub struct Codegen {
    out: String,
    depth: usize,
}

const INDENT: &str = "    ";

impl Codegen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard banner for every artifact.
    pub fn header(&mut self, desc: &str) {
        self.line("// GENERATED BY `nodegen`; DO NOT MODIFY.");
        self.line(format!("// {desc}"));
        self.blank();
    }

    pub fn line(&mut self, s: impl AsRef<str>) {
        let s = s.as_ref();
        if !s.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(s);
        }
        self.out.push('\n');
    }

    pub fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Write `s` (normally ending in `{`) and indent what follows.
    pub fn open(&mut self, s: impl AsRef<str>) {
        self.line(s);
        self.depth += 1;
    }

    /// Dedent, then write `s` (normally `}`).
    pub fn close(&mut self, s: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(s);
    }

    /// Dedent, write `s`, indent again: `) -> T {`, `} else {`.
    pub fn close_open(&mut self, s: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(s);
        self.depth += 1;
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

// ------------------------------- Driver ----------------------------------- //

/// Synthesize every artifact for `schema`, in a fixed order: per family
/// (declaration order) the tag enumeration then the node structures, then the
/// shared umbrella, protocol and walker artifacts.
pub fn generate(schema: &Schema, opts: &GenOptions) -> Vec<Artifact> {
    let per_family = |fam: &Family| -> [Artifact; 2] {
        tracing::debug!(family = %fam.ty_name(), variants = fam.variants.len(), "synthesizing family");
        [tag::emit(fam, opts), node::emit_family(fam, opts)]
    };

    // indexed map + collect keeps declaration order on the parallel path too
    let families: Vec<[Artifact; 2]> = if opts.parallel {
        schema.families.par_iter().map(per_family).collect()
    } else {
        schema.families.iter().map(per_family).collect()
    };

    let mut out: Vec<Artifact> = families.into_iter().flatten().collect();
    out.push(node::emit_umbrella(schema, opts));
    out.push(visit::emit(schema, opts));
    out.push(walk::emit(schema, opts));
    out
}

// ------------------------------- Helpers ---------------------------------- //

/// Rust type a field is stored as.
pub(crate) fn stored_ty(schema_ty: &FieldType) -> String {
    match schema_ty {
        FieldType::Scalar { rust } => rust.clone(),
        FieldType::Single { family } => format!("{}Ref", family.pascal()),
        FieldType::Plural { family } => format!("Vec<{}Ref>", family.pascal()),
    }
}

/// Family an owned-reference field points into.
pub(crate) fn referenced<'a>(schema: &'a Schema, ty: &FieldType) -> Option<&'a Family> {
    ty.family().and_then(|name| schema.family(name))
}

pub(crate) fn family_file(fam: &Family, suffix: &str) -> String {
    format!("{}-{suffix}.rs", fam.code.lower_hyphen())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::decl::SchemaDecl;
    use crate::lower::lower_to_ir;

    /// Small two-family schema shared by the synthesizer tests.
    pub(crate) fn sample_schema() -> Schema {
        let src = r#"{ "families": {
            "Type": { "code": "ty", "tag_enum": "TypeClass", "tag_field": "cls",
                "variants": {
                    "bool": {},
                    "int": { "nbit": "u32", "is_signed": "bool" },
                    "struct": { "members": "Type[]" }
                } },
            "Expr": { "code": "expr", "tag_enum": "ExprOp", "tag_field": "op",
                "common": { "ty": "Type" },
                "variants": {
                    "int_imm": { "lit": "i64" },
                    "add": { "a": "Expr", "b": "Expr" },
                    "call": { "args": "Expr[]", "words": "u32[]" }
                } }
        } }"#;
        lower_to_ir(&SchemaDecl::parse_named("sample", src).unwrap()).unwrap()
    }

    #[test]
    fn writer_indents_blocks() {
        let mut cg = Codegen::new();
        cg.open("fn f() {");
        cg.line("g();");
        cg.blank();
        cg.close("}");
        assert_eq!(cg.into_string(), "fn f() {\n    g();\n\n}\n");
    }

    #[test]
    fn artifacts_are_ordered_and_deterministic() {
        let schema = sample_schema();
        let par = generate(&schema, &GenOptions::default());
        let seq = generate(&schema, &GenOptions { parallel: false, ..GenOptions::default() });
        assert_eq!(par, seq);
        let names: Vec<_> = par.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(names, ["ty-reg.rs", "ty-node.rs", "expr-reg.rs", "expr-node.rs", "node.rs", "visitor.rs", "walk.rs"]);
        for artifact in &par {
            assert!(artifact.contents.starts_with("// GENERATED BY `nodegen`; DO NOT MODIFY.\n"));
        }
    }

    #[test]
    fn runtime_path_is_configurable() {
        let schema = sample_schema();
        let opts = GenOptions { runtime_path: "crate::rt".into(), ..GenOptions::default() };
        let all: String = generate(&schema, &opts).into_iter().map(|a| a.contents).collect();
        assert!(all.contains("crate::rt::InvariantViolation"));
        assert!(!all.contains("::nodegen::runtime"));
    }

    #[test]
    fn stored_types_follow_field_classes() {
        let schema = sample_schema();
        let expr = &schema.families[1];
        let call = &expr.variants[2];
        let tys: Vec<_> = expr.effective_fields(call).map(|f| stored_ty(&f.ty)).collect();
        assert_eq!(tys, ["TypeRef", "Vec<ExprRef>", "Vec<u32>"]);
    }
}
