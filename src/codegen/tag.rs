//! Tag enumerations: one closed, fieldless enum per family.
use super::{Artifact, Codegen, GenOptions, family_file};
use crate::ir::Family;

pub fn emit(fam: &Family, opts: &GenOptions) -> Artifact {
    let mut cg = Codegen::new();
    cg.header(&format!("{} tag enumeration.", fam.ty_name()));
    let cases: Vec<String> = fam.variants.iter().map(|v| v.name.pascal()).collect();
    let names: Vec<String> = fam.variants.iter().map(|v| v.name.lower_snake()).collect();
    emit_closed_enum(
        &mut cg,
        opts,
        &fam.tag_name(),
        &fam.ty_name(),
        &format!("{}_VARIANT_COUNT", fam.code.upper_snake()),
        &cases,
        &names,
    );
    Artifact { file_name: family_file(fam, "reg"), contents: cg.into_string() }
}

/// Shared by family tags and the umbrella `NodeVariant`.
///
/// `family` labels `UnhandledVariant`; `count` names the public case-count
/// constant. Discriminants follow declaration order from zero.
pub(super) fn emit_closed_enum(
    cg: &mut Codegen,
    opts: &GenOptions,
    name: &str,
    family: &str,
    count: &str,
    cases: &[String],
    names: &[String],
) {
    cg.line(format!("/// Tag of a [`{family}`], one case per declared variant."));
    cg.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]");
    cg.line("#[repr(u32)]");
    cg.open(format!("pub enum {name} {{"));
    for (i, case) in cases.iter().enumerate() {
        cg.line(format!("{case} = {i},"));
    }
    cg.close("}");
    cg.blank();

    cg.line(format!("pub const {count}: usize = {};", cases.len()));
    cg.blank();

    cg.open(format!("impl {name} {{"));
    cg.open(format!("pub const ALL: [{name}; {count}] = ["));
    for case in cases {
        cg.line(format!("{name}::{case},"));
    }
    cg.close("];");
    cg.blank();
    cg.line("/// Declared (snake_case) name.");
    cg.open("pub const fn name(self) -> &'static str {");
    cg.open("match self {");
    for (case, snake) in cases.iter().zip(names) {
        cg.line(format!("{name}::{case} => \"{snake}\","));
    }
    cg.close("}");
    cg.close("}");
    cg.blank();
    cg.line("/// Decode a raw tag. An undeclared value is a fatal defect.");
    cg.line("#[track_caller]");
    cg.open(format!("pub fn from_raw(raw: u32) -> {name} {{"));
    cg.open(format!("match <{name} as ::std::convert::TryFrom<u32>>::try_from(raw) {{"));
    cg.line("Ok(tag) => tag,");
    cg.line(format!("Err(err) => {}(err),", opts.rt("unhandled")));
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();

    cg.open(format!("impl ::std::convert::TryFrom<u32> for {name} {{"));
    cg.line(format!("type Error = {};", opts.rt("UnhandledVariant")));
    cg.blank();
    cg.open("fn try_from(raw: u32) -> ::std::result::Result<Self, Self::Error> {");
    cg.open("match raw {");
    for (i, case) in cases.iter().enumerate() {
        cg.line(format!("{i} => Ok({name}::{case}),"));
    }
    cg.line(format!("_ => Err({}::new(\"{family}\", raw)),", opts.rt("UnhandledVariant")));
    cg.close("}");
    cg.close("}");
    cg.close("}");
    cg.blank();

    cg.open(format!("impl ::std::convert::From<{name}> for u32 {{"));
    cg.open(format!("fn from(tag: {name}) -> u32 {{"));
    cg.line("tag as u32");
    cg.close("}");
    cg.close("}");
    cg.blank();

    cg.open(format!("impl ::std::fmt::Display for {name} {{"));
    cg.open("fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {");
    cg.line("f.write_str(self.name())");
    cg.close("}");
    cg.close("}");
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::tests::sample_schema;

    #[test]
    fn one_case_per_variant_in_declaration_order() {
        let schema = sample_schema();
        let art = emit(&schema.families[1], &GenOptions::default());
        assert_eq!(art.file_name, "expr-reg.rs");
        let src = &art.contents;
        let int_imm = src.find("    IntImm = 0,").unwrap();
        let add = src.find("    Add = 1,").unwrap();
        let call = src.find("    Call = 2,").unwrap();
        assert!(int_imm < add && add < call);
        assert!(src.contains("pub const EXPR_VARIANT_COUNT: usize = 3;"));
        assert!(src.contains("ExprOp::IntImm => \"int_imm\","));
    }

    #[test]
    fn raw_decoding_has_exactly_one_arm_per_tag() {
        let schema = sample_schema();
        let src = emit(&schema.families[0], &GenOptions::default()).contents;
        for (i, case) in ["Bool", "Int", "Struct"].iter().enumerate() {
            let arm = format!("{i} => Ok(TypeClass::{case}),");
            assert_eq!(src.matches(&arm).count(), 1, "missing or repeated arm {arm}");
        }
        assert!(src.contains("_ => Err(::nodegen::runtime::UnhandledVariant::new(\"Type\", raw)),"));
    }
}
