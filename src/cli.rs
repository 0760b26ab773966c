//! CLI: schema → (artifacts | summary), plus the deprecated legacy scan
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexSet;

use crate::codegen::GenOptions;
use crate::ir::{FieldType, Schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate tag enums, node structs and traversal protocols from a node-family schema
#[derive(Parser, Debug)]
#[command(name = "nodegen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// resolve the schema and write every artifact
    Generate(GenerateOut),
    /// resolve the schema and print a per-family summary; writes nothing
    Check(CheckOut),
    /// (deprecated) scan prefixed tag lines and emit a minimal dispatch trait
    Legacy(LegacyOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// One or more schema files, merged in order. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    schema: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct GenerateOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// directory receiving the generated .rs files
    #[arg(short, long)]
    out_dir: PathBuf,

    /// path generated code uses to reach the runtime support module
    #[arg(long, default_value = "::nodegen::runtime")]
    runtime_path: String,

    /// synthesize families one at a time instead of on the thread pool
    #[arg(long)]
    sequential: bool,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

#[derive(clap::Parser, Debug)]
struct LegacyOut {
    /// source text holding the prefixed tag lines
    #[arg(short, long)]
    input: PathBuf,

    /// marker each tag line starts with (e.g. L_TYPE_CLASS_)
    #[arg(long)]
    prefix: String,

    /// family formal name (e.g. Type)
    #[arg(long)]
    family: String,

    /// family short code (e.g. ty)
    #[arg(long)]
    code: String,

    /// existing tag enumeration to dispatch over (e.g. TypeClass)
    #[arg(long)]
    tag_enum: String,

    /// output .rs file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load(&self) -> anyhow::Result<Schema> {
        let paths = resolve_file_path_patterns(&self.schema).context("failed to resolve schema file paths")?;
        crate::load_schema(&paths).context("invalid schema")
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                // debug path
                if target.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                // 1) resolve, all or nothing
                let schema = target.schema_settings.load()?;

                // 2) synthesize everything in memory
                let opts = GenOptions {
                    runtime_path: target.runtime_path.clone(),
                    parallel: !target.sequential,
                };
                let artifacts = crate::generate(&schema, &opts);

                // 3) emit
                let written = crate::write_artifacts(&target.out_dir, &artifacts)
                    .with_context(|| format!("failed to emit into {}", target.out_dir.display()))?;
                eprintln!(
                    "{} {} artifacts ({} changed) in {}",
                    "generated".green().bold(),
                    artifacts.len(),
                    written.len(),
                    target.out_dir.display()
                );
            }
            Command::Check(target) => {
                let schema = target.schema_settings.load()?;
                for fam in &schema.families {
                    println!("{}", summarize(&schema, fam));
                }
                eprintln!("{} {} families", "ok".green().bold(), schema.families.len());
            }
            Command::Legacy(target) => {
                let source = std::fs::read_to_string(&target.input)
                    .with_context(|| format!("failed to read {}", target.input.display()))?;
                let req = crate::legacy::LegacyRequest {
                    prefix: target.prefix.clone(),
                    family: target.family.clone(),
                    code: target.code.clone(),
                    tag_enum: target.tag_enum.clone(),
                };
                let rust_src = crate::legacy::generate_legacy(&source, &req)
                    .with_context(|| format!("failed to scan {}", target.input.display()))?;

                if let Some(out) = target.out.as_ref() {
                    let dir = match out.parent() {
                        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                        _ => PathBuf::from("."),
                    };
                    std::fs::create_dir_all(&dir)
                        .with_context(|| format!("failed to create {}", dir.display()))?;
                    crate::emit::write_atomic(&dir, out, &rust_src)?;
                } else {
                    println!("{rust_src}");
                }
            }
        }
        Ok(())
    }
}

/// `Expr (expr, ExprOp): 15 variants, 1 common fields, 4 scalar fields; references Type, Memory, Expr`
fn summarize(schema: &Schema, fam: &crate::ir::Family) -> String {
    let mut refs = IndexSet::<String>::new();
    let fields = fam.common.iter().chain(fam.variants.iter().flat_map(|v| v.fields.iter()));
    for field in fields {
        if let Some(target) = crate::codegen::referenced(schema, &field.ty) {
            refs.insert(target.ty_name());
        }
    }
    let scalars = fam
        .variants
        .iter()
        .flat_map(|v| v.fields.iter())
        .filter(|f| matches!(f.ty, FieldType::Scalar { .. }))
        .count();
    let refs = if refs.is_empty() {
        "no references".to_string()
    } else {
        format!("references {}", refs.into_iter().collect::<Vec<_>>().join(", "))
    };
    format!(
        "{} ({}, {}): {} variants, {} common fields, {} scalar fields; {}",
        fam.ty_name().bold(),
        fam.code.lower_snake(),
        fam.tag_name(),
        fam.variants.len(),
        fam.common.len(),
        scalars,
        refs
    )
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // sorted for a stable merge order
            let mut matched = Vec::new();
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
                matched.push(entry?);
            }
            if matched.is_empty() {
                bail!("glob pattern matched no files: {pattern}");
            }
            matched.sort();
            out.extend(matched);
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
