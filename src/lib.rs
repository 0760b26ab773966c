//! Schema-driven generator for tree-shaped node families.
//!
//! A JSON schema declares families of tagged variants with typed fields.
//! [`load_schema`] resolves it, [`generate`] turns it into Rust source
//! fragments (tag enums, node structs, `Visitor` / `Mutator` protocols,
//! functor adapters), and [`write_artifacts`] puts them on disk.
pub mod cli;
pub mod codegen;
pub mod decl;
pub mod emit;
pub mod ident;
pub mod ir;
pub mod legacy;
pub mod lower;
pub mod runtime;

use std::path::Path;

pub use codegen::{Artifact, GenOptions, generate};
pub use emit::{EmitError, write_artifacts};
pub use lower::SchemaError;

/// Decode every schema file, merge them in order, and resolve the result.
pub fn load_schema<P: AsRef<Path>>(paths: &[P]) -> Result<ir::Schema, SchemaError> {
    let fragments = paths
        .iter()
        .map(|path| decl::SchemaDecl::from_file(path.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    lower::lower_to_ir(&decl::SchemaDecl::merge(fragments))
}

// ------------------------------- Tests ------------------------------------ //
