//! The IR node families declared in `schema/ir.json`, generated at build time.
#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/mem-reg.rs"));
include!(concat!(env!("OUT_DIR"), "/mem-node.rs"));
include!(concat!(env!("OUT_DIR"), "/ty-reg.rs"));
include!(concat!(env!("OUT_DIR"), "/ty-node.rs"));
include!(concat!(env!("OUT_DIR"), "/expr-reg.rs"));
include!(concat!(env!("OUT_DIR"), "/expr-node.rs"));
include!(concat!(env!("OUT_DIR"), "/stmt-reg.rs"));
include!(concat!(env!("OUT_DIR"), "/stmt-node.rs"));
include!(concat!(env!("OUT_DIR"), "/node.rs"));
include!(concat!(env!("OUT_DIR"), "/visitor.rs"));
include!(concat!(env!("OUT_DIR"), "/walk.rs"));

pub use nodegen::runtime::{InvariantViolation, UnhandledVariant, VariantMismatch};
