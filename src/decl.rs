//! Raw schema declarations, exactly as written in the JSON schema files.
//!
//! Nothing here is validated beyond JSON shape; [`crate::lower`] turns a
//! [`SchemaDecl`] into the resolved [`crate::ir::Schema`].
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::lower::SchemaError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDecl {
    /// family formal name → metadata, in declaration order
    pub families: Entries<FamilyDecl>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FamilyDecl {
    /// short code seeding generated names (`expr` → `visit_expr_add`)
    pub code: String,
    /// tag enumeration name (`ExprOp`)
    pub tag_enum: String,
    /// per-instance tag accessor (`op`)
    pub tag_field: String,
    /// field name → declared type, shared by every variant
    #[serde(default)]
    pub common: Entries<String>,
    /// variant name → (field name → declared type)
    pub variants: Entries<Entries<String>>,
}

/// A JSON object decoded as an ordered list of pairs.
///
/// Duplicate keys are kept (not last-wins) so resolution can report them.
#[derive(Debug, Clone)]
pub struct Entries<V>(pub Vec<(String, V)>);

impl<V> Default for Entries<V> {
    fn default() -> Self {
        Entries(Vec::new())
    }
}

impl<V> Entries<V> {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Entries<V> {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
            type Value = Entries<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((k, v)) = map.next_entry::<String, V>()? {
                    out.push((k, v));
                }
                Ok(Entries(out))
            }
        }

        de.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl SchemaDecl {
    /// Decode one schema document. `origin` only labels diagnostics.
    pub fn parse_named(origin: &str, src: &str) -> Result<Self, SchemaError> {
        from_str_with_path(src).map_err(|(path, message)| SchemaError::Decode {
            origin: origin.to_string(),
            path,
            message,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let origin = path.to_string_lossy().to_string();
        let src = std::fs::read_to_string(path).map_err(|error| SchemaError::Read {
            origin: origin.clone(),
            message: error.to_string(),
        })?;
        Self::parse_named(&origin, &src)
    }

    /// Concatenate fragments. Cross-fragment duplicates survive and are
    /// reported by resolution like any other duplicate.
    pub fn merge(fragments: impl IntoIterator<Item = SchemaDecl>) -> SchemaDecl {
        let mut out = SchemaDecl::default();
        for fragment in fragments {
            out.families.0.extend(fragment.families.0);
        }
        out
    }
}

/// Deserialize with JSON-path context: `Err((path, message))`.
fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, (String, String)> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err((path, err.into_inner().to_string()))
        }
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declaration_order_and_duplicates() {
        let src = r#"{
            "families": {
                "Type": {
                    "code": "ty", "tag_enum": "TypeClass", "tag_field": "cls",
                    "variants": { "void": {}, "int": { "nbit": "u32" }, "void": {} }
                }
            }
        }"#;
        let decl = SchemaDecl::parse_named("inline", src).unwrap();
        let (name, ty) = decl.families.iter().next().unwrap();
        assert_eq!(name, "Type");
        assert!(ty.common.is_empty());
        let names: Vec<_> = ty.variants.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["void", "int", "void"]);
    }

    #[test]
    fn decode_errors_name_the_json_path() {
        let src = r#"{ "families": { "Type": { "code": 7, "tag_enum": "T", "tag_field": "t", "variants": {} } } }"#;
        let err = SchemaDecl::parse_named("inline", src).unwrap_err();
        match err {
            SchemaError::Decode { origin, path, .. } => {
                assert_eq!(origin, "inline");
                assert!(path.contains("code"), "path was {path}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let src = r#"{ "families": {}, "extra": 1 }"#;
        assert!(SchemaDecl::parse_named("inline", src).is_err());
    }

    #[test]
    fn merge_concatenates_fragments() {
        let a = SchemaDecl::parse_named("a", r#"{ "families": { "A": { "code": "a", "tag_enum": "AOp", "tag_field": "op", "variants": { "x": {} } } } }"#).unwrap();
        let b = SchemaDecl::parse_named("b", r#"{ "families": { "B": { "code": "b", "tag_enum": "BOp", "tag_field": "op", "variants": { "y": {} } } } }"#).unwrap();
        let merged = SchemaDecl::merge([a, b]);
        let names: Vec<_> = merged.families.iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["A", "B"]);
    }
}
