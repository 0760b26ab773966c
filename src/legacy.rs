//! Deprecated prefix-scan ingestion.
//!
//! Scans an existing source text for line-initial tokens carrying a marker
//! prefix (`L_TYPE_CLASS_VOID,`) and emits a minimal dispatch trait with one
//! empty, argument-free hook per token. Tags of the existing enumeration
//! that the text never lists fall through to a no-op arm.
//! Prefer a JSON schema and `nodegen generate`.
use indexmap::IndexSet;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::ident::Identifier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyError {
    #[error("the case prefix must not be empty")]
    EmptyPrefix,
    #[error("no line starts with the prefix `{prefix}`")]
    NoMatches { prefix: String },
    #[error("line {line}: `{token}` is not a valid case name")]
    InvalidCase { line: usize, token: String },
    #[error("`{name}` is not a valid {what} name")]
    InvalidName { what: &'static str, name: String },
}

/// Naming inputs for the emitted trait.
#[derive(Debug, Clone)]
pub struct LegacyRequest {
    /// marker every case line starts with (`L_TYPE_CLASS_`)
    pub prefix: String,
    /// family formal name (`Type` → `TypeVisitor`)
    pub family: String,
    /// short code (`ty` → `visit_ty_void`)
    pub code: String,
    /// existing tag enumeration the trait dispatches over
    pub tag_enum: String,
}

static RUST_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static regex"));

/// Every line-initial token after `prefix`, in order of first appearance.
pub fn extract_cases(src: &str, prefix: &str) -> Result<Vec<Identifier>, LegacyError> {
    if prefix.is_empty() {
        return Err(LegacyError::EmptyPrefix);
    }
    let pattern = format!(r"(?m)^[ \t]*{}([A-Za-z0-9_]+)", regex::escape(prefix));
    let re = Regex::new(&pattern).map_err(|_| LegacyError::InvalidName { what: "prefix", name: prefix.to_string() })?;

    let mut cases = IndexSet::<Identifier>::new();
    for caps in re.captures_iter(src) {
        let token = &caps[1];
        let line = src[..caps.get(0).map_or(0, |m| m.start())].matches('\n').count() + 1;
        let case = Identifier::parse(token).ok_or_else(|| LegacyError::InvalidCase { line, token: token.to_string() })?;
        if !cases.insert(case) {
            tracing::debug!(line, token, "repeated case skipped");
        }
    }
    if cases.is_empty() {
        return Err(LegacyError::NoMatches { prefix: prefix.to_string() });
    }
    Ok(cases.into_iter().collect())
}

/// Render the dispatch trait for the cases found in `src`.
pub fn generate_legacy(src: &str, req: &LegacyRequest) -> Result<String, LegacyError> {
    tracing::warn!("the prefix-scan path is deprecated; declare the family in a JSON schema instead");
    let name = |what, raw: &str| {
        Identifier::parse(raw)
            .filter(|_| RUST_IDENT.is_match(raw))
            .ok_or_else(|| LegacyError::InvalidName { what, name: raw.to_string() })
    };
    let family = name("family", &req.family)?;
    let code = name("short code", &req.code)?;
    let tag_enum = name("tag enumeration", &req.tag_enum)?;
    let cases = extract_cases(src, &req.prefix)?;
    tracing::info!(family = %family.pascal(), cases = cases.len(), "extracted legacy cases");

    let code = code.lower_snake();
    let tag = tag_enum.pascal();
    let mut out = String::new();
    out.push_str("// GENERATED BY `nodegen legacy`; DO NOT MODIFY.\n");
    out.push_str(&format!("// {} tag visitor.\n\n", family.pascal()));
    out.push_str(&format!("pub trait {}Visitor {{\n", family.pascal()));
    out.push_str(&format!("    fn visit_{code}(&mut self, tag: {tag}) {{\n"));
    out.push_str("        match tag {\n");
    for case in &cases {
        out.push_str(&format!("            {tag}::{} => self.visit_{code}_{}(),\n", case.pascal(), case.lower_snake()));
    }
    // the existing enumeration may hold tags the scanned text never lists
    out.push_str("            #[allow(unreachable_patterns)]\n");
    out.push_str("            _ => {}\n");
    out.push_str("        }\n");
    out.push_str("    }\n");
    for case in &cases {
        out.push_str(&format!("\n    fn visit_{code}_{}(&mut self) {{}}\n", case.lower_snake()));
    }
    out.push_str("}\n");
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //
