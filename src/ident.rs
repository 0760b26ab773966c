//! Case-neutral identifiers.
//!
//! Schema names arrive in whatever case the author liked (`conditional_branch`,
//! `ConditionalBranch`, `L_STMT_OP_CONDITIONAL_BRANCH` minus its prefix, ...).
//! We store them as lowercase word segments and render on demand, so two
//! spellings of the same name compare equal.
use std::fmt;

use convert_case::{Case, Casing};

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier {
    segs: Vec<String>,
}

impl Identifier {
    /// Split `name` into word segments.
    ///
    /// Separators are `_`, `-` and whitespace; a lower→upper transition and
    /// the last capital of an uppercase run followed by a lowercase letter
    /// (`HTTPServer` → `http`, `server`) also start a new word. Digits stick
    /// to the word before them.
    ///
    /// Returns `None` if the name holds no word characters or contains
    /// anything but ASCII alphanumerics and separators.
    pub fn parse(name: &str) -> Option<Self> {
        let chars: Vec<char> = name.chars().collect();
        let mut segs = Vec::<String>::new();
        let mut cur = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if c == '_' || c == '-' || c.is_whitespace() {
                if !cur.is_empty() {
                    segs.push(std::mem::take(&mut cur));
                }
                continue;
            }
            if !c.is_ascii_alphanumeric() {
                return None;
            }
            if c.is_ascii_uppercase() && !cur.is_empty() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower) {
                    segs.push(std::mem::take(&mut cur));
                }
            }
            cur.push(c.to_ascii_lowercase());
        }
        if !cur.is_empty() {
            segs.push(cur);
        }
        if segs.is_empty() || segs[0].starts_with(|c: char| c.is_ascii_digit()) {
            return None;
        }
        Some(Self { segs })
    }

    pub fn segments(&self) -> &[String] {
        &self.segs
    }

    /// `conditional-branch`
    pub fn lower_hyphen(&self) -> String {
        self.render(Case::Kebab)
    }

    /// `conditional_branch`
    pub fn lower_snake(&self) -> String {
        self.render(Case::Snake)
    }

    /// `CONDITIONAL_BRANCH`
    pub fn upper_snake(&self) -> String {
        self.render(Case::UpperSnake)
    }

    /// `ConditionalBranch`
    pub fn pascal(&self) -> String {
        self.render(Case::Pascal)
    }

    // segments are already split; only spaces may separate words here so
    // digits stay attached (`int32`, not `int_32`)
    fn render(&self, case: Case) -> String {
        self.segs.join(" ").from_case(Case::Lower).to_case(case)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lower_snake())
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.lower_hyphen())
    }
}

// ------------------------------- Tests ------------------------------------ //
