// Resolved schema model for codegen. No raw JSON declarations here.
use crate::ident::Identifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// Opaque payload, emitted verbatim (`u32`, `Vec<u32>`, `std::num::NonZeroU32`).
    Scalar { rust: String },
    /// Exactly one child node of `family`; never absent.
    Single { family: Identifier },
    /// Ordered children of `family`; may be empty, never holds an absent element.
    Plural { family: Identifier },
}

impl FieldType {
    pub fn is_reference(&self) -> bool {
        !matches!(self, FieldType::Scalar { .. })
    }

    /// Family referenced by this field, if any.
    pub fn family(&self) -> Option<&Identifier> {
        match self {
            FieldType::Scalar { .. } => None,
            FieldType::Single { family } | FieldType::Plural { family } => Some(family),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Identifier,
    pub ty: FieldType,
}

#[derive(Debug, Clone)]
pub struct Variant {
    pub name: Identifier,
    pub fields: Vec<Field>,  // variant-specific only; common fields live on the family
}

#[derive(Debug, Clone)]
pub struct Family {
    pub name: Identifier,
    pub code: Identifier,
    pub tag_enum: Identifier,
    pub tag_field: Identifier,
    pub common: Vec<Field>,
    pub variants: Vec<Variant>,  // declaration order == tag order
}

impl Family {
    /// Common fields followed by the variant's own, i.e. constructor order.
    pub fn effective_fields<'a>(&'a self, variant: &'a Variant) -> impl Iterator<Item = &'a Field> + 'a {
        self.common.iter().chain(variant.fields.iter())
    }

    // naming helpers shared by every synthesizer

    /// `Expr`
    pub fn ty_name(&self) -> String {
        self.name.pascal()
    }
    /// `ExprRef`
    pub fn ref_name(&self) -> String {
        format!("{}Ref", self.name.pascal())
    }
    /// `ExprKind`
    pub fn kind_name(&self) -> String {
        format!("{}Kind", self.name.pascal())
    }
    /// `ExprVariant`
    pub fn variant_trait(&self) -> String {
        format!("{}Variant", self.name.pascal())
    }
    /// `ExprOp`
    pub fn tag_name(&self) -> String {
        self.tag_enum.pascal()
    }
    /// `ExprAdd`
    pub fn variant_ty(&self, variant: &Variant) -> String {
        format!("{}{}", self.name.pascal(), variant.name.pascal())
    }
    /// `expr_add`
    pub fn hook_suffix(&self, variant: &Variant) -> String {
        format!("{}_{}", self.code.lower_snake(), variant.name.lower_snake())
    }
}

/// A fully resolved schema. Families keep declaration order.
#[derive(Debug, Clone)]
pub struct Schema {
    pub families: Vec<Family>,
}

impl Schema {
    pub fn family(&self, name: &Identifier) -> Option<&Family> {
        self.families.iter().find(|f| &f.name == name)
    }
}
