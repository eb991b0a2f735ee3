//! String intrinsic type evaluation.
//!
//! Handles the string manipulation intrinsics:
//! - Uppercase<T>
//! - Lowercase<T>
//! - Capitalize<T>
//! - Uncapitalize<T>

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::expr::StringIntrinsicKind;
use crate::normalize::{template_string_of, union_of};
use crate::types::*;

use super::super::evaluate::TypeEvaluator;

impl TypeEvaluator {
    /// Apply a string intrinsic to an evaluated argument.
    /// Distributes over unions and transforms string literal types.
    pub(crate) fn evaluate_string_intrinsic(
        &mut self,
        kind: StringIntrinsicKind,
        arg: &TypeValue,
    ) -> EvalResult<TypeValue> {
        match arg {
            TypeValue::Union(members) => {
                let mut transformed = Vec::with_capacity(members.len());
                for member in members {
                    transformed.push(self.evaluate_string_intrinsic(kind, member)?);
                }
                Ok(union_of(transformed))
            }

            TypeValue::Literal(LiteralValue::String(text)) => {
                Ok(TypeValue::literal_string(&apply_string_transform(kind, text)))
            }

            TypeValue::TemplateString(spans) => {
                Ok(apply_string_intrinsic_to_template(kind, spans))
            }

            // `string` itself, and the top and bottom types, pass through unchanged
            TypeValue::Primitive(PrimitiveKind::String) | TypeValue::Any | TypeValue::Never => {
                Ok(arg.clone())
            }

            _ => Err(EvaluationError::InvalidIntrinsicArgument {
                intrinsic: kind.name(),
                found: arg.to_string(),
            }),
        }
    }
}

/// Transform the text spans of a template string.
///
/// Capitalize/Uncapitalize only touch the first character, so they apply
/// only when the template starts with text. Holes are kept as they are.
fn apply_string_intrinsic_to_template(kind: StringIntrinsicKind, spans: &[TemplateSpan]) -> TypeValue {
    let mut new_spans: Vec<TemplateSpan> = Vec::with_capacity(spans.len());
    for (index, span) in spans.iter().enumerate() {
        match span {
            TemplateSpan::Text(text) => {
                let transformed = match kind {
                    StringIntrinsicKind::Uppercase | StringIntrinsicKind::Lowercase => {
                        apply_string_transform(kind, text)
                    }
                    StringIntrinsicKind::Capitalize | StringIntrinsicKind::Uncapitalize
                        if index == 0 =>
                    {
                        apply_string_transform(kind, text)
                    }
                    StringIntrinsicKind::Capitalize | StringIntrinsicKind::Uncapitalize => {
                        text.to_string()
                    }
                };
                new_spans.push(TemplateSpan::Text(Name::from(transformed)));
            }
            TemplateSpan::Type(hole) => new_spans.push(TemplateSpan::Type(hole.clone())),
        }
    }
    template_string_of(new_spans)
}

/// Apply a string transformation to a string value
fn apply_string_transform(kind: StringIntrinsicKind, s: &str) -> String {
    match kind {
        StringIntrinsicKind::Uppercase => s.to_uppercase(),
        StringIntrinsicKind::Lowercase => s.to_lowercase(),
        StringIntrinsicKind::Capitalize => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => {
                    let upper: String = first.to_uppercase().collect();
                    upper + chars.as_str()
                }
                None => String::new(),
            }
        }
        StringIntrinsicKind::Uncapitalize => {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => {
                    let lower: String = first.to_lowercase().collect();
                    lower + chars.as_str()
                }
                None => String::new(),
            }
        }
    }
}
