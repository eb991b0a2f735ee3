//! TypeScript-syntax rendering of type values.
//!
//! Used for error messages, tracing output and the CLI.

use std::fmt;

use crate::types::*;

/// Convert a number to a string the way JavaScript's `Number#toString(10)` does.
///
/// ECMAScript uses scientific notation when `|x| < 1e-6` or `|x| >= 1e21`.
pub fn format_js_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let abs_val = value.abs();
    if !(1e-6..1e21).contains(&abs_val) {
        // Rust prints "1e21" where JavaScript prints "1e+21".
        let s = format!("{value:e}");
        match s.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => s,
        }
    } else if value.fract() == 0.0 && abs_val < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// The string a literal contributes to a template literal.
pub fn literal_to_string(literal: &LiteralValue) -> String {
    match literal {
        LiteralValue::String(s) => s.to_string(),
        LiteralValue::Number(n) => format_js_number(n.0),
        LiteralValue::Boolean(b) => b.to_string(),
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            other => write!(f, "{other}")?,
        }
    }
    f.write_str("\"")
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Wrap types that would bind looser than the surrounding operator.
struct Operand<'a>(&'a TypeValue);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            TypeValue::Union(_) | TypeValue::Intersection(_) | TypeValue::Function(_) => {
                write!(f, "({})", self.0)
            }
            other => write!(f, "{other}"),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write_quoted(f, s),
            LiteralValue::Number(n) => f.write_str(&format_js_number(n.0)),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for TypeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeValue::Never => f.write_str("never"),
            TypeValue::Unknown => f.write_str("unknown"),
            TypeValue::Any => f.write_str("any"),
            TypeValue::Literal(literal) => write!(f, "{literal}"),
            TypeValue::Primitive(kind) => f.write_str(kind.name()),
            TypeValue::Tuple(tuple) => {
                f.write_str("[")?;
                let mut first = true;
                for element in &tuple.elements {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{}", element.type_value)?;
                    if element.optional {
                        f.write_str("?")?;
                    }
                }
                if let Some(rest) = &tuple.rest {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "...{}[]", Operand(rest))?;
                }
                f.write_str("]")
            }
            TypeValue::Record(record) => {
                if record.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                let mut first = true;
                for (name, field) in &record.fields {
                    if !first {
                        f.write_str("; ")?;
                    }
                    first = false;
                    if field.readonly {
                        f.write_str("readonly ")?;
                    }
                    if is_identifier(name) {
                        f.write_str(name)?;
                    } else {
                        write_quoted(f, name)?;
                    }
                    if field.optional {
                        f.write_str("?")?;
                    }
                    write!(f, ": {}", field.type_value)?;
                }
                f.write_str(" }")
            }
            TypeValue::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    match member {
                        TypeValue::Function(_) => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                Ok(())
            }
            TypeValue::Intersection(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" & ")?;
                    }
                    write!(f, "{}", Operand(member))?;
                }
                Ok(())
            }
            TypeValue::Function(function) => {
                f.write_str("(")?;
                for (i, param) in function.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "arg{i}: {param}")?;
                }
                if let Some(rest) = &function.rest {
                    if !function.params.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...args: {}[]", Operand(rest))?;
                }
                write!(f, ") => {}", function.returns)
            }
            TypeValue::TemplateString(spans) => {
                f.write_str("`")?;
                for span in spans {
                    match span {
                        TemplateSpan::Text(text) => {
                            for ch in text.chars() {
                                match ch {
                                    '`' => f.write_str("\\`")?,
                                    '$' => f.write_str("\\$")?,
                                    other => write!(f, "{other}")?,
                                }
                            }
                        }
                        TemplateSpan::Type(hole) => write!(f, "${{{hole}}}")?,
                    }
                }
                f.write_str("`")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::union_of;

    #[test]
    fn js_number_formatting() {
        assert_eq!(format_js_number(42.0), "42");
        assert_eq!(format_js_number(-0.0), "0");
        assert_eq!(format_js_number(1.5), "1.5");
        assert_eq!(format_js_number(1e21), "1e+21");
        assert_eq!(format_js_number(1e-7), "1e-7");
    }

    #[test]
    fn display_record_with_modifiers() {
        let record = TypeValue::Record(
            RecordType::new()
                .with_field("title", FieldInfo::new(TypeValue::STRING).with_readonly(true))
                .with_field("done", FieldInfo::new(TypeValue::BOOLEAN).with_optional(true))
                .with_field("x-y", FieldInfo::new(TypeValue::NUMBER)),
        );
        assert_eq!(
            record.to_string(),
            "{ readonly title: string; done?: boolean; \"x-y\": number }"
        );
    }

    #[test]
    fn display_tuple_and_union() {
        let tuple = TypeValue::Tuple(TupleType::new(
            vec![
                TupleElement::required(TypeValue::literal_number(1.0)),
                TupleElement::optional(TypeValue::STRING),
            ],
            Some(union_of([TypeValue::STRING, TypeValue::NUMBER])),
        ));
        assert_eq!(tuple.to_string(), "[1, string?, ...(string | number)[]]");
    }

    #[test]
    fn display_function_and_template() {
        let function = TypeValue::function(vec![TypeValue::STRING], TypeValue::VOID);
        assert_eq!(function.to_string(), "(arg0: string) => void");
        let template = TypeValue::TemplateString(vec![
            TemplateSpan::Text(Name::from("on")),
            TemplateSpan::Type(TypeValue::STRING),
        ]);
        assert_eq!(template.to_string(), "`on${string}`");
    }
}
