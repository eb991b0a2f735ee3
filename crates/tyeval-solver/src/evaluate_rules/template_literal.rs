//! Template literal evaluation and matching.
//!
//! Evaluation expands literal holes into the cartesian product of
//! concatenations; holes that denote infinite sets (`string`, `number`, ...)
//! remain as spans of a `TemplateString`.
//!
//! Matching splits the subject text at the pattern's literal anchors. An
//! `infer` hole followed by an anchor takes the text up to the first
//! occurrence of the anchor when more holes follow, and otherwise matches the
//! anchor as a suffix. Two holes with no anchor between them cannot be split
//! deterministically and are reported as ambiguous.

use tracing::trace;

use crate::diagnostics::EvalResult;
use crate::env::Environment;
use crate::expr::{Expression, TemplatePart};
use crate::format::{format_js_number, literal_to_string};
use crate::normalize::{template_string_of, union_of};
use crate::relation::{is_assignable, is_numeric_text, text_fits_hole};
use crate::types::*;

use super::super::evaluate::TypeEvaluator;
use super::infer_pattern::{InferBindings, MatchStatus, Variance, try_match};

/// Choices for one part of a template under expansion.
struct PartChoices {
    alternatives: Vec<TemplateSpan>,
    /// The part as a single span, used when expansion is over the limit.
    whole: TemplateSpan,
}

/// A unit of subject text: one character, or a non-literal hole of a
/// `TemplateString` subject.
#[derive(Clone, Debug)]
enum Token {
    Char(char),
    Hole(TypeValue),
}

enum Segment<'e> {
    Text(String),
    /// A hole whose value is a union of literals.
    Alternatives(Vec<String>),
    /// A hole with a non-literal value: `${number}`, `${string}`.
    Check(TypeValue),
    Capture(&'e Expression),
}

impl TypeEvaluator {
    pub(crate) fn evaluate_template_literal(
        &mut self,
        parts: &[TemplatePart],
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        let mut choices: Vec<PartChoices> = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => choices.push(PartChoices {
                    alternatives: vec![TemplateSpan::Text(text.clone())],
                    whole: TemplateSpan::Text(text.clone()),
                }),
                TemplatePart::Hole(expr) => {
                    let value = self.evaluate_in(expr, env)?;
                    if value.is_never() {
                        return Ok(TypeValue::Never);
                    }
                    choices.push(PartChoices {
                        alternatives: hole_alternatives(&value),
                        whole: TemplateSpan::Type(value),
                    });
                }
            }
        }

        let combinations = choices
            .iter()
            .fold(1usize, |acc, c| acc.saturating_mul(c.alternatives.len()));
        if combinations > self.options().template_expansion_limit {
            trace!(
                combinations,
                limit = self.options().template_expansion_limit,
                "evaluate_template_literal: expansion over limit, keeping holes"
            );
            return Ok(template_string_of(choices.into_iter().map(|c| c.whole)));
        }

        let mut results = Vec::with_capacity(combinations);
        let mut cursor = vec![0usize; choices.len()];
        loop {
            results.push(template_string_of(
                choices
                    .iter()
                    .zip(&cursor)
                    .map(|(c, &index)| c.alternatives[index].clone()),
            ));
            // Advance the rightmost position that still has choices left.
            let mut position = choices.len();
            loop {
                if position == 0 {
                    return Ok(union_of(results));
                }
                position -= 1;
                cursor[position] += 1;
                if cursor[position] < choices[position].alternatives.len() {
                    break;
                }
                cursor[position] = 0;
            }
        }
    }

    // =========================================================================
    // Matching
    // =========================================================================

    pub(crate) fn match_template_literal(
        &mut self,
        subject: &TypeValue,
        parts: &[TemplatePart],
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        let Some(tokens) = subject_tokens(subject) else {
            return Ok(MatchStatus::Failed);
        };

        let mut segments: Vec<Segment<'_>> = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                TemplatePart::Text(text) => push_text(&mut segments, text),
                TemplatePart::Hole(expr) if expr.contains_infer() => {
                    segments.push(Segment::Capture(expr));
                }
                TemplatePart::Hole(expr) => {
                    let value = self.evaluate_in(expr, env)?;
                    match literal_texts(&value) {
                        Some(texts) if texts.is_empty() => return Ok(MatchStatus::Failed),
                        Some(mut texts) if texts.len() == 1 => {
                            let text = texts.pop().unwrap_or_default();
                            push_text(&mut segments, &text);
                        }
                        Some(texts) => segments.push(Segment::Alternatives(texts)),
                        None => segments.push(Segment::Check(value)),
                    }
                }
            }
        }

        match self.match_segments(&tokens, &segments, env, variance, bindings)? {
            MatchStatus::Ambiguous(_) => Ok(MatchStatus::Ambiguous(describe_template(parts))),
            status => Ok(status),
        }
    }

    fn match_segments(
        &mut self,
        tokens: &[Token],
        segments: &[Segment<'_>],
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        let Some((first, rest)) = segments.split_first() else {
            return Ok(MatchStatus::from_bool(tokens.is_empty()));
        };

        match first {
            Segment::Text(text) => match strip_text(tokens, text) {
                Some(remaining) => self.match_segments(remaining, rest, env, variance, bindings),
                None => Ok(MatchStatus::Failed),
            },
            Segment::Alternatives(options) => {
                for option in options {
                    let Some(remaining) = strip_text(tokens, option) else {
                        continue;
                    };
                    let mut scratch = bindings.clone();
                    match self.match_segments(remaining, rest, env, variance, &mut scratch)? {
                        MatchStatus::Matched => {
                            *bindings = scratch;
                            return Ok(MatchStatus::Matched);
                        }
                        MatchStatus::Failed => {}
                        ambiguous => return Ok(ambiguous),
                    }
                }
                Ok(MatchStatus::Failed)
            }
            Segment::Check(value) => {
                for split in 0..=tokens.len() {
                    if !tokens_fit(&tokens[..split], value) {
                        continue;
                    }
                    let mut scratch = bindings.clone();
                    match self.match_segments(&tokens[split..], rest, env, variance, &mut scratch)? {
                        MatchStatus::Matched => {
                            *bindings = scratch;
                            return Ok(MatchStatus::Matched);
                        }
                        MatchStatus::Failed => {}
                        ambiguous => return Ok(ambiguous),
                    }
                }
                Ok(MatchStatus::Failed)
            }
            Segment::Capture(expr) => {
                let holes_follow = rest
                    .iter()
                    .skip(1)
                    .any(|s| !matches!(s, Segment::Text(_)));
                let anchors: Vec<&str> = match rest.first() {
                    None => {
                        return self.capture_tokens(tokens, expr, env, variance, bindings);
                    }
                    Some(Segment::Text(anchor)) => vec![anchor.as_str()],
                    Some(Segment::Alternatives(options)) => {
                        options.iter().map(String::as_str).collect()
                    }
                    Some(Segment::Capture(_) | Segment::Check(_)) => {
                        return Ok(MatchStatus::Ambiguous(String::new()));
                    }
                };

                for anchor in anchors {
                    let split = if holes_follow {
                        find_text(tokens, anchor)
                    } else {
                        suffix_start(tokens, anchor)
                    };
                    let Some(split) = split else {
                        continue;
                    };
                    let mut scratch = bindings.clone();
                    let status = self
                        .capture_tokens(&tokens[..split], expr, env, variance, &mut scratch)
                        .and_then(|status| match status {
                            MatchStatus::Matched => self.match_segments(
                                &tokens[split..],
                                rest,
                                env,
                                variance,
                                &mut scratch,
                            ),
                            other => Ok(other),
                        })?;
                    match status {
                        MatchStatus::Matched => {
                            *bindings = scratch;
                            return Ok(MatchStatus::Matched);
                        }
                        MatchStatus::Failed => {}
                        ambiguous => return Ok(ambiguous),
                    }
                }
                Ok(MatchStatus::Failed)
            }
        }
    }

    /// Match the captured slice against the hole's pattern. A capture whose
    /// `infer` constraint is `number` or `boolean` is read as that literal.
    fn capture_tokens(
        &mut self,
        tokens: &[Token],
        expr: &Expression,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        let mut captured = tokens_value(tokens);
        if let Expression::Infer(infer) = expr
            && let Some(constraint) = &infer.constraint
        {
            let constraint = self.evaluate_in(constraint, env)?;
            captured = coerce_capture(captured, &constraint);
        }
        try_match!(self.match_into(&captured, expr, env, variance, bindings));
        Ok(MatchStatus::Matched)
    }
}

fn hole_alternatives(value: &TypeValue) -> Vec<TemplateSpan> {
    let mut alternatives = Vec::new();
    for member in value.union_members() {
        match member {
            TypeValue::Primitive(PrimitiveKind::Boolean) => {
                alternatives.push(TemplateSpan::Type(TypeValue::literal_bool(false)));
                alternatives.push(TemplateSpan::Type(TypeValue::literal_bool(true)));
            }
            TypeValue::Primitive(kind @ (PrimitiveKind::Null | PrimitiveKind::Undefined)) => {
                alternatives.push(TemplateSpan::Text(Name::from(kind.name())));
            }
            other => alternatives.push(TemplateSpan::Type(other.clone())),
        }
    }
    alternatives
}

/// The texts of a hole value made only of literals, `boolean`, `null` and `undefined`.
fn literal_texts(value: &TypeValue) -> Option<Vec<String>> {
    if value.is_never() {
        return Some(Vec::new());
    }
    hole_alternatives(value)
        .into_iter()
        .map(|span| match span {
            TemplateSpan::Text(text) => Some(text.to_string()),
            TemplateSpan::Type(TypeValue::Literal(literal)) => Some(literal_to_string(&literal)),
            TemplateSpan::Type(_) => None,
        })
        .collect()
}

fn push_text(segments: &mut Vec<Segment<'_>>, text: &str) {
    if text.is_empty() {
        return;
    }
    match segments.last_mut() {
        Some(Segment::Text(existing)) => existing.push_str(text),
        _ => segments.push(Segment::Text(text.to_string())),
    }
}

fn subject_tokens(subject: &TypeValue) -> Option<Vec<Token>> {
    match subject {
        TypeValue::Literal(LiteralValue::String(text)) => Some(text.chars().map(Token::Char).collect()),
        TypeValue::Primitive(PrimitiveKind::String) => Some(vec![Token::Hole(TypeValue::STRING)]),
        TypeValue::TemplateString(spans) => {
            let mut tokens = Vec::new();
            for span in spans {
                match span {
                    TemplateSpan::Text(text) => tokens.extend(text.chars().map(Token::Char)),
                    TemplateSpan::Type(hole) => tokens.push(Token::Hole(hole.clone())),
                }
            }
            Some(tokens)
        }
        _ => None,
    }
}

fn strip_text<'t>(tokens: &'t [Token], text: &str) -> Option<&'t [Token]> {
    let mut remaining = tokens;
    for expected in text.chars() {
        match remaining.split_first() {
            Some((Token::Char(c), tail)) if *c == expected => remaining = tail,
            _ => return None,
        }
    }
    Some(remaining)
}

fn starts_with_text(tokens: &[Token], text: &str) -> bool {
    strip_text(tokens, text).is_some()
}

/// Index of the first occurrence of `text` in `tokens`.
fn find_text(tokens: &[Token], text: &str) -> Option<usize> {
    (0..=tokens.len()).find(|&start| starts_with_text(&tokens[start..], text))
}

/// Start index of `text` when `tokens` ends with it.
fn suffix_start(tokens: &[Token], text: &str) -> Option<usize> {
    let start = tokens.len().checked_sub(text.chars().count())?;
    starts_with_text(&tokens[start..], text).then_some(start)
}

fn tokens_value(tokens: &[Token]) -> TypeValue {
    template_string_of(tokens.iter().map(|token| match token {
        Token::Char(c) => TemplateSpan::Text(Name::from(c.to_string())),
        Token::Hole(hole) => TemplateSpan::Type(hole.clone()),
    }))
}

fn tokens_fit(tokens: &[Token], hole: &TypeValue) -> bool {
    if tokens.iter().all(|t| matches!(t, Token::Char(_))) {
        let text: String = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Char(c) => Some(*c),
                Token::Hole(_) => None,
            })
            .collect();
        return text_fits_hole(&text, hole);
    }
    is_assignable(&tokens_value(tokens), hole)
}

/// `"42"` captured by `infer N extends number` is the number literal `42`.
fn coerce_capture(captured: TypeValue, constraint: &TypeValue) -> TypeValue {
    let Some(text) = captured.as_string_literal() else {
        return captured;
    };
    if is_assignable(&captured, constraint) {
        return captured;
    }
    if is_numeric_text(text)
        && let Ok(number) = text.parse::<f64>()
        && format_js_number(number) == text
    {
        let candidate = TypeValue::literal_number(number);
        if is_assignable(&candidate, constraint) {
            return candidate;
        }
    }
    if let Some(flag) = match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    } {
        let candidate = TypeValue::literal_bool(flag);
        if is_assignable(&candidate, constraint) {
            return candidate;
        }
    }
    captured
}

fn describe_template(parts: &[TemplatePart]) -> String {
    let mut description = String::from("`");
    for part in parts {
        match part {
            TemplatePart::Text(text) => description.push_str(text),
            TemplatePart::Hole(Expression::Infer(infer)) => {
                description.push_str("${infer ");
                description.push_str(&infer.name);
                description.push('}');
            }
            TemplatePart::Hole(Expression::Lit(value)) => {
                description.push_str(&format!("${{{value}}}"));
            }
            TemplatePart::Hole(Expression::Ref(name)) => {
                description.push_str(&format!("${{{name}}}"));
            }
            TemplatePart::Hole(_) => description.push_str("${...}"),
        }
    }
    description.push('`');
    description
}
