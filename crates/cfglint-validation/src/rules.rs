//! Simple-type validation rules
//!
//! Values are whitespace-normalized according to their built-in base type,
//! checked lexically, then checked against the facets of every restriction
//! step on the way back up the derivation chain.

use cfglint_schema::model::{Facets, SimpleType, SimpleVariety, TypeDef};
use cfglint_schema::{BuiltinType, ComplexType, Schema, TypeRef};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Outcome of a rule: the normalized value, or a violation message
pub type RuleResult<T> = std::result::Result<T, String>;

/// Type assumed for untyped character data
pub static ANY_SIMPLE_TYPE: TypeRef = TypeRef::Builtin(BuiltinType::AnySimpleType);

/// How facets measure a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueKind {
    Atomic(BuiltinType),
    List,
    Union,
}

/// Validate `raw` against `type_ref`, returning the normalized value.
///
/// # Errors
///
/// Returns the violation message of the first rule the value breaks.
pub fn check_value(schema: &Schema, type_ref: &TypeRef, raw: &str) -> RuleResult<String> {
    match schema.resolve(type_ref) {
        Some(TypeDef::Builtin(builtin)) => check_builtin(builtin, raw),
        Some(TypeDef::Simple(simple)) => check_simple_type(schema, simple, raw),
        Some(TypeDef::Complex(complex)) => match simple_content_type(schema, complex) {
            Some(content) => check_value(schema, content, raw),
            None => Ok(raw.to_string()),
        },
        None => Err(format!(
            "src-resolve: Cannot resolve the name '{}' to a(n) 'type definition' component.",
            schema.type_name(type_ref)
        )),
    }
}

/// Type of the character data of a complex type with simple content
#[must_use]
pub fn simple_content_type<'s>(
    schema: &'s Schema,
    complex: &'s ComplexType,
) -> Option<&'s TypeRef> {
    let base = complex.base.as_ref()?;
    match schema.resolve(base)? {
        TypeDef::Builtin(_) | TypeDef::Simple(_) => Some(base),
        TypeDef::Complex(parent) => simple_content_type(schema, parent),
    }
}

fn check_simple_type(schema: &Schema, simple: &SimpleType, raw: &str) -> RuleResult<String> {
    match &simple.variety {
        SimpleVariety::Restriction { base, facets } => {
            let value = check_value(schema, base, raw)?;
            let kind = value_kind(schema, base);
            check_facets(simple.display_name(), kind, facets, &value)?;
            Ok(value)
        }
        SimpleVariety::List { item } => {
            let value = collapse(raw);
            for token in value.split(' ').filter(|t| !t.is_empty()) {
                check_value(schema, item, token)?;
            }
            Ok(value)
        }
        SimpleVariety::Union { members } => members
            .iter()
            .find_map(|member| check_value(schema, member, raw).ok())
            .ok_or_else(|| {
                format!(
                    "cvc-datatype-valid.1.2.3: '{}' is not a valid value of union type '{}'.",
                    raw,
                    simple.display_name()
                )
            }),
    }
}

fn value_kind(schema: &Schema, type_ref: &TypeRef) -> ValueKind {
    match schema.resolve(type_ref) {
        Some(TypeDef::Builtin(builtin)) => ValueKind::Atomic(builtin),
        Some(TypeDef::Simple(simple)) => match &simple.variety {
            SimpleVariety::Restriction { base, .. } => value_kind(schema, base),
            SimpleVariety::List { .. } => ValueKind::List,
            SimpleVariety::Union { .. } => ValueKind::Union,
        },
        Some(TypeDef::Complex(complex)) => simple_content_type(schema, complex)
            .map_or(ValueKind::Atomic(BuiltinType::AnySimpleType), |t| {
                value_kind(schema, t)
            }),
        None => ValueKind::Atomic(BuiltinType::AnySimpleType),
    }
}

/// Check the facets of one restriction step
fn check_facets(type_name: &str, kind: ValueKind, facets: &Facets, value: &str) -> RuleResult<()> {
    let length = match kind {
        ValueKind::List => value.split(' ').filter(|t| !t.is_empty()).count(),
        ValueKind::Atomic(_) | ValueKind::Union => value.chars().count(),
    };

    if let Some(expected) = facets.length {
        if length != expected {
            return Err(format!(
                "cvc-length-valid: Value '{value}' with length = '{length}' is not facet-valid with respect to length '{expected}' for type '{type_name}'."
            ));
        }
    }
    if let Some(min) = facets.min_length {
        if length < min {
            return Err(format!(
                "cvc-minLength-valid: Value '{value}' with length = '{length}' is not facet-valid with respect to minLength '{min}' for type '{type_name}'."
            ));
        }
    }
    if let Some(max) = facets.max_length {
        if length > max {
            return Err(format!(
                "cvc-maxLength-valid: Value '{value}' with length = '{length}' is not facet-valid with respect to maxLength '{max}' for type '{type_name}'."
            ));
        }
    }

    if !facets.patterns.is_empty() && !facets.patterns.iter().any(|p| p.regex.is_match(value)) {
        let sources: Vec<&str> = facets.patterns.iter().map(|p| p.source.as_str()).collect();
        return Err(format!(
            "cvc-pattern-valid: Value '{value}' is not facet-valid with respect to pattern '{}' for type '{type_name}'.",
            sources.join("|")
        ));
    }

    if !facets.enumeration.is_empty() && !facets.enumeration.iter().any(|e| e == value) {
        return Err(format!(
            "cvc-enumeration-valid: Value '{value}' is not facet-valid with respect to enumeration '[{}]'. It must be a value from the enumeration.",
            facets.enumeration.join(", ")
        ));
    }

    let bounds = [
        ("minInclusive", &facets.min_inclusive, &[Ordering::Greater, Ordering::Equal][..]),
        ("maxInclusive", &facets.max_inclusive, &[Ordering::Less, Ordering::Equal][..]),
        ("minExclusive", &facets.min_exclusive, &[Ordering::Greater][..]),
        ("maxExclusive", &facets.max_exclusive, &[Ordering::Less][..]),
    ];
    for (facet, bound, allowed) in bounds {
        let Some(bound) = bound else { continue };
        let ordering = match kind {
            ValueKind::Atomic(builtin) if builtin.is_numeric() => compare_numbers(value, bound),
            _ => Some(value.cmp(bound.as_str())),
        };
        if !ordering.is_some_and(|o| allowed.contains(&o)) {
            return Err(format!(
                "cvc-{facet}-valid: Value '{value}' is not facet-valid with respect to {facet} '{bound}' for type '{type_name}'."
            ));
        }
    }

    Ok(())
}

fn compare_numbers(value: &str, bound: &str) -> Option<Ordering> {
    if let (Ok(a), Ok(b)) = (value.parse::<i128>(), bound.trim().parse::<i128>()) {
        return Some(a.cmp(&b));
    }
    let a = parse_float(value)?;
    let b = parse_float(bound.trim())?;
    a.partial_cmp(&b)
}

/// Collapse runs of whitespace and trim
#[must_use]
pub fn collapse(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize(builtin: BuiltinType, raw: &str) -> String {
    if builtin.preserves_whitespace() {
        raw.to_string()
    } else if builtin == BuiltinType::NormalizedString {
        raw.replace(['\t', '\n', '\r'], " ")
    } else {
        collapse(raw)
    }
}

/// Validate a value against a built-in type, returning the normalized value.
///
/// # Errors
///
/// Returns a `cvc-datatype-valid` message when the value is not in the
/// lexical space (or value range) of the type.
pub fn check_builtin(builtin: BuiltinType, raw: &str) -> RuleResult<String> {
    let value = normalize(builtin, raw);

    let valid = match builtin {
        BuiltinType::AnyType
        | BuiltinType::AnySimpleType
        | BuiltinType::String
        | BuiltinType::NormalizedString
        | BuiltinType::Token
        | BuiltinType::AnyUri => true,
        BuiltinType::Boolean => matches!(value.as_str(), "true" | "false" | "1" | "0"),
        BuiltinType::Decimal => is_decimal(&value),
        BuiltinType::Double | BuiltinType::Float => parse_float(&value).is_some(),
        BuiltinType::Name => is_name(&value, true),
        BuiltinType::NcName | BuiltinType::Id | BuiltinType::IdRef => is_name(&value, false),
        BuiltinType::NmToken => !value.is_empty() && value.chars().all(is_name_char),
        BuiltinType::Date => is_date(&value),
        BuiltinType::Integer
        | BuiltinType::Int
        | BuiltinType::Long
        | BuiltinType::Short
        | BuiltinType::Byte
        | BuiltinType::NonNegativeInteger
        | BuiltinType::PositiveInteger
        | BuiltinType::NonPositiveInteger
        | BuiltinType::NegativeInteger
        | BuiltinType::UnsignedLong
        | BuiltinType::UnsignedInt
        | BuiltinType::UnsignedShort
        | BuiltinType::UnsignedByte => is_integer_in_range(builtin, &value),
    };

    if valid {
        Ok(value)
    } else {
        Err(format!(
            "cvc-datatype-valid.1.2.1: '{}' is not a valid value for '{}'.",
            value,
            builtin.name()
        ))
    }
}

fn is_decimal(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    (!whole.is_empty() || !fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// Parse an XSD floating point literal; Rust's spellings of infinity and NaN
/// are not accepted
fn parse_float(value: &str) -> Option<f64> {
    match value {
        "INF" | "+INF" => Some(f64::INFINITY),
        "-INF" => Some(f64::NEG_INFINITY),
        "NaN" => Some(f64::NAN),
        _ if !value.is_empty()
            && value
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) =>
        {
            value.parse().ok()
        }
        _ => None,
    }
}

fn is_integer_in_range(builtin: BuiltinType, value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let Ok(n) = value.parse::<i128>() else {
        return false;
    };

    match builtin {
        BuiltinType::Int => i32::try_from(n).is_ok(),
        BuiltinType::Long => i64::try_from(n).is_ok(),
        BuiltinType::Short => i16::try_from(n).is_ok(),
        BuiltinType::Byte => i8::try_from(n).is_ok(),
        BuiltinType::NonNegativeInteger => n >= 0,
        BuiltinType::PositiveInteger => n > 0,
        BuiltinType::NonPositiveInteger => n <= 0,
        BuiltinType::NegativeInteger => n < 0,
        BuiltinType::UnsignedLong => u64::try_from(n).is_ok(),
        BuiltinType::UnsignedInt => u32::try_from(n).is_ok(),
        BuiltinType::UnsignedShort => u16::try_from(n).is_ok(),
        BuiltinType::UnsignedByte => u8::try_from(n).is_ok(),
        _ => true,
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')
}

fn is_name(value: &str, allow_colon: bool) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (is_name_start(first) || (allow_colon && first == ':'))
        && chars.all(|c| is_name_char(c) && (allow_colon || c != ':'))
}

/// `YYYY-MM-DD` with an optional `Z` or `+hh:mm` zone
fn is_date(value: &str) -> bool {
    if !value.is_ascii() {
        return false;
    }
    let (date, zone) = if let Some(date) = value.strip_suffix('Z') {
        (date, "")
    } else if value.len() > 10 {
        value.split_at(value.len() - 6)
    } else {
        (value, "")
    };

    let zone_valid = zone.is_empty() || {
        let bytes = zone.as_bytes();
        matches!(bytes[0], b'+' | b'-')
            && bytes[3] == b':'
            && zone[1..3].chars().all(|c| c.is_ascii_digit())
            && zone[4..].chars().all(|c| c.is_ascii_digit())
    };

    // chrono accepts unpadded fields, so the layout is checked first
    let layout_valid = date.len() == 10
        && date.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    zone_valid && layout_valid && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}
