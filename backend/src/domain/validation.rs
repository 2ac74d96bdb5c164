//! Per-kind field validation rule tables.
//!
//! Rules are pure predicates over raw field values, evaluated in declared
//! order with no I/O. Checking walks the kind's fields in declaration
//! order; an unset field or the first failing predicate halts the walk and
//! produces a [`ValidationReport`] carrying the kind name, the candidate
//! field values, and the failing field with the 0-based rule index.

use std::fmt;

use chrono::NaiveDate;
use serde_json::{Value, json};

use super::entity::{Document, Kind};

/// Pure predicate over one raw field value.
pub type Predicate = fn(&Value) -> bool;

/// Declared rules for one field of a kind.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    /// Field name inside the entity document.
    pub field: &'static str,
    /// Predicates evaluated in declared order.
    pub rules: &'static [Predicate],
}

fn is_string(value: &Value) -> bool {
    value.is_string()
}

fn short_text(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| (1..=50).contains(&text.chars().count()))
}

fn is_integer(value: &Value) -> bool {
    value.as_i64().is_some()
}

fn positive_four_digits(value: &Value) -> bool {
    value.as_i64().is_some_and(|number| (1..=9999).contains(&number))
}

fn padded_digits(part: Option<&str>, width: usize) -> bool {
    part.is_some_and(|text| text.len() == width && text.bytes().all(|byte| byte.is_ascii_digit()))
}

fn day_month_year(value: &Value) -> bool {
    // Component widths must be exactly 2/2/4; chrono's parser is
    // padding-lenient, so 1/12/20033 would otherwise slip through.
    let Some(text) = value.as_str() else {
        return false;
    };
    let mut parts = text.split('/');
    let shape_ok = padded_digits(parts.next(), 2)
        && padded_digits(parts.next(), 2)
        && padded_digits(parts.next(), 4)
        && parts.next().is_none();
    shape_ok && NaiveDate::parse_from_str(text, "%d/%m/%Y").is_ok()
}

fn subject_id(value: &Value) -> bool {
    value
        .as_str()
        .is_some_and(|text| !text.is_empty() && text.trim() == text)
}

fn carrier_reference(value: &Value) -> bool {
    if value.is_null() {
        return true;
    }
    let Some(reference) = value.as_object() else {
        return false;
    };
    reference.len() == 2
        && reference.get("kind").and_then(Value::as_str) == Some(Kind::Boat.as_str())
        && reference.get("id").and_then(Value::as_i64).is_some()
}

const BOAT_RULES: &[FieldRules] = &[
    FieldRules {
        field: "name",
        rules: &[is_string, short_text],
    },
    FieldRules {
        field: "type",
        rules: &[is_string, short_text],
    },
    FieldRules {
        field: "length",
        rules: &[is_integer, positive_four_digits],
    },
    FieldRules {
        field: "user",
        rules: &[is_string, subject_id],
    },
];

const LOAD_RULES: &[FieldRules] = &[
    FieldRules {
        field: "volume",
        rules: &[is_integer, positive_four_digits],
    },
    FieldRules {
        field: "item",
        rules: &[is_string, short_text],
    },
    FieldRules {
        field: "creation_date",
        rules: &[is_string, day_month_year],
    },
    FieldRules {
        field: "user",
        rules: &[is_string, subject_id],
    },
    FieldRules {
        field: "carrier",
        rules: &[carrier_reference],
    },
];

const USER_RULES: &[FieldRules] = &[FieldRules {
    field: "user",
    rules: &[is_string, subject_id],
}];

/// Counter records are maintained by the counter ledger, not user input.
const COUNTER_RULES: &[FieldRules] = &[];

/// Declared rule table for a kind, in field-declaration order.
pub fn rules_for(kind: Kind) -> &'static [FieldRules] {
    match kind {
        Kind::Boat => BOAT_RULES,
        Kind::Load => LOAD_RULES,
        Kind::User => USER_RULES,
        Kind::Counter => COUNTER_RULES,
    }
}

/// What made a candidate invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// A field required by the kind's shape was never assigned.
    Unset {
        /// Field name.
        field: &'static str,
    },
    /// A declared rule rejected the field's current value.
    RuleFailed {
        /// Field name.
        field: &'static str,
        /// 0-based index of the failing predicate.
        rule: usize,
    },
}

/// Structured validation failure report.
///
/// Carries the kind name, the candidate's current field values, and which
/// field/rule failed, so callers can surface an actionable rejection.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    kind: Kind,
    fields: Document,
    failure: ValidationFailure,
}

impl ValidationReport {
    pub(crate) const fn unset(kind: Kind, fields: Document, field: &'static str) -> Self {
        Self {
            kind,
            fields,
            failure: ValidationFailure::Unset { field },
        }
    }

    pub(crate) const fn rule_failed(
        kind: Kind,
        fields: Document,
        field: &'static str,
        rule: usize,
    ) -> Self {
        Self {
            kind,
            fields,
            failure: ValidationFailure::RuleFailed { field, rule },
        }
    }

    /// Kind whose validation failed.
    pub const fn kind(&self) -> Kind {
        self.kind
    }

    /// Field values the candidate carried when it was rejected.
    pub const fn fields(&self) -> &Document {
        &self.fields
    }

    /// The specific failure.
    pub const fn failure(&self) -> &ValidationFailure {
        &self.failure
    }

    /// Structured details for error payloads.
    pub fn to_details(&self) -> Value {
        let failure = match &self.failure {
            ValidationFailure::Unset { field } => json!({
                "field": field,
                "code": "unset",
            }),
            ValidationFailure::RuleFailed { field, rule } => json!({
                "field": field,
                "rule": rule,
                "code": "rule_failed",
            }),
        };
        json!({
            "kind": self.kind.as_str(),
            "failure": failure,
            "fields": Value::Object(self.fields.clone()),
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.failure {
            ValidationFailure::Unset { field } => {
                write!(f, "{} validation failed: field `{field}` is unset", self.kind)
            }
            ValidationFailure::RuleFailed { field, rule } => write!(
                f,
                "{} validation failed: field `{field}` failed rule {rule}",
                self.kind
            ),
        }
    }
}

impl std::error::Error for ValidationReport {}

/// Validate raw field data against the kind's declared rules.
///
/// # Errors
/// Returns a [`ValidationReport`] for the first unset field or failing rule
/// encountered in declaration order.
pub fn validate(kind: Kind, fields: &Document) -> Result<(), ValidationReport> {
    for field_rules in rules_for(kind) {
        let Some(value) = fields.get(field_rules.field) else {
            return Err(ValidationReport::unset(
                kind,
                fields.clone(),
                field_rules.field,
            ));
        };
        for (index, rule) in field_rules.rules.iter().enumerate() {
            if !rule(value) {
                return Err(ValidationReport::rule_failed(
                    kind,
                    fields.clone(),
                    field_rules.field,
                    index,
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn boat_fields(name: Value, length: Value) -> Document {
        let Value::Object(fields) = json!({
            "name": name,
            "type": "Sailboat",
            "length": length,
            "user": "auth0|alice",
        }) else {
            panic!("object literal");
        };
        fields
    }

    #[rstest]
    fn valid_boat_passes() {
        let fields = boat_fields(json!("Sea Witch"), json!(28));
        assert_eq!(validate(Kind::Boat, &fields), Ok(()));
    }

    #[rstest]
    #[case(json!(""), 1)]
    #[case(json!("x".repeat(51)), 1)]
    #[case(json!(42), 0)]
    fn boat_name_rules_fire_in_order(#[case] name: Value, #[case] rule: usize) {
        let fields = boat_fields(name, json!(28));
        let report = validate(Kind::Boat, &fields).expect_err("invalid name");
        assert_eq!(
            report.failure(),
            &ValidationFailure::RuleFailed {
                field: "name",
                rule
            }
        );
    }

    #[rstest]
    #[case(json!(0))]
    #[case(json!(10_000))]
    #[case(json!(-3))]
    fn boat_length_bounds_are_closed(#[case] length: Value) {
        let fields = boat_fields(json!("Sea Witch"), length);
        let report = validate(Kind::Boat, &fields).expect_err("out of bounds");
        assert_eq!(
            report.failure(),
            &ValidationFailure::RuleFailed {
                field: "length",
                rule: 1
            }
        );
    }

    #[rstest]
    fn unset_field_halts_before_later_rules() {
        let mut fields = boat_fields(json!("Sea Witch"), json!(28));
        fields.remove("type");
        // "length" is also made invalid; the unset "type" must win because
        // it comes first in declaration order.
        fields.insert("length".to_owned(), json!(0));

        let report = validate(Kind::Boat, &fields).expect_err("unset field");
        assert_eq!(report.failure(), &ValidationFailure::Unset { field: "type" });
    }

    #[rstest]
    #[case(json!("01/02/2003"), true)]
    #[case(json!("31/12/1999"), true)]
    #[case(json!("2003-02-01"), false)]
    #[case(json!("31/02/2003"), false)]
    #[case(json!("1/2/2003"), false)]
    #[case(json!("1/12/20033"), false)]
    #[case(json!("01/02/2003/"), false)]
    #[case(json!("yesterday"), false)]
    fn creation_date_requires_day_month_year(#[case] date: Value, #[case] ok: bool) {
        let Value::Object(fields) = json!({
            "volume": 5,
            "item": "LEGO Blocks",
            "creation_date": date,
            "user": "auth0|alice",
            "carrier": null,
        }) else {
            panic!("object literal");
        };
        assert_eq!(validate(Kind::Load, &fields).is_ok(), ok);
    }

    #[rstest]
    #[case(json!(null), true)]
    #[case(json!({"kind": "Boat", "id": 7}), true)]
    #[case(json!({"kind": "Load", "id": 7}), false)]
    #[case(json!({"id": 7}), false)]
    #[case(json!("Boat/7"), false)]
    fn carrier_accepts_null_or_boat_reference(#[case] carrier: Value, #[case] ok: bool) {
        let Value::Object(fields) = json!({
            "volume": 5,
            "item": "LEGO Blocks",
            "creation_date": "01/02/2003",
            "user": "auth0|alice",
            "carrier": carrier,
        }) else {
            panic!("object literal");
        };
        assert_eq!(validate(Kind::Load, &fields).is_ok(), ok);
    }

    #[rstest]
    fn report_details_name_the_failing_rule() {
        let fields = boat_fields(json!("Sea Witch"), json!(0));
        let report = validate(Kind::Boat, &fields).expect_err("invalid length");
        let details = report.to_details();
        assert_eq!(details["kind"], "Boat");
        assert_eq!(details["failure"]["field"], "length");
        assert_eq!(details["failure"]["rule"], 1);
        assert_eq!(details["fields"]["name"], "Sea Witch");
    }
}
