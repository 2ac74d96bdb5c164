//! Boat entity: a vessel owned by one subject.

use serde_json::Value;

use super::entity::{self, Document, Entity, KeySpec, Kind};
use super::user::OwnerId;
use super::validation::{self, ValidationReport};

/// A vessel owned by one subject.
///
/// Field bounds are enforced by the kind's validation rule table, not the
/// struct: candidates carry whatever the caller supplied until
/// [`Entity::validate`] runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boat {
    /// Vessel name, 1–50 characters once validated.
    pub name: String,
    /// Vessel type, 1–50 characters once validated.
    pub boat_type: String,
    /// Hull length in feet, 1–9999 once validated.
    pub length: i64,
    /// Owning subject.
    pub user: OwnerId,
}

impl Boat {
    /// Build a candidate boat from raw parts.
    pub const fn new(name: String, boat_type: String, length: i64, user: OwnerId) -> Self {
        Self {
            name,
            boat_type,
            length,
            user,
        }
    }
}

impl Entity for Boat {
    const KIND: Kind = Kind::Boat;
    const EDITABLE: &'static [&'static str] = &["name", "type", "length"];

    fn from_document(fields: &Document) -> Result<Self, ValidationReport> {
        validation::validate(Kind::Boat, fields)?;
        let name = entity::require_str(Kind::Boat, fields, "name")?;
        let boat_type = entity::require_str(Kind::Boat, fields, "type")?;
        let length = entity::require_i64(Kind::Boat, fields, "length")?;
        let raw_user = entity::require_str(Kind::Boat, fields, "user")?;
        let user = OwnerId::new(raw_user)
            .map_err(|_| ValidationReport::rule_failed(Kind::Boat, fields.clone(), "user", 1))?;
        Ok(Self {
            name,
            boat_type,
            length,
            user,
        })
    }

    fn to_document(&self) -> Document {
        let mut fields = Document::new();
        fields.insert("name".to_owned(), Value::String(self.name.clone()));
        fields.insert("type".to_owned(), Value::String(self.boat_type.clone()));
        fields.insert("length".to_owned(), Value::from(self.length));
        fields.insert(
            "user".to_owned(),
            Value::String(self.user.as_str().to_owned()),
        );
        fields
    }

    fn key_spec(&self) -> KeySpec {
        KeySpec::Auto
    }

    fn owner(&self) -> Option<&OwnerId> {
        Some(&self.user)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::validation::ValidationFailure;

    fn owner() -> OwnerId {
        OwnerId::new("auth0|alice").expect("valid subject")
    }

    #[rstest]
    fn boats_round_trip_documents() {
        let boat = Boat::new("Sea Witch".to_owned(), "Sailboat".to_owned(), 28, owner());
        let rebuilt = Boat::from_document(&boat.to_document()).expect("valid document");
        assert_eq!(rebuilt, boat);
    }

    #[rstest]
    #[case(0)]
    #[case(10_000)]
    fn out_of_bounds_length_fails_validation(#[case] length: i64) {
        let boat = Boat::new("Sea Witch".to_owned(), "Sailboat".to_owned(), length, owner());
        let report = boat.validate().expect_err("length out of bounds");
        assert_eq!(
            report.failure(),
            &ValidationFailure::RuleFailed {
                field: "length",
                rule: 1
            }
        );
    }

    #[rstest]
    fn ownership_is_the_user_field() {
        let boat = Boat::new("Sea Witch".to_owned(), "Sailboat".to_owned(), 28, owner());
        assert_eq!(boat.owner(), Some(&owner()));
        assert_eq!(boat.key_spec(), KeySpec::Auto);
    }
}
