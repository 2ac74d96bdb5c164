//! Load entity: cargo optionally carried by a boat.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::entity::{self, Document, Entity, KeySpec, Kind};
use super::user::OwnerId;
use super::validation::{self, ValidationReport};

/// Weak reference from a load to the boat currently carrying it.
///
/// A relation, not ownership: deleting the referenced boat nulls the
/// reference on every load that carries it rather than deleting the loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierRef {
    /// Kind of the referenced entity, always [`Kind::Boat`].
    pub kind: Kind,
    /// Numeric id of the carrying boat.
    pub id: i64,
}

impl CarrierRef {
    /// Reference the boat with the given id.
    pub const fn boat(id: i64) -> Self {
        Self {
            kind: Kind::Boat,
            id,
        }
    }

    /// Field value as persisted inside a load document.
    pub fn to_value(self) -> Value {
        json!({ "kind": self.kind.as_str(), "id": self.id })
    }
}

/// Cargo owned by one subject, optionally assigned to a carrier boat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Load {
    /// Cargo volume, 1–9999 once validated.
    pub volume: i64,
    /// Item description, 1–50 characters once validated.
    pub item: String,
    /// Creation date in `DD/MM/YYYY` form once validated.
    pub creation_date: String,
    /// Owning subject.
    pub user: OwnerId,
    /// Carrying boat; `None` while unassigned.
    pub carrier: Option<CarrierRef>,
}

impl Load {
    /// Build an unassigned candidate load from raw parts.
    ///
    /// The carrier starts `None`; only the relationship manager mutates it.
    pub const fn new(volume: i64, item: String, creation_date: String, user: OwnerId) -> Self {
        Self {
            volume,
            item,
            creation_date,
            user,
            carrier: None,
        }
    }
}

impl Entity for Load {
    const KIND: Kind = Kind::Load;
    const EDITABLE: &'static [&'static str] = &["volume", "item", "creation_date"];

    fn from_document(fields: &Document) -> Result<Self, ValidationReport> {
        validation::validate(Kind::Load, fields)?;
        let volume = entity::require_i64(Kind::Load, fields, "volume")?;
        let item = entity::require_str(Kind::Load, fields, "item")?;
        let creation_date = entity::require_str(Kind::Load, fields, "creation_date")?;
        let raw_user = entity::require_str(Kind::Load, fields, "user")?;
        let user = OwnerId::new(raw_user)
            .map_err(|_| ValidationReport::rule_failed(Kind::Load, fields.clone(), "user", 1))?;
        let carrier = match fields.get("carrier") {
            None | Some(Value::Null) => None,
            Some(value) => Some(serde_json::from_value(value.clone()).map_err(|_| {
                ValidationReport::rule_failed(Kind::Load, fields.clone(), "carrier", 0)
            })?),
        };
        Ok(Self {
            volume,
            item,
            creation_date,
            user,
            carrier,
        })
    }

    fn to_document(&self) -> Document {
        let mut fields = Document::new();
        fields.insert("volume".to_owned(), Value::from(self.volume));
        fields.insert("item".to_owned(), Value::String(self.item.clone()));
        fields.insert(
            "creation_date".to_owned(),
            Value::String(self.creation_date.clone()),
        );
        fields.insert(
            "user".to_owned(),
            Value::String(self.user.as_str().to_owned()),
        );
        fields.insert(
            "carrier".to_owned(),
            self.carrier.map_or(Value::Null, CarrierRef::to_value),
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
