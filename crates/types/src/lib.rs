//! # Relay Types
//!
//! Wire types shared by the form controller (`relay-core`) and the development webhook
//! (`relay-stub`).
//!
//! - [`FieldValue`]: a trimmed, non-blank form value
//! - [`FieldName`]: the three named form fields and their wire names
//! - [`ReferenceEntity`]: an authorised user record returned by the users endpoint
//! - [`FormPayload`]: the JSON body posted to the webhook

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A form value with surrounding whitespace removed, present only when something is left.
///
/// Every check on the form starts from this: a blank field is "no value", never a short one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldValue<'a>(&'a str);

impl<'a> FieldValue<'a> {
    pub fn parse(raw: &'a str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(Self(trimmed))
    }

    pub fn as_str(&self) -> &'a str {
        self.0
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }
}

/// The named fields of the report form.
///
/// Wire names are `field1`, `field2` and `field3`; the friendlier aliases are accepted when
/// parsing so the CLI can say `name` instead of `field1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    /// `field1`: the submitter's name, checked against the reference set.
    Name,
    /// `field2`: today's date, guarded against edits.
    Date,
    /// `field3`: the free-text report body.
    Report,
}

impl FieldName {
    pub const ALL: [FieldName; 3] = [FieldName::Name, FieldName::Date, FieldName::Report];

    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldName::Name => "field1",
            FieldName::Date => "field2",
            FieldName::Report => "field3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Name => "Name",
            FieldName::Date => "Date",
            FieldName::Report => "Report",
        }
    }

    /// Whether a user can type into the field. The date is owned by the guard.
    pub fn is_user_editable(&self) -> bool {
        !matches!(self, FieldName::Date)
    }
}

impl std::fmt::Display for FieldName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl std::str::FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "field1" | "name" => Ok(FieldName::Name),
            "field2" | "date" => Ok(FieldName::Date),
            "field3" | "report" => Ok(FieldName::Report),
            other => Err(format!("unknown field: {other}")),
        }
    }
}

/// An authorised user record.
///
/// Only `name` and `dep` are required; anything else the users endpoint returns is kept in
/// `extra` so it survives a round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferenceEntity {
    pub name: String,
    pub dep: String,
    #[serde(flatten, default)]
    #[schema(value_type = Object)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ReferenceEntity {
    pub fn new(name: impl Into<String>, dep: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dep: dep.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Case-insensitive comparison of this entity's name against a trimmed candidate.
    pub fn matches_name(&self, candidate: &str) -> bool {
        self.name.to_lowercase() == candidate.trim().to_lowercase()
    }
}

/// The JSON body posted to the webhook.
///
/// `dep` is never entered by the user; it is copied from the matching [`ReferenceEntity`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FormPayload {
    /// Name, as typed (trimmed).
    pub field1: String,
    /// Date, as displayed by the guarded field.
    pub field2: String,
    /// Free-text report.
    pub field3: String,
    /// Department looked up from the reference set.
    pub dep: String,
}

impl FormPayload {
    /// Returns the first field that is empty after trimming, if any.
    ///
    /// `dep` is not checked here; it comes from the reference set, not the user.
    pub fn first_blank_field(&self) -> Option<FieldName> {
        [
            (FieldName::Name, &self.field1),
            (FieldName::Date, &self.field2),
            (FieldName::Report, &self.field3),
        ]
        .into_iter()
        .find(|(_, value)| FieldValue::parse(value).is_none())
        .map(|(field, _)| field)
    }
}
