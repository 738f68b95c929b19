//! Enablement-rule trigger conditions and their single-step evaluation.
//!
//! Triggers are a closed set of variants keyed by the `type` field on the
//! wire. Documents written by older or newer tools may carry a `type` this
//! build does not know; those deserialize into [`Trigger::Unrecognized`]
//! (keeping every field, so a save writes them back untouched) and always
//! evaluate to `false` with a [`TriggerReport`]. Recognized triggers keep
//! any keys beyond their condition's fields in the same way.
//!
//! Evaluation has no memory. The only state that survives between passes is
//! the permanent-effect fold kept by [`crate::profile::CravingProfile`].

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Relationship kinds a `has_relationship` trigger can test for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Spouse,
    Child,
    Parent,
    Sibling,
    Friend,
}

impl Relationship {
    pub fn all() -> &'static [Relationship] {
        &[
            Relationship::Spouse,
            Relationship::Child,
            Relationship::Parent,
            Relationship::Sibling,
            Relationship::Friend,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Relationship::Spouse => "spouse",
            Relationship::Child => "child",
            Relationship::Parent => "parent",
            Relationship::Sibling => "sibling",
            Relationship::Friend => "friend",
        }
    }
}

/// Wire names of every known trigger variant.
pub const KNOWN_TRIGGER_TYPES: [&str; 5] = [
    "owns_commodity_tag",
    "has_relationship",
    "satisfaction_above",
    "satisfaction_below",
    "class_change",
];

/// A recognized trigger condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Owns at least `min_quantity` commodities tagged `tag`.
    OwnsCommodityTag {
        tag: String,
        #[serde(rename = "minQuantity")]
        min_quantity: u32,
    },
    /// Has an active relationship of this kind.
    HasRelationship { relationship: Relationship },
    /// Satisfaction for `craving_type` strictly above `threshold`.
    SatisfactionAbove {
        #[serde(rename = "cravingType")]
        craving_type: String,
        threshold: f64,
    },
    /// Satisfaction for `craving_type` strictly below `threshold`.
    SatisfactionBelow {
        #[serde(rename = "cravingType")]
        craving_type: String,
        threshold: f64,
    },
    /// Character moved into `new_class` on this evaluation tick.
    ClassChange {
        #[serde(rename = "newClass")]
        new_class: String,
    },
}

impl TriggerCondition {
    pub fn type_name(&self) -> &'static str {
        match self {
            TriggerCondition::OwnsCommodityTag { .. } => "owns_commodity_tag",
            TriggerCondition::HasRelationship { .. } => "has_relationship",
            TriggerCondition::SatisfactionAbove { .. } => "satisfaction_above",
            TriggerCondition::SatisfactionBelow { .. } => "satisfaction_below",
            TriggerCondition::ClassChange { .. } => "class_change",
        }
    }
}

/// A trigger whose `type` (or field layout) this build does not understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnrecognizedTrigger {
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A rule trigger as stored in a document.
///
/// Both variants keep every authored key: a recognized trigger holds the
/// keys its condition does not use in `extra`, and writes them back next to
/// the condition's own fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    Known {
        condition: TriggerCondition,
        extra: Map<String, Value>,
    },
    Unrecognized(UnrecognizedTrigger),
}

impl Trigger {
    pub fn type_name(&self) -> &str {
        match self {
            Trigger::Known { condition, .. } => condition.type_name(),
            Trigger::Unrecognized(u) => &u.type_name,
        }
    }

    /// The parsed condition, when the trigger is recognized.
    pub fn condition(&self) -> Option<&TriggerCondition> {
        match self {
            Trigger::Known { condition, .. } => Some(condition),
            Trigger::Unrecognized(_) => None,
        }
    }

    /// Authored keys outside the recognized condition's fields.
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            Trigger::Known { extra, .. } => extra,
            Trigger::Unrecognized(u) => &u.fields,
        }
    }

    fn from_fields(mut fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        match serde_json::from_value::<TriggerCondition>(Value::Object(fields.clone())) {
            Ok(condition) => {
                if let Value::Object(known) = serde_json::to_value(&condition)? {
                    for key in known.keys() {
                        fields.shift_remove(key);
                    }
                }
                Ok(Trigger::Known {
                    condition,
                    extra: fields,
                })
            }
            Err(_) => {
                let type_name = match fields.get("type") {
                    Some(Value::String(s)) => s.clone(),
                    _ => String::new(),
                };
                if !type_name.is_empty() {
                    fields.shift_remove("type");
                }
                Ok(Trigger::Unrecognized(UnrecognizedTrigger { type_name, fields }))
            }
        }
    }

    fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match self {
            Trigger::Known { condition, extra } => {
                let mut fields = match serde_json::to_value(condition)? {
                    Value::Object(known) => known,
                    _ => Map::new(),
                };
                for (key, value) in extra {
                    if !fields.contains_key(key) {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                Ok(fields)
            }
            Trigger::Unrecognized(u) => match serde_json::to_value(u)? {
                Value::Object(fields) => Ok(fields),
                _ => Ok(Map::new()),
            },
        }
    }
}

impl Serialize for Trigger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_fields()
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Trigger::from_fields(fields).map_err(serde::de::Error::custom)
    }
}

impl From<TriggerCondition> for Trigger {
    fn from(condition: TriggerCondition) -> Self {
        Trigger::Known {
            condition,
            extra: Map::new(),
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.condition() {
            Some(TriggerCondition::OwnsCommodityTag { tag, min_quantity }) => {
                write!(f, "Owns {min_quantity}+ commodities with tag \"{tag}\"")
            }
            Some(TriggerCondition::HasRelationship { relationship }) => {
                write!(f, "Has {} relationship", relationship.name())
            }
            Some(TriggerCondition::SatisfactionAbove {
                craving_type,
                threshold,
            }) => write!(f, "{craving_type} satisfaction > {threshold}%"),
            Some(TriggerCondition::SatisfactionBelow {
                craving_type,
                threshold,
            }) => write!(f, "{craving_type} satisfaction < {threshold}%"),
            Some(TriggerCondition::ClassChange { new_class }) => {
                write!(f, "Promoted to {new_class} class")
            }
            None => f.write_str("Unknown trigger"),
        }
    }
}

/// Read-only view of the character/world state a trigger needs.
pub trait CharacterState {
    /// Count of owned commodities carrying `tag`.
    fn owned_with_tag(&self, tag: &str) -> u32;
    /// Whether an active relationship of `kind` exists.
    fn has_relationship(&self, kind: Relationship) -> bool;
    /// Current satisfaction for a craving id (coarse or fine), if tracked.
    fn satisfaction(&self, craving_type: &str) -> Option<f64>;
    /// The class the character moved into on this tick, if any.
    fn class_transition(&self) -> Option<&str>;
}

/// Plain-data state snapshot, usable directly or as a test double.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterSnapshot {
    pub class_id: String,
    /// Class at the previous tick; a differing value marks a transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_class: Option<String>,
    #[serde(default)]
    pub owned_tags: BTreeMap<String, u32>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub satisfaction: BTreeMap<String, f64>,
}

impl CharacterState for CharacterSnapshot {
    fn owned_with_tag(&self, tag: &str) -> u32 {
        self.owned_tags.get(tag).copied().unwrap_or(0)
    }

    fn has_relationship(&self, kind: Relationship) -> bool {
        self.relationships.contains(&kind)
    }

    fn satisfaction(&self, craving_type: &str) -> Option<f64> {
        self.satisfaction.get(craving_type).copied()
    }

    fn class_transition(&self) -> Option<&str> {
        match &self.previous_class {
            Some(prev) if *prev != self.class_id => Some(self.class_id.as_str()),
            _ => None,
        }
    }
}

/// Something an evaluation pass noticed but did not fail on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerReport {
    #[error("rule '{rule_id}': unknown trigger type '{type_name}', treated as not triggered")]
    UnknownTriggerType { rule_id: String, type_name: String },

    #[error("rule '{rule_id}': malformed '{type_name}' trigger, treated as not triggered")]
    MalformedTrigger { rule_id: String, type_name: String },

    #[error("rule '{rule_id}': no satisfaction value for '{craving_type}', treated as not triggered")]
    MissingSatisfaction {
        rule_id: String,
        craving_type: String,
    },
}

/// Result of evaluating one trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    pub fired: bool,
    pub report: Option<TriggerReport>,
}

impl TriggerOutcome {
    fn fired(fired: bool) -> Self {
        Self {
            fired,
            report: None,
        }
    }

    fn closed(report: TriggerReport) -> Self {
        warn!("{report}");
        Self {
            fired: false,
            report: Some(report),
        }
    }
}

impl Trigger {
    /// Evaluate against `state`. Never fails; problems come back as reports.
    pub fn evaluate<S: CharacterState + ?Sized>(&self, rule_id: &str, state: &S) -> TriggerOutcome {
        let condition = match self {
            Trigger::Known { condition, .. } => condition,
            Trigger::Unrecognized(u) => {
                let type_name = u.type_name.clone();
                let rule_id = rule_id.to_string();
                return TriggerOutcome::closed(
                    if KNOWN_TRIGGER_TYPES.contains(&type_name.as_str()) {
                        TriggerReport::MalformedTrigger { rule_id, type_name }
                    } else {
                        TriggerReport::UnknownTriggerType { rule_id, type_name }
                    },
                );
            }
        };

        match condition {
            TriggerCondition::OwnsCommodityTag { tag, min_quantity } => {
                TriggerOutcome::fired(state.owned_with_tag(tag) >= *min_quantity)
            }
            TriggerCondition::HasRelationship { relationship } => {
                TriggerOutcome::fired(state.has_relationship(*relationship))
            }
            TriggerCondition::SatisfactionAbove {
                craving_type,
                threshold,
            } => match state.satisfaction(craving_type) {
                Some(s) => TriggerOutcome::fired(s > *threshold),
                None => TriggerOutcome::closed(TriggerReport::MissingSatisfaction {
                    rule_id: rule_id.to_string(),
                    craving_type: craving_type.clone(),
                }),
            },
            TriggerCondition::SatisfactionBelow {
                craving_type,
                threshold,
            } => match state.satisfaction(craving_type) {
                Some(s) => TriggerOutcome::fired(s < *threshold),
                None => TriggerOutcome::closed(TriggerReport::MissingSatisfaction {
                    rule_id: rule_id.to_string(),
                    craving_type: craving_type.clone(),
                }),
            },
            TriggerCondition::ClassChange { new_class } => {
                TriggerOutcome::fired(state.class_transition() == Some(new_class.as_str()))
            }
        }
    }
}
