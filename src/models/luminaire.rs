//! Luminaires and the lights they own.

use crate::models::color::ColorRepresentations;
use crate::services::transition::TransitionWindow;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LuminaireId(pub String);

impl fmt::Display for LuminaireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LuminaireId {
    fn from(value: &str) -> Self {
        LuminaireId(value.to_string())
    }
}

impl Default for LuminaireId {
    fn default() -> Self {
        LuminaireId("N/A".to_string())
    }
}

/// One addressable unit of a luminaire.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub state: ColorRepresentations,
    pub previous_state: ColorRepresentations,
    pub transition: TransitionWindow,
}

/// Serialized as `{"state": {...}, "transitionTime": <ms>}`.
impl Serialize for Light {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("Light", 2)?;
        s.serialize_field("state", &self.state)?;
        s.serialize_field("transitionTime", &self.transition.duration_ms())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Luminaire {
    pub id: LuminaireId,
    pub gateway: String,
    pub name: String,
    /// Fixed at registration.
    pub lights: Vec<Light>,
}
