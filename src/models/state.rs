//! Device state as exchanged with the bridge.
//!
//! A state is a partial field map (`{"on": true, "bri": 120, ...}`). Unknown
//! fields are carried through untouched; the engine only gives special
//! treatment to the vocabulary listed in [`field`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub String);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        DeviceId(value.to_string())
    }
}

/// Field names understood by the bridge.
pub mod field {
    pub const ON: &str = "on";
    pub const BRI: &str = "bri";
    pub const HUE: &str = "hue";
    pub const SAT: &str = "sat";
    pub const XY: &str = "xy";
    pub const CT: &str = "ct";
    pub const TRANSITION_TIME: &str = "transitiontime";
    pub const ALERT: &str = "alert";
    pub const BRI_INC: &str = "bri_inc";
    pub const SAT_INC: &str = "sat_inc";
    pub const HUE_INC: &str = "hue_inc";
    pub const CT_INC: &str = "ct_inc";
    pub const XY_INC: &str = "xy_inc";

    /// Fields with an effect on every transmission; caching them is meaningless.
    pub const NON_IDEMPOTENT: [&str; 7] = [TRANSITION_TIME, ALERT, BRI_INC, SAT_INC, HUE_INC, CT_INC, XY_INC];

    /// Fields that do nothing when sent on their own.
    pub const MODIFIER_ONLY: [&str; 1] = [TRANSITION_TIME];

    pub fn is_non_idempotent(name: &str) -> bool {
        NON_IDEMPOTENT.contains(&name)
    }

    pub fn is_modifier_only(name: &str) -> bool {
        MODIFIER_ONLY.contains(&name)
    }
}

/// Ordered, partial map of field name to JSON value.
///
/// Insertion order is kept so iteration matches the order in which a caller
/// wrote the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(Map<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        FieldMap(Map::new())
    }

    /// State of a device that has been switched off: exactly `{"on": false}`.
    pub fn off() -> Self {
        let mut map = FieldMap::new();
        map.insert(field::ON, Value::Bool(false));
        map
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// The `on` flag, when present and boolean.
    pub fn on(&self) -> Option<bool> {
        self.0.get(field::ON).and_then(Value::as_bool)
    }

    /// Shallow overwrite of every field in `other`.
    pub fn merge(&mut self, other: &FieldMap) {
        for (name, value) in other.iter() {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// True when every field is a modifier that is a no-op on its own.
    /// An empty map also counts.
    pub fn contains_only_modifiers(&self) -> bool {
        self.0.keys().all(|name| field::is_modifier_only(name))
    }
}

impl From<Map<String, Value>> for FieldMap {
    fn from(value: Map<String, Value>) -> Self {
        FieldMap(value)
    }
}

impl TryFrom<Value> for FieldMap {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.0) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

#[cfg(test)]
pub(crate) fn fields(value: Value) -> FieldMap {
    FieldMap::try_from(value).expect("object literal")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_insertion_order_after_removal() {
        let mut map = fields(json!({"on": true, "bri": 10, "xy": [0.1, 0.2], "alert": "select"}));
        map.remove("bri");
        let keys = map.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["on", "xy", "alert"]);
    }

    #[test]
    fn modifier_only_detection() {
        assert!(fields(json!({"transitiontime": 4})).contains_only_modifiers());
        assert!(FieldMap::new().contains_only_modifiers());
        assert!(!fields(json!({"transitiontime": 4, "bri": 1})).contains_only_modifiers());
    }

    #[test]
    fn non_idempotent_vocabulary() {
        for name in ["transitiontime", "alert", "bri_inc", "sat_inc", "hue_inc", "ct_inc", "xy_inc"] {
            assert!(field::is_non_idempotent(name), "{name}");
        }
        assert!(!field::is_non_idempotent("bri"));
        assert!(!field::is_non_idempotent("effect"));
    }

    #[test]
    fn off_state_is_exactly_on_false() {
        assert_eq!(serde_json::to_value(FieldMap::off()).unwrap(), json!({"on": false}));
    }
}
