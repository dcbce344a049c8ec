//! Wire format of the newline-delimited JSON events read from stdin and
//! written to stdout.

use crate::models::color::ColorValue;
use crate::models::luminaire::{Luminaire, LuminaireId};
use crate::models::state::{DeviceId, FieldMap};
use crate::services::luminaires::LuminaireRegistration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum InboundEvent {
    RegisterDevice {
        device_id: DeviceId,
        #[serde(default)]
        state: FieldMap,
    },
    SetLight {
        device_id: DeviceId,
        payload: FieldMap,
    },
    LightChanged {
        device_id: DeviceId,
        payload: FieldMap,
    },
    RegisterLuminaire(LuminaireRegistration),
    SetLuminaireLight {
        luminaire_id: LuminaireId,
        light_id: usize,
        state: ColorValue,
        #[serde(default)]
        transition_time: Option<u64>,
    },
}

impl InboundEvent {
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::RegisterDevice { .. } => "registerDevice",
            InboundEvent::SetLight { .. } => "setLight",
            InboundEvent::LightChanged { .. } => "lightChanged",
            InboundEvent::RegisterLuminaire(_) => "registerLuminaire",
            InboundEvent::SetLuminaireLight { .. } => "setLuminaireLight",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OutboundEvent<'a> {
    LuminaireUpdate { luminaire: &'a Luminaire },
}

/// Decode one line; the error names the JSON path that failed.
pub fn decode_line(line: &str) -> Result<InboundEvent, String> {
    let de = &mut serde_json::Deserializer::from_str(line);
    serde_path_to_error::deserialize(de).map_err(|e| {
        let path = e.path().to_string();
        format!("invalid event at {}: {}", path, e.into_inner())
    })
}
