//! Registered luminaires and the per-light color state updates.

use crate::error::EngineError;
use crate::models::color::ColorValue;
use crate::models::luminaire::{Light, Luminaire, LuminaireId};
use crate::services::convert::{convert_all, ColorConversion};
use crate::services::transition::TransitionWindow;
use chrono::{DateTime, Utc};
use log::info;
use serde::Deserialize;

fn default_gateway() -> String {
    "unknown".to_string()
}

fn default_name() -> String {
    "Unnamed Light".to_string()
}

fn default_num_lights() -> usize {
    1
}

/// Fields accepted when registering a luminaire. Missing initial states
/// default to white.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LuminaireRegistration {
    #[serde(default)]
    pub id: LuminaireId,
    #[serde(default = "default_gateway")]
    pub gateway: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_num_lights")]
    pub num_lights: usize,
    #[serde(default)]
    pub initial_states: Vec<ColorValue>,
}

impl Default for LuminaireRegistration {
    fn default() -> Self {
        LuminaireRegistration {
            id: LuminaireId::default(),
            gateway: default_gateway(),
            name: default_name(),
            num_lights: default_num_lights(),
            initial_states: Vec::new(),
        }
    }
}

impl Light {
    pub fn new<C: ColorConversion + ?Sized>(converter: &C, initial: ColorValue, now: DateTime<Utc>) -> Self {
        let state = convert_all(converter, initial);
        Light {
            state,
            previous_state: state,
            transition: TransitionWindow::settled(now),
        }
    }

    /// Replace the light's color. The old state becomes the transition origin.
    pub fn set_state<C: ColorConversion + ?Sized>(
        &mut self,
        converter: &C,
        next: ColorValue,
        transition_ms: Option<u64>,
        default_ms: u64,
        now: DateTime<Utc>,
    ) {
        self.previous_state = self.state;
        self.state = convert_all(converter, next);
        self.transition = TransitionWindow::begin(now, transition_ms, default_ms);
    }
}

#[derive(Debug, Default)]
pub struct LuminaireRegistry {
    luminaires: Vec<Luminaire>,
}

impl LuminaireRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: ColorConversion + ?Sized>(
        &mut self,
        registration: LuminaireRegistration,
        converter: &C,
        now: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        if self.luminaires.iter().any(|l| l.id == registration.id) {
            return Err(EngineError::DuplicateRegistration(registration.id));
        }

        info!(
            "Registering luminaire {} ({}) on gateway {} with {} light(s)",
            registration.id, registration.name, registration.gateway, registration.num_lights
        );

        let lights = (0..registration.num_lights)
            .map(|index| {
                let initial = registration.initial_states.get(index).copied().unwrap_or_default();
                Light::new(converter, initial, now)
            })
            .collect();

        self.luminaires.push(Luminaire {
            id: registration.id,
            gateway: registration.gateway,
            name: registration.name,
            lights,
        });
        Ok(())
    }

    pub fn luminaires(&self) -> &[Luminaire] {
        &self.luminaires
    }

    pub fn luminaire(&self, id: &LuminaireId) -> Result<&Luminaire, EngineError> {
        self.luminaires
            .iter()
            .find(|l| &l.id == id)
            .ok_or_else(|| EngineError::LuminaireNotFound(id.clone()))
    }

    pub fn light(&self, id: &LuminaireId, index: usize) -> Result<&Light, EngineError> {
        self.luminaire(id)?.lights.get(index).ok_or_else(|| EngineError::LightNotFound {
            luminaire: id.clone(),
            index,
        })
    }

    pub fn light_mut(&mut self, id: &LuminaireId, index: usize) -> Result<&mut Light, EngineError> {
        let luminaire = self
            .luminaires
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| EngineError::LuminaireNotFound(id.clone()))?;
        luminaire.lights.get_mut(index).ok_or_else(|| EngineError::LightNotFound {
            luminaire: id.clone(),
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::convert::PaletteConversion;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap()
    }

    #[test]
    fn registration_defaults() {
        let reg: LuminaireRegistration = serde_json::from_value(json!({})).unwrap();
        assert_eq!(reg, LuminaireRegistration::default());
        assert_eq!(reg.id, LuminaireId::from("N/A"));
        assert_eq!(reg.num_lights, 1);
    }

    #[test]
    fn lights_use_initial_states_then_white() {
        let mut registry = LuminaireRegistry::new();
        let reg: LuminaireRegistration = serde_json::from_value(json!({
            "id": "desk",
            "numLights": 3,
            "initialStates": [{"rgb": [255, 0, 0]}]
        }))
        .unwrap();
        registry.register(reg, &PaletteConversion, t0()).unwrap();

        let lum = registry.luminaire(&LuminaireId::from("desk")).unwrap();
        assert_eq!(lum.lights.len(), 3);
        assert_eq!(lum.lights[0].state.rgb, [255, 0, 0]);
        assert_eq!(lum.lights[1].state.rgb, [255, 255, 255]);
        assert_eq!(lum.lights[0].state, lum.lights[0].previous_state);
        assert_eq!(lum.lights[2].transition.duration_ms(), 0);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut registry = LuminaireRegistry::new();
        let reg = LuminaireRegistration {
            id: LuminaireId::from("a"),
            ..Default::default()
        };
        registry.register(reg.clone(), &PaletteConversion, t0()).unwrap();
        let res = registry.register(
            LuminaireRegistration {
                num_lights: 4,
                ..reg
            },
            &PaletteConversion,
            t0(),
        );
        assert_eq!(res, Err(EngineError::DuplicateRegistration(LuminaireId::from("a"))));
        assert_eq!(registry.luminaires().len(), 1);
        assert_eq!(registry.luminaires()[0].lights.len(), 1);
    }

    #[test]
    fn set_state_keeps_previous_and_restarts_transition() {
        let mut light = Light::new(&PaletteConversion, ColorValue::Rgb([0, 0, 255]), t0());
        let t1 = t0() + Duration::seconds(1);
        light.set_state(&PaletteConversion, ColorValue::Rgb([255, 0, 0]), Some(2000), 500, t1);
        assert_eq!(light.previous_state.rgb, [0, 0, 255]);
        assert_eq!(light.state.rgb, [255, 0, 0]);
        assert_eq!(light.transition.start, t1);

        // Mid-transition retarget: previous becomes the then-current state, no blending.
        let t2 = t1 + Duration::milliseconds(500);
        light.set_state(&PaletteConversion, ColorValue::Ct(300), None, 500, t2);
        assert_eq!(light.previous_state.rgb, [255, 0, 0]);
        assert_eq!(light.state.ct, 300);
        assert_eq!(light.transition.start, t2);
        assert_eq!(light.transition.duration_ms(), 500);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut registry = LuminaireRegistry::new();
        registry
            .register(LuminaireRegistration::default(), &PaletteConversion, t0())
            .unwrap();
        let id = LuminaireId::default();
        assert!(registry.light(&id, 0).is_ok());
        assert_eq!(
            registry.light(&id, 1).unwrap_err(),
            EngineError::LightNotFound { luminaire: id.clone(), index: 1 }
        );
        assert_eq!(
            registry.light(&LuminaireId::from("x"), 0).unwrap_err(),
            EngineError::LuminaireNotFound(LuminaireId::from("x"))
        );
    }
}
