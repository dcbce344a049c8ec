//! The state synchronization engine.
//!
//! Owns every table the core needs (device state cache, luminaires, pending
//! luminaire notifications). All operations are synchronous; the only
//! deferred work is the coalesced notification flush, which runs when the
//! caller ends the current turn.

use crate::error::EngineError;
use crate::models::color::ColorValue;
use crate::models::luminaire::{Light, Luminaire, LuminaireId};
use crate::models::state::{DeviceId, FieldMap};
use crate::services::coalescer::ChangeCoalescer;
use crate::services::convert::{ColorConversion, PaletteConversion};
use crate::services::diff::compute_needed_fields;
use crate::services::luminaires::{LuminaireRegistration, LuminaireRegistry};
use crate::services::sanitize::sanitize;
use crate::services::state_cache::StateCache;
use crate::services::transition::DEFAULT_TRANSITION_MS;
use chrono::{DateTime, Utc};
use log::{debug, warn};

/// A sanitized set of fields to deliver to one device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCommand {
    pub device_id: DeviceId,
    pub fields: FieldMap,
}

/// Receiver of coalesced `luminaireUpdate` notifications.
pub trait LuminaireSink {
    fn luminaire_update(&mut self, luminaire: &Luminaire);
}

pub struct Engine {
    cache: StateCache,
    luminaires: LuminaireRegistry,
    dirty: ChangeCoalescer<LuminaireId>,
    converter: Box<dyn ColorConversion>,
    default_transition_ms: u64,
    clock: fn() -> DateTime<Utc>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(Box::new(PaletteConversion), DEFAULT_TRANSITION_MS)
    }
}

impl Engine {
    pub fn new(converter: Box<dyn ColorConversion>, default_transition_ms: u64) -> Self {
        Engine {
            cache: StateCache::new(),
            luminaires: LuminaireRegistry::new(),
            dirty: ChangeCoalescer::new(),
            converter,
            default_transition_ms,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn register_device(&mut self, device_id: DeviceId, state: FieldMap) -> Result<(), EngineError> {
        self.cache.register(device_id, state)
    }

    pub fn device_state(&self, device_id: &DeviceId) -> Result<&FieldMap, EngineError> {
        self.cache.get(device_id)
    }

    /// Handle a "set light" intent. Returns the command to transmit, if any.
    ///
    /// Accepted fields are recorded in the cache optimistically; a later
    /// delivery failure does not roll them back.
    pub fn set_light(&mut self, device_id: &DeviceId, payload: &FieldMap) -> Result<Option<DeviceCommand>, EngineError> {
        let Some(mut fields) = compute_needed_fields(&mut self.cache, device_id, payload)? else {
            debug!("Device {}: nothing to send for {}", device_id, payload);
            return Ok(None);
        };
        sanitize(&mut fields);
        Ok(Some(DeviceCommand {
            device_id: device_id.clone(),
            fields,
        }))
    }

    /// Record state reported by the device side, bypassing the diff.
    pub fn light_changed(&mut self, device_id: &DeviceId, payload: &FieldMap) -> Result<(), EngineError> {
        self.cache.apply_change(device_id, payload)
    }

    pub fn register_luminaire(&mut self, registration: LuminaireRegistration) -> Result<(), EngineError> {
        let now = (self.clock)();
        self.luminaires.register(registration, self.converter.as_ref(), now)
    }

    pub fn luminaires(&self) -> &[Luminaire] {
        self.luminaires.luminaires()
    }

    pub fn luminaire(&self, id: &LuminaireId) -> Result<&Luminaire, EngineError> {
        self.luminaires.luminaire(id)
    }

    pub fn light(&self, id: &LuminaireId, index: usize) -> Result<&Light, EngineError> {
        self.luminaires.light(id, index)
    }

    /// Set one light's color and queue a notification for its luminaire.
    pub fn set_luminaire_light(
        &mut self,
        id: &LuminaireId,
        index: usize,
        color: ColorValue,
        transition_ms: Option<u64>,
    ) -> Result<(), EngineError> {
        let now = (self.clock)();
        let light = self.luminaires.light_mut(id, index)?;
        light.set_state(self.converter.as_ref(), color, transition_ms, self.default_transition_ms, now);
        self.dirty.mark_dirty(id.clone());
        Ok(())
    }

    pub fn has_pending_notifications(&self) -> bool {
        self.dirty.is_flush_scheduled()
    }

    /// Close the current turn: deliver one notification per queued marking.
    pub fn end_turn<S: LuminaireSink + ?Sized>(&mut self, sink: &mut S) -> usize {
        if !self.dirty.is_flush_scheduled() {
            return 0;
        }
        let luminaires = &self.luminaires;
        self.dirty.flush(|id| match luminaires.luminaire(&id) {
            Ok(luminaire) => sink.luminaire_update(luminaire),
            Err(e) => warn!("Dropping notification: {}", e),
        })
    }

    /// Run `f` as one processing turn and flush whatever it marked dirty.
    pub fn turn<S, R, F>(&mut self, sink: &mut S, f: F) -> R
    where
        S: LuminaireSink + ?Sized,
        F: FnOnce(&mut Engine) -> R,
    {
        let result = f(self);
        self.end_turn(sink);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::fields;
    use chrono::TimeZone;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder(Vec<serde_json::Value>);

    impl LuminaireSink for Recorder {
        fn luminaire_update(&mut self, luminaire: &Luminaire) {
            self.0.push(serde_json::to_value(luminaire).unwrap());
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 8, 30, 0).unwrap()
    }

    fn engine() -> Engine {
        Engine::default().with_clock(fixed_now)
    }

    fn register(engine: &mut Engine, id: &str, lights: usize) {
        engine
            .register_luminaire(LuminaireRegistration {
                id: LuminaireId::from(id),
                num_lights: lights,
                ..Default::default()
            })
            .unwrap();
    }

    #[test]
    fn set_light_sanitizes_output() {
        let mut e = engine();
        let id = DeviceId::from("3");
        e.register_device(id.clone(), fields(json!({"on": true, "bri": 10}))).unwrap();

        let cmd = e.set_light(&id, &fields(json!({"bri": 300}))).unwrap().unwrap();
        assert_eq!(cmd.fields, fields(json!({"bri": 254})));

        let cmd = e.set_light(&id, &fields(json!({"on": false, "bri": 40}))).unwrap().unwrap();
        assert_eq!(cmd.device_id, id);
        assert_eq!(cmd.fields, fields(json!({"on": false})));
        assert_eq!(e.device_state(&id).unwrap(), &FieldMap::off());
    }

    #[test]
    fn scenarios_without_output() {
        let mut e = engine();
        let on = DeviceId::from("on");
        let off = DeviceId::from("off");
        e.register_device(on.clone(), fields(json!({"on": true, "bri": 100, "hue": 50})))
            .unwrap();
        e.register_device(off.clone(), fields(json!({"on": false}))).unwrap();

        let mut sink = Recorder::default();
        let out = e.turn(&mut sink, |e| e.set_light(&on, &fields(json!({"bri": 100}))));
        assert_eq!(out, Ok(None));
        assert!(sink.0.is_empty());

        assert_eq!(e.set_light(&off, &fields(json!({"bri": 200}))), Ok(None));
    }

    #[test]
    fn light_changed_bypasses_diff() {
        let mut e = engine();
        let id = DeviceId::from("1");
        e.register_device(id.clone(), fields(json!({"on": true, "ct": 300}))).unwrap();
        e.light_changed(&id, &fields(json!({"hue": 10, "sat": 20}))).unwrap();
        assert_eq!(e.device_state(&id).unwrap(), &fields(json!({"on": true, "hue": 10, "sat": 20})));
        assert_eq!(
            e.light_changed(&DeviceId::from("2"), &fields(json!({"on": true}))),
            Err(EngineError::DeviceNotFound(DeviceId::from("2")))
        );
    }

    #[test]
    fn luminaire_updates_are_flushed_once_per_turn_in_order() {
        let mut e = engine();
        register(&mut e, "a", 2);
        register(&mut e, "b", 1);
        let a = LuminaireId::from("a");
        let b = LuminaireId::from("b");

        let mut sink = Recorder::default();
        e.turn(&mut sink, |e| {
            e.set_luminaire_light(&b, 0, ColorValue::Rgb([255, 0, 0]), None).unwrap();
            e.set_luminaire_light(&a, 0, ColorValue::Ct(300), Some(1000)).unwrap();
            e.set_luminaire_light(&a, 1, ColorValue::Ct(300), Some(1000)).unwrap();
            assert!(e.has_pending_notifications());
        });

        let ids = sink.0.iter().map(|v| v["id"].as_str().unwrap().to_string()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["b", "a", "a"]);
        assert!(!e.has_pending_notifications());
        assert_eq!(e.end_turn(&mut sink), 0);
    }

    #[test]
    fn notification_shape() {
        let mut e = engine();
        register(&mut e, "strip", 1);
        let id = LuminaireId::from("strip");
        let mut sink = Recorder::default();
        e.turn(&mut sink, |e| e.set_luminaire_light(&id, 0, ColorValue::Rgb([255, 0, 0]), None))
            .unwrap();

        let update = &sink.0[0];
        assert_eq!(update["name"], json!("Unnamed Light"));
        assert_eq!(update["gateway"], json!("unknown"));
        let light = &update["lights"][0];
        assert_eq!(light["transitionTime"], json!(500));
        assert_eq!(light["state"]["rgb"], json!([255, 0, 0]));
        for key in ["xyY", "ct", "hsv"] {
            assert!(light["state"].get(key).is_some(), "{key}");
        }
    }

    #[test]
    fn failed_luminaire_update_marks_nothing() {
        let mut e = engine();
        register(&mut e, "a", 1);
        let res = e.set_luminaire_light(&LuminaireId::from("a"), 5, ColorValue::Ct(200), None);
        assert!(matches!(res, Err(EngineError::LightNotFound { index: 5, .. })));
        assert!(!e.has_pending_notifications());
    }

    #[test]
    fn duplicate_luminaire_is_reported() {
        let mut e = engine();
        register(&mut e, "a", 1);
        let res = e.register_luminaire(LuminaireRegistration {
            id: LuminaireId::from("a"),
            ..Default::default()
        });
        assert_eq!(res, Err(EngineError::DuplicateRegistration(LuminaireId::from("a"))));
        assert_eq!(e.luminaires().len(), 1);
    }
}
