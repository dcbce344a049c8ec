//! Last-known state of every registered device.

use crate::error::EngineError;
use crate::models::state::{DeviceId, FieldMap};
use crate::services::color_mode;
use log::debug;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct StateCache {
    devices: BTreeMap<DeviceId, FieldMap>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for a newly known device.
    pub fn register(&mut self, device_id: DeviceId, initial: FieldMap) -> Result<(), EngineError> {
        if self.devices.contains_key(&device_id) {
            return Err(EngineError::DuplicateDevice(device_id));
        }
        let mut state = initial;
        color_mode::reduce(&mut state);
        self.devices.insert(device_id, state);
        Ok(())
    }

    pub fn get(&self, device_id: &DeviceId) -> Result<&FieldMap, EngineError> {
        self.devices
            .get(device_id)
            .ok_or_else(|| EngineError::DeviceNotFound(device_id.clone()))
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Record that `change` took effect on the device.
    ///
    /// Switching off collapses the entry to `{"on": false}`: devices forget
    /// their settings while off. Otherwise fields are shallow-merged after the
    /// color groups competing with `change` are dropped from the cached state.
    pub fn apply_change(&mut self, device_id: &DeviceId, change: &FieldMap) -> Result<(), EngineError> {
        let state = self
            .devices
            .get_mut(device_id)
            .ok_or_else(|| EngineError::DeviceNotFound(device_id.clone()))?;

        color_mode::reduce_against(change, state);

        if change.on() == Some(false) {
            debug!("Device {} turned off, forgetting settings", device_id);
            *state = FieldMap::off();
        } else {
            state.merge(change);
        }
        Ok(())
    }
}
