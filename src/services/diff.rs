//! Decides which fields of a desired update actually have to go out to the device.

use crate::error::EngineError;
use crate::models::state::{field, DeviceId, FieldMap};
use crate::services::color_mode;
use crate::services::state_cache::StateCache;
use log::debug;
use serde_json::Value;

/// Whether `field` must be transmitted given its cached and desired values.
pub fn should_update(name: &str, cached: Option<&Value>, desired: &Value) -> bool {
    if field::is_non_idempotent(name) {
        return true;
    }

    let Some(cached) = cached else {
        return true;
    };

    if name == field::XY {
        match (xy_pair(cached), xy_pair(desired)) {
            (Some(old), Some(new)) => old[0] != new[0] || old[1] != new[1],
            _ => !values_equal(cached, desired),
        }
    } else {
        !values_equal(cached, desired)
    }
}

fn xy_pair(value: &Value) -> Option<[f64; 2]> {
    let arr = value.as_array()?;
    Some([arr.first()?.as_f64()?, arr.get(1)?.as_f64()?])
}

/// Exact equality, except that numbers compare by numeric value (`100 == 100.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        (Value::Array(x), Value::Array(y)) => x.len() == y.len() && x.iter().zip(y).all(|(x, y)| values_equal(x, y)),
        _ => a == b,
    }
}

/// Work out the fields of `payload` that need sending and record the accepted
/// changes in the cache.
///
/// Returns `Ok(None)` when nothing should be sent. The payload is color-reduced
/// in isolation first; the returned map is not yet sanitized.
pub fn compute_needed_fields(
    cache: &mut StateCache,
    device_id: &DeviceId,
    payload: &FieldMap,
) -> Result<Option<FieldMap>, EngineError> {
    let mut payload = payload.clone();
    color_mode::reduce(&mut payload);

    let mut needed = payload.clone();

    // Lights that are off forget settings unpredictably, so the cache is
    // only trusted for diffing while the light is on.
    if cache.get(device_id)?.on() == Some(true) {
        // `on` goes last so that a power-off in the same payload still
        // leaves the cache at exactly `{"on": false}`.
        let ordered = payload
            .iter()
            .filter(|(name, _)| name.as_str() != field::ON)
            .chain(payload.iter().filter(|(name, _)| name.as_str() == field::ON));
        for (name, value) in ordered {
            let cached = cache.get(device_id)?.get(name);
            if should_update(name, cached, value) {
                let mut change = FieldMap::new();
                change.insert(name.clone(), value.clone());
                cache.apply_change(device_id, &change)?;
            } else {
                debug!("Device {}: skipping unchanged field {}", device_id, name);
                needed.remove(name);
            }
        }
    } else {
        cache.apply_change(device_id, &payload)?;

        if needed.on() != Some(true) {
            debug!("Device {} is off and payload does not turn it on; not sending", device_id);
            return Ok(None);
        }
    }

    if needed.contains_only_modifiers() {
        return Ok(None);
    }

    Ok(Some(needed))
}
