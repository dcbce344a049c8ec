use crate::models::state::{field, FieldMap};
use serde_json::Value;

pub const BRI_MIN: i64 = 0;
pub const BRI_MAX: i64 = 254;

/// Clamp and strip values right before they go out to a device.
///
/// - `bri` is clamped to `[0, 254]`.
/// - A power-off command never carries `bri`, since that breaks the
///   device's fade-out.
pub fn sanitize(fields: &mut FieldMap) {
    if let Some(bri) = fields.get(field::BRI).and_then(clamp_bri) {
        fields.insert(field::BRI, bri);
    }

    if fields.on() == Some(false) {
        fields.remove(field::BRI);
    }
}

fn clamp_bri(value: &Value) -> Option<Value> {
    if let Some(n) = value.as_i64() {
        Some(Value::from(n.clamp(BRI_MIN, BRI_MAX)))
    } else if let Some(n) = value.as_u64() {
        Some(Value::from(n.min(BRI_MAX as u64)))
    } else {
        // Fractional brightness is rounded to the device's integer scale.
        value
            .as_f64()
            .map(|n| Value::from(n.round().clamp(BRI_MIN as f64, BRI_MAX as f64) as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::state::fields;
    use serde_json::json;

    #[test]
    fn clamps_brightness() {
        let mut p = fields(json!({"bri": 300}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!(254)));

        let mut p = fields(json!({"bri": -10}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!(0)));

        let mut p = fields(json!({"bri": 120}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!(120)));

        let mut p = fields(json!({"bri": 18446744073709551615u64}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!(254)));
    }

    #[test]
    fn fractional_brightness_is_rounded() {
        let mut p = fields(json!({"bri": 99.6}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!(100)));
    }

    #[test]
    fn power_off_strips_brightness() {
        let mut p = fields(json!({"on": false, "bri": 100, "transitiontime": 10}));
        sanitize(&mut p);
        assert_eq!(p, fields(json!({"on": false, "transitiontime": 10})));
    }

    #[test]
    fn non_numeric_brightness_is_left_alone() {
        let mut p = fields(json!({"bri": "max"}));
        sanitize(&mut p);
        assert_eq!(p.get("bri"), Some(&json!("max")));
    }
}
