//! Mutual exclusion of the three ways to specify a light's color.
//!
//! Priority is `xy` > `ct` > `hue`/`sat`: the highest-priority group present
//! in the deciding map wins and the competing groups are removed from the
//! target map.

use crate::models::state::{field, FieldMap};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ColorGroup {
    Xy,
    Ct,
    HueSat,
}

impl ColorGroup {
    /// Fields this group makes obsolete when it becomes active.
    fn competitors(self) -> &'static [&'static str] {
        match self {
            ColorGroup::Xy => &[field::CT, field::HUE, field::SAT],
            ColorGroup::Ct => &[field::XY, field::HUE, field::SAT],
            ColorGroup::HueSat => &[field::XY, field::CT],
        }
    }
}

/// The color group a map activates, if any.
pub fn active_group(fields: &FieldMap) -> Option<ColorGroup> {
    if fields.contains(field::XY) {
        Some(ColorGroup::Xy)
    } else if fields.contains(field::CT) {
        Some(ColorGroup::Ct)
    } else if fields.contains(field::HUE) || fields.contains(field::SAT) {
        Some(ColorGroup::HueSat)
    } else {
        None
    }
}

/// Remove from `target` every color field competing with the group active in `deciding`.
pub fn reduce_against(deciding: &FieldMap, target: &mut FieldMap) {
    if let Some(group) = active_group(deciding) {
        for name in group.competitors() {
            target.remove(name);
        }
    }
}

/// Normalize a single map so that at most one color group remains.
pub fn reduce(payload: &mut FieldMap) {
    if let Some(group) = active_group(payload) {
        for name in group.competitors() {
            payload.remove(name);
        }
    }
}
