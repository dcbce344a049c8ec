//! Derives all four color representations of a light from a single-model input.
//!
//! The conversion math itself sits behind [`ColorConversion`]; the default
//! implementation leans on `palette` for sRGB / xyY / HSV and uses polynomial
//! approximations for color temperature.

use crate::models::color::{ColorMode, ColorRepresentations, ColorValue};
use palette::{FromColor, Hsv, Srgb, Yxy};

pub const CT_MIN_MIREDS: u16 = 153;
pub const CT_MAX_MIREDS: u16 = 500;

/// Conversion of a color value into another model, keyed by (source, target).
pub trait ColorConversion {
    fn convert(&self, value: ColorValue, target: ColorMode) -> ColorValue;
}

/// Regenerate every representation from `source`. The source value is kept verbatim.
pub fn convert_all<C: ColorConversion + ?Sized>(converter: &C, source: ColorValue) -> ColorRepresentations {
    let mut reps = ColorRepresentations {
        rgb: [0; 3],
        xy_y: [0.0; 3],
        ct: CT_MIN_MIREDS,
        hsv: [0.0; 3],
    };
    let source_mode = source.mode();
    for mode in ColorMode::ALL {
        if mode == source_mode {
            reps.set(source);
        } else {
            reps.set(converter.convert(source, mode));
        }
    }
    reps
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PaletteConversion;

impl ColorConversion for PaletteConversion {
    fn convert(&self, value: ColorValue, target: ColorMode) -> ColorValue {
        if value.mode() == target {
            return value;
        }
        match target {
            ColorMode::Rgb => {
                let rgb = to_srgb(value).into_format::<u8>();
                ColorValue::Rgb([rgb.red, rgb.green, rgb.blue])
            }
            ColorMode::XyY => {
                let yxy = to_yxy(value);
                ColorValue::XyY([yxy.x, yxy.y, yxy.luma])
            }
            ColorMode::Ct => {
                let yxy = to_yxy(value);
                ColorValue::Ct(xy_to_mireds(yxy.x, yxy.y))
            }
            ColorMode::Hsv => {
                let hsv: Hsv = Hsv::from_color(to_srgb(value));
                ColorValue::Hsv([
                    hsv.hue.into_positive_degrees(),
                    hsv.saturation * 100.0,
                    hsv.value * 100.0,
                ])
            }
        }
    }
}

fn to_srgb(value: ColorValue) -> Srgb {
    match value {
        ColorValue::Rgb([r, g, b]) => Srgb::<u8>::new(r, g, b).into_format(),
        ColorValue::Hsv([h, s, v]) => {
            let hsv: Hsv = Hsv::new(h, s / 100.0, v / 100.0);
            Srgb::from_color(hsv)
        }
        ColorValue::XyY(_) | ColorValue::Ct(_) => Srgb::from_color(to_yxy(value)),
    }
}

fn to_yxy(value: ColorValue) -> Yxy {
    match value {
        ColorValue::XyY([x, y, luma]) => Yxy::new(x, y, luma),
        ColorValue::Ct(mireds) => {
            let (x, y) = mireds_to_xy(mireds);
            Yxy::new(x, y, 1.0)
        }
        ColorValue::Rgb(_) | ColorValue::Hsv(_) => Yxy::from_color(to_srgb(value)),
    }
}

// Kang et al. (2002), "Design of Advanced Color Temperature Control System
// for HDTV Applications", equations 8 and 9.
fn mireds_to_xy(mireds: u16) -> (f32, f32) {
    let mired = mireds.clamp(CT_MIN_MIREDS, CT_MAX_MIREDS) as f32;
    let kelvin = 1.0e6 / mired;
    let t1 = mired * 1.0e-6;
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    let x = if kelvin < 4000.0 {
        -0.2661239e9 * t3 - 0.2343589e6 * t2 + 0.8776956e3 * t1 + 0.179910
    } else {
        -3.0258469e9 * t3 + 2.1070379e6 * t2 + 0.2226347e3 * t1 + 0.24039
    };
    let x2 = x * x;
    let x3 = x2 * x;
    let y = if kelvin < 2222.0 {
        -1.1063814 * x3 - 1.34811020 * x2 + 2.18555832 * x - 0.20219683
    } else if kelvin < 4000.0 {
        -0.9549476 * x3 - 1.37418593 * x2 + 2.09137015 * x - 0.16748867
    } else {
        3.0817580 * x3 - 5.8733867 * x2 + 3.75112997 * x - 0.37001483
    };
    (x, y)
}

// McCamy's cubic approximation of correlated color temperature.
fn xy_to_mireds(x: f32, y: f32) -> u16 {
    let n = (x - 0.3320) / (0.1858 - y);
    let kelvin = 449.0 * n.powi(3) + 3525.0 * n.powi(2) + 6823.3 * n + 5520.33;
    if !kelvin.is_finite() || kelvin <= 0.0 {
        return CT_MAX_MIREDS;
    }
    let mireds = (1.0e6 / kelvin).round();
    mireds.clamp(CT_MIN_MIREDS as f32, CT_MAX_MIREDS as f32) as u16
}
