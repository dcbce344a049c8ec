//! Color models used by luminaire lights.
//!
//! Units
//! - `rgb`: 8-bit sRGB components.
//! - `xyY`: CIE 1931 chromaticity plus relative luminance (0..=1).
//! - `ct`: color temperature in mireds, as the bridge uses it.
//! - `hsv`: hue in degrees, saturation and value in percent.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "rgb")]
    Rgb,
    #[serde(rename = "xyY")]
    XyY,
    #[serde(rename = "ct")]
    Ct,
    #[serde(rename = "hsv")]
    Hsv,
}

impl ColorMode {
    pub const ALL: [ColorMode; 4] = [ColorMode::Rgb, ColorMode::XyY, ColorMode::Ct, ColorMode::Hsv];

    pub fn key(self) -> &'static str {
        match self {
            ColorMode::Rgb => "rgb",
            ColorMode::XyY => "xyY",
            ColorMode::Ct => "ct",
            ColorMode::Hsv => "hsv",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A color expressed in exactly one model, e.g. `{"rgb": [255, 0, 0]}`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorValue {
    #[serde(rename = "rgb")]
    Rgb([u8; 3]),
    #[serde(rename = "xyY")]
    XyY([f32; 3]),
    #[serde(rename = "ct")]
    Ct(u16),
    #[serde(rename = "hsv")]
    Hsv([f32; 3]),
}

impl ColorValue {
    pub fn mode(&self) -> ColorMode {
        match self {
            ColorValue::Rgb(_) => ColorMode::Rgb,
            ColorValue::XyY(_) => ColorMode::XyY,
            ColorValue::Ct(_) => ColorMode::Ct,
            ColorValue::Hsv(_) => ColorMode::Hsv,
        }
    }
}

impl Default for ColorValue {
    fn default() -> Self {
        ColorValue::Rgb([255, 255, 255])
    }
}

/// The same color held in all four models.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRepresentations {
    pub rgb: [u8; 3],
    #[serde(rename = "xyY")]
    pub xy_y: [f32; 3],
    pub ct: u16,
    pub hsv: [f32; 3],
}

impl ColorRepresentations {
    pub(crate) fn set(&mut self, value: ColorValue) {
        match value {
            ColorValue::Rgb(v) => self.rgb = v,
            ColorValue::XyY(v) => self.xy_y = v,
            ColorValue::Ct(v) => self.ct = v,
            ColorValue::Hsv(v) => self.hsv = v,
        }
    }
}
