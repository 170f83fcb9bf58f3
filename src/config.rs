use crate::biometrics::{AveragingRule, EstimationMethod};
use crate::Error;
use serde::{Deserialize, Serialize};

/// Minimum surface resolution relative to the logical display size.
pub const MIN_SCALE: u32 = 2;

/// Line style used for every stroke. Caps and joins are always round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StrokeStyle {
    /// Line width in logical pixels.
    pub width: f64,
    /// `#RRGGBB` or `#RRGGBBAA`.
    pub color: String,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        StrokeStyle {
            width: 2.0,
            color: "#99FFB4".to_owned(),
        }
    }
}

impl StrokeStyle {
    pub fn rgba(&self) -> Result<[u8; 4], Error> {
        parse_hex_color(&self.color)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PadConfig {
    /// Device pixels per logical pixel. Values below 2 are raised to 2.
    pub scale: u32,
    pub stroke: StrokeStyle,
    pub estimator: EstimationMethod,
    pub averaging: AveragingRule,
}

impl Default for PadConfig {
    fn default() -> Self {
        PadConfig {
            scale: MIN_SCALE,
            stroke: StrokeStyle::default(),
            estimator: EstimationMethod::default(),
            averaging: AveragingRule::default(),
        }
    }
}

impl PadConfig {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let config: PadConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.stroke.width.is_finite() && self.stroke.width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "stroke width must be positive, got `{}`",
                self.stroke.width
            )));
        }
        self.stroke.rgba()?;
        Ok(())
    }

    pub(crate) fn effective_scale(&self) -> u32 {
        self.scale.max(MIN_SCALE)
    }
}

fn parse_hex_color(color: &str) -> Result<[u8; 4], Error> {
    let invalid = || Error::InvalidConfig(format!("`{}` is not a hex color", color));
    let hex = color.strip_prefix('#').ok_or_else(invalid)?;
    if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
        return Err(invalid());
    }
    let mut rgba = [0u8, 0, 0, 255];
    for (index, channel) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
        *channel =
            u8::from_str_radix(&hex[index * 2..index * 2 + 2], 16).map_err(|_| invalid())?;
    }
    Ok(rgba)
}
