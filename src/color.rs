//! Colour helpers: label contrast and `#RRGGBB` serialization.

use slint::Color;

/// WCAG relative luminance of an sRGB colour, in `0.0..=1.0`.
pub fn relative_luminance(color: Color) -> f32 {
    fn channel(value: u8) -> f32 {
        let c = value as f32 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * channel(color.red()) + 0.7152 * channel(color.green()) + 0.0722 * channel(color.blue())
}

/// WCAG contrast ratio between two colours, in `1.0..=21.0`.
pub fn contrast_ratio(a: Color, b: Color) -> f32 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (light, dark) = if la >= lb { (la, lb) } else { (lb, la) };
    (light + 0.05) / (dark + 0.05)
}

/// Black or white, whichever reads better on `background`.
pub fn contrasting_text_color(background: Color) -> Color {
    let black = Color::from_rgb_u8(0, 0, 0);
    let white = Color::from_rgb_u8(255, 255, 255);
    if contrast_ratio(background, black) >= contrast_ratio(background, white) {
        black
    } else {
        white
    }
}

/// Format as `#RRGGBB`. Alpha is dropped; opacity lives in the style.
pub fn to_hex(color: Color) -> String {
    format!(
        "#{:02X}{:02X}{:02X}",
        color.red(),
        color.green(),
        color.blue()
    )
}

/// Parse `#RRGGBB` (the leading `#` is optional).
pub fn from_hex(s: &str) -> Option<Color> {
    let digits = s.strip_prefix('#').unwrap_or(s);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
    let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
    let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
    Some(Color::from_rgb_u8(r, g, b))
}

/// `#[serde(with = "color::hex")]` adapter for [`Color`] fields.
pub mod hex {
    use serde::{Deserialize, Deserializer, Serializer};
    use slint::Color;

    pub fn serialize<S: Serializer>(color: &Color, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid colour `{s}`")))
    }
}
