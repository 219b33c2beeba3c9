//! CSS hex color parsing.

use peniko::Color;

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`. Anything else renders black.
pub fn parse_color(css: &str) -> Color {
    try_parse_color(css).unwrap_or_else(|| {
        log::debug!("Unrecognized color {:?}, using black", css);
        Color::BLACK
    })
}

/// Parse a hex color, `None` if malformed.
pub fn try_parse_color(css: &str) -> Option<Color> {
    let hex = css.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    match hex.len() {
        3 => Some(Color::from_rgba8(short(0)?, short(1)?, short(2)?, 255)),
        6 => Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some(Color::from_rgba8(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// Convert to the rasterizer's color type.
pub(crate) fn to_skia(color: Color) -> tiny_skia::Color {
    let rgba = color.to_rgba8();
    tiny_skia::Color::from_rgba8(rgba.r, rgba.g, rgba.b, rgba.a)
}

/// Same color with its alpha replaced.
pub(crate) fn with_alpha(color: Color, alpha: u8) -> Color {
    let rgba = color.to_rgba8();
    Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
}
