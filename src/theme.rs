use ratatui::style::Color;

// Color palette structure
#[derive(Clone, Debug)]
pub struct Base16Palette {
    pub base_00: Color, // Background
    pub base_01: Color, // Lighter background
    pub base_02: Color, // Selection background
    pub base_03: Color, // Comments, invisibles
    pub base_04: Color, // Dark foreground
    pub base_05: Color, // Default foreground
    pub base_06: Color, // Light foreground
    pub base_07: Color, // Light background
    pub base_08: Color, // Red
    pub base_0a: Color, // Yellow
    pub base_0b: Color, // Green
    pub base_0d: Color, // Blue
}

pub const OCEANIC_NEXT: Base16Palette = Base16Palette {
    base_00: Color::Rgb(0x1B, 0x2B, 0x34),
    base_01: Color::Rgb(0x34, 0x3D, 0x46),
    base_02: Color::Rgb(0x4F, 0x5B, 0x66),
    base_03: Color::Rgb(0x65, 0x73, 0x7E),
    base_04: Color::Rgb(0xA7, 0xAD, 0xBA),
    base_05: Color::Rgb(0xC0, 0xC5, 0xCE),
    base_06: Color::Rgb(0xCD, 0xD3, 0xDE),
    base_07: Color::Rgb(0xD8, 0xDE, 0xE9),
    base_08: Color::Rgb(0xEC, 0x5F, 0x67),
    base_0a: Color::Rgb(0xFA, 0xC8, 0x63),
    base_0b: Color::Rgb(0x99, 0xC7, 0x94),
    base_0d: Color::Rgb(0x66, 0x99, 0xCC),
};

pub fn current_theme() -> &'static Base16Palette {
    &OCEANIC_NEXT
}

/// Parse `RRGGBB`, `#RRGGBB` or `rgb(r, g, b)` / `rgba(r, g, b, a)`.
/// Alpha is ignored; terminals have no blending.
pub fn parse_color(input: &str) -> Option<Color> {
    let input = input.trim();

    if let Some(args) = input
        .strip_prefix("rgba(")
        .or_else(|| input.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let mut parts = args.split(',').map(|p| p.trim().parse::<u8>());
        let r = parts.next()?.ok()?;
        let g = parts.next()?.ok()?;
        let b = parts.next()?.ok()?;
        return Some(Color::Rgb(r, g, b));
    }

    let hex = input.strip_prefix('#').unwrap_or(input);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_css_colors() {
        assert_eq!(parse_color("6366F1"), Some(Color::Rgb(0x63, 0x66, 0xF1)));
        assert_eq!(parse_color("#ff8800"), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(
            parse_color("rgba(99, 102, 241, 0.3)"),
            Some(Color::Rgb(99, 102, 241))
        );
        assert_eq!(parse_color("rgb(1,2,3)"), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(parse_color("blue"), None);
        assert_eq!(parse_color("rgb(300, 0, 0)"), None);
    }
}
