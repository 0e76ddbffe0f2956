//! Control colors, each with a bright foreground and a dark background shade

use image::Rgba;

/// Channel value of the dark variant
const DARK: u8 = 140;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlColor {
    White,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
}

impl ControlColor {
    /// Listbox order
    pub const ALL: [ControlColor; 7] = [
        ControlColor::White,
        ControlColor::Red,
        ControlColor::Green,
        ControlColor::Blue,
        ControlColor::Cyan,
        ControlColor::Yellow,
        ControlColor::Magenta,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ControlColor::White => "white",
            ControlColor::Red => "red",
            ControlColor::Green => "green",
            ControlColor::Blue => "blue",
            ControlColor::Yellow => "yellow",
            ControlColor::Cyan => "cyan",
            ControlColor::Magenta => "magenta",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ControlColor::White => "White",
            ControlColor::Red => "Red",
            ControlColor::Green => "Green",
            ControlColor::Blue => "Blue",
            ControlColor::Yellow => "Yellow",
            ControlColor::Cyan => "Cyan",
            ControlColor::Magenta => "Magenta",
        }
    }

    /// Look up by listbox value; unknown names fall back to white
    pub fn from_name_or_white(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|color| color.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or(ControlColor::White)
    }

    /// Which of (r, g, b) are lit
    fn channels(&self) -> (bool, bool, bool) {
        match self {
            ControlColor::White => (true, true, true),
            ControlColor::Red => (true, false, false),
            ControlColor::Green => (false, true, false),
            ControlColor::Blue => (false, false, true),
            ControlColor::Yellow => (true, true, false),
            ControlColor::Cyan => (false, true, true),
            ControlColor::Magenta => (true, false, true),
        }
    }

    fn shade(&self, level: u8) -> Rgba<u8> {
        let (r, g, b) = self.channels();
        let c = |on: bool| if on { level } else { 0 };
        Rgba([c(r), c(g), c(b), 255])
    }

    /// Foreground shade
    pub fn bright(&self) -> Rgba<u8> {
        self.shade(255)
    }

    /// Background shade
    pub fn dark(&self) -> Rgba<u8> {
        self.shade(DARK)
    }
}
