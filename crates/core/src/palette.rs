//! Color translation from proposal colors to host color enumerations.

use crate::types::GroupColor;
use serde::{Deserialize, Serialize};

/// Colors accepted by the native tab-group primitive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NativeColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl NativeColor {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeColor::Grey => "grey",
            NativeColor::Blue => "blue",
            NativeColor::Red => "red",
            NativeColor::Yellow => "yellow",
            NativeColor::Green => "green",
            NativeColor::Pink => "pink",
            NativeColor::Purple => "purple",
            NativeColor::Cyan => "cyan",
            NativeColor::Orange => "orange",
        }
    }
}

/// Nearest native color for a proposal color.
pub fn native_color(color: GroupColor) -> NativeColor {
    match color {
        GroupColor::Grey => NativeColor::Grey,
        GroupColor::Blue => NativeColor::Blue,
        GroupColor::Red => NativeColor::Red,
        GroupColor::Yellow => NativeColor::Yellow,
        GroupColor::Green => NativeColor::Green,
        GroupColor::Pink => NativeColor::Pink,
        GroupColor::Purple => NativeColor::Purple,
        GroupColor::Cyan => NativeColor::Cyan,
    }
}

pub const DEFAULT_STACK_COLOR: &str = "#7f8c8d";

/// Stack colors are written into the tab metadata blob as hex strings.
const STACK_COLORS: &[(&str, &str)] = &[
    ("grey", "#7f8c8d"),
    ("blue", "#3498db"),
    ("red", "#e74c3c"),
    ("yellow", "#f1c40f"),
    ("green", "#2ecc71"),
    ("pink", "#fd79a8"),
    ("purple", "#9b59b6"),
    ("cyan", "#1abc9c"),
];

/// Looks a color name up in the stack table, falling back to grey.
pub fn stack_color_for(name: &str) -> &'static str {
    STACK_COLORS
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| *value)
        .unwrap_or(DEFAULT_STACK_COLOR)
}

pub fn stack_color(color: GroupColor) -> &'static str {
    stack_color_for(color.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_group_color_has_stack_entry() {
        for color in GroupColor::ALL {
            let mapped = stack_color(color);
            if color != GroupColor::Grey {
                assert_ne!(mapped, DEFAULT_STACK_COLOR, "{:?} fell back", color);
            }
        }
    }

    #[test]
    fn test_unknown_name_uses_default() {
        assert_eq!(stack_color_for("orange"), DEFAULT_STACK_COLOR);
        assert_eq!(stack_color_for(""), DEFAULT_STACK_COLOR);
        assert_eq!(stack_color_for("BLUE"), "#3498db");
    }

    #[test]
    fn test_native_color_keeps_name() {
        for color in GroupColor::ALL {
            assert_eq!(native_color(color).as_str(), color.as_str());
        }
    }
}
