//! Display name generation and the name -> color mapping.
//!
//! Both are pure: generation only depends on the supplied RNG, and
//! [`color_for`] only on the characters of the name, so every client renders
//! the same name with the same color without coordination.

use std::fmt;

use rand::Rng;

use super::value_object::DisplayName;

/// Fixed key of the local identity slot
pub const IDENTITY_KEY: &str = "chat-username";

pub const ADJECTIVES: [&str; 15] = [
    "Swift", "Cosmic", "Neon", "Solar", "Lunar", "Crimson", "Azure", "Golden", "Silver", "Misty",
    "Bold", "Wild", "Sage", "Coral", "Jade",
];

pub const NOUNS: [&str; 15] = [
    "Fox", "Panda", "Hawk", "Wolf", "Tiger", "Raven", "Lynx", "Orca", "Crane", "Viper", "Bear",
    "Elk", "Moth", "Lark", "Finch",
];

/// Rendering palette, indexed by [`color_for`]
pub const PALETTE: [Color; 10] = [
    Color::rgb(0xFF, 0x6B, 0x6B),
    Color::rgb(0xFF, 0xA9, 0x4D),
    Color::rgb(0xFF, 0xD4, 0x3B),
    Color::rgb(0x69, 0xDB, 0x7C),
    Color::rgb(0x4D, 0xAB, 0xF7),
    Color::rgb(0xCC, 0x5D, 0xE8),
    Color::rgb(0xF7, 0x83, 0xAC),
    Color::rgb(0x63, 0xE6, 0xBE),
    Color::rgb(0x74, 0x8F, 0xFC),
    Color::rgb(0xF0, 0x65, 0x95),
];

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB`
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}

/// Result of identity resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub display_name: DisplayName,
    /// True when the name came from the store (the session starts joined)
    pub was_restored: bool,
}

/// Draw `<Adjective><Noun>` with independent uniform choices.
pub fn random_display_name<R: Rng + ?Sized>(rng: &mut R) -> DisplayName {
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    // The longest combination ("CrimsonFinch") is far below the length limit.
    DisplayName::new(format!("{adjective}{noun}"))
        .unwrap_or_else(|_| unreachable!("generated names are always valid"))
}

/// Restore the stored name, or generate a fresh one on first visit.
///
/// A non-blank stored value is restored exactly as stored. One that is blank
/// or no longer a valid display name counts as absent.
pub fn resolve_identity_with<R: Rng + ?Sized>(
    stored: Option<&str>,
    rng: &mut R,
) -> ResolvedIdentity {
    let restored = stored
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| DisplayName::new(s.to_string()).ok());

    match restored {
        Some(display_name) => ResolvedIdentity {
            display_name,
            was_restored: true,
        },
        None => ResolvedIdentity {
            display_name: random_display_name(rng),
            was_restored: false,
        },
    }
}

/// [`resolve_identity_with`] using the thread-local RNG.
pub fn resolve_identity(stored: Option<&str>) -> ResolvedIdentity {
    resolve_identity_with(stored, &mut rand::rng())
}

/// Deterministic palette color for a name.
///
/// Folds each code point into a 32-bit two's complement accumulator
/// (`acc * 31 + code`, wrapping) and indexes the palette with `|acc| mod 10`.
pub fn color_for(display_name: &str) -> Color {
    let acc = display_name
        .chars()
        .fold(0i32, |acc, c| acc.wrapping_mul(31).wrapping_add(c as u32 as i32));
    PALETTE[(acc.unsigned_abs() % PALETTE.len() as u32) as usize]
}
