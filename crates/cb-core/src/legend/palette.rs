//! Legend colors and palettes

use std::fmt;
use std::str::FromStr;
use colorous::Gradient;

/// An opaque 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    /// Parse `rrggbb` or `#rrggbb`
    pub fn from_hex(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_u32)
    }

    /// Lower-case `rrggbb` without a leading `#`
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s).ok_or_else(|| format!("Invalid hex color '{}'", s))
    }
}

impl From<colorous::Color> for Rgb {
    fn from(c: colorous::Color) -> Self {
        Self::new(c.r, c.g, c.b)
    }
}

/// Neutral color of empty-looking labels and of the "No Value" class
pub const NULL_COLOR: Rgb = Rgb::from_u32(0xc7c7c7);

/// Hand-picked distinct hues for up to 30 classes
const HUES: [u32; 30] = [
    0x7e4401, 0x244acd, 0xafc300, 0xa144cb, 0x00a13e,
    0xf064e5, 0x478700, 0x727eff, 0x9ed671, 0xb6006c,
    0x5fdd90, 0xf8384b, 0x00b199, 0xbb000f, 0x0052a3,
    0xfcba56, 0x005989, 0xc57000, 0x7a3a78, 0xccca76,
    0xff6591, 0x265e1c, 0xff726c, 0x7b8550, 0x923223,
    0x9a7e00, 0xffa9ad, 0x5f5300, 0xff9d76, 0xb3885f,
];

/// Higher-contrast hues used when there are only a few classes
const FEW_HUES: [u32; 5] = [0xcd6a00, 0x843dc3, 0xc9cd31, 0xeda3ff, 0x854350];

/// Palette of `n` colors for a legend.
///
/// Gradient palettes are used for ordered (numeric-looking) classes,
/// distinct hues otherwise.
pub fn make_palette(n: usize, gradient: bool) -> Vec<Rgb> {
    if gradient {
        gradient_palette(n)
    } else {
        categorical_palette(n)
    }
}

/// Get `n` distinct categorical colors
pub fn categorical_palette(n: usize) -> Vec<Rgb> {
    if n <= FEW_HUES.len() {
        FEW_HUES[..n].iter().copied().map(Rgb::from_u32).collect()
    } else if n < HUES.len() {
        HUES[..n].iter().copied().map(Rgb::from_u32).collect()
    } else {
        sample(&colorous::RAINBOW, n)
    }
}

/// Get `n` colors along a sequential gradient, light to dark
pub fn gradient_palette(n: usize) -> Vec<Rgb> {
    sample(&colorous::YELLOW_ORANGE_BROWN, n)
}

fn sample(gradient: &Gradient, n: usize) -> Vec<Rgb> {
    (0..n)
        .map(|i| {
            let t = if n <= 1 { 0.5 } else { i as f64 / (n - 1) as f64 };
            Rgb::from(gradient.eval_continuous(t))
        })
        .collect()
}
