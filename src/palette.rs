//! Categorical colour palettes.
//!
//! Colours are assigned by an entity's rank in the current top-K ordering,
//! not by the entity itself: the same country can get different colours in
//! two charts where its rank differs.

/// An sRGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn from_hex(v: u32) -> Self {
        Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
    }

    /// `#rrggbb` form used by the HTML documents.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

/// matplotlib `tab20`.
pub const TAB20: [Rgb; 20] = [
    Rgb::from_hex(0x1f77b4),
    Rgb::from_hex(0xaec7e8),
    Rgb::from_hex(0xff7f0e),
    Rgb::from_hex(0xffbb78),
    Rgb::from_hex(0x2ca02c),
    Rgb::from_hex(0x98df8a),
    Rgb::from_hex(0xd62728),
    Rgb::from_hex(0xff9896),
    Rgb::from_hex(0x9467bd),
    Rgb::from_hex(0xc5b0d5),
    Rgb::from_hex(0x8c564b),
    Rgb::from_hex(0xc49c94),
    Rgb::from_hex(0xe377c2),
    Rgb::from_hex(0xf7b6d2),
    Rgb::from_hex(0x7f7f7f),
    Rgb::from_hex(0xc7c7c7),
    Rgb::from_hex(0xbcbd22),
    Rgb::from_hex(0xdbdb8d),
    Rgb::from_hex(0x17becf),
    Rgb::from_hex(0x9edae5),
];

/// matplotlib `tab20c`.
pub const TAB20C: [Rgb; 20] = [
    Rgb::from_hex(0x3182bd),
    Rgb::from_hex(0x6baed6),
    Rgb::from_hex(0x9ecae1),
    Rgb::from_hex(0xc6dbef),
    Rgb::from_hex(0xe6550d),
    Rgb::from_hex(0xfd8d3c),
    Rgb::from_hex(0xfdae6b),
    Rgb::from_hex(0xfdd0a2),
    Rgb::from_hex(0x31a354),
    Rgb::from_hex(0x74c476),
    Rgb::from_hex(0xa1d99b),
    Rgb::from_hex(0xc7e9c0),
    Rgb::from_hex(0x756bb1),
    Rgb::from_hex(0x9e9ac8),
    Rgb::from_hex(0xbcbddc),
    Rgb::from_hex(0xdadaeb),
    Rgb::from_hex(0x636363),
    Rgb::from_hex(0x969696),
    Rgb::from_hex(0xbdbdbd),
    Rgb::from_hex(0xd9d9d9),
];

/// Colour assignment keyed by rank index.
pub trait RankPalette {
    fn color_at(&self, rank: usize) -> Rgb;
}

/// Cycles through a fixed list of colours.
#[derive(Debug, Clone, Copy)]
pub struct Cyclic(&'static [Rgb]);

impl Cyclic {
    pub fn tab20() -> Self {
        Cyclic(&TAB20)
    }

    pub fn tab20c() -> Self {
        Cyclic(&TAB20C)
    }
}

impl RankPalette for Cyclic {
    fn color_at(&self, rank: usize) -> Rgb {
        self.0[rank % self.0.len()]
    }
}

/// Piecewise-linear colour map over `[0, 1]`.
#[derive(Debug, Clone)]
pub struct Gradient {
    stops: Vec<Rgb>,
}

impl Gradient {
    pub fn new(stops: Vec<Rgb>) -> Self {
        Self { stops }
    }

    /// tab20 entries 0, 4, 8 and 12, the heatmap's colour map.
    pub fn heatmap() -> Self {
        Self::new(vec![TAB20[0], TAB20[4], TAB20[8], TAB20[12]])
    }

    pub fn at(&self, t: f64) -> Rgb {
        match self.stops.len() {
            0 => Rgb(255, 255, 255),
            1 => self.stops[0],
            n => {
                let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
                let scaled = t * (n - 1) as f64;
                let lo = (scaled.floor() as usize).min(n - 2);
                self.stops[lo].lerp(self.stops[lo + 1], scaled - lo as f64)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_not_identity_decides_colour() {
        let p = Cyclic::tab20();
        assert_eq!(p.color_at(0), TAB20[0]);
        assert_eq!(p.color_at(19), TAB20[19]);
        assert_eq!(p.color_at(20), TAB20[0]);
    }

    #[test]
    fn hex_round_trips_matplotlib_blue() {
        assert_eq!(TAB20[0].hex(), "#1f77b4");
        assert_eq!(TAB20C[4], Rgb(0xe6, 0x55, 0x0d));
    }

    #[test]
    fn gradient_hits_endpoints_and_clamps() {
        let g = Gradient::heatmap();
        assert_eq!(g.at(0.0), TAB20[0]);
        assert_eq!(g.at(1.0), TAB20[12]);
        assert_eq!(g.at(-3.0), TAB20[0]);
        assert_eq!(g.at(7.0), TAB20[12]);
        assert_eq!(g.at(f64::NAN), TAB20[0]);
    }
}
