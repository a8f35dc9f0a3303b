//! Colors, categorical palettes, continuous colormaps and the color-scale
//! policy that turns table values into colormap positions.

use std::fmt;
use std::str::FromStr;

use crate::error::{HeatmapError, Result};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

const fn hex(v: u32) -> Rgb {
    Rgb((v >> 16) as u8, (v >> 8) as u8, v as u8)
}

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const BLACK: Rgb = Rgb(0, 0, 0);

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex())
    }
}

impl FromStr for Rgb {
    type Err = HeatmapError;

    /// Accepts `#rrggbb`, `#rgb`, `r,g,b` and a handful of single-letter names.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || HeatmapError::InvalidColor {
            value: s.to_string(),
        };
        let raw = s.trim();
        match raw.to_ascii_lowercase().as_str() {
            "w" | "white" => return Ok(Rgb::WHITE),
            "k" | "black" => return Ok(Rgb::BLACK),
            "grey" | "gray" => return Ok(Rgb(128, 128, 128)),
            "r" | "red" => return Ok(Rgb(255, 0, 0)),
            "b" | "blue" => return Ok(Rgb(0, 0, 255)),
            "g" | "green" => return Ok(Rgb(0, 128, 0)),
            _ => {}
        }

        if raw.contains(',') {
            let parts: Vec<u8> = raw
                .split(',')
                .map(|p| p.trim().parse::<u8>())
                .collect::<std::result::Result<_, _>>()
                .map_err(|_| invalid())?;
            return match parts.as_slice() {
                [r, g, b] => Ok(Rgb(*r, *g, *b)),
                _ => Err(invalid()),
            };
        }

        let digits = raw.strip_prefix('#').unwrap_or(raw);
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        match digits.len() {
            6 => {
                let v = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
                Ok(hex(v))
            }
            3 => {
                let v = u32::from_str_radix(digits, 16).map_err(|_| invalid())?;
                let expand = |n: u32| (n * 17) as u8;
                Ok(Rgb(expand(v >> 8 & 0xf), expand(v >> 4 & 0xf), expand(v & 0xf)))
            }
            _ => Err(invalid()),
        }
    }
}

/// Reserved color of a categorical group with exactly one member
pub const SINGLETON_COLOR: Rgb = Rgb::WHITE;

/// Fill for missing or NaN cells
pub const MISSING_COLOR: Rgb = Rgb(211, 211, 211);

/// Qualitative palette of 22 saturated colors (default for annotations)
pub const XKCD: [Rgb; 22] = [
    hex(0x812b9c), hex(0xd0a6fd), hex(0x00ad1f), hex(0xc27ef6), hex(0x8cf67d),
    hex(0x004fdf), hex(0x29f9a2), hex(0x6bbefd), hex(0xff84bf), hex(0x0020aa),
    hex(0x8d89fe), hex(0x683600), hex(0xd4b06f), hex(0xffd2df), hex(0xb08050),
    hex(0xed0400), hex(0xff7200), hex(0xc81477), hex(0x690220), hex(0xfffb19),
    hex(0xd1b003), hex(0x000000),
];

/// ColorBrewer Paired + Set3 blend, 22 colors
pub const SET22: [Rgb; 22] = [
    hex(0xa6cee3), hex(0x2076b4), hex(0xb2df8a), hex(0x33a02c), hex(0xfb9a99),
    hex(0xe31a1c), hex(0xfdbf6f), hex(0xff7f00), hex(0xcab2d6), hex(0x653d9a),
    hex(0xffff99), hex(0xd6604d), hex(0x8dd3c7), hex(0xffffb3), hex(0xbdbbdb),
    hex(0xfb8072), hex(0x80b1d3), hex(0xfdb462), hex(0xb3de69), hex(0xf8cce5),
    hex(0xd9d9d9), hex(0xbc80bd),
];

/// Ordered, non-empty list of colors handed out to categorical groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<Rgb>);

impl Palette {
    pub fn new(colors: Vec<Rgb>) -> Result<Self> {
        if colors.is_empty() {
            return Err(HeatmapError::InvalidPalette {
                message: "palette has no colors".to_string(),
            });
        }
        Ok(Palette(colors))
    }

    pub fn xkcd() -> Self {
        Palette(XKCD.to_vec())
    }

    pub fn set22() -> Self {
        Palette(SET22.to_vec())
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Color of slot `i`, wrapping around the palette
    pub fn get(&self, i: usize) -> Rgb {
        self.0[i % self.0.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::xkcd()
    }
}

impl FromStr for Palette {
    type Err = HeatmapError;

    /// A bundled palette name or a space or semicolon separated list of colors.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xkcd" => Ok(Palette::xkcd()),
            "set22" => Ok(Palette::set22()),
            _ => {
                let colors = s
                    .split(|c: char| c == ' ' || c == ';')
                    .filter(|p| !p.is_empty())
                    .map(Rgb::from_str)
                    .collect::<Result<Vec<_>>>()
                    .map_err(|_| HeatmapError::InvalidPalette {
                        message: format!("unknown palette '{}'", s),
                    })?;
                Palette::new(colors)
            }
        }
    }
}

const REDS: [Rgb; 9] = [
    hex(0xfff5f0), hex(0xfee0d2), hex(0xfcbba1), hex(0xfc9272), hex(0xfb6a4a),
    hex(0xef3b2c), hex(0xcb181d), hex(0xa50f15), hex(0x67000d),
];
const BLUES: [Rgb; 9] = [
    hex(0xf7fbff), hex(0xdeebf7), hex(0xc6dbef), hex(0x9ecae1), hex(0x6baed6),
    hex(0x4292c6), hex(0x2171b5), hex(0x08519c), hex(0x08306b),
];
const GREENS: [Rgb; 9] = [
    hex(0xf7fcf5), hex(0xe5f5e0), hex(0xc7e9c0), hex(0xa1d99b), hex(0x74c476),
    hex(0x41ab5d), hex(0x238b45), hex(0x006d2c), hex(0x00441b),
];
const GREYS: [Rgb; 9] = [
    hex(0xffffff), hex(0xf0f0f0), hex(0xd9d9d9), hex(0xbdbdbd), hex(0x969696),
    hex(0x737373), hex(0x525252), hex(0x252525), hex(0x000000),
];
const GNBU: [Rgb; 9] = [
    hex(0xf7fcf0), hex(0xe0f3db), hex(0xccebc5), hex(0xa8ddb5), hex(0x7bccc4),
    hex(0x4eb3d3), hex(0x2b8cbe), hex(0x0868ac), hex(0x084081),
];
const RDBU: [Rgb; 11] = [
    hex(0x67001f), hex(0xb2182b), hex(0xd6604d), hex(0xf4a582), hex(0xfddbc7),
    hex(0xf7f7f7), hex(0xd1e5f0), hex(0x92c5de), hex(0x4393c3), hex(0x2166ac),
    hex(0x053061),
];
const SEISMIC: [Rgb; 5] = [
    hex(0x00004c), hex(0x0000ff), hex(0xffffff), hex(0xff0000), hex(0x7f0000),
];
const BWR: [Rgb; 3] = [hex(0x0000ff), hex(0xffffff), hex(0xff0000)];
const VIRIDIS: [Rgb; 10] = [
    hex(0x440154), hex(0x482878), hex(0x3e4989), hex(0x31688e), hex(0x26828e),
    hex(0x1f9e89), hex(0x35b779), hex(0x6ece58), hex(0xb5de2b), hex(0xfde725),
];

const COLORMAPS: [(&str, &[Rgb]); 9] = [
    ("Reds", &REDS),
    ("Blues", &BLUES),
    ("Greens", &GREENS),
    ("Greys", &GREYS),
    ("GnBu", &GNBU),
    ("RdBu", &RDBU),
    ("seismic", &SEISMIC),
    ("bwr", &BWR),
    ("viridis", &VIRIDIS),
];

/// Continuous colormap: evenly spaced anchors, linear interpolation between them.
///
/// Names follow matplotlib; a `_r` suffix reverses the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Colormap {
    name: &'static str,
    anchors: &'static [Rgb],
    reversed: bool,
}

impl Colormap {
    pub fn name(&self) -> String {
        if self.reversed {
            format!("{}_r", self.name)
        } else {
            self.name.to_string()
        }
    }

    /// Color at position `t` in `[0, 1]` (clamped)
    pub fn sample(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let t = if self.reversed { 1.0 - t } else { t };
        let last = self.anchors.len() - 1;
        let scaled = t * last as f64;
        let i = (scaled.floor() as usize).min(last.saturating_sub(1));
        if last == 0 {
            return self.anchors[0];
        }
        self.anchors[i].lerp(self.anchors[i + 1], scaled - i as f64)
    }

    /// Color of `value` under `bounds`; NaN maps to [`MISSING_COLOR`].
    pub fn color(&self, value: f64, bounds: ColorBounds) -> Rgb {
        match bounds.normalize(value) {
            Some(t) => self.sample(t),
            None => MISSING_COLOR,
        }
    }
}

impl FromStr for Colormap {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        let raw = s.trim();
        let (base, reversed) = match raw.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (raw, false),
        };
        COLORMAPS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(base))
            .map(|&(name, anchors)| Colormap {
                name,
                anchors,
                reversed,
            })
            .ok_or_else(|| HeatmapError::InvalidColor {
                value: format!("unknown colormap '{}'", s),
            })
    }
}

impl Colormap {
    pub fn seismic() -> Self {
        Colormap {
            name: "seismic",
            anchors: &SEISMIC,
            reversed: false,
        }
    }

    /// Default map for continuous annotations
    pub fn gnbu_r() -> Self {
        Colormap {
            name: "GnBu",
            anchors: &GNBU,
            reversed: true,
        }
    }
}

impl Default for Colormap {
    fn default() -> Self {
        Colormap::seismic()
    }
}

/// Value range mapped onto a colormap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorBounds {
    pub min: f64,
    pub max: f64,
}

impl ColorBounds {
    /// Position of `value` in `[0, 1]`; `None` for NaN.
    pub fn normalize(&self, value: f64) -> Option<f64> {
        if value.is_nan() {
            return None;
        }
        let width = self.max - self.min;
        if width <= 0.0 || !width.is_finite() {
            return Some(0.5);
        }
        Some(((value - self.min) / width).clamp(0.0, 1.0))
    }
}

/// Finite minimum and maximum of `values`
pub fn finite_range(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Derive the color bounds of a heatmap.
///
/// Requested bounds win over the data extrema. With `symmetric`, both bounds
/// move to the same distance from `symmetry_point`: the larger of the two
/// one-sided distances, so a bound is only ever widened.
///
/// The bounds are `point - d` and `point + d` in floating point, so
/// `max - point` and `point - min` agree up to one rounding step of the
/// larger bound rather than bit for bit.
pub fn resolve_color_bounds(
    table: &Table,
    vmin: Option<f64>,
    vmax: Option<f64>,
    symmetric: bool,
    symmetry_point: f64,
) -> Result<ColorBounds> {
    let (min, max) = match (vmin, vmax) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => {
            let (lo, hi) =
                finite_range(table.values().iter().copied()).ok_or(HeatmapError::EmptyRange)?;
            (vmin.unwrap_or(lo), vmax.unwrap_or(hi))
        }
    };

    if !symmetric {
        return Ok(ColorBounds { min, max });
    }
    let d = (max - symmetry_point).abs().max((min - symmetry_point).abs());
    Ok(ColorBounds {
        min: symmetry_point - d,
        max: symmetry_point + d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table(values: Vec<f64>) -> Table {
        let n = values.len();
        Table::new(
            vec!["r".to_string()],
            (0..n).map(|i| format!("c{i}")).collect(),
            values,
        )
        .unwrap()
    }

    #[test]
    fn symmetric_scale_expands_the_short_side() {
        let t = table(vec![-2.0, 1.0, 5.0]);
        let bounds = resolve_color_bounds(&t, None, None, true, 0.0).unwrap();
        assert_eq!(bounds, ColorBounds { min: -5.0, max: 5.0 });
    }

    #[test]
    fn explicit_bounds_pass_through_when_not_symmetric() {
        let t = table(vec![-7.0, 9.0]);
        let bounds = resolve_color_bounds(&t, Some(-1.0), Some(1.0), false, 0.0).unwrap();
        assert_eq!(bounds, ColorBounds { min: -1.0, max: 1.0 });
    }

    #[rstest]
    #[case(Some(-3.0), None, 1.0, (-3.0, 5.0))]
    #[case(None, Some(2.0), 0.0, (-2.0, 2.0))]
    #[case(Some(-1.0), Some(1.0), 0.5, (-1.0, 2.0))]
    fn symmetrization_never_shrinks_a_requested_bound(
        #[case] vmin: Option<f64>,
        #[case] vmax: Option<f64>,
        #[case] point: f64,
        #[case] expected: (f64, f64),
    ) {
        let t = table(vec![-2.0, 0.5, 1.5]);
        let b = resolve_color_bounds(&t, vmin, vmax, true, point).unwrap();
        assert_eq!((b.min, b.max), expected);
        assert_eq!(b.max - point, point - b.min);
    }

    #[rstest]
    #[case(1.7, vec![0.05, 2.2])]
    #[case(0.1, vec![-0.3, 0.7])]
    #[case(-2.5, vec![-9.9, 3.3])]
    fn symmetric_halves_agree_within_rounding(#[case] point: f64, #[case] values: Vec<f64>) {
        let b = resolve_color_bounds(&table(values), None, None, true, point).unwrap();
        let (up, down) = (b.max - point, point - b.min);
        let ulp = f64::EPSILON * b.max.abs().max(b.min.abs());
        assert!((up - down).abs() <= ulp, "{up} vs {down}");
        assert!((b.normalize(point).unwrap() - 0.5).abs() <= f64::EPSILON);
    }

    #[test]
    fn all_nan_table_has_no_range() {
        let t = table(vec![f64::NAN, f64::NAN]);
        let err = resolve_color_bounds(&t, None, None, false, 0.0).unwrap_err();
        assert!(matches!(err, HeatmapError::EmptyRange));
        // fully explicit bounds need no data
        assert!(resolve_color_bounds(&t, Some(0.0), Some(1.0), true, 0.0).is_ok());
    }

    #[rstest]
    #[case("#812b9c", Rgb(0x81, 0x2b, 0x9c))]
    #[case("fff", Rgb(255, 255, 255))]
    #[case("10, 20, 30", Rgb(10, 20, 30))]
    #[case("w", Rgb::WHITE)]
    fn colors_parse(#[case] raw: &str, #[case] expected: Rgb) {
        assert_eq!(raw.parse::<Rgb>().unwrap(), expected);
    }

    #[test]
    fn bad_colors_are_rejected() {
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("300,0,0".parse::<Rgb>().is_err());
        assert!("#gg0000".parse::<Rgb>().is_err());
    }

    #[test]
    fn colormap_endpoints_and_reversal() {
        let reds: Colormap = "Reds".parse().unwrap();
        assert_eq!(reds.sample(0.0), REDS[0]);
        assert_eq!(reds.sample(1.0), REDS[8]);
        let reds_r: Colormap = "Reds_r".parse().unwrap();
        assert_eq!(reds_r.sample(0.0), REDS[8]);
        assert_eq!(reds_r.name(), "Reds_r");
        assert_eq!(Colormap::seismic().sample(0.5), Rgb::WHITE);
        assert!("jet".parse::<Colormap>().is_err());
    }

    #[test]
    fn normalize_clamps_and_skips_nan() {
        let b = ColorBounds { min: -1.0, max: 1.0 };
        assert_eq!(b.normalize(0.0), Some(0.5));
        assert_eq!(b.normalize(4.0), Some(1.0));
        assert_eq!(b.normalize(f64::NAN), None);
        let flat = ColorBounds { min: 2.0, max: 2.0 };
        assert_eq!(flat.normalize(2.0), Some(0.5));
    }

    #[test]
    fn palette_wraps_and_rejects_empty() {
        let p = Palette::new(vec![Rgb(1, 1, 1), Rgb(2, 2, 2)]).unwrap();
        assert_eq!(p.get(3), Rgb(2, 2, 2));
        assert!(Palette::new(Vec::new()).is_err());
        assert_eq!("set22".parse::<Palette>().unwrap().get(0), SET22[0]);
        assert_eq!("#000000 #ffffff".parse::<Palette>().unwrap().len(), 2);
    }
}
