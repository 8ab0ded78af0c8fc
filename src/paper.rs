use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Demand, PackError, Result, Size};

/// Tolerance when matching a custom size against the presets, in mm.
const PRESET_TOLERANCE: f64 = 0.1;

/// Standard paper sizes, portrait dimensions in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
    #[serde(rename = "photo4x6")]
    Photo4x6,
    #[serde(rename = "photo5x7")]
    Photo5x7,
    #[serde(rename = "photo8x10")]
    Photo8x10,
    Custom { width: f64, height: f64 },
}

impl PaperSize {
    pub const PRESETS: [PaperSize; 9] = [
        PaperSize::A4,
        PaperSize::A3,
        PaperSize::A5,
        PaperSize::Letter,
        PaperSize::Legal,
        PaperSize::Tabloid,
        PaperSize::Photo4x6,
        PaperSize::Photo5x7,
        PaperSize::Photo8x10,
    ];

    pub fn dimensions_mm(self) -> Size {
        match self {
            PaperSize::A3 => Size::new(297.0, 420.0),
            PaperSize::A4 => Size::new(210.0, 297.0),
            PaperSize::A5 => Size::new(148.0, 210.0),
            PaperSize::Letter => Size::new(216.0, 279.0),
            PaperSize::Legal => Size::new(216.0, 356.0),
            PaperSize::Tabloid => Size::new(279.0, 432.0),
            PaperSize::Photo4x6 => Size::new(102.0, 152.0),
            PaperSize::Photo5x7 => Size::new(127.0, 178.0),
            PaperSize::Photo8x10 => Size::new(203.0, 254.0),
            PaperSize::Custom { width, height } => Size::new(width, height),
        }
    }

    /// The preset matching `size` within a tenth of a millimetre, else `Custom`.
    pub fn match_preset(size: Size) -> PaperSize {
        Self::PRESETS
            .into_iter()
            .find(|p| {
                let d = p.dimensions_mm();
                (d.w - size.w).abs() < PRESET_TOLERANCE && (d.h - size.h).abs() < PRESET_TOLERANCE
            })
            .unwrap_or(PaperSize::Custom {
                width: size.w,
                height: size.h,
            })
    }

    pub fn name(self) -> &'static str {
        match self {
            PaperSize::A3 => "a3",
            PaperSize::A4 => "a4",
            PaperSize::A5 => "a5",
            PaperSize::Letter => "letter",
            PaperSize::Legal => "legal",
            PaperSize::Tabloid => "tabloid",
            PaperSize::Photo4x6 => "photo4x6",
            PaperSize::Photo5x7 => "photo5x7",
            PaperSize::Photo8x10 => "photo8x10",
            PaperSize::Custom { .. } => "custom",
        }
    }
}

impl FromStr for PaperSize {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::PRESETS
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| PackError::UnknownPaper(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// A physical sheet and the blank border kept around its edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSpec {
    pub size: PaperSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub outer_margin: f64,
}

impl PaperSpec {
    pub fn new(size: PaperSize, orientation: Orientation, outer_margin: f64) -> Self {
        Self {
            size,
            orientation,
            outer_margin,
        }
    }

    pub fn sheet(&self) -> Size {
        let base = self.size.dimensions_mm();
        match self.orientation {
            Orientation::Portrait => base,
            Orientation::Landscape => base.rotated(),
        }
    }

    /// Area inside the outer margin that the packer may use.
    pub fn printable_area(&self) -> Result<Size> {
        let sheet = self.sheet();
        let no_area = || PackError::NoPrintableArea {
            width: sheet.w,
            height: sheet.h,
            outer_margin: self.outer_margin,
        };
        if !sheet.is_positive() || !self.outer_margin.is_finite() || self.outer_margin < 0.0 {
            return Err(no_area());
        }
        let printable = Size::new(
            sheet.w - 2.0 * self.outer_margin,
            sheet.h - 2.0 * self.outer_margin,
        );
        if !printable.is_positive() {
            return Err(no_area());
        }
        Ok(printable)
    }
}

/// A demand that cannot be placed on the printable area in any allowed orientation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Oversized {
    pub name: String,
    pub size: Size,
    /// Largest size that would fit, longer side first when rotation is allowed.
    pub max: Size,
}

pub fn oversized(demands: &[Demand], printable: Size, allow_rotation: bool) -> Vec<Oversized> {
    let max = if allow_rotation {
        Size::new(
            printable.w.max(printable.h),
            printable.w.min(printable.h),
        )
    } else {
        printable
    };
    demands
        .iter()
        .filter(|d| {
            let upright = d.size.fits_in(&printable);
            let rotated = allow_rotation && d.size.rotated().fits_in(&printable);
            !upright && !rotated
        })
        .map(|d| Oversized {
            name: d.name.clone(),
            size: d.size,
            max,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_presets() {
        assert_eq!("A4".parse::<PaperSize>().unwrap(), PaperSize::A4);
        assert_eq!(" photo5x7 ".parse::<PaperSize>().unwrap(), PaperSize::Photo5x7);
        assert!(matches!(
            "b5".parse::<PaperSize>(),
            Err(PackError::UnknownPaper(_))
        ));
    }

    #[test]
    fn test_landscape_swaps() {
        let spec = PaperSpec::new(PaperSize::A4, Orientation::Landscape, 0.0);
        assert_eq!(spec.sheet(), Size::new(297.0, 210.0));
    }

    #[test]
    fn test_printable_area() {
        let spec = PaperSpec::new(PaperSize::A4, Orientation::Portrait, 10.0);
        assert_eq!(spec.printable_area().unwrap(), Size::new(190.0, 277.0));

        let spec = PaperSpec::new(PaperSize::Photo4x6, Orientation::Portrait, 51.0);
        assert!(matches!(
            spec.printable_area(),
            Err(PackError::NoPrintableArea { .. })
        ));
        let spec = PaperSpec::new(PaperSize::A4, Orientation::Portrait, -1.0);
        assert!(spec.printable_area().is_err());
    }

    #[test]
    fn test_match_preset() {
        assert_eq!(PaperSize::match_preset(Size::new(210.05, 297.0)), PaperSize::A4);
        assert_eq!(
            PaperSize::match_preset(Size::new(200.0, 300.0)),
            PaperSize::Custom {
                width: 200.0,
                height: 300.0
            }
        );
    }

    #[test]
    fn test_oversized() {
        let printable = Size::new(190.0, 277.0);
        let demands = [
            Demand::new("fits", Size::new(100.0, 100.0), 1),
            Demand::new("sideways", Size::new(250.0, 150.0), 1),
            Demand::new("huge", Size::new(300.0, 300.0), 1),
        ];
        let names = |v: Vec<Oversized>| v.into_iter().map(|o| o.name).collect::<Vec<_>>();
        assert_eq!(names(oversized(&demands, printable, true)), vec!["huge"]);
        assert_eq!(
            names(oversized(&demands, printable, false)),
            vec!["sideways", "huge"]
        );
        assert_eq!(oversized(&demands, printable, true)[0].max, Size::new(277.0, 190.0));
    }

    #[test]
    fn test_paper_spec_from_json() {
        let spec: PaperSpec = serde_json::from_str(r#"{"size":"letter"}"#).unwrap();
        assert_eq!(spec.size, PaperSize::Letter);
        assert_eq!(spec.orientation, Orientation::Portrait);
        let spec: PaperSpec =
            serde_json::from_str(r#"{"size":{"custom":{"width":100,"height":150}},"orientation":"landscape","outer_margin":5}"#)
                .unwrap();
        assert_eq!(spec.sheet(), Size::new(150.0, 100.0));
    }
}
