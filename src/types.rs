use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Absolute tolerance for comparing coordinates that went through float arithmetic.
pub const EPSILON: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PackError {
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("invalid item '{name}': {reason}")]
    InvalidItem { name: String, reason: String },
    #[error("no printable area: paper {width}x{height} with outer margin {outer_margin}")]
    NoPrintableArea {
        width: f64,
        height: f64,
        outer_margin: f64,
    },
    #[error("unknown paper size '{0}'")]
    UnknownPaper(String),
}

pub type Result<T> = std::result::Result<T, PackError>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub w: f64,
    pub h: f64,
}

impl Size {
    pub fn new(w: f64, h: f64) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    pub fn longer_side(&self) -> f64 {
        self.w.max(self.h)
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Size) -> bool {
        self.w <= other.w + EPSILON && self.h <= other.h + EPSILON
    }

    pub fn is_positive(&self) -> bool {
        self.w.is_finite() && self.h.is_finite() && self.w > 0.0 && self.h > 0.0
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// A user-supplied artwork piece and how many copies of it must be printed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub name: String,
    pub size: Size,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub copies: u32,
}

impl Demand {
    pub fn new(name: impl Into<String>, size: Size, copies: u32) -> Self {
        Self {
            name: name.into(),
            size,
            copies,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.size.is_positive() {
            return Err(PackError::InvalidItem {
                name: self.name.clone(),
                reason: format!("dimensions must be positive and finite, got {}", self.size),
            });
        }
        if self.copies == 0 {
            return Err(PackError::InvalidItem {
                name: self.name.clone(),
                reason: "copies must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// One copy of a demand, as handed to the packer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: usize,
    pub source: String,
    pub size: Size,
    pub required: bool,
}

impl Item {
    pub fn new(id: usize, source: impl Into<String>, size: Size, required: bool) -> Result<Self> {
        let source = source.into();
        if !size.is_positive() {
            return Err(PackError::InvalidItem {
                name: source,
                reason: format!("dimensions must be positive and finite, got {size}"),
            });
        }
        Ok(Self {
            id,
            source,
            size,
            required,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub item_id: usize,
    pub source: String,
    pub required: bool,
    pub x: f64,
    pub y: f64,
    /// Footprint after orientation is applied.
    pub size: Size,
    pub rotated: bool,
}

impl Placement {
    pub fn right(&self) -> f64 {
        self.x + self.size.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.size.h
    }

    /// Moves the placement from printable-area coordinates onto the physical sheet.
    pub fn on_paper(&self, outer_margin: f64) -> Placement {
        Placement {
            x: self.x + outer_margin,
            y: self.y + outer_margin,
            ..self.clone()
        }
    }
}

/// Geometry shared by every page of one packing run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackConfig {
    /// Printable area of a page.
    pub page: Size,
    /// Spacing reserved on the trailing (right and bottom) edge of each item.
    pub margin: f64,
    pub allow_rotation: bool,
}

impl PackConfig {
    pub fn new(page: Size, margin: f64, allow_rotation: bool) -> Self {
        Self {
            page,
            margin,
            allow_rotation,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.page.is_positive() {
            return Err(PackError::InvalidGeometry(format!(
                "page must be positive and finite, got {}",
                self.page
            )));
        }
        if !self.margin.is_finite() || self.margin < 0.0 {
            return Err(PackError::InvalidGeometry(format!(
                "margin must be finite and non-negative, got {}",
                self.margin
            )));
        }
        Ok(())
    }
}

/// Accepts integer fields sent as JSON floats (`3.0`), which browser clients do.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() != 0.0 || value < 0.0 || value > u32::MAX as f64 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {value}"
        )));
    }
    Ok(value as u32)
}

pub fn deserialize_opt_u32_from_number<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_u32_from_number")] u32);

    Ok(Option::<Wrapper>::deserialize(deserializer)?.map(|Wrapper(v)| v))
}
