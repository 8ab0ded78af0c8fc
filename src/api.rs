use serde::{Deserialize, Serialize};

use crate::allocator::{Allocator, FillReport};
use crate::paper::{Orientation, Oversized, PaperSize, PaperSpec, oversized};
use crate::types::{
    Demand, PackConfig, Placement, Result, Size, deserialize_opt_u32_from_number,
    deserialize_u32_from_number,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LayoutRequest {
    /// Named preset; wins over `page` when both are given.
    #[serde(default)]
    pub paper: Option<PaperSize>,
    /// Sheet size in mm when no preset is named.
    #[serde(default)]
    pub page: Option<Size>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub outer_margin: f64,
    #[serde(default)]
    pub margin: f64,
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
    pub items: Vec<ItemRequest>,
    #[serde(default, deserialize_with = "deserialize_opt_u32_from_number")]
    pub fill_pages: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemRequest {
    pub name: String,
    pub width: f64,
    pub height: f64,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub copies: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutResponse {
    pub paper: PaperSpec,
    pub sheet: Size,
    pub printable: Size,
    /// Placements per page, in sheet coordinates.
    pub pages: Vec<Vec<Placement>>,
    pub page_count: usize,
    pub minimum_pages: usize,
    pub oversized: Vec<Oversized>,
    pub skipped_copies: usize,
    pub fill: Option<FillReport>,
    pub utilization_percent: f64,
    pub items_per_page: f64,
}

impl LayoutRequest {
    pub fn paper_spec(&self) -> PaperSpec {
        let size = match (self.paper, self.page) {
            (Some(paper), _) => paper,
            (None, Some(page)) => PaperSize::match_preset(page),
            (None, None) => PaperSize::A4,
        };
        PaperSpec::new(size, self.orientation, self.outer_margin)
    }

    pub fn demands(&self) -> Vec<Demand> {
        self.items
            .iter()
            .map(|i| Demand::new(i.name.clone(), Size::new(i.width, i.height), i.copies))
            .collect()
    }
}

pub fn build_layout(req: &LayoutRequest) -> Result<LayoutResponse> {
    let paper = req.paper_spec();
    let printable = paper.printable_area()?;
    let demands = req.demands();
    let config = PackConfig::new(printable, req.margin, req.allow_rotate);

    let allocator = Allocator::new(config, demands.clone())?;
    let too_large = oversized(&demands, printable, req.allow_rotate);
    let solution = allocator.solve(req.fill_pages.map(|n| n as usize));

    let pages = solution
        .layout
        .pages
        .iter()
        .map(|page| {
            page.placements
                .iter()
                .map(|p| p.on_paper(paper.outer_margin))
                .collect()
        })
        .collect();

    Ok(LayoutResponse {
        paper,
        sheet: paper.sheet(),
        printable,
        pages,
        page_count: solution.layout.page_count(),
        minimum_pages: solution.minimum_pages,
        oversized: too_large,
        skipped_copies: solution.skipped.len(),
        fill: solution.fill,
        utilization_percent: solution.layout.utilization_percent(),
        items_per_page: solution.layout.items_per_page(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackError;

    fn request(json: &str) -> LayoutRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = request(r#"{"items":[{"name":"a","width":50,"height":50,"copies":1}]}"#);
        assert!(req.allow_rotate);
        assert_eq!(req.fill_pages, None);
        assert_eq!(req.paper_spec().size, PaperSize::A4);
    }

    #[test]
    fn test_custom_page_matches_preset() {
        let req = request(r#"{"page":{"w":216,"h":279},"items":[]}"#);
        assert_eq!(req.paper_spec().size, PaperSize::Letter);
    }

    #[test]
    fn test_coordinates_offset_by_outer_margin() {
        let req = request(
            r#"{"paper":"a4","outer_margin":10,"margin":2,
                "items":[{"name":"card","width":85,"height":55,"copies":2.0}]}"#,
        );
        let resp = build_layout(&req).unwrap();
        assert_eq!(resp.printable, Size::new(190.0, 277.0));
        assert_eq!(resp.page_count, 1);
        assert_eq!(resp.pages[0][0].x, 10.0);
        assert_eq!(resp.pages[0][0].y, 10.0);
        assert_eq!(resp.pages[0][1].x, 10.0 + 85.0 + 2.0);
    }

    #[test]
    fn test_oversized_reported() {
        let req = request(
            r#"{"paper":"photo4x6","allow_rotate":false,
                "items":[{"name":"big","width":150,"height":100,"copies":3},
                         {"name":"ok","width":50,"height":50,"copies":1}]}"#,
        );
        let resp = build_layout(&req).unwrap();
        assert_eq!(resp.oversized.len(), 1);
        assert_eq!(resp.oversized[0].name, "big");
        assert_eq!(resp.skipped_copies, 3);
        assert_eq!(resp.page_count, 1);
    }

    #[test]
    fn test_fill_pages() {
        let req = request(
            r#"{"page":{"w":100,"h":100},"items":[{"name":"t","width":40,"height":40,"copies":5}],
                "fill_pages":3}"#,
        );
        let resp = build_layout(&req).unwrap();
        assert_eq!(resp.minimum_pages, 2);
        assert_eq!(resp.page_count, 3);
        assert!(resp.fill.unwrap().reached());
    }

    #[test]
    fn test_errors() {
        let req = request(r#"{"paper":"a5","outer_margin":80,"items":[]}"#);
        assert!(matches!(
            build_layout(&req),
            Err(PackError::NoPrintableArea { .. })
        ));

        let req = request(r#"{"items":[{"name":"z","width":0,"height":10,"copies":1}]}"#);
        assert!(matches!(build_layout(&req), Err(PackError::InvalidItem { .. })));

        let req = request(r#"{"margin":-3,"items":[]}"#);
        assert!(matches!(build_layout(&req), Err(PackError::InvalidGeometry(_))));
    }
}
