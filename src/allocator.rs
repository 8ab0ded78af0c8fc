use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::skyline::Skyline;
use crate::types::{Demand, Item, PackConfig, Placement, Result, Size};

/// Upper bound on duplicate sets tried while filling to a target page count.
pub const MAX_FILL_ATTEMPTS: usize = 30;

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub placements: Vec<Placement>,
    #[serde(skip)]
    skyline: Skyline,
}

impl Page {
    pub fn new(config: &PackConfig) -> Self {
        Self {
            placements: Vec::new(),
            skyline: Skyline::new(config.page, config.margin),
        }
    }

    /// Places `item` in the given orientation at its best position, if it fits.
    pub fn try_place(&mut self, item: &Item, rotated: bool) -> bool {
        let Some(candidate) = self.skyline.best_in_orientation(item.size, rotated) else {
            return false;
        };
        self.skyline.place(&candidate);
        self.placements.push(Placement {
            item_id: item.id,
            source: item.source.clone(),
            required: item.required,
            x: candidate.x,
            y: candidate.y,
            size: candidate.size,
            rotated: candidate.rotated,
        });
        true
    }

    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }

    pub fn used_area(&self) -> f64 {
        self.placements.iter().map(|p| p.size.area()).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    pub page: Size,
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn placement_count(&self) -> usize {
        self.pages.iter().map(|p| p.placements.len()).sum()
    }

    pub fn required_count(&self) -> usize {
        self.placements().filter(|p| p.required).count()
    }

    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.pages.iter().flat_map(|p| &p.placements)
    }

    pub fn utilization_percent(&self) -> f64 {
        let total = self.page.area() * self.pages.len() as f64;
        if total <= 0.0 {
            return 0.0;
        }
        let used: f64 = self.pages.iter().map(Page::used_area).sum();
        used / total * 100.0
    }

    pub fn items_per_page(&self) -> f64 {
        if self.pages.is_empty() {
            return 0.0;
        }
        self.placement_count() as f64 / self.pages.len() as f64
    }
}

/// Result of one packing run.
#[derive(Debug, Clone)]
pub struct Packing {
    pub layout: Layout,
    /// Items that fit on an empty page in no allowed orientation.
    pub skipped: Vec<Item>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub requested: usize,
    pub target: usize,
    pub achieved: usize,
    pub attempts: usize,
}

impl FillReport {
    pub fn reached(&self) -> bool {
        self.achieved >= self.target
    }

    pub fn shortfall(&self) -> usize {
        self.target.saturating_sub(self.achieved)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Solution {
    pub layout: Layout,
    pub minimum_pages: usize,
    pub skipped: Vec<Item>,
    pub fill: Option<FillReport>,
}

/// Required first, then larger area, then longer side, then name and id.
fn pack_order(a: &Item, b: &Item) -> Ordering {
    b.required
        .cmp(&a.required)
        .then_with(|| b.size.area().total_cmp(&a.size.area()))
        .then_with(|| b.size.longer_side().total_cmp(&a.size.longer_side()))
        .then_with(|| a.source.cmp(&b.source))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_items(items: &mut [Item]) {
    items.sort_by(pack_order);
}

fn place_on_existing(pages: &mut [Page], item: &Item, rotated: bool) -> bool {
    for (idx, page) in pages.iter_mut().enumerate() {
        if page.try_place(item, rotated) {
            debug!(item = %item.source, page = idx + 1, rotated, "placed");
            return true;
        }
    }
    false
}

/// Packs `items` onto as few pages as the greedy skyline heuristic manages.
///
/// Rotation is only tried after every existing page refused the upright
/// orientation, and a new page is only opened after both failed.
pub fn pack_items(mut items: Vec<Item>, config: &PackConfig) -> Packing {
    sort_items(&mut items);

    let mut pages: Vec<Page> = Vec::new();
    let mut skipped = Vec::new();

    for item in items {
        if place_on_existing(&mut pages, &item, false) {
            continue;
        }
        if config.allow_rotation && place_on_existing(&mut pages, &item, true) {
            continue;
        }

        let mut page = Page::new(config);
        if page.try_place(&item, false) || (config.allow_rotation && page.try_place(&item, true)) {
            debug!(item = %item.source, page = pages.len() + 1, "opened page");
            pages.push(page);
            continue;
        }

        warn!(
            item = %item.source,
            size = %item.size,
            page = %config.page,
            "item does not fit on an empty page, skipping"
        );
        skipped.push(item);
    }

    Packing {
        layout: Layout {
            page: config.page,
            pages,
        },
        skipped,
    }
}

/// Multi-page allocation over a fixed set of demands.
pub struct Allocator {
    config: PackConfig,
    demands: Vec<Demand>,
}

impl Allocator {
    pub fn new(config: PackConfig, demands: Vec<Demand>) -> Result<Self> {
        config.validate()?;
        for d in &demands {
            d.validate()?;
        }
        Ok(Self { config, demands })
    }

    /// One required item per requested copy.
    pub fn required_items(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for d in &self.demands {
            for _ in 0..d.copies {
                items.push(Item {
                    id: items.len(),
                    source: d.name.clone(),
                    size: d.size,
                    required: true,
                });
            }
        }
        items
    }

    pub fn pack_required(&self) -> Packing {
        pack_items(self.required_items(), &self.config)
    }

    /// Pages needed for the required copies alone.
    pub fn minimum_pages(&self) -> usize {
        self.pack_required().layout.page_count()
    }

    /// Packs every required copy and, with `fill_to`, pads the layout with
    /// optional duplicates up to `max(minimum, fill_to)` pages.
    pub fn solve(&self, fill_to: Option<usize>) -> Solution {
        let required = self.pack_required();
        let minimum_pages = required.layout.page_count();

        let Some(requested) = fill_to else {
            info!(
                pages = minimum_pages,
                skipped = required.skipped.len(),
                "packed required items"
            );
            return Solution {
                layout: required.layout,
                minimum_pages,
                skipped: required.skipped,
                fill: None,
            };
        };

        let packable: Vec<Item> = required
            .layout
            .placements()
            .map(|p| Item {
                id: p.item_id,
                source: p.source.clone(),
                size: if p.rotated { p.size.rotated() } else { p.size },
                required: true,
            })
            .collect();
        let (layout, report) = self.fill(required.layout, packable, requested);

        info!(
            pages = layout.page_count(),
            minimum = minimum_pages,
            target = report.target,
            attempts = report.attempts,
            "filled layout"
        );
        Solution {
            layout,
            minimum_pages,
            skipped: required.skipped,
            fill: Some(report),
        }
    }

    fn fill(&self, required: Layout, packable: Vec<Item>, requested: usize) -> (Layout, FillReport) {
        let target = required.page_count().max(requested);
        let mut report = FillReport {
            requested,
            target,
            achieved: required.page_count(),
            attempts: 0,
        };
        if packable.is_empty() {
            warn!(target, "nothing packable to fill pages with");
            return (required, report);
        }

        let mut base = packable;
        base.sort_by_key(|item| item.id);
        let next_id = self.required_items().len();

        let mut best = required;
        for duplicates in 1..=MAX_FILL_ATTEMPTS {
            report.attempts = duplicates;
            let items = with_duplicates(&base, duplicates, next_id);
            let mut layout = pack_items(items, &self.config).layout;

            if layout.page_count() >= target {
                layout.pages.truncate(target);
                report.achieved = target;
                return (layout, report);
            }
            if layout.page_count() >= best.page_count() {
                best = layout;
            }
        }

        report.achieved = best.page_count();
        warn!(
            target,
            achieved = report.achieved,
            attempts = report.attempts,
            "fill target not reached"
        );
        (best, report)
    }
}

/// The required set followed by `duplicates` optional copies of it.
fn with_duplicates(required: &[Item], duplicates: usize, first_id: usize) -> Vec<Item> {
    let mut items = required.to_vec();
    let mut id = first_id;
    for _ in 0..duplicates {
        for item in required {
            items.push(Item {
                id,
                source: item.source.clone(),
                size: item.size,
                required: false,
            });
            id += 1;
        }
    }
    items
}
