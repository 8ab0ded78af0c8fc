use std::cmp::Ordering;

use crate::types::{EPSILON, Size};

/// A horizontal run of the skyline: everything in `[x, x + width)` is free from `y` down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl Segment {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// A feasible position for an item, before it is committed to the skyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub x: f64,
    pub y: f64,
    /// Item footprint in the chosen orientation.
    pub size: Size,
    /// Footprint plus the trailing margin belt, clipped to the page edge.
    pub reserved: Size,
    pub rotated: bool,
}

impl Candidate {
    fn reserved_bottom(&self) -> f64 {
        self.y + self.reserved.h
    }

    /// Lowest y, then leftmost x, then unrotated, then lowest reserved bottom.
    fn rank_cmp(&self, other: &Candidate) -> Ordering {
        cmp_eps(self.y, other.y)
            .then_with(|| cmp_eps(self.x, other.x))
            .then_with(|| self.rotated.cmp(&other.rotated))
            .then_with(|| cmp_eps(self.reserved_bottom(), other.reserved_bottom()))
    }
}

fn cmp_eps(a: f64, b: f64) -> Ordering {
    if (a - b).abs() <= EPSILON {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Extent to reserve along one axis for an item starting at `start`.
///
/// The trailing margin is clipped at the page edge, so an item that only fits
/// without its belt still consumes the sliver behind it.
fn reserve(start: f64, extent: f64, margin: f64, limit: f64) -> Option<f64> {
    if start + extent + margin <= limit + EPSILON {
        Some(extent + margin)
    } else if start + extent <= limit + EPSILON {
        Some(limit - start)
    } else {
        None
    }
}

/// Free-space profile of a single page.
#[derive(Debug, Clone)]
pub struct Skyline {
    page: Size,
    margin: f64,
    segments: Vec<Segment>,
}

impl Skyline {
    pub fn new(page: Size, margin: f64) -> Self {
        Self {
            page,
            margin,
            segments: vec![Segment {
                x: 0.0,
                y: 0.0,
                width: page.w,
            }],
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Best position over every allowed orientation, or `None` if the item does not fit.
    pub fn find_best_position(&self, item: Size, allow_rotation: bool) -> Option<Candidate> {
        let upright = self.best_in_orientation(item, false);
        if !allow_rotation {
            return upright;
        }
        let rotated = self.best_in_orientation(item, true);
        match (upright, rotated) {
            (Some(a), Some(b)) => {
                if b.rank_cmp(&a) == Ordering::Less {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (a, b) => a.or(b),
        }
    }

    /// Best position with the orientation fixed. `item` is the unrotated size.
    pub fn best_in_orientation(&self, item: Size, rotated: bool) -> Option<Candidate> {
        let size = if rotated { item.rotated() } else { item };
        let mut best: Option<Candidate> = None;

        for (i, seg) in self.segments.iter().enumerate() {
            let Some(reserved_w) = reserve(seg.x, size.w, self.margin, self.page.w) else {
                continue;
            };
            let Some(y) = self.fit_y(i, reserved_w) else {
                continue;
            };
            let Some(reserved_h) = reserve(y, size.h, self.margin, self.page.h) else {
                continue;
            };

            let candidate = Candidate {
                x: seg.x,
                y,
                size,
                reserved: Size::new(reserved_w, reserved_h),
                rotated,
            };
            if best.is_none_or(|b| candidate.rank_cmp(&b) == Ordering::Less) {
                best = Some(candidate);
            }
        }

        best
    }

    /// Lowest y at which `width` starting at segment `start` clears every segment under it.
    fn fit_y(&self, start: usize, width: f64) -> Option<f64> {
        let mut remaining = width;
        let mut top = 0.0_f64;
        for seg in &self.segments[start..] {
            top = top.max(seg.y);
            remaining -= seg.width;
            if remaining <= EPSILON {
                return Some(top);
            }
        }
        None
    }

    /// Commits a candidate, raising the skyline over its reserved footprint.
    pub fn place(&mut self, candidate: &Candidate) {
        self.add_level(
            candidate.x,
            candidate.y,
            candidate.reserved.w,
            candidate.reserved.h,
        );
    }

    /// Raises the skyline to `y + height` over `[x, x + width)`.
    pub fn add_level(&mut self, x: f64, y: f64, width: f64, height: f64) {
        let right = (x + width).min(self.page.w);
        let top = y + height;

        let mut idx = self
            .segments
            .iter()
            .position(|s| s.right() > x + EPSILON)
            .unwrap_or(self.segments.len());

        let mut left = x;
        if let Some(seg) = self.segments.get(idx).copied() {
            if (seg.x - x).abs() <= EPSILON {
                left = seg.x;
            } else if seg.x < x {
                // The new level starts inside this segment; keep its left part.
                self.segments[idx].width = x - seg.x;
                self.segments.insert(
                    idx + 1,
                    Segment {
                        x,
                        y: seg.y,
                        width: seg.right() - x,
                    },
                );
                idx += 1;
            }
        }

        self.segments.insert(
            idx,
            Segment {
                x: left,
                y: top,
                width: right - left,
            },
        );

        let next = idx + 1;
        while next < self.segments.len() {
            let seg = self.segments[next];
            if seg.x >= right - EPSILON {
                break;
            }
            if seg.right() <= right + EPSILON {
                self.segments.remove(next);
            } else {
                self.segments[next] = Segment {
                    x: right,
                    y: seg.y,
                    width: seg.right() - right,
                };
                break;
            }
        }

        self.merge_levels();
    }

    fn merge_levels(&mut self) {
        let mut i = 0;
        while i + 1 < self.segments.len() {
            let a = self.segments[i];
            let b = self.segments[i + 1];
            if (a.y - b.y).abs() <= EPSILON {
                self.segments[i] = Segment {
                    x: a.x,
                    y: a.y.max(b.y),
                    width: b.right() - a.x,
                };
                self.segments.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }

    /// Segments tile `[0, page width)` in x order with no gaps and non-negative heights.
    pub fn is_consistent(&self) -> bool {
        let mut cursor = 0.0;
        for seg in &self.segments {
            if (seg.x - cursor).abs() > EPSILON || seg.width <= 0.0 || seg.y < 0.0 {
                return false;
            }
            cursor = seg.right();
        }
        (cursor - self.page.w).abs() <= EPSILON
    }
}
