//! Packs rectangular print items onto as few fixed-size pages as a skyline
//! heuristic manages, with optional padding up to a target page count.

pub mod allocator;
pub mod api;
pub mod paper;
pub mod render;
pub mod skyline;
pub mod types;

pub use allocator::{Allocator, FillReport, Layout, Packing, Page, Solution, pack_items};
pub use types::{Demand, Item, PackConfig, PackError, Placement, Size};
