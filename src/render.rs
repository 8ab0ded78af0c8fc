use crate::types::{Placement, Size};

const MAX_COLS: f64 = 80.0;
const MAX_ROWS: f64 = 40.0;

/// Box-drawing preview of one page's printable area.
pub fn render_page(page: Size, placements: &[Placement]) -> String {
    // Terminal cells are roughly twice as tall as wide.
    let scale = f64::min(MAX_COLS / page.w, MAX_ROWS * 2.0 / page.h);
    let cols = (page.w * scale).round() as usize;
    let rows = (page.h * scale / 2.0).round() as usize;

    if cols == 0 || rows == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; cols + 1]; rows + 1];
    draw_box(&mut grid, 0, 0, cols, rows);

    for p in placements {
        let bx = (p.x * scale).round() as usize;
        let by = (p.y * scale / 2.0).round() as usize;
        let bw = (p.size.w * scale).round() as usize;
        let bh = (p.size.h * scale / 2.0).round() as usize;
        if bw == 0 || bh == 0 {
            continue;
        }
        draw_box(&mut grid, bx, by, bw, bh);

        let label = if p.rotated {
            format!("{} (R)", p.source)
        } else {
            p.source.clone()
        };
        write_label(&mut grid, &label, bx, by, bw, bh);
    }

    let mut out = String::new();
    for row in &grid {
        let line: String = row.iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Centres `label` inside the box, clipped to its interior.
fn write_label(grid: &mut [Vec<char>], label: &str, x: usize, y: usize, w: usize, h: usize) {
    if w < 3 || h < 2 {
        return;
    }
    let inner = w - 1;
    let chars: Vec<char> = label.chars().take(inner).collect();
    let cy = y + h / 2;
    let start = x + 1 + (inner - chars.len()) / 2;
    let Some(row) = grid.get_mut(cy) else {
        return;
    };
    for (i, ch) in chars.into_iter().enumerate() {
        if let Some(cell) = row.get_mut(start + i) {
            *cell = ch;
        }
    }
}

fn mark(grid: &mut [Vec<char>], x: usize, y: usize, edge: char) {
    let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x)) else {
        return;
    };
    *cell = match (*cell, edge) {
        ('+', _) => '+',
        ('-', '|') | ('|', '-') => '+',
        (_, e) => e,
    };
}

fn draw_box(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    for i in x..=x + w {
        mark(grid, i, y, '-');
        mark(grid, i, y + h, '-');
    }
    for j in y..=y + h {
        mark(grid, x, j, '|');
        mark(grid, x + w, j, '|');
    }
    for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
        mark(grid, cx, cy, '+');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(source: &str, x: f64, y: f64, w: f64, h: f64, rotated: bool) -> Placement {
        Placement {
            item_id: 0,
            source: source.to_string(),
            required: true,
            x,
            y,
            size: Size::new(w, h),
            rotated,
        }
    }

    #[test]
    fn test_render_single_item() {
        let page = Size::new(200.0, 100.0);
        let output = render_page(page, &[placement("logo", 0.0, 0.0, 100.0, 50.0, false)]);
        assert!(output.contains('+'));
        assert!(output.contains('|'));
        assert!(output.contains("logo"));
    }

    #[test]
    fn test_render_rotated_label() {
        let page = Size::new(200.0, 200.0);
        let output = render_page(
            page,
            &[
                placement("a", 0.0, 0.0, 100.0, 100.0, false),
                placement("b", 100.0, 0.0, 100.0, 100.0, true),
            ],
        );
        assert!(output.contains("b (R)"));
        assert!(output.contains('a'));
    }

    #[test]
    fn test_render_empty_page() {
        let output = render_page(Size::new(100.0, 100.0), &[]);
        assert!(output.starts_with('+'));
        assert_eq!(output.lines().count(), 41);
    }

    #[test]
    fn test_degenerate_page() {
        assert!(render_page(Size::new(0.0, 100.0), &[]).is_empty());
    }
}
