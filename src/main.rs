use clap::Parser;
use fitprint::allocator::Allocator;
use fitprint::paper::{Orientation, PaperSize, PaperSpec, oversized};
use fitprint::render;
use fitprint::types::{Demand, PackConfig, Size};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "fitprint",
    about = "Pack print-ready artwork onto as few pages as possible"
)]
struct Cli {
    /// Paper preset: a3, a4, a5, letter, legal, tabloid, photo4x6, photo5x7, photo8x10
    #[arg(long, default_value = "a4", conflicts_with = "page")]
    paper: String,

    /// Custom paper size in mm (WxH, e.g. 210x297)
    #[arg(long)]
    page: Option<String>,

    /// Turn the paper sideways
    #[arg(long)]
    landscape: bool,

    /// Blank border around the sheet edge in mm
    #[arg(long, default_value_t = 5.0)]
    outer_margin: f64,

    /// Spacing between items in mm
    #[arg(long, default_value_t = 2.0)]
    margin: f64,

    /// Items as [NAME=]WxH[:COPIES] (e.g. logo=50x70:4 85x55)
    #[arg(long = "items", num_args = 1.., required = true)]
    items: Vec<String>,

    /// Disable 90 degree rotation
    #[arg(long)]
    no_rotate: bool,

    /// Pad the layout with extra copies until this many pages are filled
    #[arg(long)]
    fill_pages: Option<usize>,

    /// Show an ASCII preview of each page
    #[arg(long)]
    layout: bool,

    /// Print the full solution as JSON
    #[arg(long)]
    json: bool,

    /// Log every placement decision to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid size '{}', expected WxH", s))?;
    let w = w
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid width in '{}'", s))?;
    let h = h
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid height in '{}'", s))?;
    let size = Size::new(w, h);
    if !size.is_positive() {
        return Err(format!("dimensions must be positive in '{}'", s));
    }
    Ok(size)
}

fn parse_item(s: &str, index: usize) -> Result<Demand, String> {
    let (name, rest) = match s.split_once('=') {
        Some((name, rest)) => (name.to_string(), rest),
        None => (format!("item{}", index + 1), s),
    };
    let (dims, copies) = match rest.split_once(':') {
        Some((dims, copies)) => {
            let copies = copies
                .parse::<u32>()
                .map_err(|_| format!("invalid copies in '{}'", s))?;
            (dims, copies)
        }
        None => (rest, 1),
    };
    if copies == 0 {
        return Err(format!("copies must be non-zero in '{}'", s));
    }
    Ok(Demand::new(name, parse_size(dims)?, copies))
}

fn paper_spec(cli: &Cli) -> Result<PaperSpec, String> {
    let size = match &cli.page {
        Some(page) => PaperSize::match_preset(parse_size(page)?),
        None => cli.paper.parse::<PaperSize>().map_err(|e| e.to_string())?,
    };
    let orientation = if cli.landscape {
        Orientation::Landscape
    } else {
        Orientation::Portrait
    };
    Ok(PaperSpec::new(size, orientation, cli.outer_margin))
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let paper = paper_spec(&cli).unwrap_or_else(|e| fail(e));
    let printable = paper.printable_area().unwrap_or_else(|e| fail(e));

    let demands: Vec<Demand> = cli
        .items
        .iter()
        .enumerate()
        .map(|(i, s)| parse_item(s, i))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));

    let allow_rotation = !cli.no_rotate;
    for o in oversized(&demands, printable, allow_rotation) {
        eprintln!(
            "Warning: {} ({}) does not fit the printable area {} (max {})",
            o.name, o.size, printable, o.max
        );
    }

    let config = PackConfig::new(printable, cli.margin, allow_rotation);
    let allocator = Allocator::new(config, demands).unwrap_or_else(|e| fail(e));
    let solution = allocator.solve(cli.fill_pages);

    if cli.json {
        match serde_json::to_string_pretty(&solution) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
        return;
    }

    let layout = &solution.layout;
    for (i, page) in layout.pages.iter().enumerate() {
        println!("Page {}:", i + 1);
        for p in &page.placements {
            let at = p.on_paper(paper.outer_margin);
            let rot = if p.rotated { " [rotated]" } else { "" };
            let extra = if p.required { "" } else { " [fill]" };
            println!("  {} {} @ ({:.1}, {:.1}){}{}", p.source, p.size, at.x, at.y, rot, extra);
        }
        if cli.layout {
            print!("{}", render::render_page(layout.page, &page.placements));
        }
        println!();
    }

    println!(
        "Summary: {} page{} (minimum {}), {} item{}, {:.1}% used",
        layout.page_count(),
        if layout.page_count() == 1 { "" } else { "s" },
        solution.minimum_pages,
        layout.placement_count(),
        if layout.placement_count() == 1 { "" } else { "s" },
        layout.utilization_percent(),
    );
    if !solution.skipped.is_empty() {
        println!("Skipped {} copies that do not fit on a page", solution.skipped.len());
    }
    if let Some(fill) = solution.fill
        && !fill.reached()
    {
        println!(
            "Fill target of {} pages not reached after {} attempts ({} short)",
            fill.target,
            fill.attempts,
            fill.shortfall()
        );
    }
}
