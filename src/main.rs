use clap::Parser;
use path2tri::render::{self, RenderOptions};
use path2tri::{DrawingStyle, TessConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "path2tri", about = "SVG path data to GPU-ready triangles")]
struct Cli {
    /// SVG path data, e.g. "M0 0 L100 0 Q150 50 100 100 Z"
    #[arg(required_unless_present = "input", conflicts_with = "input")]
    data: Option<String>,

    /// Read the path data from a file instead
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Fill the path (default when neither --fill nor --stroke is given)
    #[arg(long)]
    fill: bool,

    /// Stroke the path
    #[arg(long)]
    stroke: bool,

    /// Stroke width in path units
    #[arg(long, default_value = "1.0")]
    line_width: f64,

    /// Miter length limit as a multiple of half the line width (0 = unbounded)
    #[arg(long, default_value = "10.0")]
    miter_limit: f64,

    /// Fill color (#rgb, #rrggbb, rgb(), rgba() or a name)
    #[arg(long, default_value = "black")]
    fill_color: String,

    /// Stroke color
    #[arg(long, default_value = "black")]
    stroke_color: String,

    /// Write a rasterized preview PNG
    #[arg(short, long)]
    png: Option<PathBuf>,

    /// Preview width in pixels
    #[arg(long, default_value = "512")]
    width: u32,

    /// Preview height in pixels
    #[arg(long, default_value = "512")]
    height: u32,

    /// Log pipeline details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    path2tri::logging::init_logger(if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    });

    let (data, source) = match (&cli.data, &cli.input) {
        (_, Some(file)) => (std::fs::read_to_string(file)?, file.display().to_string()),
        (Some(d), None) => (d.clone(), "argument".to_string()),
        (None, None) => return Err("no path data given".into()),
    };
    let fill = cli.fill || !cli.stroke;

    let config = TessConfig {
        miter_limit: (cli.miter_limit > 0.0).then_some(cli.miter_limit),
        ..TessConfig::default()
    };
    let mut style = DrawingStyle {
        line_width: cli.line_width,
        ..DrawingStyle::default()
    };
    style.set_fill_style(&cli.fill_color);
    style.set_stroke_style(&cli.stroke_color);

    // Header
    let mut modes: Vec<&str> = Vec::new();
    if fill { modes.push("fill"); }
    if cli.stroke { modes.push("stroke"); }
    eprintln!();
    eprintln!("  path2tri \u{00b7} {} \u{00b7} {}", source, modes.join(" + "));
    eprintln!();

    let path = path2tri::tessellate(data.trim(), &config, &style, fill, cli.stroke)?;

    let curves: usize = path.subpaths().iter().map(|s| s.curves().len()).sum();
    let interior: usize = path
        .subpaths()
        .iter()
        .map(|s| s.interior_polygon().triangles().len() / 3)
        .sum();
    eprintln!("  Subpaths    {} ({} curve leaves)", path.subpaths().len(), curves);
    if let Some(f) = path.fill_vertices() {
        eprintln!(
            "  Fill        {} triangles ({} interior \u{00b7} {} curve)",
            f.vertex_count() / 3,
            interior,
            f.vertex_count() / 3 - interior,
        );
    }
    if let Some(s) = path.stroke_vertices() {
        eprintln!("  Stroke      {} triangles", s.vertex_count() / 3);
    }

    if let Some(png_path) = &cli.png {
        let bounds = render::path_bounds(&path).ok_or("nothing to render")?;
        let options = RenderOptions::fit(bounds, cli.width, cli.height, 16.0);
        let pixmap = render::rasterize(&path, &options)?;
        render::save_png(&pixmap, png_path)?;
        eprintln!();
        eprintln!("  \u{2713} {}", png_path.display());
    }

    eprintln!();

    Ok(())
}
