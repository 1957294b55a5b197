//! Tessera CLI - Lattice generation and point binning

mod geojson;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tessera_algorithms::binning::{
    assemble, bin_points, generate_lattice, AssembleParams, BinningParams, PointSource,
};
use tessera_algorithms::tessellation::{CellSizeRequest, TilingKind};
use tessera_core::{Diagnostics, Extent, ProgressMonitor, CRS};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tessera")]
#[command(author, version, about = "Regular lattices and point binning", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a GeoJSON file
    Info {
        /// Input GeoJSON FeatureCollection
        input: PathBuf,
    },
    /// Generate an empty lattice
    Grid {
        /// Output GeoJSON file
        output: PathBuf,
        #[command(flatten)]
        lattice: LatticeArgs,
        #[command(flatten)]
        fields: OutputArgs,
    },
    /// Bin points into a lattice
    Bin {
        /// Input points (GeoJSON Point/MultiPoint features)
        points: PathBuf,
        /// Output GeoJSON file
        output: PathBuf,
        #[command(flatten)]
        lattice: LatticeArgs,
        #[command(flatten)]
        fields: OutputArgs,
        /// Weight formula over point attributes, e.g. "pop * 0.5"
        #[arg(short, long)]
        weight: Option<String>,
        /// Attribute to break counts down by
        #[arg(long)]
        case_field: Option<String>,
        /// Drop cells that received no points
        #[arg(long)]
        only_valid: bool,
    },
}

// ─── Shared arguments ───────────────────────────────────────────────────

#[derive(Args)]
struct LatticeArgs {
    /// JSON file with default parameters; flags override it
    #[arg(long)]
    params: Option<PathBuf>,
    /// Tiling: rectangle, hexagon-flat, hexagon-pointy, triangle, circle
    #[arg(short, long)]
    kind: Option<TilingKind>,
    /// Cell size (side length, or radius for circles)
    #[arg(short, long)]
    size: Option<f64>,
    /// Rectangle cell width
    #[arg(long)]
    width: Option<f64>,
    /// Rectangle cell height
    #[arg(long)]
    height: Option<f64>,
    /// Number of columns (with --rows)
    #[arg(long)]
    columns: Option<usize>,
    /// Number of rows (with --columns)
    #[arg(long)]
    rows: Option<usize>,
    /// Extent as minx,miny,maxx,maxy
    #[arg(short, long, value_parser = parse_extent)]
    extent: Option<Extent>,
    /// Frame of the --extent values, e.g. EPSG:3857
    #[arg(long, requires = "extent")]
    crs: Option<String>,
    /// Boundary polygons (GeoJSON)
    #[arg(short, long)]
    boundary: Option<PathBuf>,
    /// Keep only cells fully inside the boundary
    #[arg(long)]
    inside: bool,
    /// Polygon sides used to draw circle cells
    #[arg(long)]
    circle_segments: Option<usize>,
    /// Refuse lattices with more cells than this
    #[arg(long)]
    max_cells: Option<usize>,
}

#[derive(Args)]
struct OutputArgs {
    /// Omit row and col attributes
    #[arg(long)]
    no_row_col: bool,
    /// Omit the id attribute
    #[arg(long)]
    no_id: bool,
    /// Add centroid_x and centroid_y
    #[arg(long)]
    centroids: bool,
    /// Add weightMin, weightMax and weightMean
    #[arg(long)]
    weight_stats: bool,
}

impl LatticeArgs {
    fn apply(&self, params: &mut BinningParams) -> Result<()> {
        if let Some(kind) = self.kind {
            params.kind = kind;
        }

        let sizing_given = self.size.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.columns.is_some()
            || self.rows.is_some();
        if sizing_given {
            params.size = CellSizeRequest {
                cell_size: self.size,
                width: self.width,
                height: self.height,
                columns: self.columns.unwrap_or(0),
                rows: self.rows.unwrap_or(0),
            };
        }

        if let Some(extent) = &self.extent {
            let extent = match &self.crs {
                Some(name) => extent.clone().with_frame(CRS::parse(name)?),
                None => extent.clone(),
            };
            params.extent = Some(extent);
        }

        if self.inside {
            params.lattice.boundary_inside = true;
        }
        if let Some(n) = self.circle_segments {
            params.lattice.circle_segments = n;
        }
        if let Some(n) = self.max_cells {
            params.lattice.max_cells = n;
        }
        Ok(())
    }
}

impl OutputArgs {
    fn apply(&self, params: &mut AssembleParams) {
        if self.no_row_col {
            params.include_row_col = false;
        }
        if self.no_id {
            params.include_id = false;
        }
        if self.centroids {
            params.include_centroid = true;
        }
        if self.weight_stats {
            params.weight_stats = true;
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set up logging")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn progress_bar(len: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Feeds aggregation progress into a progress bar
struct BarMonitor {
    pb: ProgressBar,
}

impl ProgressMonitor for BarMonitor {
    fn progress(&self, processed: u64) {
        self.pb.set_position(processed);
    }

    fn is_cancelled(&self) -> bool {
        false
    }
}

fn parse_extent(s: &str) -> std::result::Result<Extent, String> {
    let values: Vec<f64> = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{}': {}", v.trim(), e)))
        .collect::<std::result::Result<_, _>>()?;
    if values.len() != 4 {
        return Err(format!("expected minx,miny,maxx,maxy, got {} value(s)", values.len()));
    }
    Extent::new(values[0], values[1], values[2], values[3]).map_err(|e| e.to_string())
}

fn load_params(path: Option<&PathBuf>) -> Result<BinningParams> {
    let Some(path) = path else {
        return Ok(BinningParams::default());
    };
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse parameters from {}", path.display()))
}

fn read_boundary(path: Option<&PathBuf>) -> Result<Option<tessera_core::BoundarySource>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let pb = spinner("Reading boundary...");
    let boundary = geojson::read_boundary(path)?;
    pb.finish_and_clear();
    if boundary.is_empty() {
        anyhow::bail!("{} contains no polygons", path.display());
    }
    info!("Boundary: {} polygon(s)", boundary.len());
    Ok(Some(boundary))
}

fn write_records<I>(path: &Path, records: I, frame: Option<&CRS>) -> Result<usize>
where
    I: IntoIterator<Item = tessera_core::Feature>,
{
    let pb = spinner("Writing output...");
    let n = geojson::write_features(path, records, frame)?;
    pb.finish_and_clear();
    Ok(n)
}

fn report(diagnostics: &Diagnostics) {
    for notice in diagnostics.iter() {
        println!("  Note: {}", notice);
    }
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let collection = geojson::read_collection(&input)?;
            let frame = geojson::collection_frame(&collection)?;

            let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
            for f in &collection.features {
                let kind = f.geometry.as_ref().map(|g| g.kind()).unwrap_or("null");
                *kinds.entry(kind).or_insert(0) += 1;
            }

            println!("File: {}", input.display());
            println!("Features: {}", collection.features.len());
            for (kind, n) in &kinds {
                println!("  {}: {}", kind, n);
            }
            if let Some(crs) = frame {
                println!("CRS: {}", crs);
            }

            let points = geojson::read_points(&input)?;
            let boundary = geojson::read_boundary(&input)?;
            let corners = [points.bounds(), boundary.bounds()]
                .into_iter()
                .flatten()
                .flat_map(|r| [r.min(), r.max()]);
            if let Some(b) = Extent::bounds_of(corners) {
                println!(
                    "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                    b.min().x,
                    b.min().y,
                    b.max().x,
                    b.max().y
                );
            }
            let invalid = points.points.iter().filter(|p| !p.is_valid()).count();
            if invalid > 0 {
                println!("Points with non-finite coordinates: {}", invalid);
            }
        }

        // ── Grid ─────────────────────────────────────────────────────
        Commands::Grid { output, lattice, fields } => {
            let mut params = load_params(lattice.params.as_ref())?;
            lattice.apply(&mut params)?;
            fields.apply(&mut params.assemble);
            let boundary = read_boundary(lattice.boundary.as_ref())?;

            let start = Instant::now();
            let pb = spinner("Generating lattice...");
            let grid = generate_lattice(&params, boundary.as_ref())?;
            pb.finish_and_clear();

            let n = write_records(&output, assemble(grid.cells, &params.assemble), grid.extent.frame())?;
            let elapsed = start.elapsed();

            println!("Lattice: {} ({} cells)", grid.spec.kind, n);
            report(&grid.diagnostics);
            done("Grid", &output, elapsed);
        }

        // ── Bin ──────────────────────────────────────────────────────
        Commands::Bin {
            points,
            output,
            lattice,
            fields,
            weight,
            case_field,
            only_valid,
        } => {
            let mut params = load_params(lattice.params.as_ref())?;
            lattice.apply(&mut params)?;
            fields.apply(&mut params.assemble);
            if weight.is_some() {
                params.weight = weight;
            }
            if case_field.is_some() {
                params.aggregate.case_field = case_field;
            }
            if only_valid {
                params.aggregate.only_valid_grid = true;
            }

            let pb = spinner("Reading points...");
            let input = geojson::read_points(&points)?;
            pb.finish_and_clear();
            info!("Input: {} point(s)", input.len());
            let boundary = read_boundary(lattice.boundary.as_ref())?;

            let start = Instant::now();
            let monitor = BarMonitor { pb: progress_bar(input.len() as u64, "Binning") };
            let out = bin_points(
                &params,
                boundary.as_ref(),
                PointSource::from_collection(&input),
                &monitor,
            )
            .context("Failed to bin points")?;
            monitor.pb.finish_and_clear();

            let stats = out.stats;
            let kind = out.spec.kind;
            let frame = out.extent.frame().cloned();
            let n = write_records(&output, out.records, frame.as_ref())?;
            let elapsed = start.elapsed();

            println!("Lattice: {} ({} cells written)", kind, n);
            println!(
                "Points: {} matched, {} outside, {} skipped",
                stats.points_matched, stats.points_unmatched, stats.points_skipped
            );
            report(&out.diagnostics);
            done("Bins", &output, elapsed);
        }
    }

    Ok(())
}
