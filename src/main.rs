use clap::Parser;
use hmap::io::{
    cluster_tsv_path, load_annotation_styles, load_annotations, load_order, load_table,
    write_cluster_tsv, AnnotationStyles,
};
use hmap::{
    AnnotationKind, AnnotationRequest, Axis, Colormap, DistanceMetric, HeatMapComposer,
    HeatmapOptions, LayoutOptions, LinkageMethod, Margins, Palette, PixelCanvas, SvgCanvas,
};
use log::{info, LevelFilter};
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Annotation column to draw as a track: `NAME` or `NAME:KIND`
#[derive(Debug, Clone)]
struct TrackArg {
    name: String,
    kind: Option<AnnotationKind>,
}

impl FromStr for TrackArg {
    type Err = String;

    /// A trailing `:KIND` is only split off when it names a kind, so
    /// column names may contain ':'.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("empty annotation name".to_string());
        }
        let split = s.rsplit_once(':').and_then(|(name, kind)| {
            let kind = kind.parse::<AnnotationKind>().ok()?;
            (!name.is_empty()).then_some((name, kind))
        });
        Ok(match split {
            Some((name, kind)) => TrackArg {
                name: name.to_string(),
                kind: Some(kind),
            },
            None => TrackArg {
                name: s.to_string(),
                kind: None,
            },
        })
    }
}

#[derive(Parser)]
#[command(name = "hmap")]
#[command(about = "Draw a clustered heatmap with dendrograms and annotation tracks.", long_about = None)]
struct Args {
    // MANDATORY OPTIONS
    /// Load the numeric table from this tab-separated FILE.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Write the heatmap to this FILE (PNG or SVG based on extension).
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    out: PathBuf,

    // Clustering Options
    /// Distance metric used to compare rows and columns.
    #[arg(short = 'd', long = "distance-metric", value_name = "NAME", default_value = "correlation")]
    distance_metric: DistanceMetric,

    /// Linkage method used to merge clusters.
    #[arg(short = 'l', long = "linkage-method", value_name = "NAME", default_value = "complete")]
    linkage_method: LinkageMethod,

    /// Keep rows in table order (or --row-order).
    #[arg(long = "no-row-clustering")]
    no_row_clustering: bool,

    /// Keep columns in table order (or --column-order).
    #[arg(long = "no-column-clustering")]
    no_column_clustering: bool,

    /// Display rows in the order listed in FILE, one id per line; disables row clustering.
    #[arg(long = "row-order", value_name = "FILE")]
    row_order: Option<PathBuf>,

    /// Display columns in the order listed in FILE, one id per line; disables column clustering.
    #[arg(long = "column-order", value_name = "FILE")]
    column_order: Option<PathBuf>,

    /// Keep the default dendrogram leaf order instead of the optimal one.
    #[arg(long = "no-optimal-ordering")]
    no_optimal_ordering: bool,

    /// Write K flat clusters per clustered axis next to the output.
    #[arg(short = 'k', long = "flat-clusters", value_name = "K")]
    flat_clusters: Option<usize>,

    // Color Options
    /// Colormap of the heatmap body (append _r to reverse).
    #[arg(short = 'c', long = "cmap", value_name = "NAME", default_value = "seismic")]
    cmap: Colormap,

    /// Lowest value with a color of its own.
    #[arg(long = "vmin", value_name = "F", allow_negative_numbers = true)]
    vmin: Option<f64>,

    /// Highest value with a color of its own.
    #[arg(long = "vmax", value_name = "F", allow_negative_numbers = true)]
    vmax: Option<f64>,

    /// Make the color scale symmetric around the symmetry point.
    #[arg(short = 'S', long = "symmetric")]
    symmetric: bool,

    /// Center of a symmetric color scale.
    #[arg(long = "symmetry-point", value_name = "F", default_value_t = 0.0, allow_negative_numbers = true)]
    symmetry_point: f64,

    /// Palette for categorical annotations: xkcd, set22 or a list of colors.
    #[arg(short = 'P', long = "palette", value_name = "PALETTE", default_value = "xkcd")]
    palette: Palette,

    // Annotation Options
    /// Load row annotations from this tab-separated FILE.
    #[arg(long = "row-annotations", value_name = "FILE")]
    row_annotations: Option<PathBuf>,

    /// Draw this row annotation column; KIND is categorical or continuous.
    #[arg(short = 'R', long = "row-annotation", value_name = "NAME[:KIND]", requires = "row_annotations")]
    row_tracks: Vec<TrackArg>,

    /// Read row annotation group colors and colormaps from FILE.
    #[arg(long = "row-annotation-styles", value_name = "FILE", requires = "row_annotations")]
    row_styles: Option<PathBuf>,

    /// Load column annotations from this tab-separated FILE.
    #[arg(long = "column-annotations", value_name = "FILE")]
    column_annotations: Option<PathBuf>,

    /// Draw this column annotation column; KIND is categorical or continuous.
    #[arg(short = 'C', long = "column-annotation", value_name = "NAME[:KIND]", requires = "column_annotations")]
    column_tracks: Vec<TrackArg>,

    /// Read column annotation group colors and colormaps from FILE.
    #[arg(long = "column-annotation-styles", value_name = "FILE", requires = "column_annotations")]
    column_styles: Option<PathBuf>,

    // Labels and Legend
    /// Show row ids right of the heatmap.
    #[arg(long = "show-row-labels")]
    show_row_labels: bool,

    /// Show column ids below the heatmap.
    #[arg(long = "show-column-labels")]
    show_column_labels: bool,

    /// Don't draw the legend.
    #[arg(long = "no-legend")]
    no_legend: bool,

    // Layout Options (millimetres)
    /// Width of the heatmap body.
    #[arg(short = 'x', long = "heatmap-width", value_name = "MM", default_value_t = 50.0)]
    heatmap_width: f64,

    /// Height of the heatmap body.
    #[arg(short = 'y', long = "heatmap-height", value_name = "MM", default_value_t = 50.0)]
    heatmap_height: f64,

    /// Thickness of one annotation track.
    #[arg(long = "annotation-size", value_name = "MM", default_value_t = 2.0)]
    annotation_size: f64,

    /// Depth of the dendrogram panels.
    #[arg(long = "dendrogram-size", value_name = "MM", default_value_t = 15.0)]
    dendrogram_size: f64,

    /// Width of the legend panel.
    #[arg(long = "legend-width", value_name = "MM", default_value_t = 30.0)]
    legend_width: f64,

    /// Space between neighbouring panels.
    #[arg(long = "spacing", value_name = "MM", default_value_t = 1.0)]
    spacing: f64,

    /// Margin on every side of the figure.
    #[arg(long = "margin", value_name = "MM", default_value_t = 25.0)]
    margin: f64,

    /// Resolution of PNG output.
    #[arg(long = "dpi", value_name = "N", default_value_t = 300.0)]
    dpi: f64,

    // Threading
    /// Number of threads to use for parallel operations.
    #[arg(short = 't', long = "threads", value_name = "N")]
    threads: Option<usize>,

    // Logging
    /// Verbosity level (0 = error, 1 = info, 2 = debug, 3 = trace).
    #[arg(short = 'v', long = "verbose", value_name = "N", default_value_t = 1)]
    verbose: u8,
}

fn track_requests(tracks: &[TrackArg], styles: &AnnotationStyles) -> Vec<AnnotationRequest> {
    tracks
        .iter()
        .map(|track| AnnotationRequest {
            name: track.name.clone(),
            colors: styles.group_colors.get(&track.name).cloned(),
            colormap: styles.colormaps.get(&track.name).copied(),
        })
        .collect()
}

fn track_kinds(tracks: &[TrackArg]) -> FxHashMap<String, AnnotationKind> {
    tracks
        .iter()
        .filter_map(|t| t.kind.map(|kind| (t.name.clone(), kind)))
        .collect()
}

fn load_styles(path: Option<&Path>) -> hmap::Result<AnnotationStyles> {
    match path {
        Some(path) => load_annotation_styles(path),
        None => Ok(AnnotationStyles::default()),
    }
}

fn options(args: &Args) -> hmap::Result<HeatmapOptions> {
    let custom_row_order = args.row_order.as_deref().map(load_order).transpose()?;
    let custom_column_order = args.column_order.as_deref().map(load_order).transpose()?;
    Ok(HeatmapOptions {
        metric: args.distance_metric,
        method: args.linkage_method,
        cluster_rows: !args.no_row_clustering && custom_row_order.is_none(),
        cluster_columns: !args.no_column_clustering && custom_column_order.is_none(),
        custom_row_order,
        custom_column_order,
        optimal_row_ordering: !args.no_optimal_ordering,
        optimal_column_ordering: !args.no_optimal_ordering,
        vmin: args.vmin,
        vmax: args.vmax,
        symmetric: args.symmetric,
        symmetry_point: args.symmetry_point,
        colormap: args.cmap,
        palette: args.palette.clone(),
        row_annotations: Vec::new(),
        column_annotations: Vec::new(),
        show_row_labels: args.show_row_labels,
        show_column_labels: args.show_column_labels,
        plot_legend: !args.no_legend,
        layout: LayoutOptions {
            heatmap_width: args.heatmap_width,
            heatmap_height: args.heatmap_height,
            annotation_extent: args.annotation_size,
            dendrogram_extent: args.dendrogram_size,
            legend_width: args.legend_width,
            horizontal_spacing: args.spacing,
            vertical_spacing: args.spacing,
            margins: Margins::uniform(args.margin),
            ..LayoutOptions::default()
        },
    })
}

fn run(args: &Args) -> hmap::Result<()> {
    let table = load_table(&args.input)?;
    let mut composer = HeatMapComposer::new(table, options(args)?);

    if let Some(path) = &args.row_annotations {
        let annotations = load_annotations(path, &track_kinds(&args.row_tracks))?;
        let styles = load_styles(args.row_styles.as_deref())?;
        composer.set_row_annotations(annotations, track_requests(&args.row_tracks, &styles));
    }
    if let Some(path) = &args.column_annotations {
        let annotations = load_annotations(path, &track_kinds(&args.column_tracks))?;
        let styles = load_styles(args.column_styles.as_deref())?;
        composer.set_column_annotations(annotations, track_requests(&args.column_tracks, &styles));
    }

    // Detect output format by file extension
    let is_svg = args
        .out
        .extension()
        .map(|ext| ext.to_ascii_lowercase() == "svg")
        .unwrap_or(false);

    let report = if is_svg {
        info!("Rendering SVG...");
        let mut canvas = SvgCanvas::new();
        let report = composer.render(&mut canvas)?;
        canvas.save(&args.out)?;
        report
    } else {
        info!("Rendering image...");
        let mut canvas = PixelCanvas::new(args.dpi);
        let report = composer.render(&mut canvas)?;
        canvas.save(&args.out)?;
        report
    };
    info!(
        "Drew {} rows x {} columns",
        report.row_ids.len(),
        report.column_ids.len()
    );

    if let Some(k) = args.flat_clusters {
        let clustered = [
            (Axis::Rows, composer.options().cluster_rows),
            (Axis::Columns, composer.options().cluster_columns),
        ];
        for (axis, _) in clustered.into_iter().filter(|(_, on)| *on) {
            let clusters = composer.flat_clusters(axis, k)?;
            let tsv_path = cluster_tsv_path(&args.out, axis);
            if let Err(e) = write_cluster_tsv(&tsv_path, axis, &clusters) {
                eprintln!("Warning: could not write cluster TSV: {}", e);
            }
        }
    }

    Ok(())
}

fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Error,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(log_level(args.verbose))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Error configuring {} threads: {}", threads, e);
            std::process::exit(1);
        }
    }

    info!("Starting heatmap...");

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    info!("Done.");
}
