mod report;

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cb_core::{CoreError, FilterMode, MemoryStore, PreferenceStore, Session, SessionManager, ViewSettings};
use cb_data::config::read_view_settings;
use cb_data::{load_dataset, DatasetSource, DirectorySource, ExpressionMatrix, JsonFileStore};

#[derive(Parser)]
#[command(name = "cellbrowse", about = "Headless single-cell dataset browser")]
#[command(version)]
struct Cli {
    /// Dataset directory
    dataset: PathBuf,

    /// Index of the coordinate layout to load
    #[arg(long, default_value_t = 0)]
    layout: usize,

    /// JSON file with viewport settings
    #[arg(long)]
    settings: Option<PathBuf>,

    /// JSON file keeping legend colors and sort preferences
    #[arg(long)]
    store: Option<PathBuf>,

    /// Color by a metadata field
    #[arg(long, value_name = "FIELD")]
    color_by: Option<String>,

    /// Color by the expression of a gene
    #[arg(long, conflicts_with = "color_by")]
    gene: Option<String>,

    /// Replace the preloaded genes with genes read from the expression matrix
    #[arg(long, value_delimiter = ',', value_name = "GENES")]
    genes: Vec<String>,

    /// Toggle the legend between name and frequency order
    #[arg(long)]
    toggle_sort: bool,

    /// Zoom to a pixel rectangle
    #[arg(long, value_delimiter = ',', value_name = "X1,Y1,X2,Y2", allow_negative_numbers = true)]
    zoom_rect: Vec<f64>,

    /// Zoom in this many steps
    #[arg(long, default_value_t = 0)]
    zoom_in: u32,

    /// Zoom out this many steps
    #[arg(long, default_value_t = 0)]
    zoom_out: u32,

    /// Select the points inside a pixel rectangle
    #[arg(long, value_delimiter = ',', value_name = "X1,Y1,X2,Y2", allow_negative_numbers = true)]
    select_rect: Vec<i32>,

    /// Select points by id
    #[arg(long, value_delimiter = ',', value_name = "IDS")]
    select_ids: Vec<String>,

    /// Select the points of legend classes
    #[arg(long, value_delimiter = ',', value_name = "INDICES")]
    select_class: Vec<usize>,

    /// Filter the points by the selection
    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// Add the selection to the marked points
    #[arg(long)]
    mark: bool,

    /// Print cluster label positions
    #[arg(long)]
    labels: bool,

    /// Print the selected (or all on-screen) ids
    #[arg(long)]
    export: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    /// Hide the selected points
    Hide,
    /// Show only the selected points
    Only,
}

impl From<FilterArg> for FilterMode {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Hide => FilterMode::Hide,
            FilterArg::Only => FilterMode::ShowOnly,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let settings = match &cli.settings {
        Some(path) => read_view_settings(path).with_context(|| format!("Cannot read settings {:?}", path))?,
        None => ViewSettings::default(),
    };
    let store: Arc<dyn PreferenceStore> = match &cli.store {
        Some(path) => Arc::new(JsonFileStore::open(path).with_context(|| format!("Cannot open store {:?}", path))?),
        None => Arc::new(MemoryStore::new()),
    };

    let source = DirectorySource::open(&cli.dataset)
        .with_context(|| format!("Cannot open dataset {:?}", cli.dataset))?
        .with_layout(cli.layout);
    if source.config().coord_file(cli.layout).is_none() {
        bail!("Dataset has no layout {}", cli.layout);
    }
    let source = Arc::new(source);

    let mut manager = SessionManager::new(store, settings).with_empty_labels(source.config().empty_labels.clone());
    load_dataset(&mut manager, source.clone()).await?;
    let session = manager.session_mut().context("Dataset loaded without a session")?;

    if let Some(field) = &cli.color_by {
        session.color_by_field(field)?;
    }
    if !cli.genes.is_empty() {
        load_gene_list(session, &source, &cli.genes).await?;
    }
    if let Some(gene) = &cli.gene {
        color_by_gene(session, &source, gene).await?;
    }
    if cli.toggle_sort {
        let mode = session.toggle_sort()?;
        info!("Legend sorted by {}", mode.as_str());
    }

    apply_view(session, &cli)?;
    apply_selection(session, &cli)?;

    if let Some(filter) = cli.filter {
        session.filter_selected(filter.into());
    }
    if cli.mark {
        let marked = session.mark_selection()?;
        println!("Marked {} points", marked);
    }

    report::print_overview(session, source.name());
    report::print_legend(session);
    report::print_gene_bar(session);
    if !session.selection().is_empty() {
        report::print_selection(session);
    }
    if cli.labels {
        report::print_labels(session)?;
    }
    if cli.export {
        report::print_ids(session);
    }
    Ok(())
}

fn open_matrix(session: &Session, source: &DirectorySource) -> Result<ExpressionMatrix> {
    let offsets = session
        .dataset()
        .offsets
        .clone()
        .context("The dataset has no expression offsets")?;
    let matrix = source
        .open_matrix(offsets)
        .context("The dataset has no expression matrix")??;
    Ok(matrix)
}

/// Read a gene list from the matrix. Genes that are not found are reported;
/// the others replace the preloaded genes.
async fn load_gene_list(session: &mut Session, source: &DirectorySource, symbols: &[String]) -> Result<()> {
    let matrix = open_matrix(session, source).context("Cannot load the gene list")?;
    let symbols = symbols.to_vec();
    let list = tokio::task::spawn_blocking(move || matrix.fetch_gene_list(&symbols)).await?;
    if !list.missing.is_empty() {
        println!("Genes not found: {}", list.missing_symbols().join(", "));
    }
    let count = session.load_gene_list(list.genes);
    info!("Gene list has {} genes", count);
    Ok(())
}

/// Current gene list first, then the expression matrix
async fn color_by_gene(session: &mut Session, source: &DirectorySource, gene: &str) -> Result<()> {
    match session.color_by_gene(gene) {
        Ok(()) => return Ok(()),
        Err(CoreError::UnknownGene(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let matrix = open_matrix(session, source).with_context(|| format!("Gene {} is not in the gene list", gene))?;
    let symbol = gene.to_string();
    let vector = tokio::task::spawn_blocking(move || matrix.fetch_gene(&symbol))
        .await?
        .with_context(|| format!("Cannot load gene {}", gene))?;
    session.color_by_expression(Arc::new(vector));
    Ok(())
}

/// Two corners from the four values of a rectangle option
fn corners<T: Copy>(values: &[T], option: &str) -> Result<Option<((T, T), (T, T))>> {
    match values {
        [] => Ok(None),
        [x1, y1, x2, y2] => Ok(Some(((*x1, *y1), (*x2, *y2)))),
        _ => bail!("--{} takes four comma-separated values, got {}", option, values.len()),
    }
}

fn apply_view(session: &mut Session, cli: &Cli) -> Result<()> {
    let zoom_rect = corners(&cli.zoom_rect, "zoom-rect")?;
    session.batch(|s| {
        if let Some((p1, p2)) = zoom_rect {
            s.zoom_to_rect(p1, p2);
        }
        for _ in 0..cli.zoom_in {
            s.zoom_in();
        }
        for _ in 0..cli.zoom_out {
            s.zoom_out();
        }
    });
    Ok(())
}

fn apply_selection(session: &mut Session, cli: &Cli) -> Result<()> {
    if let Some((p1, p2)) = corners(&cli.select_rect, "select-rect")? {
        session.select_rect(p1, p2);
    }
    if !cli.select_ids.is_empty() {
        if let Err(e) = session.select_by_ids(cli.select_ids.as_slice()) {
            warn!("{}", e);
        }
    }
    for (i, &class) in cli.select_class.iter().enumerate() {
        session.click_legend_class(class, i > 0)?;
    }
    Ok(())
}
