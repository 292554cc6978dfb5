//! Session context: all mutable view state of one loaded dataset.
//!
//! A session is created when a dataset becomes ready and replaced wholesale
//! when another dataset is loaded. Every user action is a method that
//! mutates the raw state, marks derived state dirty and recomputes it once
//! before returning. [`Session::batch`] groups several actions under one
//! recompute.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::dataset::{ExpressionVector, LoadedDataset, MetaTable};
use crate::deciles::{DecileBoundaries, BOUNDARY_COUNT};
use crate::empty::EmptyLabelConfig;
use crate::error::{CoreError, Result};
use crate::legend::{
    cluster_midpoints, ClassAssignment, ClassificationEngine, ClusterMidpoint, Legend, LegendKind, Rgb, SortMode,
};
use crate::load::Generation;
use crate::point::{PixelPoint, Point, PointId};
use crate::selection::{
    apply_filter, class_select, gene_intensities, selection_summary, FieldSummary, FilterMode, GeneIntensity,
    SelectionIndex, SelectionSet,
};
use crate::settings::{DatasetOptions, ViewSettings};
use crate::store::PreferenceStore;
use crate::viewport::{ViewportTransform, ZoomRange};

#[derive(Debug, Default, Clone, Copy)]
struct Dirty {
    pixels: bool,
    classes: bool,
    legend: bool,
    intensities: bool,
}

impl Dirty {
    fn all() -> Self {
        Self { pixels: true, classes: true, legend: true, intensities: true }
    }

    fn any(&self) -> bool {
        self.pixels || self.classes || self.legend || self.intensities
    }
}

/// State of one dataset view
pub struct Session {
    generation: Generation,
    dataset: Arc<LoadedDataset>,
    settings: ViewSettings,
    engine: ClassificationEngine,
    transform: ViewportTransform,
    shown: Vec<Point>,
    pixels: Vec<PixelPoint>,
    legend: Option<Legend>,
    assignment: ClassAssignment,
    selection: SelectionIndex,
    genes: Vec<Arc<ExpressionVector>>,
    intensities: Vec<GeneIntensity>,
    label_field: Option<usize>,
    dirty: Dirty,
    batch_depth: usize,
}

impl Session {
    /// Build the initial view of a freshly loaded dataset: everything shown,
    /// zoomed to the full range, colored by the cluster field.
    pub fn new(
        generation: Generation,
        dataset: Arc<LoadedDataset>,
        options: &DatasetOptions,
        settings: ViewSettings,
        store: Arc<dyn PreferenceStore>,
        empty_labels: EmptyLabelConfig,
    ) -> Self {
        let engine = ClassificationEngine::new(store)
            .with_fixed_colors(dataset.colors.clone().unwrap_or_default())
            .with_empty_labels(empty_labels)
            .with_max_classes(settings.max_legend_classes);
        let transform = ViewportTransform::new(ZoomRange::bounding(&dataset.points), settings.width, settings.height)
            .with_border(settings.border);

        let meta = &dataset.meta;
        let cluster_field = resolve_field(meta, options.cluster_field.as_deref(), "cluster");
        let label_field = match &options.label_field {
            Some(name) => resolve_field(meta, Some(name), "label"),
            None => cluster_field,
        };

        let mut session = Self {
            generation,
            shown: dataset.points.clone(),
            selection: SelectionIndex::with_max_marked(settings.max_marked),
            settings,
            engine,
            transform,
            pixels: Vec::new(),
            legend: None,
            assignment: ClassAssignment::default(),
            genes: dataset
                .preload
                .as_ref()
                .map(|p| p.vectors().into_iter().map(Arc::new).collect())
                .unwrap_or_default(),
            intensities: Vec::new(),
            label_field,
            dirty: Dirty::all(),
            batch_depth: 0,
            dataset,
        };

        let initial_field = cluster_field.or_else(|| (session.dataset.meta.fields().len() > 1).then_some(1));
        if let Some(field) = initial_field {
            if let Err(e) = session.set_categorical_legend(field, None) {
                warn!("No initial coloring for '{}': {}", session.dataset.name, e);
            }
        }
        session.finish();
        info!(
            "Session {} for '{}': {} points, {} on screen",
            session.generation,
            session.dataset.name,
            session.shown.len(),
            session.pixels.len()
        );
        session
    }

    // ---- read surface ----

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn dataset(&self) -> &Arc<LoadedDataset> {
        &self.dataset
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn zoom_range(&self) -> ZoomRange {
        self.transform.zoom_range()
    }

    pub fn transform(&self) -> &ViewportTransform {
        &self.transform
    }

    pub fn shown_points(&self) -> &[Point] {
        &self.shown
    }

    pub fn pixel_points(&self) -> &[PixelPoint] {
        &self.pixels
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.legend.as_ref()
    }

    pub fn assignment(&self) -> &ClassAssignment {
        &self.assignment
    }

    pub fn selection(&self) -> &SelectionSet {
        self.selection.selected()
    }

    pub fn marked(&self) -> impl Iterator<Item = &PointId> {
        self.selection.marked().iter()
    }

    /// Genes that can be colored on without reading the matrix: the
    /// dataset's preloaded genes, or the last gene list loaded
    pub fn genes(&self) -> &[Arc<ExpressionVector>] {
        &self.genes
    }

    /// Mean expression bin of every gene over the selection, or over all
    /// shown points when nothing is selected
    pub fn gene_intensities(&self) -> &[GeneIntensity] {
        &self.intensities
    }

    /// Name of the field drawn as cluster labels
    pub fn label_field(&self) -> Option<&str> {
        self.label_field.and_then(|f| self.dataset.meta.field_name(f))
    }

    /// Legend class of a point, `None` when unassigned
    pub fn class_of(&self, id: &str) -> Option<usize> {
        self.assignment.class_of(id)
    }

    /// Color a point is drawn with
    pub fn color_of(&self, id: &str) -> Option<Rgb> {
        let class = self.assignment.class_of(id)?;
        self.legend.as_ref()?.classes.get(class).map(|c| c.color)
    }

    // ---- batching ----

    /// Run several actions and recompute derived state once at the end
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = f(self);
        self.batch_depth -= 1;
        self.finish();
        result
    }

    fn finish(&mut self) {
        if self.batch_depth > 0 || !self.dirty.any() {
            return;
        }
        let dirty = std::mem::take(&mut self.dirty);

        if dirty.legend {
            self.refresh_legend_counts();
        }
        if dirty.classes || dirty.legend {
            self.assignment = match &self.legend {
                Some(legend) => self.engine.assign_classes(legend, &self.shown, &self.dataset.meta),
                None => ClassAssignment::default(),
            };
        }
        if dirty.pixels {
            self.pixels = self.transform.scale_to_pixels(&self.shown);
        }
        if dirty.intensities {
            self.intensities = if self.selection.is_empty() {
                gene_intensities(&self.genes, self.shown.iter().map(|p| &p.id))
            } else {
                gene_intensities(&self.genes, self.selection.selected())
            };
        }
        debug!("Recomputed derived state: {:?}, {} points on screen", dirty, self.pixels.len());
    }

    /// Expression legends count shown points only and need a rebuild when
    /// the shown points change
    fn refresh_legend_counts(&mut self) {
        let Some(legend) = &self.legend else {
            return;
        };
        if !matches!(legend.kind, LegendKind::Expression { .. }) {
            return;
        }
        match self.engine.rebuild(legend, &self.dataset.meta, &self.dataset.points, &self.shown) {
            Ok(rebuilt) => self.legend = Some(rebuilt),
            Err(e) => warn!("Cannot recount legend: {}", e),
        }
    }

    // ---- zoom and pan ----

    pub fn zoom_to_rect(&mut self, p1: (f64, f64), p2: (f64, f64)) -> ZoomRange {
        let range = self.transform.zoom_to_rect(p1, p2);
        self.view_changed();
        range
    }

    pub fn zoom_in(&mut self) -> ZoomRange {
        let range = self.transform.zoom_by_factor(-self.settings.zoom_step);
        self.view_changed();
        range
    }

    pub fn zoom_out(&mut self) -> ZoomRange {
        let range = self.transform.zoom_by_factor(self.settings.zoom_step);
        self.view_changed();
        range
    }

    /// Mouse wheel: positive deltas zoom in, others zoom out
    pub fn wheel(&mut self, delta: f64) -> ZoomRange {
        let factor = if delta > 0.0 { -self.settings.wheel_zoom_step } else { self.settings.wheel_zoom_step };
        let range = self.transform.zoom_by_factor(factor);
        self.view_changed();
        range
    }

    pub fn pan_drag(&mut self, start: (f64, f64), end: (f64, f64)) -> ZoomRange {
        let range = self.transform.pan_drag(start, end);
        self.view_changed();
        range
    }

    pub fn zoom_full(&mut self) -> ZoomRange {
        let range = self.transform.zoom_full();
        self.view_changed();
        range
    }

    /// Restore a saved zoom range
    pub fn set_zoom_range(&mut self, range: ZoomRange) -> ZoomRange {
        let range = self.transform.set_zoom_range(range);
        self.view_changed();
        range
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.transform.resize(width, height);
        self.settings.width = width;
        self.settings.height = height;
        self.view_changed();
    }

    fn view_changed(&mut self) {
        self.dirty.pixels = true;
        self.finish();
    }

    // ---- selection ----

    /// Select the on-screen points inside a pixel rectangle
    pub fn select_rect(&mut self, p1: (i32, i32), p2: (i32, i32)) -> usize {
        self.selection.select_rect(p1, p2, &self.pixels);
        self.selection_changed();
        self.selection.len()
    }

    pub fn select_all_visible(&mut self) -> usize {
        self.selection.select_all_visible(&self.pixels);
        self.selection_changed();
        self.selection.len()
    }

    pub fn select_none(&mut self) {
        self.selection.clear();
        self.selection_changed();
    }

    pub fn select_by_ids<S: AsRef<str>>(&mut self, ids: &[S]) -> Result<usize> {
        let result = self.selection.select_by_ids(ids, &self.shown);
        self.selection_changed();
        result
    }

    /// Select the points of a legend class; clicking it again clears
    pub fn click_legend_class(&mut self, class_index: usize, additive: bool) -> Result<usize> {
        self.check_class(class_index)?;
        self.selection.click_legend_class(&self.assignment, class_index, additive);
        self.selection_changed();
        Ok(self.selection.len())
    }

    fn selection_changed(&mut self) {
        self.dirty.intensities = true;
        self.finish();
    }

    // ---- filtering ----

    /// Hide the selected points or show only them. Clears the selection.
    pub fn filter_selected(&mut self, mode: FilterMode) -> usize {
        let ids = self.selection.selected().clone();
        self.apply_filter(mode, &ids)
    }

    /// Hide the points of some legend classes or show only them. Clears the
    /// selection.
    pub fn filter_classes(&mut self, class_indices: &[usize], mode: FilterMode) -> Result<usize> {
        for &class in class_indices {
            self.check_class(class)?;
        }
        let ids = class_select(&self.assignment, class_indices, false, &SelectionSet::new());
        Ok(self.apply_filter(mode, &ids))
    }

    /// Drop any filter. Clears the selection.
    pub fn show_all(&mut self) -> usize {
        self.apply_filter(FilterMode::ShowAll, &SelectionSet::new())
    }

    fn apply_filter(&mut self, mode: FilterMode, ids: &SelectionSet) -> usize {
        self.shown = apply_filter(mode, ids, &self.shown, &self.dataset.points);
        self.selection.clear();
        self.dirty = Dirty::all();
        self.finish();
        info!("Filter {:?}: {} points shown", mode, self.shown.len());
        self.shown.len()
    }

    // ---- coloring ----

    /// Color by a metadata field. On failure the previous legend stays.
    pub fn color_by_field(&mut self, field: &str) -> Result<()> {
        let index = self
            .dataset
            .meta
            .field_index(field)
            .ok_or_else(|| CoreError::UnknownField(field.to_string()))?;
        self.set_categorical_legend(index, None)?;
        self.finish();
        Ok(())
    }

    /// Color by a gene of the current gene list, looked up by symbol or id
    pub fn color_by_gene(&mut self, gene: &str) -> Result<()> {
        let vector = self
            .genes
            .iter()
            .find(|v| v.gene.symbol == gene || v.gene.id == gene)
            .cloned()
            .ok_or_else(|| CoreError::UnknownGene(gene.to_string()))?;
        self.color_by_expression(vector);
        Ok(())
    }

    /// Replace the gene list, e.g. with genes read from the expression
    /// matrix. Returns the number of genes now in the list.
    pub fn load_gene_list(&mut self, genes: impl IntoIterator<Item = ExpressionVector>) -> usize {
        self.genes = genes.into_iter().map(Arc::new).collect();
        info!("Gene list of '{}' now has {} genes", self.dataset.name, self.genes.len());
        self.dirty.intensities = true;
        self.finish();
        self.genes.len()
    }

    /// Color by an expression vector, e.g. one read from the matrix
    pub fn color_by_expression(&mut self, vector: Arc<ExpressionVector>) {
        let deciles = vector.deciles.unwrap_or(DecileBoundaries([0.0; BOUNDARY_COUNT]));
        info!("Coloring by {} ({} values)", vector.gene.symbol, vector.len());
        self.legend = Some(self.engine.build_expression_legend(vector, deciles, &self.shown));
        self.legend_changed();
    }

    /// Switch the legend between name and frequency order
    pub fn toggle_sort(&mut self) -> Result<SortMode> {
        let legend = self.legend.as_ref().ok_or(CoreError::NotReady)?;
        let next = self.engine.toggle_sort(legend);
        if let LegendKind::Categorical { field_index, .. } = legend.kind {
            self.set_categorical_legend(field_index, Some(next))?;
            self.finish();
        }
        Ok(next)
    }

    pub fn set_class_color(&mut self, class_index: usize, color: Rgb) -> Result<()> {
        let legend = self.legend.as_mut().ok_or(CoreError::NotReady)?;
        self.engine.set_class_color(legend, class_index, color)
    }

    /// Remove manual colors of the current legend
    pub fn reset_colors(&mut self) {
        if let Some(legend) = self.legend.as_mut() {
            self.engine.reset_colors(legend);
        }
    }

    fn set_categorical_legend(&mut self, field_index: usize, sort: Option<SortMode>) -> Result<()> {
        let legend = self
            .engine
            .build_categorical_legend(&self.dataset.meta, &self.dataset.points, field_index, sort)?;
        self.legend = Some(legend);
        self.legend_changed();
        Ok(())
    }

    fn legend_changed(&mut self) {
        self.selection.reset_class_click();
        self.dirty.classes = true;
        self.finish();
    }

    fn check_class(&self, class_index: usize) -> Result<()> {
        let classes = self.legend.as_ref().map_or(0, |l| l.classes.len());
        if class_index < classes {
            Ok(())
        } else {
            Err(CoreError::UnknownClass(class_index))
        }
    }

    // ---- marks, export, summaries ----

    pub fn mark_selection(&mut self) -> Result<usize> {
        self.selection.mark()
    }

    pub fn clear_marks(&mut self) {
        self.selection.clear_marks();
    }

    /// Selected ids, or every on-screen id when nothing is selected
    pub fn export_ids(&self) -> Vec<PointId> {
        self.selection.export_ids(&self.pixels)
    }

    pub fn selection_summary(&self) -> Vec<FieldSummary> {
        selection_summary(&self.dataset.meta, self.selection.selected())
    }

    /// Label positions for the values of `field`, or of the configured
    /// label field when `field` is `None`
    pub fn cluster_labels(&self, field: Option<&str>) -> Result<Vec<ClusterMidpoint>> {
        let index = match field {
            Some(name) => self
                .dataset
                .meta
                .field_index(name)
                .ok_or_else(|| CoreError::UnknownField(name.to_string()))?,
            None => match self.label_field {
                Some(index) => index,
                None => return Ok(Vec::new()),
            },
        };
        Ok(cluster_midpoints(&self.dataset.meta, &self.dataset.points, index, &self.transform))
    }
}

fn resolve_field(meta: &MetaTable, name: Option<&str>, role: &str) -> Option<usize> {
    let name = name?;
    let index = meta.field_index(name);
    if index.is_none() {
        warn!("Configured {} field '{}' is not a metadata field, ignoring it", role, name);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{GeneInfo, PreloadedExpression};
    use crate::legend::NULL_COLOR;
    use crate::store::MemoryStore;

    /// 3x3 grid, cluster A on the left column, B in the middle, C on the right
    fn dataset() -> LoadedDataset {
        let mut points = Vec::new();
        let mut rows = Vec::new();
        for (i, cluster) in ["A", "B", "C"].iter().enumerate() {
            for j in 0..3 {
                let id = format!("p{i}{j}");
                points.push(Point::new(id.as_str(), i as f64 * 5.0, j as f64 * 5.0));
                rows.push((PointId::from(id.as_str()), vec![id.clone(), cluster.to_string(), format!("d{}", j % 2)]));
            }
        }
        let mut preload = PreloadedExpression {
            genes: vec![GeneInfo { id: "g1".into(), symbol: "CD3E".into(), description: String::new() }],
            ..Default::default()
        };
        for (n, p) in points.iter().enumerate() {
            let value = if n == 0 { None } else { Some(n as f64) };
            preload.cell_expr.insert(p.id.clone(), vec![value]);
        }
        LoadedDataset {
            name: "grid".into(),
            meta: MetaTable::new(vec!["cellId".into(), "cluster".into(), "donor".into()], rows),
            points,
            preload: Some(preload),
            ..Default::default()
        }
    }

    fn session_with(options: DatasetOptions) -> Session {
        let settings = ViewSettings { width: 100, height: 100, ..Default::default() };
        Session::new(
            Generation(1),
            Arc::new(dataset()),
            &options,
            settings,
            Arc::new(MemoryStore::new()),
            EmptyLabelConfig::default(),
        )
    }

    fn session() -> Session {
        session_with(DatasetOptions { cluster_field: Some("cluster".into()), label_field: None })
    }

    #[test]
    fn test_initial_state() {
        let s = session();
        assert_eq!(s.shown_points().len(), 9);
        assert_eq!(s.pixel_points().len(), 9);
        assert_eq!(s.zoom_range(), ZoomRange::new(0.0, 10.0, 0.0, 10.0));
        assert_eq!(s.legend().unwrap().title(), "cluster");
        assert_eq!(s.label_field(), Some("cluster"));
        assert!(s.selection().is_empty());
        assert_eq!(s.assignment().len(), 9);
    }

    #[test]
    fn test_invalid_cluster_field_falls_back() {
        let s = session_with(DatasetOptions { cluster_field: Some("nope".into()), label_field: Some("donor".into()) });
        assert_eq!(s.legend().unwrap().title(), "cluster");
        assert_eq!(s.label_field(), Some("donor"));
    }

    #[test]
    fn test_zoom_reprojects() {
        let mut s = session();
        s.zoom_to_rect((0.0, 0.0), (50.0, 50.0));
        // only the lower-left quadrant remains on screen
        assert_eq!(s.pixel_points().len(), 4);
        s.zoom_full();
        assert_eq!(s.pixel_points().len(), 9);

        let before = s.zoom_range();
        s.zoom_to_rect((10.0, 10.0), (10.0, 10.0));
        assert_eq!(s.zoom_range(), before);

        s.zoom_out();
        assert!(s.zoom_range().span_x() > before.span_x());
        s.wheel(-1.0);
        assert_eq!(s.pixel_points().len(), 9);
        s.wheel(1.0);
        s.zoom_in();
        s.zoom_in();
        // the grid corners have left the view
        assert_eq!(s.pixel_points().len(), 1);
    }

    #[test]
    fn test_filter_clears_selection() {
        let mut s = session();
        assert_eq!(s.select_rect((0, 0), (5, 100)), 3);
        assert_eq!(s.filter_selected(FilterMode::Hide), 6);
        assert!(s.selection().is_empty());
        assert_eq!(s.pixel_points().len(), 6);
        assert!(s.class_of("p00").is_none());

        // clearing the selection keeps the filter
        s.select_all_visible();
        s.select_none();
        assert_eq!(s.shown_points().len(), 6);

        assert_eq!(s.show_all(), 9);
    }

    #[test]
    fn test_filter_classes() {
        let mut s = session();
        let class_b = s.legend().unwrap().classes.iter().position(|c| c.label == "B").unwrap();
        assert_eq!(s.filter_classes(&[class_b], FilterMode::ShowOnly).unwrap(), 3);
        assert!(s.shown_points().iter().all(|p| p.id.starts_with("p1")));
        assert_eq!(s.filter_classes(&[99], FilterMode::Hide), Err(CoreError::UnknownClass(99)));
    }

    #[test]
    fn test_legend_click_selects_class() {
        let mut s = session();
        let class = s.class_of("p21").unwrap();
        assert_eq!(s.click_legend_class(class, false).unwrap(), 3);
        assert!(s.selection().iter().all(|id| s.class_of(id) == Some(class)));
        assert_eq!(s.click_legend_class(class, false).unwrap(), 0);
    }

    #[test]
    fn test_expression_counts_follow_filter() {
        let mut s = session();
        s.color_by_gene("CD3E").unwrap();
        let legend = s.legend().unwrap();
        assert_eq!(legend.classes.len(), 11);
        assert_eq!(legend.total_count(), 9);
        assert_eq!(legend.classes[0].count, 1);
        assert_eq!(s.color_of("p00"), Some(NULL_COLOR));

        s.select_by_ids(&["p00", "p01"]).unwrap();
        s.filter_selected(FilterMode::Hide);
        let legend = s.legend().unwrap();
        assert_eq!(legend.total_count(), 7);
        assert_eq!(legend.classes[0].count, 0);

        assert_eq!(s.color_by_gene("NOPE"), Err(CoreError::UnknownGene("NOPE".into())));
    }

    #[test]
    fn test_gene_intensities_follow_selection() {
        // CD3E is missing on p00 and 1..=8 on the others, bins 0,1,2,4,5,7,8,9
        let mut s = session();
        let all = s.gene_intensities();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].symbol, "CD3E");
        assert_eq!(all[0].bin, 4);
        assert_eq!(all[0].value, None);

        s.select_by_ids(&["p22"]).unwrap();
        assert_eq!(s.gene_intensities()[0].bin, 9);
        assert_eq!(s.gene_intensities()[0].value, Some(8.0));

        s.select_by_ids(&["p21", "p22"]).unwrap();
        assert_eq!(s.gene_intensities()[0].bin, 9);
        s.select_by_ids(&["p00", "p01"]).unwrap();
        assert_eq!(s.gene_intensities()[0].bin, 0);

        // hiding the selection leaves seven shown points and no selection
        s.filter_selected(FilterMode::Hide);
        assert_eq!(s.gene_intensities()[0].bin, 5);
        s.show_all();
        assert_eq!(s.gene_intensities()[0].bin, 4);
    }

    #[test]
    fn test_load_gene_list_replaces_genes() {
        let mut s = session();
        let gene = GeneInfo { id: "g2".into(), symbol: "MS4A1".into(), description: String::new() };
        let values = s.shown_points().iter().map(|p| (p.id.clone(), Some(p.x))).collect::<Vec<_>>();
        assert_eq!(s.load_gene_list(vec![ExpressionVector::new(gene, values, None)]), 1);

        assert_eq!(s.genes()[0].gene.symbol, "MS4A1");
        assert_eq!(s.gene_intensities()[0].symbol, "MS4A1");
        s.color_by_gene("g2").unwrap();
        assert_eq!(s.legend().unwrap().title(), "MS4A1 expression");
        assert_eq!(s.color_by_gene("CD3E"), Err(CoreError::UnknownGene("CD3E".into())));
    }

    #[test]
    fn test_too_many_values_keeps_previous_legend() {
        let mut s = session();
        let err = s.color_by_field("cellId");
        // nine distinct ids are fine; lower the limit to trigger the refusal
        assert!(err.is_ok());
        s.engine = ClassificationEngine::new(Arc::new(MemoryStore::new())).with_max_classes(2);
        assert!(matches!(s.color_by_field("cluster"), Err(CoreError::TooManyValues { .. })));
        assert_eq!(s.legend().unwrap().title(), "cellId");
        assert_eq!(s.color_by_field("missing"), Err(CoreError::UnknownField("missing".into())));
    }

    #[test]
    fn test_batch_recomputes_once() {
        let mut s = session();
        s.batch(|s| {
            s.transform.zoom_to_rect((0.0, 0.0), (50.0, 50.0));
            s.dirty.pixels = true;
            s.finish();
            // still stale inside the batch
            assert_eq!(s.pixel_points().len(), 9);
        });
        assert_eq!(s.pixel_points().len(), 4);
    }

    #[test]
    fn test_toggle_sort_and_export() {
        let mut s = session();
        let mode = s.toggle_sort().unwrap();
        assert_eq!(mode, SortMode::Name);
        assert!(s.legend().unwrap().is_sorted_by_name());

        assert_eq!(s.export_ids().len(), 9);
        s.select_by_ids(&["p11"]).unwrap();
        assert_eq!(s.export_ids(), vec![PointId::from("p11")]);
        assert_eq!(s.mark_selection(), Ok(1));
        assert_eq!(s.selection_summary()[0].values[0].value, "B");
    }

    #[test]
    fn test_cluster_labels() {
        let s = session();
        let labels = s.cluster_labels(None).unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels[1].label, "B");
        assert_eq!(labels[1].data, (5.0, 5.0));
        assert!(s.cluster_labels(Some("nope")).is_err());
    }
}
