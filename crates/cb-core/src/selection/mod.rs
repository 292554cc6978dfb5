//! Selection, marking and filtering over point sets

mod summary;

pub use summary::{gene_intensities, selection_summary, FieldSummary, GeneIntensity, ValueCount};

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Deserialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::legend::ClassAssignment;
use crate::point::{PixelPoint, Point, PointId};

/// Default maximum number of points that can be marked at once
pub const MAX_MARKED: usize = 100;

/// Set of selected point ids, in selection order. Empty means nothing is
/// selected.
pub type SelectionSet = IndexSet<PointId>;

/// How a filter combines an id set with the points it is applied to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    /// Drop the given points
    Hide,
    /// Keep only the given points
    ShowOnly,
    /// Drop the filter
    ShowAll,
}

/// Every point whose pixel coordinate lies within the rectangle spanned by
/// two corners, bounds included
pub fn rectangle_select(p1: (i32, i32), p2: (i32, i32), pixel_points: &[PixelPoint]) -> SelectionSet {
    let (min_x, max_x) = (p1.0.min(p2.0), p1.0.max(p2.0));
    let (min_y, max_y) = (p1.1.min(p2.1), p1.1.max(p2.1));
    pixel_points
        .iter()
        .filter(|p| (min_x..=max_x).contains(&p.x) && (min_y..=max_y).contains(&p.y))
        .map(|p| p.id.clone())
        .collect()
}

/// Every point assigned to one of `class_indices`. With `additive` the
/// result is the union with `current`.
pub fn class_select(
    assignment: &ClassAssignment,
    class_indices: &[usize],
    additive: bool,
    current: &SelectionSet,
) -> SelectionSet {
    let mut selection = if additive { current.clone() } else { SelectionSet::new() };
    selection.extend(assignment.points_in(class_indices).cloned());
    selection
}

/// Apply a filter to `base`, keeping the order of the surviving points.
/// `ShowAll` ignores `ids` and `base` and returns `all_points`.
pub fn apply_filter(mode: FilterMode, ids: &SelectionSet, base: &[Point], all_points: &[Point]) -> Vec<Point> {
    match mode {
        FilterMode::Hide => base.iter().filter(|p| !ids.contains(&*p.id)).cloned().collect(),
        FilterMode::ShowOnly => base.iter().filter(|p| ids.contains(&*p.id)).cloned().collect(),
        FilterMode::ShowAll => all_points.to_vec(),
    }
}

/// Selected and marked points of one session
#[derive(Debug, Clone)]
pub struct SelectionIndex {
    selected: SelectionSet,
    marked: IndexSet<PointId>,
    last_clicked_class: Option<usize>,
    max_marked: usize,
}

impl Default for SelectionIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionIndex {
    pub fn new() -> Self {
        Self::with_max_marked(MAX_MARKED)
    }

    pub fn with_max_marked(max_marked: usize) -> Self {
        Self {
            selected: SelectionSet::new(),
            marked: IndexSet::new(),
            last_clicked_class: None,
            max_marked,
        }
    }

    pub fn max_marked(&self) -> usize {
        self.max_marked
    }

    pub fn selected(&self) -> &SelectionSet {
        &self.selected
    }

    pub fn marked(&self) -> &IndexSet<PointId> {
        &self.marked
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Replace the selection
    pub fn set(&mut self, selection: SelectionSet) {
        self.selected = selection;
        self.last_clicked_class = None;
    }

    /// Select nothing. Filters and marks are untouched.
    pub fn clear(&mut self) {
        self.set(SelectionSet::new());
    }

    pub fn select_rect(&mut self, p1: (i32, i32), p2: (i32, i32), pixel_points: &[PixelPoint]) {
        self.set(rectangle_select(p1, p2, pixel_points));
    }

    /// Select every point currently on screen
    pub fn select_all_visible(&mut self, pixel_points: &[PixelPoint]) {
        self.set(pixel_points.iter().map(|p| p.id.clone()).collect());
    }

    /// Select points by id. Blank entries are skipped. If any id is not
    /// among `shown_points` nothing is selected and the unknown ids are
    /// returned as an error.
    pub fn select_by_ids<S: AsRef<str>>(&mut self, ids: &[S], shown_points: &[Point]) -> Result<usize> {
        let shown: IndexMap<&str, &PointId> = shown_points.iter().map(|p| (&*p.id, &p.id)).collect();
        let wanted: Vec<&str> = ids.iter().map(|s| s.as_ref().trim()).filter(|s| !s.is_empty()).collect();

        let unknown: Vec<String> = wanted
            .iter()
            .filter(|id| !shown.contains_key(*id))
            .map(|id| id.to_string())
            .collect();
        if !unknown.is_empty() {
            self.clear();
            return Err(CoreError::UnknownIds(unknown));
        }

        let selection: SelectionSet = wanted
            .iter()
            .filter_map(|id| shown.get(*id).map(|pid| (*pid).clone()))
            .collect();
        let count = selection.len();
        self.set(selection);
        Ok(count)
    }

    /// Select the points of a legend class.
    ///
    /// Clicking the same class twice in a row clears the selection.
    pub fn click_legend_class(&mut self, assignment: &ClassAssignment, class_index: usize, additive: bool) {
        if self.last_clicked_class == Some(class_index) {
            self.clear();
            return;
        }
        let selection = class_select(assignment, &[class_index], additive, &self.selected);
        self.selected = selection;
        self.last_clicked_class = Some(class_index);
    }

    /// Forget the last clicked legend class, e.g. after the legend changed
    pub fn reset_class_click(&mut self) {
        self.last_clicked_class = None;
    }

    /// Add the selected points to the marked set
    pub fn mark(&mut self) -> Result<usize> {
        if self.selected.len() > self.max_marked {
            return Err(CoreError::TooManyMarked {
                count: self.selected.len(),
                limit: self.max_marked,
            });
        }
        self.marked.extend(self.selected.iter().cloned());
        info!("Marked {} points, {} in total", self.selected.len(), self.marked.len());
        Ok(self.marked.len())
    }

    pub fn clear_marks(&mut self) {
        self.marked.clear();
    }

    /// Ids to export: the selection in selection order, or every on-screen
    /// point when nothing is selected
    pub fn export_ids(&self, pixel_points: &[PixelPoint]) -> Vec<PointId> {
        if self.selected.is_empty() {
            debug!("Nothing selected, exporting {} visible ids", pixel_points.len());
            pixel_points.iter().map(|p| p.id.clone()).collect()
        } else {
            self.selected.iter().cloned().collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::MetaTable;
    use crate::legend::{ClassificationEngine, SortMode};
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn pixels() -> Vec<PixelPoint> {
        [("a", 5, 5), ("b", 95, 5), ("c", 5, 95), ("d", 50, 50)]
            .into_iter()
            .map(|(id, x, y)| PixelPoint { id: PointId::from(id), x, y })
            .collect()
    }

    fn points(ids: &[&str]) -> Vec<Point> {
        ids.iter().map(|id| Point::new(*id, 0.0, 0.0)).collect()
    }

    fn ids(set: &SelectionSet) -> Vec<&str> {
        set.iter().map(|id| &**id).collect()
    }

    fn assignment() -> ClassAssignment {
        let meta = MetaTable::new(
            vec!["cellId".into(), "type".into()],
            [("a", "T"), ("b", "B"), ("c", "T"), ("d", "NK")]
                .into_iter()
                .map(|(id, v)| (PointId::from(id), vec![id.to_string(), v.to_string()])),
        );
        let all = points(&["a", "b", "c", "d"]);
        let engine = ClassificationEngine::new(Arc::new(MemoryStore::new()));
        let legend = engine.build_categorical_legend(&meta, &all, 1, Some(SortMode::Frequency)).unwrap();
        engine.assign_classes(&legend, &all, &meta)
    }

    #[test]
    fn test_rectangle_bounds_are_inclusive() {
        let sel = rectangle_select((50, 50), (5, 5), &pixels());
        assert_eq!(ids(&sel), vec!["a", "d"]);
        let all = rectangle_select((0, 0), (100, 100), &pixels());
        assert_eq!(all.len(), 4);
        assert!(rectangle_select((6, 6), (49, 49), &pixels()).is_empty());
    }

    #[test]
    fn test_class_select() {
        let ca = assignment();
        // frequency order: T(2), B, NK
        let t = class_select(&ca, &[0], false, &SelectionSet::new());
        assert_eq!(ids(&t), vec!["a", "c"]);
        assert!(t.iter().all(|id| ca.class_of(id) == Some(0)));

        let current: SelectionSet = [PointId::from("d")].into_iter().collect();
        let union = class_select(&ca, &[1], true, &current);
        assert_eq!(ids(&union), vec!["d", "b"]);
        let replaced = class_select(&ca, &[1], false, &current);
        assert_eq!(ids(&replaced), vec!["b"]);
    }

    #[test]
    fn test_filters_preserve_order() {
        let all = points(&["a", "b", "c", "d", "e"]);
        let set: SelectionSet = ["d", "b"].into_iter().map(PointId::from).collect();

        let hidden = apply_filter(FilterMode::Hide, &set, &all, &all);
        assert_eq!(hidden.iter().map(|p| &*p.id).collect::<Vec<_>>(), vec!["a", "c", "e"]);

        let only = apply_filter(FilterMode::ShowOnly, &set, &all, &all);
        assert_eq!(only.iter().map(|p| &*p.id).collect::<Vec<_>>(), vec!["b", "d"]);

        let back = apply_filter(FilterMode::ShowAll, &set, &only, &all);
        assert_eq!(back, all);
    }

    #[test]
    fn test_clicking_a_class_twice_clears() {
        let ca = assignment();
        let mut index = SelectionIndex::new();
        index.click_legend_class(&ca, 0, false);
        assert_eq!(index.len(), 2);
        index.click_legend_class(&ca, 2, true);
        assert_eq!(index.len(), 3);
        index.click_legend_class(&ca, 2, true);
        assert!(index.is_empty());
    }

    #[test]
    fn test_select_by_ids() {
        let shown = points(&["a", "b", "c"]);
        let mut index = SelectionIndex::new();
        assert_eq!(index.select_by_ids(&["c", " ", "a"], &shown), Ok(2));
        assert_eq!(ids(index.selected()), vec!["c", "a"]);

        let err = index.select_by_ids(&["a", "zz", "yy"], &shown).unwrap_err();
        assert_eq!(err, CoreError::UnknownIds(vec!["zz".into(), "yy".into()]));
        assert!(index.is_empty());
    }

    #[test]
    fn test_marking_is_limited() {
        let mut index = SelectionIndex::with_max_marked(2);
        index.select_all_visible(&pixels()[..2]);
        assert_eq!(index.mark(), Ok(2));

        index.select_all_visible(&pixels());
        assert_eq!(index.mark(), Err(CoreError::TooManyMarked { count: 4, limit: 2 }));
        assert_eq!(index.marked().len(), 2);

        index.clear_marks();
        assert!(index.marked().is_empty());
    }

    #[test]
    fn test_export_falls_back_to_visible() {
        let mut index = SelectionIndex::new();
        assert_eq!(index.export_ids(&pixels()).len(), 4);
        index.select_rect((0, 0), (10, 10), &pixels());
        assert_eq!(index.export_ids(&pixels()), vec![PointId::from("a")]);
    }
}
