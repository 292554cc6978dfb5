//! Classification engine: turns an annotation field or a gene into a legend
//! of discrete colored classes and assigns every point to one of them.

mod labels;
mod natural;
mod palette;

pub use labels::{cluster_midpoints, ClusterMidpoint};
pub use natural::{looks_numeric, natural_cmp};
pub use palette::{categorical_palette, gradient_palette, make_palette, Rgb, NULL_COLOR};

use std::sync::Arc;
use ahash::AHashMap;
use indexmap::IndexMap;
use serde::{Serialize, Deserialize};
use tracing::{debug, warn};

use crate::dataset::{ColorTable, ExpressionVector, MetaTable};
use crate::deciles::{DecileBoundaries, ExprBin, BIN_COUNT};
use crate::empty::EmptyLabelConfig;
use crate::error::{CoreError, Result};
use crate::point::{Point, PointId};
use crate::store::{sort_key, PreferenceStore};

/// Default maximum number of classes a categorical legend may have
pub const MAX_LEGEND_CLASSES: usize = 100;

/// Label of the reserved first class of expression legends
pub const NO_VALUE_LABEL: &str = "No Value";

/// Order of legend classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortMode {
    /// Natural order of the labels
    Name,
    /// Descending count, ties in encounter order
    Frequency,
}

impl SortMode {
    /// Value persisted in the preference store
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::Name => "name",
            SortMode::Frequency => "count",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(SortMode::Name),
            "count" | "freq." => Some(SortMode::Frequency),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortMode::Name => SortMode::Frequency,
            SortMode::Frequency => SortMode::Name,
        }
    }
}

/// Value used to test class membership
#[derive(Debug, Clone, PartialEq)]
pub enum ClassKey {
    /// Categorical class: the field value
    Value(String),
    /// Expression class: a decile bin or the no-value bin
    Bin(ExprBin),
}

/// One color/label/count entry of a legend
#[derive(Debug, Clone, PartialEq)]
pub struct LegendClass {
    pub color: Rgb,
    pub default_color: Rgb,
    pub label: String,
    pub count: usize,
    pub class_key: ClassKey,
    /// Key of a persisted manual color override
    pub color_storage_key: String,
}

/// What a legend classifies by
#[derive(Debug, Clone)]
pub enum LegendKind {
    Categorical {
        field_index: usize,
        field_name: String,
    },
    Expression {
        vector: Arc<ExpressionVector>,
        deciles: DecileBoundaries,
    },
}

/// The active coloring scheme
#[derive(Debug, Clone)]
pub struct Legend {
    pub kind: LegendKind,
    pub classes: Vec<LegendClass>,
    pub sort: SortMode,
    /// Sort mode chosen by auto-detection, used to decide whether a sort
    /// preference needs to be stored
    pub default_sort: SortMode,
    /// Classes are ordered values and use a gradient palette
    pub use_gradient: bool,
}

impl Legend {
    /// Title shown above the legend
    pub fn title(&self) -> String {
        match &self.kind {
            LegendKind::Categorical { field_name, .. } => field_name.replace('_', " "),
            LegendKind::Expression { vector, .. } => format!("{} expression", vector.gene.symbol),
        }
    }

    pub fn is_sorted_by_name(&self) -> bool {
        self.sort == SortMode::Name
    }

    /// Sum of all class counts
    pub fn total_count(&self) -> usize {
        self.classes.iter().map(|c| c.count).sum()
    }
}

/// Point -> legend class index. Points without a class are absent.
#[derive(Debug, Clone, Default)]
pub struct ClassAssignment {
    classes: IndexMap<PointId, usize>,
}

impl ClassAssignment {
    /// Class of a point, `None` when unassigned
    pub fn class_of(&self, id: &str) -> Option<usize> {
        self.classes.get(id).copied()
    }

    /// Assigned points in point order
    pub fn iter(&self) -> impl Iterator<Item = (&PointId, usize)> {
        self.classes.iter().map(|(id, class)| (id, *class))
    }

    /// Ids of all points whose class is in `class_indices`, in point order
    pub fn points_in<'a>(&'a self, class_indices: &'a [usize]) -> impl Iterator<Item = &'a PointId> + 'a {
        self.classes
            .iter()
            .filter(move |(_, class)| class_indices.contains(class))
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builds legends and resolves their colors
pub struct ClassificationEngine {
    store: Arc<dyn PreferenceStore>,
    fixed_colors: ColorTable,
    empty_labels: EmptyLabelConfig,
    max_classes: usize,
}

impl ClassificationEngine {
    /// Create a new engine persisting colors and sort preferences in `store`
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            fixed_colors: ColorTable::default(),
            empty_labels: EmptyLabelConfig::default(),
            max_classes: MAX_LEGEND_CLASSES,
        }
    }

    /// Use dataset-supplied label colors
    pub fn with_fixed_colors(mut self, colors: ColorTable) -> Self {
        self.fixed_colors = colors;
        self
    }

    pub fn with_empty_labels(mut self, config: EmptyLabelConfig) -> Self {
        self.empty_labels = config;
        self
    }

    pub fn with_max_classes(mut self, max_classes: usize) -> Self {
        self.max_classes = max_classes;
        self
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    /// Build a legend for a metadata field.
    ///
    /// Values are tallied over `all_points`, not just the shown ones. Without
    /// an explicit `sort`, a stored preference for the field is used, then
    /// auto-detection: mostly numeric labels sort by name with a gradient
    /// palette, anything else by frequency. Fields whose name contains
    /// "luster" default to frequency order with distinct hues.
    ///
    /// Cluster fields never get the gradient, even when their labels are
    /// numbers: cluster ids are names, and neighbouring ids must stay
    /// distinguishable. An explicit name sort changes the order only.
    pub fn build_categorical_legend(
        &self,
        meta: &MetaTable,
        all_points: &[Point],
        field_index: usize,
        sort: Option<SortMode>,
    ) -> Result<Legend> {
        let field_name = meta
            .field_name(field_index)
            .ok_or_else(|| CoreError::UnknownField(field_index.to_string()))?
            .to_string();

        let mut tally: IndexMap<&str, usize> = IndexMap::new();
        for p in all_points {
            *tally.entry(meta.class_value(&p.id, field_index)).or_insert(0) += 1;
        }

        if tally.len() > self.max_classes {
            warn!("Cannot color on field '{}': {} different values", field_name, tally.len());
            return Err(CoreError::TooManyValues {
                field: field_name,
                count: tally.len(),
                limit: self.max_classes,
            });
        }

        let numeric = tally.keys().filter(|label| looks_numeric(label)).count();
        let mostly_numeric = tally.len() >= 4 && numeric + 1 >= tally.len();
        let is_cluster_field = field_name.to_lowercase().contains("luster");

        let default_sort = if !is_cluster_field && mostly_numeric {
            SortMode::Name
        } else {
            SortMode::Frequency
        };
        let stored = self
            .store
            .get(&sort_key(&field_name))
            .and_then(|s| SortMode::parse(&s));
        let sort_mode = sort.or(stored).unwrap_or(default_sort);
        let use_gradient = mostly_numeric && !is_cluster_field;

        let mut entries: Vec<(&str, usize)> = tally.into_iter().collect();
        sort_entries(&mut entries, sort_mode);

        let palette = make_palette(entries.len(), use_gradient);
        let classes = entries
            .into_iter()
            .zip(palette)
            .map(|((label, count), palette_color)| {
                let neutral = self.empty_labels.is_empty_label(label);
                let default_color = if neutral { NULL_COLOR } else { palette_color };
                let color_storage_key = format!("{}|{}", field_name, label);
                LegendClass {
                    color: self.resolve_color(&color_storage_key, label, default_color, neutral),
                    default_color,
                    label: label.to_string(),
                    count,
                    class_key: ClassKey::Value(label.to_string()),
                    color_storage_key,
                }
            })
            .collect::<Vec<_>>();

        debug!("Built legend for '{}' with {} classes sorted by {}", field_name, classes.len(), sort_mode.as_str());

        Ok(Legend {
            kind: LegendKind::Categorical { field_index, field_name },
            classes,
            sort: sort_mode,
            default_sort,
            use_gradient,
        })
    }

    /// Build a legend for a gene: a "No Value" class followed by the ten
    /// decile bins. Counts cover `shown_points` only.
    pub fn build_expression_legend(
        &self,
        vector: Arc<ExpressionVector>,
        deciles: DecileBoundaries,
        shown_points: &[Point],
    ) -> Legend {
        let mut counts = [0usize; BIN_COUNT + 1];
        for p in shown_points {
            counts[deciles.bin_of(vector.get(&p.id)).class_index()] += 1;
        }

        let symbol = vector.gene.symbol.clone();
        let mut classes = Vec::with_capacity(BIN_COUNT + 1);

        let no_value_key = format!("{}|null", symbol);
        classes.push(LegendClass {
            color: self.resolve_color(&no_value_key, NO_VALUE_LABEL, NULL_COLOR, false),
            default_color: NULL_COLOR,
            label: NO_VALUE_LABEL.to_string(),
            count: counts[0],
            class_key: ClassKey::Bin(ExprBin::NoValue),
            color_storage_key: no_value_key,
        });

        for (bin, default_color) in gradient_palette(BIN_COUNT).into_iter().enumerate() {
            let label = deciles.label(bin);
            let color_storage_key = format!("{}|{}", symbol, label);
            classes.push(LegendClass {
                color: self.resolve_color(&color_storage_key, &label, default_color, false),
                default_color,
                label,
                count: counts[bin + 1],
                class_key: ClassKey::Bin(ExprBin::Decile(bin)),
                color_storage_key,
            });
        }

        Legend {
            kind: LegendKind::Expression { vector, deciles },
            classes,
            sort: SortMode::Name,
            default_sort: SortMode::Name,
            use_gradient: true,
        }
    }

    /// Rebuild a legend of the same kind and sort order, e.g. after the
    /// shown points changed
    pub fn rebuild(&self, legend: &Legend, meta: &MetaTable, all_points: &[Point], shown_points: &[Point]) -> Result<Legend> {
        match &legend.kind {
            LegendKind::Categorical { field_index, .. } => {
                self.build_categorical_legend(meta, all_points, *field_index, Some(legend.sort))
            }
            LegendKind::Expression { vector, deciles } => {
                Ok(self.build_expression_legend(vector.clone(), *deciles, shown_points))
            }
        }
    }

    /// Map every point to the index of its legend class
    pub fn assign_classes(&self, legend: &Legend, points: &[Point], meta: &MetaTable) -> ClassAssignment {
        let mut classes = IndexMap::with_capacity(points.len());
        match &legend.kind {
            LegendKind::Categorical { field_index, .. } => {
                let by_value: AHashMap<&str, usize> = legend
                    .classes
                    .iter()
                    .enumerate()
                    .filter_map(|(i, c)| match &c.class_key {
                        ClassKey::Value(v) => Some((v.as_str(), i)),
                        ClassKey::Bin(_) => None,
                    })
                    .collect();
                for p in points {
                    if let Some(&class) = by_value.get(meta.class_value(&p.id, *field_index)) {
                        classes.insert(p.id.clone(), class);
                    }
                }
            }
            LegendKind::Expression { vector, deciles } => {
                for p in points {
                    let bin = deciles.bin_of(vector.get(&p.id));
                    classes.insert(p.id.clone(), bin.class_index());
                }
            }
        }
        ClassAssignment { classes }
    }

    /// Flip name/frequency order and persist the choice for the field.
    ///
    /// Returns the sort mode the legend should be rebuilt with. Expression
    /// legends have a fixed order.
    pub fn toggle_sort(&self, legend: &Legend) -> SortMode {
        match &legend.kind {
            LegendKind::Categorical { field_name, .. } => {
                let next = legend.sort.toggled();
                self.store
                    .set_or_clear(&sort_key(field_name), next.as_str(), legend.default_sort.as_str());
                next
            }
            LegendKind::Expression { .. } => legend.sort,
        }
    }

    /// Set a manual color for one class and persist it.
    ///
    /// Choosing the class's default color removes the override. Classes with
    /// empty-looking labels always keep the neutral color.
    pub fn set_class_color(&self, legend: &mut Legend, class_index: usize, color: Rgb) -> Result<()> {
        let class = legend
            .classes
            .get_mut(class_index)
            .ok_or(CoreError::UnknownClass(class_index))?;
        if self.is_neutral(class) {
            return Ok(());
        }
        self.store
            .set_or_clear(&class.color_storage_key, &color.to_hex(), &class.default_color.to_hex());
        class.color = color;
        Ok(())
    }

    /// Drop every manual color of the legend. Dataset-supplied colors stay.
    pub fn reset_colors(&self, legend: &mut Legend) {
        for class in &mut legend.classes {
            self.store.remove(&class.color_storage_key);
            let neutral = self.is_neutral(class);
            class.color = self.resolve_color(&class.color_storage_key, &class.label, class.default_color, neutral);
        }
    }

    fn is_neutral(&self, class: &LegendClass) -> bool {
        matches!(class.class_key, ClassKey::Value(_)) && self.empty_labels.is_empty_label(&class.label)
    }

    /// Color of a class: manual override, then dataset color, then default
    fn resolve_color(&self, storage_key: &str, label: &str, default: Rgb, neutral: bool) -> Rgb {
        if neutral {
            return NULL_COLOR;
        }
        self.store
            .get(storage_key)
            .and_then(|hex| Rgb::from_hex(&hex))
            .or_else(|| self.fixed_colors.get(label).copied())
            .unwrap_or(default)
    }
}

fn sort_entries(entries: &mut [(&str, usize)], mode: SortMode) {
    match mode {
        SortMode::Name => entries.sort_by(|a, b| natural_cmp(a.0, b.0)),
        // stable: equal counts keep encounter order
        SortMode::Frequency => entries.sort_by(|a, b| b.1.cmp(&a.1)),
    }
}
