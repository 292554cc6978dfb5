//! Positions of per-class text labels drawn over the cloud

use indexmap::IndexMap;

use crate::dataset::MetaTable;
use crate::point::Point;
use crate::viewport::ViewportTransform;

/// A class label and where to draw it
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterMidpoint {
    pub label: String,
    /// Floored mean data-space coordinate of the class's points
    pub data: (f64, f64),
    /// `data` projected through the current zoom range
    pub pixel: (i32, i32),
}

/// Midpoint of every distinct value of `field` over `all_points`, in
/// encounter order. Labels whose midpoint falls outside the current zoom
/// range are left out.
pub fn cluster_midpoints(
    meta: &MetaTable,
    all_points: &[Point],
    field: usize,
    transform: &ViewportTransform,
) -> Vec<ClusterMidpoint> {
    let mut sums: IndexMap<&str, (f64, f64, usize)> = IndexMap::new();
    for p in all_points {
        let entry = sums.entry(meta.class_value(&p.id, field)).or_insert((0.0, 0.0, 0));
        entry.0 += p.x;
        entry.1 += p.y;
        entry.2 += 1;
    }

    sums.into_iter()
        .filter_map(|(label, (sx, sy, n))| {
            let data = ((sx / n as f64).floor(), (sy / n as f64).floor());
            let pixel = transform.project(data.0, data.1)?;
            Some(ClusterMidpoint { label: label.to_string(), data, pixel })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::PointId;
    use crate::viewport::ZoomRange;

    #[test]
    fn test_midpoints_are_floored_means() {
        let points = vec![
            Point::new("a", 0.0, 0.0),
            Point::new("b", 3.0, 3.0),
            Point::new("c", 10.0, 10.0),
            Point::new("d", 9.0, 10.0),
        ];
        let meta = MetaTable::new(
            vec!["cellId".into(), "cluster".into()],
            vec![
                (PointId::from("a"), vec!["a".into(), "x".into()]),
                (PointId::from("b"), vec!["b".into(), "x".into()]),
                (PointId::from("c"), vec!["c".into(), "y".into()]),
            ],
        );
        let transform = ViewportTransform::new(ZoomRange::new(0.0, 10.0, 0.0, 10.0), 100, 100);
        let mids = cluster_midpoints(&meta, &points, 1, &transform);

        assert_eq!(mids.len(), 3);
        assert_eq!(mids[0].label, "x");
        assert_eq!(mids[0].data, (1.0, 1.0));
        assert_eq!(mids[0].pixel, (14, 14));
        assert_eq!(mids[1].label, "y");
        assert_eq!(mids[2].label, "(missingMetaData)");
        assert_eq!(mids[2].data, (9.0, 10.0));
    }

    #[test]
    fn test_offscreen_midpoints_are_omitted() {
        let points = vec![Point::new("a", 0.0, 0.0), Point::new("b", 10.0, 10.0)];
        let meta = MetaTable::new(
            vec!["cellId".into(), "cluster".into()],
            vec![
                (PointId::from("a"), vec!["a".into(), "left".into()]),
                (PointId::from("b"), vec!["b".into(), "right".into()]),
            ],
        );
        let mut transform = ViewportTransform::new(ZoomRange::new(0.0, 10.0, 0.0, 10.0), 100, 100);
        transform.set_zoom_range(ZoomRange::new(5.0, 10.0, 5.0, 10.0));
        let mids = cluster_midpoints(&meta, &points, 1, &transform);
        assert_eq!(mids.len(), 1);
        assert_eq!(mids[0].label, "right");
    }
}
