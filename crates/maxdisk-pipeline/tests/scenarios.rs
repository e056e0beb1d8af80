//! Integration tests: synthetic masks run through packing and spine tracing.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use maxdisk_pipeline::{
    Mask, PackConfig, PipelineConfig, Point, Region, SpineConfig, SpineError, SpineOutcome,
    process, spine,
};

fn config(min_diameter: f64, with_spine: bool) -> PipelineConfig {
    PipelineConfig {
        pack: PackConfig::try_new(min_diameter, false).unwrap(),
        spine: with_spine.then(|| SpineConfig::try_new(10.0, 0.5).unwrap()),
        append_position_to_name: false,
    }
}

fn within(p: Point, cx: f64, cy: f64, r: f64) -> bool {
    (p.x - cx).hypot(p.y - cy) <= r
}

fn dumbbell() -> Mask {
    Mask::from_fn(140, 60, |x, y| {
        let p = Point::new(f64::from(x), f64::from(y));
        within(p, 30.0, 30.0, 20.0)
            || within(p, 110.0, 30.0, 20.0)
            || ((30..=110).contains(&x) && (26..=34).contains(&y))
    })
}

#[test]
fn filled_disk_yields_single_centred_disk() {
    let mask = Mask::from_fn(100, 100, |x, y| {
        within(Point::new(f64::from(x), f64::from(y)), 50.0, 50.0, 25.0)
    });
    let result = process(&mask, None, &config(0.0, false));
    assert_eq!(result.disks.len(), 1);
    let disk = &result.disks[0];
    assert!((disk.center.x - 50.0).abs() <= 1.0, "{disk:?}");
    assert!((disk.center.y - 50.0).abs() <= 1.0, "{disk:?}");
    assert!((disk.radius - 25.0).abs() <= 1.5, "{disk:?}");
}

#[test]
fn dumbbell_packs_both_ends_and_the_neck() {
    let result = process(&dumbbell(), None, &config(4.0, true));
    let disks = &result.disks;
    eprintln!("dumbbell disks: {disks:#?}");
    assert!(disks.len() >= 3);

    for end in &disks[..2] {
        assert!((end.radius - 20.5).abs() <= 1.5, "{end:?}");
        assert!(within(end.center, 30.0, 30.0, 2.0) || within(end.center, 110.0, 30.0, 2.0));
    }
    assert!(disks.iter().any(|d| {
        d.center.x > 50.0 && d.center.x < 90.0 && (d.center.y - 30.0).abs() <= 2.0
    }));

    for (i, a) in disks.iter().enumerate() {
        for b in &disks[i + 1..] {
            assert!(a.center.distance(b.center) >= a.radius + b.radius - 1.0);
        }
    }
}

#[test]
fn dumbbell_spine_runs_along_the_axis() {
    let mask = dumbbell();
    let result = process(&mask, None, &config(4.0, true));
    let spine = result.spine.spine().expect("dumbbell should yield a spine");
    let points = spine.polyline.points();
    eprintln!("dumbbell spine: {points:?}");

    assert!(points.iter().all(|p| (p.y - 30.0).abs() <= 2.0));
    assert!(points.windows(2).all(|w| w[0].x < w[1].x));
    assert!(points[0].x < 15.0);
    assert!(points[points.len() - 1].x > 125.0);

    // Both termini sit on foreground with background one step further out.
    for (end, inner) in [(points[0], points[1]), (points[points.len() - 1], points[points.len() - 2])] {
        let v = inner.vector_to(end);
        let u = Point::new(v.x / v.norm(), v.y / v.norm());
        assert!(mask.is_foreground_at(end));
        assert!(!mask.is_foreground_at(end.step(u, 1.0)));
    }
}

#[test]
fn disjoint_disks_have_no_adjacent_circles() {
    let mask = Mask::from_fn(80, 60, |x, y| {
        let p = Point::new(f64::from(x), f64::from(y));
        within(p, 20.0, 30.0, 15.0) || within(p, 52.0, 30.0, 15.0)
    });
    let result = process(&mask, None, &config(10.0, true));
    assert_eq!(result.disks.len(), 2);
    assert_eq!(
        result.spine,
        SpineOutcome::Failed(SpineError::NoAdjacentDisks)
    );
}

#[test]
fn elongated_rectangle_spine_follows_midline() {
    let mask = Mask::from_fn(240, 60, |x, y| (20..220).contains(&x) && (20..40).contains(&y));
    let result = process(&mask, None, &config(12.0, true));
    let spine = result.spine.spine().expect("rectangle should yield a spine");
    let points = spine.polyline.points();
    eprintln!("rectangle spine: {points:?}");

    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    assert!(min_x < 22.0);
    assert!(max_x > 217.0);
    let first = points[0];
    let last = points[points.len() - 1];
    assert!((first.y - 29.5).abs() < 2.0);
    assert!((last.y - 29.5).abs() < 2.0);
}

#[test]
fn spine_trace_is_deterministic() {
    let mask = dumbbell();
    let result = process(&mask, None, &config(4.0, false));
    let spine_config = SpineConfig::default();
    let a = spine::trace(&result.disks, &mask, &spine_config).unwrap();
    let b = spine::trace(&result.disks, &mask, &spine_config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn polygon_selection_replaces_mask() {
    // Empty mask: only the selection's own shape can hold disks.
    let mask = Mask::new(100, 100);
    let region = Region::Polygon(vec![
        Point::new(20.0, 20.0),
        Point::new(60.0, 20.0),
        Point::new(60.0, 60.0),
        Point::new(20.0, 60.0),
    ]);
    let selection = PipelineConfig {
        pack: PackConfig::try_new(10.0, true).unwrap(),
        ..PipelineConfig::default()
    };
    let result = process(&mask, Some(&region), &selection);
    assert!(!result.disks.is_empty());
    let disk = &result.disks[0];
    assert!(within(disk.center, 40.0, 40.0, 1.0), "{disk:?}");
    assert!((disk.radius - 20.0).abs() <= 1.5);

    let restricted = process(&mask, Some(&region), &config(10.0, false));
    assert!(restricted.disks.is_empty());
}
