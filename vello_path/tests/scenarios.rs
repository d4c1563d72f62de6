// Copyright 2025 the Vello Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end tests through the public API.

use std::f64::consts::PI;

use vello_path::{shapes, Cap, Command, Config, Fill, Join, Path, Point, Rect, Stroke, SvgArc};

fn parse(data: &str) -> Path {
    match data.parse() {
        Ok(path) => path,
        Err(err) => panic!("failed to parse {data:?}: {err}"),
    }
}

fn assert_rect_near(a: Rect, b: Rect, tolerance: f64) {
    let d = [a.x0 - b.x0, a.y0 - b.y0, a.x1 - b.x1, a.y1 - b.y1];
    assert!(
        d.iter().all(|d| d.abs() <= tolerance),
        "{a:?} != {b:?} (±{tolerance})"
    );
}

fn all_finite(path: &Path) -> bool {
    path.commands().iter().all(|cmd| match *cmd {
        Command::MoveTo(p) | Command::LineTo(p) => p.is_finite(),
        Command::QuadTo(c, p) => c.is_finite() && p.is_finite(),
        Command::CubicTo(c1, c2, p) => c1.is_finite() && c2.is_finite() && p.is_finite(),
        Command::ArcTo { rx, ry, end, .. } => rx.is_finite() && ry.is_finite() && end.is_finite(),
        Command::Close => true,
    })
}

#[test]
fn stroked_square_has_two_contours() {
    let config = Config::default();
    let square = parse("M0 0L2 0L2 2L0 2z");
    for join in [Join::Bevel, Stroke::default().join] {
        let style = Stroke::new(1.0).with_caps(Cap::Butt).with_join(join);
        let outline = square.stroke(&style, &config);

        let mut contours = outline.split();
        assert_eq!(contours.len(), 2);
        assert!(contours.iter().all(Path::is_closed));
        contours.sort_by(|a, b| b.bounds().width().total_cmp(&a.bounds().width()));
        assert_rect_near(
            contours[0].bounds(),
            Rect::new(-0.5, -0.5, 2.5, 2.5),
            1e-9,
        );
        assert_rect_near(contours[1].bounds(), Rect::new(0.5, 0.5, 1.5, 1.5), 1e-9);

        assert!(outline.contains(Point::new(0.0, 1.0), Fill::NonZero, &config));
        assert!(!outline.contains(Point::new(1.0, 1.0), Fill::NonZero, &config));
        assert!(!outline.contains(Point::new(1.0, 1.0), Fill::EvenOdd, &config));
        // Only the miter reaches into the corner.
        let corner = outline.contains(Point::new(-0.4, -0.4), Fill::NonZero, &config);
        assert_eq!(corner, join != Join::Bevel);
    }
}

#[test]
fn semicircle_from_svg_to_quads() {
    let path = parse("A100 100 0 0 0 200 0");
    assert_eq!(path.commands()[0], Command::MoveTo(Point::ZERO));

    let quads = path.replace_arcs(&Config::default());
    assert!(quads
        .commands()
        .iter()
        .all(|cmd| !matches!(cmd, Command::ArcTo { .. })));
    assert_eq!(
        quads.commands().last().and_then(Command::end),
        Some(Point::new(200.0, 0.0))
    );
    let bounds = quads.bounds();
    assert!((bounds.height() - 100.0).abs() < 1.0, "{bounds:?}");
    assert!((bounds.width() - 200.0).abs() < 1e-9, "{bounds:?}");
}

#[test]
fn arc_with_coinciding_end_points() {
    let arc = SvgArc {
        start: Point::new(3.0, 4.0),
        end: Point::new(3.0, 4.0),
        rx: 5.0,
        ry: 2.0,
        rotation: 0.3,
        large_arc: true,
        sweep: false,
    };
    let center = arc.to_center();
    assert_eq!(center.center, Point::new(3.0, 4.0));
    assert_eq!(center.theta0, 0.0);
    assert_eq!(center.theta1, 0.0);
}

#[test]
fn arc_parametrizations_agree() {
    let start = Point::new(1.0, 2.0);
    let end = Point::new(4.0, 3.0);
    for (large_arc, sweep) in [(false, false), (false, true), (true, false), (true, true)] {
        let arc = SvgArc {
            start,
            end,
            rx: 3.0,
            ry: 2.0,
            rotation: PI / 6.0,
            large_arc,
            sweep,
        };
        let center = arc.to_center();
        assert!(center.pos(center.theta0).is_near(start, 1e-9));
        assert!(center.pos(center.theta1).is_near(end, 1e-9));
        let delta = center.theta1 - center.theta0;
        assert_eq!(delta.abs() > PI, large_arc, "{large_arc} {sweep}");
        assert_eq!(delta > 0.0, sweep, "{large_arc} {sweep}");
    }
}

#[test]
fn stroked_closed_paths_stay_closed() {
    let config = Config::default();
    let paths = [
        shapes::circle((0.0, 0.0), 5.0),
        shapes::rounded_rectangle((0.0, 0.0), 10.0, 4.0, 1.0),
        parse("M0 0C10 0 0 10 10 10Q15 5 10 0z"),
        shapes::regular_polygon(5, (0.0, 0.0), 3.0, 0.0),
    ];
    let joins = [
        Join::Round,
        Join::Bevel,
        Join::MiterClip { limit: 2.0 },
        Stroke::default().join,
    ];
    for path in &paths {
        for cap in [Cap::Butt, Cap::Round, Cap::Square] {
            for join in joins {
                let style = Stroke::new(1.5).with_caps(cap).with_join(join);
                let outline = path.stroke(&style, &config);
                assert!(!outline.is_empty());
                assert!(all_finite(&outline));
                assert!(outline.split().iter().all(Path::is_closed), "{path}");
            }
        }
    }
}

#[test]
fn stroked_open_paths_are_single_contours() {
    let config = Config::default();
    let path = parse("M0 0L10 0C15 0 15 5 10 5A3 3 0 0 1 4 5");
    for cap in [Cap::Butt, Cap::Round, Cap::Square] {
        let outline = path.stroke(&Stroke::new(1.0).with_caps(cap), &config);
        let contours = outline.split();
        assert_eq!(contours.len(), 1, "{outline}");
        assert!(contours[0].is_closed());
        assert!(outline.contains(Point::new(5.0, 0.25), Fill::NonZero, &config));
        assert!(!outline.contains(Point::new(5.0, 2.5), Fill::NonZero, &config));
    }
}

#[test]
fn dashes_cover_the_path() {
    let path = parse("M0 0L10 0C15 0 15 5 10 5A3 3 0 0 1 4 5Q0 5 0 0z");
    let total = path.length();
    for offset in [-5.5, -1.0, 0.0, 0.5, 2.7, 13.0] {
        let on = path.dash(offset, &[2.0, 2.0]).length();
        let off = path.dash(offset + 2.0, &[2.0, 2.0]).length();
        assert!(
            (on + off - total).abs() < 1e-3 * total,
            "offset {offset}: {on} + {off} != {total}"
        );
    }
}

#[test]
fn dashed_strokes() {
    let config = Config::default();
    let line = parse("M0 0L20 0");
    let style = Stroke::new(2.0).with_dashes(0.0, [4.0, 4.0]);
    let outline = line.stroke(&style, &config);
    let contours = outline.split();
    assert_eq!(contours.len(), 3);
    assert!(outline.contains(Point::new(2.0, 0.0), Fill::NonZero, &config));
    assert!(!outline.contains(Point::new(6.0, 0.0), Fill::NonZero, &config));
    assert!(outline.contains(Point::new(18.0, 0.5), Fill::NonZero, &config));
}

#[test]
fn text_round_trip_through_transforms() {
    let path = parse("M1 1h4v3h-4zm10 0a2 1 0 1 1 4 0");
    let moved = path.translate(2.0, -1.0);
    assert_eq!(moved.to_string(), "M3 0H7V3H3zM13 0A2 1 0 1 1 17 0");
    assert_eq!(parse(&moved.to_string()), moved);
}
