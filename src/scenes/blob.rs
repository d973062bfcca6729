//! Liquid blob whose outline is refitted every frame, with orbiting highlights and drifting
//! particles.

use std::f64::consts::TAU;

use crate::foundation::color::Color;
use crate::foundation::core::Point;
use crate::foundation::error::StrobeResult;
use crate::foundation::math::{smoothstep, wrap01};
use crate::scene::descriptor::{FnScene, SceneContext, SceneDescriptor};
use crate::scene::graph::NodeKind;

const CENTER_Y: f64 = -40.0;
const RADIUS: f64 = 250.0;
const ORBIT: f64 = 260.0;
const HIGHLIGHTS: usize = 6;
const PARTICLES: usize = 28;

pub(crate) fn scene() -> impl SceneDescriptor {
    FnScene::new("blob", build)
}

/// Control points of the blob outline at normalized time `t`.
pub(crate) fn blob_points(t: f64) -> Vec<Point> {
    let a = t * TAU;
    let k1 = 0.22 * (a * 2.0).sin();
    let k2 = 0.18 * (a * 3.0 + 1.2).cos();
    vec![
        Point::new(-RADIUS * (1.0 + k1), CENTER_Y - 140.0),
        Point::new(-RADIUS * 0.6, CENTER_Y - 260.0 * (1.0 - k2)),
        Point::new(RADIUS * (1.0 - k2), CENTER_Y - 120.0),
        Point::new(RADIUS * 0.7, CENTER_Y + 260.0 * (1.0 + k1)),
        Point::new(-RADIUS * (1.0 + k2), CENTER_Y + 170.0),
    ]
}

fn build(ctx: &mut SceneContext) -> StrobeResult<()> {
    let t = ctx.progress()?;
    let rt = ctx.runtime().clone();
    let res = ctx.params().resolution;
    let (w, h) = (f64::from(res.width), f64::from(res.height));

    let points = t.map("blob.points", blob_points)?;
    let highlight_fill = Color::parse("rgba(245,255,255,0.92)")?;
    let particle_fill = Color::parse("rgba(190,250,255,0.6)")?;

    let mut highlights = Vec::with_capacity(HIGHLIGHTS);
    for i in 0..HIGHLIGHTS {
        let p = i as f64 / HIGHLIGHTS as f64;
        let tp = t.clone();
        let position = rt.derived(format!("highlight.{i}.position"), move || {
            let a = (tp.read()? + p) * TAU;
            Ok(Point::new(a.cos() * ORBIT, CENTER_Y + a.sin() * ORBIT))
        });
        let tr = t.clone();
        let radius = rt.derived(format!("highlight.{i}.radius"), move || {
            let wave = 0.5 + 0.5 * ((tr.read()? + p) * TAU * 2.0).sin();
            Ok((14.0 + 18.0 * smoothstep(0.0, 1.0, wave)) / 2.0)
        });
        highlights.push((position, radius, 0.35 + 0.65 * (1.0 - p)));
    }

    let mut particles = Vec::with_capacity(PARTICLES);
    for i in 0..PARTICLES {
        let p = ((i * 997) % 101) as f64 / 101.0;
        let lane = (i % 7) as f64 / 7.0;
        let tp = t.clone();
        let position = rt.derived(format!("particle.{i}.position"), move || {
            let t = tp.read()?;
            Ok(Point::new(
                -w / 2.0 - 40.0 + wrap01(t * (0.6 + lane * 0.9) + p) * (w + 80.0),
                -h / 2.0 + 120.0 + lane * (h - 240.0) + ((t + p) * TAU).sin() * 8.0,
            ))
        });
        let to = t.clone();
        let opacity = rt.derived(format!("particle.{i}.opacity"), move || {
            Ok(0.1 + 0.4 * ((to.read()? + p) * TAU).sin())
        });
        particles.push((position, opacity));
    }

    let mut root = ctx.root();
    root.add("background", NodeKind::Rect)
        .prop("width", w)
        .prop("height", h)
        .prop("fill", Color::parse("#0B0F24")?);

    root.add("outline", NodeKind::Spline)
        .prop("points", &points)
        .prop("smoothness", 0.55)
        .prop("stroke", Color::parse("rgba(120,240,255,0.12)")?)
        .prop("line_width", 18.0);

    root.add("body", NodeKind::Spline)
        .prop("points", &points)
        .prop("smoothness", 0.55)
        .prop("closed", true)
        .prop("fill", Color::parse("rgba(120,240,255,0.55)")?)
        .prop("opacity", 0.9);

    root.group("highlights").children(|s| {
        for (i, (position, radius, opacity)) in highlights.iter().enumerate() {
            s.add(format!("highlight.{i}"), NodeKind::Circle)
                .prop("position", position)
                .prop("radius", radius)
                .prop("opacity", *opacity)
                .prop("fill", highlight_fill);
        }
    });

    root.group("particles").children(|s| {
        for (i, (position, opacity)) in particles.iter().enumerate() {
            s.add(format!("particle.{i}"), NodeKind::Circle)
                .prop("position", position)
                .prop("radius", 1.5)
                .prop("opacity", opacity)
                .prop("fill", particle_fill);
        }
    });
    Ok(())
}
