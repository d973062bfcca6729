//! Pulsing three-layer network with data particles travelling along splines.

use std::f64::consts::TAU;
use std::rc::Rc;

use crate::foundation::color::Color;
use crate::foundation::core::Point;
use crate::foundation::error::StrobeResult;
use crate::foundation::math::wrap01;
use crate::scene::descriptor::{FnScene, SceneContext, SceneDescriptor};
use crate::scene::graph::NodeKind;
use crate::spline::curve::SplineCurve;

const COLUMNS: [f64; 3] = [-420.0, 0.0, 420.0];
const ROWS: [f64; 5] = [-220.0, -110.0, 0.0, 110.0, 220.0];

const PARTICLE_PATHS: [[(f64, f64); 5]; 3] = [
    [
        (-640.0, -180.0),
        (-260.0, -260.0),
        (0.0, -140.0),
        (260.0, -210.0),
        (640.0, -110.0),
    ],
    [
        (-640.0, 40.0),
        (-320.0, -40.0),
        (0.0, 60.0),
        (320.0, 20.0),
        (640.0, 120.0),
    ],
    [
        (-640.0, 220.0),
        (-280.0, 120.0),
        (0.0, 260.0),
        (280.0, 140.0),
        (640.0, 260.0),
    ],
];

struct Particle {
    path: usize,
    offset: f64,
    speed: f64,
    radius: f64,
}

const PARTICLES: [Particle; 4] = [
    Particle {
        path: 0,
        offset: 0.05,
        speed: 1.6,
        radius: 5.0,
    },
    Particle {
        path: 1,
        offset: 0.32,
        speed: 2.2,
        radius: 4.0,
    },
    Particle {
        path: 2,
        offset: 0.61,
        speed: 1.9,
        radius: 4.5,
    },
    Particle {
        path: 1,
        offset: 0.78,
        speed: 2.6,
        radius: 3.5,
    },
];

pub(crate) fn scene() -> impl SceneDescriptor {
    FnScene::new("neural", build)
}

fn build(ctx: &mut SceneContext) -> StrobeResult<()> {
    let t = ctx.progress()?;
    let rt = ctx.runtime().clone();
    let res = ctx.params().resolution;

    let link = Color::parse("rgba(120, 220, 255, 0.16)")?;
    let halo = Color::parse("rgba(140, 245, 255, 0.22)")?;
    let core_fill = Color::parse("rgba(220, 252, 255, 0.92)")?;
    let core_stroke = Color::parse("rgba(110, 240, 255, 0.55)")?;
    let trail = Color::parse("rgba(140, 245, 255, 0.10)")?;
    let particle_fill = Color::parse("rgba(170, 252, 255, 0.95)")?;

    let mut curves = Vec::with_capacity(PARTICLE_PATHS.len());
    for path in &PARTICLE_PATHS {
        let points: Vec<Point> = path.iter().map(|&(x, y)| Point::new(x, y)).collect();
        curves.push(Rc::new(SplineCurve::build(&points, 0.42, false)?));
    }

    let mut halo_opacity = Vec::with_capacity(COLUMNS.len() * ROWS.len());
    for ci in 0..COLUMNS.len() {
        for ri in 0..ROWS.len() {
            let phase = ci as f64 * 1.6 + ri as f64 * 0.65;
            let t = t.clone();
            let pulse = rt.derived(format!("pulse.{ci}.{ri}"), move || {
                Ok(0.5 + 0.5 * (t.read()? * TAU * 3.0 - phase).sin())
            });
            halo_opacity.push(pulse.map(format!("halo.{ci}.{ri}.opacity"), |p| 0.25 + p * 0.55)?);
        }
    }

    let mut root = ctx.root();
    root.add("background", NodeKind::Rect)
        .prop("width", f64::from(res.width))
        .prop("height", f64::from(res.height))
        .prop("fill", Color::parse("#070A12")?);

    root.group("network").children(|net| {
        for (layer, bend) in [(0usize, -180.0), (1, 180.0)] {
            for (i, &y0) in ROWS.iter().enumerate() {
                for (j, &y1) in ROWS.iter().enumerate() {
                    if i.abs_diff(j) > 1 {
                        continue;
                    }
                    let sign = if layer == 0 { 1.0 } else { -1.0 };
                    let skew = (i as f64 - j as f64) * 20.0 * sign;
                    net.add(format!("link.{layer}.{i}.{j}"), NodeKind::Spline)
                        .prop(
                            "points",
                            vec![
                                Point::new(COLUMNS[layer], y0),
                                Point::new(bend, (y0 + y1) / 2.0 + skew),
                                Point::new(COLUMNS[layer + 1], y1),
                            ],
                        )
                        .prop("smoothness", 0.35)
                        .prop("stroke", link)
                        .prop("line_width", 3.0);
                }
            }
        }

        for (ci, &x) in COLUMNS.iter().enumerate() {
            for (ri, &y) in ROWS.iter().enumerate() {
                let opacity = halo_opacity[ci * ROWS.len() + ri].clone();
                net.group(format!("node.{ci}.{ri}"))
                    .prop("position", Point::new(x, y))
                    .children(|node| {
                        node.add("halo", NodeKind::Circle)
                            .prop("radius", 21.0)
                            .prop("fill", halo)
                            .prop("opacity", opacity);
                        node.add("core", NodeKind::Circle)
                            .prop("radius", 10.0)
                            .prop("fill", core_fill)
                            .prop("stroke", core_stroke)
                            .prop("line_width", 2.0);
                    });
            }
        }
    });

    for (i, curve) in curves.iter().enumerate() {
        root.add(format!("trail.{i}"), NodeKind::Spline)
            .prop("points", curve.control_points().to_vec())
            .prop("smoothness", curve.smoothness())
            .prop("stroke", trail)
            .prop("line_width", 2.0);
    }

    for (i, p) in PARTICLES.iter().enumerate() {
        let curve = Rc::clone(&curves[p.path]);
        let (speed, offset) = (p.speed, p.offset);
        let tp = t.clone();
        let position = rt.derived(format!("particle.{i}.position"), move || {
            let u = wrap01(tp.read()? * speed + offset);
            Ok(curve.point_at_percentage(u).position)
        });
        let to = t.clone();
        let opacity = rt.derived(format!("particle.{i}.opacity"), move || {
            Ok(0.65 + 0.35 * (to.read()? * TAU * 2.0 + offset * 10.0).sin())
        });
        root.add(format!("particle.{i}"), NodeKind::Circle)
            .prop("radius", p.radius)
            .prop("fill", particle_fill)
            .prop("position", position)
            .prop("opacity", opacity);
    }
    Ok(())
}
