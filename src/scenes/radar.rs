//! HUD radar: rotating sweep, pulsing blips and a trailing arc.

use std::f64::consts::{PI, TAU};

use crate::foundation::color::Color;
use crate::foundation::core::Point;
use crate::foundation::error::StrobeResult;
use crate::foundation::math::wrap01;
use crate::scene::descriptor::{FnScene, SceneContext, SceneDescriptor};
use crate::scene::graph::NodeKind;

const CENTER_Y: f64 = -70.0;
const RINGS: [f64; 4] = [120.0, 200.0, 280.0, 360.0];
const TRAIL_LENGTH: f64 = 0.22;

/// `(radius, angle, phase)` of each blip.
const BLIPS: [(f64, f64, f64); 3] = [(160.0, 0.25, 0.10), (240.0, 1.55, 0.42), (320.0, 2.35, 0.76)];

pub(crate) fn scene() -> impl SceneDescriptor {
    FnScene::new("radar", build)
}

fn build(ctx: &mut SceneContext) -> StrobeResult<()> {
    let t = ctx.progress()?;
    let rt = ctx.runtime().clone();
    let res = ctx.params().resolution;

    let cyan = |a: f64| Color::rgb8_alpha(120, 240, 255, a);
    let blip_fill = Color::parse("rgba(200,255,255,0.92)")?;

    let sweep = t.map("sweep", |t| wrap01(t * 1.1))?;
    let cone_rotation = sweep.map("cone.rotation", |s| s * TAU)?;
    let tc = t.clone();
    let cone_opacity = rt.derived("cone.opacity", move || {
        Ok(0.12 + 0.06 * (tc.read()? * PI * 2.0 * 2.0).sin())
    });
    let trail_start = sweep.map("trail.start", |s| wrap01(s - TRAIL_LENGTH))?;

    let mut blips = Vec::with_capacity(BLIPS.len());
    for (i, &(r, a, phase)) in BLIPS.iter().enumerate() {
        let tr = t.clone();
        let radius = rt.derived(format!("blip.{i}.radius"), move || {
            Ok(5.0 + 6.0 * ((tr.read()? + phase) * PI * 2.0 * 2.5).sin().max(0.0))
        });
        let sw = sweep.clone();
        let opacity = rt.derived(format!("blip.{i}.opacity"), move || {
            let ang = sw.read()? * TAU;
            let d = (ang - a).sin().atan2((ang - a).cos()).abs();
            Ok(0.25 + 0.75 * (1.0 - d / 0.5).max(0.0))
        });
        blips.push((Point::new(a.cos() * r, a.sin() * r), radius, opacity));
    }

    let mut root = ctx.root();
    root.add("background", NodeKind::Rect)
        .prop("width", f64::from(res.width))
        .prop("height", f64::from(res.height))
        .prop("fill", Color::parse("#050910")?);

    root.add("grid", NodeKind::Rect)
        .prop("width", f64::from(res.width) * 1.1)
        .prop("height", f64::from(res.height) * 1.1)
        .prop("radius", 40.0)
        .prop("stroke", cyan(0.12))
        .prop("line_width", 1.0)
        .prop("opacity", 0.22);

    root.group("scope").prop("y", CENTER_Y).children(|scope| {
        for (i, r) in RINGS.iter().enumerate() {
            scope
                .add(format!("ring.{i}"), NodeKind::Circle)
                .prop("radius", *r)
                .prop("stroke", cyan(0.14))
                .prop("line_width", 2.0);
        }

        scope
            .add("crosshair.h", NodeKind::Rect)
            .prop("width", 520.0)
            .prop("height", 2.0)
            .prop("fill", cyan(0.18));
        scope
            .add("crosshair.v", NodeKind::Rect)
            .prop("width", 2.0)
            .prop("height", 520.0)
            .prop("fill", cyan(0.18));

        scope
            .add("cone", NodeKind::Rect)
            .prop("width", 520.0)
            .prop("height", 520.0)
            .prop("fill", cyan(0.06))
            .prop("rotation", &cone_rotation)
            .prop("opacity", &cone_opacity);

        scope
            .add("trail", NodeKind::Spline)
            .prop(
                "points",
                vec![
                    Point::new(0.0, -360.0),
                    Point::new(220.0, -120.0),
                    Point::new(180.0, 180.0),
                    Point::new(0.0, 360.0),
                ],
            )
            .prop("smoothness", 0.45)
            .prop("closed", true)
            .prop("start", &trail_start)
            .prop("end", &sweep)
            .prop("stroke", cyan(0.22))
            .prop("line_width", 6.0);

        for (i, (pos, radius, opacity)) in blips.iter().enumerate() {
            scope
                .add(format!("blip.{i}"), NodeKind::Circle)
                .prop("position", *pos)
                .prop("radius", radius)
                .prop("opacity", opacity)
                .prop("fill", blip_fill);
        }
    });
    Ok(())
}
