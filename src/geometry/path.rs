use crate::animation::keyframe::{SampleCtx, vec2_of};
use crate::foundation::core::{BezPath, Point, Rect};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::foundation::math::{cubic_coord, expand_to_include};
use crate::scene::model::Vertex;

/// Parameter step used when sampling a segment for its bounds.
pub const BOUNDS_SAMPLE_STEP: f64 = 0.01;
const BOUNDS_SAMPLES: u32 = 100;

/// Vertex evaluated at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
struct SampledVertex {
    v: Point,
    cn: Point,
    cp: Point,
}

fn sample_vertices(vertices: &[Vertex], ctx: SampleCtx) -> KeyreelResult<Vec<SampledVertex>> {
    if vertices.is_empty() {
        return Err(KeyreelError::evaluation("vertex list is empty"));
    }
    vertices
        .iter()
        .map(|vx| {
            Ok(SampledVertex {
                v: vec2_of(&vx.v.sample(ctx)?).to_point(),
                cn: vec2_of(&vx.cn.sample(ctx)?).to_point(),
                cp: vec2_of(&vx.cp.sample(ctx)?).to_point(),
            })
        })
        .collect()
}

/// Cubic segments of the closed outline, including the wrap from the last vertex to the first.
fn segments(sampled: &[SampledVertex]) -> impl Iterator<Item = [Point; 4]> + '_ {
    let n = sampled.len();
    (0..n).map(move |i| {
        let a = sampled[i];
        let b = sampled[(i + 1) % n];
        [a.v, a.cn, b.cp, b.v]
    })
}

/// Closed cubic path through the vertex list at `ctx`.
///
/// Each segment runs from a vertex through its outgoing handle and the next vertex's incoming
/// handle; the last segment wraps back to the first vertex.
pub fn build_path(vertices: &[Vertex], ctx: SampleCtx) -> KeyreelResult<BezPath> {
    let sampled = sample_vertices(vertices, ctx)?;
    let mut path = BezPath::new();
    path.move_to(sampled[0].v);
    for [_, c1, c2, end] in segments(&sampled) {
        path.curve_to(c1, c2, end);
    }
    path.close_path();
    Ok(path)
}

/// Sampled axis-aligned bounds of the outline, grown by half the stroke width.
///
/// Every segment is evaluated at `t = 0, 0.01, .., 1`; this encloses the path without solving for
/// the curve's extrema, which is enough for placing gradients.
pub fn compute_bounds(
    vertices: &[Vertex],
    stroke_width: f64,
    ctx: SampleCtx,
) -> KeyreelResult<Rect> {
    let sampled = sample_vertices(vertices, ctx)?;
    let half = stroke_width / 2.0;
    let first = sampled[0].v;
    let mut bounds = Rect::new(first.x, first.y, first.x, first.y);

    for [p0, p1, p2, p3] in segments(&sampled) {
        for i in 0..=BOUNDS_SAMPLES {
            let t = f64::from(i) * BOUNDS_SAMPLE_STEP;
            let x = cubic_coord(t, p0.x, p1.x, p2.x, p3.x);
            let y = cubic_coord(t, p0.y, p1.y, p2.y, p3.y);
            expand_to_include(&mut bounds, x - half, y - half);
            expand_to_include(&mut bounds, x + half, y + half);
        }
    }
    Ok(bounds)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;
