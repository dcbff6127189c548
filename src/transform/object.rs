use crate::animation::keyframe::SampleCtx;
use crate::foundation::core::Affine;
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::scene::project::{Project, Transform};

/// Transform of one object without its parents:
/// `translate(position) * rotate(rotation) * scale(scale) * translate(-anchor)`.
pub fn local_affine(t: &Transform, ctx: SampleCtx) -> KeyreelResult<Affine> {
    let anchor = t.anchor.sample_vec2(ctx)?;
    let position = t.position.sample_vec2(ctx)?;
    let scale = t.scale.sample_vec2(ctx)?;
    let degrees = t.rotation.sample_scalar(ctx)?;

    Ok(Affine::translate(position)
        * Affine::rotate(degrees.to_radians())
        * Affine::scale_non_uniform(scale.x, scale.y)
        * Affine::translate(-anchor))
}

/// Full object transform: the parent chain (outermost ancestor first) followed by `t` itself.
///
/// Parent references were resolved and checked for cycles when the project was loaded.
pub fn object_affine(project: &Project, t: &Transform, ctx: SampleCtx) -> KeyreelResult<Affine> {
    let local = local_affine(t, ctx)?;
    let Some(parent_ref) = t.parent else {
        return Ok(local);
    };
    let parent = project
        .object(parent_ref)
        .and_then(|o| o.transform.as_ref())
        .ok_or_else(|| KeyreelError::evaluation("transform parent has no transform"))?;
    Ok(object_affine(project, parent, ctx)? * local)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/object.rs"]
mod tests;
