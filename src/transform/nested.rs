use smallvec::SmallVec;

use crate::animation::keyframe::SampleCtx;
use crate::foundation::core::{Affine, Rect};
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::scene::project::{ObjectKind, ObjectRef, Project};
use crate::transform::object::object_affine;

/// Composition instance currently being traversed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NestedEntry {
    pub instance: ObjectRef,
    /// Accumulated offset of the list the instance itself lives in.
    pub offset_before: f64,
}

/// Stack of enclosing composition instances plus their accumulated start offset.
///
/// Entries are only added through [`NestedStack::enter`], which restores both the stack and the
/// offset when its closure returns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NestedStack {
    entries: Vec<NestedEntry>,
    offset: f64,
}

impl NestedStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the start times of all enclosing instances.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[NestedEntry] {
        &self.entries
    }

    /// Sampling context for properties of objects at the current depth.
    pub fn sample_ctx(&self, time: f64) -> SampleCtx {
        SampleCtx {
            time,
            nested_offset: self.offset,
        }
    }

    /// Run `f` inside `instance`, whose own start time is `start`.
    ///
    /// The previous offset is restored by assignment, so it is bit-for-bit identical afterwards
    /// whatever `f` returns.
    pub fn enter<R>(
        &mut self,
        instance: ObjectRef,
        start: f64,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let offset_before = self.offset;
        self.entries.push(NestedEntry {
            instance,
            offset_before,
        });
        self.offset = offset_before + start;

        let out = f(self);

        self.entries.pop();
        self.offset = offset_before;
        out
    }
}

/// Per-instance coordinate step from a parent composition into a nested one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NestedStep {
    /// Applied after the previous step.
    pub transform: Affine,
    /// Child composition's frame in the space after `transform`.
    pub clip: Rect,
}

/// Coordinate steps for every instance on `stack`, outermost first.
///
/// Each instance contributes its own transform followed by a `1 / aspect` scale when the child
/// composition is wider than tall. Every instance transform is sampled with the full offset of the
/// innermost list being drawn, the same clock as the objects inside it.
pub fn nested_steps(
    project: &Project,
    stack: &NestedStack,
    time: f64,
) -> KeyreelResult<SmallVec<[NestedStep; 4]>> {
    let ctx = stack.sample_ctx(time);
    let mut steps = SmallVec::new();
    for entry in stack.entries() {
        let instance = project
            .object(entry.instance)
            .ok_or_else(|| KeyreelError::evaluation("nested instance reference out of range"))?;
        let ObjectKind::Composition { child, .. } = instance.kind else {
            return Err(KeyreelError::evaluation(format!(
                "nested instance '{}' is not a composition",
                instance.id
            )));
        };
        let aspect = project
            .composition(child)
            .map(|c| c.aspect)
            .ok_or_else(|| KeyreelError::evaluation("nested composition index out of range"))?;

        let mut transform = match &instance.transform {
            Some(t) => object_affine(project, t, ctx)?,
            None => Affine::IDENTITY,
        };
        if aspect > 1.0 {
            transform = transform * Affine::scale(1.0 / aspect);
        }
        steps.push(NestedStep {
            transform,
            clip: Rect::new(-aspect / 2.0, -0.5, aspect / 2.0, 0.5),
        });
    }
    Ok(steps)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/nested.rs"]
mod tests;
