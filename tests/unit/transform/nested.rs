use super::*;
use crate::animation::keyframe::{AnimatedProperty, Keyframe};
use crate::foundation::core::{Canvas, Point};
use crate::scene::project::{Background, Composition, Object, Transform};

fn instance_ref() -> ObjectRef {
    ObjectRef {
        composition: 0,
        object: 0,
    }
}

fn project(child_aspect: f64, with_transform: bool) -> Project {
    let mut instance = Object::new(
        "inst",
        ObjectKind::Composition {
            child: 1,
            inpoint: 0.0,
        },
        0.0,
        100.0,
    );
    if with_transform {
        let mut t = Transform::identity();
        t.position = AnimatedProperty::constant(vec![0.25, 0.0]);
        instance.transform = Some(t);
    }
    Project::new(
        Canvas {
            width: 100,
            height: 100,
        },
        vec![
            Composition {
                duration: 100.0,
                aspect: 1.0,
                objects: vec![instance],
            },
            Composition {
                duration: 100.0,
                aspect: child_aspect,
                objects: Vec::new(),
            },
        ],
        Background::Transparent,
    )
    .unwrap()
}

#[test]
fn enter_restores_offset_exactly() {
    let mut stack = NestedStack::new();
    stack.enter(instance_ref(), 0.1, |s| {
        assert_eq!(s.offset(), 0.1);
        s.enter(instance_ref(), 0.2, |s| {
            assert_eq!(s.depth(), 2);
            assert_eq!(s.offset(), 0.1 + 0.2);
            assert_eq!(s.entries()[1].offset_before, 0.1);
        });
        assert_eq!(s.offset(), 0.1);
        assert_eq!(s.depth(), 1);
    });
    assert_eq!(stack.offset(), 0.0);
    assert_eq!(stack.depth(), 0);
}

#[test]
fn enter_restores_offset_on_error() {
    let mut stack = NestedStack::new();
    let r: Result<(), &str> = stack.enter(instance_ref(), 7.5, |_| Err("boom"));
    assert!(r.is_err());
    assert_eq!(stack, NestedStack::new());
}

#[test]
fn sample_ctx_carries_offset() {
    let mut stack = NestedStack::new();
    stack.enter(instance_ref(), 40.0, |s| {
        let ctx = s.sample_ctx(100.0);
        assert_eq!(ctx.local_time(), 60.0);
    });
}

#[test]
fn wide_child_is_scaled_and_clipped_to_its_frame() {
    let p = project(2.0, false);
    let mut stack = NestedStack::new();
    let steps = stack.enter(instance_ref(), 0.0, |s| nested_steps(&p, s, 0.0).unwrap());
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].transform, Affine::scale(0.5));
    assert_eq!(steps[0].clip, Rect::new(-1.0, -0.5, 1.0, 0.5));
}

#[test]
fn narrow_child_keeps_scale() {
    let p = project(0.5, true);
    let mut stack = NestedStack::new();
    let steps = stack.enter(instance_ref(), 0.0, |s| nested_steps(&p, s, 0.0).unwrap());
    let moved = steps[0].transform * Point::ORIGIN;
    assert!((moved.x - 0.25).abs() < 1e-12);
    assert_eq!(steps[0].clip, Rect::new(-0.25, -0.5, 0.25, 0.5));
}

#[test]
fn empty_stack_has_no_steps() {
    let p = project(1.0, false);
    assert!(nested_steps(&p, &NestedStack::new(), 0.0).unwrap().is_empty());
}

#[test]
fn instance_transform_follows_the_nested_clock() {
    let mut p = project(1.0, true);
    let mut t = Transform::identity();
    t.position = AnimatedProperty::new(vec![
        Keyframe::new(0.0, vec![0.0, 0.0]),
        Keyframe::new(100.0, vec![1.0, 0.0]),
    ]);
    p.compositions[0].objects[0].transform = Some(t);

    let mut stack = NestedStack::new();
    let steps = stack.enter(instance_ref(), 100.0, |s| nested_steps(&p, s, 150.0).unwrap());
    let moved = steps[0].transform * Point::ORIGIN;
    assert!((moved.x - 0.5).abs() < 1e-12, "x = {}", moved.x);
}
