use super::*;
use crate::animation::keyframe::AnimatedProperty;
use crate::animation::stepped::SteppedProperty;
use crate::foundation::core::{Canvas, Rect};
use crate::media::frame::MediaFrame;
use crate::media::provider::{InMemoryMedia, NoMedia};
use crate::render::recording::{DrawCommand, RecordingSurface};
use crate::scene::model::{Effect, Gradient, GradientKind, GradientStop, Vertex};
use crate::scene::project::{Background, Composition, Transform};

const CANVAS: Canvas = Canvas {
    width: 200,
    height: 100,
};

fn rect_vertices(w: f64, h: f64) -> Vec<Vertex> {
    vec![
        Vertex::corner(-w / 2.0, -h / 2.0),
        Vertex::corner(w / 2.0, -h / 2.0),
        Vertex::corner(w / 2.0, h / 2.0),
        Vertex::corner(-w / 2.0, h / 2.0),
    ]
}

fn solid_shape(rgb: [f64; 3]) -> Shape {
    Shape {
        vertex_list: rect_vertices(0.5, 0.5),
        color: Some(AnimatedProperty::constant(rgb.to_vec())),
        gradient: None,
        stroke_width: AnimatedProperty::constant(vec![0.0]),
        stroke_color: AnimatedProperty::constant(vec![0.0, 0.0, 0.0]),
    }
}

fn shape_object(id: &str, shape: Shape, start: f64, stop: f64) -> Object {
    let mut o = Object::new(id, ObjectKind::Shape(Some(shape)), start, stop);
    o.transform = Some(Transform::identity());
    o
}

fn comp(objects: Vec<Object>) -> Composition {
    Composition {
        duration: 1000.0,
        aspect: 1.0,
        objects,
    }
}

fn project(compositions: Vec<Composition>) -> Project {
    Project::new(CANVAS, compositions, Background::Transparent).unwrap()
}

fn render_with(
    project: &Project,
    media: &mut dyn MediaProvider,
    time: f64,
    opts: SceneOpts,
) -> (RecordingSurface, DrawOutcome) {
    let mut surface = RecordingSurface::new(project.canvas);
    let mut nested = NestedStack::new();
    let outcome = SceneRenderer::new(project, media, time)
        .with_opts(opts)
        .draw_objects(&mut surface, &mut nested, project.active)
        .unwrap();
    assert_eq!(surface.save_depth(), 0);
    assert_eq!(surface.layer_depth(), 0);
    assert_eq!(nested.depth(), 0);
    assert_eq!(nested.offset(), 0.0);
    (surface, outcome)
}

fn render(project: &Project, time: f64) -> RecordingSurface {
    render_with(project, &mut NoMedia, time, SceneOpts::default()).0
}

fn fills(surface: &RecordingSurface) -> Vec<(Brush, Affine, f64)> {
    surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::FillPath {
                brush,
                transform,
                alpha,
                ..
            } => Some((brush.clone(), *transform, *alpha)),
            _ => None,
        })
        .collect()
}

fn non_clip(surface: &RecordingSurface) -> Vec<DrawCommand> {
    surface
        .commands()
        .iter()
        .filter(|c| !matches!(c, DrawCommand::ClipRect { .. }))
        .cloned()
        .collect()
}

#[test]
fn fullscreen_object_ends_the_list() {
    let mut bg = shape_object("bg", solid_shape([1.0, 0.0, 0.0]), 0.0, 1000.0);
    bg.is_fullscreen = true;
    let p = project(vec![comp(vec![
        shape_object("under", solid_shape([0.0, 1.0, 0.0]), 0.0, 1000.0),
        bg,
        shape_object("over", solid_shape([0.0, 0.0, 1.0]), 0.0, 1000.0),
    ])]);

    let (surface, outcome) = render_with(&p, &mut NoMedia, 10.0, SceneOpts::default());
    assert_eq!(
        outcome,
        DrawOutcome {
            drawn: 2,
            short_circuited: true
        }
    );
    let brushes: Vec<Brush> = fills(&surface).into_iter().map(|(b, _, _)| b).collect();
    assert_eq!(
        brushes,
        vec![
            Brush::Solid(Rgba8::new(0, 255, 0, 255)),
            Brush::Solid(Rgba8::new(255, 0, 0, 255)),
        ]
    );
}

#[test]
fn hidden_fullscreen_object_does_not_short_circuit() {
    let mut bg = shape_object("bg", solid_shape([1.0, 0.0, 0.0]), 500.0, 1000.0);
    bg.is_fullscreen = true;
    let p = project(vec![comp(vec![
        bg,
        shape_object("over", solid_shape([0.0, 0.0, 1.0]), 0.0, 1000.0),
    ])]);
    let (_, outcome) = render_with(&p, &mut NoMedia, 10.0, SceneOpts::default());
    assert_eq!(outcome.drawn, 1);
    assert!(!outcome.short_circuited);
}

#[test]
fn visibility_window_is_half_open() {
    let p = project(vec![comp(vec![shape_object(
        "s",
        solid_shape([1.0, 1.0, 1.0]),
        100.0,
        200.0,
    )])]);
    assert_eq!(fills(&render(&p, 99.0)).len(), 0);
    assert_eq!(fills(&render(&p, 100.0)).len(), 1);
    assert_eq!(fills(&render(&p, 200.0)).len(), 0);
}

#[test]
fn shape_draws_in_viewport_then_object_space() {
    let mut o = shape_object("s", solid_shape([1.0, 1.0, 1.0]), 0.0, 1000.0);
    let mut t = Transform::identity();
    t.position = AnimatedProperty::constant(vec![0.25, 0.0]);
    o.transform = Some(t);
    o.opacity = AnimatedProperty::constant(vec![0.5]);
    let p = project(vec![comp(vec![o])]);

    let got = fills(&render(&p, 0.0));
    let expected = viewport_affine(CANVAS, 1.0) * Affine::translate((0.25, 0.0));
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].1, expected);
    assert_eq!(got[0].2, 0.5);
}

#[test]
fn object_without_transform_draws_in_device_space() {
    let o = Object::new(
        "s",
        ObjectKind::Shape(Some(solid_shape([1.0, 1.0, 1.0]))),
        0.0,
        1000.0,
    );
    let p = project(vec![comp(vec![o])]);
    assert_eq!(fills(&render(&p, 0.0))[0].1, Affine::IDENTITY);
}

#[test]
fn missing_fill_is_black_and_stroke_follows_fill() {
    let mut shape = solid_shape([0.0, 0.0, 0.0]);
    shape.color = None;
    shape.stroke_width = AnimatedProperty::constant(vec![0.02]);
    shape.stroke_color = AnimatedProperty::constant(vec![1.0, 1.0, 1.0]);
    let p = project(vec![comp(vec![shape_object("s", shape, 0.0, 1000.0)])]);

    let surface = render(&p, 0.0);
    let draws: Vec<&DrawCommand> = surface.draws().collect();
    assert_eq!(draws.len(), 2);
    assert!(matches!(
        draws[0],
        DrawCommand::FillPath {
            brush: Brush::Solid(Rgba8::BLACK),
            ..
        }
    ));
    assert!(matches!(
        draws[1],
        DrawCommand::StrokePath { width, color: Rgba8::WHITE, .. } if *width == 0.02
    ));
}

#[test]
fn gradient_fill_maps_onto_square_bounds() {
    let gradient = Gradient {
        kind: GradientKind::Radial,
        from: [0.5, 0.5],
        to: [1.0, 0.5],
        stops: vec![
            GradientStop {
                position: 0.0,
                color: Rgba8::WHITE,
            },
            GradientStop {
                position: 1.0,
                color: Rgba8::BLACK,
            },
        ],
    };
    let mut shape = solid_shape([0.0, 0.0, 0.0]);
    shape.color = None;
    shape.vertex_list = rect_vertices(0.4, 0.2);
    shape.gradient = Some(SteppedProperty::constant(gradient.clone()));
    let p = project(vec![comp(vec![shape_object("g", shape, 0.0, 1000.0)])]);

    let surface = render(&p, 0.0);
    let DrawCommand::FillPath {
        brush,
        paint_transform,
        ..
    } = &surface.commands()[0]
    else {
        panic!("expected a path fill");
    };
    let bounds = Rect::new(-0.2, -0.1, 0.2, 0.1);
    assert_eq!(
        *brush,
        resolve_gradient(&gradient, square_bounds(GradientKind::Radial, bounds))
    );
    assert_eq!(
        *paint_transform,
        radial_correction(GradientKind::Radial, bounds.width(), bounds.height())
    );
}

#[test]
fn text_uses_default_size() {
    let text = Text {
        text: "hello".to_owned(),
        font: None,
        size: AnimatedProperty::constant(vec![0.1]),
        color: AnimatedProperty::constant(vec![1.0, 0.0, 0.0]),
    };
    let mut o = Object::new("t", ObjectKind::Text(Some(text)), 0.0, 1000.0);
    o.transform = Some(Transform::identity());
    let p = project(vec![comp(vec![o])]);

    let surface = render(&p, 0.0);
    assert!(matches!(
        &surface.commands()[0],
        DrawCommand::Text { text, size, color, .. }
            if text == "hello" && *size == 0.1 && *color == Rgba8::new(255, 0, 0, 255)
    ));
}

#[test]
fn masks_wrap_object_in_layers() {
    let mut o = shape_object("s", solid_shape([1.0, 1.0, 1.0]), 0.0, 1000.0);
    o.opacity = AnimatedProperty::constant(vec![0.5]);
    o.masks = vec![Mask {
        vertex_list: rect_vertices(0.2, 0.2),
        feather: AnimatedProperty::constant(vec![3.0]),
    }];
    let p = project(vec![comp(vec![o])]);

    let cmds = non_clip(&render(&p, 0.0));
    assert_eq!(cmds.len(), 8);
    assert_eq!(cmds[0], DrawCommand::PushLayer);
    assert!(matches!(cmds[1], DrawCommand::FillPath { alpha, .. } if alpha == 0.5));
    assert_eq!(cmds[2], DrawCommand::PushLayer);
    assert_eq!(cmds[3], DrawCommand::ResetClip);
    assert!(matches!(
        cmds[4],
        DrawCommand::FillPath {
            brush: Brush::Solid(Rgba8::BLACK),
            alpha,
            ..
        } if alpha == 1.0
    ));
    assert_eq!(cmds[5], DrawCommand::Blur { sigma: 3.0 });
    assert_eq!(cmds[6], DrawCommand::PopLayer(LayerBlend::DestinationIn));
    assert_eq!(cmds[7], DrawCommand::PopLayer(LayerBlend::Over));
}

#[test]
fn each_mask_gets_its_own_pass() {
    let mut o = shape_object("s", solid_shape([1.0, 1.0, 1.0]), 0.0, 1000.0);
    let mask = Mask {
        vertex_list: rect_vertices(0.2, 0.2),
        feather: AnimatedProperty::constant(vec![0.0]),
    };
    o.masks = vec![mask.clone(), mask];
    let p = project(vec![comp(vec![o])]);

    let cmds = non_clip(&render(&p, 0.0));
    let pushes = cmds
        .iter()
        .filter(|c| **c == DrawCommand::PushLayer)
        .count();
    assert_eq!(pushes, 4);
    assert!(!cmds.iter().any(|c| matches!(c, DrawCommand::Blur { .. })));
    assert_eq!(fills(&render(&p, 0.0)).len(), 4);
}

#[test]
fn effects_run_inside_a_layer_and_skip_noops() {
    let mut o = shape_object("s", solid_shape([1.0, 1.0, 1.0]), 0.0, 1000.0);
    o.effects = vec![
        Effect::Blur {
            radius: AnimatedProperty::constant(vec![0.0]),
        },
        Effect::Opacity {
            value: AnimatedProperty::constant(vec![0.25]),
        },
    ];
    let p = project(vec![comp(vec![o])]);

    let cmds = non_clip(&render(&p, 0.0));
    assert_eq!(cmds.len(), 4);
    assert_eq!(cmds[0], DrawCommand::PushLayer);
    assert!(matches!(cmds[1], DrawCommand::FillPath { .. }));
    assert_eq!(cmds[2], DrawCommand::Effect(Fx::Opacity { value: 0.25 }));
    assert_eq!(cmds[3], DrawCommand::PopLayer(LayerBlend::Over));
}

fn nested_project(instance_start: f64, clip_aspect: f64) -> Project {
    let mut instance = Object::new(
        "inst",
        ObjectKind::Composition {
            child: 1,
            inpoint: 0.0,
        },
        instance_start,
        instance_start + 500.0,
    );
    let mut t = Transform::identity();
    t.position = AnimatedProperty::constant(vec![0.1, 0.0]);
    instance.transform = Some(t);
    instance.opacity = AnimatedProperty::constant(vec![0.5]);

    let mut child = shape_object("child", solid_shape([1.0, 1.0, 1.0]), 0.0, 50.0);
    child.opacity = AnimatedProperty::constant(vec![0.8]);

    project(vec![
        comp(vec![
            instance,
            shape_object("after", solid_shape([0.0, 0.0, 0.0]), 0.0, 1000.0),
        ]),
        Composition {
            duration: 500.0,
            aspect: clip_aspect,
            objects: vec![child],
        },
    ])
}

#[test]
fn nested_children_run_on_shifted_clock() {
    let p = nested_project(100.0, 1.0);
    // child window is [100, 150) in root time
    assert_eq!(fills(&render(&p, 120.0)).len(), 2);
    assert_eq!(fills(&render(&p, 160.0)).len(), 1);
}

#[test]
fn nested_child_opacity_replaces_instance_opacity() {
    let p = nested_project(0.0, 1.0);
    let got = fills(&render(&p, 10.0));
    assert_eq!(got[0].2, 0.8);
    let expected = viewport_affine(CANVAS, 1.0) * Affine::translate((0.1, 0.0));
    assert_eq!(got[0].1, expected);
    // sibling after the instance is unaffected
    assert_eq!(got[1].2, 1.0);
    assert_eq!(got[1].1, viewport_affine(CANVAS, 1.0));
}

#[test]
fn nested_clip_follows_option() {
    let p = nested_project(0.0, 2.0);
    let surface = render(&p, 10.0);
    let clips: Vec<Rect> = surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::ClipRect { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect();
    assert_eq!(clips, vec![Rect::new(-1.0, -0.5, 1.0, 0.5)]);

    let opts = SceneOpts {
        clip_nested: false,
        ..SceneOpts::default()
    };
    let (surface, _) = render_with(&p, &mut NoMedia, 10.0, opts);
    assert!(
        !surface
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::ClipRect { .. }))
    );
}

fn nested_masked_project(feather: f64) -> Project {
    let mut p = nested_project(0.0, 2.0);
    p.compositions[1].objects[0].masks = vec![Mask {
        vertex_list: rect_vertices(0.2, 0.2),
        feather: AnimatedProperty::constant(vec![feather]),
    }];
    p
}

#[test]
fn nested_feathered_mask_is_filled_without_the_instance_clip() {
    let surface = render(&nested_masked_project(2.0), 10.0);
    let cmds = surface.commands();
    let mask_fill = cmds
        .iter()
        .position(|c| {
            matches!(
                c,
                DrawCommand::FillPath {
                    brush: Brush::Solid(Rgba8::BLACK),
                    ..
                }
            )
        })
        .unwrap();
    assert_eq!(cmds[mask_fill - 1], DrawCommand::ResetClip);
    assert_eq!(cmds[mask_fill + 1], DrawCommand::Blur { sigma: 2.0 });
    // the instance clip is still in force for the content and the pass that composites it
    assert!(
        cmds[..mask_fill]
            .iter()
            .any(|c| matches!(c, DrawCommand::ClipRect { .. }))
    );
}

#[test]
fn nested_hard_mask_keeps_the_instance_clip() {
    let surface = render(&nested_masked_project(0.0), 10.0);
    assert!(
        !surface
            .commands()
            .iter()
            .any(|c| *c == DrawCommand::ResetClip)
    );
}

fn video_project(alpha_stacked: bool) -> Project {
    let mut video = Object::new(
        "clip",
        ObjectKind::Video {
            source_matrix: Some(Affine::scale(0.5)),
            alpha_stacked,
        },
        0.0,
        1000.0,
    );
    video.transform = Some(Transform::identity());
    project(vec![comp(vec![video])])
}

fn images(surface: &RecordingSurface) -> Vec<(u32, u32, Affine)> {
    surface
        .commands()
        .iter()
        .filter_map(|c| match c {
            DrawCommand::Image {
                width,
                height,
                transform,
                ..
            } => Some((*width, *height, *transform)),
            _ => None,
        })
        .collect()
}

#[test]
fn video_blits_provider_frame_through_source_matrix() {
    let p = video_project(false);
    let mut media = InMemoryMedia::new().with_frame("clip", MediaFrame::solid(8, 6, [1, 2, 3, 255]));
    let (surface, _) = render_with(&p, &mut media, 0.0, SceneOpts::default());
    assert_eq!(
        images(&surface),
        vec![(8, 6, viewport_affine(CANVAS, 1.0) * Affine::scale(0.5))]
    );
}

#[test]
fn alpha_stacked_video_halves_frame_height() {
    let p = video_project(true);
    let mut media = InMemoryMedia::new().with_frame("clip", MediaFrame::solid(8, 6, [1, 2, 3, 255]));
    let (surface, _) = render_with(&p, &mut media, 0.0, SceneOpts::default());
    assert_eq!(images(&surface)[0].1, 3);
}

#[test]
fn media_skip_and_missing_frames_draw_nothing() {
    let p = video_project(false);
    let mut media = InMemoryMedia::new().with_frame("clip", MediaFrame::solid(2, 2, [0; 4]));
    let opts = SceneOpts {
        media_skip: true,
        ..SceneOpts::default()
    };
    let (surface, outcome) = render_with(&p, &mut media, 0.0, opts);
    assert!(surface.commands().is_empty());
    assert_eq!(outcome.drawn, 0);

    let (surface, outcome) = render_with(&p, &mut NoMedia, 0.0, SceneOpts::default());
    assert!(images(&surface).is_empty());
    assert_eq!(outcome.drawn, 1);
}

#[test]
fn out_of_range_composition_errors() {
    let p = project(vec![comp(Vec::new())]);
    let mut surface = RecordingSurface::new(CANVAS);
    let mut nested = NestedStack::new();
    let err = SceneRenderer::new(&p, &mut NoMedia, 0.0)
        .draw_objects(&mut surface, &mut nested, 3)
        .unwrap_err();
    assert!(err.to_string().contains("composition 3"));
}
