use super::*;
use crate::foundation::core::Canvas;
use crate::scene::project::{Background, Composition, Object};

fn video(id: &str) -> Object {
    Object::new(
        id,
        ObjectKind::Video {
            source_matrix: None,
            alpha_stacked: false,
        },
        0.0,
        10.0,
    )
}

fn instance(id: &str, child: usize) -> Object {
    Object::new(id, ObjectKind::Composition { child, inpoint: 0.0 }, 0.0, 10.0)
}

fn project() -> Project {
    let comp = |objects| Composition {
        duration: 10.0,
        aspect: 1.0,
        objects,
    };
    Project::new(
        Canvas {
            width: 8,
            height: 8,
        },
        vec![
            comp(vec![
                video("intro"),
                instance("a", 1),
                instance("b", 1),
                Object::new("music", ObjectKind::Sound, 0.0, 10.0),
            ]),
            comp(vec![video("clip"), Object::new("d", ObjectKind::Dummy, 0.0, 1.0)]),
            comp(vec![video("unreachable")]),
        ],
        Background::Transparent,
    )
    .unwrap()
}

#[test]
fn tracks_reachable_media_once() {
    let t = MediaTracker::for_project(&project());
    assert_eq!(t.to_load(), 3);
    let pending: Vec<_> = t.pending().collect();
    assert_eq!(pending, ["intro", "clip", "music"]);
}

#[test]
fn readiness_is_once_only() {
    let mut t = MediaTracker::for_project(&project());
    assert!(t.notify_ready("clip"));
    assert!(!t.notify_ready("clip"));
    assert!(!t.notify_ready("unreachable"));
    assert_eq!(t.ready(), 1);
    assert!(!t.is_ready());

    t.notify_ready("intro");
    t.notify_ready("music");
    assert!(t.is_ready());
    assert_eq!(t.pending().count(), 0);
}

#[test]
fn project_without_media_is_ready() {
    let p = Project::new(
        Canvas {
            width: 1,
            height: 1,
        },
        vec![Composition {
            duration: 1.0,
            aspect: 1.0,
            objects: Vec::new(),
        }],
        Background::Transparent,
    )
    .unwrap();
    assert!(MediaTracker::for_project(&p).is_ready());
}
