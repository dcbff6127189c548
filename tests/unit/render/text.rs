use super::*;

fn dejavu() -> Vec<u8> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/fonts/DejaVuSans.ttf");
    std::fs::read(path).unwrap()
}

#[test]
fn registered_family_is_named_and_resolved() {
    let mut engine = TextLayoutEngine::new();
    assert!(engine.resolve(None).is_none());

    let family = engine.register_font(dejavu()).unwrap();
    assert_eq!(family, "DejaVu Sans");
    assert_eq!(engine.fonts().len(), 1);
    assert_eq!(engine.resolve(Some("dejavu sans")).unwrap().family, family);
    // unknown names fall back to the first font
    assert_eq!(engine.resolve(Some("Nope")).unwrap().family, family);
}

#[test]
fn garbage_bytes_are_rejected() {
    let mut engine = TextLayoutEngine::new();
    assert!(engine.register_font(b"not a font".to_vec()).is_err());
    assert!(engine.fonts().is_empty());
}

#[test]
fn layout_places_glyphs_left_to_right_on_one_baseline() {
    let mut engine = TextLayoutEngine::new();
    let family = engine.register_font(dejavu()).unwrap();
    let layout = engine
        .layout("hello", &family, 20.0, Rgba8::WHITE.into())
        .unwrap();

    assert_eq!(layout.lines().count(), 1);
    let baseline = first_baseline(&layout);
    assert!(baseline > 10.0 && baseline < 30.0, "baseline {baseline}");

    let mut glyphs = Vec::new();
    for line in layout.lines() {
        for item in line.items() {
            if let parley::layout::PositionedLayoutItem::GlyphRun(run) = item {
                assert_eq!(run.style().brush, TextBrush::from(Rgba8::WHITE));
                glyphs.extend(positioned_glyphs(&run));
            }
        }
    }
    assert_eq!(glyphs.len(), 5);
    assert!(glyphs.windows(2).all(|w| w[1].x > w[0].x));
    assert!(glyphs.iter().all(|g| (g.y - baseline).abs() < 1e-3));
}

#[test]
fn non_positive_size_is_rejected() {
    let mut engine = TextLayoutEngine::new();
    let family = engine.register_font(dejavu()).unwrap();
    assert!(engine.layout("x", &family, 0.0, TextBrush::default()).is_err());
    assert!(engine.layout("x", &family, f32::NAN, TextBrush::default()).is_err());
}
