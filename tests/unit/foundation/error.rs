use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        KeyreelError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        KeyreelError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(
        KeyreelError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        KeyreelError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        KeyreelError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KeyreelError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn detail_strips_category_prefix() {
    assert_eq!(KeyreelError::validation("bad id").detail(), "bad id");
    assert_eq!(KeyreelError::render("oops").detail(), "oops");
}
