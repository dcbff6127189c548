use super::*;

#[test]
fn unit_rgb_rounds_to_nearest_byte() {
    let c = Rgba8::from_unit_rgb(&[1.0, 0.5, 0.0]);
    assert_eq!(c, Rgba8::new(255, 128, 0, 255));
}

#[test]
fn unit_rgb_clamps_and_fills_missing_components() {
    let c = Rgba8::from_unit_rgb(&[2.0, -1.0]);
    assert_eq!(c, Rgba8::new(255, 0, 0, 255));
}

#[test]
fn hex_forms_parse() {
    assert_eq!(Rgba8::parse_hex("#fff").unwrap(), Rgba8::WHITE);
    assert_eq!(
        Rgba8::parse_hex("#10ff80").unwrap(),
        Rgba8::new(0x10, 0xff, 0x80, 255)
    );
    assert_eq!(
        Rgba8::parse_hex("#00000080").unwrap(),
        Rgba8::new(0, 0, 0, 0x80)
    );
    assert!(Rgba8::parse_hex("ffffff").is_err());
    assert!(Rgba8::parse_hex("#ggg").is_err());
    assert!(Rgba8::parse_hex("#12345").is_err());
}

#[test]
fn serde_uses_hex_strings() {
    let c: Rgba8 = serde_json::from_str("\"#336699\"").unwrap();
    assert_eq!(c, Rgba8::new(0x33, 0x66, 0x99, 255));
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"#336699\"");
}

#[test]
fn canvas_aspect_and_bytes() {
    let c = Canvas {
        width: 640,
        height: 320,
    };
    assert_eq!(c.aspect(), 2.0);
    assert_eq!(c.byte_len(), 640 * 320 * 4);
}
