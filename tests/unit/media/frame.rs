use super::*;

#[test]
fn rejects_wrong_byte_length() {
    assert!(MediaFrame::new(2, 2, vec![0; 15]).is_err());
    assert!(MediaFrame::new(2, 2, vec![0; 16]).is_ok());
}

#[test]
fn unstack_takes_alpha_from_bottom_half_blue() {
    // 2x2 color on top of a 2x2 alpha plane.
    let mut bytes = Vec::new();
    for _ in 0..4 {
        bytes.extend_from_slice(&[200, 100, 50, 255]);
    }
    bytes.extend_from_slice(&[9, 9, 0, 255]);
    bytes.extend_from_slice(&[9, 9, 64, 255]);
    bytes.extend_from_slice(&[9, 9, 128, 255]);
    bytes.extend_from_slice(&[9, 9, 255, 255]);
    let stacked = MediaFrame::new(2, 4, bytes).unwrap();

    let out = stacked.unstack_alpha().unwrap();
    assert_eq!((out.width, out.height), (2, 2));
    assert_eq!(out.pixel(0, 0), Some([200, 100, 50, 0]));
    assert_eq!(out.pixel(1, 0), Some([200, 100, 50, 64]));
    assert_eq!(out.pixel(0, 1), Some([200, 100, 50, 128]));
    assert_eq!(out.pixel(1, 1), Some([200, 100, 50, 255]));
}

#[test]
fn unstack_needs_two_rows() {
    assert!(MediaFrame::solid(4, 1, [0, 0, 0, 255]).unstack_alpha().is_err());
}

#[test]
fn pixel_out_of_range_is_none() {
    let f = MediaFrame::solid(1, 1, [1, 2, 3, 4]);
    assert_eq!(f.pixel(0, 0), Some([1, 2, 3, 4]));
    assert_eq!(f.pixel(1, 0), None);
}
