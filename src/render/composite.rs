//! Byte-level compositing on premultiplied RGBA8 buffers.

use crate::foundation::core::Rgba8;
use crate::foundation::error::{KeyreelError, KeyreelResult};
use crate::foundation::math::mul_div255_u8;

fn check_pair(dst: &[u8], src: &[u8], op: &str) -> KeyreelResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KeyreelError::render(format!(
            "{op} expects equal-length rgba8 buffers"
        )));
    }
    Ok(())
}

fn unit_to_u16(v: f64) -> u16 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u16
}

/// `dst = src * opacity + dst * (1 - src_alpha * opacity)`.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f64) -> KeyreelResult<()> {
    check_pair(dst, src, "over_in_place")?;
    let op = unit_to_u16(opacity);
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);
        d[3] = sa.saturating_add(mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            d[c] = sc.saturating_add(mul_div255_u8(u16::from(d[c]), inv));
        }
    }
    Ok(())
}

/// Scale every `dst` pixel by the alpha of the matching `mask` pixel.
pub fn destination_in_in_place(dst: &mut [u8], mask: &[u8]) -> KeyreelResult<()> {
    check_pair(dst, mask, "destination_in_in_place")?;
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        if w == 255 {
            continue;
        }
        for c in d.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), w);
        }
    }
    Ok(())
}

/// Multiply all channels by `value` in `[0, 1]`.
pub fn scale_alpha_in_place(buf: &mut [u8], value: f64) {
    let w = unit_to_u16(value);
    if w == 255 {
        return;
    }
    for c in buf.iter_mut() {
        *c = mul_div255_u8(u16::from(*c), w);
    }
}

/// Mix the color of every pixel toward `color` by `amount`, keeping coverage.
pub fn tint_in_place(buf: &mut [u8], color: Rgba8, amount: f64) {
    let k = unit_to_u16(amount);
    if k == 0 {
        return;
    }
    let keep = 255 - k;
    let tint = [color.r, color.g, color.b];
    for px in buf.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in 0..3 {
            let target = mul_div255_u8(u16::from(tint[c]), a);
            px[c] = mul_div255_u8(u16::from(px[c]), keep)
                .saturating_add(mul_div255_u8(u16::from(target), k))
                .min(px[3]);
        }
    }
}

pub fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

pub fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
