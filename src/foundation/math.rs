/// FNV-1a 64-bit hasher used for stable pixel fingerprints.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Uniform scale that brings `(w, h)` inside `(max_w, max_h)`, capped at `1.0` (never upscales).
pub(crate) fn fit_scale(w: u32, h: u32, max_w: u32, max_h: u32) -> f64 {
    if w == 0 || h == 0 || (w <= max_w && h <= max_h) {
        return 1.0;
    }
    let sx = f64::from(max_w) / f64::from(w);
    let sy = f64::from(max_h) / f64::from(h);
    sx.min(sy).min(1.0)
}

/// Apply a uniform scale with floor rounding, keeping at least one pixel per side.
///
/// A small epsilon absorbs representation error so that `3000 * (800 / 3000)` floors to 800.
pub(crate) fn scaled_dims_floor(w: u32, h: u32, scale: f64) -> (u32, u32) {
    const EPS: f64 = 1e-6;
    if scale >= 1.0 {
        return (w, h);
    }
    let sw = (f64::from(w) * scale + EPS).floor().max(1.0) as u32;
    let sh = (f64::from(h) * scale + EPS).floor().max(1.0) as u32;
    (sw, sh)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
