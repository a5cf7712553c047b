use super::{Rect, Vec2};

/// 2×3 affine transform.
///
/// Column-major 2×2 linear part (`a b` is the first column, `c d` the second)
/// plus translation `tx ty`:
///
/// ```text
/// | a c tx |
/// | b d ty |
/// ```
///
/// Composition follows the right-multiply convention: `self.then_apply(m)`
/// yields `self ∘ m`, so `m` acts in the already-transformed local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Affine {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Affine {
    pub const IDENTITY: Affine = Affine { a: 1.0, b: 0.0, c: 0.0, d: 1.0, tx: 0.0, ty: 0.0 };

    #[inline]
    pub const fn new(a: f32, b: f32, c: f32, d: f32, tx: f32, ty: f32) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    #[inline]
    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `radians`; positive angles turn +X towards +Y.
    #[inline]
    pub fn rotation(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        Self::new(c, s, -s, c, 0.0, 0.0)
    }

    /// Bit-exact identity test (used to skip the transform pass entirely).
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Returns `self ∘ m`: points are transformed by `m` first, then by `self`.
    #[inline]
    pub fn then_apply(&self, m: &Affine) -> Affine {
        Affine {
            a: self.a * m.a + self.c * m.b,
            b: self.b * m.a + self.d * m.b,
            c: self.a * m.c + self.c * m.d,
            d: self.b * m.c + self.d * m.d,
            tx: self.a * m.tx + self.c * m.ty + self.tx,
            ty: self.b * m.tx + self.d * m.ty + self.ty,
        }
    }

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            self.a * p.x + self.c * p.y + self.tx,
            self.b * p.x + self.d * p.y + self.ty,
        )
    }

    /// Axis-aligned bounds of `rect` after transformation. Rotated rectangles
    /// degrade to their bounding box.
    pub fn transform_rect_bounds(&self, rect: Rect) -> Rect {
        let corners = rect.normalized().corners().map(|p| self.apply(p));
        Rect::bounding(&corners).unwrap_or(rect)
    }
}
