use glam::{Quat, Vec3, Vec4};

/// A value that can live on a keyframe timeline.
///
/// `interpolate_cubic` implements the glTF cubic Hermite spline, where the
/// tangents are scaled by the keyframe interval `dt`.
pub trait Interpolatable: Copy {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;

    fn interpolate_cubic(
        v0: Self,
        out_tangent0: Self,
        in_tangent1: Self,
        v1: Self,
        t: f32,
        dt: f32,
    ) -> Self;
}

/// Hermite basis weights `(value0, tangent0, value1, tangent1)` at `t`.
#[inline]
fn hermite_basis(t: f32) -> (f32, f32, f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    (1.0 - h01, h10, h01, h11)
}

impl Interpolatable for f32 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start + (end - start) * t
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        h00 * v0 + h10 * out_tangent0 * dt + h01 * v1 + h11 * in_tangent1 * dt
    }
}

impl Interpolatable for Vec3 {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.lerp(end, t)
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        v0 * h00 + out_tangent0 * (h10 * dt) + v1 * h01 + in_tangent1 * (h11 * dt)
    }
}

impl Interpolatable for Quat {
    /// Spherical interpolation along the shortest arc: glam negates `end`
    /// when the two quaternions lie in opposite hemispheres.
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start.slerp(end, t)
    }

    fn interpolate_cubic(v0: Self, out_tangent0: Self, in_tangent1: Self, v1: Self, t: f32, dt: f32) -> Self {
        let (h00, h10, h01, h11) = hermite_basis(t);
        let blended = Vec4::from(v0) * h00
            + Vec4::from(out_tangent0) * (h10 * dt)
            + Vec4::from(v1) * h01
            + Vec4::from(in_tangent1) * (h11 * dt);
        Quat::from_vec4(blended).normalize()
    }
}
