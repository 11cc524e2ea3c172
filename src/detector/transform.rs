//! Perspective rectification from located pattern centers to the ideal
//! module grid.
//!
//! Transforms are 3x3 homogeneous matrices composed the standard way:
//! square-to-quadrilateral for the image corners, the adjugate for the
//! grid corners, multiplied into a single grid-to-image mapping.

use crate::models::{Bitmap, Module, Point};

/// 3x3 homogeneous plane transform.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveTransform {
    a11: f32,
    a21: f32,
    a31: f32,
    a12: f32,
    a22: f32,
    a32: f32,
    a13: f32,
    a23: f32,
    a33: f32,
}

impl PerspectiveTransform {
    /// Map the unit square onto the quadrilateral `p0 p1 p2 p3`
    /// (clockwise from the top-left corner).
    pub fn square_to_quadrilateral(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        let dx3 = p0.x - p1.x + p2.x - p3.x;
        let dy3 = p0.y - p1.y + p2.y - p3.y;
        if dx3 == 0.0 && dy3 == 0.0 {
            // Affine case.
            return Self {
                a11: p1.x - p0.x,
                a21: p2.x - p1.x,
                a31: p0.x,
                a12: p1.y - p0.y,
                a22: p2.y - p1.y,
                a32: p0.y,
                a13: 0.0,
                a23: 0.0,
                a33: 1.0,
            };
        }
        let dx1 = p1.x - p2.x;
        let dx2 = p3.x - p2.x;
        let dy1 = p1.y - p2.y;
        let dy2 = p3.y - p2.y;
        let denominator = dx1 * dy2 - dx2 * dy1;
        let a13 = (dx3 * dy2 - dx2 * dy3) / denominator;
        let a23 = (dx1 * dy3 - dx3 * dy1) / denominator;
        Self {
            a11: p1.x - p0.x + a13 * p1.x,
            a21: p3.x - p0.x + a23 * p3.x,
            a31: p0.x,
            a12: p1.y - p0.y + a13 * p1.y,
            a22: p3.y - p0.y + a23 * p3.y,
            a32: p0.y,
            a13,
            a23,
            a33: 1.0,
        }
    }

    /// Inverse mapping, up to scale: the adjugate.
    pub fn quadrilateral_to_square(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self::square_to_quadrilateral(p0, p1, p2, p3).adjugate()
    }

    fn adjugate(&self) -> Self {
        Self {
            a11: self.a22 * self.a33 - self.a23 * self.a32,
            a21: self.a23 * self.a31 - self.a21 * self.a33,
            a31: self.a21 * self.a32 - self.a22 * self.a31,
            a12: self.a13 * self.a32 - self.a12 * self.a33,
            a22: self.a11 * self.a33 - self.a13 * self.a31,
            a32: self.a12 * self.a31 - self.a11 * self.a32,
            a13: self.a12 * self.a23 - self.a13 * self.a22,
            a23: self.a13 * self.a21 - self.a11 * self.a23,
            a33: self.a11 * self.a22 - self.a12 * self.a21,
        }
    }

    /// Composition: apply `other`, then `self`.
    pub fn times(&self, other: &Self) -> Self {
        Self {
            a11: self.a11 * other.a11 + self.a21 * other.a12 + self.a31 * other.a13,
            a21: self.a11 * other.a21 + self.a21 * other.a22 + self.a31 * other.a23,
            a31: self.a11 * other.a31 + self.a21 * other.a32 + self.a31 * other.a33,
            a12: self.a12 * other.a11 + self.a22 * other.a12 + self.a32 * other.a13,
            a22: self.a12 * other.a21 + self.a22 * other.a22 + self.a32 * other.a23,
            a32: self.a12 * other.a31 + self.a22 * other.a32 + self.a32 * other.a33,
            a13: self.a13 * other.a11 + self.a23 * other.a12 + self.a33 * other.a13,
            a23: self.a13 * other.a21 + self.a23 * other.a22 + self.a33 * other.a23,
            a33: self.a13 * other.a31 + self.a23 * other.a32 + self.a33 * other.a33,
        }
    }

    /// Map one quadrilateral onto another through the unit square.
    pub fn quadrilateral_to_quadrilateral(
        from: [Point; 4],
        to: [Point; 4],
    ) -> Self {
        let q_to_s = Self::quadrilateral_to_square(from[0], from[1], from[2], from[3]);
        let s_to_q = Self::square_to_quadrilateral(to[0], to[1], to[2], to[3]);
        s_to_q.times(&q_to_s)
    }

    /// Transform a point.
    pub fn transform(&self, p: Point) -> Point {
        let denominator = self.a13 * p.x + self.a23 * p.y + self.a33;
        Point::new(
            (self.a11 * p.x + self.a21 * p.y + self.a31) / denominator,
            (self.a12 * p.x + self.a22 * p.y + self.a32) / denominator,
        )
    }
}

/// Sample every module center of a `size x size` grid out of the binarized
/// image. The homogeneous divide is truncated toward zero (not rounded)
/// and the sample point is clamped into the image.
pub fn sample_grid(
    image: &Bitmap,
    grid_to_image: &PerspectiveTransform,
    size: usize,
) -> Bitmap {
    let mut out = Bitmap::square(size);
    let max_x = image.width().saturating_sub(1) as i32;
    let max_y = image.height().saturating_sub(1) as i32;
    for iy in 0..size {
        for ix in 0..size {
            let p = grid_to_image.transform(Point::new(ix as f32 + 0.5, iy as f32 + 0.5));
            let sx = (p.x as i32).clamp(0, max_x);
            let sy = (p.y as i32).clamp(0, max_y);
            let dark = image.dark(sx as usize, sy as usize);
            let _ = out.set(ix as i32, iy as i32, Module::from_dark(dark));
        }
    }
    out
}
