pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Canvas center point.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Return `true` when `p` lies within `[0,width] x [0,height]`.
    pub fn contains(self, p: Point) -> bool {
        p.x >= 0.0 && p.x <= f64::from(self.width) && p.y >= 0.0 && p.y <= f64::from(self.height)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        // Full scene canvas used by the builder and viewer.
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Fully opaque color from straight RGB.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_canvas_is_full_hd() {
        let c = Canvas::default();
        assert_eq!((c.width, c.height), (1920, 1080));
        assert_eq!(c.center(), Point::new(960.0, 540.0));
    }

    #[test]
    fn canvas_contains_is_inclusive() {
        let c = Canvas::default();
        assert!(c.contains(Point::new(0.0, 0.0)));
        assert!(c.contains(Point::new(1920.0, 1080.0)));
        assert!(!c.contains(Point::new(-0.5, 10.0)));
        assert!(!c.contains(Point::new(10.0, 1080.5)));
    }

    #[test]
    fn premultiply_rounds_to_nearest() {
        let p = Rgba8Premul::from_straight_rgba(255, 128, 0, 128);
        assert_eq!(p, Rgba8Premul { r: 128, g: 64, b: 0, a: 128 });
    }
}
