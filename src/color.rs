//! Bit-exact color space conversions, per the literal formulas in
//! SPEC_FULL.md §6. These are hand-written rather than delegated to a
//! color-management crate so the specific constants (gamma threshold,
//! D65 matrix, Lab thresholds) match exactly and stay testable.

pub type Rgb = (u8, u8, u8);

pub fn rgb_to_hsl((r, g, b): Rgb) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if (max - min).abs() < f64::EPSILON {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };

    let mut h = if (max - r).abs() < f64::EPSILON {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if (max - g).abs() < f64::EPSILON {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    h /= 6.0;

    (h, s, l)
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

pub fn hsl_to_rgb((h, s, l): (f64, f64, f64)) -> Rgb {
    if s.abs() < f64::EPSILON {
        let v = (l * 255.0).round().clamp(0.0, 255.0) as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let r = hue_to_rgb(p, q, h + 1.0 / 3.0);
    let g = hue_to_rgb(p, q, h);
    let b = hue_to_rgb(p, q, h - 1.0 / 3.0);

    (
        (r * 255.0).round().clamp(0.0, 255.0) as u8,
        (g * 255.0).round().clamp(0.0, 255.0) as u8,
        (b * 255.0).round().clamp(0.0, 255.0) as u8,
    )
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f64) -> f64 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f64) -> f64 {
    if t > 0.008856 {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f64) -> f64 {
    let t3 = t * t * t;
    if t3 > 0.008856 {
        t3
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

/// D65 reference white, CIE 1931 2-degree observer.
const REF_X: f64 = 0.95047;
const REF_Y: f64 = 1.00000;
const REF_Z: f64 = 1.08883;

pub fn rgb_to_lab((r, g, b): Rgb) -> (f64, f64, f64) {
    let r = srgb_to_linear(r as f64 / 255.0);
    let g = srgb_to_linear(g as f64 / 255.0);
    let b = srgb_to_linear(b as f64 / 255.0);

    let x = (r * 0.4124 + g * 0.3576 + b * 0.1805) / REF_X;
    let y = (r * 0.2126 + g * 0.7152 + b * 0.0722) / REF_Y;
    let z = (r * 0.0193 + g * 0.1192 + b * 0.9505) / REF_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l = 116.0 * fy - 16.0;
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);

    (l, a, bb)
}

pub fn lab_to_rgb((l, a, b): (f64, f64, f64)) -> Rgb {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;

    let x = lab_f_inv(fx) * REF_X;
    let y = lab_f_inv(fy) * REF_Y;
    let z = lab_f_inv(fz) * REF_Z;

    let r = x * 3.2406 + y * -1.5372 + z * -0.4986;
    let g = x * -0.9689 + y * 1.8758 + z * 0.0415;
    let bl = x * 0.0557 + y * -0.2040 + z * 1.0570;

    let r = (linear_to_srgb(r) * 255.0).round().clamp(0.0, 255.0) as u8;
    let g = (linear_to_srgb(g) * 255.0).round().clamp(0.0, 255.0) as u8;
    let bl = (linear_to_srgb(bl) * 255.0).round().clamp(0.0, 255.0) as u8;

    (r, g, bl)
}

/// CIE76 color difference, as a plain Euclidean distance in Lab space.
pub fn delta_e76(a: (f64, f64, f64), b: (f64, f64, f64)) -> f64 {
    let dl = a.0 - b.0;
    let da = a.1 - b.1;
    let db = a.2 - b.2;
    (dl * dl + da * da + db * db).sqrt()
}

pub fn rgb_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.0 as f64 - b.0 as f64;
    let dg = a.1 as f64 - b.1 as f64;
    let db = a.2 as f64 - b.2 as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgb, b: Rgb, tol: i32) {
        assert!((a.0 as i32 - b.0 as i32).abs() <= tol, "{:?} vs {:?}", a, b);
        assert!((a.1 as i32 - b.1 as i32).abs() <= tol, "{:?} vs {:?}", a, b);
        assert!((a.2 as i32 - b.2 as i32).abs() <= tol, "{:?} vs {:?}", a, b);
    }

    #[test]
    fn test_rgb_lab_roundtrip() {
        for c in [(0, 0, 0), (255, 255, 255), (128, 64, 200), (10, 200, 30)] {
            let lab = rgb_to_lab(c);
            let back = lab_to_rgb(lab);
            assert_close(c, back, 1);
        }
    }

    #[test]
    fn test_rgb_hsl_roundtrip() {
        for c in [(0, 0, 0), (255, 255, 255), (128, 64, 200), (10, 200, 30)] {
            let hsl = rgb_to_hsl(c);
            let back = hsl_to_rgb(hsl);
            assert_close(c, back, 1);
        }
    }

    #[test]
    fn test_delta_e76_same_color() {
        let lab = rgb_to_lab((100, 150, 200));
        assert_eq!(delta_e76(lab, lab), 0.0);
    }

    #[test]
    fn test_delta_e76_distinct_colors_positive() {
        let a = rgb_to_lab((0, 0, 0));
        let b = rgb_to_lab((255, 255, 255));
        assert!(delta_e76(a, b) > 50.0);
    }
}
