use super::histogram::Histogram;

/// 直方图相关系数（Pearson），范围约 [-1, 1]，越大越相似
///
/// 任一直方图方差为零（所有 bin 相等）时返回 1.0，与 OpenCV HISTCMP_CORREL 一致。
pub fn correlation(a: &Histogram, b: &Histogram) -> f64 {
    correlation_slices(a.bins(), b.bins())
}

fn correlation_slices(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len(), "histogram lengths differ");
    let n = a.len() as f64;
    if n == 0.0 {
        return 1.0;
    }

    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / n;

    let (mut cov, mut var_a, mut var_b) = (0f64, 0f64, 0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = var_a * var_b;
    if denom.abs() > f64::EPSILON {
        cov / denom.sqrt()
    } else {
        1.0
    }
}
