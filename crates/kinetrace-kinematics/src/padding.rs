//! Boundary extension shared by the recursive filter and the smoother.

/// Extend `samples` by `padding` values on each side, by point reflection
/// through the first and last samples.
///
/// The value `padding - i` samples inside the series becomes
/// `2 * boundary - inner`, so a linear trend continues across the edge.
/// Series shorter than the padding reuse their far end for the missing
/// reflection sources.
pub fn reflect_pad(samples: &[f64], padding: usize) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let first = samples[0];
    let last = samples[n - 1];
    let mut padded = Vec::with_capacity(n + 2 * padding);

    for i in 0..padding {
        let source = (padding - i).min(n - 1);
        padded.push(2.0 * first - samples[source]);
    }
    padded.extend_from_slice(samples);
    for i in 0..padding {
        let source = (n - 1).saturating_sub(i + 1);
        padded.push(2.0 * last - samples[source]);
    }

    padded
}

/// Set `margin` values at each end of the series to the undefined sentinel.
///
/// If the series is too short to have any computable value, all of it is
/// undefined.
pub fn mark_undefined(values: &mut [f64], margin: usize) {
    let n = values.len();
    if n <= 2 * margin {
        values.fill(kinetrace_core::UNDEFINED);
        return;
    }
    for i in 0..margin {
        values[i] = kinetrace_core::UNDEFINED;
        values[n - 1 - i] = kinetrace_core::UNDEFINED;
    }
}
