/// Logistic sigmoid of a single logit.
///
/// Used in multi-label mode, where classes are not mutually exclusive and
/// every logit is activated independently.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Numerically stable softmax, computed in place.
///
/// The maximum logit is subtracted before exponentiation so that large logits
/// cannot overflow. A slice of length one short-circuits to `[1.0]` and an
/// empty slice is left untouched.
///
/// # Examples
///
/// ```
/// use ssd_postprocess::activation::softmax;
///
/// let mut values = [1.0f32, 1.0];
/// softmax(&mut values);
/// assert_eq!(values, [0.5, 0.5]);
/// ```
pub fn softmax(values: &mut [f32]) {
    if values.len() <= 1 {
        if let [value] = values {
            *value = 1.0;
        }
        return;
    }

    let max = values.iter().fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));

    let mut sum = 0.0;
    for value in values.iter_mut() {
        *value = (*value - max).exp();
        sum += *value;
    }
    for value in values.iter_mut() {
        *value /= sum;
    }
}
