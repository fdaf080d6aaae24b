use ndarray::{Array1, ArrayBase, Axis, Data, Ix3};
use num::Float;

/// Computes the number of real tokens of each example of a padded batch of input features, of
/// shape `[batch, sentence, features]`. A position is a real token when at least one of its
/// features is non-zero; padding positions are all-zero.
///
/// The output can be passed as the `lengths` of the scoring functions.
///
/// # Example
///
/// ```rust
/// use ndarray::array;
/// use tagf1::lengths_from_features;
///
/// let features = array![
///     [[0.5, -1.0], [0.2, 0.0], [0.0, 0.0]],
///     [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]
/// ];
/// assert_eq!(lengths_from_features(&features), array![2, 0]);
/// ```
pub fn lengths_from_features<A, S>(features: &ArrayBase<S, Ix3>) -> Array1<usize>
where
    A: Float,
    S: Data<Elem = A>,
{
    features
        .map_axis(Axis(2), |slot| usize::from(slot.iter().any(|x| !x.is_zero())))
        .sum_axis(Axis(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_lengths_from_features() {
        let features = array![
            [[1.0, 0.0, 0.0], [0.0, 0.0, -3.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            [[0.1, 0.1, 0.1], [0.2, 0.0, 0.0], [0.0, 0.4, 0.0], [0.0, 0.0, 1e-9]],
        ];
        assert_eq!(lengths_from_features(&features), array![2, 4]);
    }

    #[test]
    fn test_lengths_of_empty_features() {
        let features: Array3<f32> = Array3::zeros((3, 0, 2));
        assert_eq!(lengths_from_features(&features), array![0, 0, 0]);
    }

    #[test]
    fn test_lengths_of_a_view() {
        let features: Array3<f64> = Array3::ones((2, 5, 3));
        let view = features.slice(ndarray::s![.., ..3, ..]);
        assert_eq!(lengths_from_features(&view), array![3, 3]);
    }
}
