use num::Float;

/// Similar to numpy.interp: piecewise-linear interpolation through `coords`,
/// constant beyond the first and last points.
pub(crate) fn interp<F: Float>(
    x_input: impl IntoIterator<Item = F>,
    coords: impl IntoIterator<Item = (F, F)> + Clone,
) -> Vec<F> {
    x_input
        .into_iter()
        .map(|x| {
            let mut iter = coords.clone().into_iter().enumerate().peekable();

            while let Some((i, (x1, y1))) = iter.next() {
                // Base cases
                if i == 0 && x < x1 {
                    return y1;
                }
                if iter.peek().is_none() && x >= x1 {
                    return y1;
                }

                let Some(&(_, (x2, y2))) = iter.peek() else {
                    continue;
                };

                if x1 <= x && x <= x2 {
                    if x2 == x1 {
                        return y2;
                    }

                    return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
                }
            }

            // No coords, or x is NaN
            F::nan()
        })
        .collect()
}

/// Running sum, like numpy.cumsum
pub(crate) fn cumsum<F: Float>(values: impl IntoIterator<Item = F>) -> Vec<F> {
    values
        .into_iter()
        .scan(F::zero(), |acc, v| {
            *acc = *acc + v;
            Some(*acc)
        })
        .collect()
}

/// Leftmost insertion point of `target` in the sorted slice, like python's bisect.bisect_left
pub(crate) fn bisect_left<F: Float>(sorted: &[F], target: F) -> usize {
    sorted.partition_point(|v| *v < target)
}

/// Median of the values in the given (sorted) order; the mean of the two middle ones for even lengths.
pub(crate) fn median<F: Float>(sorted: &[F]) -> F {
    let n = sorted.len();

    match n {
        0 => F::nan(),
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / (F::one() + F::one()),
    }
}

#[test]
fn test_interp() {
    let x = [0., 1., 1.5, 2.72, 3.24];
    let xs = [1., 2., 3.];
    let ys = [3., 2., 0.];

    assert_eq!(
        interp(x, xs.into_iter().zip(ys)),
        vec![3., 3., 2.5, 0.5599999999999996, 0.]
    );

    let x = [2.5, -1., 7.5];
    let xs = [0., 1., 2., 3., 4.5];
    let ys = [0., 2., 5., 3., 2.];

    assert_eq!(interp(x, xs.into_iter().zip(ys)), vec![4., 0., 2.]);
}

#[test]
fn test_interp_vertical_edge() {
    let coords = [(0., 0.), (1., 0.), (1., 1.), (2., 1.)];

    assert_eq!(interp([0.5, 1., 1.5], coords), vec![0., 0., 1.]);
}

#[test]
fn test_cumsum_and_bisect() {
    let cum = cumsum([0., 0.5, 1., 1., 0.]);

    assert_eq!(cum, vec![0., 0.5, 1.5, 2.5, 2.5]);
    assert_eq!(bisect_left(&cum, 1.25), 2);
    assert_eq!(bisect_left(&cum, 0.), 0);
    assert_eq!(bisect_left(&cum, 2.5), 3);
}

#[test]
fn test_median() {
    assert_eq!(median(&[1., 2., 3.]), 2.);
    assert_eq!(median(&[1., 2., 3., 4.]), 2.5);
    assert!(median::<f64>(&[]).is_nan());
}
