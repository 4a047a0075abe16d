/// `n` evenly spaced points over `[min, max]`, both ends included.
pub struct Linspace {
    start: f64,
    end: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Linspace {
    pub fn new(min: f64, max: f64, n: usize) -> Self {
        let step = if n > 1 {
            let num_steps = (n - 1) as f64;
            (max - min) / num_steps
        } else {
            0.
        };
        Linspace {
            start: min,
            end: max,
            step,
            index: 0,
            len: n,
        }
    }
}

impl Iterator for Linspace {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            None
        } else {
            // Calculate the value just like numpy.linspace does, the last point is `max` itself
            let i = self.index;
            self.index += 1;

            if i + 1 == self.len && self.len > 1 {
                Some(self.end)
            } else {
                Some(self.start + self.step * i as f64)
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Linspace {}

/// Points `min, min + step, min + 2 * step, ...` strictly below `max`.
pub struct Arange {
    start: f64,
    step: f64,
    index: usize,
    len: usize,
}

impl Arange {
    /// `step` must be positive.
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        // Same length numpy.arange computes
        let len = ((max - min) / step).ceil().max(0.) as usize;

        Arange {
            start: min,
            step,
            index: 0,
            len,
        }
    }
}

impl Iterator for Arange {
    type Item = f64;

    #[inline]
    fn next(&mut self) -> Option<f64> {
        if self.index >= self.len {
            None
        } else {
            let i = self.index;
            self.index += 1;
            Some(self.start + self.step * i as f64)
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.len - self.index;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Arange {}

#[test]
fn test_linspace() {
    let points: Vec<f64> = Linspace::new(0., 10., 5).collect();

    assert_eq!(points, vec![0., 2.5, 5., 7.5, 10.]);
    assert_eq!(Linspace::new(3., 4., 1).collect::<Vec<_>>(), vec![3.]);
    assert_eq!(Linspace::new(3., 4., 0).count(), 0);
}

#[test]
fn test_linspace_ends_at_max() {
    let points: Vec<f64> = Linspace::new(0., 0.7, 36).collect();

    assert_eq!(points.len(), 36);
    assert_eq!(points[35], 0.7);
    assert!(points.iter().all(|&x| (0. ..=0.7).contains(&x)));
}

#[test]
fn test_arange() {
    let points: Vec<f64> = Arange::new(0., 1., 0.25).collect();

    assert_eq!(points, vec![0., 0.25, 0.5, 0.75]);
    assert_eq!(Arange::new(0., 1., 0.3).len(), 4);
    assert_eq!(Arange::new(0., 1., 2.).collect::<Vec<_>>(), vec![0.]);
}
