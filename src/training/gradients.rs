//! Per-sample gradient storage.

/// Gradient and hessian buffers for one boosting round.
///
/// Stored as two separate arrays so histogram building can gather either one
/// sequentially.
#[derive(Clone, Debug, Default)]
pub struct Gradients {
    grad: Vec<f32>,
    hess: Vec<f32>,
}

impl Gradients {
    /// Zeroed buffers for `n_samples` rows.
    pub fn new(n_samples: usize) -> Self {
        Self {
            grad: vec![0.0; n_samples],
            hess: vec![0.0; n_samples],
        }
    }

    /// Number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.grad.len()
    }

    /// Gradients.
    #[inline]
    pub fn grads(&self) -> &[f32] {
        &self.grad
    }

    /// Hessians.
    #[inline]
    pub fn hess(&self) -> &[f32] {
        &self.hess
    }

    /// Mutable gradient and hessian slices.
    #[inline]
    pub fn as_mut_slices(&mut self) -> (&mut [f32], &mut [f32]) {
        (&mut self.grad, &mut self.hess)
    }

    /// Gradient and hessian of one sample.
    #[inline]
    pub fn get(&self, row: usize) -> (f32, f32) {
        (self.grad[row], self.hess[row])
    }

    /// Sum gradients and hessians over `rows` (all rows when `None`).
    ///
    /// Accumulates in `f64`. Repeated rows are counted once per occurrence.
    pub fn sum(&self, rows: Option<&[u32]>) -> (f64, f64) {
        match rows {
            None => self
                .grad
                .iter()
                .zip(&self.hess)
                .fold((0.0, 0.0), |(g, h), (&gi, &hi)| (g + gi as f64, h + hi as f64)),
            Some(rows) => rows.iter().fold((0.0, 0.0), |(g, h), &r| {
                let r = r as usize;
                (g + self.grad[r] as f64, h + self.hess[r] as f64)
            }),
        }
    }

    /// Gather `rows` into the provided ordered buffers.
    pub fn gather(&self, rows: &[u32], grad_out: &mut Vec<f32>, hess_out: &mut Vec<f32>) {
        grad_out.clear();
        hess_out.clear();
        grad_out.extend(rows.iter().map(|&r| self.grad[r as usize]));
        hess_out.extend(rows.iter().map(|&r| self.hess[r as usize]));
    }
}
