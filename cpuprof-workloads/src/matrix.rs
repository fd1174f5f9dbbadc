//! Matrix operations demo: cache-unfriendly vs cache-friendly multiplication,
//! blocked and Strassen variants, convolution and element-wise kernels.

use crate::{Scale, WorkloadError, banner, footer};
use cpuprof_core::{ScopedTimer, time};
use rand::Rng;
use rayon::prelude::*;

/// Dense row-major `f64` matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled matrix
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Matrix with every entry set to `value`
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Uniform random entries in `[0, 1)`
    pub fn random(rows: usize, cols: usize) -> Self {
        let mut rng = rand::thread_rng();
        Self::from_fn(rows, cols, |_, _| rng.r#gen::<f64>())
    }

    /// Build from a function of `(row, col)`
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    #[allow(missing_docs)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[allow(missing_docs)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    #[allow(missing_docs)]
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    #[inline]
    fn add_at(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] += value;
    }

    /// Row `i` as a slice
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// New matrix with rows and columns swapped
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::new(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                t.set(j, i, self.get(i, j));
            }
        }
        t
    }

    /// Sum of the main diagonal
    pub fn trace(&self) -> f64 {
        (0..self.rows.min(self.cols)).map(|i| self.get(i, i)).sum()
    }

    /// Square root of the sum of squared entries
    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Largest absolute entry-wise difference; `f64::INFINITY` on shape mismatch
    pub fn max_abs_diff(&self, other: &Matrix) -> f64 {
        if self.rows != other.rows || self.cols != other.cols {
            return f64::INFINITY;
        }
        self.data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    fn zip_with(&self, other: &Matrix, f: impl Fn(f64, f64) -> f64) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    fn quadrant(&self, qi: usize, qj: usize, half: usize) -> Matrix {
        Matrix::from_fn(half, half, |i, j| self.get(qi * half + i, qj * half + j))
    }

    fn padded(&self, n: usize) -> Matrix {
        Matrix::from_fn(n, n, |i, j| {
            if i < self.rows && j < self.cols {
                self.get(i, j)
            } else {
                0.0
            }
        })
    }
}

fn check_inner(a: &Matrix, b: &Matrix) -> Result<(), WorkloadError> {
    if a.cols != b.rows {
        return Err(WorkloadError::DimensionMismatch {
            left: (a.rows, a.cols),
            right: (b.rows, b.cols),
        });
    }
    Ok(())
}

/// Textbook i-j-k triple loop; strides down the columns of `b`.
pub fn multiply_naive(a: &Matrix, b: &Matrix) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    let mut c = Matrix::new(a.rows, b.cols);
    for i in 0..a.rows {
        for j in 0..b.cols {
            let mut sum = 0.0;
            for k in 0..a.cols {
                sum += a.get(i, k) * b.get(k, j);
            }
            c.set(i, j, sum);
        }
    }
    Ok(c)
}

/// Multiply against `bᵀ` so both operands are read along rows.
pub fn multiply_transposed(a: &Matrix, b: &Matrix) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    let bt = b.transpose();
    let mut c = Matrix::new(a.rows, b.cols);
    for i in 0..a.rows {
        let row = a.row(i);
        for j in 0..b.cols {
            let sum = row.iter().zip(bt.row(j)).map(|(x, y)| x * y).sum();
            c.set(i, j, sum);
        }
    }
    Ok(c)
}

/// Loop-tiled multiply with `tile x tile` blocks and an i-k-j inner order.
pub fn multiply_tiled(a: &Matrix, b: &Matrix, tile: usize) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    let tile = tile.max(1);
    let (n, m, p) = (a.rows, a.cols, b.cols);
    let mut c = Matrix::new(n, p);
    for ii in (0..n).step_by(tile) {
        for kk in (0..m).step_by(tile) {
            for jj in (0..p).step_by(tile) {
                for i in ii..(ii + tile).min(n) {
                    for k in kk..(kk + tile).min(m) {
                        let aik = a.get(i, k);
                        for j in jj..(jj + tile).min(p) {
                            c.add_at(i, j, aik * b.get(k, j));
                        }
                    }
                }
            }
        }
    }
    Ok(c)
}

/// Block multiply: accumulate `C[I,J] += A[I,K] · B[K,J]` one block product at a time.
pub fn multiply_blocked(a: &Matrix, b: &Matrix, block: usize) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    let block = block.max(1);
    let (n, m, p) = (a.rows, a.cols, b.cols);
    let mut c = Matrix::new(n, p);
    for i0 in (0..n).step_by(block) {
        for j0 in (0..p).step_by(block) {
            for k0 in (0..m).step_by(block) {
                let i_end = (i0 + block).min(n);
                let j_end = (j0 + block).min(p);
                let k_end = (k0 + block).min(m);
                for i in i0..i_end {
                    for j in j0..j_end {
                        let mut sum = 0.0;
                        for k in k0..k_end {
                            sum += a.get(i, k) * b.get(k, j);
                        }
                        c.add_at(i, j, sum);
                    }
                }
            }
        }
    }
    Ok(c)
}

/// Strassen's seven-product recursion for square matrices.
///
/// Falls back to the naive product at or below `min_size`; odd sizes are
/// zero-padded by one and the result is cropped back.
pub fn multiply_strassen(
    a: &Matrix,
    b: &Matrix,
    min_size: usize,
) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    if a.rows != a.cols || b.rows != b.cols {
        return Err(WorkloadError::DimensionMismatch {
            left: (a.rows, a.cols),
            right: (b.rows, b.cols),
        });
    }
    Ok(strassen(a, b, min_size.max(1)))
}

fn strassen(a: &Matrix, b: &Matrix, min_size: usize) -> Matrix {
    let n = a.rows;
    if n <= min_size {
        return naive_square(a, b);
    }
    if n % 2 != 0 {
        let c = strassen(&a.padded(n + 1), &b.padded(n + 1), min_size);
        return Matrix::from_fn(n, n, |i, j| c.get(i, j));
    }

    let h = n / 2;
    let (a11, a12) = (a.quadrant(0, 0, h), a.quadrant(0, 1, h));
    let (a21, a22) = (a.quadrant(1, 0, h), a.quadrant(1, 1, h));
    let (b11, b12) = (b.quadrant(0, 0, h), b.quadrant(0, 1, h));
    let (b21, b22) = (b.quadrant(1, 0, h), b.quadrant(1, 1, h));
    let add = |x: &Matrix, y: &Matrix| x.zip_with(y, |p, q| p + q);
    let sub = |x: &Matrix, y: &Matrix| x.zip_with(y, |p, q| p - q);

    let m1 = strassen(&add(&a11, &a22), &add(&b11, &b22), min_size);
    let m2 = strassen(&add(&a21, &a22), &b11, min_size);
    let m3 = strassen(&a11, &sub(&b12, &b22), min_size);
    let m4 = strassen(&a22, &sub(&b21, &b11), min_size);
    let m5 = strassen(&add(&a11, &a12), &b22, min_size);
    let m6 = strassen(&sub(&a21, &a11), &add(&b11, &b12), min_size);
    let m7 = strassen(&sub(&a12, &a22), &add(&b21, &b22), min_size);

    let c11 = add(&sub(&add(&m1, &m4), &m5), &m7);
    let c12 = add(&m3, &m5);
    let c21 = add(&m2, &m4);
    let c22 = add(&add(&sub(&m1, &m2), &m3), &m6);

    Matrix::from_fn(n, n, |i, j| match (i < h, j < h) {
        (true, true) => c11.get(i, j),
        (true, false) => c12.get(i, j - h),
        (false, true) => c21.get(i - h, j),
        (false, false) => c22.get(i - h, j - h),
    })
}

fn naive_square(a: &Matrix, b: &Matrix) -> Matrix {
    let mut c = Matrix::new(a.rows, b.cols);
    for i in 0..a.rows {
        for k in 0..a.cols {
            let aik = a.get(i, k);
            for j in 0..b.cols {
                c.add_at(i, j, aik * b.get(k, j));
            }
        }
    }
    c
}

/// Rows computed in parallel on the rayon pool, each against `bᵀ`.
pub fn multiply_parallel(a: &Matrix, b: &Matrix) -> Result<Matrix, WorkloadError> {
    check_inner(a, b)?;
    let bt = b.transpose();
    let p = b.cols;
    let mut data = vec![0.0; a.rows * p];
    data.par_chunks_mut(p.max(1)).enumerate().for_each(|(i, out)| {
        let row = a.row(i);
        for (j, slot) in out.iter_mut().enumerate() {
            *slot = row.iter().zip(bt.row(j)).map(|(x, y)| x * y).sum();
        }
    });
    Ok(Matrix {
        rows: a.rows,
        cols: p,
        data,
    })
}

/// Valid-mode 2-D convolution (no padding, no kernel flip).
pub fn convolve_2d(input: &Matrix, kernel: &Matrix) -> Result<Matrix, WorkloadError> {
    if kernel.rows > input.rows || kernel.cols > input.cols {
        return Err(WorkloadError::DimensionMismatch {
            left: (input.rows, input.cols),
            right: (kernel.rows, kernel.cols),
        });
    }
    let out_rows = input.rows - kernel.rows + 1;
    let out_cols = input.cols - kernel.cols + 1;
    Ok(Matrix::from_fn(out_rows, out_cols, |i, j| {
        let mut sum = 0.0;
        for ki in 0..kernel.rows {
            for kj in 0..kernel.cols {
                sum += input.get(i + ki, j + kj) * kernel.get(ki, kj);
            }
        }
        sum
    }))
}

/// `a·b + sin(a) − cos(b)` entry-wise.
pub fn elementwise(a: &Matrix, b: &Matrix) -> Result<Matrix, WorkloadError> {
    if a.rows != b.rows || a.cols != b.cols {
        return Err(WorkloadError::DimensionMismatch {
            left: (a.rows, a.cols),
            right: (b.rows, b.cols),
        });
    }
    Ok(a.zip_with(b, |x, y| x * y + x.sin() - y.cos()))
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    banner("Matrix Operations Profiling Examples");

    let size = scale.pick(300, 32);
    println!("\n1. Naive vs Transposed Multiplication ({0}x{0}):", size);
    let a = Matrix::random(size, size);
    let b = Matrix::random(size, size);
    let (naive, naive_time) = time(|| multiply_naive(&a, &b));
    let naive = naive?;
    println!("   Naive implementation: {:.3}s", naive_time.as_secs_f64());
    let (transposed, opt_time) = time(|| multiply_transposed(&a, &b));
    let transposed = transposed?;
    println!("   Transposed implementation: {:.3}s", opt_time.as_secs_f64());
    if opt_time.as_secs_f64() > 0.0 {
        println!(
            "   Speedup: {:.2}x",
            naive_time.as_secs_f64() / opt_time.as_secs_f64()
        );
    }
    tracing::debug!(diff = naive.max_abs_diff(&transposed), "naive vs transposed");

    let conv = scale.pick(200, 24);
    println!("\n2. 2D Convolution ({0}x{0} with 5x5 kernel):", conv);
    let input = Matrix::random(conv, conv);
    let kernel = Matrix::random(5, 5);
    let (out, conv_time) = time(|| convolve_2d(&input, &kernel));
    let out = out?;
    println!(
        "   Convolution time: {:.3}s ({}x{} output)",
        conv_time.as_secs_f64(),
        out.rows(),
        out.cols()
    );

    let adv = scale.pick(256, 40);
    println!("\n3. Advanced Multiplication Algorithms ({0}x{0}):", adv);
    let a = Matrix::random(adv, adv);
    let b = Matrix::random(adv, adv);
    {
        let _t = ScopedTimer::new("Tiled multiplication (64)");
        multiply_tiled(&a, &b, 64)?;
    }
    {
        let _t = ScopedTimer::new("Block multiplication (64)");
        multiply_blocked(&a, &b, 64)?;
    }
    {
        let _t = ScopedTimer::new("Strassen's algorithm");
        multiply_strassen(&a, &b, 64)?;
    }
    {
        let _t = ScopedTimer::new("Parallel row multiplication");
        multiply_parallel(&a, &b)?;
    }

    let ops = scale.pick(500, 48);
    println!("\n4. Additional Matrix Operations ({0}x{0}):", ops);
    let a = Matrix::random(ops, ops);
    let b = Matrix::random(ops, ops);
    {
        let _t = ScopedTimer::new("Matrix transpose");
        let _ = a.transpose();
    }
    {
        let _t = ScopedTimer::new("Element-wise operations");
        elementwise(&a, &b)?;
    }
    {
        let _t = ScopedTimer::new("Matrix trace calculation");
        println!("     Trace: {:.4}", a.trace());
    }
    {
        let _t = ScopedTimer::new("Frobenius norm");
        println!("     Norm: {:.4}", a.frobenius_norm());
    }
    {
        let _t = ScopedTimer::new("Transpose + copy operations");
        let t = a.transpose();
        let copy = a.clone();
        tracing::debug!(rows = t.rows() + copy.rows(), "transpose + copy");
    }

    footer();
    println!("Matrix operations profiling complete!");
    println!("\nProfiler hints:");
    println!("- Look for cache miss patterns in naive multiplication");
    println!("- Compare CPU utilization between different algorithms");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(n: usize) -> (Matrix, Matrix) {
        (
            Matrix::from_fn(n, n, |i, j| (i * j) as f64 * 0.5 + 1.0),
            Matrix::from_fn(n, n, |i, j| (i + j) as f64 - 2.0),
        )
    }

    #[test]
    fn test_small_product() {
        let a = Matrix::from_fn(2, 2, |i, j| [[1.0, 2.0], [3.0, 4.0]][i][j]);
        let b = Matrix::from_fn(2, 2, |i, j| [[5.0, 6.0], [7.0, 8.0]][i][j]);
        let c = multiply_naive(&a, &b).unwrap();
        assert_eq!(c.row(0), &[19.0, 22.0]);
        assert_eq!(c.row(1), &[43.0, 50.0]);
    }

    #[test]
    fn test_variants_agree() {
        let (a, b) = sample(37);
        let reference = multiply_naive(&a, &b).unwrap();
        let eps = 1e-6;
        assert!(reference.max_abs_diff(&multiply_transposed(&a, &b).unwrap()) < eps);
        assert!(reference.max_abs_diff(&multiply_tiled(&a, &b, 8).unwrap()) < eps);
        assert!(reference.max_abs_diff(&multiply_blocked(&a, &b, 16).unwrap()) < eps);
        assert!(reference.max_abs_diff(&multiply_parallel(&a, &b).unwrap()) < eps);
        // odd size exercises the padding path
        assert!(reference.max_abs_diff(&multiply_strassen(&a, &b, 4).unwrap()) < 1e-3);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        assert!(matches!(
            multiply_naive(&a, &b),
            Err(WorkloadError::DimensionMismatch { .. })
        ));
        assert!(elementwise(&a, &Matrix::new(3, 2)).is_err());
        assert!(convolve_2d(&Matrix::new(3, 3), &Matrix::new(5, 5)).is_err());
    }

    #[test]
    fn test_convolution() {
        let input = Matrix::filled(6, 6, 1.0);
        let kernel = Matrix::filled(3, 3, 2.0);
        let out = convolve_2d(&input, &kernel).unwrap();
        assert_eq!((out.rows(), out.cols()), (4, 4));
        assert!(out.row(0).iter().all(|&v| (v - 18.0).abs() < 1e-12));
    }

    #[test]
    fn test_trace_and_norm() {
        let m = Matrix::from_fn(2, 2, |i, j| [[3.0, 0.0], [0.0, 4.0]][i][j]);
        assert_eq!(m.trace(), 7.0);
        assert!((m.frobenius_norm() - 5.0).abs() < 1e-12);
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn test_elementwise() {
        let a = Matrix::filled(1, 1, 0.0);
        let b = Matrix::filled(1, 1, 0.0);
        let c = elementwise(&a, &b).unwrap();
        assert!((c.get(0, 0) + 1.0).abs() < 1e-12);
    }
}
