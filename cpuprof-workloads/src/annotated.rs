//! NVTX-annotated pipeline demo. Every phase opens a named, colored range so
//! the nsys timeline shows preprocessing, training epochs, pipeline batches
//! and the two-domain workflow as nested blocks.

use crate::cpu::quick_sort;
use crate::matrix::{Matrix, multiply_transposed};
use crate::{Scale, banner, footer};
use cpuprof_core::{Color, Domain, Range, annotate, profile_function, time};
use rand::Rng;
use std::collections::HashMap;
use std::f64::consts::PI;
use std::time::Duration;

/// Domain for loading and preparation ranges
pub const DATA_OPS: Domain = Domain("DataOps");
/// Domain for compute ranges
pub const COMPUTE_OPS: Domain = Domain("ComputeOps");

/// Standard normal sample via Box-Muller
fn randn(rng: &mut impl Rng) -> f64 {
    let u1: f64 = rng.r#gen::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

fn randn_matrix(rows: usize, cols: usize) -> Matrix {
    let mut rng = rand::thread_rng();
    Matrix::from_fn(rows, cols, |_, _| randn(&mut rng))
}

/// Forward DFT of a real signal, returned as `(re, im)` pairs.
pub fn dft(signal: &[f64]) -> Vec<(f64, f64)> {
    let n = signal.len();
    (0..n)
        .map(|k| {
            signal.iter().enumerate().fold((0.0, 0.0), |(re, im), (t, &x)| {
                let angle = -2.0 * PI * (k * t) as f64 / n as f64;
                (re + x * angle.cos(), im + x * angle.sin())
            })
        })
        .collect()
}

/// Inverse DFT, keeping only the real part.
pub fn idft_real(spectrum: &[(f64, f64)]) -> Vec<f64> {
    let n = spectrum.len();
    (0..n)
        .map(|t| {
            let sum: f64 = spectrum
                .iter()
                .enumerate()
                .map(|(k, &(re, im))| {
                    let angle = 2.0 * PI * (k * t) as f64 / n as f64;
                    re * angle.cos() - im * angle.sin()
                })
                .sum();
            sum / n as f64
        })
        .collect()
}

/// Load, normalize per column, then widen to `[x, x², |x|]` features.
pub fn preprocess_data(rows: usize, width: usize, io_delay: Duration) -> Matrix {
    let _outer = Range::colored("DataPreprocessing", Color::RED);

    let data = {
        let _r = Range::colored("LoadData", Color::YELLOW);
        let data = randn_matrix(rows, width);
        std::thread::sleep(io_delay);
        data
    };

    let normalized = {
        let _r = Range::colored("Normalize", Color::GREEN);
        let n = rows.max(1) as f64;
        let mut stats = vec![(0.0, 0.0); width];
        for (j, stat) in stats.iter_mut().enumerate() {
            let mean = (0..rows).map(|i| data.get(i, j)).sum::<f64>() / n;
            let var = (0..rows).map(|i| (data.get(i, j) - mean).powi(2)).sum::<f64>() / n;
            *stat = (mean, var.sqrt());
        }
        Matrix::from_fn(rows, width, |i, j| {
            let (mean, std) = stats[j];
            (data.get(i, j) - mean) / (std + 1e-8)
        })
    };

    let _r = Range::colored("ExtractFeatures", Color::BLUE);
    Matrix::from_fn(rows, width * 3, |i, j| {
        let x = normalized.get(i, j % width);
        match j / width {
            0 => x,
            1 => x * x,
            _ => x.abs(),
        }
    })
}

/// Weights and per-epoch loss from [`train_model`]
#[derive(Debug, Clone)]
pub struct TrainingRun {
    /// Final weights
    pub weights: Vec<f64>,
    /// Mean squared prediction at the start of each epoch
    pub losses: Vec<f64>,
}

impl TrainingRun {
    /// Euclidean norm of the final weights
    pub fn weights_norm(&self) -> f64 {
        self.weights.iter().map(|w| w * w).sum::<f64>().sqrt()
    }
}

/// Gradient descent that drives `mean((X·w)²)` towards zero.
pub fn train_model(data: &Matrix, epochs: usize) -> TrainingRun {
    profile_function("ModelTraining", Color::PURPLE, || {
        let (n, features) = (data.rows(), data.cols());
        let mut rng = rand::thread_rng();
        let mut weights: Vec<f64> = (0..features).map(|_| randn(&mut rng)).collect();
        let mut losses = Vec::with_capacity(epochs);
        let learning_rate = 0.01;

        for epoch in 0..epochs {
            let _epoch = Range::colored(&format!("Epoch_{}", epoch), Color::ORANGE);

            let predictions: Vec<f64> = {
                let _r = Range::colored("Forward", Color::CYAN);
                (0..n)
                    .map(|i| data.row(i).iter().zip(&weights).map(|(x, w)| x * w).sum())
                    .collect()
            };
            losses.push(predictions.iter().map(|p| p * p).sum::<f64>() / n.max(1) as f64);

            let _r = Range::colored("Backward", Color::MAGENTA);
            for (j, w) in weights.iter_mut().enumerate() {
                let grad: f64 = (0..n).map(|i| data.get(i, j) * predictions[i]).sum::<f64>() * 2.0
                    / n.max(1) as f64;
                *w -= learning_rate * grad;
            }
        }

        TrainingRun { weights, losses }
    })
}

/// Batch loader with a per-id cache and an FFT-filter-iFFT transform
pub struct DataPipeline {
    batch_size: usize,
    width: usize,
    load_delay: Duration,
    cache: HashMap<usize, Matrix>,
}

impl DataPipeline {
    /// Pipeline producing `batch_size x 50` batches
    pub fn new(batch_size: usize, load_delay: Duration) -> Self {
        Self {
            batch_size,
            width: 50,
            load_delay,
            cache: HashMap::new(),
        }
    }

    /// Number of batches loaded so far
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Load a batch, paying the simulated I/O delay only on the first request.
    pub fn load_batch(&mut self, batch_id: usize) -> Matrix {
        let _r = Range::colored("Pipeline.load", Color::RED);
        if let Some(hit) = self.cache.get(&batch_id) {
            return hit.clone();
        }
        std::thread::sleep(self.load_delay);
        let data = randn_matrix(self.batch_size, self.width);
        self.cache.insert(batch_id, data.clone());
        data
    }

    /// Per row: DFT, halve the real part and drop the imaginary part, inverse DFT.
    pub fn transform_batch(&self, data: &Matrix) -> Matrix {
        let _r = Range::colored("Pipeline.transform", Color::GREEN);
        let spectra: Vec<Vec<(f64, f64)>> = annotate("FFT", Color::YELLOW, || {
            (0..data.rows()).map(|i| dft(data.row(i))).collect()
        });
        let filtered: Vec<Vec<(f64, f64)>> = annotate("Filter", Color::BLUE, || {
            spectra
                .iter()
                .map(|row| row.iter().map(|&(re, _)| (re * 0.5, 0.0)).collect())
                .collect()
        });
        annotate("Inverse_FFT", Color::CYAN, || {
            let rows: Vec<Vec<f64>> = filtered.iter().map(|s| idft_real(s)).collect();
            Matrix::from_fn(data.rows(), data.cols(), |i, j| rows[i][j])
        })
    }

    /// Load and transform batches `0..num_batches`.
    pub fn process_batches(&mut self, num_batches: usize) -> Vec<Matrix> {
        let _r = Range::colored("Pipeline.process", Color::PURPLE);
        (0..num_batches)
            .map(|i| {
                let _batch = Range::colored(&format!("Batch_{}", i), Color::ORANGE);
                let data = self.load_batch(i);
                self.transform_batch(&data)
            })
            .collect()
    }
}

/// Power iteration for the dominant eigenvalue of a square matrix.
pub fn dominant_eigenvalue(m: &Matrix, iterations: usize) -> f64 {
    let n = m.rows();
    if n == 0 {
        return 0.0;
    }
    let mut v = vec![1.0 / (n as f64).sqrt(); n];
    let mut lambda = 0.0;
    for _ in 0..iterations {
        let w: Vec<f64> = (0..n)
            .map(|i| m.row(i).iter().zip(&v).map(|(a, b)| a * b).sum())
            .collect();
        let norm = w.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        lambda = v.iter().zip(&w).map(|(a, b)| a * b).sum();
        v = w.into_iter().map(|x| x / norm).collect();
    }
    lambda
}

/// Three nested phases under one parent range. Returns the dominant
/// eigenvalue of the leading 50x50 block of `X·Xᵀ`.
pub fn context_example(rows: usize, delay: Duration) -> f64 {
    let _ctx = Range::colored("ContextExample", Color::PURPLE);
    let data = {
        let _r = Range::colored("Phase1", Color::RED);
        let data = randn_matrix(rows, 100);
        std::thread::sleep(delay);
        data
    };
    let gram = {
        let _r = Range::colored("Phase2", Color::GREEN);
        let gram = multiply_transposed(&data, &data.transpose())
            .unwrap_or_else(|_| Matrix::new(0, 0));
        std::thread::sleep(delay);
        gram
    };
    let _r = Range::colored("Phase3", Color::BLUE);
    let k = gram.rows().min(50);
    let block = Matrix::from_fn(k, k, |i, j| gram.get(i, j));
    dominant_eigenvalue(&block, 100)
}

/// Magnitude of the 2-D DFT (rows then columns).
pub fn dft2_magnitude(data: &Matrix) -> Matrix {
    let (rows, cols) = (data.rows(), data.cols());
    let row_spectra: Vec<Vec<(f64, f64)>> = (0..rows).map(|i| dft(data.row(i))).collect();
    let mut out = Matrix::new(rows, cols);
    for j in 0..cols {
        for k in 0..rows {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, spectrum) in row_spectra.iter().enumerate() {
                let (a, b) = spectrum[j];
                let angle = -2.0 * PI * (k * t) as f64 / rows as f64;
                let (c, s) = (angle.cos(), angle.sin());
                re += a * c - b * s;
                im += a * s + b * c;
            }
            out.set(k, j, (re * re + im * im).sqrt());
        }
    }
    out
}

/// Load three datasets in the `DataOps` domain, transform them in the
/// `ComputeOps` domain, and average the results.
pub fn complex_workflow(rows: usize, cols: usize, delay: Duration) -> Matrix {
    let datasets: Vec<Matrix> = {
        let _prep = Range::in_domain("DataPreparation", Color::RED, DATA_OPS);
        (0..3)
            .map(|i| {
                let _r = Range::in_domain(&format!("LoadDataset_{}", i), Color::YELLOW, DATA_OPS);
                let data = randn_matrix(rows, cols);
                std::thread::sleep(delay);
                data
            })
            .collect()
    };

    let results: Vec<Matrix> = {
        let _proc = Range::in_domain("ParallelProcessing", Color::GREEN, COMPUTE_OPS);
        datasets
            .iter()
            .enumerate()
            .map(|(i, data)| {
                let _r = Range::in_domain(&format!("ProcessDataset_{}", i), Color::BLUE, COMPUTE_OPS);
                let mag = dft2_magnitude(data);
                Matrix::from_fn(rows, cols, |r, c| mag.get(r, c).ln_1p())
            })
            .collect()
    };

    let _agg = Range::in_domain("Aggregation", Color::PURPLE, COMPUTE_OPS);
    let count = results.len().max(1) as f64;
    Matrix::from_fn(rows, cols, |r, c| {
        results.iter().map(|m| m.get(r, c)).sum::<f64>() / count
    })
}

/// Wall times from [`benchmark_with_annotations`]
#[derive(Debug, Clone)]
pub struct SortTimings {
    /// Bubble sort over the first `min(1000, n)` items
    pub bubble: Duration,
    /// Recursive quicksort over all items
    pub quick: Duration,
    /// `sort_by(total_cmp)` over all items
    pub std: Duration,
    /// Whether every result came out ascending
    pub sorted: bool,
}

fn bubble_sort_annotated(data: &mut [f64]) {
    let _r = Range::colored("BubbleSort", Color::RED);
    let n = data.len();
    for i in 0..n {
        let progress = (i % 1000 == 0)
            .then(|| Range::colored(&format!("BubbleSort_Progress_{}", i / 1000), Color::YELLOW));
        for j in 0..n.saturating_sub(i + 1) {
            if data[j] > data[j + 1] {
                data.swap(j, j + 1);
            }
        }
        drop(progress);
    }
}

fn is_ascending(data: &[f64]) -> bool {
    data.windows(2).all(|w| w[0] <= w[1])
}

/// Bubble, quick and std sort, each inside its own range.
pub fn benchmark_with_annotations(size: usize) -> SortTimings {
    let mut rng = rand::thread_rng();
    let data: Vec<f64> = (0..size).map(|_| randn(&mut rng)).collect();

    let mut small = data[..size.min(1000)].to_vec();
    let (_, bubble) = time(|| bubble_sort_annotated(&mut small));

    let mut quick_data = data.clone();
    let (_, quick) = time(|| annotate("QuickSort", Color::GREEN, || quick_sort(&mut quick_data)));

    let mut std_data = data;
    let (_, std) = time(|| annotate("StdSort", Color::BLUE, || std_data.sort_by(f64::total_cmp)));

    SortTimings {
        bubble,
        quick,
        std,
        sorted: is_ascending(&small) && is_ascending(&quick_data) && is_ascending(&std_data),
    }
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    banner(&format!(
        "NVTX Annotations Profiling Examples\nNVTX Available: {}",
        cpuprof_core::is_available()
    ));
    let delay = Duration::from_millis(scale.pick(100, 1));

    println!("\n1. Basic Function Annotations:");
    let data = preprocess_data(scale.pick(10_000, 200), 100, delay);
    println!("   Preprocessed data shape: ({}, {})", data.rows(), data.cols());

    println!("\n2. Model Training with Nested Annotations:");
    let head = Matrix::from_fn(data.rows().min(1000), data.cols(), |i, j| data.get(i, j));
    let run = train_model(&head, 5);
    println!("   Final weights norm: {:.3}", run.weights_norm());

    println!("\n3. Data Pipeline with Method Annotations:");
    let mut pipeline = DataPipeline::new(scale.pick(64, 8), Duration::from_millis(scale.pick(50, 1)));
    let results = pipeline.process_batches(5);
    println!("   Processed {} batches", results.len());

    println!("\n4. Context Manager Style Annotations:");
    let lambda = context_example(scale.pick(1000, 60), delay);
    println!("   Dominant eigenvalue of leading block: {:.3}", lambda);
    println!("   Context example completed");

    println!("\n5. Complex Workflow with Multiple Domains:");
    let result = complex_workflow(scale.pick(1000, 32), 50, delay);
    println!("   Complex workflow completed ({}x{})", result.rows(), result.cols());

    println!("\n6. Algorithm Comparison with Annotations:");
    let n = scale.pick(10_000, 500);
    let timings = benchmark_with_annotations(n);
    println!("   Bubble sort (n={}): {:.3}s", n.min(1000), timings.bubble.as_secs_f64());
    println!("   Quick sort (n={}): {:.3}s", n, timings.quick.as_secs_f64());
    println!("   Std sort (n={}): {:.3}s", n, timings.std.as_secs_f64());

    footer();
    println!("NVTX annotation examples complete!");
    println!("\nProfiler hints:");
    println!("- Use 'nsys profile --trace=nvtx' to capture NVTX markers");
    println!("- NVTX ranges will appear as colored blocks in the timeline");
    println!("- Use different colors and domains to organize your profiling data");
    if !cpuprof_core::is_available() {
        println!("\nNote: rebuild with `--features nvtx` to emit real NVTX ranges");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let out = preprocess_data(64, 4, Duration::ZERO);
        assert_eq!((out.rows(), out.cols()), (64, 12));
        // first block is normalized: column mean ~ 0
        let mean: f64 = (0..64).map(|i| out.get(i, 0)).sum::<f64>() / 64.0;
        assert!(mean.abs() < 1e-9);
        // x² and |x| blocks are derived from the first
        for i in 0..64 {
            let x = out.get(i, 1);
            assert!((out.get(i, 5) - x * x).abs() < 1e-12);
            assert!((out.get(i, 9) - x.abs()).abs() < 1e-12);
        }
        assert_eq!(cpuprof_core::depth(), 0);
    }

    #[test]
    fn test_training_reduces_loss() {
        let data = preprocess_data(100, 5, Duration::ZERO);
        let run = train_model(&data, 10);
        assert_eq!(run.losses.len(), 10);
        assert!(run.losses[9] < run.losses[0]);
    }

    #[test]
    fn test_dft_roundtrip_halves_even_part() {
        let signal = vec![1.0, 2.0, 3.0, 4.0];
        let spectrum = dft(&signal);
        // DC bin = sum
        assert!((spectrum[0].0 - 10.0).abs() < 1e-9);
        let back = idft_real(&spectrum);
        for (a, b) in back.iter().zip(&signal) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pipeline_transform_of_constant_rows() {
        let pipeline = DataPipeline::new(2, Duration::ZERO);
        let input = Matrix::filled(2, 50, 3.0);
        let out = pipeline.transform_batch(&input);
        assert!((0..50).all(|j| (out.get(1, j) - 1.5).abs() < 1e-9));
    }

    #[test]
    fn test_pipeline_cache() {
        let mut pipeline = DataPipeline::new(4, Duration::ZERO);
        let first = pipeline.load_batch(7);
        let again = pipeline.load_batch(7);
        assert_eq!(first, again);
        assert_eq!(pipeline.cached(), 1);
        assert_eq!(pipeline.process_batches(3).len(), 3);
        assert_eq!(pipeline.cached(), 4);
    }

    #[test]
    fn test_dominant_eigenvalue() {
        let m = Matrix::from_fn(2, 2, |i, j| [[2.0, 0.0], [0.0, 5.0]][i][j]);
        assert!((dominant_eigenvalue(&m, 200) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_complex_workflow_shape() {
        let out = complex_workflow(8, 6, Duration::ZERO);
        assert_eq!((out.rows(), out.cols()), (8, 6));
        assert!((0..8).all(|i| (0..6).all(|j| out.get(i, j) >= 0.0)));
    }

    #[test]
    fn test_sorts_annotated() {
        let t = benchmark_with_annotations(1500);
        assert!(t.sorted);
        assert_eq!(cpuprof_core::depth(), 0);
    }
}
