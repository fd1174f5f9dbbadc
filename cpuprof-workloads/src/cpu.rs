//! Basic CPU profiling demo: recursion, sieves, dense loops, strings,
//! dynamic programming, sorting and hashing.

use crate::{Scale, banner, footer};
use cpuprof_core::{Range, ScopedTimer, time};
use rand::Rng;
use std::collections::HashMap;

/// Exponential-time Fibonacci, slow on purpose.
pub fn fibonacci_recursive(n: u32) -> u64 {
    if n <= 1 {
        return n as u64;
    }
    fibonacci_recursive(n - 1) + fibonacci_recursive(n - 2)
}

/// Linear-time Fibonacci. Exact up to `n = 186`.
pub fn fibonacci_iterative(n: u32) -> u128 {
    if n <= 1 {
        return n as u128;
    }
    let (mut a, mut b) = (0u128, 1u128);
    for _ in 2..=n {
        let next = a.wrapping_add(b);
        a = b;
        b = next;
    }
    b
}

const LIMB: u32 = 1_000_000_000;

/// Number of decimal digits in F(n), computed with base-10^9 bignum addition.
pub fn fibonacci_digits(n: u32) -> usize {
    if n <= 1 {
        return 1;
    }
    let mut a: Vec<u32> = vec![0];
    let mut b: Vec<u32> = vec![1];
    for _ in 2..=n {
        let mut carry = 0u32;
        let mut sum = Vec::with_capacity(b.len() + 1);
        for i in 0..b.len() {
            let s = b[i] + a.get(i).copied().unwrap_or(0) + carry;
            carry = s / LIMB;
            sum.push(s % LIMB);
        }
        if carry > 0 {
            sum.push(carry);
        }
        a = std::mem::replace(&mut b, sum);
    }
    let top = b.last().copied().unwrap_or(0);
    top.to_string().len() + 9 * (b.len() - 1)
}

/// Sieve of Eratosthenes; all primes `<= limit`.
pub fn prime_sieve(limit: usize) -> Vec<usize> {
    if limit < 2 {
        return Vec::new();
    }
    let mut is_prime = vec![true; limit + 1];
    is_prime[0] = false;
    is_prime[1] = false;
    let mut i = 2;
    while i * i <= limit {
        if is_prime[i] {
            for j in (i * i..=limit).step_by(i) {
                is_prime[j] = false;
            }
        }
        i += 1;
    }
    is_prime
        .iter()
        .enumerate()
        .filter_map(|(n, &p)| p.then_some(n))
        .collect()
}

/// O(n^3) multiply of `a[i][j] = i*j` by `b[i][j] = i+j`; returns the product.
pub fn matrix_multiply_naive(size: usize) -> Vec<Vec<f64>> {
    let a: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| (i * j) as f64).collect())
        .collect();
    let b: Vec<Vec<f64>> = (0..size)
        .map(|i| (0..size).map(|j| (i + j) as f64).collect())
        .collect();
    let mut c = vec![vec![0.0; size]; size];
    for i in 0..size {
        for j in 0..size {
            for k in 0..size {
                c[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    c
}

/// Σ sqrt(i)·ln(i+1)/exp(i/1000) for i in 1..=iterations
pub fn compute_intensive_loop(iterations: u32) -> f64 {
    (1..=iterations)
        .map(|i| {
            let x = i as f64;
            x.sqrt() * (x + 1.0).ln() / (x / 1000.0).exp()
        })
        .sum()
}

/// Build, case-fold and rewrite `size` strings, then concatenate the first 100.
pub fn string_operations(size: usize) -> usize {
    let strings: Vec<String> = (0..size)
        .map(|i| {
            format!("String number {}", i)
                .repeat(10)
                .to_uppercase()
                .to_lowercase()
                .replace(' ', "_")
        })
        .collect();
    let mut result = String::new();
    for s in strings.iter().take(100) {
        result.push_str(s);
    }
    result.len()
}

/// Length of the longest common subsequence (full DP table).
pub fn longest_common_subsequence(a: &[u8], b: &[u8]) -> usize {
    let (m, n) = (a.len(), b.len());
    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1] + 1
            } else {
                dp[i - 1][j].max(dp[i][j - 1])
            };
        }
    }
    dp[m][n]
}

/// Classic O(n^2) bubble sort
pub fn bubble_sort(data: &mut [i32]) {
    let n = data.len();
    for i in 0..n.saturating_sub(1) {
        for j in 0..n - i - 1 {
            if data[j] > data[j + 1] {
                data.swap(j, j + 1);
            }
        }
    }
}

/// In-place quick sort with a middle pivot and a three-way partition.
///
/// Only the smaller side is recursed into; the larger one is handled by the
/// loop, so stack depth stays logarithmic even on sorted or all-equal input.
pub fn quick_sort<T: PartialOrd + Copy>(mut data: &mut [T]) {
    while data.len() > 1 {
        let pivot = data[data.len() / 2];
        // [0, lt) < pivot, [lt, i) == pivot, [gt, len) > pivot
        let (mut lt, mut i, mut gt) = (0, 0, data.len());
        while i < gt {
            if data[i] < pivot {
                data.swap(lt, i);
                lt += 1;
                i += 1;
            } else if data[i] > pivot {
                gt -= 1;
                data.swap(i, gt);
            } else {
                i += 1;
            }
        }
        let (left, rest) = std::mem::take(&mut data).split_at_mut(lt);
        let right = &mut rest[gt - lt..];
        if left.len() < right.len() {
            quick_sort(left);
            data = right;
        } else {
            quick_sort(right);
            data = left;
        }
    }
}

/// In-place heap sort
pub fn heap_sort(data: &mut [i32]) {
    fn sift_down(data: &mut [i32], mut root: usize, end: usize) {
        loop {
            let mut child = 2 * root + 1;
            if child >= end {
                break;
            }
            if child + 1 < end && data[child] < data[child + 1] {
                child += 1;
            }
            if data[root] >= data[child] {
                break;
            }
            data.swap(root, child);
            root = child;
        }
    }

    let n = data.len();
    for start in (0..n / 2).rev() {
        sift_down(data, start, n);
    }
    for end in (1..n).rev() {
        data.swap(0, end);
        sift_down(data, 0, end);
    }
}

/// Time bubble (skipped above 10 000 items), quick, std and heap sort on the same data.
pub fn sorting_comparison(size: usize) {
    let mut rng = rand::thread_rng();
    let original: Vec<i32> = (0..size).map(|_| rng.gen_range(1..=1_000_000)).collect();

    if size <= 10_000 {
        let mut data = original.clone();
        let _t = ScopedTimer::new("Bubble sort");
        bubble_sort(&mut data);
    }
    {
        let mut data = original.clone();
        let _t = ScopedTimer::new("Quick sort");
        quick_sort(&mut data);
    }
    {
        let mut data = original.clone();
        let _t = ScopedTimer::new("Std sort");
        data.sort_unstable();
    }
    {
        let mut data = original;
        let _t = ScopedTimer::new("Heap sort");
        heap_sort(&mut data);
    }
}

/// Insert `n` keys, look all of them up, then delete half. Returns `(found, remaining)`.
pub fn hash_table_operations(n: usize) -> (usize, usize) {
    let mut map: HashMap<usize, String> = HashMap::with_capacity(n);
    {
        let _t = ScopedTimer::new(format!("Insertion ({} elements)", n));
        for i in 0..n {
            map.insert(i, format!("Value_{}", i));
        }
    }
    let found = {
        let _t = ScopedTimer::new(format!("Lookup ({} queries)", n));
        (0..n).filter(|i| map.contains_key(i)).count()
    };
    println!("     Found: {} elements", found);
    {
        let _t = ScopedTimer::new(format!("Deletion ({} elements)", n / 2));
        for i in 0..n / 2 {
            map.remove(&i);
        }
    }
    (found, map.len())
}

/// Two 1000-char strings sharing an `X` every 10 positions.
fn lcs_inputs(len: usize) -> (Vec<u8>, Vec<u8>) {
    let mut a = vec![b'A'; len];
    let mut b = vec![b'B'; len];
    for i in (0..len).step_by(10) {
        a[i] = b'X';
        b[i] = b'X';
    }
    (a, b)
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    banner("Starting CPU-intensive operations for profiling...");
    let mut total = std::time::Duration::ZERO;

    println!("\n1. Fibonacci Calculation:");
    let n_rec = scale.pick(35, 25);
    let (fib, elapsed) = time(|| {
        let _r = Range::new("fibonacci_recursive");
        fibonacci_recursive(n_rec)
    });
    total += elapsed;
    println!("   Recursive (n={}): {} in {:.3}s", n_rec, fib, elapsed.as_secs_f64());
    let n_iter = scale.pick(100_000, 2_000);
    let (digits, elapsed) = time(|| fibonacci_digits(n_iter));
    total += elapsed;
    println!(
        "   Iterative (n={}): {} digits in {:.3}s",
        n_iter,
        digits,
        elapsed.as_secs_f64()
    );

    println!("\n2. Prime Number Generation:");
    let limit = scale.pick(1_000_000, 10_000);
    let (primes, elapsed) = time(|| prime_sieve(limit));
    total += elapsed;
    println!(
        "   Found {} primes up to {} in {:.3}s",
        primes.len(),
        limit,
        elapsed.as_secs_f64()
    );

    println!("\n3. Matrix Multiplication:");
    let size = scale.pick(200, 24);
    let (c, elapsed) = time(|| matrix_multiply_naive(size));
    total += elapsed;
    println!(
        "   {}x{} matrix multiplication in {:.3}s (c[1][1] = {})",
        size,
        size,
        elapsed.as_secs_f64(),
        c.get(1).and_then(|row| row.get(1)).copied().unwrap_or(0.0)
    );

    println!("\n4. Mathematical Computations:");
    let (value, elapsed) = time(|| compute_intensive_loop(scale.pick(100_000, 1_000)));
    total += elapsed;
    println!(
        "   Complex calculations result: {:.6} in {:.3}s",
        value,
        elapsed.as_secs_f64()
    );

    println!("\n5. String Operations:");
    let (len, elapsed) = time(|| string_operations(scale.pick(10_000, 200)));
    total += elapsed;
    println!(
        "   String operations result length: {} in {:.3}s",
        len,
        elapsed.as_secs_f64()
    );

    println!("\n6. Dynamic Programming (Longest Common Subsequence):");
    let (a, b) = lcs_inputs(scale.pick(1000, 100));
    let (lcs, elapsed) = time(|| longest_common_subsequence(&a, &b));
    total += elapsed;
    println!("   LCS length: {} in {:.3}s", lcs, elapsed.as_secs_f64());

    println!("\n7. Sorting Algorithm Comparison:");
    let (_, elapsed) = time(|| sorting_comparison(scale.pick(100_000, 2_000)));
    total += elapsed;

    println!("\n8. Hash Table Operations:");
    let (_, elapsed) = time(|| hash_table_operations(scale.pick(1_000_000, 10_000)));
    total += elapsed;

    footer();
    println!("Total execution time: {:.3}s", total.as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci() {
        assert_eq!(fibonacci_iterative(10), 55);
        assert_eq!(fibonacci_recursive(10), 55);
        assert_eq!(fibonacci_iterative(0), 0);
        assert_eq!(fibonacci_iterative(90), 2_880_067_194_370_816_120);
    }

    #[test]
    fn test_fibonacci_digits() {
        // F(10) = 55, F(50) = 12586269025, F(100) has 21 digits
        assert_eq!(fibonacci_digits(10), 2);
        assert_eq!(fibonacci_digits(50), 11);
        assert_eq!(fibonacci_digits(100), 21);
        assert_eq!(fibonacci_digits(1), 1);
    }

    #[test]
    fn test_prime_sieve() {
        assert_eq!(prime_sieve(10), vec![2, 3, 5, 7]);
        assert!(prime_sieve(1).is_empty());
        assert_eq!(prime_sieve(1_000_000).len(), 78_498);
    }

    #[test]
    fn test_matrix_multiply_naive() {
        // c[i][j] = Σ_k (i*k)(k+j)
        let c = matrix_multiply_naive(3);
        assert_eq!(c[0][0], 0.0);
        assert_eq!(c[1][1], 0.0 * 1.0 + 1.0 * 2.0 + 2.0 * 3.0);
        assert_eq!(c[2][0], 2.0 * (0.0 + 1.0 + 4.0));
    }

    #[test]
    fn test_compute_intensive_loop() {
        let expected = 1f64.sqrt() * 2f64.ln() / (0.001f64).exp();
        assert!((compute_intensive_loop(1) - expected).abs() < 1e-12);
        assert_eq!(compute_intensive_loop(0), 0.0);
    }

    #[test]
    fn test_string_operations() {
        // "string_number_0" repeated 10 times
        assert_eq!(string_operations(1), 150);
    }

    #[test]
    fn test_lcs() {
        assert_eq!(longest_common_subsequence(b"ABCBDAB", b"BDCABA"), 4);
        let (a, b) = lcs_inputs(1000);
        assert_eq!(longest_common_subsequence(&a, &b), 100);
    }

    #[test]
    fn test_sorts_agree() {
        let mut rng = rand::thread_rng();
        let original: Vec<i32> = (0..500).map(|_| rng.gen_range(-50..50)).collect();
        let mut expected = original.clone();
        expected.sort();

        let mut bubble = original.clone();
        bubble_sort(&mut bubble);
        let mut quick = original.clone();
        quick_sort(&mut quick);
        let mut heap = original;
        heap_sort(&mut heap);

        assert_eq!(bubble, expected);
        assert_eq!(quick, expected);
        assert_eq!(heap, expected);
    }

    #[test]
    fn test_quick_sort_ordered_and_repeated_input() {
        let n = 200_000;
        let mut ascending: Vec<i32> = (0..n).collect();
        quick_sort(&mut ascending);
        assert!(ascending.windows(2).all(|w| w[0] <= w[1]));

        let mut descending: Vec<i32> = (0..n).rev().collect();
        quick_sort(&mut descending);
        assert_eq!(descending, (0..n).collect::<Vec<_>>());

        let mut equal = vec![7; n as usize];
        quick_sort(&mut equal);
        assert!(equal.iter().all(|&v| v == 7));

        let mut few: Vec<i32> = (0..n).map(|i| i % 3).collect();
        quick_sort(&mut few);
        assert!(few.windows(2).all(|w| w[0] <= w[1]));

        let mut floats = vec![0.5, -1.25, 3.0, 0.5, -7.5];
        quick_sort(&mut floats);
        assert_eq!(floats, vec![-7.5, -1.25, 0.5, 0.5, 3.0]);
    }

    #[test]
    fn test_hash_table_operations() {
        assert_eq!(hash_table_operations(1000), (1000, 500));
    }
}
