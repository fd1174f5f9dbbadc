//! Memory-intensive demo: access patterns, cache-line layout, allocation
//! strategies, copy bandwidth and data layout.

use crate::{Scale, banner, footer};
use cpuprof_core::ScopedTimer;
use rand::Rng;
use rand::seq::SliceRandom;
use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

/// Sum of every element in index order
pub fn sequential_sum(data: &[u32]) -> u64 {
    data.iter().map(|&v| v as u64).sum()
}

/// Sum visiting elements through a shuffled index vector
pub fn random_sum(data: &[u32], order: &[usize]) -> u64 {
    order.iter().map(|&i| data[i] as u64).sum()
}

/// Sum in `stride` interleaved passes; touches each element exactly once.
pub fn strided_sum(data: &[u32], stride: usize) -> u64 {
    let stride = stride.max(1);
    (0..stride.min(data.len()))
        .map(|start| data[start..].iter().step_by(stride).map(|&v| v as u64).sum::<u64>())
        .sum()
}

/// A value alone on its cache line
#[repr(C, align(64))]
#[derive(Clone, Copy)]
pub struct CacheLinePadded {
    /// Payload
    pub value: u64,
    _pad: [u8; 56],
}

impl Default for CacheLinePadded {
    fn default() -> Self {
        Self {
            value: 0,
            _pad: [0; 56],
        }
    }
}

/// Fill then sum `n` padded slots; the sum is `n(n-1)/2`.
pub fn padded_traversal(n: usize) -> u64 {
    let mut slots = vec![CacheLinePadded::default(); n];
    for (i, s) in slots.iter_mut().enumerate() {
        s.value = i as u64;
    }
    slots.iter().map(|s| s.value).sum()
}

/// Same as [`padded_traversal`] over a dense `u64` array.
pub fn unpadded_traversal(n: usize) -> u64 {
    let mut slots = vec![0u64; n];
    for (i, s) in slots.iter_mut().enumerate() {
        *s = i as u64;
    }
    slots.iter().sum()
}

/// Allocate `count` boxed buffers of `size` bytes, fill each, then free them.
pub fn many_small_allocations(count: usize, size: usize) -> usize {
    let mut buffers: Vec<Box<[u8]>> = Vec::with_capacity(count);
    for i in 0..count {
        buffers.push(vec![(i % 256) as u8; size].into_boxed_slice());
    }
    buffers.iter().map(|b| b.len()).sum()
}

/// Carve `count` slices of `size` bytes out of one pre-allocated pool.
pub fn pooled_allocations(count: usize, size: usize) -> usize {
    let mut pool = vec![0u8; count * size];
    for (i, chunk) in pool.chunks_mut(size.max(1)).enumerate() {
        chunk.fill((i % 256) as u8);
    }
    black_box(&pool);
    pool.len()
}

/// Copy strategies compared by [`bandwidth`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMethod {
    /// `copy_from_slice` (memcpy)
    Memcpy,
    /// Iterator zip
    Iterator,
    /// Indexed byte loop
    ByteLoop,
    /// Eight bytes at a time through `u64` words
    Words,
}

impl CopyMethod {
    /// Every strategy, in display order
    pub const ALL: [CopyMethod; 4] = [
        CopyMethod::Memcpy,
        CopyMethod::Iterator,
        CopyMethod::ByteLoop,
        CopyMethod::Words,
    ];

    /// Label printed next to the timing
    pub fn label(self) -> &'static str {
        match self {
            CopyMethod::Memcpy => "memcpy",
            CopyMethod::Iterator => "iterator copy",
            CopyMethod::ByteLoop => "Manual copy (byte)",
            CopyMethod::Words => "Manual copy (8-byte chunks)",
        }
    }
}

/// Copy `src` into `dst` with the given method. Both must be the same length.
pub fn bandwidth(method: CopyMethod, src: &[u8], dst: &mut [u8]) {
    let n = src.len().min(dst.len());
    let (src, dst) = (&src[..n], &mut dst[..n]);
    match method {
        CopyMethod::Memcpy => dst.copy_from_slice(src),
        CopyMethod::Iterator => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = *s;
            }
        }
        CopyMethod::ByteLoop => {
            for i in 0..n {
                dst[i] = black_box(src[i]);
            }
        }
        CopyMethod::Words => {
            let words = n / 8;
            for i in 0..words {
                let mut w = [0u8; 8];
                w.copy_from_slice(&src[i * 8..i * 8 + 8]);
                let v = u64::from_ne_bytes(w);
                dst[i * 8..i * 8 + 8].copy_from_slice(&v.to_ne_bytes());
            }
            dst[words * 8..].copy_from_slice(&src[words * 8..]);
        }
    }
}

/// One particle, all fields together
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParticleAos {
    #[allow(missing_docs)]
    pub pos: [f32; 3],
    #[allow(missing_docs)]
    pub vel: [f32; 3],
    #[allow(missing_docs)]
    pub mass: f32,
    #[allow(missing_docs)]
    pub charge: f32,
}

/// Particles split into one array per field
#[derive(Debug, Clone, Default)]
pub struct ParticlesSoa {
    #[allow(missing_docs)]
    pub x: Vec<f32>,
    #[allow(missing_docs)]
    pub y: Vec<f32>,
    #[allow(missing_docs)]
    pub z: Vec<f32>,
    #[allow(missing_docs)]
    pub vx: Vec<f32>,
    #[allow(missing_docs)]
    pub vy: Vec<f32>,
    #[allow(missing_docs)]
    pub vz: Vec<f32>,
    #[allow(missing_docs)]
    pub mass: Vec<f32>,
    #[allow(missing_docs)]
    pub charge: Vec<f32>,
}

fn particle(i: usize) -> ParticleAos {
    let f = i as f32;
    ParticleAos {
        pos: [f, f + 1.0, f + 2.0],
        vel: [f * 0.1, f * 0.2, f * 0.3],
        mass: 1.0,
        charge: if i % 2 == 1 { 1.0 } else { -1.0 },
    }
}

/// `n` particles laid out as an array of structures
pub fn particles_aos(n: usize) -> Vec<ParticleAos> {
    (0..n).map(particle).collect()
}

/// The same `n` particles laid out as a structure of arrays
pub fn particles_soa(n: usize) -> ParticlesSoa {
    let mut soa = ParticlesSoa::default();
    for p in (0..n).map(particle) {
        soa.x.push(p.pos[0]);
        soa.y.push(p.pos[1]);
        soa.z.push(p.pos[2]);
        soa.vx.push(p.vel[0]);
        soa.vy.push(p.vel[1]);
        soa.vz.push(p.vel[2]);
        soa.mass.push(p.mass);
        soa.charge.push(p.charge);
    }
    soa
}

/// `pos += vel * dt` over the AoS layout
pub fn update_aos(particles: &mut [ParticleAos], dt: f32) {
    for p in particles {
        for k in 0..3 {
            p.pos[k] += p.vel[k] * dt;
        }
    }
}

/// `pos += vel * dt` over the SoA layout
pub fn update_soa(p: &mut ParticlesSoa, dt: f32) {
    for (x, v) in p.x.iter_mut().zip(&p.vx) {
        *x += v * dt;
    }
    for (y, v) in p.y.iter_mut().zip(&p.vy) {
        *y += v * dt;
    }
    for (z, v) in p.z.iter_mut().zip(&p.vz) {
        *z += v * dt;
    }
}

/// Random-size allocations with random removal from the middle of the live set.
/// Returns the number of live allocations at the end.
pub fn fragmenting_allocations(iterations: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut live: Vec<Box<[u8]>> = Vec::new();
    for i in 0..iterations {
        let size = rng.gen_range(100..=10_000);
        live.push(vec![0u8; size].into_boxed_slice());
        if live.len() > 100 && i % 3 == 0 {
            let idx = rng.gen_range(0..live.len());
            live.remove(idx);
        }
    }
    live.len()
}

/// Random-size allocations bucketed into ten size classes, freed LIFO per class.
pub fn size_pooled_allocations(iterations: usize) -> usize {
    let mut rng = rand::thread_rng();
    let mut pools: Vec<Vec<Box<[u8]>>> = (0..10).map(|_| Vec::new()).collect();
    for i in 0..iterations {
        let size: usize = rng.gen_range(100..=10_000);
        let pool = &mut pools[(size / 1000).min(9)];
        pool.push(vec![0u8; size].into_boxed_slice());
        if pool.len() > 10 && i % 3 == 0 {
            pool.pop();
        }
    }
    pools.iter().map(Vec::len).sum()
}

/// Every thread sums the whole array. Returns the grand total.
pub fn all_threads_same_region(data: &[u32], threads: usize) -> u64 {
    let total = AtomicU64::new(0);
    thread::scope(|s| {
        for _ in 0..threads {
            s.spawn(|| {
                total.fetch_add(sequential_sum(data), Ordering::Relaxed);
            });
        }
    });
    total.into_inner()
}

/// Each thread sums its own contiguous slice. Returns the total.
pub fn partitioned_regions(data: &[u32], threads: usize) -> u64 {
    let threads = threads.max(1);
    let chunk = data.len().div_ceil(threads).max(1);
    let total = AtomicU64::new(0);
    thread::scope(|s| {
        for part in data.chunks(chunk) {
            let total = &total;
            s.spawn(move || {
                total.fetch_add(sequential_sum(part), Ordering::Relaxed);
            });
        }
    });
    total.into_inner()
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    banner("Memory Intensive Operations Profiling Examples");
    let mut rng = rand::thread_rng();

    println!("\n1. Memory Access Patterns:");
    let size = scale.pick(100_000_000, 100_000);
    let data: Vec<u32> = (0..size).map(|_| rng.gen_range(0..=1000)).collect();
    {
        let _t = ScopedTimer::new("Sequential access");
        println!("     Sum: {}", sequential_sum(&data));
    }
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(&mut rng);
    {
        let _t = ScopedTimer::new("Random access");
        println!("     Sum: {}", random_sum(&data, &order));
    }
    drop(order);
    {
        let _t = ScopedTimer::new("Strided access (stride=64)");
        println!("     Sum: {}", strided_sum(&data, 64));
    }
    drop(data);

    println!("\n2. Cache Line Effects:");
    let n = scale.pick(10_000_000, 10_000);
    {
        let _t = ScopedTimer::new("With cache line padding");
        println!("     Sum: {}", padded_traversal(n));
    }
    {
        let _t = ScopedTimer::new("Without padding");
        println!("     Sum: {}", unpadded_traversal(n));
    }

    println!("\n3. Memory Allocation Patterns:");
    let count = scale.pick(100_000, 1000);
    {
        let _t = ScopedTimer::new("Many small allocations (Box<[u8]>)");
        black_box(many_small_allocations(count, 1024));
    }
    {
        let _t = ScopedTimer::new("Pool allocator (pre-allocated)");
        black_box(pooled_allocations(count, 1024));
    }

    println!("\n4. Memory Bandwidth Test:");
    let bytes = scale.pick(100 * 1024 * 1024, 1024 * 1024);
    let src: Vec<u8> = (0..bytes).map(|i| (i % 256) as u8).collect();
    let mut dst = vec![0u8; bytes];
    for method in CopyMethod::ALL {
        let _t = ScopedTimer::new(method.label());
        bandwidth(method, &src, &mut dst);
        black_box(&dst);
    }
    drop((src, dst));

    println!("\n5. Data Structure Layout Effects:");
    let n = scale.pick(10_000_000, 10_000);
    let mut aos = particles_aos(n);
    {
        let _t = ScopedTimer::new("Array of Structures (position update)");
        update_aos(&mut aos, 0.01);
    }
    drop(aos);
    let mut soa = particles_soa(n);
    {
        let _t = ScopedTimer::new("Structure of Arrays (position update)");
        update_soa(&mut soa, 0.01);
    }
    drop(soa);

    println!("\n6. Memory Fragmentation Test:");
    let iterations = scale.pick(10_000, 500);
    {
        let _t = ScopedTimer::new("Fragmentation-inducing allocation pattern");
        black_box(fragmenting_allocations(iterations));
    }
    {
        let _t = ScopedTimer::new("Size-pooled allocation pattern");
        black_box(size_pooled_allocations(iterations));
    }

    println!("\n7. Shared vs Partitioned Regions:");
    let size = scale.pick(50_000_000, 100_000);
    let shared: Vec<u32> = (0..size).map(|i| (i % 1000) as u32).collect();
    let threads = crate::parallel::cores();
    {
        let _t = ScopedTimer::new("All threads same region");
        println!("     Sum: {}", all_threads_same_region(&shared, threads));
    }
    {
        let _t = ScopedTimer::new("Each thread different region");
        println!("     Sum: {}", partitioned_regions(&shared, threads));
    }

    footer();
    println!("Memory profiling examples complete!");
    println!("\nProfiler hints:");
    println!("- Use 'nsys profile --sample=cpu --cpuctxsw=true' to see context switches");
    println!("- Look for cache miss patterns in the CPU sampling data");
    println!("- Compare different data layouts for cache efficiency");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_patterns_agree() {
        let data: Vec<u32> = (0..10_007).map(|i| i % 97).collect();
        let expected = sequential_sum(&data);
        let mut order: Vec<usize> = (0..data.len()).collect();
        order.shuffle(&mut rand::thread_rng());
        assert_eq!(random_sum(&data, &order), expected);
        assert_eq!(strided_sum(&data, 64), expected);
        assert_eq!(strided_sum(&data[..10], 64), sequential_sum(&data[..10]));
    }

    #[test]
    fn test_padding_layout() {
        assert_eq!(std::mem::size_of::<CacheLinePadded>(), 64);
        assert_eq!(padded_traversal(100), 4950);
        assert_eq!(unpadded_traversal(100), 4950);
    }

    #[test]
    fn test_allocations() {
        assert_eq!(many_small_allocations(10, 16), 160);
        assert_eq!(pooled_allocations(10, 16), 160);
        assert!(fragmenting_allocations(300) > 100);
        assert!(size_pooled_allocations(300) > 0);
    }

    #[test]
    fn test_copy_methods() {
        let src: Vec<u8> = (0..1003).map(|i| (i % 251) as u8).collect();
        for method in CopyMethod::ALL {
            let mut dst = vec![0u8; src.len()];
            bandwidth(method, &src, &mut dst);
            assert_eq!(dst, src, "{}", method.label());
        }
    }

    #[test]
    fn test_layouts_agree() {
        let mut aos = particles_aos(50);
        let mut soa = particles_soa(50);
        update_aos(&mut aos, 0.5);
        update_soa(&mut soa, 0.5);
        for (i, p) in aos.iter().enumerate() {
            assert_eq!(p.pos, [soa.x[i], soa.y[i], soa.z[i]]);
        }
    }

    #[test]
    fn test_region_sums() {
        let data: Vec<u32> = (0..1001).collect();
        let total = sequential_sum(&data);
        assert_eq!(all_threads_same_region(&data, 3), 3 * total);
        assert_eq!(partitioned_regions(&data, 4), total);
    }
}
