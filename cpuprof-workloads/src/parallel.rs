//! Parallel patterns demo: each section exercises one standard primitive
//! (rayon pool, scoped threads, channels, locks, atomics, tokio tasks) with
//! its default settings so its signature is visible in a sampling profile.

use crate::{Scale, WorkloadError, banner, footer};
use cpuprof_core::{ScopedTimer, time};
use rand::Rng;
use rayon::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

/// Σ i² for i < n, wrapping on overflow.
pub fn cpu_bound_task(n: u64) -> u64 {
    let mut total = 0u64;
    for i in 0..n {
        total = total.wrapping_add(i.wrapping_mul(i));
    }
    total
}

/// Threads to use for the "one per core" sections
pub fn cores() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

/// Sequential vs parallel timing of the same work
#[derive(Debug, Clone)]
pub struct SpeedupRun {
    /// Single-threaded wall time
    pub sequential: Duration,
    /// Parallel wall time
    pub parallel: Duration,
    /// Whether both paths produced identical output
    pub results_match: bool,
}

impl SpeedupRun {
    /// `sequential / parallel`, or 0 when the parallel run was too fast to time
    pub fn speedup(&self) -> f64 {
        let p = self.parallel.as_secs_f64();
        if p > 0.0 {
            self.sequential.as_secs_f64() / p
        } else {
            0.0
        }
    }
}

/// `cpu_bound_task(x * scale)` for x in 0..items, sequentially then on the rayon pool.
pub fn parallel_map(items: u64, scale: u64) -> SpeedupRun {
    let (seq, sequential) = time(|| {
        (0..items)
            .map(|x| cpu_bound_task(x * scale))
            .collect::<Vec<_>>()
    });
    let (par, parallel) = time(|| {
        (0..items)
            .into_par_iter()
            .map(|x| cpu_bound_task(x * scale))
            .collect::<Vec<_>>()
    });
    SpeedupRun {
        sequential,
        parallel,
        results_match: seq == par,
    }
}

/// Σ i² for i < n split across `threads`, each folding its partial sum into
/// one shared accumulator under a single lock.
pub fn shared_accumulator(n: u64, threads: usize) -> u128 {
    let threads = threads.max(1) as u64;
    let chunk = n / threads;
    let total = Mutex::new(0u128);
    thread::scope(|s| {
        for t in 0..threads {
            let start = t * chunk;
            let end = if t == threads - 1 { n } else { start + chunk };
            let total = &total;
            s.spawn(move || {
                let local: u128 = (start..end).map(|i| (i as u128) * (i as u128)).sum();
                *total.lock().unwrap_or_else(PoisonError::into_inner) += local;
            });
        }
    });
    total.into_inner().unwrap_or_else(PoisonError::into_inner)
}

/// Per-consumer tally from [`producer_consumer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerReport {
    /// Consumer index
    pub id: usize,
    /// Items processed
    pub count: usize,
    /// Wrapping sum of processed values
    pub total: u64,
}

/// One producer feeding `consumers` workers through a bounded queue of 100.
///
/// The producer sends one `None` per consumer after the last item, so every
/// item is processed exactly once.
pub fn producer_consumer(num_items: usize, consumers: usize) -> Vec<ConsumerReport> {
    let consumers = consumers.max(1);
    let (tx, rx) = mpsc::sync_channel::<Option<(usize, u64)>>(100);
    let rx = Arc::new(Mutex::new(rx));

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..num_items {
                if tx.send(Some((i, cpu_bound_task(1000)))).is_err() {
                    return;
                }
            }
            for _ in 0..consumers {
                let _ = tx.send(None);
            }
        });

        let handles: Vec<_> = (0..consumers)
            .map(|id| {
                let rx = Arc::clone(&rx);
                s.spawn(move || {
                    let mut report = ConsumerReport {
                        id,
                        count: 0,
                        total: 0,
                    };
                    loop {
                        let msg = rx.lock().unwrap_or_else(PoisonError::into_inner).recv();
                        let Ok(Some((_idx, value))) = msg else { break };
                        let processed = value.wrapping_mul(2).wrapping_add(cpu_bound_task(500));
                        report.total = report.total.wrapping_add(processed);
                        report.count += 1;
                    }
                    report
                })
            })
            .collect();

        handles
            .into_iter()
            .filter_map(|h| h.join().ok())
            .collect()
    })
}

/// Submit `tasks` jobs to a dedicated rayon pool and sum their results.
pub fn thread_pool(tasks: usize, pool_size: usize, work: u64) -> Result<u64, WorkloadError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(pool_size.max(1))
        .thread_name(|i| format!("demo-pool-{}", i))
        .build()
        .map_err(|e| WorkloadError::Pool(e.to_string()))?;

    let (tx, rx) = mpsc::channel();
    for _ in 0..tasks {
        let tx = tx.clone();
        pool.spawn(move || {
            let _ = tx.send(cpu_bound_task(work));
        });
    }
    drop(tx);
    Ok(rx.iter().fold(0u64, |acc, v| acc.wrapping_add(v)))
}

/// Σ i² for i in x..x+10000
fn window_task(x: u64) -> u64 {
    (x..x + 10_000).fold(0u64, |acc, i| acc.wrapping_add(i.wrapping_mul(i)))
}

/// Timings of three ways to push the same items through the rayon pool
#[derive(Debug, Clone)]
pub struct PoolTimings {
    /// `par_iter().map().collect()`
    pub map: Duration,
    /// Chunks of 10 per task
    pub chunked: Duration,
    /// Fire-and-forget spawns collected through a channel
    pub spawned: Duration,
    /// Whether all three produced the same multiset of results
    pub consistent: bool,
}

/// Compare rayon map, chunked map and spawn-per-item over `items` work items.
pub fn pool_methods(items: u64) -> PoolTimings {
    let (mapped, map) = time(|| {
        (0..items)
            .into_par_iter()
            .map(window_task)
            .collect::<Vec<_>>()
    });
    let input: Vec<u64> = (0..items).collect();
    let (chunked_out, chunked) = time(|| {
        input
            .par_chunks(10)
            .flat_map_iter(|c| c.iter().map(|&x| window_task(x)))
            .collect::<Vec<_>>()
    });
    let (mut spawned_out, spawned) = time(|| {
        let (tx, rx) = mpsc::channel();
        rayon::scope(|s| {
            for x in 0..items {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let _ = tx.send(window_task(x));
                });
            }
        });
        drop(tx);
        rx.iter().collect::<Vec<_>>()
    });
    spawned_out.sort_unstable();
    let mut sorted = mapped.clone();
    sorted.sort_unstable();
    PoolTimings {
        map,
        chunked,
        spawned,
        consistent: mapped == chunked_out && sorted == spawned_out,
    }
}

/// Final counter values from each locking strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentionReport {
    /// One mutex shared by every thread
    pub single: u64,
    /// 64 independently locked stripes
    pub striped: u64,
    /// One relaxed atomic
    pub atomic: u64,
}

/// Increment a counter `iterations` times from each of `threads` threads,
/// three ways. Every field ends at `threads * iterations`.
pub fn mutex_contention(threads: usize, iterations: u64) -> ContentionReport {
    const STRIPES: usize = 64;

    let single = {
        let _t = ScopedTimer::new("High contention (single mutex)");
        let counter = Mutex::new(0u64);
        thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..iterations {
                        *counter.lock().unwrap_or_else(PoisonError::into_inner) += 1;
                    }
                });
            }
        });
        counter.into_inner().unwrap_or_else(PoisonError::into_inner)
    };

    let striped = {
        let _t = ScopedTimer::new("Low contention (striped locks)");
        let stripes: Vec<Mutex<u64>> = (0..STRIPES).map(|_| Mutex::new(0)).collect();
        thread::scope(|s| {
            for t in 0..threads {
                let stripes = &stripes;
                s.spawn(move || {
                    for j in 0..iterations as usize {
                        let stripe = (t + j) % STRIPES;
                        *stripes[stripe].lock().unwrap_or_else(PoisonError::into_inner) += 1;
                    }
                });
            }
        });
        stripes
            .into_iter()
            .map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
            .sum()
    };

    let atomic = {
        let _t = ScopedTimer::new("Lock-free (atomic)");
        let counter = AtomicU64::new(0);
        thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..iterations {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                });
            }
        });
        counter.into_inner()
    };

    ContentionReport {
        single,
        striped,
        atomic,
    }
}

#[repr(align(64))]
#[derive(Default)]
struct PaddedCounter(AtomicU64);

fn hammer(counters: &[&AtomicU64], iterations: u64) {
    thread::scope(|s| {
        for c in counters {
            s.spawn(move || {
                for _ in 0..iterations {
                    c.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
    });
}

/// Per-thread counters packed into one cache line vs padded to a line each.
/// Returns `(adjacent, padded)` wall times.
pub fn false_sharing(threads: usize, iterations: u64) -> (Duration, Duration) {
    let adjacent: Vec<AtomicU64> = (0..threads).map(|_| AtomicU64::new(0)).collect();
    let refs: Vec<&AtomicU64> = adjacent.iter().collect();
    let (_, shared) = time(|| hammer(&refs, iterations));

    let padded: Vec<PaddedCounter> = (0..threads).map(|_| PaddedCounter::default()).collect();
    let refs: Vec<&AtomicU64> = padded.iter().map(|p| &p.0).collect();
    let (_, separate) = time(|| hammer(&refs, iterations));

    debug_assert!(adjacent.iter().all(|c| c.load(Ordering::Relaxed) == iterations));
    (shared, separate)
}

/// Outcome of [`work_stealing`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealReport {
    /// Items processed in total
    pub completed: usize,
    /// Items taken from another worker's queue
    pub stolen: usize,
}

/// Round-robin `total` items over per-worker queues; idle workers steal from
/// a random victim and back off 10µs when they find nothing.
pub fn work_stealing(workers: usize, total: usize) -> StealReport {
    let workers = workers.max(1);
    let queues: Vec<Mutex<VecDeque<usize>>> =
        (0..workers).map(|_| Mutex::new(VecDeque::new())).collect();
    for item in 0..total {
        queues[item % workers]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(item);
    }
    let completed = AtomicUsize::new(0);
    let stolen = AtomicUsize::new(0);

    thread::scope(|s| {
        for id in 0..workers {
            let (queues, completed, stolen) = (&queues, &completed, &stolen);
            s.spawn(move || {
                let mut rng = rand::thread_rng();
                while completed.load(Ordering::Acquire) < total {
                    let mut item = queues[id]
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .pop_front();
                    if item.is_none() {
                        let victim = rng.gen_range(0..workers);
                        if victim != id {
                            item = queues[victim]
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .pop_back();
                            if item.is_some() {
                                stolen.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    match item {
                        Some(_) => {
                            std::hint::black_box(cpu_bound_task(100));
                            completed.fetch_add(1, Ordering::AcqRel);
                        }
                        None => thread::sleep(Duration::from_micros(10)),
                    }
                }
            });
        }
    });

    StealReport {
        completed: completed.into_inner(),
        stolen: stolen.into_inner(),
    }
}

/// `tasks` futures of `cpu_bound_task(work)`: first awaited one by one on the
/// calling thread, then spawned onto a multi-threaded tokio runtime.
/// Returns `(deferred_total, spawned_total)`.
pub fn async_futures(tasks: usize, work: u64) -> Result<(u64, u64), WorkloadError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let deferred = {
        let _t = ScopedTimer::new("Futures awaited sequentially");
        rt.block_on(async {
            let futures: Vec<_> = (0..tasks)
                .map(|_| async move { cpu_bound_task(work) })
                .collect();
            let mut total = 0u64;
            for f in futures {
                total = total.wrapping_add(f.await);
            }
            total
        })
    };

    let spawned = {
        let _t = ScopedTimer::new("Futures spawned on the runtime");
        rt.block_on(async {
            let handles: Vec<_> = (0..tasks)
                .map(|_| tokio::spawn(async move { cpu_bound_task(work) }))
                .collect();
            let mut total = 0u64;
            for h in handles {
                total = total.wrapping_add(h.await?);
            }
            Ok::<_, WorkloadError>(total)
        })?
    };

    Ok((deferred, spawned))
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    let cores = cores();
    banner(&format!(
        "Parallel Processing Profiling Examples\nSystem has {} CPU cores",
        cores
    ));

    println!("\n1. Parallel Map Example:");
    let run = parallel_map(scale.pick(100, 20), scale.pick(1000, 50));
    println!("   Sequential processing: {:.3}s", run.sequential.as_secs_f64());
    println!(
        "   Parallel processing ({} cores): {:.3}s",
        rayon::current_num_threads(),
        run.parallel.as_secs_f64()
    );
    println!("   Speedup: {:.2}x", run.speedup());

    println!("\n2. Shared Accumulator Example:");
    let n = scale.pick(10_000_000, 100_000);
    let (sum, par) = time(|| shared_accumulator(n, cores));
    println!("   Parallel sum calculation: {:.3}s", par.as_secs_f64());
    println!("   Result: {}", sum);
    let (seq_sum, seq) = time(|| (0..n).map(|i| (i as u128) * (i as u128)).sum::<u128>());
    println!("   Sequential calculation: {:.3}s", seq.as_secs_f64());
    if par.as_secs_f64() > 0.0 {
        println!("   Speedup: {:.2}x", seq.as_secs_f64() / par.as_secs_f64());
    }
    debug_assert_eq!(sum, seq_sum);

    println!("\n3. Producer-Consumer Pattern:");
    let (reports, elapsed) = time(|| producer_consumer(scale.pick(1000, 100), 4));
    for r in &reports {
        println!("   Consumer {}: processed {} items", r.id, r.count);
    }
    println!(
        "   Total items processed: {}",
        reports.iter().map(|r| r.count).sum::<usize>()
    );
    println!("   Total time: {:.3}s", elapsed.as_secs_f64());

    println!("\n4. Thread Pool Example:");
    {
        let _t = ScopedTimer::new("Thread pool execution");
        let total = thread_pool(scale.pick(1000, 50), cores, 10_000)?;
        println!("     Total result: {}", total);
    }

    println!("\n5. Pool Method Comparison:");
    let timings = pool_methods(scale.pick(1000, 50));
    println!("   par_iter map: {:.3}s", timings.map.as_secs_f64());
    println!("   chunked map (10): {:.3}s", timings.chunked.as_secs_f64());
    println!("   spawn per item: {:.3}s", timings.spawned.as_secs_f64());

    println!("\n6. Mutex Contention Example:");
    let report = mutex_contention(8, scale.pick(1_000_000, 10_000));
    println!(
        "     Counters: single={} striped={} atomic={}",
        report.single, report.striped, report.atomic
    );

    println!("\n7. False Sharing Example:");
    let (shared, padded) = false_sharing(4, scale.pick(100_000_000, 100_000));
    println!("   With false sharing: {:.3}s", shared.as_secs_f64());
    println!("   Without false sharing (padded): {:.3}s", padded.as_secs_f64());

    println!("\n8. Work Stealing Pattern:");
    {
        let _t = ScopedTimer::new("Work stealing execution");
        let report = work_stealing(4, scale.pick(1_000_000, 10_000));
        println!(
            "     Completed work items: {} ({} stolen)",
            report.completed, report.stolen
        );
    }

    println!("\n9. Async/Future Example:");
    let (deferred, spawned) = async_futures(100, scale.pick(10_000, 1_000))?;
    println!("     Totals: {} / {}", deferred, spawned);

    footer();
    println!("Parallel processing examples complete!");
    println!("\nProfiler hints:");
    println!("- Use 'nsys profile --trace=osrt --sample=cpu' to see thread creation/destruction");
    println!("- Look for lock contention and synchronization overhead");
    println!("- Check for false sharing effects in performance");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_bound_task() {
        assert_eq!(cpu_bound_task(0), 0);
        assert_eq!(cpu_bound_task(4), 1 + 4 + 9);
    }

    #[test]
    fn test_parallel_map_matches() {
        assert!(parallel_map(16, 10).results_match);
    }

    #[test]
    fn test_shared_accumulator_closed_form() {
        let n: u128 = 100_003;
        let expected = (n - 1) * n * (2 * n - 1) / 6;
        assert_eq!(shared_accumulator(100_003, 7), expected);
        assert_eq!(shared_accumulator(10, 1), 285);
    }

    #[test]
    fn test_producer_consumer_processes_everything() {
        let reports = producer_consumer(250, 4);
        assert_eq!(reports.len(), 4);
        assert_eq!(reports.iter().map(|r| r.count).sum::<usize>(), 250);
    }

    #[test]
    fn test_thread_pool_total() {
        let total = thread_pool(10, 3, 5).unwrap();
        assert_eq!(total, 10 * cpu_bound_task(5));
    }

    #[test]
    fn test_pool_methods_consistent() {
        assert!(pool_methods(37).consistent);
    }

    #[test]
    fn test_mutex_contention_counts() {
        let report = mutex_contention(4, 1000);
        assert_eq!(
            report,
            ContentionReport {
                single: 4000,
                striped: 4000,
                atomic: 4000
            }
        );
    }

    #[test]
    fn test_work_stealing_completes() {
        let report = work_stealing(3, 5000);
        assert_eq!(report.completed, 5000);
    }

    #[test]
    fn test_async_futures_agree() {
        let (a, b) = async_futures(10, 100).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, 10 * cpu_bound_task(100));
    }

    #[test]
    fn test_padded_counter_alignment() {
        assert_eq!(std::mem::align_of::<PaddedCounter>(), 64);
        let (a, b) = false_sharing(2, 1000);
        assert!(a > Duration::ZERO && b > Duration::ZERO);
    }
}
