//! I/O patterns demo. Everything writes into the scratch directory of a
//! [`ProfileSession`], which also collects the timings for the closing summary.

use crate::{Scale, WorkloadError, banner, footer};
use cpuprof_core::ProfileSession;
use memmap2::MmapMut;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;

/// Problem sizes for one run of the demo
#[derive(Debug, Clone, Copy)]
pub struct IoSizes {
    /// Lines in the sequential / buffered write tests
    pub lines: usize,
    /// Side of the square f32 array in the binary test
    pub binary_side: usize,
    /// Files in the many-small-files test
    pub small_files: usize,
    /// Size of the memory-mapped file
    pub mmap_bytes: usize,
    /// Records in the JSON / CSV tests
    pub records: usize,
    /// Files each writer thread creates
    pub files_per_thread: usize,
    /// Packets pushed through the producer-consumer writers
    pub packets: usize,
    /// Concurrent async writers
    pub async_files: usize,
    /// Writers behind the semaphore
    pub rate_limited_files: usize,
    /// Source file size for the copy comparison
    pub copy_bytes: usize,
    /// Simulated requests
    pub requests: usize,
    /// Bytes streamed in 4 KiB chunks
    pub stream_bytes: usize,
}

impl IoSizes {
    /// Sizes for a given scale
    pub fn for_scale(scale: Scale) -> Self {
        match scale {
            Scale::Full => Self {
                lines: 10_000,
                binary_side: 1000,
                small_files: 1000,
                mmap_bytes: 100 * 1024 * 1024,
                records: 10_000,
                files_per_thread: 250,
                packets: 1000,
                async_files: 100,
                rate_limited_files: 200,
                copy_bytes: 10 * 1024 * 1024,
                requests: 1000,
                stream_bytes: 10 * 1024 * 1024,
            },
            Scale::Quick => Self {
                lines: 200,
                binary_side: 32,
                small_files: 20,
                mmap_bytes: 64 * 4096,
                records: 100,
                files_per_thread: 5,
                packets: 40,
                async_files: 10,
                rate_limited_files: 20,
                copy_bytes: 256 * 1024,
                requests: 10,
                stream_bytes: 64 * 4096,
            },
        }
    }
}

/// One `Line {i}: <1 KiB>` per write through a single handle. Returns bytes written.
pub fn sequential_writes(dir: &Path, lines: usize) -> Result<u64, WorkloadError> {
    let payload = "x".repeat(1024);
    let mut file = BufWriter::new(File::create(dir.join("sequential.txt"))?);
    let mut written = 0u64;
    for i in 0..lines {
        let line = format!("Line {}: {}\n", i, payload);
        file.write_all(line.as_bytes())?;
        written += line.len() as u64;
    }
    file.flush()?;
    Ok(written)
}

/// Accumulate 100 lines, then reopen in append mode and flush them. Returns lines written.
pub fn buffered_writes(dir: &Path, lines: usize) -> Result<usize, WorkloadError> {
    let payload = "x".repeat(1024);
    let path = dir.join("buffered.txt");
    let mut buffer: Vec<String> = Vec::with_capacity(100);
    let mut written = 0;
    let flush = |buffer: &mut Vec<String>| -> Result<usize, WorkloadError> {
        let mut f = OpenOptions::new().create(true).append(true).open(&path)?;
        for line in buffer.iter() {
            f.write_all(line.as_bytes())?;
        }
        let n = buffer.len();
        buffer.clear();
        Ok(n)
    };
    for i in 0..lines {
        buffer.push(format!("Line {}: {}\n", i, payload));
        if buffer.len() >= 100 {
            written += flush(&mut buffer)?;
        }
    }
    if !buffer.is_empty() {
        written += flush(&mut buffer)?;
    }
    Ok(written)
}

/// Write a `side x side` array of random f32 as raw little-endian bytes and read it back.
pub fn binary_io(dir: &Path, side: usize) -> Result<Vec<f32>, WorkloadError> {
    let mut rng = rand::thread_rng();
    let values: Vec<f32> = (0..side * side).map(|_| rng.r#gen::<f32>()).collect();
    let path = dir.join("binary.dat");
    {
        let mut f = BufWriter::new(File::create(&path)?);
        for v in &values {
            f.write_all(&v.to_le_bytes())?;
        }
        f.flush()?;
    }
    let mut bytes = Vec::with_capacity(values.len() * 4);
    File::open(&path)?.read_to_end(&mut bytes)?;
    let loaded: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(loaded)
}

/// One tiny file per index under `many_files/`. Returns files created.
pub fn many_small_files(dir: &Path, count: usize) -> Result<usize, WorkloadError> {
    let base = dir.join("many_files");
    fs::create_dir_all(&base)?;
    for i in 0..count {
        fs::write(base.join(format!("file_{}.txt", i)), format!("Content of file {}\n", i))?;
    }
    Ok(count)
}

/// Zero-fill a file, map it, stamp `TEST` at every 4 KiB page and read one
/// byte per page back. Returns the number of pages whose first byte is `T`.
pub fn memory_mapped_io(dir: &Path, size: usize) -> Result<usize, WorkloadError> {
    let path = dir.join("mmap.dat");
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)?;
    file.set_len(size as u64)?;
    // SAFETY: the file is private to this scratch directory and not resized while mapped.
    let mut map = unsafe { MmapMut::map_mut(&file)? };
    for offset in (0..size).step_by(4096) {
        let end = (offset + 4).min(size);
        map[offset..end].copy_from_slice(&b"TEST"[..end - offset]);
    }
    map.flush()?;
    Ok((0..size).step_by(4096).filter(|&i| map[i] == b'T').count())
}

/// Record written to and read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Sequential id
    pub id: usize,
    /// `Record_<id>`
    pub name: String,
    /// Uniform in `[0, 1)`
    pub value: f64,
    /// Ten random samples
    pub data: Vec<f64>,
    /// Nested metadata
    pub metadata: RecordMeta,
}

/// Nested part of a [`Record`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    /// Unix timestamp in seconds
    pub created: f64,
    /// `tag_0` .. `tag_4`
    pub tags: Vec<String>,
}

/// Generate `count` random records
pub fn generate_records(count: usize) -> Vec<Record> {
    let mut rng = rand::thread_rng();
    let created = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    (0..count)
        .map(|id| Record {
            id,
            name: format!("Record_{}", id),
            value: rng.r#gen(),
            data: (0..10).map(|_| rng.r#gen()).collect(),
            metadata: RecordMeta {
                created,
                tags: (0..5).map(|j| format!("tag_{}", j)).collect(),
            },
        })
        .collect()
}

/// Dump records as one JSON array and parse them back.
pub fn json_io(dir: &Path, records: &[Record]) -> Result<Vec<Record>, WorkloadError> {
    let path = dir.join("data.json");
    let mut w = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut w, records)?;
    w.flush()?;
    drop(w);
    let loaded: Vec<Record> = serde_json::from_reader(BufReader::new(File::open(&path)?))?;
    Ok(loaded)
}

/// Write `id,name,value` rows with a header and read them back.
pub fn csv_io(dir: &Path, records: &[Record]) -> Result<Vec<(usize, String, f64)>, WorkloadError> {
    let path = dir.join("data.csv");
    {
        let mut w = BufWriter::new(File::create(&path)?);
        writeln!(w, "id,name,value")?;
        for r in records {
            writeln!(w, "{},{},{}", r.id, r.name, r.value)?;
        }
        w.flush()?;
    }
    let reader = BufReader::new(File::open(&path)?);
    let mut rows = Vec::with_capacity(records.len());
    for line in reader.lines().skip(1) {
        let line = line?;
        let mut fields = line.split(',');
        let (Some(id), Some(name), Some(value)) = (fields.next(), fields.next(), fields.next())
        else {
            continue;
        };
        let (Ok(id), Ok(value)) = (id.parse(), value.parse()) else {
            continue;
        };
        rows.push((id, name.to_string(), value));
    }
    Ok(rows)
}

/// Four writer threads, each reporting every finished file through a channel.
pub fn threaded_io(
    dir: &Path,
    threads: usize,
    files_per_thread: usize,
) -> Result<usize, WorkloadError> {
    let (tx, rx) = mpsc::channel::<(usize, usize)>();
    let outcome = thread::scope(|s| -> Result<(), WorkloadError> {
        let handles: Vec<_> = (0..threads)
            .map(|worker| {
                let tx = tx.clone();
                s.spawn(move || -> Result<(), WorkloadError> {
                    for i in 0..files_per_thread {
                        let text = format!("Worker {} file {}\n", worker, i).repeat(100);
                        fs::write(dir.join(format!("thread_{}_file_{}.txt", worker, i)), text)?;
                        let _ = tx.send((worker, i));
                    }
                    Ok(())
                })
            })
            .collect();
        for h in handles {
            h.join().map_err(|_| WorkloadError::ThreadPanicked)??;
        }
        Ok(())
    });
    drop(tx);
    outcome?;
    Ok(rx.iter().count())
}

/// One producer and `consumers` writer threads over a bounded queue of 100,
/// closed with one `None` sentinel per consumer.
///
/// The consumers hold the only receiver handles, so when every consumer has
/// stopped (for example on a write error) the producer's `send` fails and it
/// stops too. The first consumer error is returned.
pub fn producer_consumer_io(
    dir: &Path,
    packets: usize,
    consumers: usize,
) -> Result<usize, WorkloadError> {
    let consumers = consumers.max(1);
    let (tx, rx) = mpsc::sync_channel::<Option<(usize, String)>>(100);
    let rx = Arc::new(Mutex::new(rx));

    thread::scope(|s| -> Result<usize, WorkloadError> {
        let handles: Vec<_> = (0..consumers)
            .map(|id| {
                let rx = Arc::clone(&rx);
                s.spawn(move || -> Result<usize, WorkloadError> {
                    let mut written = 0;
                    loop {
                        let msg = rx.lock().unwrap_or_else(PoisonError::into_inner).recv();
                        match msg {
                            Ok(Some((idx, data))) => {
                                let path = dir.join(format!("consumer_{}_data_{}.txt", id, idx));
                                fs::write(path, data)?;
                                written += 1;
                            }
                            Ok(None) | Err(_) => break,
                        }
                    }
                    Ok(written)
                })
            })
            .collect();
        drop(rx);

        let producer = s.spawn(move || {
            let filler = "x".repeat(1024);
            for i in 0..packets {
                if tx.send(Some((i, format!("Data packet {}: {}", i, filler)))).is_err() {
                    return;
                }
            }
            for _ in 0..consumers {
                if tx.send(None).is_err() {
                    return;
                }
            }
        });

        let mut total = 0;
        let mut first_error = None;
        for h in handles {
            match h.join().map_err(|_| WorkloadError::ThreadPanicked)? {
                Ok(n) => total += n,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        producer.join().map_err(|_| WorkloadError::ThreadPanicked)?;

        match first_error {
            Some(e) => Err(e),
            None => Ok(total),
        }
    })
}

async fn write_lines(path: PathBuf, file_id: usize) -> Result<(), WorkloadError> {
    let file = tokio::fs::File::create(path).await?;
    let mut w = tokio::io::BufWriter::new(file);
    for i in 0..100 {
        w.write_all(format!("Async line {} in file {}\n", i, file_id).as_bytes())
            .await?;
    }
    w.flush().await?;
    Ok(())
}

/// `count` files written concurrently by tokio tasks, 100 lines each.
pub async fn async_file_io(dir: &Path, count: usize) -> Result<usize, WorkloadError> {
    let handles: Vec<_> = (0..count)
        .map(|i| tokio::spawn(write_lines(dir.join(format!("async_file_{}.txt", i)), i)))
        .collect();
    for h in handles {
        h.await??;
    }
    Ok(count)
}

/// `count` writers, at most 10 of which hold a permit at any time.
pub async fn rate_limited_io(dir: &Path, count: usize) -> Result<usize, WorkloadError> {
    let semaphore = Arc::new(Semaphore::new(10));
    let handles: Vec<_> = (0..count)
        .map(|i| {
            let semaphore = Arc::clone(&semaphore);
            let path = dir.join(format!("rate_limited_{}.txt", i));
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| WorkloadError::Io(std::io::Error::other(e)))?;
                let body = format!("Rate limited file {}\n", i).repeat(1000);
                tokio::fs::write(path, body).await?;
                Ok::<_, WorkloadError>(())
            })
        })
        .collect();
    for h in handles {
        h.await??;
    }
    Ok(count)
}

/// Create the copy source file of `size` bytes
pub fn create_source(dir: &Path, size: usize) -> Result<PathBuf, WorkloadError> {
    let path = dir.join("source.dat");
    fs::write(&path, vec![b'x'; size])?;
    Ok(path)
}

/// Copy through a 1 MiB userspace buffer. Returns bytes copied.
pub fn buffered_copy(src: &Path, dst: &Path) -> Result<u64, WorkloadError> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    let mut buf = vec![0u8; 1024 * 1024];
    let mut total = 0u64;
    loop {
        let n = input.read(&mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&buf[..n])?;
        total += n as u64;
    }
    Ok(total)
}

/// Copy with `std::fs::copy` (kernel-assisted where available).
pub fn system_copy(src: &Path, dst: &Path) -> Result<u64, WorkloadError> {
    Ok(fs::copy(src, dst)?)
}

/// `requests` round trips with 1 ms of simulated latency each; returns the
/// mean time spent building request and response payloads.
pub fn request_response(requests: usize) -> Duration {
    let mut rng = rand::thread_rng();
    let mut spent = Duration::ZERO;
    for _ in 0..requests {
        thread::sleep(Duration::from_millis(1));
        let (req, resp) = (rng.gen_range(100..1000), rng.gen_range(1000..10_000));
        let start = Instant::now();
        let request = vec![b'x'; req];
        let response = vec![b'y'; resp];
        std::hint::black_box((request, response));
        spent += start.elapsed();
    }
    spent / requests.max(1) as u32
}

/// Stream `total` bytes in 4 KiB chunks with a 0.1 ms pause per chunk. Returns chunks sent.
pub fn streaming(dir: &Path, total: usize) -> Result<usize, WorkloadError> {
    const CHUNK: usize = 4096;
    let chunk = [b'x'; CHUNK];
    let mut f = File::create(dir.join("stream.dat"))?;
    let mut sent = 0;
    while sent * CHUNK < total {
        f.write_all(&chunk)?;
        sent += 1;
        thread::sleep(Duration::from_micros(100));
    }
    Ok(sent)
}

/// Run the whole demo
pub fn run(scale: Scale) -> crate::Result<()> {
    banner("I/O Bound Operations Profiling Examples");
    let sizes = IoSizes::for_scale(scale);
    let mut session = ProfileSession::new()?;
    let dir = session.dir().to_path_buf();

    println!("\n1. File I/O Patterns:");
    session.measure(&format!("Sequential writes ({} lines)", sizes.lines), || {
        sequential_writes(&dir, sizes.lines)
    })?;
    session.measure("Buffered writes (100 line chunks)", || buffered_writes(&dir, sizes.lines))?;
    session.measure(
        &format!("Binary I/O ({0}x{0} f32)", sizes.binary_side),
        || binary_io(&dir, sizes.binary_side),
    )?;
    session.measure(&format!("Create {} small files", sizes.small_files), || {
        many_small_files(&dir, sizes.small_files)
    })?;
    session.measure(
        &format!("Memory-mapped I/O ({} KiB)", sizes.mmap_bytes / 1024),
        || memory_mapped_io(&dir, sizes.mmap_bytes),
    )?;

    println!("\n2. Structured Data I/O:");
    let records = generate_records(sizes.records);
    session.measure(&format!("JSON I/O ({} records)", sizes.records), || json_io(&dir, &records))?;
    session.measure(&format!("CSV I/O ({} records)", sizes.records), || csv_io(&dir, &records))?;

    println!("\n3. Concurrent I/O Patterns:");
    session.measure(
        &format!("Threaded I/O (4 threads, {} files)", 4 * sizes.files_per_thread),
        || threaded_io(&dir, 4, sizes.files_per_thread),
    )?;
    session.measure("Producer-consumer I/O", || {
        producer_consumer_io(&dir, sizes.packets, 3)
    })?;

    println!("\n4. Async I/O Patterns:");
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    session.measure(
        &format!("Async I/O ({} concurrent files)", sizes.async_files),
        || rt.block_on(async_file_io(&dir, sizes.async_files)),
    )?;
    session.measure("Rate-limited async I/O", || {
        rt.block_on(rate_limited_io(&dir, sizes.rate_limited_files))
    })?;

    println!("\n5. I/O Optimization Comparison:");
    let src = create_source(&dir, sizes.copy_bytes)?;
    println!("   Unoptimized copy: skipped (too slow)");
    session.measure("Optimized copy (1MB buffer)", || {
        buffered_copy(&src, &dir.join("dest_opt.dat"))
    })?;
    session.measure("System copy (std::fs::copy)", || {
        system_copy(&src, &dir.join("dest_system.dat"))
    })?;

    println!("\n6. Network I/O Simulation:");
    session.measure(
        &format!("Request-response pattern ({} requests)", sizes.requests),
        || request_response(sizes.requests),
    );
    session.measure(
        &format!("Streaming pattern ({} KiB)", sizes.stream_bytes / 1024),
        || streaming(&dir, sizes.stream_bytes),
    )?;

    footer();
    println!("I/O Performance Summary:");
    for m in session.sorted_by_duration() {
        println!("   {}: {:.3}s", m.name, m.elapsed.as_secs_f64());
    }

    footer();
    println!("I/O profiling examples complete!");
    println!("\nProfiler hints:");
    println!("- Use 'nsys profile --trace=osrt' to see OS runtime calls");
    println!("- Look for syscall patterns and I/O wait times");
    println!("- Check for inefficient I/O patterns (many small operations)");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_patterns() {
        let dir = TempDir::new().unwrap();
        let written = sequential_writes(dir.path(), 10).unwrap();
        assert_eq!(written, fs::metadata(dir.path().join("sequential.txt")).unwrap().len());
        assert_eq!(buffered_writes(dir.path(), 250).unwrap(), 250);
        let text = fs::read_to_string(dir.path().join("buffered.txt")).unwrap();
        assert_eq!(text.lines().count(), 250);
        assert_eq!(binary_io(dir.path(), 8).unwrap().len(), 64);
        assert_eq!(many_small_files(dir.path(), 7).unwrap(), 7);
        assert_eq!(fs::read_dir(dir.path().join("many_files")).unwrap().count(), 7);
    }

    #[test]
    fn test_memory_mapped_pages() {
        let dir = TempDir::new().unwrap();
        assert_eq!(memory_mapped_io(dir.path(), 10 * 4096).unwrap(), 10);
        // partial trailing page still gets a (truncated) stamp
        assert_eq!(memory_mapped_io(dir.path(), 4096 + 2).unwrap(), 2);
    }

    #[test]
    fn test_structured_roundtrips() {
        let dir = TempDir::new().unwrap();
        let records = generate_records(25);
        assert_eq!(json_io(dir.path(), &records).unwrap(), records);
        let rows = csv_io(dir.path(), &records).unwrap();
        assert_eq!(rows.len(), 25);
        assert_eq!(rows[3].0, 3);
        assert_eq!(rows[3].1, "Record_3");
        assert!((rows[3].2 - records[3].value).abs() < 1e-12);
    }

    #[test]
    fn test_concurrent_writers() {
        let dir = TempDir::new().unwrap();
        assert_eq!(threaded_io(dir.path(), 4, 3).unwrap(), 12);
        assert_eq!(producer_consumer_io(dir.path(), 30, 3).unwrap(), 30);
    }

    #[test]
    fn test_producer_consumer_stops_on_write_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("does_not_exist");
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(producer_consumer_io(&missing, 1000, 3));
        });

        let result = done_rx
            .recv_timeout(Duration::from_secs(10))
            .expect("producer_consumer_io did not return after consumer errors");
        assert!(matches!(result, Err(WorkloadError::Io(_))));
    }

    #[test]
    fn test_async_writers() {
        let dir = TempDir::new().unwrap();
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap();
        assert_eq!(rt.block_on(async_file_io(dir.path(), 5)).unwrap(), 5);
        assert_eq!(rt.block_on(rate_limited_io(dir.path(), 15)).unwrap(), 15);
        let body = fs::read_to_string(dir.path().join("async_file_2.txt")).unwrap();
        assert_eq!(body.lines().count(), 100);
    }

    #[test]
    fn test_copies() {
        let dir = TempDir::new().unwrap();
        let src = create_source(dir.path(), 3 * 1024 * 1024 + 5).unwrap();
        let n = buffered_copy(&src, &dir.path().join("a")).unwrap();
        let m = system_copy(&src, &dir.path().join("b")).unwrap();
        assert_eq!(n, m);
        assert_eq!(n, 3 * 1024 * 1024 + 5);
    }

    #[test]
    fn test_streaming_chunks() {
        let dir = TempDir::new().unwrap();
        assert_eq!(streaming(dir.path(), 4096 * 3 + 1).unwrap(), 4);
        let _ = request_response(2);
    }
}
