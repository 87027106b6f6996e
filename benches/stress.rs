//! Concurrent booking stress: measures engine call latency under contention.
//! Run with `cargo bench`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use ulid::Ulid;

use plenum::{Engine, NotifyHub};

const HOUR: i64 = 3_600_000; // 1 hour in ms

const CONFERENCES: usize = 10;
const USERS: usize = 200;
const BOOKINGS_PER_USER: usize = 3;

fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let idx = ((sorted.len() as f64) * p / 100.0) as usize;
    sorted[idx.min(sorted.len() - 1)]
}

fn print_latency(label: &str, latencies: &mut [Duration]) {
    latencies.sort();
    let total: Duration = latencies.iter().sum();
    let avg = total / latencies.len() as u32;
    println!("  {label}:");
    println!(
        "    n={}, avg={:.3}ms, p50={:.3}ms, p95={:.3}ms, p99={:.3}ms, max={:.3}ms",
        latencies.len(),
        avg.as_secs_f64() * 1000.0,
        percentile(latencies, 50.0).as_secs_f64() * 1000.0,
        percentile(latencies, 95.0).as_secs_f64() * 1000.0,
        percentile(latencies, 99.0).as_secs_f64() * 1000.0,
        latencies.last().unwrap().as_secs_f64() * 1000.0,
    );
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}

#[tokio::main]
async fn main() {
    plenum::observability::init_tracing();

    let engine = Arc::new(Engine::new(Arc::new(NotifyHub::new())));
    let slot_mix: [u32; 10] = [1, 1, 1, 1, 1, 5, 5, 5, 10, 10];

    // Disjoint one-hour windows starting tomorrow, so no two bookings of the
    // same user ever conflict.
    let base = now_ms() + 24 * HOUR;
    for i in 0..CONFERENCES {
        let start = base + (i as i64) * 2 * HOUR;
        engine
            .register_conference(
                &format!("conf-{i}"),
                "Berlin",
                vec!["rust".into()],
                start,
                start + HOUR,
                slot_mix[i % slot_mix.len()],
            )
            .await
            .expect("register conference");
    }
    for u in 0..USERS {
        engine
            .register_user(&format!("user-{u}"), vec!["rust".into()])
            .await
            .expect("register user");
    }

    println!(
        "stress: {USERS} users x {BOOKINGS_PER_USER} bookings over {CONFERENCES} conferences"
    );

    // Phase 1: concurrent booking
    let wall = Instant::now();
    let mut handles = Vec::new();
    for u in 0..USERS {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            let user = format!("user-{u}");
            let mut latencies = Vec::with_capacity(BOOKINGS_PER_USER);
            let mut ids = Vec::with_capacity(BOOKINGS_PER_USER);
            for b in 0..BOOKINGS_PER_USER {
                let conference = format!("conf-{}", (u + b * 3) % CONFERENCES);
                let start = Instant::now();
                let id = engine
                    .book_conference(&user, &conference)
                    .await
                    .expect("book");
                latencies.push(start.elapsed());
                ids.push(id);
            }
            (latencies, ids)
        }));
    }

    let mut book_latencies = Vec::new();
    let mut booking_ids: Vec<Ulid> = Vec::new();
    for handle in handles {
        let (latencies, ids) = handle.await.expect("task");
        book_latencies.extend(latencies);
        booking_ids.extend(ids);
    }
    let book_wall = wall.elapsed();
    print_latency("book_conference", &mut book_latencies);
    println!(
        "    wall={:.1}ms ({:.0} ops/s)",
        book_wall.as_secs_f64() * 1000.0,
        booking_ids.len() as f64 / book_wall.as_secs_f64()
    );

    // Phase 2: concurrent cancellation (frees seats, drives waitlist promotion)
    let wall = Instant::now();
    let mut handles = Vec::new();
    for chunk in booking_ids.chunks(BOOKINGS_PER_USER) {
        let engine = engine.clone();
        let chunk = chunk.to_vec();
        handles.push(tokio::spawn(async move {
            let mut latencies = Vec::with_capacity(chunk.len());
            for id in chunk {
                let start = Instant::now();
                engine.cancel_booking(id).await.expect("cancel");
                latencies.push(start.elapsed());
            }
            latencies
        }));
    }

    let mut cancel_latencies = Vec::new();
    for handle in handles {
        cancel_latencies.extend(handle.await.expect("task"));
    }
    let cancel_wall = wall.elapsed();
    print_latency("cancel_booking", &mut cancel_latencies);
    println!(
        "    wall={:.1}ms ({:.0} ops/s)",
        cancel_wall.as_secs_f64() * 1000.0,
        cancel_latencies.len() as f64 / cancel_wall.as_secs_f64()
    );
}
