// Times context construction plus S, T and V for water, serial against rayon

use oneint::{BasisRegistry, EngineOptions, IntegralContext};
use std::time::{Duration, Instant};

const Z: [u32; 3] = [1, 1, 8];
const POSITIONS: [[f64; 3]; 3] = [[0.0, -0.757, 0.587], [0.0, 0.757, 0.587], [0.0, 0.0, 0.0]];
const REPEATS: u32 = 20;

fn time_run(registry: &BasisRegistry, basis: &str, parallel: bool) -> oneint::Result<Duration> {
    let options = EngineOptions {
        parallel,
        ..EngineOptions::default()
    };
    let start = Instant::now();
    for _ in 0..REPEATS {
        let ctx = IntegralContext::with_registry(registry, &Z, &POSITIONS, basis)?
            .with_options(options);
        let s = ctx.overlap()?;
        let t = ctx.kinetic()?;
        let v = ctx.nuclear()?;
        assert_eq!(s.shape(), t.shape());
        assert_eq!(t.shape(), v.shape());
    }
    Ok(start.elapsed() / REPEATS)
}

fn benchmark_one_body() -> oneint::Result<()> {
    println!("=== One-electron Integral Benchmark with Rayon ===");
    let registry = BasisRegistry::new(concat!(env!("CARGO_MANIFEST_DIR"), "/../data/basis"))?;

    for basis in ["6-31g", "cc-pvdz"] {
        let ctx = IntegralContext::with_registry(&registry, &Z, &POSITIONS, basis)?;
        println!("\n--- H2O / {} ---", basis);
        println!("Number of shells: {}", ctx.num_shells());
        println!("Number of basis functions: {}", ctx.nbf());

        let serial = time_run(&registry, basis, false)?;
        let parallel = time_run(&registry, basis, true)?;
        println!("Serial build + S, T, V:   {:.3}ms", serial.as_secs_f64() * 1e3);
        println!("Parallel build + S, T, V: {:.3}ms", parallel.as_secs_f64() * 1e3);
        println!(
            "Speedup: {:.2}x",
            serial.as_secs_f64() / parallel.as_secs_f64().max(f64::EPSILON)
        );
    }

    println!("\n=== Benchmark Complete ===");
    Ok(())
}

fn main() -> oneint::Result<()> {
    tracing_subscriber::fmt::init();
    benchmark_one_body()
}
