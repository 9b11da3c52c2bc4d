//! Benchmark runner: naive vs Strassen over power-of-two sizes, one CSV row
//! per size.

use anyhow::{Context, Result};
use clap::Parser;
use matmul::harness::{
    Algo, BenchOptions, BenchRow, Dtype, OperandKind, bench_size, sizes_pow2_up_to,
    write_csv_header, write_csv_row,
};
use matmul::matrix::generators::RandomScalar;
use matmul::tracked_alloc_stats;
use num_complex::Complex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Times square matrix multiplication and writes the results as CSV.
#[derive(Parser, Debug)]
#[command(name = "matmul_bench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Kernel to time
    #[arg(long, value_enum, default_value = "naive")]
    algo: Algo,

    /// Element type: f64 or Complex<f64>
    #[arg(long, value_enum, default_value = "real")]
    dtype: Dtype,

    /// Operand structure
    #[arg(long, value_enum, default_value = "random")]
    kind: OperandKind,

    /// Largest power-of-two size to run, starting from 2
    #[arg(long = "max", default_value_t = 512)]
    max_n: usize,

    #[arg(long, default_value_t = 2)]
    warmups: usize,

    #[arg(long, default_value_t = 10)]
    trials: usize,

    /// Strassen leaf size; 1 for pure Strassen
    #[arg(long, default_value_t = 64)]
    leaf: usize,

    /// Output CSV path
    #[arg(long, default_value = "results.csv")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let opts = BenchOptions {
        algo: cli.algo,
        kind: cli.kind,
        warmups: cli.warmups,
        trials: cli.trials,
        leaf: cli.leaf,
    };
    opts.validate().context("invalid benchmark options")?;

    let file = File::create(&cli.out)
        .with_context(|| format!("failed to open output: {}", cli.out.display()))?;
    let mut out = BufWriter::new(file);
    write_csv_header(&mut out)?;

    let rows = match cli.dtype {
        Dtype::Real => run::<f64>(&opts, cli.max_n, &mut out)?,
        Dtype::Complex => run::<Complex<f64>>(&opts, cli.max_n, &mut out)?,
    };
    out.flush()
        .with_context(|| format!("failed to write {}", cli.out.display()))?;

    print_summary_table(&rows);
    tracing::info!(path = %cli.out.display(), rows = rows.len(), "wrote CSV");
    Ok(())
}

fn run<T: RandomScalar>(opts: &BenchOptions, max_n: usize, out: &mut impl Write) -> Result<Vec<BenchRow>> {
    let sizes = sizes_pow2_up_to(max_n);
    if sizes.is_empty() {
        tracing::warn!(max_n, "no power-of-two sizes in range; writing header only");
    }

    let mut rows = Vec::with_capacity(sizes.len());
    for n in sizes {
        let row = bench_size::<T>(opts, n).with_context(|| format!("benchmark failed at n={n}"))?;
        write_csv_row(&mut *out, &row)?;
        // Keep partial results on disk if a later size fails.
        out.flush()?;
        let tracked = tracked_alloc_stats();
        tracing::info!(
            n,
            mean_s = row.mean_s,
            min_s = row.min_s,
            tracked_current = tracked.current_bytes,
            tracked_peak = tracked.peak_bytes,
            "size done"
        );
        rows.push(row);
    }
    Ok(rows)
}

fn print_summary_table(rows: &[BenchRow]) {
    let Some(first) = rows.first() else {
        return;
    };

    println!("\n{}", "=".repeat(72));
    println!(
        "SUMMARY: {} / {} / {} (leaf {})",
        first.algo.as_str(),
        first.dtype.as_str(),
        first.kind.as_str(),
        first.leaf
    );
    println!("{}", "=".repeat(72));
    println!(
        "{:>6} {:>12} {:>12} {:>12} {:>14}",
        "n", "mean ms", "min ms", "GFLOPS", "extra bytes"
    );
    println!("{}", "-".repeat(72));

    for r in rows {
        let gflops = r.real_equiv.total() as f64 / r.min_s / 1e9;
        println!(
            "{:>6} {:>12.3} {:>12.3} {:>12.2} {:>14}",
            r.n,
            r.mean_s * 1000.0,
            r.min_s * 1000.0,
            gflops,
            r.extra_bytes_est
        );
    }

    println!("{}", "=".repeat(72));
    let tracked = tracked_alloc_stats();
    println!(
        "Tracked allocations: current={} bytes, peak={} bytes",
        tracked.current_bytes, tracked.peak_bytes
    );
    println!("\nGFLOPS = real-equivalent operations / best trial time.\n");
}
