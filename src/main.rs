#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

use boxing_bench::bench::TrackingAllocator;
use boxing_bench::config::{
    BenchArgs, BenchConfig, BuildArgs, BuildConfig, CompilerArgs, MatrixArgs, OutputArgs,
};
use boxing_bench::engine::install_interrupt_handler;
use boxing_bench::{bench_cmd, build_cmd, matrix_cmd, run_cmd};

#[global_allocator]
static GLOBAL: TrackingAllocator = TrackingAllocator;

#[derive(Parser, Debug)]
#[command(name = "boxing-bench")]
#[command(about = "Throughput and binary-size cost of boxed, generic and hand-typed containers", long_about = None)]
struct Cli {
    /// Enable verbose logging (or set BOXING_BENCH_LOG)
    #[arg(long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the build matrix without building
    Matrix {
        #[command(flatten)]
        compiler: CompilerArgs,
        #[command(flatten)]
        matrix: MatrixArgs,
        /// Print jobs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build every matrix cell and report artifact sizes
    Build {
        #[command(flatten)]
        compiler: CompilerArgs,
        #[command(flatten)]
        matrix: MatrixArgs,
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the in-process append-loop benchmarks
    Bench {
        #[command(flatten)]
        bench: BenchArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Build the matrix and run the benchmarks into one report
    Run {
        #[command(flatten)]
        compiler: CompilerArgs,
        #[command(flatten)]
        matrix: MatrixArgs,
        #[command(flatten)]
        build: BuildArgs,
        #[command(flatten)]
        bench: BenchArgs,
        #[command(flatten)]
        output: OutputArgs,
    },
}

fn init_tracing(verbose: bool) {
    let env = std::env::var("BOXING_BENCH_LOG").unwrap_or_else(|_| {
        if verbose { "boxing_bench=debug".to_string() } else { "boxing_bench=info".to_string() }
    });
    let _ = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::ACTIVE)
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_env_filter(EnvFilter::new(env))
        .try_init();
}

fn main() {
    color_eyre::install().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_interrupt_handler();

    let result = match cli.command {
        Commands::Matrix { compiler, matrix, json } => {
            matrix_cmd::run(BuildConfig::from_args(compiler, matrix, BuildArgs::default()), json)
        }
        Commands::Build { compiler, matrix, build, output } => {
            build_cmd::run(BuildConfig::from_args(compiler, matrix, build), output)
        }
        Commands::Bench { bench, output } => bench_cmd::run(BenchConfig::from_args(bench), output),
        Commands::Run { compiler, matrix, build, bench, output } => run_cmd::run(
            BuildConfig::from_args(compiler, matrix, build),
            BenchConfig::from_args(bench),
            output,
        ),
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}
