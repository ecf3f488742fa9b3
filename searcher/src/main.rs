use anyhow::Result;
use clap::Parser;
use searcher::{load_config, run, Overrides};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "searcher")]
#[command(about = "Rank model documents against a query set by cosine similarity", long_about = None)]
struct Args {
    /// Configuration file with MODELO=, CONSULTAS= and RESULTADOS= keys
    #[arg(long, default_value = "busca.cfg")]
    config: PathBuf,
    /// Override MODELO
    #[arg(long)]
    model: Option<PathBuf>,
    /// Override CONSULTAS
    #[arg(long)]
    queries: Option<PathBuf>,
    /// Override RESULTADOS
    #[arg(long)]
    results: Option<PathBuf>,
    /// Worker threads for scoring (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(n).build_global()?;
    }

    let overrides = Overrides { model: args.model, queries: args.queries, results: args.results };
    let cfg = load_config(&args.config, &overrides)?;

    let summary = run(&cfg)?;
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
