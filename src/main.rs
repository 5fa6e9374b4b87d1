use anyhow::Result;
use clap::Parser;
use laplace_relaxation::config::Config;
use laplace_relaxation::relaxation::Relaxation;
use laplace_relaxation::visualisation::PotentialVisualiser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Relax the potential between two rectangular conductors.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML run configuration; the 10x10 reference box is used when omitted
    config: Option<String>,

    /// Skip rendering the heat map
    #[arg(long)]
    no_plot: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    config.print_summary();

    let mut relaxation = Relaxation::from_config(&config)?;

    let summary = if config.visualization.enabled && !args.no_plot {
        let visualiser = PotentialVisualiser::new(
            &config.visualization.output_dir,
            config.visualization.image_width,
            config.visualization.image_height,
        )?;
        relaxation.run_with_visualisation(&visualiser, config.visualization.frame_interval)
    } else {
        relaxation.run()
    };

    info!("Final potential:\n{}", relaxation.grid);
    info!(
        "Sweeps: {}, sum: {:.4}, last max delta: {:.3e}",
        summary.sweeps, summary.final_sum, summary.last_max_delta
    );

    Ok(())
}
