/// Walk a CSV image manifest for a few epochs and report batch statistics
///
/// Usage: cargo run --example iterate_manifest -- <config.json> [batch_size] [epochs]
use csv_image_input::{CsvInput, InputConfig, NetworkInput};

fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let config_path = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: iterate_manifest <config.json> [batch_size] [epochs]"))?;
    let batch_size: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(32);
    let epochs: usize = args.next().map(|s| s.parse()).transpose()?.unwrap_or(2);

    let mut input = CsvInput::new(InputConfig::from_json_file(&config_path)?)?;
    log::info!("Input configuration: {:#?}", input.config());
    log::info!("  - Values per image: {}", input.config().image_len());
    log::info!("  - Samples: {}", input.sample_size());
    log::info!("  - Batch size: {}", batch_size);
    log::info!("  - Batches per epoch: {}", input.batches_per_epoch(batch_size));

    let mut step = 0usize;
    while input.epochs_completed() < epochs {
        let start = std::time::Instant::now();
        let batch = input.next_batch(batch_size)?;
        step += 1;

        let mean = batch.images.mean().unwrap_or(0.0);
        log::info!(
            "Step {}: epoch={}, position={}, mean_pixel={:.4}, {:.1} ms",
            step,
            input.epochs_completed(),
            input.batch_start(),
            mean,
            start.elapsed().as_secs_f64() * 1000.0
        );
        log::debug!("Classes: {:?}", batch.class_indices());
    }

    log::info!("Done: {} steps over {} epochs", step, input.epochs_completed());
    Ok(())
}
