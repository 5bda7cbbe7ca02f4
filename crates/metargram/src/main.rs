use anyhow::Error;
use metargram::{
    format_observation_report, get_config_info, prompt_for_inputs, render_meteogram, setup_logger,
    MetarFetcher, ObservationService, SourceFormat,
};
use metargram_core::DEFAULT_METEOGRAM_LOOKBACK_HOURS;
use slog::info;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = get_config_info();
    let logger = setup_logger(&cli);

    let (station, hours) = if cli.interactive {
        prompt_for_inputs()?
    } else {
        (cli.station(), cli.hours)
    };

    info!(logger, "station: {}, lookback: {:?} hours", station, hours);

    let fetcher = MetarFetcher::new(logger.clone(), cli.base_url(), cli.user_agent());
    let service = ObservationService::new(logger.clone(), fetcher);

    if cli.meteogram {
        let hours = hours.unwrap_or(DEFAULT_METEOGRAM_LOOKBACK_HOURS);
        let table = service
            .observation_table(&station, hours, SourceFormat::Raw, cli.dedup)
            .await?;
        let path = render_meteogram(&table, &cli.output_dir())?;
        println!("Meteogram for {} created.\n{}", station, path.display());
        return Ok(());
    }

    match cli.format() {
        SourceFormat::Raw => {
            let lines = service.latest_raw(&station, hours.unwrap_or(0)).await?;
            println!("Latest observation(s) from {}:", station);
            for line in &lines {
                println!("{}", line);
            }
        }
        SourceFormat::Json => {
            let table = service
                .observation_table(&station, hours.unwrap_or(0), SourceFormat::Json, cli.dedup)
                .await?
                .annotate();
            print!("{}", format_observation_report(&table, &station));
        }
    }
    Ok(())
}
