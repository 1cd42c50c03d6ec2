use std::{path::Path, time::Duration};

use anyhow::{Context, Result};

pub mod shell {
    use std::io::Write;

    use anyhow::{bail, Context, Result};
    use tokio::io::{AsyncBufReadExt, BufReader};

    use windzone::{
        error::{ParseError, SessionError},
        geography::GeoPoint,
        net::Geocoder,
        report::{ReportFormat, DEFAULT_REPORT_FILE},
        session::Session,
    };

    const HELP: &str = "\
commands:
  click <lat> <lon>     locate a map click
  coords <lat,lon>      locate typed coordinates
  search <place>        locate a place by name
  all <lat,lon>         list every zone containing a point
  report [path]         print the report, or write it to a file
  legend                print the zone legend
  status                show whether the dataset has loaded
  quit";

    enum Flow {
        Continue,
        Quit,
    }

    /// Reads commands from stdin until EOF or `quit`. Commands are accepted
    /// while the dataset is still loading and rejected until it is ready.
    pub async fn run<G: Geocoder>(session: &mut Session, geocoder: &G) -> Result<()> {
        println!("{HELP}");
        prompt()?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match handle(session, geocoder, line.trim()).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(SessionError::Data(e)) => return Err(e).context("loading zone dataset"),
                Err(SessionError::Failed) => bail!("zone dataset failed to load"),
                Err(e) => println!("error: {e}"),
            }
            prompt()?;
        }
        Ok(())
    }

    fn prompt() -> Result<()> {
        print!("> ");
        std::io::stdout().flush()?;
        Ok(())
    }

    async fn handle<G: Geocoder>(
        session: &mut Session,
        geocoder: &G,
        line: &str,
    ) -> Result<Flow, SessionError> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            "" => {}
            "click" => {
                let (lat, lon) = parse_click(rest)?;
                let outcome = session.click(lat, lon)?;
                super::print_outcome(&outcome, session);
            }
            "coords" => {
                let outcome = session.enter_coordinates(rest)?;
                super::print_outcome(&outcome, session);
            }
            "search" => {
                let outcome = session.search(geocoder, rest).await?;
                super::print_outcome(&outcome, session);
            }
            "all" => {
                let point = rest.parse::<GeoPoint>()?;
                let regions = session.regions_at(point)?;
                if regions.is_empty() {
                    println!("No wind zone contains {point}");
                }
                for (rank, region) in regions.iter().enumerate() {
                    println!(
                        "{}. {} ({} m/s, {})",
                        rank + 1,
                        region.zone_id(),
                        region.wind_speed_mps(),
                        region.standard_ref()
                    );
                }
            }
            "report" if rest.is_empty() => print!("{}", session.export(ReportFormat::Text)?),
            "report" => {
                let path = std::path::Path::new(rest);
                session.export_to(ReportFormat::for_path(path), path)?;
                println!("Report written to {} (default name: {DEFAULT_REPORT_FILE})", path.display());
            }
            "legend" => println!("{}", session.legend()?),
            "status" => {
                if session.is_ready()? {
                    println!("ready: {} zone regions", session.registry()?.len());
                } else {
                    println!("loading...");
                }
            }
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(Flow::Quit),
            other => println!("unknown command '{other}', try 'help'"),
        }
        Ok(Flow::Continue)
    }

    fn parse_click(text: &str) -> Result<(f64, f64), ParseError> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let &[lat, lon] = parts.as_slice() else {
            return Err(ParseError::ComponentCount(parts.len()));
        };
        let number = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| ParseError::NotNumeric(s.to_owned()))
        };
        Ok((number(lat)?, number(lon)?))
    }
}

use clap::Parser;
use windzone::{
    config::{Command, Config},
    geography::{locate::LocateOutcome, zone_table::ZoneTable},
    log,
    net::{nominatim::NominatimClient, Geocoder},
    session::Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    log::setup_trace(&config);

    let table = match &config.zone_table {
        Some(path) => ZoneTable::from_toml_file(path)
            .with_context(|| format!("loading zone table {}", path.display()))?,
        None => ZoneTable::default(),
    };
    let geocoder = NominatimClient::new(
        config.geocoder_url.clone(),
        Duration::from_secs(config.geocode_timeout),
    )?;
    let mut session = Session::begin_load(config.dataset.clone(), table);
    run_command(&mut session, &geocoder, &config.dataset, config.command).await
}

async fn run_command<G: Geocoder>(
    session: &mut Session,
    geocoder: &G,
    dataset: &Path,
    command: Command,
) -> Result<()> {
    // the shell takes commands while the dataset is still loading
    if !matches!(command, Command::Shell) {
        session
            .wait_ready()
            .await
            .with_context(|| format!("loading zone dataset {}", dataset.display()))?;
    }

    let (outcome, report) = match command {
        Command::Click { lat, lon, report } => (session.click(lat, lon)?, report),
        Command::Coords { text, report } => (session.enter_coordinates(&text)?, report),
        Command::Search { text, report } => (session.search(geocoder, &text).await?, report),
        Command::Legend => {
            println!("{}", session.legend()?);
            return Ok(());
        }
        Command::Shell => return shell::run(session, geocoder).await,
    };

    print_outcome(&outcome, session);
    if let Some(path) = report.report {
        session.export_to(report.format, &path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

fn print_outcome(outcome: &LocateOutcome, session: &Session) {
    match (outcome, session.marker()) {
        (LocateOutcome::Found(_), Some(marker)) => {
            println!("[{}] {}", marker.color, outcome.point());
            for line in &marker.popup {
                println!("  {line}");
            }
        }
        _ => println!("No wind zone found at {}", outcome.point()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_shot_command_waits_for_dataset() {
        let geocoder = NominatimClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        let dataset = Path::new("missing/zones.geojson");
        let mut session = Session::begin_load(dataset.to_owned(), ZoneTable::default());

        let err = run_command(&mut session, &geocoder, dataset, Command::Legend)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("loading zone dataset missing/zones.geojson"));
        assert!(session.is_ready().is_err());
    }
}
