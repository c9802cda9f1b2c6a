use std::process::ExitCode;

use chrono::NaiveDate;
use tracing::info;
use tracing_subscriber::EnvFilter;

use journey_planner::config::PlannerConfig;
use journey_planner::domain::{LatLong, PostcodeId, ServiceTime, Stage, StationGroupId, StationId};
use journey_planner::network::{JourneyService, NetworkHandle, TransitNetwork};
use journey_planner::planner::{JourneyRequest, Location, SearchResult};

const USAGE: &str = "usage: journey-planner <snapshot.json> <config.json> <from> <to> <YYYY-MM-DD> <HH:MM> [--arrive-by]

Locations are station ids, `group:<id>`, `postcode:<id>` or `<lat>,<lon>`.";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

struct Args {
    snapshot: String,
    config: String,
    from: Location,
    to: Location,
    date: NaiveDate,
    time: ServiceTime,
    arrive_by: bool,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self, BoxError> {
        let arrive_by = args.iter().any(|a| a == "--arrive-by");
        let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
        let [snapshot, config, from, to, date, time] = positional.as_slice() else {
            return Err("expected six arguments".into());
        };
        Ok(Self {
            snapshot: snapshot.to_string(),
            config: config.to_string(),
            from: parse_location(from)?,
            to: parse_location(to)?,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
            time: ServiceTime::parse_hhmm(time)?,
            arrive_by,
        })
    }
}

fn parse_location(s: &str) -> Result<Location, BoxError> {
    if let Some(id) = s.strip_prefix("group:") {
        return Ok(Location::Group(StationGroupId::parse(id)?));
    }
    if let Some(id) = s.strip_prefix("postcode:") {
        return Ok(Location::Postcode(PostcodeId::parse(id)?));
    }
    if let Some((lat, lon)) = s.split_once(',') {
        if let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) {
            return Ok(Location::Coordinate(LatLong::new(lat, lon)?));
        }
    }
    Ok(Location::Station(StationId::parse(s)?))
}

fn print_result(result: &SearchResult) {
    if result.is_exhausted() {
        println!("No journeys found.");
        return;
    }
    for (n, journey) in result.journeys.iter().enumerate() {
        println!(
            "Journey {}: departs {}, arrives {}, {} change(s), {} min",
            n + 1,
            journey.departure_time(),
            journey.arrival_time(),
            journey.change_count(),
            journey.total_duration().num_minutes(),
        );
        for stage in journey.stages() {
            match stage {
                Stage::Vehicle(v) => println!(
                    "  {} {} {} from {} to {} towards {}{}, {} stop(s) passed, arrives {}",
                    v.departure_time(),
                    v.mode(),
                    v.route_name(),
                    v.board_station(),
                    v.alight_station(),
                    v.headsign(),
                    v.platform().map(|p| format!(" platform {p}")).unwrap_or_default(),
                    v.passed_stops(),
                    v.arrival_time(),
                ),
                Stage::Walk(w) => println!(
                    "  {} walk from {} to {}, {} min",
                    w.departure,
                    w.from,
                    w.to,
                    w.cost.num_minutes(),
                ),
            }
        }
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let config = PlannerConfig::from_json_file(&args.config)?;

    let network = {
        let config = config.clone();
        let snapshot = args.snapshot.clone();
        tokio::task::spawn_blocking(move || TransitNetwork::load(snapshot, &config)).await??
    };
    let service = JourneyService::new(NetworkHandle::with_network(network), &config.cache);

    let mut request = JourneyRequest::new(args.from, args.to, args.date, args.time, &config.search);
    if args.arrive_by {
        request = request.arriving_by();
    }
    info!(origin = %request.origin, destination = %request.destination, "Planning journey");

    let result = service.plan(request).await?;
    print_result(&result);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
