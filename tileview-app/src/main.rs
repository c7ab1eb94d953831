//! Headless map viewer: renders one frame of the map to a PNG file.
//!
//! Drives the engine exactly like an interactive host would, through
//! pointer events, `poll` and `paint`.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tileview::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "tileview-app", version, about = "Render an OpenStreetMap snapshot")]
struct Args {
    /// Place to search for and center on
    #[arg(long)]
    search: Option<String>,

    /// Center longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Center latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Zoom level
    #[arg(long)]
    zoom: Option<u8>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Drag the map by `dx,dy` pixels before rendering
    #[arg(long, value_parser = parse_pan, allow_hyphen_values = true)]
    pan: Option<(f64, f64)>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tile cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Seconds to wait for tiles before rendering what has arrived
    #[arg(long, default_value_t = 30)]
    wait: u64,

    /// Output PNG
    #[arg(long, default_value = "map.png")]
    out: PathBuf,
}

fn parse_pan(value: &str) -> std::result::Result<(f64, f64), String> {
    let (dx, dy) = value
        .split_once(',')
        .ok_or_else(|| format!("expected dx,dy, got {:?}", value))?;
    let dx = dx.trim().parse().map_err(|_| format!("invalid dx {:?}", dx))?;
    let dy = dy.trim().parse().map_err(|_| format!("invalid dy {:?}", dy))?;
    Ok((dx, dy))
}

fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.cache_dir {
        config.cache.directory = Some(dir.clone());
    }
    if let Some(lon) = args.lon {
        config.view.center_lon = lon;
    }
    if let Some(lat) = args.lat {
        config.view.center_lat = lat;
    }
    if let Some(zoom) = args.zoom {
        config.view.zoom = zoom;
    }
    config.validate()?;
    Ok(config)
}

async fn search_place(config: &EngineConfig, query: &str) -> anyhow::Result<Option<Place>> {
    let search = NominatimSearch::from_config(config)?;
    let results = PlaceResults::new(search.search(query).await?);
    for name in results.names() {
        log::debug!("candidate: {}", name);
    }
    Ok(results.first().cloned())
}

/// Press, move in a few steps, release: the same sequence a mouse drag produces
fn drag(map: &mut Map, dx: f64, dy: f64) {
    let start = map.size().center();
    map.handle_event(PointerEvent::Down {
        position: start,
        button: MouseButton::Left,
    });
    const STEPS: u32 = 4;
    for step in 1..=STEPS {
        let fraction = step as f64 / STEPS as f64;
        map.handle_event(PointerEvent::Move {
            position: Point::new(start.x + dx * fraction, start.y + dy * fraction),
        });
    }
    let end = Point::new(start.x + dx, start.y + dy);
    map.handle_event(PointerEvent::Up {
        position: end,
        button: MouseButton::Left,
    });
}

async fn wait_for_tiles(map: &mut Map, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while map.is_loading() && Instant::now() < deadline {
        map.poll();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    map.poll();
}

fn report(map: &Map) {
    let Some(range) = map.tile_set().range() else {
        return;
    };
    let mut failed = 0;
    let mut loading = 0;
    for key in range.keys() {
        match map.tile_status(key) {
            TileStatus::Failed => failed += 1,
            TileStatus::Loading => loading += 1,
            _ => {}
        }
    }
    log::info!(
        "{} of {} tiles loaded ({} failed, {} still loading)",
        map.tile_set().len(),
        range.len(),
        failed,
        loading
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.width == 0 || args.height == 0 {
        bail!("width and height must be positive");
    }
    let config = load_config(&args)?;

    let mut map = Map::new(&config, PixelSize::new(args.width, args.height))?;
    map.on(EventKind::CenterChanged, |event| {
        if let MapEvent::CenterChanged { center } = event {
            log::info!("center is now {:.6}, {:.6}", center.lon, center.lat);
        }
    });
    map.on(EventKind::ZoomChanged, |event| {
        if let MapEvent::ZoomChanged { zoom } = event {
            log::info!("zoom is now {}", zoom);
        }
    });

    if let Some(query) = &args.search {
        match search_place(&config, query).await? {
            Some(place) => {
                map.center_on(&place);
            }
            None => log::warn!("no place found for {:?}", query),
        }
    }

    if let Some((dx, dy)) = args.pan {
        wait_for_tiles(&mut map, Duration::from_secs(args.wait)).await;
        drag(&mut map, dx, dy);
    }

    wait_for_tiles(&mut map, Duration::from_secs(args.wait)).await;
    report(&map);

    let frame = map.paint();
    frame
        .save(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    log::info!("wrote {}", args.out.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pan() {
        assert_eq!(parse_pan("100,-50"), Ok((100.0, -50.0)));
        assert_eq!(parse_pan(" 1.5 , 2 "), Ok((1.5, 2.0)));
        assert!(parse_pan("100").is_err());
        assert!(parse_pan("a,b").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "tileview-app",
            "--lon",
            "-0.1276",
            "--lat",
            "51.5072",
            "--zoom",
            "12",
            "--pan",
            "-20,40",
        ])
        .unwrap();
        assert_eq!(args.lon, Some(-0.1276));
        assert_eq!(args.zoom, Some(12));
        assert_eq!(args.pan, Some((-20.0, 40.0)));
        assert_eq!(args.out, PathBuf::from("map.png"));
    }
}
