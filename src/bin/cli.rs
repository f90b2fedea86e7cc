//! trailtopo CLI - Debug tool for path networks and topologies
//!
//! Usage:
//!   trailtopo-cli network <folder> [--config <file>]
//!   trailtopo-cli locate <folder> --lat <lat> --lon <lon>
//!   trailtopo-cli route <folder> --from-lat .. --from-lon .. --to-lat .. --to-lon ..
//!
//! Every GPX track in the folder becomes a path. Coordinates are projected
//! with a local equirectangular projection centred on the first track point,
//! so distances are in meters.

use clap::{Parser, Subcommand};
use geo::{Coord, LineString};
use gpx::{read, Gpx};
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::PathBuf;
use trailtopo::{PathAttributes, TopologyConfig, TopologyEngine};

const EARTH_RADIUS: f64 = 6_371_000.0;

#[derive(Parser)]
#[command(name = "trailtopo-cli")]
#[command(about = "Debug tool for trail networks and dynamic segmentation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file overriding the topology configuration
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the network and report paths, nodes and components
    Network {
        /// Folder containing GPX files
        folder: PathBuf,
    },

    /// Locate a coordinate on the network and print its topology JSON
    Locate {
        /// Folder containing GPX files
        folder: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Shortest route between two coordinates
    Route {
        /// Folder containing GPX files
        folder: PathBuf,

        #[arg(long, allow_hyphen_values = true)]
        from_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        from_lon: f64,

        #[arg(long, allow_hyphen_values = true)]
        to_lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        to_lon: f64,
    },
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match TopologyConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error reading config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => TopologyConfig::default(),
    };

    let result = match cli.command {
        Commands::Network { folder } => run_network(&folder, config, cli.verbose),
        Commands::Locate { folder, lat, lon } => run_locate(&folder, config, lat, lon),
        Commands::Route {
            folder,
            from_lat,
            from_lon,
            to_lat,
            to_lon,
        } => run_route(&folder, config, (from_lat, from_lon), (to_lat, to_lon)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Local equirectangular projection around a reference point.
#[derive(Clone, Copy)]
struct Projection {
    lat0: f64,
    lon0: f64,
}

impl Projection {
    fn project(&self, lat: f64, lon: f64) -> Coord<f64> {
        Coord {
            x: EARTH_RADIUS * (lon - self.lon0).to_radians() * self.lat0.to_radians().cos(),
            y: EARTH_RADIUS * (lat - self.lat0).to_radians(),
        }
    }
}

/// Track loaded from a GPX file, as (lat, lon) pairs
struct GpxTrack {
    name: String,
    points: Vec<(f64, f64)>,
}

/// Load GPX files from a folder
fn load_gpx_files(folder: &PathBuf, verbose: bool) -> Vec<GpxTrack> {
    println!("\n{}", "=".repeat(60));
    println!("Loading GPX files from: {}", folder.display());
    println!("{}", "=".repeat(60));

    let mut tracks = Vec::new();
    let entries = match fs::read_dir(folder) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("Error reading folder: {}", e);
            return tracks;
        }
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "gpx"))
        .collect();
    files.sort();

    for path in files {
        if verbose {
            println!("\n  Processing: {}", path.display());
        }
        match parse_gpx_file(&path) {
            Ok(track) => {
                println!("  [OK] {} - {} points", track.name, track.points.len());
                tracks.push(track);
            }
            Err(e) => {
                eprintln!("  [ERR] Failed to parse {}: {}", path.display(), e);
            }
        }
    }

    println!("\nLoaded {} tracks", tracks.len());
    tracks
}

/// Parse a single GPX file
fn parse_gpx_file(path: &PathBuf) -> Result<GpxTrack, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let gpx: Gpx = read(BufReader::new(file)).map_err(|e| e.to_string())?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string();

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for pt in &segment.points {
                let p = pt.point();
                points.push((p.y(), p.x()));
            }
        }
    }

    if points.len() < 2 {
        return Err("fewer than 2 track points".to_string());
    }
    Ok(GpxTrack { name, points })
}

/// Build an engine from the tracks of a folder.
fn build_engine(
    folder: &PathBuf,
    config: TopologyConfig,
    verbose: bool,
) -> Result<(TopologyEngine, Projection), String> {
    let tracks = load_gpx_files(folder, verbose);
    let (lat0, lon0) = tracks
        .first()
        .map(|t| t.points[0])
        .ok_or_else(|| "no tracks to process".to_string())?;
    let projection = Projection { lat0, lon0 };

    let mut engine = TopologyEngine::with_config(config);
    for track in &tracks {
        let coords: Vec<Coord<f64>> = track
            .points
            .iter()
            .map(|(lat, lon)| projection.project(*lat, *lon))
            .collect();
        match engine.add_path_pieces(LineString::new(coords), PathAttributes::named(&track.name)) {
            Ok(pieces) => {
                if verbose {
                    println!("  {} -> paths {:?}", track.name, pieces);
                }
            }
            Err(e) => println!("  [WARN] {} skipped: {}", track.name, e),
        }
    }
    Ok((engine, projection))
}

fn run_network(folder: &PathBuf, config: TopologyConfig, verbose: bool) -> Result<(), String> {
    let (engine, _) = build_engine(folder, config, verbose)?;
    let network = engine.network();

    println!("\n{}", "-".repeat(60));
    println!(
        "RESULTS: {} paths, {} nodes",
        engine.paths.len(),
        network.node_count()
    );
    println!("{}", "-".repeat(60));

    for path in engine.paths.values() {
        println!(
            "  Path {} ({}): {:.1}m",
            path.id,
            path.attributes.name.as_deref().unwrap_or("unnamed"),
            path.length()
        );
    }

    let components = network.connected_components();
    println!("\n  {} connected components", components.len());
    for (i, component) in components.iter().enumerate() {
        println!("    Component {}: paths {:?}", i + 1, component);
    }
    Ok(())
}

fn run_locate(folder: &PathBuf, config: TopologyConfig, lat: f64, lon: f64) -> Result<(), String> {
    let (mut engine, projection) = build_engine(folder, config, false)?;
    let coord = projection.project(lat, lon);
    let id = engine
        .add_topology_from_point(coord)
        .map_err(|e| e.to_string())?;
    let topology = engine.topology(id).ok_or("topology vanished")?;
    if let Some(agg) = topology.aggregations.first() {
        println!(
            "\n  Path {} at position {:.4}, offset {:.2}m",
            agg.path_id, agg.start_position, topology.offset
        );
    }
    let json = engine.serialize_json(id).map_err(|e| e.to_string())?;
    println!("  {}", json);
    Ok(())
}

fn run_route(
    folder: &PathBuf,
    config: TopologyConfig,
    from: (f64, f64),
    to: (f64, f64),
) -> Result<(), String> {
    let (mut engine, projection) = build_engine(folder, config, false)?;
    let (from_path, from_located) = engine
        .locate(projection.project(from.0, from.1))
        .map_err(|e| e.to_string())?;
    let (to_path, to_located) = engine
        .locate(projection.project(to.0, to.1))
        .map_err(|e| e.to_string())?;

    let id = engine
        .add_routed_topology(
            (from_path, from_located.fraction),
            (to_path, to_located.fraction),
            &[],
        )
        .map_err(|e| e.to_string())?;
    let length = engine.topology_length(id).map_err(|e| e.to_string())?;

    println!("\n  Route length: {:.1}m", length);
    if let Some(topology) = engine.topology(id) {
        for agg in &topology.aggregations {
            println!(
                "    path {}: {:.4} -> {:.4}",
                agg.path_id, agg.start_position, agg.end_position
            );
        }
    }
    let json = engine.serialize_json(id).map_err(|e| e.to_string())?;
    println!("  {}", json);
    Ok(())
}
