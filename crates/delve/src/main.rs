//! Generate one dungeon level and print it as ASCII

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use delve_core::dungeon::{CountingFactory, GridCanvas, LevelGenerator};
use delve_core::{GameRng, GeneratorConfig};

#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(author, version, about = "Generate a sector-grid dungeon level", long_about = None)]
struct Args {
    /// RNG seed; random when omitted
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    /// JSON generator config
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Map width, overriding the config
    #[arg(short = 'W', long = "width")]
    width: Option<i32>,

    /// Map height, overriding the config
    #[arg(short = 'H', long = "height")]
    height: Option<i32>,

    /// Sectors per map side, overriding the config
    #[arg(short = 'n', long = "sectors")]
    sectors: Option<i32>,

    /// Print the room graph after the map
    #[arg(short = 'g', long = "graph")]
    graph: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> delve_core::Result<()> {
    let mut config = match &args.config {
        Some(path) => GeneratorConfig::load_from_file(path)?,
        None => GeneratorConfig::default(),
    };
    if let Some(width) = args.width {
        config.map_width = width;
    }
    if let Some(height) = args.height {
        config.map_height = height;
    }
    if let Some(sectors) = args.sectors {
        config.sectors_per_side = sectors;
    }

    let generator = LevelGenerator::new(config)?;
    let config = generator.config();
    let mut rng = args.seed.map_or_else(GameRng::from_entropy, GameRng::new);
    let mut canvas = GridCanvas::new(config.map_width, config.map_height, config.floor);
    let mut factory = CountingFactory::default();

    let level = generator.generate(&mut canvas, &mut factory, &mut rng, |id, room, _| {
        tracing::debug!(room = id.0, kind = %room.kind, "room drawn");
    })?;

    print!("{}", canvas.render_ascii());
    println!("seed {}", rng.seed());

    if args.graph {
        for (id, node) in level.graph.nodes() {
            let links: Vec<String> = node
                .links()
                .iter()
                .map(|(c, n)| format!("{}->{}", c.0, n.0))
                .collect();
            println!(
                "node {} room {} centrality {} links [{}]",
                id.0,
                node.room.0,
                node.centrality(),
                links.join(", ")
            );
        }
    }
    Ok(())
}
