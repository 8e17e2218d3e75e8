use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use nalgebra::Vector3;
use tracing_subscriber::EnvFilter;

use bodyspace_config::ConfigStore;
use bodyspace_service::{
    ApplyImpulseRequest, CommandService, CreateObjectRequest, GetObjectStateRequest,
};
use bodyspace_sim::SimLoop;
use bodyspace_sync::{
    ConfigSync, DEFAULT_AUTHORITY_ADDR, REFRESH_INTERVAL, STARTUP_TIMEOUT, TcpAuthority,
};
use bodyspace_world::{MaterialParams, ShapeSpec, WorldStore};

#[derive(Parser)]
#[command(name = "bodyspace-server", about = "Stateful rigid-body simulation server")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the server: background tick loop plus config sync
    Run {
        /// Address of the external configuration authority
        #[arg(long, default_value = DEFAULT_AUTHORITY_ADDR)]
        authority: String,
        /// Skip the authority entirely and run on built-in defaults
        #[arg(long)]
        no_sync: bool,
        /// Stop after this many seconds instead of running until killed
        #[arg(long)]
        duration: Option<u64>,
    },
    /// Run a scripted local scenario: terrain, a dropped sphere, an impulse
    Demo {
        /// How long to let the scenario play out
        #[arg(short, long, default_value = "5")]
        seconds: u64,
    },
    /// Print the effective config as JSON
    Config {
        /// Fetch from this authority first; print defaults if unreachable
        #[arg(long)]
        authority: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Run {
            authority,
            no_sync,
            duration,
        } => run(authority, no_sync, duration),
        Commands::Demo { seconds } => demo(seconds),
        Commands::Config { authority } => print_config(authority),
    }
}

fn run(authority: String, no_sync: bool, duration: Option<u64>) -> anyhow::Result<()> {
    let configs = ConfigStore::default();
    let authority = TcpAuthority::new(authority);

    if !no_sync {
        bodyspace_sync::bootstrap(&authority, &configs, STARTUP_TIMEOUT);
    }

    let sim = SimLoop::spawn(WorldStore::new(), configs.clone())
        .context("failed to start the simulation loop")?;

    let sync = if no_sync {
        None
    } else {
        Some(
            ConfigSync::spawn(
                Arc::new(authority),
                configs.clone(),
                sim.handle(),
                REFRESH_INTERVAL,
                STARTUP_TIMEOUT,
            )
            .context("failed to start config sync")?,
        )
    };

    tracing::info!(
        step_rate = configs.snapshot().step_rate,
        "server up, world is ticking"
    );

    match duration {
        Some(seconds) => std::thread::sleep(Duration::from_secs(seconds)),
        None => loop {
            std::thread::sleep(Duration::from_secs(60));
        },
    }

    // Orderly shutdown: stop sync first so it cannot race the loop exit,
    // then stop the loop, which joins before releasing the world.
    if let Some(sync) = sync {
        sync.shutdown();
    }
    sim.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

fn demo(seconds: u64) -> anyhow::Result<()> {
    const GRID: u32 = 64;

    let configs = ConfigStore::default();
    let sim = SimLoop::spawn(WorldStore::new(), configs.clone())
        .context("failed to start the simulation loop")?;
    let service = CommandService::new(sim.handle(), configs);

    // A gently rolling terrain patch and a sphere dropped onto it.
    let mut heightmap = Vec::with_capacity((GRID * GRID) as usize);
    for z in 0..GRID {
        for x in 0..GRID {
            let fx = x as f32 - GRID as f32 / 2.0;
            let fz = z as f32 - GRID as f32 / 2.0;
            heightmap.push(2.0 * (fx * 0.1).sin() * (fz * 0.1).cos());
        }
    }
    let terrain = ShapeSpec::Terrain {
        width: GRID,
        depth: GRID,
        heightmap,
        scale: Vector3::new(1.0, 1.0, 1.0),
        min_height: None,
        max_height: None,
    };
    report("create terrain", &service.create_object(CreateObjectRequest::new(
        "terrain",
        terrain,
        Vector3::zeros(),
    )));

    let sphere = ShapeSpec::Sphere {
        radius: 1.0,
        mass: 1.0,
        material: MaterialParams {
            restitution: Some(0.2),
            ..MaterialParams::default()
        },
    };
    report("create player", &service.create_object(CreateObjectRequest::new(
        "player",
        sphere,
        Vector3::new(0.0, 10.0, 0.0),
    )));

    for second in 0..seconds {
        std::thread::sleep(Duration::from_secs(1));
        if second == 1 {
            report(
                "impulse",
                &service.apply_impulse(ApplyImpulseRequest {
                    id: "player".into(),
                    impulse: Vector3::new(4.0, 0.0, 2.0),
                    point: None,
                }),
            );
        }
        if let Some(state) = service
            .get_object_state(GetObjectStateRequest { id: "player".into() })
            .state
        {
            println!(
                "t={}s player pos=({:.2}, {:.2}, {:.2}) vel=({:.2}, {:.2}, {:.2})",
                second + 1,
                state.position.x,
                state.position.y,
                state.position.z,
                state.linear_velocity.x,
                state.linear_velocity.y,
                state.linear_velocity.z,
            );
        }
    }

    sim.shutdown();
    Ok(())
}

fn print_config(authority: Option<String>) -> anyhow::Result<()> {
    let configs = ConfigStore::default();
    if let Some(addr) = authority {
        bodyspace_sync::bootstrap(&TcpAuthority::new(addr), &configs, STARTUP_TIMEOUT);
    }
    println!("{}", serde_json::to_string_pretty(&configs.snapshot())?);
    Ok(())
}

fn report(what: &str, response: &bodyspace_service::StatusResponse) {
    match &response.message {
        Some(message) => println!("{what}: {} ({message})", response.status),
        None => println!("{what}: {}", response.status),
    }
}
