use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orbtrace_packer::StructLayout;
use orbtrace_worker::FrameLayouts;
use tracing_subscriber::EnvFilter;

mod replay;

use replay::{ReplayOptions, parse_script, replay};

const UNIFORM_FIELDS: [&str; 7] = [
    "camera",
    "rotation",
    "canvas_dimensions",
    "light_theme",
    "fov_scale",
    "max_bounces",
    "antialiasing_samples",
];

const ENTITY_FIELDS: [&str; 3] = ["position", "radius", "color"];

#[derive(Parser)]
#[command(
    name = "orbtrace-cli",
    about = "Headless tooling for the orbtrace render worker"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the uniform and entity buffer layouts
    Layout,
    /// Feed a JSON-lines message script through the worker and print the last frame
    Replay {
        /// Script file, one host message per line
        file: PathBuf,
        /// Number of frames to draw
        #[arg(short, long, default_value = "10")]
        frames: u64,
        /// Milliseconds between frames
        #[arg(short, long, default_value = "16")]
        interval: f64,
        /// Animation seed
        #[arg(short, long, default_value = "0")]
        seed: u32,
    },
}

fn describe_layout(name: &str, layout: &StructLayout, fields: &[&str]) -> String {
    let mut out = format!("{name}: size={}\n", layout.size());
    for (field, slot) in fields.iter().zip(layout.slots()) {
        out.push_str(&format!(
            "  {field:<22} offset={:<3} len={:<3} padded={}\n",
            slot.offset, slot.len, slot.padded
        ));
    }
    out
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Layout => {
            let layouts = FrameLayouts::new()?;
            print!(
                "{}",
                describe_layout("uniform", &layouts.uniform, &UNIFORM_FIELDS)
            );
            print!(
                "{}",
                describe_layout("entity", &layouts.entity, &ENTITY_FIELDS)
            );
        }
        Commands::Replay {
            file,
            frames,
            interval,
            seed,
        } => {
            let script = std::fs::read_to_string(&file)?;
            let messages = parse_script(&script)?;
            tracing::info!(
                messages = messages.len(),
                frames,
                "replaying {}",
                file.display()
            );

            let report = replay(
                messages,
                ReplayOptions {
                    frames,
                    interval_ms: interval,
                    seed,
                },
            )?;
            println!("exit: {:?}, frames drawn: {}", report.exit, report.frames);
            for msg in &report.notifications {
                println!("worker: {}", orbtrace_protocol::encode_worker(msg)?);
            }
            let frame = serde_json::json!({
                "uniforms": report.uniform_json(),
                "entities": report.entities_json(),
            });
            println!("{}", serde_json::to_string_pretty(&frame)?);
        }
    }

    Ok(())
}
