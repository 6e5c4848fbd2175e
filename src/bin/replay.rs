use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use log::info;
use visittrack_rs::tracker::replay::{ReplayFactory, ReplayScript};
use visittrack_rs::{Frame, SectionForest, Session, SessionConfig};

#[derive(Parser)]
#[command(author, version, about = "Replay recorded target boxes through a visit-tracking session")]
struct Args {
    /// Recorded per-target boxes (JSON)
    #[arg(long)]
    script: PathBuf,
    /// Section layout (JSON); the built-in store layout is used when absent
    #[arg(long)]
    layout: Option<PathBuf>,
    /// Session config (JSON); missing values keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value_t = 640)]
    width: u32,
    #[arg(long, default_value_t = 480)]
    height: u32,
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
    /// Write the export here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    anyhow::ensure!(args.fps > 0.0, "fps must be positive, got {}", args.fps);

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let layout = match &args.layout {
        Some(path) => SectionForest::load(path, config.layout.max_depth)
            .with_context(|| format!("failed to load layout {}", path.display()))?,
        None => SectionForest::default_store(args.width, args.height),
    };

    let raw = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {}", args.script.display()))?;
    let script: ReplayScript = serde_json::from_str(&raw).context("malformed replay script")?;
    let script = script.in_selection_order();
    let selections = script.selections();

    let mut session = Session::with_layout(config, Arc::new(ReplayFactory::new(&script)), layout);

    let Some((first, last)) = script.frame_span() else {
        anyhow::bail!("replay script has no frames");
    };
    info!(
        "replaying {} target(s) over frames {first}..={last}",
        selections.len()
    );

    for index in first..=last {
        let frame = Frame::blank(index, index as f64 / args.fps, args.width, args.height);
        session
            .process_frame(&frame)
            .with_context(|| format!("frame {index}"))?;

        // Operators select on the frame on screen, after it was processed
        for (_, bbox) in selections.iter().flatten().filter(|(at, _)| *at == index) {
            let id = session
                .start_target(*bbox, &frame)
                .with_context(|| format!("selecting {bbox:?} on frame {index}"))?;
            info!("selected {id} on frame {index}");
        }
    }

    let export = session.export();
    let json = serde_json::to_string_pretty(&export)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!("export written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}
