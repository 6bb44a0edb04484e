//! Animation clip command implementations

use anyhow::Result;
use clap::Subcommand;
use console::style;
use std::path::PathBuf;

use skelanim::AnimationClip;

use crate::commands::controller::load_library;
use crate::utils::{add_table_row, create_table, format_seconds};

#[derive(Subcommand)]
pub enum ClipCommands {
    /// Summarize the clips in one or more clip files
    Info {
        /// Clip JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Show per-bone track tables
        #[arg(short, long)]
        detailed: bool,
    },
}

pub fn execute(cmd: ClipCommands) -> Result<()> {
    match cmd {
        ClipCommands::Info { files, detailed } => handle_info(&files, detailed),
    }
}

fn key_count(clip: &AnimationClip) -> usize {
    clip.tracks()
        .map(|t| t.positions.len() + t.rotations.len() + t.scales.len())
        .sum()
}

fn handle_info(files: &[PathBuf], detailed: bool) -> Result<()> {
    let library = load_library(files)?;

    println!("{}", style("Animation Clips").bold().cyan());
    println!("{}", style("===============").cyan());
    println!();

    let mut table = create_table(&["Clip", "Ticks", "Ticks/s", "Length", "Tracks", "Keys"]);
    let mut clips = Vec::with_capacity(library.len());
    for name in library.names() {
        let Some(clip) = library.get(name) else {
            continue;
        };
        add_table_row(
            &mut table,
            vec![
                clip.name().to_string(),
                format!("{:.2}", clip.duration()),
                format!("{:.2}", clip.ticks_per_second()),
                format_seconds(clip.duration_seconds()),
                clip.track_count().to_string(),
                key_count(&clip).to_string(),
            ],
        );
        clips.push(clip);
    }
    table.printstd();

    let degenerate: Vec<&str> = clips
        .iter()
        .filter(|c| c.is_degenerate())
        .map(|c| c.name())
        .collect();
    if !degenerate.is_empty() {
        println!(
            "\n{} zero-length clip(s) play as a constant pose: {}",
            style("⚠").yellow(),
            degenerate.join(", ")
        );
    }

    if detailed {
        for clip in &clips {
            println!("\n{}", style(clip.name()).bold().yellow());

            let mut tracks: Vec<_> = clip.tracks().collect();
            tracks.sort_by(|a, b| a.bone_name.cmp(&b.bone_name));

            let mut table = create_table(&["Bone", "Positions", "Rotations", "Scales", "Last Key"]);
            for track in tracks {
                add_table_row(
                    &mut table,
                    vec![
                        track.bone_name.clone(),
                        track.positions.len().to_string(),
                        track.rotations.len().to_string(),
                        track.scales.len().to_string(),
                        track
                            .last_key_time()
                            .map_or_else(|| "-".to_string(), |t| format!("{t:.2}")),
                    ],
                );
            }
            table.printstd();
        }
    }

    Ok(())
}
