//! Skeleton command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};

use skelanim::{Node, Skeleton, loader};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_rotation, format_vec3,
    render_tree,
};

#[derive(Subcommand)]
pub enum SkeletonCommands {
    /// Display information about a skeleton file
    Info {
        /// Path to the skeleton JSON file
        file: PathBuf,
    },

    /// Display the node hierarchy as a tree
    Tree {
        /// Path to the skeleton JSON file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Show bind translations
        #[arg(short, long)]
        bind: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List bones with their palette slots and bind pose
    Bones {
        /// Path to the skeleton JSON file
        file: PathBuf,
    },
}

pub fn execute(cmd: SkeletonCommands) -> Result<()> {
    match cmd {
        SkeletonCommands::Info { file } => handle_info(&file),
        SkeletonCommands::Tree {
            file,
            depth,
            bind,
            no_color,
        } => handle_tree(&file, depth, bind, no_color),
        SkeletonCommands::Bones { file } => handle_bones(&file),
    }
}

pub(crate) fn load_skeleton(path: &Path) -> Result<Skeleton> {
    loader::skeleton_from_path(path)
        .with_context(|| format!("Failed to load skeleton from {}", path.display()))
}

fn handle_info(path: &Path) -> Result<()> {
    let skeleton = load_skeleton(path)?;

    println!("{}", style("Skeleton Information").bold().cyan());
    println!("{}", style("====================").cyan());
    println!();
    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Root").bold(), skeleton.root().name());
    println!("{}: {}", style("Nodes").bold(), skeleton.node_count());
    println!("{}: {}", style("Bones").bold(), skeleton.bone_count());
    println!(
        "{}: {} / {}",
        style("Palette").bold(),
        skeleton.palette_len(),
        skelanim::MAX_BONES
    );

    let unbound: Vec<&str> = skeleton
        .bones()
        .filter(|(name, _)| skeleton.find_node(name).is_none())
        .map(|(name, _)| name)
        .collect();
    if !unbound.is_empty() {
        println!(
            "{} {} bone(s) name no node: {}",
            style("⚠").yellow(),
            unbound.len(),
            unbound.join(", ")
        );
    }

    Ok(())
}

fn node_tree(node: &Node, skeleton: &Skeleton, show_bind: bool) -> TreeNode {
    let mut tree = match skeleton.bone_info(node.name()) {
        Some(info) => TreeNode::new(node.name(), NodeType::Bone).with_metadata("id", info.id),
        None => TreeNode::new(node.name(), NodeType::Node),
    };

    if show_bind {
        tree = tree.with_metadata("translation", format_vec3(node.bind_pose().translation));
    }

    for child in node.children() {
        tree = tree.add_child(node_tree(child, skeleton, show_bind));
    }
    tree
}

/// Build the tree shown by `skeleton tree`
pub(crate) fn skeleton_tree(skeleton: &Skeleton, show_bind: bool) -> TreeNode {
    let mut root = node_tree(skeleton.root(), skeleton, show_bind);
    root.node_type = NodeType::Root;
    root
}

fn handle_tree(
    path: &Path,
    max_depth: Option<usize>,
    show_bind: bool,
    no_color: bool,
) -> Result<()> {
    let skeleton = load_skeleton(path)?;
    let options = TreeOptions {
        max_depth,
        no_color,
        compact: true,
        ..Default::default()
    };

    print!("{}", render_tree(&skeleton_tree(&skeleton, show_bind), &options));
    Ok(())
}

fn handle_bones(path: &Path) -> Result<()> {
    let skeleton = load_skeleton(path)?;

    let mut bones: Vec<_> = skeleton.bones().collect();
    bones.sort_by_key(|(_, info)| info.id);

    let mut table = create_table(&["Id", "Bone", "Bind Translation", "Bind Rotation", "Bind Scale"]);
    for (name, info) in bones {
        let (translation, rotation, scale) = match skeleton.find_node(name) {
            Some(node) => {
                let bind = node.bind_pose();
                (
                    format_vec3(bind.translation),
                    format_rotation(bind.rotation),
                    format_vec3(bind.scale),
                )
            }
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        add_table_row(
            &mut table,
            vec![
                info.id.to_string(),
                name.to_string(),
                translation,
                rotation,
                scale,
            ],
        );
    }
    table.printstd();

    Ok(())
}
