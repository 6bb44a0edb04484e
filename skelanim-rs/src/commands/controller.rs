//! Animator controller command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use console::style;
use std::path::{Path, PathBuf};

use skelanim::{
    AnimationLibrary, AnimatorController, AnimatorState, Condition, ConditionMode, Transition,
    loader,
};

use crate::utils::{
    NodeType, RefType, TreeNode, TreeOptions, add_table_row, create_table, format_seconds,
    render_tree,
};

#[derive(Subcommand)]
pub enum ControllerCommands {
    /// Display information about a controller file
    Info {
        /// Path to the controller JSON file
        file: PathBuf,

        /// Show parameter and state tables
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display the state graph as a tree
    Tree {
        /// Path to the controller JSON file
        file: PathBuf,

        /// Clip files used to check clip references
        #[arg(short, long = "clips")]
        clips: Vec<PathBuf>,

        /// Maximum depth to display
        #[arg(short, long, default_value = "5")]
        depth: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Show metadata inline
        #[arg(long)]
        compact: bool,
    },

    /// Validate a controller against a clip library
    Validate {
        /// Path to the controller JSON file
        file: PathBuf,

        /// Clip files the controller's states refer to
        #[arg(short, long = "clips", required = true)]
        clips: Vec<PathBuf>,

        /// Show all warnings (not just errors)
        #[arg(short, long)]
        warnings: bool,
    },
}

pub fn execute(cmd: ControllerCommands) -> Result<()> {
    match cmd {
        ControllerCommands::Info { file, detailed } => handle_info(&file, detailed),
        ControllerCommands::Tree {
            file,
            clips,
            depth,
            no_color,
            compact,
        } => handle_tree(&file, &clips, depth, no_color, compact),
        ControllerCommands::Validate {
            file,
            clips,
            warnings,
        } => handle_validate(&file, &clips, warnings),
    }
}

pub(crate) fn load_controller(path: &Path) -> Result<AnimatorController> {
    loader::controller_from_path(path)
        .with_context(|| format!("Failed to load controller from {}", path.display()))
}

pub(crate) fn load_library(paths: &[PathBuf]) -> Result<AnimationLibrary> {
    loader::library_from_paths(paths).context("Failed to load animation clips")
}

/// Human-readable form of a condition
pub(crate) fn describe_condition(condition: &Condition) -> String {
    let name = &condition.parameter;
    match condition.mode {
        ConditionMode::True => format!("{name} is true"),
        ConditionMode::False => format!("{name} is false"),
        ConditionMode::Greater => format!("{name} > {}", condition.threshold),
        ConditionMode::Less => format!("{name} < {}", condition.threshold),
        ConditionMode::Equals => format!("{name} == {}", condition.threshold),
        ConditionMode::Trigger => format!("{name} triggered"),
    }
}

fn handle_info(path: &Path, detailed: bool) -> Result<()> {
    let controller = load_controller(path)?;

    println!("{}", style("Animator Controller").bold().cyan());
    println!("{}", style("===================").cyan());
    println!();
    println!("{}: {}", style("File").bold(), path.display());
    println!("{}: {}", style("Name").bold(), controller.name());
    println!(
        "{}: {}",
        style("Default State").bold(),
        controller.default_state()
    );
    println!(
        "{}: {}",
        style("Parameters").bold(),
        controller.parameters().len()
    );
    println!("{}: {}", style("States").bold(), controller.states().len());
    let transitions: usize = controller
        .states()
        .iter()
        .map(|s| s.transitions.len())
        .sum();
    println!("{}: {}", style("Transitions").bold(), transitions);

    if detailed {
        println!();
        println!("{}", style("Parameters:").bold());
        let mut table = create_table(&["Name", "Type", "Default"]);
        for parameter in controller.parameters() {
            add_table_row(
                &mut table,
                vec![
                    parameter.name.clone(),
                    parameter.kind().to_string(),
                    parameter.value.to_string(),
                ],
            );
        }
        table.printstd();

        println!();
        println!("{}", style("States:").bold());
        let mut table = create_table(&["State", "Clip", "Loop", "Speed", "Transitions"]);
        for state in controller.states() {
            add_table_row(
                &mut table,
                vec![
                    state.name.clone(),
                    state.clip.clone(),
                    state.looping.to_string(),
                    format!("{:.2}", state.speed),
                    state.transitions.len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    Ok(())
}

fn transition_node(transition: &Transition, controller: &AnimatorController) -> TreeNode {
    let mut node = TreeNode::new(
        format!("→ {}", transition.to_state),
        NodeType::Transition,
    )
    .with_metadata("blend", format_seconds(transition.blend_duration));

    if transition.has_exit_time {
        node = node.with_metadata("exit time", format!("{:.2}", transition.exit_time));
    }
    if !transition.can_interrupt_before_exit_time {
        node = node.with_metadata("interruptible", "no");
    }
    if !controller.has_state(&transition.to_state) {
        node = node.with_external_ref(&transition.to_state, RefType::State, Some(false));
    }

    for condition in &transition.conditions {
        node = node.add_child(TreeNode::new(
            describe_condition(condition),
            NodeType::Condition,
        ));
    }
    node
}

fn state_node(
    state: &AnimatorState,
    controller: &AnimatorController,
    library: Option<&AnimationLibrary>,
) -> TreeNode {
    let mut name = state.name.clone();
    if state.name == controller.default_state() {
        name.push_str(" (default)");
    }

    let mut node = TreeNode::new(name, NodeType::State)
        .with_metadata("loop", state.looping)
        .with_metadata("speed", format!("{:.2}", state.speed))
        .with_external_ref(
            &state.clip,
            RefType::Clip,
            library.map(|l| l.contains(&state.clip)),
        );

    for transition in &state.transitions {
        node = node.add_child(transition_node(transition, controller));
    }
    node
}

/// Build the tree shown by `controller tree`
pub(crate) fn controller_tree(
    controller: &AnimatorController,
    library: Option<&AnimationLibrary>,
) -> TreeNode {
    let mut parameters = TreeNode::new("Parameters", NodeType::Group);
    for parameter in controller.parameters() {
        parameters = parameters.add_child(
            TreeNode::new(&parameter.name, NodeType::Parameter)
                .with_metadata("type", parameter.kind())
                .with_metadata("default", parameter.value),
        );
    }

    let mut states = TreeNode::new("States", NodeType::Group);
    for state in controller.states() {
        states = states.add_child(state_node(state, controller, library));
    }

    TreeNode::new(controller.name(), NodeType::Root)
        .with_metadata("default state", controller.default_state())
        .add_child(parameters)
        .add_child(states)
}

fn handle_tree(
    path: &Path,
    clips: &[PathBuf],
    max_depth: usize,
    no_color: bool,
    compact: bool,
) -> Result<()> {
    let controller = load_controller(path)?;
    let library = if clips.is_empty() {
        None
    } else {
        Some(load_library(clips)?)
    };

    let root = controller_tree(&controller, library.as_ref());
    let options = TreeOptions {
        max_depth: Some(max_depth),
        no_color,
        compact,
        ..Default::default()
    };

    print!("{}", render_tree(&root, &options));
    Ok(())
}

fn handle_validate(path: &Path, clips: &[PathBuf], show_warnings: bool) -> Result<()> {
    println!("{}", style("Validating Controller").bold().cyan());
    println!("{}", style("=====================").cyan());
    println!();

    let controller = load_controller(path)?;
    let library = load_library(clips)?;
    log::info!(
        "Validating '{}' against {} clip(s)",
        controller.name(),
        library.len()
    );

    let report = controller.validate(&library);

    if report.is_ok() && report.warnings.is_empty() {
        println!(
            "{} {}",
            style("✓").green(),
            style("Controller is valid!").green()
        );
        return Ok(());
    }

    if !report.errors.is_empty() {
        println!(
            "{} {} error(s) found:",
            style("✗").red(),
            report.errors.len()
        );
        for error in &report.errors {
            println!("  {} {}", style("•").red(), error);
        }
    }

    if show_warnings && !report.warnings.is_empty() {
        println!(
            "\n{} {} warning(s):",
            style("⚠").yellow(),
            report.warnings.len()
        );
        for warning in &report.warnings {
            println!("  {} {}", style("•").yellow(), warning);
        }
    } else if !report.warnings.is_empty() {
        println!(
            "\n{} {} warning(s) (use -w to show)",
            style("ℹ").blue(),
            report.warnings.len()
        );
    }

    if !report.is_ok() {
        bail!(
            "Controller '{}' failed validation with {} error(s)",
            controller.name(),
            report.errors.len()
        );
    }

    println!(
        "\n{} {}",
        style("✓").green(),
        style("Controller is valid!").green()
    );
    Ok(())
}
