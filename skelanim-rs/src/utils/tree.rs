//! Tree rendering for controllers and skeleton hierarchies

use console::Style;

/// Represents a node in a tree structure
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub name: String,
    pub node_type: NodeType,
    pub children: Vec<TreeNode>,
    /// Rendered in insertion order
    pub metadata: Vec<(String, String)>,
    pub external_refs: Vec<ExternalRef>,
}

/// Types of nodes in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Root,
    Group,
    State,
    Transition,
    Condition,
    Parameter,
    /// Skeleton node that is not a bone
    Node,
    Bone,
}

/// Reference from a node to something outside the tree
#[derive(Debug, Clone)]
pub struct ExternalRef {
    pub name: String,
    pub ref_type: RefType,
    pub exists: Option<bool>,
}

/// Types of external references
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    Clip,
    State,
}

/// Options for tree rendering
#[derive(Debug, Clone)]
pub struct TreeOptions {
    pub max_depth: Option<usize>,
    pub show_external_refs: bool,
    pub no_color: bool,
    pub show_metadata: bool,
    pub compact: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            show_external_refs: true,
            no_color: false,
            show_metadata: true,
            compact: false,
        }
    }
}

impl TreeNode {
    /// Create a new tree node
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
            metadata: Vec::new(),
            external_refs: Vec::new(),
        }
    }

    /// Add a child node
    pub fn add_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.push((key.to_string(), value.to_string()));
        self
    }

    /// Add external reference
    pub fn with_external_ref(mut self, name: &str, ref_type: RefType, exists: Option<bool>) -> Self {
        self.external_refs.push(ExternalRef {
            name: name.to_string(),
            ref_type,
            exists,
        });
        self
    }
}

impl ExternalRef {
    pub fn icon(&self) -> &'static str {
        match self.ref_type {
            RefType::Clip => "📽️",
            RefType::State => "🔗",
        }
    }

    /// Get color style based on existence
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self.exists {
                Some(true) => Style::new().green(),
                Some(false) => Style::new().red(),
                None => Style::new().yellow(),
            }
        }
    }
}

impl NodeType {
    pub fn icon(&self) -> &'static str {
        match self {
            NodeType::Root => "📁",
            NodeType::Group => "📂",
            NodeType::State => "🎬",
            NodeType::Transition => "➡️",
            NodeType::Condition => "❓",
            NodeType::Parameter => "🏷️",
            NodeType::Node => "◻️",
            NodeType::Bone => "🦴",
        }
    }

    /// Get color style for node type
    pub fn style(&self, no_color: bool) -> Style {
        if no_color {
            Style::new()
        } else {
            match self {
                NodeType::Root => Style::new().bold().cyan(),
                NodeType::Group => Style::new().bold().yellow(),
                NodeType::State => Style::new().green(),
                NodeType::Transition => Style::new().blue(),
                NodeType::Condition => Style::new().magenta(),
                NodeType::Parameter => Style::new().yellow(),
                NodeType::Node => Style::new().dim(),
                NodeType::Bone => Style::new().white(),
            }
        }
    }
}

/// Render a tree structure to string
pub fn render_tree(root: &TreeNode, options: &TreeOptions) -> String {
    let mut output = String::new();
    render_node(root, &mut output, "", true, 0, options);
    output
}

/// Render a single node and its children
fn render_node(
    node: &TreeNode,
    output: &mut String,
    prefix: &str,
    is_last: bool,
    depth: usize,
    options: &TreeOptions,
) {
    if let Some(max_depth) = options.max_depth
        && depth > max_depth
    {
        return;
    }

    let icon = node.node_type.icon();
    let style = node.node_type.style(options.no_color);
    let connector = if depth == 0 {
        ""
    } else if is_last {
        "└── "
    } else {
        "├── "
    };

    let mut line = format!(
        "{}{}{} {}",
        prefix,
        connector,
        icon,
        style.apply_to(&node.name)
    );

    if options.show_metadata && options.compact && !node.metadata.is_empty() {
        let meta_parts: Vec<String> = node
            .metadata
            .iter()
            .map(|(key, value)| format!("{key}:{value}"))
            .collect();
        line.push_str(&format!(" [{}]", meta_parts.join(", ")));
    }

    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        ""
    } else if is_last {
        "    "
    } else {
        "│   "
    };

    if options.show_metadata && !options.compact {
        let meta_prefix = format!("{prefix}{child_prefix}    ");
        let meta_style = if options.no_color {
            Style::new()
        } else {
            Style::new().dim()
        };

        for (key, value) in &node.metadata {
            output.push_str(&format!(
                "{}🏷️  {}: {}\n",
                meta_prefix,
                meta_style.apply_to(key),
                value
            ));
        }
    }

    if options.show_external_refs {
        let ref_prefix = format!("{prefix}{child_prefix}    ");

        for ext_ref in &node.external_refs {
            let style = ext_ref.style(options.no_color);
            let missing = if ext_ref.exists == Some(false) {
                " (missing)"
            } else {
                ""
            };
            output.push_str(&format!(
                "{}└─→ {} {}{}\n",
                ref_prefix,
                ext_ref.icon(),
                style.apply_to(&ext_ref.name),
                missing
            ));
        }
    }

    // Render children
    let new_prefix = if depth == 0 {
        String::new()
    } else {
        format!("{prefix}{child_prefix}")
    };

    for (i, child) in node.children.iter().enumerate() {
        let is_last_child = i == node.children.len() - 1;
        render_node(
            child,
            output,
            &new_prefix,
            is_last_child,
            depth + 1,
            options,
        );
    }
}
