//! Skeleton hierarchy and bone palette mapping
//!
//! A [`Skeleton`] is the immutable tree of named nodes produced by a model
//! importer. Only a subset of nodes are bones: those have an entry in the
//! bone map with a dense palette id and the offset matrix computed against
//! the bind pose.

use std::collections::HashMap;

use glam::{Mat4, Quat, Vec3};

use crate::MAX_BONES;
use crate::error::{AnimationError, Result};

/// Bind transform split into its channels
///
/// Sparse tracks only override the channels they carry, the rest come from here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BindPose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl BindPose {
    /// Decompose an affine transform
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

impl Default for BindPose {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// A node in the skeleton tree
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    local_bind_transform: Mat4,
    bind_pose: BindPose,
    children: Vec<Node>,
}

impl Node {
    /// Create a leaf node with the given bind-pose local transform
    pub fn new(name: impl Into<String>, local_bind_transform: Mat4) -> Self {
        Self {
            name: name.into(),
            local_bind_transform,
            bind_pose: BindPose::from_matrix(&local_bind_transform),
            children: Vec::new(),
        }
    }

    /// Add a child node (builder style)
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Add a child node in place
    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn local_bind_transform(&self) -> &Mat4 {
        &self.local_bind_transform
    }

    pub fn bind_pose(&self) -> &BindPose {
        &self.bind_pose
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Depth-first search for a node by name
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Node::node_count).sum::<usize>()
    }
}

/// Palette slot and offset matrix of a bone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoneInfo {
    /// Index into the output bone matrix array
    pub id: usize,
    /// Transforms from mesh space into bone space at bind time
    pub offset_matrix: Mat4,
}

impl BoneInfo {
    pub fn new(id: usize, offset_matrix: Mat4) -> Self {
        Self { id, offset_matrix }
    }
}

/// Immutable skeleton shared by every animator that drives it
#[derive(Debug, Clone)]
pub struct Skeleton {
    root: Node,
    bone_info: HashMap<String, BoneInfo>,
    global_inverse_transform: Mat4,
}

impl Skeleton {
    /// Build a skeleton, validating the bone palette
    ///
    /// Bone ids must be unique and below [`MAX_BONES`]. Gaps in the id range
    /// and bones that name no node are accepted but reported.
    pub fn new(
        root: Node,
        bone_info: HashMap<String, BoneInfo>,
        global_inverse_transform: Mat4,
    ) -> Result<Self> {
        let mut slots: Vec<Option<&str>> = vec![None; MAX_BONES];

        // Sorted so duplicate reports are deterministic
        let mut bones: Vec<(&String, &BoneInfo)> = bone_info.iter().collect();
        bones.sort_by(|a, b| a.0.cmp(b.0));

        for (name, info) in bones {
            if info.id >= MAX_BONES {
                return Err(AnimationError::BoneIdOutOfRange {
                    bone: name.clone(),
                    id: info.id,
                    max: MAX_BONES,
                });
            }
            if let Some(first) = slots[info.id] {
                return Err(AnimationError::DuplicateBoneId {
                    id: info.id,
                    first: first.to_string(),
                    second: name.clone(),
                });
            }
            slots[info.id] = Some(name.as_str());

            if root.find(name).is_none() {
                log::warn!("Bone '{}' (id {}) has no node in the hierarchy", name, info.id);
            }
        }

        let used = slots.iter().filter(|s| s.is_some()).count();
        let highest = slots.iter().rposition(Option::is_some);
        if let Some(highest) = highest
            && highest + 1 != used
        {
            log::warn!(
                "Bone ids are not dense: {} bones spread over ids 0..={}",
                used,
                highest
            );
        }

        Ok(Self {
            root,
            bone_info,
            global_inverse_transform,
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Bone info for a node name, if that node is a bone
    pub fn bone_info(&self, name: &str) -> Option<&BoneInfo> {
        self.bone_info.get(name)
    }

    /// Iterate over all bones as `(name, info)`
    pub fn bones(&self) -> impl Iterator<Item = (&str, &BoneInfo)> {
        self.bone_info.iter().map(|(name, info)| (name.as_str(), info))
    }

    pub fn bone_count(&self) -> usize {
        self.bone_info.len()
    }

    /// Number of palette slots actually used (highest id + 1)
    pub fn palette_len(&self) -> usize {
        self.bone_info
            .values()
            .map(|info| info.id + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn global_inverse_transform(&self) -> &Mat4 {
        &self.global_inverse_transform
    }

    pub fn find_node(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}
