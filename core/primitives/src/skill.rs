// core/primitives/src/skill.rs

use crate::error::ValidationError;
use crate::ids::{CategoryId, SkillId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Self-assessed proficiency attached to a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proficiency {
    #[default]
    Beginner,
    Intermediate,
    Expert,
}

impl Proficiency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Proficiency::Beginner => "Beginner",
            Proficiency::Intermediate => "Intermediate",
            Proficiency::Expert => "Expert",
        }
    }
}

/// A category node. Categories form a forest; a node with `parent = None`
/// is a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
}

/// A named capability users can offer or request.
///
/// The name is unique within a [`CategoryTree`]-backed board; tag membership
/// stays mutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub proficiency: Proficiency,
    pub categories: Vec<CategoryId>,
}

impl Skill {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptySkillName);
        }
        Ok(Self {
            id: SkillId::new(),
            name,
            proficiency: Proficiency::default(),
            categories: Vec::new(),
        })
    }

    pub fn with_proficiency(mut self, proficiency: Proficiency) -> Self {
        self.proficiency = proficiency;
        self
    }

    /// Attach the skill to a category; duplicates are ignored.
    pub fn tag(&mut self, category: CategoryId) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    pub fn untag(&mut self, category: CategoryId) {
        self.categories.retain(|c| *c != category);
    }
}

/// Category taxonomy with get-or-create semantics per (name, parent) pair.
///
/// Nested paths of up to a few levels are entered at once, mirroring how
/// skills are filed under "Root > Child > Leaf" breadcrumbs.
#[derive(Debug, Default, Clone)]
pub struct CategoryTree {
    nodes: HashMap<CategoryId, Category>,
    by_key: HashMap<(String, Option<CategoryId>), CategoryId>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or create a category with the given name under `parent`.
    pub fn get_or_create(
        &mut self,
        name: impl Into<String>,
        parent: Option<CategoryId>,
    ) -> CategoryId {
        let name = name.into();
        let key = (name.clone(), parent);
        if let Some(existing) = self.by_key.get(&key) {
            return *existing;
        }
        let id = CategoryId::new();
        self.nodes.insert(id, Category { id, name, parent });
        self.by_key.insert(key, id);
        id
    }

    /// Enter a nested path of category levels, creating missing nodes.
    /// Empty levels terminate the path. Returns the deepest node, if any.
    pub fn insert_path<'a, I>(&mut self, levels: I) -> Option<CategoryId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut parent = None;
        for level in levels {
            let level = level.trim();
            if level.is_empty() {
                break;
            }
            parent = Some(self.get_or_create(level, parent));
        }
        parent
    }

    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(&id)
    }

    /// Breadcrumb path from the root down to `id`, joined with " > ".
    pub fn full_path(&self, id: CategoryId) -> Option<String> {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.nodes.get(&current)?;
            segments.push(node.name.clone());
            cursor = node.parent;
        }
        segments.reverse();
        Some(segments.join(" > "))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
