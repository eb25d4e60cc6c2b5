//! Second pass: group converted nodes under their assemblies.
//!
//! Assemblies carry no geometry of their own. Each becomes a group node
//! that takes ownership of its members' converted nodes, so a member shows
//! up once, under the group, instead of at the top level.

use std::collections::{HashMap, HashSet};

use super::cancel::CancellationToken;
use super::geometry::node_from_record;
use super::registry::{RecordId, Registry};
use crate::scene::{Color, NodeKind, RenderPayload, SceneNode, Transform};

/// Builds group nodes for every assembly in a registry.
pub struct AssemblyBuilder<'a> {
    registry: &'a Registry,
    default_color: Color,
}

impl<'a> AssemblyBuilder<'a> {
    pub fn new(registry: &'a Registry, default_color: Color) -> Self {
        Self {
            registry,
            default_color,
        }
    }

    /// Build every assembly group, moving member nodes out of `converted`.
    ///
    /// Returns the top-level groups in declaration order. Groups nested in
    /// another assembly are owned by that assembly's group. Returns `None`
    /// if cancelled.
    pub fn build(
        &self,
        converted: &mut HashMap<String, SceneNode>,
        cancel: &CancellationToken,
    ) -> Option<Vec<SceneNode>> {
        let assemblies: Vec<RecordId> = self
            .registry
            .iter()
            .filter(|(_, record)| record.is_assembly())
            .map(|(id, _)| id)
            .collect();

        let mut groups = HashMap::new();
        let mut started = HashSet::new();
        for &id in &assemblies {
            if cancel.is_cancelled() {
                return None;
            }
            self.build_group(id, converted, &mut groups, &mut started);
        }

        Some(assemblies.iter().filter_map(|id| groups.remove(id)).collect())
    }

    /// Build one group, nested assemblies first. `started` breaks cycles: an
    /// assembly reached again while it is still being built is left out.
    fn build_group(
        &self,
        id: RecordId,
        converted: &mut HashMap<String, SceneNode>,
        groups: &mut HashMap<RecordId, SceneNode>,
        started: &mut HashSet<RecordId>,
    ) {
        if !started.insert(id) {
            return;
        }
        let Some(record) = self.registry.get(id) else {
            return;
        };

        let mut group = node_from_record(
            record,
            NodeKind::Assembly,
            RenderPayload::Group,
            self.default_color,
        );
        let rotation = record
            .properties
            .placement("Placement")
            .map(|p| p.rotation())
            .unwrap_or_default();
        group.transform = Transform::from_rotation(rotation);

        for &child_id in &record.children {
            let Some(child) = self.registry.get(child_id) else {
                continue;
            };
            // The last assembly to list a member owns it.
            if child.parent != Some(id) {
                continue;
            }

            let node = if child.is_assembly() {
                self.build_group(child_id, converted, groups, started);
                groups.remove(&child_id)
            } else {
                converted.remove(&child.name)
            };

            match node {
                Some(mut node) => {
                    node.parent = Some(record.name.clone());
                    group.children.push(node);
                }
                None => log::debug!("Assembly '{}': member '{}' has no node", record.name, child.name),
            }
        }

        log::debug!("Assembly '{}' groups {} nodes", record.name, group.children.len());
        groups.insert(id, group);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lens_math::{Quat, Vec3};

    use super::*;
    use crate::fcstd::registry::{ObjectRecord, ASSEMBLY_TYPE};
    use crate::mesh::Mesh;
    use crate::property::{Placement, Property, PropertyValue};

    fn shape_node(name: &str) -> SceneNode {
        let mesh = Arc::new(Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![0, 1, 2], None));
        SceneNode::new(name, NodeKind::Shape, RenderPayload::Meshes(vec![mesh]))
    }

    fn converted(names: &[&str]) -> HashMap<String, SceneNode> {
        names.iter().map(|n| (n.to_string(), shape_node(n))).collect()
    }

    #[test]
    fn test_members_move_under_group_in_link_order() {
        let mut registry = Registry::new();
        let asm = registry.insert(ObjectRecord::new("Assembly", ASSEMBLY_TYPE));
        let a = registry.insert(ObjectRecord::new("A", "Part::Box"));
        let b = registry.insert(ObjectRecord::new("B", "Part::Box"));
        registry.insert(ObjectRecord::new("Loose", "Part::Box"));
        registry.adopt(asm, b);
        registry.adopt(asm, a);

        let mut nodes = converted(&["A", "B", "Loose"]);
        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut nodes, &CancellationToken::new())
            .unwrap();

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.kind, NodeKind::Assembly);
        let children: Vec<_> = group.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(children, vec!["B", "A"]);
        assert!(group.children.iter().all(|c| c.parent.as_deref() == Some("Assembly")));

        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains_key("Loose"));
    }

    #[test]
    fn test_group_uses_rotation_only() {
        let mut registry = Registry::new();
        let mut record = ObjectRecord::new("Assembly", ASSEMBLY_TYPE);
        record.properties.push(Property::new(
            "Placement",
            PropertyValue::Placement(Placement {
                axis: Vec3::X,
                angle: std::f32::consts::PI,
                translation: Vec3::new(10.0, 20.0, 30.0),
            }),
        ));
        registry.insert(record);

        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut HashMap::new(), &CancellationToken::new())
            .unwrap();

        let transform = groups[0].transform;
        assert_eq!(transform.translation, Vec3::ZERO);
        assert!(transform
            .rotation
            .abs_diff_eq(Quat::from_rotation_x(std::f32::consts::PI), 1e-5));
    }

    #[test]
    fn test_nested_assemblies() {
        let mut registry = Registry::new();
        let outer = registry.insert(ObjectRecord::new("Outer", ASSEMBLY_TYPE));
        let inner = registry.insert(ObjectRecord::new("Inner", ASSEMBLY_TYPE));
        let part = registry.insert(ObjectRecord::new("Part", "Part::Box"));
        registry.adopt(outer, inner);
        registry.adopt(inner, part);

        let mut nodes = converted(&["Part"]);
        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut nodes, &CancellationToken::new())
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "Outer");
        let inner_node = &groups[0].children[0];
        assert_eq!(inner_node.name, "Inner");
        assert_eq!(inner_node.parent.as_deref(), Some("Outer"));
        assert_eq!(inner_node.children[0].name, "Part");
        assert!(nodes.is_empty());
    }

    #[test]
    fn test_cycle_is_broken() {
        let mut registry = Registry::new();
        let a = registry.insert(ObjectRecord::new("A", ASSEMBLY_TYPE));
        let b = registry.insert(ObjectRecord::new("B", ASSEMBLY_TYPE));
        registry.adopt(a, b);
        registry.adopt(b, a);

        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut HashMap::new(), &CancellationToken::new())
            .unwrap();

        // A is built first and takes B; B can't take A back.
        let total: usize = groups.iter().map(|g| 1 + g.children.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn test_member_claimed_twice_goes_to_last_claimant() {
        let mut registry = Registry::new();
        let first = registry.insert(ObjectRecord::new("First", ASSEMBLY_TYPE));
        let second = registry.insert(ObjectRecord::new("Second", ASSEMBLY_TYPE));
        let part = registry.insert(ObjectRecord::new("Part", "Part::Box"));
        registry.adopt(first, part);
        registry.adopt(second, part);

        let mut nodes = converted(&["Part"]);
        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut nodes, &CancellationToken::new())
            .unwrap();

        assert!(groups[0].children.is_empty());
        assert_eq!(groups[1].children[0].name, "Part");
    }

    #[test]
    fn test_unconverted_member_is_skipped() {
        let mut registry = Registry::new();
        let asm = registry.insert(ObjectRecord::new("Assembly", ASSEMBLY_TYPE));
        let hidden = registry.insert(ObjectRecord::new("Hidden", "Part::Box"));
        registry.adopt(asm, hidden);

        let groups = AssemblyBuilder::new(&registry, Color::default())
            .build(&mut HashMap::new(), &CancellationToken::new())
            .unwrap();

        assert_eq!(groups.len(), 1);
        assert!(groups[0].children.is_empty());
    }

    #[test]
    fn test_cancelled() {
        let mut registry = Registry::new();
        registry.insert(ObjectRecord::new("Assembly", ASSEMBLY_TYPE));
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(AssemblyBuilder::new(&registry, Color::default())
            .build(&mut HashMap::new(), &cancel)
            .is_none());
    }
}
