//! Rig Build
//!
//! Pose/armature evaluation is structured as one pose component with three
//! fixed-role operations (rebuild on topology change, init first, flush
//! last) and one bone component per pose channel carrying the bone's
//! transform and constraint-stack operations. IK and spline-IK
//! constraints add solver operations that run at pose level, between
//! chains of bone operations; each solver resolves its chain-root bone at
//! build time.

use crate::graph::{ComponentKey, ComponentKind, OpCode, noop_callback};
use crate::scene::{Armature, ConstraintKind, EntityKey, Object, PoseChannel};

use super::{DepsgraphBuilder, op_name};

/// Upper bound on chain-root resolution, bounding walks over
/// pathologically long (or malformed, cyclic) parent chains.
pub(crate) const MAX_CHAIN_WALK: u16 = 255;

/// Walk parent links upward from `start`: `segments` steps, or to the
/// skeleton root, whichever comes first. `segments == 0` means the whole
/// chain. Never walks more than [`MAX_CHAIN_WALK`] ancestors.
pub(crate) fn resolve_chain_root<'a>(
    object: &'a Object,
    start: &'a PoseChannel,
    segments: u16,
) -> &'a PoseChannel {
    let mut root = start;
    let mut walked: u16 = 0;
    while let Some(parent) = root
        .parent
        .as_deref()
        .and_then(|name| object.pose_channel(name))
    {
        if segments != 0 && walked == segments {
            break;
        }
        if walked == MAX_CHAIN_WALK {
            break;
        }
        root = parent;
        walked += 1;
    }
    root
}

impl DepsgraphBuilder<'_, '_> {
    /// Build the pose rig for an armature object.
    pub(crate) fn build_rig(&mut self, object: &Object, armature: &Armature) {
        let key = object.key();

        // Animated deform properties live on the armature datablock.
        let armature_key = EntityKey::armature(armature.name.clone());
        self.build_animdata(&armature_key, armature.anim.as_ref());

        // Pose evaluation context. All bone operations run between init
        // and flush; rebuild only runs when the rig topology changed.
        self.graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Pose),
            OpCode::Rebuild,
            noop_callback(),
            op_name::POSE_REBUILD,
        );
        self.graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Pose),
            OpCode::Init,
            noop_callback(),
            op_name::POSE_INIT,
        );
        self.graph.add_operation_node(
            &key,
            ComponentKey::new(ComponentKind::Pose),
            OpCode::Post,
            noop_callback(),
            op_name::POSE_FLUSH,
        );

        for channel in &object.pose {
            self.graph.add_operation_node(
                &key,
                ComponentKey::with_sub_name(ComponentKind::Bone, channel.name.clone()),
                OpCode::Exec,
                noop_callback(),
                op_name::BONE_TRANSFORMS,
            );

            self.build_pose_constraints(object, channel);

            for constraint in &channel.constraints {
                match constraint.kind {
                    ConstraintKind::Ik {
                        chain_length,
                        use_tip,
                    } => self.build_ik_pose(object, channel, chain_length, use_tip),
                    ConstraintKind::SplineIk { chain_length } => {
                        self.build_splineik_pose(object, channel, chain_length)
                    }
                    ConstraintKind::Generic => {}
                }
            }
        }
    }

    /// One monolithic operation for a bone's constraint stack.
    fn build_pose_constraints(&mut self, object: &Object, channel: &PoseChannel) {
        self.graph.add_operation_node(
            &object.key(),
            ComponentKey::with_sub_name(ComponentKind::Bone, channel.name.clone()),
            OpCode::Exec,
            noop_callback(),
            op_name::CONSTRAINT_STACK,
        );
    }

    /// Solver operation for an IK constraint, named for its resolved
    /// chain root.
    fn build_ik_pose(&mut self, object: &Object, channel: &PoseChannel, segments: u16, use_tip: bool) {
        // When the tip is excluded, the chain starts at the bone's parent.
        let mut start = channel;
        if !use_tip {
            if let Some(parent) = start
                .parent
                .as_deref()
                .and_then(|name| object.pose_channel(name))
            {
                start = parent;
            }
        }
        let root = resolve_chain_root(object, start, segments);

        self.graph.add_operation_node(
            &object.key(),
            ComponentKey::with_sub_name(ComponentKind::Bone, channel.name.clone()),
            OpCode::Sim,
            noop_callback(),
            op_name::ik_solver(&root.name),
        );
    }

    /// Solver operation for a spline-IK constraint, named for its
    /// resolved chain root.
    fn build_splineik_pose(&mut self, object: &Object, channel: &PoseChannel, segments: u16) {
        let root = resolve_chain_root(object, channel, segments);

        self.graph.add_operation_node(
            &object.key(),
            ComponentKey::with_sub_name(ComponentKind::Bone, channel.name.clone()),
            OpCode::Sim,
            noop_callback(),
            op_name::spline_ik_solver(&root.name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ObjectData;

    /// A straight chain: bone0 <- bone1 <- ... <- bone{n-1}.
    fn chain(n: usize) -> Object {
        let mut object = Object::new("Rig", ObjectData::Armature { name: "Arm".into() });
        for i in 0..n {
            let mut channel = PoseChannel::new(format!("bone{i}"));
            if i > 0 {
                channel.parent = Some(format!("bone{}", i - 1));
            }
            object.pose.push(channel);
        }
        object
    }

    #[test]
    fn chain_root_walks_requested_segments() {
        let object = chain(6);
        let tip = object.pose_channel("bone5").unwrap();

        let root = resolve_chain_root(&object, tip, 2);
        assert_eq!(root.name, "bone3");
    }

    #[test]
    fn chain_root_stops_at_skeleton_root() {
        let object = chain(4);
        let tip = object.pose_channel("bone3").unwrap();

        // More segments than the chain has: stops at the root.
        let root = resolve_chain_root(&object, tip, 10);
        assert_eq!(root.name, "bone0");
    }

    #[test]
    fn zero_segments_means_whole_chain() {
        let object = chain(5);
        let tip = object.pose_channel("bone4").unwrap();

        let root = resolve_chain_root(&object, tip, 0);
        assert_eq!(root.name, "bone0");
    }

    #[test]
    fn cyclic_parent_links_are_capped() {
        let mut object = Object::new("Rig", ObjectData::Armature { name: "Arm".into() });
        object.pose.push(PoseChannel::child_of("a", "b"));
        object.pose.push(PoseChannel::child_of("b", "a"));

        let start = object.pose_channel("a").unwrap();
        // Terminates despite the cycle; lands wherever the cap fell.
        let root = resolve_chain_root(&object, start, 0);
        assert!(root.name == "a" || root.name == "b");
    }
}
