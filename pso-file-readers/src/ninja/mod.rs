use std::collections::HashSet;

use anyhow::anyhow;
use glam::{Mat3, Mat4, Quat, Vec3};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{iff::IffFile, ByteCursor, ParseWarning, PsoFile};

mod nj;
mod xj;

pub use nj::NjStripOptions;

const NODE_SIZE: usize = 52;

bitflags::bitflags! {
    #[repr(transparent)]
    pub struct NjEvalFlags: u32 {
        const NO_TRANSLATE = (1 << 0);
        const NO_ROTATE = (1 << 1);
        const NO_SCALE = (1 << 2);
        const HIDDEN = (1 << 3);
        const BREAK_CHILD_TRACE = (1 << 4);
        const ZXY_ROTATION_ORDER = (1 << 5);
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NjReadError {
    #[error("Node offset {offset} is its own ancestor or earlier sibling")]
    CyclicNodeOffset { offset: usize },
    #[error("Node at offset {offset} exceeds the maximum node depth of {max_depth}")]
    NodeDepthExceeded { offset: usize, max_depth: usize },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NjFormat {
    Nj,
    Xj,
}

pub struct NjReadOptions {
    pub format: NjFormat,
    pub max_node_depth: usize,
}

impl Default for NjReadOptions {
    fn default() -> Self {
        Self {
            format: NjFormat::Nj,
            max_node_depth: 256,
        }
    }
}

/// Flattened model geometry in world space.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct NinjaGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

/// Accumulates vertices and triangles across all nodes of a model.
#[derive(Default)]
pub(crate) struct GeometryBuilder {
    positions: Vec<Option<[f32; 3]>>,
    normals: Vec<Option<[f32; 3]>>,
    pub indices: Vec<u32>,
}

impl GeometryBuilder {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Sets vertex `index` unless an earlier chunk already set it.
    pub fn set_vertex(&mut self, index: usize, position: Vec3, normal: Option<Vec3>) {
        if index >= self.positions.len() {
            self.positions.resize(index + 1, None);
            self.normals.resize(index + 1, None);
        }

        if self.positions[index].is_none() {
            self.positions[index] = Some(position.to_array());
            self.normals[index] = normal.map(|normal| normal.to_array());
        }
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.positions.push(Some(position.to_array()));
        self.normals.push(Some(normal.to_array()));
    }

    /// Emits the triangles of a strip, alternating winding per triangle.
    pub fn push_strip(&mut self, strip: &[u32], clockwise: bool) {
        for j in 2..strip.len() {
            let (a, b, c) = (strip[j - 2], strip[j - 1], strip[j]);
            if (j % 2 == 0) != clockwise {
                self.indices.extend_from_slice(&[a, b, c]);
            } else {
                self.indices.extend_from_slice(&[b, a, c]);
            }
        }
    }

    fn build(self) -> NinjaGeometry {
        NinjaGeometry {
            positions: self
                .positions
                .into_iter()
                .map(|position| position.unwrap_or([0.0, 0.0, 0.0]))
                .collect(),
            normals: self
                .normals
                .into_iter()
                .map(|normal| normal.unwrap_or([0.0, 1.0, 0.0]))
                .collect(),
            indices: self.indices,
        }
    }
}

/// Inverse transpose of the upper 3x3, used to transform normals.
pub(crate) fn normal_matrix(matrix: &Mat4) -> Mat3 {
    let upper = Mat3::from_mat4(*matrix);
    if upper.determinant() == 0.0 {
        Mat3::ZERO
    } else {
        upper.inverse().transpose()
    }
}

fn read_angle(reader: &mut ByteCursor) -> Result<f32, anyhow::Error> {
    Ok(reader.read_i32()? as f32 / 65535.0 * 2.0 * std::f32::consts::PI)
}

struct Node {
    flags: NjEvalFlags,
    model_offset: usize,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    child_offset: usize,
    sibling_offset: usize,
}

impl Node {
    fn read(reader: &mut ByteCursor) -> Result<Self, anyhow::Error> {
        let flags = NjEvalFlags::from_bits_truncate(reader.read_u32()?);
        let model_offset = reader.read_u32()? as usize;
        let position = reader.read_vector3_f32()?.into();
        let rotation = Vec3::new(
            read_angle(reader)?,
            read_angle(reader)?,
            read_angle(reader)?,
        );
        let scale = reader.read_vector3_f32()?.into();
        let child_offset = reader.read_u32()? as usize;
        let sibling_offset = reader.read_u32()? as usize;

        Ok(Self {
            flags,
            model_offset,
            position,
            rotation,
            scale,
            child_offset,
            sibling_offset,
        })
    }

    fn local_transform(&self) -> Mat4 {
        let translation = if self.flags.contains(NjEvalFlags::NO_TRANSLATE) {
            Vec3::ZERO
        } else {
            self.position
        };

        let rotation = if self.flags.contains(NjEvalFlags::NO_ROTATE) {
            Quat::IDENTITY
        } else {
            let x = Quat::from_rotation_x(self.rotation.x);
            let y = Quat::from_rotation_y(self.rotation.y);
            let z = Quat::from_rotation_z(self.rotation.z);
            if self.flags.contains(NjEvalFlags::ZXY_ROTATION_ORDER) {
                z * x * y
            } else {
                z * y * x
            }
        };

        let scale = if self.flags.contains(NjEvalFlags::NO_SCALE) {
            Vec3::ONE
        } else {
            self.scale
        };

        Mat4::from_scale_rotation_translation(scale, rotation, translation)
    }
}

struct SceneWalker<'a> {
    reader: &'a mut ByteCursor,
    options: &'a NjReadOptions,
    /// Nodes of the sibling chains from the root to the node being walked.
    path: HashSet<usize>,
    geometry: GeometryBuilder,
    warnings: &'a mut Vec<ParseWarning>,
}

impl<'a> SceneWalker<'a> {
    /// Walks the sibling chain starting at `offset`. Siblings share
    /// `parent_matrix`, children are walked with their parent's world matrix.
    /// A subtree reachable from several nodes is walked once per reference.
    fn walk_siblings(
        &mut self,
        mut offset: usize,
        parent_matrix: &Mat4,
        depth: usize,
    ) -> Result<(), anyhow::Error> {
        if depth >= self.options.max_node_depth {
            return Err(NjReadError::NodeDepthExceeded {
                offset,
                max_depth: self.options.max_node_depth,
            }
            .into());
        }

        let mut chain = Vec::new();
        loop {
            if !self.path.insert(offset) {
                return Err(NjReadError::CyclicNodeOffset { offset }.into());
            }
            chain.push(offset);

            self.reader.seek_start(offset)?;
            let node = Node::read(self.reader)?;
            let matrix = *parent_matrix * node.local_transform();

            if node.model_offset != 0 && !node.flags.contains(NjEvalFlags::HIDDEN) {
                match self.options.format {
                    NjFormat::Nj => nj::parse_model(
                        self.reader,
                        node.model_offset,
                        &matrix,
                        &mut self.geometry,
                        self.warnings,
                    )?,
                    NjFormat::Xj => {
                        xj::parse_model(self.reader, node.model_offset, &matrix, &mut self.geometry)?
                    }
                }
            }

            if node.child_offset != 0 && !node.flags.contains(NjEvalFlags::BREAK_CHILD_TRACE) {
                self.walk_siblings(node.child_offset, &matrix, depth + 1)?;
            }

            if node.sibling_offset == 0 {
                break;
            }
            offset = node.sibling_offset;
        }

        for offset in chain {
            self.path.remove(&offset);
        }
        Ok(())
    }
}

/// Parses an NJ or XJ model file into world space geometry.
///
/// Returns `None` when the file has no NJCM chunk or the chunk is empty.
pub fn parse_model(
    reader: ByteCursor,
    options: &NjReadOptions,
) -> Result<Option<NinjaGeometry>, anyhow::Error> {
    parse_model_with_warnings(reader, options, &mut Vec::new())
}

pub fn parse_model_with_warnings(
    mut reader: ByteCursor,
    options: &NjReadOptions,
    warnings: &mut Vec<ParseWarning>,
) -> Result<Option<NinjaGeometry>, anyhow::Error> {
    let mut njcm = match IffFile::find_chunk(&mut reader, "NJCM")? {
        Some(njcm) if njcm.size() > 0 => njcm,
        _ => return Ok(None),
    };

    if njcm.size() < NODE_SIZE {
        ParseWarning::NjcmTooSmall { size: njcm.size() }.report(warnings);
    }

    let mut walker = SceneWalker {
        reader: &mut njcm,
        options,
        path: HashSet::new(),
        geometry: GeometryBuilder::default(),
        warnings,
    };
    walker.walk_siblings(0, &Mat4::IDENTITY, 0)?;
    Ok(Some(walker.geometry.build()))
}

impl PsoFile for NinjaGeometry {
    type ReadOptions = NjReadOptions;
    type WriteOptions = ();

    fn read(reader: ByteCursor, options: &Self::ReadOptions) -> Result<Self, anyhow::Error> {
        parse_model(reader, options)?.ok_or_else(|| anyhow!("Model file has no NJCM chunk"))
    }
}


#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;

    /// Vertex chunk with positions only.
    fn write_vertex_chunk(writer: &mut ByteCursor, index: u16, positions: &[[f32; 3]]) {
        writer
            .write_u8(34)
            .write_u8(0)
            .write_u16(1 + 3 * positions.len() as u16)
            .write_u16(index)
            .write_u16(positions.len() as u16);
        for position in positions {
            for value in position {
                writer.write_f32(*value);
            }
        }
    }

    fn write_model(writer: &mut ByteCursor, positions: &[[f32; 3]]) {
        let vertex_list_offset = writer.position() as u32 + 8;
        writer.write_u32(vertex_list_offset).write_u32(0);
        write_vertex_chunk(writer, 0, positions);
        writer.write_u8(255).write_u8(0);
    }

    #[test]
    fn child_transform_composes_with_parent() {
        let mut njcm = ByteCursor::default();
        TestNode {
            position: [10.0, 0.0, 0.0],
            rotation: [0, 0x4000, 0],
            scale: [2.0, 2.0, 2.0],
            child_offset: 52,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            model_offset: 104,
            position: [1.0, 0.0, 0.0],
            ..Default::default()
        }
        .write(&mut njcm);
        write_model(&mut njcm, &[[0.0, 0.0, 0.0]]);

        let geometry = parse_model(model_file(&njcm), &Default::default())
            .unwrap()
            .unwrap();

        assert_eq!(geometry.positions.len(), 1);
        // Parent: translate (10, 0, 0), rotate 90 degrees about Y, scale 2.
        // Child offset (1, 0, 0) becomes (2, 0, 0), then (0, 0, -2), then (10, 0, -2).
        assert_close(geometry.positions[0], [10.0, 0.0, -2.0]);
        assert_eq!(geometry.normals[0], [0.0, 1.0, 0.0]);
        assert!(geometry.indices.is_empty());
    }

    #[test]
    fn siblings_share_parent_transform() {
        let mut njcm = ByteCursor::default();
        TestNode {
            position: [5.0, 0.0, 0.0],
            child_offset: 52,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            model_offset: 156,
            position: [0.0, 1.0, 0.0],
            sibling_offset: 104,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            model_offset: 186,
            position: [0.0, 0.0, 1.0],
            ..Default::default()
        }
        .write(&mut njcm);
        assert_eq!(njcm.position(), 156);
        write_model(&mut njcm, &[[0.0, 0.0, 0.0]]);
        assert_eq!(njcm.position(), 186);
        let vertex_list_offset = 194;
        njcm.write_u32(vertex_list_offset).write_u32(0);
        write_vertex_chunk(&mut njcm, 1, &[[0.0, 0.0, 0.0]]);
        njcm.write_u8(255).write_u8(0);

        let geometry = parse_model(model_file(&njcm), &Default::default())
            .unwrap()
            .unwrap();
        assert_eq!(geometry.positions.len(), 2);
        assert_close(geometry.positions[0], [5.0, 1.0, 0.0]);
        assert_close(geometry.positions[1], [5.0, 0.0, 1.0]);
    }

    #[test]
    fn eval_flags() {
        let mut njcm = ByteCursor::default();
        TestNode {
            flags: (NjEvalFlags::NO_TRANSLATE | NjEvalFlags::BREAK_CHILD_TRACE).bits(),
            model_offset: 156,
            position: [100.0, 0.0, 0.0],
            child_offset: 52,
            sibling_offset: 104,
            ..Default::default()
        }
        .write(&mut njcm);
        // Unreachable child, its offsets are garbage.
        TestNode {
            model_offset: 0xFFFF,
            child_offset: 0xFFFF,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            flags: NjEvalFlags::HIDDEN.bits(),
            model_offset: 0xFFFF,
            ..Default::default()
        }
        .write(&mut njcm);
        write_model(&mut njcm, &[[1.0, 2.0, 3.0]]);

        let geometry = parse_model(model_file(&njcm), &Default::default())
            .unwrap()
            .unwrap();
        assert_eq!(geometry.positions, vec![[1.0, 2.0, 3.0]]);
    }

    #[test]
    fn cyclic_siblings_are_an_error() {
        let mut njcm = ByteCursor::default();
        TestNode {
            sibling_offset: 52,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            sibling_offset: 52,
            ..Default::default()
        }
        .write(&mut njcm);

        let error = parse_model(model_file(&njcm), &Default::default()).unwrap_err();
        assert_eq!(
            error.downcast_ref::<NjReadError>(),
            Some(&NjReadError::CyclicNodeOffset { offset: 52 })
        );
    }

    #[test]
    fn shared_subtree_is_not_a_cycle() {
        let mut njcm = ByteCursor::default();
        // Nodes 0 and 104 both have node 52 as their child.
        TestNode {
            child_offset: 52,
            sibling_offset: 104,
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            position: [1.0, 0.0, 0.0],
            ..Default::default()
        }
        .write(&mut njcm);
        TestNode {
            child_offset: 52,
            ..Default::default()
        }
        .write(&mut njcm);

        assert!(parse_model(model_file(&njcm), &Default::default())
            .unwrap()
            .is_some());
    }

    #[test]
    fn child_pointing_at_ancestor_is_an_error() {
        let mut njcm = ByteCursor::default();
        for child_offset in [52, 104, 52] {
            TestNode {
                child_offset,
                ..Default::default()
            }
            .write(&mut njcm);
        }

        let error = parse_model(model_file(&njcm), &Default::default()).unwrap_err();
        assert_eq!(
            error.downcast_ref::<NjReadError>(),
            Some(&NjReadError::CyclicNodeOffset { offset: 52 })
        );
    }

    #[test]
    fn node_depth_is_bounded() {
        let mut njcm = ByteCursor::default();
        for i in 0..4u32 {
            TestNode {
                child_offset: if i < 3 { (i + 1) * 52 } else { 0 },
                ..Default::default()
            }
            .write(&mut njcm);
        }

        let options = NjReadOptions {
            max_node_depth: 4,
            ..Default::default()
        };
        assert!(parse_model(model_file(&njcm), &options).unwrap().is_some());

        let options = NjReadOptions {
            max_node_depth: 3,
            ..Default::default()
        };
        let error = parse_model(model_file(&njcm), &options).unwrap_err();
        assert_eq!(
            error.downcast_ref::<NjReadError>(),
            Some(&NjReadError::NodeDepthExceeded {
                offset: 156,
                max_depth: 3
            })
        );
    }

    #[test]
    fn missing_or_empty_njcm_is_no_model() {
        let mut file = ByteCursor::default();
        file.write_string_ascii("NJTL", 4).write_u32(0);
        file.rewind();
        assert!(parse_model(file, &Default::default()).unwrap().is_none());

        let empty = ByteCursor::default();
        assert!(parse_model(model_file(&empty), &Default::default())
            .unwrap()
            .is_none());

        let error = NinjaGeometry::read(ByteCursor::default(), &Default::default());
        assert!(error.is_err());
    }

    #[test]
    fn strip_winding_alternates() {
        let mut builder = GeometryBuilder::default();
        builder.push_strip(&[0, 1, 2, 3], true);
        assert_eq!(builder.indices, vec![1, 0, 2, 1, 2, 3]);

        let mut builder = GeometryBuilder::default();
        builder.push_strip(&[0, 1, 2, 3], false);
        assert_eq!(builder.indices, vec![0, 1, 2, 2, 1, 3]);

        let mut builder = GeometryBuilder::default();
        builder.push_strip(&[0, 1], false);
        assert!(builder.indices.is_empty());
    }

    #[test]
    fn first_vertex_write_wins() {
        let mut builder = GeometryBuilder::default();
        builder.set_vertex(2, Vec3::X, None);
        builder.set_vertex(2, Vec3::Y, Some(Vec3::Z));
        builder.set_vertex(0, Vec3::Z, Some(Vec3::X));
        let geometry = builder.build();
        assert_eq!(
            geometry.positions,
            vec![[0.0, 0.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]
        );
        assert_eq!(
            geometry.normals,
            vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0]]
        );
    }

    #[test]
    fn normal_matrix_of_uniform_scale() {
        let matrix = Mat4::from_scale(Vec3::splat(2.0));
        let normal = normal_matrix(&matrix) * Vec3::Y;
        assert_close(normal.to_array(), [0.0, 0.5, 0.0]);
        assert_eq!(normal_matrix(&Mat4::from_scale(Vec3::ZERO)), Mat3::ZERO);
    }
}
