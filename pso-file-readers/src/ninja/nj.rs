use glam::{Mat4, Vec3};

use crate::{ByteCursor, ParseWarning};

use super::{normal_matrix, GeometryBuilder};

/// Per-index fields interleaved in a triangle strip chunk.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NjStripOptions {
    pub texture_coords: bool,
    pub color: bool,
    pub normal: bool,
    pub texture_coords_hires: bool,
}

impl NjStripOptions {
    pub fn from_chunk_type(chunk_type: u8) -> Option<Self> {
        let (texture_coords, color, normal, texture_coords_hires) = match chunk_type {
            64 | 73 => (false, false, false, false),
            65 | 66 => (true, false, false, false),
            67 => (false, false, true, false),
            68 | 69 => (true, false, true, false),
            70 => (false, true, false, false),
            71 | 72 => (true, true, false, false),
            74 | 75 => (true, false, false, true),
            _ => return None,
        };

        Some(Self {
            texture_coords,
            color,
            normal,
            texture_coords_hires,
        })
    }

    fn stride(&self) -> i64 {
        let mut stride = 0;
        if self.texture_coords {
            stride += 4;
        }
        if self.color {
            stride += 4;
        }
        if self.normal {
            stride += 6;
        }
        if self.texture_coords_hires {
            stride += 8;
        }
        stride
    }
}

struct Strip {
    clockwise: bool,
    indices: Vec<u32>,
}

pub(crate) fn parse_model(
    reader: &mut ByteCursor,
    offset: usize,
    matrix: &Mat4,
    geometry: &mut GeometryBuilder,
    warnings: &mut Vec<ParseWarning>,
) -> Result<(), anyhow::Error> {
    reader.seek_start(offset)?;
    let vertex_list_offset = reader.read_u32()? as usize;
    let strip_list_offset = reader.read_u32()? as usize;
    let normals = normal_matrix(matrix);

    if vertex_list_offset != 0 {
        reader.seek_start(vertex_list_offset)?;
        parse_chunks(reader, warnings, |reader, chunk_type| {
            if (32..=50).contains(&chunk_type) {
                parse_vertex_chunk(reader, chunk_type, |index, position, normal| {
                    geometry.set_vertex(
                        index,
                        matrix.transform_point3(position),
                        normal.map(|normal| normals * normal),
                    )
                })?;
            }
            Ok(())
        })?;
    }

    if strip_list_offset != 0 {
        reader.seek_start(strip_list_offset)?;
        parse_chunks(reader, warnings, |reader, chunk_type| {
            if let Some(options) = NjStripOptions::from_chunk_type(chunk_type) {
                for strip in parse_strip_chunk(reader, options)? {
                    geometry.push_strip(&strip.indices, strip.clockwise);
                }
            }
            Ok(())
        })?;
    }

    Ok(())
}

/// Iterates the chunk list at the reader's position until the end chunk.
/// Vertex and strip chunks are handed to `handle` positioned after the
/// flags byte; it must consume the whole chunk.
fn parse_chunks<F>(
    reader: &mut ByteCursor,
    warnings: &mut Vec<ParseWarning>,
    mut handle: F,
) -> Result<(), anyhow::Error>
where
    F: FnMut(&mut ByteCursor, u8) -> Result<(), anyhow::Error>,
{
    loop {
        let chunk_type = reader.read_u8()?;
        let _flags = reader.read_u8()?;

        match chunk_type {
            0 => {}
            8 | 9 => {
                reader.seek(2)?;
            }
            16..=31 | 56..=58 => {
                let size = reader.read_u16()?;
                reader.seek(2 * size as i64)?;
            }
            32..=50 | 64..=75 => handle(reader, chunk_type)?,
            255 => return Ok(()),
            _ => ParseWarning::NjUnknownChunkType {
                chunk_type,
                offset: reader.position() - 2,
            }
            .report(warnings),
        }
    }
}

fn parse_vertex_chunk<F>(
    reader: &mut ByteCursor,
    chunk_type: u8,
    mut vertex: F,
) -> Result<(), anyhow::Error>
where
    F: FnMut(usize, Vec3, Option<Vec3>),
{
    let size = reader.read_u16()? as usize;
    let chunk_start = reader.position();
    let index = reader.read_u16()? as usize;
    let vertex_count = reader.read_u16()? as usize;

    for i in 0..vertex_count {
        let position: Vec3 = reader.read_vector3_f32()?.into();
        let mut normal = None;

        match chunk_type {
            32 | 35..=40 | 48 => {
                reader.seek(4)?;
            }
            33 => {
                reader.seek(4)?;
                normal = Some(reader.read_vector3_f32()?.into());
                reader.seek(4)?;
            }
            41 => {
                normal = Some(reader.read_vector3_f32()?.into());
            }
            42..=47 => {
                normal = Some(reader.read_vector3_f32()?.into());
                reader.seek(4)?;
            }
            49 | 50 => {
                reader.seek(8)?;
            }
            _ => {}
        }

        vertex(index + i, position, normal);
    }

    reader.seek_start(chunk_start + 4 * size)?;
    Ok(())
}

fn parse_strip_chunk(
    reader: &mut ByteCursor,
    options: NjStripOptions,
) -> Result<Vec<Strip>, anyhow::Error> {
    let size = reader.read_u16()? as usize;
    let chunk_start = reader.position();
    let header = reader.read_u16()?;
    let user_flags_size = (header >> 14) as i64;
    let strip_count = (header & 0x3FFF) as usize;
    let stride = options.stride();

    let mut strips = Vec::with_capacity(strip_count);
    for _ in 0..strip_count {
        let raw = reader.read_i16()?;
        let clockwise = raw < 1;
        let index_count = raw.unsigned_abs() as usize;

        let mut indices = Vec::with_capacity(index_count);
        for j in 0..index_count {
            indices.push(reader.read_u16()? as u32);
            reader.seek(stride)?;

            if j >= 2 {
                reader.seek(2 * user_flags_size)?;
            }
        }

        strips.push(Strip { clockwise, indices });
    }

    reader.seek_start(chunk_start + 2 * size)?;
    Ok(strips)
}
