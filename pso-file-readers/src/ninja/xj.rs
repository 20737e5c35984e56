use glam::{Mat4, Vec3};

use crate::ByteCursor;

use super::{normal_matrix, GeometryBuilder};

const STRIP_ENTRY_SIZE: usize = 20;

pub(crate) fn parse_model(
    reader: &mut ByteCursor,
    offset: usize,
    matrix: &Mat4,
    geometry: &mut GeometryBuilder,
) -> Result<(), anyhow::Error> {
    reader.seek_start(offset)?;
    reader.seek(4)?;
    let vertex_info_offset = reader.read_u32()? as usize;
    reader.seek(4)?;
    let strip_list_a_offset = reader.read_u32()? as usize;
    let strip_a_count = reader.read_u32()? as usize;
    let strip_list_b_offset = reader.read_u32()? as usize;
    let strip_b_count = reader.read_u32()? as usize;

    let normals = normal_matrix(matrix);
    let index_offset = geometry.vertex_count() as u32;

    if vertex_info_offset != 0 {
        reader.seek_start(vertex_info_offset)?;
        reader.seek(4)?;
        let vertex_list_offset = reader.read_u32()? as usize;
        let vertex_size = reader.read_u32()? as usize;
        let vertex_count = reader.read_u32()? as usize;
        let has_normal = matches!(vertex_size, 28 | 32 | 36);

        for i in 0..vertex_count {
            reader.seek_start(vertex_list_offset + i * vertex_size)?;
            let position: Vec3 = reader.read_vector3_f32()?.into();
            let normal = if has_normal {
                normals * Vec3::from(reader.read_vector3_f32()?)
            } else {
                Vec3::Y
            };
            geometry.push_vertex(matrix.transform_point3(position), normal);
        }
    }

    for (list_offset, count) in [
        (strip_list_a_offset, strip_a_count),
        (strip_list_b_offset, strip_b_count),
    ] {
        if list_offset != 0 {
            parse_strip_list(reader, list_offset, count, index_offset, geometry)?;
        }
    }

    Ok(())
}

fn parse_strip_list(
    reader: &mut ByteCursor,
    list_offset: usize,
    count: usize,
    index_offset: u32,
    geometry: &mut GeometryBuilder,
) -> Result<(), anyhow::Error> {
    for i in 0..count {
        reader.seek_start(list_offset + i * STRIP_ENTRY_SIZE)?;
        // Material
        reader.seek(8)?;
        let index_list_offset = reader.read_u32()? as usize;
        let index_count = reader.read_u32()? as usize;

        reader.seek_start(index_list_offset)?;
        let strip: Vec<u32> = reader
            .read_u16_array(index_count)?
            .into_iter()
            .map(|index| index_offset + index as u32)
            .collect();

        // XJ strips always start counter-clockwise.
        geometry.push_strip(&strip, false);
    }

    Ok(())
}
