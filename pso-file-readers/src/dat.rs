use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{types::Vec3, ByteCursor, ParseWarning, PsoFile, ReadError};

const BLOCK_HEADER_SIZE: usize = 16;
const OBJECT_SIZE: usize = 68;
const NPC_SIZE: usize = 72;
const NPC_IRREGULAR_FLAG: u32 = 0x800000;

const ENTITY_TYPE_END: u32 = 0;
const ENTITY_TYPE_OBJECT: u32 = 1;
const ENTITY_TYPE_NPC: u32 = 2;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct DatObject {
    pub area_id: u16,
    pub type_id: u16,
    pub id: u16,
    pub group: u16,
    pub section_id: u16,
    pub position: Vec3<f32>,
    pub rotation: Vec3<i32>,
    pub object_id: u32,
    pub action: u32,
    /// The full record, written back with the decoded fields patched in.
    #[serde(skip)]
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct DatNpc {
    pub area_id: u16,
    pub type_id: u16,
    pub clone_count: u16,
    pub section_id: u16,
    pub position: Vec3<f32>,
    pub direction: u32,
    pub movement_data: f32,
    pub regular: bool,
    pub exp: u32,
    pub skin: u32,
    pub rt_index: u32,
    #[serde(skip)]
    pub data: Vec<u8>,
}

/// A block with an entity type this parser does not decode, kept verbatim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatUnknownBlock {
    pub entity_type: u32,
    pub area_id: u32,
    pub payload_size: u32,
    pub data: Vec<u8>,
}

/// Layout of an object or NPC block as it was read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatEntityBlock {
    pub area_id: u32,
    /// Number of records the block held.
    pub count: usize,
    /// Declared payload bytes past the last whole record.
    pub payload_slack: u32,
    /// Bytes between the last record and the end of the block.
    pub trailing_data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DatBlock {
    Objects(DatEntityBlock),
    Npcs(DatEntityBlock),
    Unknown(DatUnknownBlock),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DatFile {
    pub objects: Vec<DatObject>,
    pub npcs: Vec<DatNpc>,
    /// Block sequence of the parsed file. Each object and NPC block is written
    /// with the first records of its area from `objects` or `npcs`, up to the
    /// count it was read with. Records left over are written after it, one
    /// block per area.
    pub blocks: Vec<DatBlock>,
}

impl DatObject {
    fn read(mut record: ByteCursor, area_id: u16) -> Result<Self, ReadError> {
        let type_id = record.read_u16()?;
        record.seek_start(8)?;
        let id = record.read_u16()?;
        let group = record.read_u16()?;
        let section_id = record.read_u16()?;
        record.seek_start(16)?;
        let position = record.read_vector3_f32()?;
        let rotation = record.read_vector3_i32()?;
        record.seek_start(46)?;
        let object_id = record.read_u32()?;
        let action = record.read_u32()?;

        Ok(Self {
            area_id,
            type_id,
            id,
            group,
            section_id,
            position,
            rotation,
            object_id,
            action,
            data: record.into_vec(),
        })
    }

    fn write(&self, writer: &mut ByteCursor) -> Result<(), ReadError> {
        let mut record = raw_record(&self.data, OBJECT_SIZE);
        record.write_u16(self.type_id);
        record.seek_start(8)?;
        record
            .write_u16(self.id)
            .write_u16(self.group)
            .write_u16(self.section_id);
        record.seek_start(16)?;
        record
            .write_vector3_f32(&self.position)
            .write_vector3_i32(&self.rotation);
        record.seek_start(46)?;
        record.write_u32(self.object_id).write_u32(self.action);
        writer.write_cursor(&record);
        Ok(())
    }
}

impl DatNpc {
    fn read(mut record: ByteCursor, area_id: u16) -> Result<Self, ReadError> {
        let type_id = record.read_u16()?;
        record.seek_start(6)?;
        let clone_count = record.read_u16()?;
        record.seek_start(12)?;
        let section_id = record.read_u16()?;
        record.seek_start(20)?;
        let position = record.read_vector3_f32()?;
        record.seek_start(36)?;
        let direction = record.read_u32()?;
        record.seek_start(44)?;
        let movement_data = record.read_f32()?;
        let regular = record.read_u32()? & NPC_IRREGULAR_FLAG == 0;
        record.seek_start(60)?;
        let exp = record.read_u32()?;
        let skin = record.read_u32()?;
        let rt_index = record.read_u32()?;

        Ok(Self {
            area_id,
            type_id,
            clone_count,
            section_id,
            position,
            direction,
            movement_data,
            regular,
            exp,
            skin,
            rt_index,
            data: record.into_vec(),
        })
    }

    fn write(&self, writer: &mut ByteCursor) -> Result<(), ReadError> {
        let mut record = raw_record(&self.data, NPC_SIZE);
        record.seek_start(48)?;
        let mut flags = record.read_u32()? & !NPC_IRREGULAR_FLAG;
        if !self.regular {
            flags |= NPC_IRREGULAR_FLAG;
        }

        record.rewind();
        record.write_u16(self.type_id);
        record.seek_start(6)?;
        record.write_u16(self.clone_count);
        record.seek_start(12)?;
        record.write_u16(self.section_id);
        record.seek_start(20)?;
        record.write_vector3_f32(&self.position);
        record.seek_start(36)?;
        record.write_u32(self.direction);
        record.seek_start(44)?;
        record.write_f32(self.movement_data).write_u32(flags);
        record.seek_start(60)?;
        record
            .write_u32(self.exp)
            .write_u32(self.skin)
            .write_u32(self.rt_index);
        writer.write_cursor(&record);
        Ok(())
    }
}

/// Copy of a raw record, or zeroes for a record built in memory.
fn raw_record(data: &[u8], size: usize) -> ByteCursor {
    if data.len() == size {
        ByteCursor::from(data)
    } else {
        ByteCursor::from(vec![0; size])
    }
}

fn group_by_area<'a, T>(
    entities: impl Iterator<Item = &'a T>,
    area_id: impl Fn(&T) -> u16,
) -> Vec<(u16, Vec<&'a T>)> {
    let mut groups: Vec<(u16, Vec<&T>)> = Vec::new();
    for entity in entities {
        let area = area_id(entity);
        match groups.iter().position(|(id, _)| *id == area) {
            Some(index) => groups[index].1.push(entity),
            None => groups.push((area, vec![entity])),
        }
    }
    groups
}

/// Takes the first `layout.count` records in the block's area that no earlier
/// block has taken.
fn take_block<'a, T>(
    entities: &'a [T],
    taken: &mut [bool],
    layout: &DatEntityBlock,
    area_id: impl Fn(&T) -> u16,
) -> Vec<&'a T> {
    let mut records = Vec::new();
    for (entity, taken) in entities.iter().zip(taken.iter_mut()) {
        if records.len() == layout.count {
            break;
        }
        if !*taken && area_id(entity) as u32 == layout.area_id {
            *taken = true;
            records.push(entity);
        }
    }
    records
}

fn not_taken<'a, T>(entities: &'a [T], taken: &'a [bool]) -> impl Iterator<Item = &'a T> {
    entities
        .iter()
        .zip(taken.iter())
        .filter(|(_, taken)| !**taken)
        .map(|(entity, _)| entity)
}

fn write_entity_block<T>(
    writer: &mut ByteCursor,
    entity_type: u32,
    layout: &DatEntityBlock,
    records: &[&T],
    record_size: usize,
    write_record: impl Fn(&T, &mut ByteCursor) -> Result<(), ReadError>,
) -> Result<(), ReadError> {
    let records_size = records.len() * record_size;
    writer
        .write_u32(entity_type)
        .write_u32((BLOCK_HEADER_SIZE + records_size + layout.trailing_data.len()) as u32)
        .write_u32(layout.area_id)
        .write_u32(records_size as u32 + layout.payload_slack);
    for &record in records {
        write_record(record, writer)?;
    }
    writer.write_bytes(&layout.trailing_data);
    Ok(())
}

fn area_block(area_id: u16) -> DatEntityBlock {
    DatEntityBlock {
        area_id: area_id as u32,
        ..Default::default()
    }
}

struct BlockHeader {
    offset: usize,
    entity_type: u32,
    total_size: u32,
    payload_size: u32,
}

/// Reads the records of an object or NPC block and whatever follows them up
/// to the end of the block.
fn read_entity_block<T>(
    reader: &mut ByteCursor,
    header: &BlockHeader,
    area_id: u16,
    record_size: usize,
    read_record: impl Fn(ByteCursor, u16) -> Result<T, ReadError>,
    entities: &mut Vec<T>,
    warnings: &mut Vec<ParseWarning>,
) -> Result<DatEntityBlock, ReadError> {
    let start_position = reader.position();
    let count = header.payload_size as usize / record_size;
    for _ in 0..count {
        let record = reader.take(record_size)?;
        entities.push(read_record(record, area_id)?);
    }

    let bytes_read = reader.position() - start_position;
    if bytes_read != header.payload_size as usize {
        ParseWarning::DatPayloadMismatch {
            entity_type: header.entity_type,
            expected: header.payload_size,
            actual: bytes_read,
        }
        .report(warnings);
    }

    let block_end = (header.offset + header.total_size as usize).min(reader.size());
    let trailing_data = if reader.position() < block_end {
        reader.take(block_end - reader.position())?.into_vec()
    } else {
        Vec::new()
    };

    Ok(DatEntityBlock {
        area_id: area_id as u32,
        count,
        payload_slack: header.payload_size - bytes_read as u32,
        trailing_data,
    })
}

impl PsoFile for DatFile {
    type ReadOptions = ();
    type WriteOptions = ();

    fn read(reader: ByteCursor, _: &Self::ReadOptions) -> Result<Self, anyhow::Error> {
        Self::parse(reader, &mut Vec::new())
    }

    fn write(&self, writer: &mut ByteCursor, _: &Self::WriteOptions) -> Result<(), anyhow::Error> {
        let mut objects_taken = vec![false; self.objects.len()];
        let mut npcs_taken = vec![false; self.npcs.len()];

        for block in self.blocks.iter() {
            match block {
                DatBlock::Objects(layout) => {
                    let records = take_block(
                        &self.objects,
                        &mut objects_taken,
                        layout,
                        |object| object.area_id,
                    );
                    write_entity_block(
                        writer,
                        ENTITY_TYPE_OBJECT,
                        layout,
                        &records,
                        OBJECT_SIZE,
                        DatObject::write,
                    )?;
                }
                DatBlock::Npcs(layout) => {
                    let records =
                        take_block(&self.npcs, &mut npcs_taken, layout, |npc| npc.area_id);
                    write_entity_block(
                        writer,
                        ENTITY_TYPE_NPC,
                        layout,
                        &records,
                        NPC_SIZE,
                        DatNpc::write,
                    )?;
                }
                DatBlock::Unknown(block) => {
                    writer
                        .write_u32(block.entity_type)
                        .write_u32((BLOCK_HEADER_SIZE + block.data.len()) as u32)
                        .write_u32(block.area_id)
                        .write_u32(block.payload_size)
                        .write_bytes(&block.data);
                }
            }
        }

        let objects = not_taken(&self.objects, &objects_taken);
        for (area_id, records) in group_by_area(objects, |object| object.area_id) {
            write_entity_block(
                writer,
                ENTITY_TYPE_OBJECT,
                &area_block(area_id),
                &records,
                OBJECT_SIZE,
                DatObject::write,
            )?;
        }
        let npcs = not_taken(&self.npcs, &npcs_taken);
        for (area_id, records) in group_by_area(npcs, |npc| npc.area_id) {
            write_entity_block(
                writer,
                ENTITY_TYPE_NPC,
                &area_block(area_id),
                &records,
                NPC_SIZE,
                DatNpc::write,
            )?;
        }

        writer.write_padding(BLOCK_HEADER_SIZE);
        Ok(())
    }
}

impl DatFile {
    pub fn parse(
        mut reader: ByteCursor,
        warnings: &mut Vec<ParseWarning>,
    ) -> Result<Self, anyhow::Error> {
        let mut file = DatFile::default();
        let mut offset = 0;
        let mut terminated = false;

        while offset < reader.size() {
            reader.seek_start(offset)?;
            let entity_type = reader.read_u32()?;
            let total_size = reader.read_u32()?;
            let area_id = reader.read_u32()?;
            let payload_size = reader.read_u32()?;

            if entity_type == ENTITY_TYPE_END {
                terminated = true;
                break;
            }

            if (total_size as usize) < BLOCK_HEADER_SIZE {
                ParseWarning::DatInvalidBlockSize { offset, total_size }.report(warnings);
                terminated = true;
                break;
            }

            let header = BlockHeader {
                offset,
                entity_type,
                total_size,
                payload_size,
            };
            let entity_area_id = match u16::try_from(area_id) {
                Ok(area_id) => Some(area_id),
                Err(_) if entity_type == ENTITY_TYPE_OBJECT || entity_type == ENTITY_TYPE_NPC => {
                    ParseWarning::DatInvalidAreaId {
                        entity_type,
                        area_id,
                    }
                    .report(warnings);
                    None
                }
                Err(_) => None,
            };

            let block = match (entity_type, entity_area_id) {
                (ENTITY_TYPE_OBJECT, Some(area_id)) => DatBlock::Objects(read_entity_block(
                    &mut reader,
                    &header,
                    area_id,
                    OBJECT_SIZE,
                    DatObject::read,
                    &mut file.objects,
                    warnings,
                )?),
                (ENTITY_TYPE_NPC, Some(area_id)) => DatBlock::Npcs(read_entity_block(
                    &mut reader,
                    &header,
                    area_id,
                    NPC_SIZE,
                    DatNpc::read,
                    &mut file.npcs,
                    warnings,
                )?),
                _ => {
                    log::debug!(
                        "Keeping DAT block of entity type {} ({} bytes) unparsed",
                        entity_type,
                        total_size
                    );
                    let data = reader
                        .take(total_size as usize - BLOCK_HEADER_SIZE)?
                        .into_vec();
                    DatBlock::Unknown(DatUnknownBlock {
                        entity_type,
                        area_id,
                        payload_size,
                        data,
                    })
                }
            };
            file.blocks.push(block);

            offset += total_size as usize;
        }

        if !terminated {
            ParseWarning::DatMissingTerminator.report(warnings);
        }

        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(entity_type: u32, area_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&entity_type.to_le_bytes());
        bytes.extend_from_slice(&((payload.len() + 16) as u32).to_le_bytes());
        bytes.extend_from_slice(&area_id.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn object_record(type_id: u16, position: [f32; 3], object_id: u32) -> Vec<u8> {
        let mut record = ByteCursor::from(vec![0xEEu8; OBJECT_SIZE]);
        record.write_u16(type_id);
        record.seek_start(8).unwrap();
        record.write_u16(3).write_u16(4).write_u16(5);
        record.seek_start(16).unwrap();
        record
            .write_f32(position[0])
            .write_f32(position[1])
            .write_f32(position[2]);
        record.write_i32(0x4000).write_i32(-1).write_i32(0);
        record.seek_start(46).unwrap();
        record.write_u32(object_id).write_u32(7);
        record.into_vec()
    }

    fn npc_record(type_id: u16, skin: u32, flags: u32) -> Vec<u8> {
        let mut record = ByteCursor::from(vec![0u8; NPC_SIZE]);
        record.write_u16(type_id);
        record.seek_start(6).unwrap();
        record.write_u16(2);
        record.seek_start(12).unwrap();
        record.write_u16(9);
        record.seek_start(20).unwrap();
        record.write_f32(1.0).write_f32(2.0).write_f32(3.0);
        record.seek_start(36).unwrap();
        record.write_u32(0x8000);
        record.seek_start(44).unwrap();
        record.write_f32(0.5).write_u32(flags);
        record.seek_start(60).unwrap();
        record.write_u32(40).write_u32(skin).write_u32(11);
        record.into_vec()
    }

    fn fixture() -> Vec<u8> {
        let mut objects = object_record(0x40, [1.0, 2.0, 3.0], 100);
        objects.extend(object_record(0x02, [-5.0, 0.0, 10.5], 101));
        let npc = npc_record(0x44, 1, NPC_IRREGULAR_FLAG | 0x10);

        let mut dat = block(1, 0, &objects);
        dat.extend(block(1, 3, &object_record(0x80, [0.0, 0.0, 0.0], 102)));
        dat.extend(block(2, 3, &npc));
        dat.extend(block(3, 3, &[1, 2, 3, 4, 5, 6, 7, 8]));
        dat.extend_from_slice(&[0; 16]);
        dat
    }

    #[test]
    fn parse_records() {
        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(fixture()), &mut warnings).unwrap();
        assert!(warnings.is_empty());

        assert_eq!(file.objects.len(), 3);
        let object = &file.objects[0];
        assert_eq!(object.type_id, 0x40);
        assert_eq!((object.id, object.group, object.section_id), (3, 4, 5));
        assert_eq!(object.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(object.rotation, Vec3::new(0x4000, -1, 0));
        assert_eq!((object.object_id, object.action), (100, 7));
        assert_eq!(object.area_id, 0);
        assert_eq!(file.objects[2].area_id, 3);

        assert_eq!(file.npcs.len(), 1);
        let npc = &file.npcs[0];
        assert_eq!(npc.type_id, 0x44);
        assert_eq!(npc.clone_count, 2);
        assert_eq!(npc.section_id, 9);
        assert_eq!(npc.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(npc.direction, 0x8000);
        assert_eq!(npc.movement_data, 0.5);
        assert!(!npc.regular);
        assert_eq!((npc.exp, npc.skin, npc.rt_index), (40, 1, 11));
        assert_eq!(npc.area_id, 3);

        assert_eq!(file.blocks.len(), 4);
        assert_eq!(
            file.blocks[3],
            DatBlock::Unknown(DatUnknownBlock {
                entity_type: 3,
                area_id: 3,
                payload_size: 8,
                data: vec![1, 2, 3, 4, 5, 6, 7, 8],
            })
        );
        match &file.blocks[0] {
            DatBlock::Objects(layout) => assert_eq!((layout.area_id, layout.count), (0, 2)),
            block => panic!("Expected an object block, got {:?}", block),
        }
    }

    #[test]
    fn unknown_block_is_skipped_by_total_size() {
        // The unknown block declares a payload size that disagrees with its total size.
        let mut dat = Vec::new();
        dat.extend_from_slice(&5u32.to_le_bytes());
        dat.extend_from_slice(&40u32.to_le_bytes());
        dat.extend_from_slice(&0u32.to_le_bytes());
        dat.extend_from_slice(&1000u32.to_le_bytes());
        dat.extend_from_slice(&[0xFF; 24]);
        dat.extend(block(1, 0, &object_record(0x40, [1.0, 1.0, 1.0], 1)));
        dat.extend_from_slice(&[0; 16]);

        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(dat), &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(file.objects.len(), 1);
        assert_eq!(file.objects[0].type_id, 0x40);
        match &file.blocks[0] {
            DatBlock::Unknown(block) => assert_eq!(block.data.len(), 24),
            block => panic!("Expected an unknown block, got {:?}", block),
        }
    }

    #[test]
    fn payload_mismatch_is_a_warning() {
        let mut payload = object_record(0x40, [0.0; 3], 1);
        payload.extend_from_slice(&[0; 10]);
        let mut dat = block(1, 0, &payload);
        dat.extend_from_slice(&[0; 16]);

        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(dat), &mut warnings).unwrap();
        assert_eq!(file.objects.len(), 1);
        assert_eq!(
            warnings,
            vec![ParseWarning::DatPayloadMismatch {
                entity_type: 1,
                expected: 78,
                actual: 68
            }]
        );
    }

    #[test]
    fn payload_slack_is_written_back() {
        let mut payload = object_record(0x40, [0.0; 3], 1);
        payload.extend_from_slice(&[0x55; 10]);
        let mut dat = block(1, 0, &payload);
        dat.extend_from_slice(&[0; 16]);

        let file = DatFile::read(ByteCursor::from(&dat), &()).unwrap();
        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        assert_eq!(writer.as_slice(), &dat[..]);
    }

    #[test]
    fn block_order_is_preserved() {
        // NPC block first, then objects, with slack after the NPC payload.
        let mut npc_block = block(2, 1, &npc_record(0x41, 0, 0));
        npc_block[4..8].copy_from_slice(&(16 + 72 + 4u32).to_le_bytes());
        npc_block.extend_from_slice(&[9, 9, 9, 9]);

        let mut dat = npc_block;
        dat.extend(block(1, 1, &object_record(0x40, [1.0, 1.0, 1.0], 1)));
        dat.extend(block(2, 2, &npc_record(0x44, 1, 0)));
        dat.extend_from_slice(&[0; 16]);

        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(&dat), &mut warnings).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(file.npcs.len(), 2);
        assert_eq!(file.objects.len(), 1);

        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        assert_eq!(writer.as_slice(), &dat[..]);
    }

    #[test]
    fn records_outside_the_block_layout_are_appended() {
        let mut file = DatFile::read(ByteCursor::from(fixture()), &()).unwrap();
        // Moves the first object to a new area and inserts an NPC before the
        // existing one.
        file.objects[0].area_id = 5;
        file.npcs.insert(
            0,
            DatNpc {
                area_id: 3,
                type_id: 0x43,
                ..Default::default()
            },
        );

        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        writer.rewind();
        let read = DatFile::read(writer, &()).unwrap();

        let objects: Vec<(u16, u16)> =
            read.objects.iter().map(|o| (o.area_id, o.type_id)).collect();
        assert_eq!(objects, vec![(0, 0x02), (3, 0x80), (5, 0x40)]);
        let npcs: Vec<(u16, u16)> = read.npcs.iter().map(|n| (n.area_id, n.type_id)).collect();
        assert_eq!(npcs, vec![(3, 0x43), (3, 0x44)]);
    }

    #[test]
    fn out_of_range_area_id_keeps_block_unparsed() {
        let mut dat = block(1, 0x10000, &object_record(0x40, [0.0; 3], 1));
        dat.extend_from_slice(&[0; 16]);

        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(&dat), &mut warnings).unwrap();
        assert!(file.objects.is_empty());
        assert_eq!(
            warnings,
            vec![ParseWarning::DatInvalidAreaId {
                entity_type: 1,
                area_id: 0x10000
            }]
        );

        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        assert_eq!(writer.as_slice(), &dat[..]);
    }

    #[test]
    fn missing_terminator_is_a_warning() {
        let dat = block(2, 0, &npc_record(0x41, 0, 0));
        let mut warnings = Vec::new();
        let file = DatFile::parse(ByteCursor::from(dat), &mut warnings).unwrap();
        assert!(file.npcs[0].regular);
        assert_eq!(warnings, vec![ParseWarning::DatMissingTerminator]);
    }

    #[test]
    fn truncated_record_is_an_error() {
        let mut dat = block(1, 0, &object_record(0x40, [0.0; 3], 1));
        dat.truncate(40);
        let error = DatFile::read(ByteCursor::from(dat), &()).unwrap_err();
        assert!(error.downcast_ref::<ReadError>().is_some());
    }

    #[test]
    fn write_round_trip() {
        let dat = fixture();
        let file = DatFile::read(ByteCursor::from(&dat), &()).unwrap();
        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        assert_eq!(writer.as_slice(), &dat[..]);
    }

    #[test]
    fn write_patches_fields() {
        let mut file = DatFile::read(ByteCursor::from(fixture()), &()).unwrap();
        file.objects[1].position = Vec3::new(7.0, 8.0, 9.0);
        file.npcs[0].regular = true;
        file.npcs[0].skin = 2;
        file.npcs.push(DatNpc {
            area_id: 4,
            type_id: 0x60,
            regular: true,
            ..Default::default()
        });

        let mut writer = ByteCursor::default();
        file.write(&mut writer, &()).unwrap();
        writer.rewind();
        let read = DatFile::read(writer, &()).unwrap();

        assert_eq!(read.objects[1].position, Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(read.objects[1].data[60..], file.objects[1].data[60..]);
        assert!(read.npcs[0].regular);
        assert_eq!(read.npcs[0].skin, 2);
        assert_eq!(read.npcs[1].type_id, 0x60);
        assert_eq!(read.npcs[1].area_id, 4);
        assert_eq!(read.npcs[1].data.len(), NPC_SIZE);
    }
}
