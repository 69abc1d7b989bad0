//! Layer III side information.
//!
//! The block follows the header (and the crc, if any) and is 17 bytes for single channel
//! frames, 32 bytes otherwise. It starts with a preamble and holds two granules. Each
//! granule has either the window switching layout or the regular one, chosen by its
//! `windows_switching_flag`. Fields that hold one value per channel are kept as raw bits
//! with the channels concatenated.

use std::io::Read;

use crate::bits::{read_bytes, unpack_from, bit_width, Field, Value};
use crate::frame::{ChannelMode, FrameHeader};
use crate::Result;

pub const SINGLE_CHANNEL_SIZE: usize = 17;
pub const MULTI_CHANNEL_SIZE: usize = 32;

/// Reported as block type for granules without window switching.
pub const NON_SWITCHED_BLOCK_TYPE: u32 = 10;

struct Layout {
  size: usize,
  // main_data_begin, private_bits, scfsi
  preamble: &'static [Field],
  // part2_3_length, big_values, global_gain, scalefac_compress, windows_switching_flag
  granule: &'static [Field],
  // block_type, mixed_block_flag, table_select, subblock_gain
  switched: &'static [Field],
  // table_select, region0_count, region1_count
  regular: &'static [Field],
  // preflag, scalefac_scale, count1table_select
  trailer: &'static [Field],
}

// 18 + 2 * (34 + 22 + 3) = 136 bits
const SINGLE_CHANNEL: Layout = Layout {
  size: SINGLE_CHANNEL_SIZE,
  preamble: &[Field::Unsigned(9), Field::Raw(5), Field::Raw(4)],
  granule: &[Field::Raw(12), Field::Raw(9), Field::Raw(8), Field::Raw(4), Field::Bool],
  switched: &[Field::Raw(2), Field::Raw(1), Field::Raw(10), Field::Raw(9)],
  regular: &[Field::Raw(15), Field::Unsigned(4), Field::Unsigned(3)],
  trailer: &[Field::Bool, Field::Raw(1), Field::Raw(1)],
};

// 20 + 2 * (68 + 44 + 6) = 256 bits
const MULTI_CHANNEL: Layout = Layout {
  size: MULTI_CHANNEL_SIZE,
  preamble: &[Field::Unsigned(9), Field::Raw(3), Field::Raw(8)],
  granule: &[Field::Raw(24), Field::Raw(18), Field::Raw(16), Field::Raw(8), Field::Raw(2)],
  switched: &[Field::Raw(4), Field::Raw(2), Field::Raw(20), Field::Raw(18)],
  regular: &[Field::Raw(30), Field::Unsigned(8), Field::Unsigned(6)],
  trailer: &[Field::Raw(2), Field::Raw(2), Field::Raw(2)],
};

fn layout(mode: ChannelMode) -> &'static Layout {
  match mode {
    ChannelMode::SingleChannel => &SINGLE_CHANNEL,
    _ => &MULTI_CHANNEL,
  }
}

pub fn side_info_len(mode: ChannelMode) -> usize {
  layout(mode).size
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockLayout {
  Switched {
    block_type: u32,
    mixed_block_flag: u32,
    table_select: u32,
    subblock_gain: u32,
  },
  Regular {
    table_select: u32,
    region0_count: u32,
    region1_count: u32,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Granule {
  pub part2_3_length: u32,
  pub big_values: u32,
  pub global_gain: u32,
  pub scalefac_compress: u32,
  pub windows_switching_flag: u32,
  pub layout: BlockLayout,
  pub preflag: u32,
  pub scalefac_scale: u32,
  pub count1table_select: u32,
}

impl Granule {
  pub fn is_switched(&self) -> bool {
    matches!(self.layout, BlockLayout::Switched { .. })
  }

  pub fn block_type(&self) -> u32 {
    match self.layout {
      BlockLayout::Switched { block_type, .. } => block_type,
      BlockLayout::Regular { .. } => NON_SWITCHED_BLOCK_TYPE,
    }
  }

  pub fn table_select(&self) -> u32 {
    match self.layout {
      BlockLayout::Switched { table_select, .. } | BlockLayout::Regular { table_select, .. } => table_select,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideInformation {
  pub main_data_begin: u32,
  pub private_bits: u32,
  pub scfsi: u32,
  pub granules: [Granule; 2],
}

fn granule(layout: &Layout, data: &[u8], offset: &mut usize) -> Result<Granule> {
  let common = unpack_from(layout.granule, data, *offset)?;
  *offset += bit_width(layout.granule);

  let windows_switching_flag = common[4].as_u32();
  let block = if windows_switching_flag == 1 {
    let values = unpack_from(layout.switched, data, *offset)?;
    *offset += bit_width(layout.switched);
    BlockLayout::Switched {
      block_type: values[0].as_u32(),
      mixed_block_flag: values[1].as_u32(),
      table_select: values[2].as_u32(),
      subblock_gain: values[3].as_u32(),
    }
  } else {
    let values = unpack_from(layout.regular, data, *offset)?;
    *offset += bit_width(layout.regular);
    BlockLayout::Regular {
      table_select: values[0].as_u32(),
      region0_count: values[1].as_u32(),
      region1_count: values[2].as_u32(),
    }
  };

  let trailer = unpack_from(layout.trailer, data, *offset)?;
  *offset += bit_width(layout.trailer);

  let [part2_3_length, big_values, global_gain, scalefac_compress]: [u32; 4] =
    [common[0], common[1], common[2], common[3]].map(|v: Value| v.as_u32());
  Ok(Granule {
    part2_3_length,
    big_values,
    global_gain,
    scalefac_compress,
    windows_switching_flag,
    layout: block,
    preflag: trailer[0].as_u32(),
    scalefac_scale: trailer[1].as_u32(),
    count1table_select: trailer[2].as_u32(),
  })
}

impl SideInformation {
  pub fn decode(data: &[u8], mode: ChannelMode) -> Result<SideInformation> {
    let layout = layout(mode);
    let preamble = unpack_from(layout.preamble, data, 0)?;
    let mut offset = bit_width(layout.preamble);
    let first = granule(layout, data, &mut offset)?;
    let second = granule(layout, data, &mut offset)?;
    Ok(SideInformation {
      main_data_begin: preamble[0].as_u32(),
      private_bits: preamble[1].as_u32(),
      scfsi: preamble[2].as_u32(),
      granules: [first, second],
    })
  }
}

/// Reads the side information block sized for the header's channel mode.
pub fn read_side_info<R: Read>(reader: &mut R, header: &FrameHeader) -> Result<(Vec<u8>, SideInformation)> {
  let raw = read_bytes(reader, header.side_info_len())?;
  let side_info = SideInformation::decode(&raw, header.mode)?;
  Ok((raw, side_info))
}
