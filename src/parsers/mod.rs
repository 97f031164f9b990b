mod mgh;
mod mgz;

pub use mgh::{
    MghParser, PREAMBLE_SIZE, VolumeHeader, VoxelType, VoxelValue, decode_volume,
    encode_gradient, encode_payload, encode_volume, narrow_label, parse_header,
};
pub use mgz::{MgzParser, gunzip, is_gzip};

/// 获取所有可用的解析器
pub fn get_all_parsers() -> Vec<Box<dyn crate::utils::parser::VolumeParser>> {
    vec![Box::new(MghParser::new()), Box::new(MgzParser::new())]
}
