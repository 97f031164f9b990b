use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::error::{HeatError, HeatResult};
use crate::parsers::mgh::{
    VolumeHeader, decode_volume, encode_payload, parse_header, read_file_bytes, read_preamble,
};
use crate::utils::parser::{VolumeParser, VolumePayload};
use crate::voxel_grid::Grid;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 是否以 gzip 魔数开头
pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// 解压整份 gzip 数据
pub fn gunzip(bytes: &[u8]) -> HeatResult<Vec<u8>> {
    let mut decoded = Vec::with_capacity(bytes.len() * 4);
    MultiGzDecoder::new(bytes).read_to_end(&mut decoded)?;
    Ok(decoded)
}

/// gzip 整体压缩的 .mgz 文件解析器
pub struct MgzParser;

impl MgzParser {
    pub fn new() -> Self {
        MgzParser
    }
}

impl Default for MgzParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeParser for MgzParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["mgz"]
    }

    fn name(&self) -> &'static str {
        "MGZ Parser"
    }

    fn parse_from_file(&self, file_path: &Path) -> HeatResult<(Grid<u8>, VolumeHeader)> {
        let bytes = read_file_bytes(file_path)?;
        if !is_gzip(&bytes) {
            log::debug!("[读取] {} 没有 gzip 魔数，按未压缩数据读取", file_path.display());
            return decode_volume(&bytes);
        }
        decode_volume(&gunzip(&bytes)?)
    }

    fn get_header_from_file(&self, file_path: &Path) -> HeatResult<VolumeHeader> {
        let file = File::open(file_path).map_err(|e| HeatError::resource(file_path, e))?;
        parse_header(&read_preamble(MultiGzDecoder::new(BufReader::new(file)))?)
    }

    fn write_to_file(
        &self,
        file_path: &Path,
        payload: &VolumePayload<'_>,
        header: &VolumeHeader,
    ) -> HeatResult<()> {
        let file = File::create(file_path).map_err(|e| HeatError::resource(file_path, e))?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        encode_payload(&mut encoder, payload, header)?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}
