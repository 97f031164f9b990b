//! MGH 体数据格式的编解码
//!
//! 文件布局（全部为大端序）：
//!
//! ```text
//! INT32 ×7    version, width, height, depth, nframes, type, dof
//! INT16       goodRASFlag
//! FLOAT32 ×15 (仅当 goodRASFlag == 1 时读取) 体素尺寸、方向余弦、中心坐标
//! ...         补零直到第 284 字节
//! 体素数据    k → j → i 顺序，type 0 每体素 1 字节，type 3 每体素 4 字节 float
//! ```
//!
//! 多帧数据时只使用第一帧。

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, ReadBytesExt, WriteBytesExt};
use serde::Serialize;

use crate::error::{HeatError, HeatResult};
use crate::parsers::mgz::{gunzip, is_gzip};
use crate::utils::parser::{VolumeParser, VolumePayload};
use crate::voxel_grid::Grid;

/// 体素数据从这个绝对偏移开始，与实际写入的头部长度无关
pub const PREAMBLE_SIZE: usize = 284;

/// 7 个 int32 加 1 个 int16
const FIXED_FIELDS_SIZE: usize = 7 * 4 + 2;

/// 体素尺寸 3 + 方向余弦 9 + 中心坐标 3
const ORIENTATION_LEN: usize = 15;

const ORIENTED_HEADER_SIZE: usize = FIXED_FIELDS_SIZE + ORIENTATION_LEN * 4;

/// 支持的体素数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VoxelType {
    /// type 0：无符号字节
    Uchar,
    /// type 3：大端 float32
    Float,
}

impl VoxelType {
    pub fn from_code(code: i32) -> HeatResult<Self> {
        match code {
            0 => Ok(VoxelType::Uchar),
            3 => Ok(VoxelType::Float),
            _ => Err(HeatError::UnsupportedDatatype { code }),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            VoxelType::Uchar => 0,
            VoxelType::Float => 3,
        }
    }

    pub fn bytes_per_voxel(self) -> usize {
        match self {
            VoxelType::Uchar => 1,
            VoxelType::Float => 4,
        }
    }
}

/// 文件头
///
/// 方向信息原样保存在内存中；输入文件没有方向块时全部为 0，
/// 写出时总是输出这 15 个 float。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeHeader {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub nframes: i32,
    pub datatype: VoxelType,
    pub dof: i32,
    pub good_ras_flag: i16,
    pub voxel_size: [f32; 3],
    pub direction_cosines: [f32; 9],
    pub center: [f32; 3],
}

impl VolumeHeader {
    /// 构造一个单帧、无方向信息的头部
    pub fn new(shape: [usize; 3], datatype: VoxelType) -> Self {
        Self {
            version: 1,
            width: shape[0] as i32,
            height: shape[1] as i32,
            depth: shape[2] as i32,
            nframes: 1,
            datatype,
            dof: 0,
            good_ras_flag: 0,
            voxel_size: [0.0; 3],
            direction_cosines: [0.0; 9],
            center: [0.0; 3],
        }
    }

    /// [width, height, depth]
    pub fn shape(&self) -> [usize; 3] {
        [
            self.width.max(0) as usize,
            self.height.max(0) as usize,
            self.depth.max(0) as usize,
        ]
    }

    fn orientation(&self) -> [f32; ORIENTATION_LEN] {
        let mut out = [0.0f32; ORIENTATION_LEN];
        out[..3].copy_from_slice(&self.voxel_size);
        out[3..12].copy_from_slice(&self.direction_cosines);
        out[12..].copy_from_slice(&self.center);
        out
    }

    fn set_orientation(&mut self, values: &[f32; ORIENTATION_LEN]) {
        self.voxel_size.copy_from_slice(&values[..3]);
        self.direction_cosines.copy_from_slice(&values[3..12]);
        self.center.copy_from_slice(&values[12..]);
    }

    fn voxel_count(&self) -> HeatResult<usize> {
        let invalid = || HeatError::InvalidDimensions {
            width: self.width,
            height: self.height,
            depth: self.depth,
        };
        if self.width < 1 || self.height < 1 || self.depth < 1 {
            return Err(invalid());
        }
        let [w, h, d] = self.shape();
        w.checked_mul(h)
            .and_then(|wh| wh.checked_mul(d))
            .ok_or_else(invalid)
    }

    /// 单帧体素数据的字节数，乘法溢出视为非法维度
    fn payload_len(&self) -> HeatResult<usize> {
        self.voxel_count()?
            .checked_mul(self.datatype.bytes_per_voxel())
            .ok_or(HeatError::InvalidDimensions {
                width: self.width,
                height: self.height,
                depth: self.depth,
            })
    }
}

/// 可以写入体素数据区的元素类型
pub trait VoxelValue: Copy {
    const VOXEL_TYPE: VoxelType;

    fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()>;
}

impl VoxelValue for u8 {
    const VOXEL_TYPE: VoxelType = VoxelType::Uchar;

    fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_u8(self)
    }
}

impl VoxelValue for f32 {
    const VOXEL_TYPE: VoxelType = VoxelType::Float;

    fn write_be<W: Write>(self, writer: &mut W) -> std::io::Result<()> {
        writer.write_f32::<BigEndian>(self)
    }
}

/// 从文件开头的字节中解析头部（不读取体素数据）
pub fn parse_header(bytes: &[u8]) -> HeatResult<VolumeHeader> {
    if bytes.len() < FIXED_FIELDS_SIZE {
        return Err(HeatError::Truncated {
            what: "文件头",
            expected: FIXED_FIELDS_SIZE,
            actual: bytes.len(),
        });
    }

    let mut cursor = Cursor::new(bytes);
    let version = cursor.read_i32::<BigEndian>()?;
    let width = cursor.read_i32::<BigEndian>()?;
    let height = cursor.read_i32::<BigEndian>()?;
    let depth = cursor.read_i32::<BigEndian>()?;
    let nframes = cursor.read_i32::<BigEndian>()?;
    let type_code = cursor.read_i32::<BigEndian>()?;
    let dof = cursor.read_i32::<BigEndian>()?;
    let good_ras_flag = cursor.read_i16::<BigEndian>()?;

    log::debug!(
        "[读取] 文件头: version {}, width {}, height {}, depth {}, nframes {}, type {}, dof {}, goodRASFlag {}",
        version,
        width,
        height,
        depth,
        nframes,
        type_code,
        dof,
        good_ras_flag
    );

    if version != 1 {
        return Err(HeatError::UnsupportedVersion { version });
    }
    let datatype = VoxelType::from_code(type_code)?;

    let mut header = VolumeHeader {
        version,
        width,
        height,
        depth,
        nframes,
        datatype,
        dof,
        good_ras_flag,
        voxel_size: [0.0; 3],
        direction_cosines: [0.0; 9],
        center: [0.0; 3],
    };
    header.voxel_count()?;

    if good_ras_flag == 1 {
        if bytes.len() < ORIENTED_HEADER_SIZE {
            return Err(HeatError::Truncated {
                what: "方向信息",
                expected: ORIENTED_HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let mut values = [0.0f32; ORIENTATION_LEN];
        cursor.read_f32_into::<BigEndian>(&mut values)?;
        header.set_orientation(&values);
    }

    if nframes > 1 {
        log::warn!("[读取] 文件包含 {} 帧，只使用第一帧", nframes);
    }

    Ok(header)
}

/// 把旧格式中的浮点标签收窄为字节：四舍五入，只接受 [0, 255] 内的值
pub fn narrow_label(index: usize, value: f32) -> HeatResult<u8> {
    if !(0.0..=255.0).contains(&value) {
        return Err(HeatError::LabelOutOfRange { index, value });
    }
    Ok(value.round() as u8)
}

/// 解码一份未压缩的完整文件内容
pub fn decode_volume(bytes: &[u8]) -> HeatResult<(Grid<u8>, VolumeHeader)> {
    let header = parse_header(bytes)?;
    let expected = header.payload_len()?;

    // 无论头部实际占了多少字节，数据都从 284 开始
    let payload = bytes.get(PREAMBLE_SIZE..).unwrap_or(&[]);
    if payload.len() < expected {
        return Err(HeatError::Truncated {
            what: "体素数据",
            expected,
            actual: payload.len(),
        });
    }
    let payload = &payload[..expected];

    let data = match header.datatype {
        VoxelType::Uchar => payload.to_vec(),
        VoxelType::Float => payload
            .chunks_exact(4)
            .enumerate()
            .map(|(index, chunk)| narrow_label(index, BigEndian::read_f32(chunk)))
            .collect::<HeatResult<Vec<u8>>>()?,
    };

    let grid = Grid::new(header.shape(), data)?;
    Ok((grid, header))
}

/// 写出 284 字节的前导区，type 与 nframes 由调用方指定
fn encode_header<W: Write>(
    writer: &mut W,
    header: &VolumeHeader,
    datatype: VoxelType,
    nframes: i32,
) -> HeatResult<()> {
    writer.write_i32::<BigEndian>(header.version)?;
    writer.write_i32::<BigEndian>(header.width)?;
    writer.write_i32::<BigEndian>(header.height)?;
    writer.write_i32::<BigEndian>(header.depth)?;
    writer.write_i32::<BigEndian>(nframes)?;
    writer.write_i32::<BigEndian>(datatype.code())?;
    writer.write_i32::<BigEndian>(header.dof)?;
    writer.write_i16::<BigEndian>(header.good_ras_flag)?;
    for value in header.orientation() {
        writer.write_f32::<BigEndian>(value)?;
    }
    writer.write_all(&[0u8; PREAMBLE_SIZE - ORIENTED_HEADER_SIZE])?;
    Ok(())
}

fn check_shape<T>(grid: &Grid<T>, header: &VolumeHeader) -> HeatResult<()> {
    let expected = header.voxel_count()?;
    if grid.get_shape() != header.shape() {
        return Err(HeatError::ShapeMismatch {
            shape: header.shape(),
            expected,
            actual: grid.len(),
        });
    }
    Ok(())
}

/// 单帧写出，数据类型由元素类型决定
pub fn encode_volume<T: VoxelValue, W: Write>(
    writer: &mut W,
    grid: &Grid<T>,
    header: &VolumeHeader,
) -> HeatResult<()> {
    check_shape(grid, header)?;
    encode_header(writer, header, T::VOXEL_TYPE, 1)?;
    for &value in grid.get_data() {
        value.write_be(writer)?;
    }
    Ok(())
}

/// 梯度场按三帧写出：先全部第 0 分量，再第 1 分量，最后第 2 分量
pub fn encode_gradient<W: Write>(
    writer: &mut W,
    grid: &Grid<[f32; 3]>,
    header: &VolumeHeader,
) -> HeatResult<()> {
    check_shape(grid, header)?;
    encode_header(writer, header, VoxelType::Float, 3)?;
    for channel in 0..3 {
        for vector in grid.get_data() {
            writer.write_f32::<BigEndian>(vector[channel])?;
        }
    }
    Ok(())
}

pub fn encode_payload<W: Write>(
    writer: &mut W,
    payload: &VolumePayload<'_>,
    header: &VolumeHeader,
) -> HeatResult<()> {
    match payload {
        VolumePayload::Labels(grid) => encode_volume(writer, *grid, header),
        VolumePayload::Scalars(grid) => encode_volume(writer, *grid, header),
        VolumePayload::Gradient(grid) => encode_gradient(writer, *grid, header),
    }
}

/// 读取整个文件，打开失败归为资源错误
pub(crate) fn read_file_bytes(file_path: &Path) -> HeatResult<Vec<u8>> {
    std::fs::read(file_path).map_err(|e| HeatError::resource(file_path, e))
}

/// 只读取前导区的字节
pub(crate) fn read_preamble<R: Read>(reader: R) -> HeatResult<Vec<u8>> {
    let mut preamble = Vec::with_capacity(PREAMBLE_SIZE);
    reader
        .take(PREAMBLE_SIZE as u64)
        .read_to_end(&mut preamble)?;
    Ok(preamble)
}

/// 未压缩的 .mgh 文件解析器
pub struct MghParser;

impl MghParser {
    pub fn new() -> Self {
        MghParser
    }
}

impl Default for MghParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeParser for MghParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["mgh"]
    }

    fn name(&self) -> &'static str {
        "MGH Parser"
    }

    fn parse_from_file(&self, file_path: &Path) -> HeatResult<(Grid<u8>, VolumeHeader)> {
        let bytes = read_file_bytes(file_path)?;
        if is_gzip(&bytes) {
            // 扩展名写错的压缩文件也照样解开
            log::debug!("[读取] {} 实际为 gzip 压缩数据", file_path.display());
            return decode_volume(&gunzip(&bytes)?);
        }
        decode_volume(&bytes)
    }

    fn get_header_from_file(&self, file_path: &Path) -> HeatResult<VolumeHeader> {
        let file = File::open(file_path).map_err(|e| HeatError::resource(file_path, e))?;
        parse_header(&read_preamble(file)?)
    }

    fn write_to_file(
        &self,
        file_path: &Path,
        payload: &VolumePayload<'_>,
        header: &VolumeHeader,
    ) -> HeatResult<()> {
        let file = File::create(file_path).map_err(|e| HeatError::resource(file_path, e))?;
        let mut writer = BufWriter::new(file);
        encode_payload(&mut writer, payload, header)?;
        writer.flush()?;
        Ok(())
    }
}
