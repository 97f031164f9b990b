use std::path::Path;

use crate::error::HeatResult;
use crate::parsers::VolumeHeader;
use crate::voxel_grid::Grid;

/// 写出时可选的三类体数据
pub enum VolumePayload<'a> {
    /// uint8 标签或距离分段
    Labels(&'a Grid<u8>),
    /// float32 温度场
    Scalars(&'a Grid<f32>),
    /// 三通道 float32 梯度，按三帧写出
    Gradient(&'a Grid<[f32; 3]>),
}

/// 体数据解析器 trait
/// 同一种布局的不同容器（是否整体压缩）各实现一次
pub trait VolumeParser: Send + Sync {
    /// 获取支持的文件扩展名（不含点号），例如: "mgz"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 检查文件扩展名是否被支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 从文件路径读取标签体数据，只保留第一帧
    fn parse_from_file(&self, file_path: &Path) -> HeatResult<(Grid<u8>, VolumeHeader)>;

    /// 快速读取文件头（不解析体素数据）
    fn get_header_from_file(&self, file_path: &Path) -> HeatResult<VolumeHeader>;

    /// 沿用输入文件头写出一份体数据，type 与 nframes 由 payload 决定
    fn write_to_file(
        &self,
        file_path: &Path,
        payload: &VolumePayload<'_>,
        header: &VolumeHeader,
    ) -> HeatResult<()>;

    /// 获取解析器名称（用于日志和错误信息）
    fn name(&self) -> &'static str;
}
