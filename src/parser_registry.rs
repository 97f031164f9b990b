use std::path::Path;

use crate::error::{HeatError, HeatResult};
use crate::utils::parser::VolumeParser;

/// 解析器注册表
/// 管理所有可用的体数据解析器，并根据文件扩展名匹配对应的解析器
pub struct ParserRegistry {
    parsers: Vec<Box<dyn VolumeParser>>,
}

impl ParserRegistry {
    /// 创建新的解析器注册表，自动注册所有可用的解析器
    pub fn new() -> Self {
        let parsers = crate::parsers::get_all_parsers();
        Self { parsers }
    }

    /// 根据文件扩展名查找匹配的解析器
    /// extension: 文件扩展名（不含点号），例如 "mgz"
    pub fn find_parser(&self, extension: &str) -> Option<&dyn VolumeParser> {
        self.parsers
            .iter()
            .find(|parser| parser.supports(extension))
            .map(|p| p.as_ref())
    }

    /// 根据文件路径查找匹配的解析器
    /// 自动提取文件扩展名
    pub fn find_parser_for_file(&self, file_path: &Path) -> Option<(&dyn VolumeParser, String)> {
        let extension = file_path
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_string();

        self.find_parser(&extension)
            .map(|parser| (parser, extension))
    }

    /// 与 find_parser_for_file 相同，找不到时返回格式错误
    pub fn require_parser_for_file(&self, file_path: &Path) -> HeatResult<&dyn VolumeParser> {
        self.find_parser_for_file(file_path)
            .map(|(parser, _)| parser)
            .ok_or_else(|| HeatError::UnsupportedFormat {
                file: file_path.display().to_string(),
                supported: self.supported_extensions(),
            })
    }

    /// 获取所有支持的扩展名列表
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions = Vec::new();
        for parser in &self.parsers {
            extensions.extend(
                parser
                    .supported_extensions()
                    .iter()
                    .map(|s| s.to_lowercase()),
            );
        }
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_parser_by_extension() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.supported_extensions(), vec!["mgh", "mgz"]);

        let (parser, ext) = registry
            .find_parser_for_file(Path::new("/data/aseg.MGZ"))
            .unwrap();
        assert_eq!(parser.name(), "MGZ Parser");
        assert_eq!(ext, "MGZ");

        assert_eq!(
            registry.find_parser("mgh").map(|p| p.name()),
            Some("MGH Parser")
        );
    }

    #[test]
    fn unknown_extension_is_format_error() {
        let registry = ParserRegistry::new();
        assert!(registry.find_parser_for_file(Path::new("scan.nii")).is_none());
        assert!(registry.find_parser_for_file(Path::new("noext")).is_none());

        let err = registry
            .require_parser_for_file(Path::new("scan.nii"))
            .err()
            .unwrap();
        assert!(matches!(err, HeatError::UnsupportedFormat { .. }));
    }
}
