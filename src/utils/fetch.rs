use std::path::{Path, PathBuf};
use std::time::Duration;

use uuid::Uuid;

use crate::error::{HeatError, HeatResult};

/// 单个下载文件的大小上限
const MAX_DOWNLOAD_BYTES: usize = 1 << 30;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// 准备好可以直接读取的输入
///
/// 远程输入会被下载到临时目录，离开作用域时删除（包括出错返回的情况）。
#[derive(Debug)]
pub struct StagedInput {
    /// 实际读取的本地路径
    path: PathBuf,
    /// 原始文件名，用于推导输出文件名
    name: PathBuf,
    /// 是否为下载得到的临时文件
    temporary: bool,
}

impl StagedInput {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &Path {
        &self.name
    }

    pub fn is_remote(&self) -> bool {
        self.temporary
    }
}

impl Drop for StagedInput {
    fn drop(&mut self) {
        if self.temporary {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::debug!("[下载] 删除临时文件 {} 失败: {}", self.path.display(), e);
            }
        }
    }
}

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// URL 最后一段路径作为文件名，去掉查询串与锚点
pub fn url_file_name(url: &str) -> PathBuf {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let after_scheme = without_query
        .split_once("://")
        .map_or(without_query, |(_, rest)| rest);
    let name = match after_scheme.split_once('/') {
        Some((_, path)) => path.rsplit('/').next().unwrap_or(""),
        None => "",
    };
    if name.is_empty() {
        PathBuf::from("download")
    } else {
        PathBuf::from(name)
    }
}

/// 本地文件直接使用；不存在且看起来像 URL 时先下载到临时文件
pub fn stage_input(input: &str) -> HeatResult<StagedInput> {
    let local = Path::new(input);
    if local.is_file() {
        return Ok(StagedInput {
            path: local.to_path_buf(),
            name: local.to_path_buf(),
            temporary: false,
        });
    }

    if !is_url(input) {
        return Err(HeatError::resource(
            local,
            std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在"),
        ));
    }

    log::info!("[下载] 本地不存在，尝试下载 {}", input);
    let name = url_file_name(input);
    let bytes = fetch_bytes(input)?;

    let staged_name = match name.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!(".download-{}.{}", Uuid::new_v4(), ext),
        None => format!(".download-{}", Uuid::new_v4()),
    };
    let path = std::env::temp_dir().join(staged_name);
    std::fs::write(&path, &bytes).map_err(|e| HeatError::resource(&path, e))?;
    log::debug!("[下载] {} 字节已暂存到 {}", bytes.len(), path.display());

    Ok(StagedInput {
        path,
        name,
        temporary: true,
    })
}

/// 同步下载整个响应体
pub fn fetch_bytes(url: &str) -> HeatResult<Vec<u8>> {
    actix_rt::System::new().block_on(download(url))
}

async fn download(url: &str) -> HeatResult<Vec<u8>> {
    let client = awc::Client::builder().timeout(DOWNLOAD_TIMEOUT).finish();

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(url, e))?;

    if !response.status().is_success() {
        return Err(fetch_error(url, format!("HTTP 状态码 {}", response.status())));
    }

    let body = response
        .body()
        .limit(MAX_DOWNLOAD_BYTES)
        .await
        .map_err(|e| fetch_error(url, e))?;
    Ok(body.to_vec())
}

fn fetch_error(url: &str, error: impl std::fmt::Display) -> HeatError {
    HeatError::Fetch {
        url: url.to_string(),
        message: error.to_string(),
    }
}
