use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{HeatError, HeatResult};

/// 性能数据记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 阶段分组，例如 "read"、"simulate"、"write"
    pub channel_group: String,
    /// 组内标识，例如输出文件名
    pub channel_index: String,
    /// 附加说明
    pub msg: String,
}

/// 性能数据存储
/// 一次运行中各阶段的耗时，运行结束后可写成 JSON
pub struct PerformanceStore {
    records: RwLock<Vec<PerformanceRecord>>,
}

impl PerformanceStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// 添加性能记录
    pub fn add_record(&self, record: PerformanceRecord) {
        self.records.write().push(record);
    }

    /// 执行 f 并记录其起止时间
    pub fn measure<T>(
        &self,
        channel_group: &str,
        channel_index: &str,
        msg: &str,
        f: impl FnOnce() -> T,
    ) -> T {
        let start_time = get_unix_timestamp_ms();
        let result = f();
        self.add_record(PerformanceRecord {
            start_time,
            end_time: get_unix_timestamp_ms(),
            channel_group: channel_group.to_string(),
            channel_index: channel_index.to_string(),
            msg: msg.to_string(),
        });
        result
    }

    /// 获取所有性能记录
    pub fn get_records(&self) -> Vec<PerformanceRecord> {
        self.records.read().clone()
    }

    /// 清理所有数据
    pub fn clear_all(&self) {
        self.records.write().clear();
    }

    /// 以 JSON 数组写出全部记录
    pub fn write_json(&self, path: &Path) -> HeatResult<()> {
        let json = serde_json::to_vec_pretty(&*self.records.read())?;
        std::fs::write(path, json).map_err(|e| HeatError::resource(path, e))
    }
}

impl Default for PerformanceStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 获取 Unix 时间戳（毫秒）
pub fn get_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
