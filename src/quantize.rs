//! 把温度场按分位数切成体素数相近的 N 段
//!
//! 只统计模拟体素。直方图覆盖这些体素实际的最小值到最大值，
//! 累积直方图第一次超过 i/N 的位置换算回温度，得到 N-1 个递增阈值。
//! 体素的标签是 1 + 它超过的阈值个数，非模拟体素为 0。

use crate::config::MAX_SEGMENTS;
use crate::error::{HeatError, HeatResult};
use crate::roles::Role;
use crate::voxel_grid::Grid;

/// 直方图的分辨率
pub const HISTOGRAM_BINS: usize = 512;

/// 计算 N-1 个分段阈值
///
/// 返回 None 表示没有模拟体素。所有模拟体素温度相同时返回的阈值全部相等。
pub fn quantile_thresholds(
    field: &Grid<f32>,
    roles: &Grid<Role>,
    segments: usize,
) -> Option<Vec<f32>> {
    let values: Vec<f32> = field
        .get_data()
        .iter()
        .zip(roles.get_data())
        .filter(|(_, role)| **role == Role::Simulate)
        .map(|(value, _)| *value)
        .collect();
    if values.is_empty() {
        return None;
    }

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    let last_bin = HISTOGRAM_BINS - 1;

    let mut hist = vec![0u64; HISTOGRAM_BINS];
    for &value in &values {
        let bin = if range > 0.0 {
            let scaled = ((value - min) / range * last_bin as f32).round();
            (scaled.max(0.0) as usize).min(last_bin)
        } else {
            0
        };
        hist[bin] += 1;
    }

    let mut cumulative = Vec::with_capacity(HISTOGRAM_BINS);
    let mut running = 0u64;
    for count in &hist {
        running += count;
        cumulative.push(running);
    }
    let total = running as f64;

    let targets: Vec<f64> = (1..segments).map(|i| i as f64 / segments as f64).collect();
    let mut thresholds = Vec::with_capacity(targets.len());
    for (bin, &mass) in cumulative.iter().enumerate() {
        let fraction = mass as f64 / total;
        // 同一个 bin 可能同时越过多个目标
        while thresholds.len() < targets.len() && fraction > targets[thresholds.len()] {
            thresholds.push(min + range * (bin as f32 / last_bin as f32));
        }
        if thresholds.len() == targets.len() {
            break;
        }
    }

    Some(thresholds)
}

/// 单个温度值对应的分段标签：从最高阈值往下找第一个被超过的
pub fn segment_of(value: f32, thresholds: &[f32]) -> u8 {
    thresholds
        .iter()
        .rposition(|&threshold| value > threshold)
        .map_or(1, |index| (index + 2) as u8)
}

/// 生成距离分段：0 为非模拟体素，1..=N 从低温端向外编号
pub fn distance_field(
    field: &Grid<f32>,
    roles: &Grid<Role>,
    segments: usize,
) -> HeatResult<Grid<u8>> {
    if !(1..=MAX_SEGMENTS).contains(&segments) {
        return Err(HeatError::Configuration(format!(
            "分段数 {} 超出范围，应在 1..={} 之间",
            segments, MAX_SEGMENTS
        )));
    }
    if !field.same_shape(roles) {
        return Err(HeatError::ShapeMismatch {
            shape: roles.get_shape(),
            expected: roles.len(),
            actual: field.len(),
        });
    }

    let Some(thresholds) = quantile_thresholds(field, roles, segments) else {
        log::warn!("[分段] 没有模拟体素，距离分段全部为 0");
        return Ok(Grid::filled(field.get_shape(), 0u8));
    };

    let degenerate = is_constant(field, roles);
    if degenerate {
        log::warn!("[分段] 模拟体素的温度没有区分度，所有体素归入第 {} 段", segments);
    }
    log::debug!("[分段] 阈值: {:?}", thresholds);

    let labels = field
        .get_data()
        .iter()
        .zip(roles.get_data())
        .map(|(&value, &role)| match role {
            Role::Simulate if degenerate => segments as u8,
            Role::Simulate => segment_of(value, &thresholds),
            _ => 0,
        })
        .collect();
    Grid::new(field.get_shape(), labels)
}

fn is_constant(field: &Grid<f32>, roles: &Grid<Role>) -> bool {
    let mut simulated = field
        .get_data()
        .iter()
        .zip(roles.get_data())
        .filter(|(_, role)| **role == Role::Simulate)
        .map(|(value, _)| *value);
    match simulated.next() {
        Some(first) => simulated.all(|v| v == first),
        None => false,
    }
}
