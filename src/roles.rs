//! 标签分类：把每个体素的标签映射为角色与初始温度

use crate::config::LabelSets;
use crate::voxel_grid::Grid;

/// 低温体素的固定温度
pub const LOW_TEMPERATURE: f32 = 0.01;
/// 高温体素的固定温度
pub const HIGH_TEMPERATURE: f32 = 0.1;
/// 模拟体素的初始温度，取两端的中点
pub const MID_TEMPERATURE: f32 = 0.055;

/// 体素在模拟中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Role {
    /// 固定为低温 (Dirichlet 边界)
    FixedLow,
    /// 固定为高温 (Dirichlet 边界)
    FixedHigh,
    /// 参与扩散
    Simulate,
    /// 反射边界，不参与计算
    #[default]
    Inert,
}

impl Role {
    pub fn initial_temperature(self) -> f32 {
        match self {
            Role::FixedLow => LOW_TEMPERATURE,
            Role::FixedHigh => HIGH_TEMPERATURE,
            Role::Simulate => MID_TEMPERATURE,
            Role::Inert => 0.0,
        }
    }
}

/// 按 低温 → 高温 → 模拟 的顺序判定单个标签，后判定的覆盖先判定的
pub fn role_of(label: u8, sets: &LabelSets) -> Role {
    let mut role = Role::Inert;
    if sets.low.contains(&label) {
        role = Role::FixedLow;
    }
    if sets.high.contains(&label) {
        role = Role::FixedHigh;
    }
    if sets.simulate.contains(&label) {
        role = Role::Simulate;
    }
    role
}

/// 生成角色网格与初始温度场
pub fn classify(labels: &Grid<u8>, sets: &LabelSets) -> (Grid<Role>, Grid<f32>) {
    // 标签只有 256 种，先建查找表
    let mut table = [Role::Inert; 256];
    for (label, slot) in table.iter_mut().enumerate() {
        *slot = role_of(label as u8, sets);
    }

    let roles = labels.map(|&label| table[label as usize]);
    let field = roles.map(|role| role.initial_temperature());

    let simulated = roles.get_data().iter().filter(|r| **r == Role::Simulate).count();
    log::debug!(
        "[分类] {} 个体素中有 {} 个参与模拟",
        roles.len(),
        simulated
    );
    if simulated == 0 {
        log::warn!("[分类] 没有任何体素属于 --simulate 指定的标签");
    }

    (roles, field)
}
