//! 在三维标签体数据上求解稳态热方程，得到伪距离场
//!
//! 低温、高温标签固定温度，模拟标签内部扩散到平衡，其余标签为反射边界。
//! 结果可以按分位数切成体素数相近的若干层，或求梯度得到方向场。

pub mod config;
pub mod error;
pub mod gradient;
pub mod parser_registry;
pub mod parsers;
pub mod performance;
pub mod pipeline;
pub mod quantize;
pub mod roles;
pub mod solver;
pub mod utils;
pub mod voxel_grid;

pub use config::{LabelSets, RunConfig, SolverParams};
pub use error::{ErrorKind, HeatError, HeatResult};
pub use parsers::{VolumeHeader, VoxelType};
pub use pipeline::{RunOutputs, run};
pub use roles::Role;
pub use voxel_grid::Grid;
