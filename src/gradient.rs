//! 温度场的有限差分梯度
//!
//! 通道 0/1/2 分别对应 i (width)、j (height)、k (depth) 方向。

use crate::error::{HeatError, HeatResult};
use crate::roles::Role;
use crate::voxel_grid::Grid;

/// 计算内部模拟体素的梯度，其余体素为 (0, 0, 0)
///
/// 每个方向上，邻居不是模拟体素时用中心体素自身的值代替：
/// 两侧都是模拟体素得到中心差分，只有一侧是时退化为单侧差分的一半，
/// 两侧都不是时为 0。
pub fn gradient_field(field: &Grid<f32>, roles: &Grid<Role>) -> HeatResult<Grid<[f32; 3]>> {
    if !field.same_shape(roles) {
        return Err(HeatError::ShapeMismatch {
            shape: roles.get_shape(),
            expected: roles.len(),
            actual: field.len(),
        });
    }

    let [width, height, depth] = field.get_shape();
    let strides = [1, width, width * height];
    let f = field.get_data();
    let r = roles.get_data();
    let mut gradient = Grid::filled(field.get_shape(), [0.0f32; 3]);

    for k in 1..depth.saturating_sub(1) {
        for j in 1..height.saturating_sub(1) {
            for i in 1..width.saturating_sub(1) {
                let v = field.index(i, j, k);
                if r[v] != Role::Simulate {
                    continue;
                }
                let sample = |n: usize| if r[n] == Role::Simulate { f[n] } else { f[v] };
                let mut vector = [0.0f32; 3];
                for (axis, &stride) in strides.iter().enumerate() {
                    vector[axis] = (sample(v + stride) - sample(v - stride)) / 2.0;
                }
                gradient.data[v] = vector;
            }
        }
    }

    Ok(gradient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// f = a·i + b·j + c·k
    fn linear(shape: [usize; 3], a: f32, b: f32, c: f32) -> Grid<f32> {
        let mut grid = Grid::filled(shape, 0.0f32);
        for k in 0..shape[2] {
            for j in 0..shape[1] {
                for i in 0..shape[0] {
                    grid.set(i, j, k, a * i as f32 + b * j as f32 + c * k as f32);
                }
            }
        }
        grid
    }

    #[test]
    fn central_difference_recovers_linear_slope() {
        let field = linear([5, 5, 5], 0.5, -1.0, 2.0);
        let roles = Grid::filled([5, 5, 5], Role::Simulate);
        let gradient = gradient_field(&field, &roles).unwrap();
        let g = gradient.get(2, 2, 2).unwrap();
        assert_relative_eq!(g[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(g[1], -1.0, epsilon = 1e-6);
        assert_relative_eq!(g[2], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn border_and_non_simulated_are_zero() {
        let field = linear([4, 5, 6], 1.0, 1.0, 1.0);
        let mut roles = Grid::filled([4, 5, 6], Role::Simulate);
        roles.set(2, 2, 2, Role::Inert);
        roles.set(1, 3, 3, Role::FixedHigh);
        let gradient = gradient_field(&field, &roles).unwrap();

        for k in 0..6 {
            for j in 0..5 {
                for i in 0..4 {
                    let on_border = !gradient.is_interior(i, j, k);
                    let role = *roles.get(i, j, k).unwrap();
                    if on_border || role != Role::Simulate {
                        assert_eq!(*gradient.get(i, j, k).unwrap(), [0.0; 3]);
                    }
                }
            }
        }
    }

    #[test]
    fn one_sided_difference_next_to_boundary() {
        let field = linear([5, 3, 3], 1.0, 0.0, 0.0);
        let mut roles = Grid::filled([5, 3, 3], Role::Simulate);
        // (2,1,1) 的 +i 邻居不是模拟体素
        roles.set(3, 1, 1, Role::FixedHigh);
        let gradient = gradient_field(&field, &roles).unwrap();
        let g = gradient.get(2, 1, 1).unwrap();
        // (f[2] - f[1]) / 2
        assert_relative_eq!(g[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn isolated_axis_gives_zero() {
        let field = linear([3, 3, 3], 3.0, 0.0, 1.0);
        let mut roles = Grid::filled([3, 3, 3], Role::Simulate);
        roles.set(0, 1, 1, Role::Inert);
        roles.set(2, 1, 1, Role::FixedLow);
        let gradient = gradient_field(&field, &roles).unwrap();
        let g = gradient.get(1, 1, 1).unwrap();
        assert_eq!(g[0], 0.0);
        assert_relative_eq!(g[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn tiny_grids_have_no_interior() {
        let field = Grid::filled([2, 2, 2], 1.0f32);
        let roles = Grid::filled([2, 2, 2], Role::Simulate);
        let gradient = gradient_field(&field, &roles).unwrap();
        assert!(gradient.get_data().iter().all(|g| *g == [0.0; 3]));
    }
}
