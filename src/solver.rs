//! 稳态热扩散求解
//!
//! 每次迭代对所有内部的模拟体素做 6 邻域显式松弛：
//!
//! ```text
//! next[v] = (1 - 6ω)·f[v] + ω·Σ(6 个邻居)
//! ```
//!
//! 固定温度体素保持初值 (Dirichlet 边界)。邻居为惰性体素时，用同一轴上
//! 对侧邻居的值代替，相当于界面处零通量的反射边界。
//!
//! 更新是同步的 (Jacobi)：一次迭代内所有体素只读取上一次迭代的温度。
//! 每一行 (固定 k, j) 是一个并行任务，只写自己那一行的缓冲区；
//! 所有行完成后才交换缓冲区进入下一次迭代。

use rayon::prelude::*;

use crate::config::SolverParams;
use crate::error::{HeatError, HeatResult};
use crate::roles::Role;
use crate::voxel_grid::Grid;

/// 运行固定次数的迭代，返回最终温度场
pub fn simulate(
    roles: &Grid<Role>,
    initial: Grid<f32>,
    params: &SolverParams,
) -> HeatResult<Grid<f32>> {
    if !roles.same_shape(&initial) {
        return Err(HeatError::ShapeMismatch {
            shape: roles.get_shape(),
            expected: roles.len(),
            actual: initial.len(),
        });
    }

    let mut current = initial;
    if current.is_empty() {
        return Ok(current);
    }
    let mut next = current.clone();

    let report_every = (params.iterations / 10).max(1);
    for iteration in 0..params.iterations {
        relax_once(roles, &current, &mut next, params.omega);
        // next 的每一行都在本次迭代中完整写过，交换等同于整体拷贝
        std::mem::swap(&mut current, &mut next);

        if (iteration + 1) % report_every == 0 || iteration + 1 == params.iterations {
            log::debug!("[模拟] 迭代 {:04}/{}", iteration + 1, params.iterations);
        }
    }

    if !params.show_all {
        mask_to_simulated(&mut current, roles);
    }
    Ok(current)
}

/// 单次同步松弛：从 current 读，写入 next 的对应行
pub fn relax_once(roles: &Grid<Role>, current: &Grid<f32>, next: &mut Grid<f32>, omega: f32) {
    let [width, height, depth] = current.get_shape();
    if current.is_empty() {
        return;
    }
    let f = current.get_data();
    let r = roles.get_data();
    let plane = width * height;
    let keep = 1.0 - 6.0 * omega;

    next.data
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, out)| {
            let start = row * width;
            out.copy_from_slice(&f[start..start + width]);

            let j = row % height;
            let k = row / height;
            if j == 0 || k == 0 || j + 1 >= height || k + 1 >= depth || width < 3 {
                return;
            }

            for i in 1..width - 1 {
                let v = start + i;
                if r[v] != Role::Simulate {
                    continue;
                }
                let (x_minus, x_plus) = resolve_axis(f, r, v, 1);
                let (y_minus, y_plus) = resolve_axis(f, r, v, width);
                let (z_minus, z_plus) = resolve_axis(f, r, v, plane);
                out[i] = keep * f[v] + omega * (y_minus + y_plus + x_minus + x_plus + z_minus + z_plus);
            }
        });
}

/// 取一条轴上的两个邻居，惰性邻居用对侧的值替换；两侧都是惰性时都取自身的值
#[inline]
fn resolve_axis(f: &[f32], roles: &[Role], v: usize, stride: usize) -> (f32, f32) {
    let minus = v - stride;
    let plus = v + stride;
    match (roles[minus] == Role::Inert, roles[plus] == Role::Inert) {
        (false, false) => (f[minus], f[plus]),
        (true, false) => (f[plus], f[plus]),
        (false, true) => (f[minus], f[minus]),
        (true, true) => (f[v], f[v]),
    }
}

/// 非模拟体素清零
pub fn mask_to_simulated(field: &mut Grid<f32>, roles: &Grid<Role>) {
    for (value, role) in field.data.iter_mut().zip(roles.get_data()) {
        if *role != Role::Simulate {
            *value = 0.0;
        }
    }
}
