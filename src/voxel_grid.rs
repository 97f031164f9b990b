use crate::error::{HeatError, HeatResult};

/// 体素网格数据结构
/// 表示三维规则网格上的一类逐体素数据（标签、角色、温度、梯度……）
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    /// 网格维度 [width, height, depth]
    pub shape: [usize; 3],
    /// 数据数组，按 C 语言顺序存储 (i 变化最快，j 其次，k 最慢)
    /// 索引计算: index = k * width * height + j * width + i
    pub data: Vec<T>,
}

impl<T> Grid<T> {
    /// 创建新的体素网格，校验数据量与 shape 一致
    pub fn new(shape: [usize; 3], data: Vec<T>) -> HeatResult<Self> {
        let total_elements = shape[0] * shape[1] * shape[2];

        if data.len() != total_elements {
            return Err(HeatError::ShapeMismatch {
                shape,
                expected: total_elements,
                actual: data.len(),
            });
        }

        Ok(Grid { shape, data })
    }

    /// 用同一个值填满整个网格
    pub fn filled(shape: [usize; 3], value: T) -> Self
    where
        T: Clone,
    {
        Grid {
            shape,
            data: vec![value; shape[0] * shape[1] * shape[2]],
        }
    }

    /// 获取整个数据向量的引用
    pub fn get_data(&self) -> &Vec<T> {
        &self.data
    }

    /// 获取 shape
    pub fn get_shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// (i, j, k) 对应的线性索引，不做越界检查
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.shape[0] * (j + self.shape[1] * k)
    }

    /// 带越界检查的读取
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<&T> {
        if i < self.shape[0] && j < self.shape[1] && k < self.shape[2] {
            self.data.get(self.index(i, j, k))
        } else {
            None
        }
    }

    /// 带越界检查的写入，越界返回 false
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) -> bool {
        if i < self.shape[0] && j < self.shape[1] && k < self.shape[2] {
            let idx = self.index(i, j, k);
            self.data[idx] = value;
            true
        } else {
            false
        }
    }

    /// 三个坐标都落在 [1, dim-2] 内才算内部体素
    #[inline]
    pub fn is_interior(&self, i: usize, j: usize, k: usize) -> bool {
        i >= 1
            && j >= 1
            && k >= 1
            && i + 1 < self.shape[0]
            && j + 1 < self.shape[1]
            && k + 1 < self.shape[2]
    }

    /// 判断两个网格维度是否一致
    pub fn same_shape<U>(&self, other: &Grid<U>) -> bool {
        self.shape == other.shape
    }

    /// 逐体素映射为新网格，shape 不变
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            shape: self.shape,
            data: self.data.iter().map(f).collect(),
        }
    }
}
