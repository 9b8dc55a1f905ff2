//! 距离线段投影.
//!
//! 将选定的对象对与档案中记录的最近点端点转换为可渲染/可导出的线段,
//! 支持空间窗口裁剪与整数坐标缩放. 运算顺序固定: 先过滤, 再平移, 最后缩放.

use crate::dist::{extract_nearest_neighbors, DistanceRecord, MeasureResult, Pair};
use crate::Vox3d;
use itertools::{izip, Itertools};
use ndarray::Array3;
use std::num::NonZeroU32;

/// 候选对象对的选择方式.
#[derive(Clone, Debug)]
pub enum PairSelection {
    /// 所有 `a < b` 的标识符组合 (穷举默认).
    Exhaustive,

    /// 每个对象的至多 k 个最近邻, 见 [`extract_nearest_neighbors`].
    Neighbors(usize),

    /// 显式给定的规范对列表.
    Pairs(Vec<Pair>),
}

/// 可渲染/可导出的距离线段.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DistanceLine {
    /// 起点, 位于对象 `id_a` 上.
    pub start: Vox3d,

    /// 终点, 位于对象 `id_b` 上.
    pub end: Vox3d,

    /// 较小的对象标识符.
    pub id_a: u32,

    /// 较大的对象标识符.
    pub id_b: u32,

    /// 两对象的边界距离 (物理单位).
    pub distance: f64,
}

/// 空间子区域: 各轴上的体素坐标窗口.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BoundingBox {
    /// 各轴起始坐标.
    pub start: Vox3d,

    /// 各轴终止坐标.
    pub stop: Vox3d,
}

impl BoundingBox {
    /// 点是否在所有轴上都严格位于窗口内部 (`start < c < stop`)?
    #[inline]
    fn contains_strict(&self, p: &Vox3d) -> bool {
        izip!(p, &self.start, &self.stop).all(|(c, lo, hi)| c > lo && c < hi)
    }
}

/// 由测量档案构建距离线段列表.
///
/// 每条线段的起止点是档案中该对象对的最小距离端点, 通过标识符反查矩阵
/// 下标获得. 给定 `bb` 时, 只保留两端点都严格位于窗口内部的线段,
/// 并将保留下来的端点减去窗口原点 (变为窗口相对坐标); 给定 `scale` 时,
/// 对 (已平移过的) 整数坐标做分量向下取整除法, 得到更粗分辨率的坐标.
///
/// # 返回值
///
/// 过滤后线段可能为空, 这不是错误. `selection` 引用了 `seg_ids` 之外的
/// 标识符时返回 `Err(MeasureError::UnknownObjectId)`.
pub fn create_distance_lines(
    record: &DistanceRecord,
    selection: PairSelection,
    bb: Option<BoundingBox>,
    scale: Option<NonZeroU32>,
) -> MeasureResult<Vec<DistanceLine>> {
    let pairs = match selection {
        PairSelection::Exhaustive => all_pairs(&record.seg_ids),
        PairSelection::Neighbors(k) => extract_nearest_neighbors(record, k),
        PairSelection::Pairs(pairs) => pairs,
    };

    let mut lines = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let i = record.index_of(pair.a())?;
        let j = record.index_of(pair.b())?;
        lines.push(DistanceLine {
            start: read_endpoint(&record.endpoints1, i, j),
            end: read_endpoint(&record.endpoints2, i, j),
            id_a: pair.a(),
            id_b: pair.b(),
            distance: record.distances[(i, j)],
        });
    }

    if let Some(bb) = bb {
        lines.retain(|l| bb.contains_strict(&l.start) && bb.contains_strict(&l.end));
        for line in lines.iter_mut() {
            for (c, off) in line.start.iter_mut().zip(&bb.start) {
                *c -= off;
            }
            for (c, off) in line.end.iter_mut().zip(&bb.start) {
                *c -= off;
            }
        }
    }

    if let Some(scale) = scale {
        let s = i64::from(scale.get());
        for line in lines.iter_mut() {
            for c in line.start.iter_mut().chain(line.end.iter_mut()) {
                *c = c.div_euclid(s);
            }
        }
    }

    Ok(lines)
}

/// 所有 `a < b` 的标识符组合.
fn all_pairs(seg_ids: &[u32]) -> Vec<Pair> {
    seg_ids
        .iter()
        .tuple_combinations()
        .map(|(&a, &b)| Pair::new(a, b))
        .collect()
}

/// 读取端点表中 (i, j) 的体素坐标.
fn read_endpoint(table: &Array3<i64>, i: usize, j: usize) -> Vox3d {
    [table[(i, j, 0)], table[(i, j, 1)], table[(i, j, 2)]]
}
