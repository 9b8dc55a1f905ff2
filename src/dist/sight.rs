//! 视线遮挡过滤.
//!
//! 判定每条候选线段是否 "直接" 相连: 将最近点线段以三维 Bresenham
//! 算法栅格化为体素路径, 可选地对路径做钻石型加粗, 若路径除背景与
//! 两端对象之外不经过任何其他对象, 则保留该对象对.

use crate::consts::is_object;
use crate::dist::{create_distance_lines, DistanceRecord, MeasureResult, Pair, PairSelection};
use crate::{SegVolume, Vox3d};
use log::info;
use num::ToPrimitive;
use std::collections::BTreeSet;
use std::num::NonZeroU32;

/// 遮挡过滤的保留/总数统计.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FilterStats {
    /// 通过遮挡测试的对数.
    pub kept: usize,

    /// 候选总对数.
    pub total: usize,
}

/// 过滤被第三个对象遮挡的对象对.
///
/// 候选集为档案中全部 `a < b` 组合 (穷举模式). `scale` 会原样传递给
/// 线段投影, 此时 `seg` 应当是相应缩放过的体数据. `radius > 0` 时,
/// 体素路径先经过 `radius` 轮钻石型 (6-邻域) 二值膨胀再做遮挡判定;
/// 膨胀直接在稀疏坐标集合上进行, 不为每条线段物化整卷掩码.
/// 越界 (含负坐标) 的路径体素不参与判定.
///
/// # 返回值
///
/// `(通过测试的规范对列表, 保留/总数统计)`.
pub fn filter_blocked_distance_lines(
    seg: &SegVolume,
    record: &DistanceRecord,
    scale: Option<NonZeroU32>,
    radius: usize,
) -> MeasureResult<(Vec<Pair>, FilterStats)> {
    let lines = create_distance_lines(record, PairSelection::Exhaustive, None, scale)?;
    let total = lines.len();

    let mut kept = Vec::new();
    for line in &lines {
        let mut path = rasterize_segment(&line.start, &line.end);
        for _ in 0..radius {
            path = dilate_diamond(&path);
        }
        if is_direct(seg, &path, line.id_a, line.id_b) {
            kept.push(Pair::new(line.id_a, line.id_b));
        }
    }

    let stats = FilterStats {
        kept: kept.len(),
        total,
    };
    info!("视线遮挡过滤: 保留 {} / {} 对", stats.kept, stats.total);
    Ok((kept, stats))
}

/// 以三维 Bresenham 算法栅格化线段, 包含两端点.
///
/// 以绝对增量最大的轴为驱动轴, 其余两轴各维护一个误差项.
fn rasterize_segment(start: &Vox3d, end: &Vox3d) -> BTreeSet<Vox3d> {
    let mut delta = [0i64; 3];
    let mut step = [0i64; 3];
    for k in 0..3 {
        delta[k] = (end[k] - start[k]).abs();
        step[k] = (end[k] - start[k]).signum();
    }
    let axis = (0..3).max_by_key(|&k| delta[k]).unwrap();
    let n = delta[axis];

    let mut path = BTreeSet::new();
    let mut p = *start;
    path.insert(p);

    let mut err = [0i64; 3];
    for k in 0..3 {
        if k != axis {
            err[k] = 2 * delta[k] - n;
        }
    }
    for _ in 0..n {
        p[axis] += step[axis];
        for k in 0..3 {
            if k == axis {
                continue;
            }
            if err[k] >= 0 {
                p[k] += step[k];
                err[k] -= 2 * n;
            }
            err[k] += 2 * delta[k];
        }
        path.insert(p);
    }
    path
}

/// 对稀疏体素坐标集合做一轮钻石型 (6-邻域) 二值膨胀.
fn dilate_diamond(path: &BTreeSet<Vox3d>) -> BTreeSet<Vox3d> {
    let mut out = path.clone();
    for p in path {
        for k in 0..3 {
            for d in [-1i64, 1] {
                let mut q = *p;
                q[k] += d;
                out.insert(q);
            }
        }
    }
    out
}

/// 路径上除背景与两端对象之外是否没有任何其他对象?
fn is_direct(seg: &SegVolume, path: &BTreeSet<Vox3d>, id_a: u32, id_b: u32) -> bool {
    path.iter()
        .filter_map(|p| label_at(seg, p))
        .all(|label| !is_object(label) || label == id_a || label == id_b)
}

/// 读取体素标签. 越界 (含负坐标) 时返回 `None`.
fn label_at(seg: &SegVolume, p: &Vox3d) -> Option<u32> {
    let z = p[0].to_usize()?;
    let h = p[1].to_usize()?;
    let w = p[2].to_usize()?;
    seg.data().get((z, h, w)).copied()
}

#[cfg(test)]
mod tests {
    use super::{dilate_diamond, filter_blocked_distance_lines, rasterize_segment};
    use crate::dist::{compute_boundary_distances, Pair};
    use crate::SegVolume;
    use ndarray::Array3;

    /// 一维三对象场景: 对象 3 恰好挡在对象 1 与对象 2 的连线上.
    fn collinear_volume() -> SegVolume {
        let mut data = Array3::<u32>::zeros((1, 1, 13));
        for w in 0..=2 {
            data[(0, 0, w)] = 1;
        }
        for w in 10..=12 {
            data[(0, 0, w)] = 2;
        }
        for w in 5..=7 {
            data[(0, 0, w)] = 3;
        }
        SegVolume::new(data)
    }

    /// 栅格化: 轴向线段含两端点.
    #[test]
    fn test_rasterize_axis_aligned() {
        let path = rasterize_segment(&[0, 0, 2], &[0, 0, 10]);
        assert_eq!(path.len(), 9);
        assert!(path.contains(&[0, 0, 2]));
        assert!(path.contains(&[0, 0, 10]));
    }

    /// 栅格化: 斜线到达终点且每步最多前进一个体素.
    #[test]
    fn test_rasterize_oblique() {
        let (start, end) = ([0i64, 0, 0], [4i64, 7, 2]);
        let path = rasterize_segment(&start, &end);
        assert!(path.contains(&start));
        assert!(path.contains(&end));
        // 驱动轴共前进 7 步.
        assert_eq!(path.len(), 8);
    }

    /// 钻石膨胀: 单点一轮膨胀得到 7 个体素.
    #[test]
    fn test_dilate_diamond() {
        let mut path = std::collections::BTreeSet::new();
        path.insert([5i64, 5, 5]);
        let out = dilate_diamond(&path);
        assert_eq!(out.len(), 7);
        assert!(out.contains(&[4, 5, 5]));
        assert!(out.contains(&[5, 5, 6]));
    }

    /// 连线被第三个对象穿过的对被剔除, 其余保留.
    #[test]
    fn test_blocked_pair_excluded() {
        let _ = simple_logger::SimpleLogger::new().init();

        let seg = collinear_volume();
        let record = compute_boundary_distances(&seg, None).unwrap();

        let (pairs, stats) = filter_blocked_distance_lines(&seg, &record, None, 0).unwrap();
        assert_eq!(pairs, vec![Pair::new(1, 3), Pair::new(2, 3)]);
        assert_eq!((stats.kept, stats.total), (2, 3));
    }

    /// 第三个对象偏离直线一个体素: 半径 0 保留, 半径 1 后被挡住.
    #[test]
    fn test_thickening_radius() {
        let mut data = Array3::<u32>::zeros((1, 3, 13));
        data[(0, 1, 0)] = 1;
        data[(0, 1, 12)] = 2;
        data[(0, 0, 6)] = 3;
        data[(0, 2, 6)] = 3;
        let seg = SegVolume::new(data);
        let record = compute_boundary_distances(&seg, None).unwrap();

        let (pairs, _) = filter_blocked_distance_lines(&seg, &record, None, 0).unwrap();
        assert!(pairs.contains(&Pair::new(1, 2)));

        let (pairs, stats) = filter_blocked_distance_lines(&seg, &record, None, 1).unwrap();
        assert!(!pairs.contains(&Pair::new(1, 2)));
        assert_eq!(stats.total, 3);
    }
}
