//! 距离场引擎.
//!
//! 对单个对象计算其补集的精确欧几里得距离变换: 每个体素得到其到对象最近
//! 体素的物理距离, 以及该最近体素的坐标 (回引). 算法为 Felzenszwalb &
//! Huttenlocher 的可分离下包络变换, 三个维度各做一趟一维变换, 平方距离
//! 与最近体素坐标一同传播; 对 (带各轴权重的) 欧几里得平方距离是精确的.
//!
//! 距离场对一个对象只计算一次, 随后对所有其他对象复用 (掩膜取最小),
//! 因此全部对象对只需要 O(N) 次变换而不是 O(N^2) 次.

use crate::dist::{MeasureError, MeasureResult};
use crate::{Idx3d, SegVolume};
use ndarray::{Array3, ArrayViewMut1, Axis};
use ordered_float::NotNan;

/// "尚无最近对象体素" 的哨兵线性索引.
const NO_FEAT: u32 = u32::MAX;

/// 单个对象的距离场.
///
/// `dist2` 为各体素到对象的 **平方** 物理距离, `feat`
/// 为最近对象体素的行优先线性索引.
pub struct DistanceField {
    dist2: Array3<f64>,
    feat: Array3<u32>,
    shape: Idx3d,
}

impl DistanceField {
    /// 计算对象 `id` 的距离场.
    ///
    /// 距离以 `seg` 的体素物理分辨率为采样权重; 未指定分辨率时为体素单位.
    ///
    /// # 返回值
    ///
    /// 对象在体数据中没有任何体素时返回 `Err(MeasureError::EmptyObject)`.
    pub fn compute(seg: &SegVolume, id: u32) -> MeasureResult<Self> {
        let shape = seg.shape();
        let mut dist2 = Array3::from_elem(shape, f64::INFINITY);
        let mut feat = Array3::from_elem(shape, NO_FEAT);

        let mut non_empty = false;
        for (pos, &p) in seg.data().indexed_iter() {
            if p == id {
                non_empty = true;
                dist2[pos] = 0.0;
                feat[pos] = linearize(shape, pos);
            }
        }
        if !non_empty {
            return Err(MeasureError::EmptyObject(id));
        }

        let sampling = seg.resolution();
        for axis in 0..3 {
            edt_pass(&mut dist2, &mut feat, Axis(axis), sampling[axis]);
        }
        Ok(Self {
            dist2,
            feat,
            shape,
        })
    }

    /// 体素 `pos` 到对象的物理距离.
    #[inline]
    pub fn distance_at(&self, pos: Idx3d) -> f64 {
        self.dist2[pos].sqrt()
    }

    /// 体素 `pos` 最近的对象体素坐标.
    #[inline]
    pub fn nearest_at(&self, pos: Idx3d) -> Idx3d {
        delinearize(self.shape, self.feat[pos])
    }

    /// 在对象 `other_id` 的体素区域上对距离场取最小.
    ///
    /// 语义上等价于将距离场在 `other_id` 之外全部置为无穷大后取 argmin.
    /// 并列时取行优先顺序下的第一个最小点.
    ///
    /// # 返回值
    ///
    /// `(最小物理距离, 本对象上的端点, other_id 上的端点)`.
    /// `other_id` 没有任何体素时返回 `Err(MeasureError::EmptyObject)`.
    pub fn closest_to_object(
        &self,
        seg: &SegVolume,
        other_id: u32,
    ) -> MeasureResult<(f64, Idx3d, Idx3d)> {
        let mut best: Option<(NotNan<f64>, Idx3d)> = None;
        for (pos, &p) in seg.data().indexed_iter() {
            if p != other_id {
                continue;
            }
            let d = NotNan::<f64>::new(self.dist2[pos]).unwrap();
            if best.as_ref().map_or(true, |(bd, _)| d < *bd) {
                best = Some((d, pos));
            }
        }

        let Some((d2, on_other)) = best else {
            return Err(MeasureError::EmptyObject(other_id));
        };
        Ok((d2.into_inner().sqrt(), self.nearest_at(on_other), on_other))
    }
}

/// 沿 `axis` 对平方距离与回引做一趟一维下包络变换.
///
/// `step` 为该轴的物理体素间距.
fn edt_pass(dist2: &mut Array3<f64>, feat: &mut Array3<u32>, axis: Axis, step: f64) {
    let len = dist2.len_of(axis);
    let mut g = Vec::with_capacity(len);
    let mut f = Vec::with_capacity(len);

    for (mut dl, mut fl) in dist2
        .lanes_mut(axis)
        .into_iter()
        .zip(feat.lanes_mut(axis))
    {
        g.clear();
        g.extend(dl.iter().copied());
        f.clear();
        f.extend(fl.iter().copied());
        envelope_1d(&g, &f, step, &mut dl, &mut fl);
    }
}

/// 单条扫描线上的一维下包络变换.
///
/// `g`/`f` 为该线当前的平方距离与最近体素线性索引, 结果写回 `out_d`/`out_f`.
/// 无穷远处的抛物线不参与下包络; 若整条线均为无穷远则保持原样.
fn envelope_1d(
    g: &[f64],
    f: &[u32],
    step: f64,
    out_d: &mut ArrayViewMut1<'_, f64>,
    out_f: &mut ArrayViewMut1<'_, u32>,
) {
    let n = g.len();
    let Some(first) = (0..n).find(|&q| g[q].is_finite()) else {
        return;
    };

    // v: 下包络中各抛物线的顶点下标; z: 相邻抛物线的分界横坐标.
    let mut v = vec![0usize; n];
    let mut z = vec![0.0f64; n + 1];
    let mut k = 0usize;
    v[0] = first;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in (first + 1)..n {
        if g[q].is_infinite() {
            continue;
        }
        let mut s = intersect(g, step, q, v[k]);
        while k > 0 && s <= z[k] {
            k -= 1;
            s = intersect(g, step, q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    let mut j = 0usize;
    for q in 0..n {
        let xq = q as f64 * step;
        while z[j + 1] < xq {
            j += 1;
        }
        let p = v[j];
        let xp = p as f64 * step;
        out_d[q] = g[p] + (xq - xp) * (xq - xp);
        out_f[q] = f[p];
    }
}

/// 抛物线 `q` 与 `p` 的交点横坐标 (物理单位).
#[inline]
fn intersect(g: &[f64], step: f64, q: usize, p: usize) -> f64 {
    let (xq, xp) = (q as f64 * step, p as f64 * step);
    ((g[q] + xq * xq) - (g[p] + xp * xp)) / (2.0 * (xq - xp))
}

/// `Idx3d` -> 行优先线性索引.
#[inline]
fn linearize((_, sh, sw): Idx3d, (z, h, w): Idx3d) -> u32 {
    ((z * sh + h) * sw + w) as u32
}

/// 行优先线性索引 -> `Idx3d`.
#[inline]
fn delinearize((_, sh, sw): Idx3d, lin: u32) -> Idx3d {
    let lin = lin as usize;
    (lin / (sh * sw), (lin / sw) % sh, lin % sw)
}
