//! 对象对距离矩阵构建与测量档案.
//!
//! 每个对象是一个独立的工作单元: 计算一次自己的距离场, 然后对所有更高下标
//! 的对象扫描掩膜最小值, 填充矩阵中属于自己的那一行. 各行由各自的工作单元
//! 排他写入, 因此并行执行无需加锁, 结果与完成顺序无关.

use crate::dist::{DistanceField, MeasureError, MeasureResult};
use crate::{Idx3d, SegVolume};
use log::debug;
use ndarray::{Array2, Array3, ArrayViewMut1, ArrayViewMut2, Axis, Ix1, Ix2, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::fs::File;
use std::num::NonZeroUsize;
use std::path::Path;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
    }
}

/// 对象间距离的定义方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DistanceType {
    /// 两对象边界体素间的最小欧几里得距离.
    Boundary,

    /// 两对象质心间的欧几里得距离. 尚未实现.
    Centroid,
}

/// 测量档案.
///
/// 持久化后足以在不重算距离变换的前提下重建所有对象对与距离线段.
/// 一经写出即视为不可变.
#[derive(Debug, Clone)]
pub struct DistanceRecord {
    /// N×N 距离矩阵. 只有上三角 (i < j) 的条目有意义.
    pub distances: Array2<f64>,

    /// 每个 (i, j) 在对象 i 上实现最小距离的端点体素坐标.
    pub endpoints1: Array3<i64>,

    /// 每个 (i, j) 在对象 j 上实现最小距离的端点体素坐标.
    pub endpoints2: Array3<i64>,

    /// 对象标识符列表. 其顺序定义了矩阵下标与标识符之间的映射.
    pub seg_ids: Vec<u32>,
}

impl DistanceRecord {
    /// 对象个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.seg_ids.len()
    }

    /// 档案是否不含任何对象?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.seg_ids.is_empty()
    }

    /// 标识符 `id` 在 `seg_ids` 中的下标.
    ///
    /// # 返回值
    ///
    /// 标识符不存在时返回 `Err(MeasureError::UnknownObjectId)`, 而不是静默跳过.
    pub fn index_of(&self, id: u32) -> MeasureResult<usize> {
        self.seg_ids
            .iter()
            .position(|&s| s == id)
            .ok_or(MeasureError::UnknownObjectId(id))
    }

    /// 将档案以 npz 格式写入 `path`.
    ///
    /// 四个数组分别命名为 `distances`, `endpoints1`, `endpoints2`, `seg_ids`.
    /// 文件句柄在所有退出路径上都会被释放.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MeasureResult<()> {
        let file = File::create(path.as_ref()).map_err(MeasureError::Io)?;
        let mut npz = NpzWriter::new_compressed(file);
        npz.add_array("distances", &self.distances)
            .map_err(MeasureError::WriteNpz)?;
        npz.add_array("endpoints1", &self.endpoints1)
            .map_err(MeasureError::WriteNpz)?;
        npz.add_array("endpoints2", &self.endpoints2)
            .map_err(MeasureError::WriteNpz)?;
        npz.add_array("seg_ids", &ndarray::aview1(&self.seg_ids))
            .map_err(MeasureError::WriteNpz)?;
        npz.finish().map_err(MeasureError::WriteNpz)?;
        Ok(())
    }

    /// 从 `path` 读回 npz 档案. 写出后再读回可逐位复原全部四个数组.
    pub fn load<P: AsRef<Path>>(path: P) -> MeasureResult<Self> {
        let file = File::open(path.as_ref()).map_err(MeasureError::Io)?;
        let mut npz = NpzReader::new(file).map_err(MeasureError::ReadNpz)?;

        let distances = npz
            .by_name::<OwnedRepr<f64>, Ix2>("distances")
            .map_err(MeasureError::ReadNpz)?;
        let endpoints1 = npz
            .by_name::<OwnedRepr<i64>, Ix3>("endpoints1")
            .map_err(MeasureError::ReadNpz)?;
        let endpoints2 = npz
            .by_name::<OwnedRepr<i64>, Ix3>("endpoints2")
            .map_err(MeasureError::ReadNpz)?;
        let seg_ids = npz
            .by_name::<OwnedRepr<u32>, Ix1>("seg_ids")
            .map_err(MeasureError::ReadNpz)?
            .to_vec();

        Ok(Self {
            distances,
            endpoints1,
            endpoints2,
            seg_ids,
        })
    }
}

/// 计算所有对象两两之间的距离, 产出测量档案.
///
/// `n_threads` 为并行工作线程数, `None` 时使用主机处理器个数.
/// 指定 `save_path` 时, 档案会同时以 npz 格式持久化到该路径.
///
/// # 返回值
///
/// `distance_type` 为 [`DistanceType::Centroid`] 时返回
/// `Err(MeasureError::NotImplemented)`, 绝不静默退化为边界距离.
pub fn measure_pairwise_object_distances(
    seg: &SegVolume,
    distance_type: DistanceType,
    n_threads: Option<NonZeroUsize>,
    save_path: Option<&Path>,
) -> MeasureResult<DistanceRecord> {
    let record = match distance_type {
        DistanceType::Boundary => compute_boundary_distances(seg, n_threads)?,
        DistanceType::Centroid => {
            return Err(MeasureError::NotImplemented("centroid 距离尚未实现"));
        }
    };

    if let Some(path) = save_path {
        record.save(path)?;
    }
    Ok(record)
}

/// 计算所有对象两两之间的边界距离与实现最小距离的端点对.
///
/// 对每个对象下标 i 只计算一次距离场, 随后扫描所有 j > i 填充上三角.
/// 任一工作单元出错都会使整批计算失败, 而不是静默跳过一行.
pub fn compute_boundary_distances(
    seg: &SegVolume,
    n_threads: Option<NonZeroUsize>,
) -> MeasureResult<DistanceRecord> {
    let seg_ids = seg.seg_ids();
    let n = seg_ids.len();

    let mut distances = Array2::<f64>::zeros((n, n));
    let mut endpoints1 = Array3::<i64>::zeros((n, n, 3));
    let mut endpoints2 = Array3::<i64>::zeros((n, n, 3));

    fill_rows(
        seg,
        &seg_ids,
        &mut distances,
        &mut endpoints1,
        &mut endpoints2,
        n_threads,
    )?;

    Ok(DistanceRecord {
        distances,
        endpoints1,
        endpoints2,
        seg_ids,
    })
}

/// 填充对象下标 i 对应的矩阵行: 对每个 j > i 求最小边界距离与端点对.
fn fill_row(
    seg: &SegVolume,
    seg_ids: &[u32],
    i: usize,
    mut dist_row: ArrayViewMut1<'_, f64>,
    mut ep1_row: ArrayViewMut2<'_, i64>,
    mut ep2_row: ArrayViewMut2<'_, i64>,
) -> MeasureResult<()> {
    let seg_id = seg_ids[i];
    let field = DistanceField::compute(seg, seg_id)?;
    debug!("对象 {seg_id} 的距离场计算完成");

    for (j, &ngb_id) in seg_ids.iter().enumerate().skip(i + 1) {
        let (dist, on_i, on_j) = field.closest_to_object(seg, ngb_id)?;
        dist_row[j] = dist;
        write_endpoint(ep1_row.row_mut(j), on_i);
        write_endpoint(ep2_row.row_mut(j), on_j);
    }
    Ok(())
}

/// 将体素坐标写入端点表的一行.
fn write_endpoint(mut row: ArrayViewMut1<'_, i64>, (z, h, w): Idx3d) {
    row[0] = z as i64;
    row[1] = h as i64;
    row[2] = w as i64;
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 借助 `rayon`, 以每个对象为独立工作单元并行填充所有矩阵行.
        ///
        /// 三个输出数组按第 0 轴拆分后按行配对, 每行只属于一个工作单元.
        fn fill_rows(
            seg: &SegVolume,
            seg_ids: &[u32],
            distances: &mut Array2<f64>,
            endpoints1: &mut Array3<i64>,
            endpoints2: &mut Array3<i64>,
            n_threads: Option<NonZeroUsize>,
        ) -> MeasureResult<()> {
            let mut run = move || {
                distances
                    .axis_iter_mut(Axis(0))
                    .into_par_iter()
                    .zip(endpoints1.axis_iter_mut(Axis(0)).into_par_iter())
                    .zip(endpoints2.axis_iter_mut(Axis(0)).into_par_iter())
                    .enumerate()
                    .try_for_each(|(i, ((dist_row, ep1_row), ep2_row))| {
                        fill_row(seg, seg_ids, i, dist_row, ep1_row, ep2_row)
                    })
            };

            match n_threads {
                None => run(),
                Some(workers) => rayon::ThreadPoolBuilder::new()
                    .num_threads(workers.get())
                    .build()
                    .expect("创建 rayon 线程池失败")
                    .install(run),
            }
        }
    } else {
        /// 串行填充所有矩阵行. `n_threads` 在该编译模式下被忽略.
        fn fill_rows(
            seg: &SegVolume,
            seg_ids: &[u32],
            distances: &mut Array2<f64>,
            endpoints1: &mut Array3<i64>,
            endpoints2: &mut Array3<i64>,
            _n_threads: Option<NonZeroUsize>,
        ) -> MeasureResult<()> {
            for i in 0..seg_ids.len() {
                fill_row(
                    seg,
                    seg_ids,
                    i,
                    distances.row_mut(i),
                    endpoints1.index_axis_mut(Axis(0), i),
                    endpoints2.index_axis_mut(Axis(0), i),
                )?;
            }
            Ok(())
        }
    }
}
