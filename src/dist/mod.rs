//! 对象间距测量子系统.
//!
//! 数据流: 距离场引擎 ([`DistanceField`]) -> 距离矩阵构建
//! ([`measure_pairwise_object_distances`]) -> 近邻选择
//! ([`extract_nearest_neighbors`]) / 线段投影 ([`create_distance_lines`])
//! -> 视线遮挡过滤 ([`filter_blocked_distance_lines`]).
//!
//! 距离矩阵与端点表对一个分割体数据只需计算一次, 可持久化为
//! [`DistanceRecord`]; 对象对与距离线段都可以从档案按需重建,
//! 无需重算距离变换.

mod error;
mod field;
mod lines;
mod matrix;
mod neighbors;
mod sight;

pub use error::MeasureError;
pub use field::DistanceField;
pub use lines::{create_distance_lines, BoundingBox, DistanceLine, PairSelection};
pub use matrix::{
    compute_boundary_distances, measure_pairwise_object_distances, DistanceRecord, DistanceType,
};
pub use neighbors::{extract_nearest_neighbors, Pair};
pub use sight::{filter_blocked_distance_lines, FilterStats};

/// 距离测量的运行时结果.
pub type MeasureResult<T> = Result<T, MeasureError>;
