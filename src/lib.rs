#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 计算电镜断层扫描 (EM tomogram) 3D 分割体数据中带标签对象
//! (如细胞器) 之间的空间邻近关系, 并过滤出几何上 "直接" 相连的对象对
//! (即连线不被第三个对象遮挡).
//!
//! 该 crate 目前仅提供 `safe` 接口. 分割体数据本身由外部推理组件产生,
//! 这里只消费带标签的 3D 整数体数据和可选的体素物理分辨率.
//!
//! # 注意
//!
//! 1. 体素值 `0` 一律视为背景; 正整数为对象标识符, 不必连续.
//! 2. 在违反输入契约的情况下, 程序会直接 panic 或返回错误,
//!    而不会导致内存错误. As what Rust promises.
//!
//! # 功能总览
//!
//! ### 距离场引擎 ✅
//!
//! 对每个对象计算一次其补集的精确欧几里得距离变换
//! (Felzenszwalb-Huttenlocher 下包络算法, 支持各向异性体素),
//! 并回传每个体素最近的对象体素坐标. 距离场对所有其他对象复用,
//! 共 O(N) 次变换而非 O(N^2) 次.
//!
//! 实现位于 `src/dist/field.rs`.
//!
//! ### 对象对距离矩阵 ✅
//!
//! 对所有对象并行填充上三角距离矩阵与两张端点表,
//! 并可持久化为 npz 测量档案.
//!
//! 实现位于 `src/dist/matrix.rs`.
//!
//! ### 近邻选择 ✅
//!
//! 按距离升序为每个对象选出至多 k 个最近邻, 以规范对 (较小标识符在前)
//! 的形式给出, 每对至多出现一次.
//!
//! 实现位于 `src/dist/neighbors.rs`.
//!
//! ### 距离线段投影 ✅
//!
//! 将选定对象对与其端点转换为可渲染线段, 支持空间窗口裁剪与整数缩放.
//!
//! 实现位于 `src/dist/lines.rs`.
//!
//! ### 视线遮挡过滤 ✅
//!
//! 以三维 Bresenham 算法栅格化每条线段, 可选对体素路径加粗,
//! 丢弃穿过第三个对象的对象对.
//!
//! 实现位于 `src/dist/sight.rs`.

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

/// 带符号三维体素坐标.
///
/// 线段端点在窗口平移与缩放运算中需要带符号整数语义, 因此用 `i64` 表示.
pub type Vox3d = [i64; 3];

pub mod consts;

/// 3D 分割体数据基础结构.
mod data;

pub use data::SegVolume;

pub mod dist;

pub mod prelude;
