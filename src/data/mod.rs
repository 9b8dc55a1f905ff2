//! 带标签的 3D 分割体数据.

use crate::consts::is_object;
use crate::Idx3d;
use ndarray::Array3;
use std::collections::BTreeSet;

/// 带标签的 3D 分割体数据.
///
/// 体素值 `0` 代表背景, 正整数代表对象标识符. 标识符不必连续,
/// 体数据中实际出现的标识符集合就是全部被操作的对象集合.
/// 可选地携带每轴的体素物理分辨率, 用于将体素距离换算为物理距离.
#[derive(Debug, Clone)]
pub struct SegVolume {
    data: Array3<u32>,
    resolution: Option<[f64; 3]>,
}

impl SegVolume {
    /// 以各向同性单位体素初始化.
    #[inline]
    pub fn new(data: Array3<u32>) -> Self {
        Self {
            data,
            resolution: None,
        }
    }

    /// 以给定的体素物理分辨率初始化.
    ///
    /// # 注意
    ///
    /// `resolution` 的三个分量必须都为正数, 否则程序 panic.
    pub fn with_resolution(data: Array3<u32>, resolution: [f64; 3]) -> Self {
        assert!(
            resolution.iter().all(|r| *r > 0.0),
            "体素物理分辨率必须为正数"
        );
        Self {
            data,
            resolution: Some(resolution),
        }
    }

    /// 获取底层体数据.
    #[inline]
    pub fn data(&self) -> &Array3<u32> {
        &self.data
    }

    /// 获取体素物理分辨率. 未指定时视为各向同性单位体素.
    #[inline]
    pub fn resolution(&self) -> [f64; 3] {
        self.resolution.unwrap_or([1.0; 3])
    }

    /// 获取三个维度的形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        let s = self.data.shape();
        (s[0], s[1], s[2])
    }

    /// 获取体素总个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 收集体数据中实际出现的所有对象标识符, 升序排列. 背景不计入.
    pub fn seg_ids(&self) -> Vec<u32> {
        self.data
            .iter()
            .copied()
            .filter(|p| is_object(*p))
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect()
    }

    /// 体数据中是否存在属于对象 `id` 的体素?
    pub fn contains_id(&self, id: u32) -> bool {
        self.data.iter().any(|p| *p == id)
    }

    /// 统计属于对象 `id` 的体素个数.
    pub fn voxel_count(&self, id: u32) -> usize {
        self.data.iter().filter(|p| **p == id).count()
    }
}

#[cfg(test)]
mod tests {
    use super::SegVolume;
    use ndarray::Array3;

    fn labeled_volume() -> SegVolume {
        let mut data = Array3::<u32>::zeros((2, 3, 4));
        data[(0, 0, 0)] = 7;
        data[(0, 1, 2)] = 7;
        data[(1, 2, 3)] = 2;
        data[(1, 0, 0)] = 40;
        SegVolume::new(data)
    }

    /// 标识符收集: 升序, 去重, 允许不连续.
    #[test]
    fn test_seg_ids() {
        let seg = labeled_volume();
        assert_eq!(seg.seg_ids(), vec![2, 7, 40]);
        assert!(seg.contains_id(7));
        assert!(!seg.contains_id(3));
        assert_eq!(seg.voxel_count(7), 2);
        assert_eq!(seg.voxel_count(3), 0);
    }

    /// 未指定分辨率时视为单位体素.
    #[test]
    fn test_default_resolution() {
        let seg = labeled_volume();
        assert_eq!(seg.resolution(), [1.0; 3]);
        assert_eq!(seg.shape(), (2, 3, 4));
        assert_eq!(seg.size(), 24);
    }

    #[test]
    #[should_panic(expected = "体素物理分辨率必须为正数")]
    fn test_invalid_resolution() {
        let _ = SegVolume::with_resolution(Array3::zeros((1, 1, 1)), [1.0, 0.0, 1.0]);
    }
}
