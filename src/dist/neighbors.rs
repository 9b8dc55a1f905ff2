//! 近邻选择.

use crate::dist::DistanceRecord;
use binary_heap_plus::BinaryHeap;
use ordered_float::NotNan;

/// 规范对象对: 两个互异对象标识符的无序对, 始终以较小者在前表示.
///
/// 以该显式类型替代 "对角线/下三角置为无穷大" 的矩阵技巧作为正确性机制:
/// 只要 `Pair` 存在, `a < b` 就成立.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Pair {
    a: u32,
    b: u32,
}

impl Pair {
    /// 由两个互异的对象标识符构建规范对.
    ///
    /// # 注意
    ///
    /// 两个标识符相等时程序 panic.
    pub fn new(x: u32, y: u32) -> Self {
        assert_ne!(x, y, "规范对的两个标识符必须互异");
        if x < y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// 较小的对象标识符.
    #[inline]
    pub fn a(&self) -> u32 {
        self.a
    }

    /// 较大的对象标识符.
    #[inline]
    pub fn b(&self) -> u32 {
        self.b
    }
}

/// 为每个对象选出距离最近的至多 `n_neighbors` 个其他对象, 以规范对形式给出.
///
/// 对角线与下三角被视为无穷大, 因此不会出现自身对, 对称的重复对也只会
/// 被给出一次. 每个对象的邻居按距离升序排列; 有限距离的候选不足
/// `n_neighbors` 个时只返回有限者.
pub fn extract_nearest_neighbors(record: &DistanceRecord, n_neighbors: usize) -> Vec<Pair> {
    let n = record.len();
    let mut pairs = Vec::new();

    for i in 0..n {
        // 大小不超过 k 的大顶堆, 堆顶是当前候选中的最远者.
        let mut heap =
            BinaryHeap::with_capacity_by_key(n_neighbors + 1, |e: &(NotNan<f64>, usize)| e.0);

        for j in (i + 1)..n {
            let d = record.distances[(i, j)];
            if !d.is_finite() {
                continue;
            }
            heap.push((NotNan::<f64>::new(d).unwrap(), j));
            if heap.len() > n_neighbors {
                heap.pop();
            }
        }

        // 大顶堆关于比较器的升序输出即距离升序.
        for (_, j) in heap.into_sorted_vec() {
            pairs.push(Pair::new(record.seg_ids[i], record.seg_ids[j]));
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::{extract_nearest_neighbors, Pair};
    use crate::dist::DistanceRecord;
    use ndarray::{Array2, Array3};
    use std::collections::BTreeSet;

    /// 手工构造一个只有上三角有意义的档案.
    fn record_from_upper(seg_ids: Vec<u32>, upper: &[(usize, usize, f64)]) -> DistanceRecord {
        let n = seg_ids.len();
        let mut distances = Array2::<f64>::zeros((n, n));
        for &(i, j, d) in upper {
            assert!(i < j);
            distances[(i, j)] = d;
        }
        DistanceRecord {
            distances,
            endpoints1: Array3::zeros((n, n, 3)),
            endpoints2: Array3::zeros((n, n, 3)),
            seg_ids,
        }
    }

    #[test]
    fn test_pair_is_canonical() {
        let p = Pair::new(9, 4);
        assert_eq!((p.a(), p.b()), (4, 9));
    }

    #[test]
    #[should_panic(expected = "规范对的两个标识符必须互异")]
    fn test_pair_rejects_self() {
        let _ = Pair::new(3, 3);
    }

    /// 每个对象至多 k 个邻居, 升序, 且只考虑 j > i 的候选.
    #[test]
    fn test_k_nearest() {
        let record = record_from_upper(
            vec![1, 2, 3],
            &[(0, 1, 8.0), (0, 2, 3.0), (1, 2, 3.0)],
        );

        let pairs = extract_nearest_neighbors(&record, 1);
        assert_eq!(pairs, vec![Pair::new(1, 3), Pair::new(2, 3)]);

        let pairs = extract_nearest_neighbors(&record, 2);
        assert_eq!(
            pairs,
            vec![Pair::new(1, 3), Pair::new(1, 2), Pair::new(2, 3)]
        );
    }

    /// k 大于候选个数时不重复, 不含自身对, 每个规范对至多一次.
    #[test]
    fn test_no_duplicates() {
        let record = record_from_upper(
            vec![5, 6, 7, 9],
            &[
                (0, 1, 1.0),
                (0, 2, 2.0),
                (0, 3, 3.0),
                (1, 2, 4.0),
                (1, 3, 5.0),
                (2, 3, 6.0),
            ],
        );

        let pairs = extract_nearest_neighbors(&record, 100);
        assert_eq!(pairs.len(), 6);
        let unique: BTreeSet<Pair> = pairs.iter().copied().collect();
        assert_eq!(unique.len(), 6);
        assert!(pairs.iter().all(|p| p.a() < p.b()));
    }

    /// 无穷大条目 (及 k = 0) 不产生任何对.
    #[test]
    fn test_infinite_and_zero_k() {
        let mut record = record_from_upper(vec![1, 2], &[]);
        record.distances[(0, 1)] = f64::INFINITY;
        assert!(extract_nearest_neighbors(&record, 3).is_empty());

        let record = record_from_upper(vec![1, 2], &[(0, 1, 2.0)]);
        assert!(extract_nearest_neighbors(&record, 0).is_empty());
    }
}
