//! 运行时错误.

use ndarray_npy::{ReadNpzError, WriteNpzError};

/// 距离测量的运行时错误.
#[derive(Debug)]
pub enum MeasureError {
    /// 功能尚未实现.
    NotImplemented(&'static str),

    /// 对象标识符在体数据中不存在任何体素.
    ///
    /// 这说明体数据与其标识符集合不一致, 违反了输入契约.
    EmptyObject(u32),

    /// 查询的对象标识符不在 `seg_ids` 列表中.
    UnknownObjectId(u32),

    /// 读取 npz 测量档案错误.
    ReadNpz(ReadNpzError),

    /// 写入 npz 测量档案错误.
    WriteNpz(WriteNpzError),

    /// 其他底层 I/O 错误.
    Io(std::io::Error),
}
