//! 通用常量.

/// 分割体数据中背景体素的标签值.
pub const BACKGROUND: u32 = 0;

/// 体素是否是背景?
#[inline]
pub const fn is_background(p: u32) -> bool {
    matches!(p, BACKGROUND)
}

/// 体素是否属于某个对象 (即非背景)?
#[inline]
pub const fn is_object(p: u32) -> bool {
    !is_background(p)
}
