//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Vox3d};

pub use crate::consts::{is_background, is_object, BACKGROUND};

pub use crate::data::SegVolume;

pub use crate::dist::{
    compute_boundary_distances, create_distance_lines, extract_nearest_neighbors,
    filter_blocked_distance_lines, measure_pairwise_object_distances, BoundingBox, DistanceField,
    DistanceLine, DistanceRecord, DistanceType, FilterStats, MeasureError, MeasureResult, Pair,
    PairSelection,
};
