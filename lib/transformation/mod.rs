//! Transformations over the IL.

mod merge_multi_affect;

pub use self::merge_multi_affect::merge_multi_affect;
