mod cursor;
mod intermediary;
mod kway;
mod non_sorting;
mod sorting;

pub use cursor::BatchCursor;
pub use intermediary::IntermediaryMergeSort;
pub use kway::KWayMerger;
pub use non_sorting::NonSortingMerge;
pub use sorting::SortingMerge;
