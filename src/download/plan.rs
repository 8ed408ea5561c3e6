use std::collections::Bound;
use std::num::{NonZeroU64, NonZeroU8};
use std::ops::RangeBounds;
use std::path::{Path, PathBuf};

/// Inclusive byte range `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u64 {
        (self.end - self.start) + 1
    }

    /// `None` only when `start > end`.
    pub fn to_range_header(&self) -> Option<headers::Range> {
        headers::Range::bytes(self).ok()
    }
}

/// 为 ChunkRange 实现范围 trait: start..=end
impl<'a> RangeBounds<u64> for &'a ChunkRange {
    fn start_bound(&self) -> Bound<&u64> {
        Bound::Included(&self.start)
    }

    fn end_bound(&self) -> Bound<&u64> {
        Bound::Included(&self.end)
    }
}

/// One range of the resource and the store its bytes are written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub range: ChunkRange,
    pub store_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub total_size: u64,
    pub segments: Vec<Segment>,
}

impl RangePlan {
    /// Splits `total_size` bytes into `concurrency` segments stored next to `target`.
    pub fn new(target: &Path, total_size: NonZeroU64, concurrency: NonZeroU8) -> Self {
        let segments = split_ranges(total_size, concurrency)
            .into_iter()
            .enumerate()
            .map(|(index, range)| Segment {
                index,
                range,
                store_path: segment_store_path(target, index),
            })
            .collect();

        Self {
            total_size: total_size.get(),
            segments,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn store_paths(&self) -> impl Iterator<Item = &Path> {
        self.segments.iter().map(|segment| segment.store_path.as_path())
    }
}

/// Contiguous ranges covering `[0, total_size - 1]`; the last one takes the remainder.
///
/// A resource smaller than `concurrency` gets one single-byte range per byte.
pub fn split_ranges(total_size: NonZeroU64, concurrency: NonZeroU8) -> Vec<ChunkRange> {
    let total_size = total_size.get();
    let count = (concurrency.get() as u64).min(total_size);
    let chunk_size = total_size / count;

    (0..count)
        .map(|i| {
            let start = i * chunk_size;
            let end = if i == count - 1 {
                total_size - 1
            } else {
                (i + 1) * chunk_size - 1
            };
            ChunkRange::new(start, end)
        })
        .collect()
}

/// `<target>.<index>`
pub fn segment_store_path(target: &Path, index: usize) -> PathBuf {
    let mut name = target.as_os_str().to_owned();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Whether `file_name` looks like a segment store of `target_name`.
pub fn is_segment_store_name(target_name: &str, file_name: &str) -> bool {
    file_name
        .strip_prefix(target_name)
        .and_then(|rest| rest.strip_prefix('.'))
        .map(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}
