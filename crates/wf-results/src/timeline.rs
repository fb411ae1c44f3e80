//! All operations' step records in one global index space.
//!
//! Operation `i` owns the contiguous index range starting where operation
//! `i - 1` ended. Each operation contributes its own step 0, so the record at
//! a boundary shows the wellbore as the next operation received it.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use wf_sim::{OperationKind, StepRecord};

use crate::types::OperationSummary;

/// Records of one operation, complete or partial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSegment {
    pub operation_id: String,
    pub label: String,
    pub kind: OperationKind,
    pub records: Vec<StepRecord>,
    /// Set when the operation failed; `records` are what it committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Position of a global index inside its operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineIndex {
    pub operation: usize,
    pub local: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct TimelinePoint<'a> {
    pub index: usize,
    pub operation: usize,
    pub local: usize,
    pub segment: &'a TimelineSegment,
    pub record: &'a StepRecord,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    segments: Vec<TimelineSegment>,
    /// Global index of each segment's first record.
    offsets: Vec<usize>,
    len: usize,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: impl IntoIterator<Item = TimelineSegment>) -> Self {
        let mut timeline = Self::new();
        for segment in segments {
            timeline.push_segment(segment);
        }
        timeline
    }

    pub fn push_segment(&mut self, segment: TimelineSegment) {
        self.offsets.push(self.len);
        self.len += segment.records.len();
        self.segments.push(segment);
    }

    pub fn segments(&self) -> &[TimelineSegment] {
        &self.segments
    }

    /// Total number of records.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Global index range of operation `operation`.
    pub fn operation_range(&self, operation: usize) -> Option<Range<usize>> {
        let start = *self.offsets.get(operation)?;
        Some(start..start + self.segments[operation].records.len())
    }

    pub fn locate(&self, index: usize) -> Option<TimelineIndex> {
        if index >= self.len {
            return None;
        }
        // Last segment starting at or before `index` that is non-empty there.
        let operation = self.offsets.partition_point(|&start| start <= index) - 1;
        let operation = (0..=operation)
            .rev()
            .find(|&op| index < self.offsets[op] + self.segments[op].records.len())?;
        Some(TimelineIndex {
            operation,
            local: index - self.offsets[operation],
        })
    }

    pub fn global_index(&self, operation: usize, local: usize) -> Option<usize> {
        let segment = self.segments.get(operation)?;
        (local < segment.records.len()).then(|| self.offsets[operation] + local)
    }

    pub fn get(&self, index: usize) -> Option<TimelinePoint<'_>> {
        let at = self.locate(index)?;
        let segment = &self.segments[at.operation];
        Some(TimelinePoint {
            index,
            operation: at.operation,
            local: at.local,
            segment,
            record: &segment.records[at.local],
        })
    }

    pub fn points(&self) -> impl Iterator<Item = TimelinePoint<'_>> + '_ {
        self.segments
            .iter()
            .enumerate()
            .flat_map(move |(operation, segment)| {
                let offset = self.offsets[operation];
                segment
                    .records
                    .iter()
                    .enumerate()
                    .map(move |(local, record)| TimelinePoint {
                        index: offset + local,
                        operation,
                        local,
                        segment,
                        record,
                    })
            })
    }

    /// Manifest entries describing each segment's place in the index space.
    pub fn summaries(&self) -> Vec<OperationSummary> {
        self.segments
            .iter()
            .zip(&self.offsets)
            .map(|(segment, &first_index)| OperationSummary {
                operation_id: segment.operation_id.clone(),
                label: segment.label.clone(),
                kind: segment.kind,
                first_index,
                step_count: segment.records.len(),
                error: segment.error.clone(),
            })
            .collect()
    }
}
