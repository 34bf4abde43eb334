use crate::error::DecodeError;
use crate::frame::DecodeOptions;
use crate::processes::{Process, Processes};
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;
use std::path::Path;

/// Resource usage attributes aggregated over processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ProcessAttribute {
    CpuTime,
    SysTime,
    UserTime,
    InBlock,
    OuBlock,
    MajFlt,
    MinFlt,
    MaxRssKb,
}

impl ProcessAttribute {
    pub const ALL: [ProcessAttribute; 8] = [
        ProcessAttribute::CpuTime,
        ProcessAttribute::SysTime,
        ProcessAttribute::UserTime,
        ProcessAttribute::InBlock,
        ProcessAttribute::OuBlock,
        ProcessAttribute::MajFlt,
        ProcessAttribute::MinFlt,
        ProcessAttribute::MaxRssKb,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            ProcessAttribute::CpuTime => "CPU Time",
            ProcessAttribute::SysTime => "Kernel Time",
            ProcessAttribute::UserTime => "User Time",
            ProcessAttribute::InBlock => "Filesystem Input Operations",
            ProcessAttribute::OuBlock => "Filesystem Output Operations",
            ProcessAttribute::MajFlt => "Major page fault count",
            ProcessAttribute::MinFlt => "Minor page fault count",
            ProcessAttribute::MaxRssKb => "Maximum Resident Set Size",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ProcessAttribute::CpuTime | ProcessAttribute::SysTime | ProcessAttribute::UserTime => {
                "s"
            }
            ProcessAttribute::MaxRssKb => "KiB",
            _ => "",
        }
    }

    /// Value of the attribute for a process, durations in seconds.
    pub fn value(&self, process: &Process) -> Option<f64> {
        match self {
            ProcessAttribute::CpuTime => process.cpu_time().map(|d| d.as_secs_f64()),
            ProcessAttribute::SysTime => process.sys_time().map(|d| d.as_secs_f64()),
            ProcessAttribute::UserTime => process.user_time().map(|d| d.as_secs_f64()),
            ProcessAttribute::InBlock => process.in_block().map(|v| v as f64),
            ProcessAttribute::OuBlock => process.ou_block().map(|v| v as f64),
            ProcessAttribute::MajFlt => process.maj_flt().map(|v| v as f64),
            ProcessAttribute::MinFlt => process.min_flt().map(|v| v as f64),
            ProcessAttribute::MaxRssKb => process.max_rss_kb().map(|v| v as f64),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AttributeStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
    pub cumulative: f64,
    pub samples: usize,
}

impl AttributeStats {
    fn from_values(values: &[f64]) -> Self {
        let (min, max) = match values.iter().copied().minmax_by(|a, b| a.total_cmp(b)) {
            MinMaxResult::NoElements => return Self::default(),
            MinMaxResult::OneElement(v) => (v, v),
            MinMaxResult::MinMax(min, max) => (min, max),
        };
        let cumulative: f64 = values.iter().sum();

        Self {
            min,
            mean: cumulative / values.len() as f64,
            max,
            cumulative,
            samples: values.len(),
        }
    }
}

/// Statistics of the resource usage of processes over one or several traces.
///
/// Only processes whose begin and end are both part of their trace are taken into account. A value
/// missing from such a process is skipped rather than counted as zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceStats {
    /// Indexed by `ProcessAttribute as usize`
    attributes: [AttributeStats; 8],
}

impl TraceStats {
    pub fn from_processes<'a, I>(traces: I) -> Self
    where
        I: IntoIterator<Item = &'a Processes>,
    {
        let complete: Vec<&Process> = traces
            .into_iter()
            .flat_map(|processes| processes.all())
            .filter(|process| process.is_complete())
            .collect();

        let attributes = ProcessAttribute::ALL.map(|attr| {
            let values = complete
                .iter()
                .filter_map(|process| attr.value(process))
                .collect::<Vec<_>>();
            AttributeStats::from_values(&values)
        });

        Self { attributes }
    }

    /// Reconstruct every trace independently and aggregate them.
    pub fn from_paths<P: AsRef<Path>>(
        paths: &[P],
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let traces = paths
            .iter()
            .map(|path| Processes::from_path_with_options(path, options))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_processes(&traces))
    }

    pub fn get(&self, attr: ProcessAttribute) -> &AttributeStats {
        &self.attributes[attr as usize]
    }

    /// Statistics of every attribute, in [`ProcessAttribute::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessAttribute, &AttributeStats)> + '_ {
        ProcessAttribute::ALL.into_iter().zip(&self.attributes)
    }
}
