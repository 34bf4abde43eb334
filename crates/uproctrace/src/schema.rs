//! Hand-written prost types matching the `uproctrace.proto` (proto2) definitions written by the
//! preload library.
//!
//! These are the wire representation only; the rest of the crate works on [`crate::TraceEvent`].

/// Seconds and optional nanoseconds, used both for points in time and for durations.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Timespec {
    #[prost(int64, required, tag = "1")]
    pub sec: i64,
    #[prost(int32, optional, tag = "2")]
    pub nsec: ::core::option::Option<i32>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Stringlist {
    #[prost(string, repeated, tag = "1")]
    pub s: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcBegin {
    #[prost(int32, required, tag = "1")]
    pub pid: i32,
    #[prost(int32, optional, tag = "2")]
    pub ppid: ::core::option::Option<i32>,
    #[prost(string, optional, tag = "3")]
    pub exe: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, optional, tag = "4")]
    pub cwd: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "5")]
    pub cmdline: ::core::option::Option<Stringlist>,
    #[prost(message, optional, tag = "6")]
    pub environ: ::core::option::Option<Stringlist>,
}

/// Resource usage of a process, as reported by `getrusage` when it exits.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcEnd {
    #[prost(int32, required, tag = "1")]
    pub pid: i32,
    #[prost(message, optional, tag = "2")]
    pub cpu_time: ::core::option::Option<Timespec>,
    #[prost(message, optional, tag = "3")]
    pub user_time: ::core::option::Option<Timespec>,
    #[prost(message, optional, tag = "4")]
    pub sys_time: ::core::option::Option<Timespec>,
    #[prost(uint64, optional, tag = "5")]
    pub max_rss_kb: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "6")]
    pub min_flt: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "7")]
    pub maj_flt: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "8")]
    pub in_block: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "9")]
    pub ou_block: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "10")]
    pub n_v_csw: ::core::option::Option<u64>,
    #[prost(uint64, optional, tag = "11")]
    pub n_iv_csw: ::core::option::Option<u64>,
}

/// One frame payload. The timestamp is mandatory for the producer, but is kept optional here so
/// a missing one is reported as a malformed event instead of silently defaulting to the epoch.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Event {
    #[prost(message, optional, tag = "1")]
    pub timestamp: ::core::option::Option<Timespec>,
    #[prost(message, optional, tag = "2")]
    pub proc_begin: ::core::option::Option<ProcBegin>,
    #[prost(message, optional, tag = "3")]
    pub proc_end: ::core::option::Option<ProcEnd>,
}
