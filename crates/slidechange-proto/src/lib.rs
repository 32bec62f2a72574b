//! Protobuf messages for change detection reports.
//!
//! Reports are written as a stream of length-delimited `ChangeReport`
//! messages, one per analyzed video.

pub mod proto {
    /// Where the analyzed frames came from.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct SourceMetadata {
        #[prost(string, tag = "1")]
        pub file_path: ::prost::alloc::string::String,
        /// Frame rate of the source video.
        #[prost(double, tag = "2")]
        pub fps: f64,
        /// Temporal subsampling factor applied when frames were extracted.
        #[prost(uint32, tag = "3")]
        pub fps_factor: u32,
        /// Number of frames that were analyzed.
        #[prost(uint32, tag = "4")]
        pub frame_count: u32,
    }

    /// One detected peak and the frame its change run started on.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Detection {
        #[prost(uint32, tag = "1")]
        pub peak_frame: u32,
        #[prost(uint32, tag = "2")]
        pub start_frame: u32,
        /// Unset when an earlier peak already reported the same start frame.
        #[prost(double, optional, tag = "3")]
        pub start_seconds: ::core::option::Option<f64>,
    }

    /// Detected timestamps matched against one proposed time.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ProposedMatch {
        #[prost(double, tag = "1")]
        pub proposed_seconds: f64,
        #[prost(double, repeated, tag = "2")]
        pub matched_seconds: ::prost::alloc::vec::Vec<f64>,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Validation {
        #[prost(double, tag = "1")]
        pub tolerance_seconds: f64,
        #[prost(message, repeated, tag = "2")]
        pub matches: ::prost::alloc::vec::Vec<ProposedMatch>,
        #[prost(bool, tag = "3")]
        pub passed: bool,
    }

    /// Change statistics between a frame and the one before it.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct FrameDiff {
        /// Index of the later frame of the pair.
        #[prost(uint32, tag = "1")]
        pub frame: u32,
        #[prost(uint64, tag = "2")]
        pub total_change: u64,
        #[prost(double, tag = "3")]
        pub avg_change: f64,
        #[prost(double, tag = "4")]
        pub subset_avg_change: f64,
    }

    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ChangeReport {
        #[prost(message, optional, tag = "1")]
        pub source: ::core::option::Option<SourceMetadata>,
        /// Detections in peak order, duplicates included.
        #[prost(message, repeated, tag = "2")]
        pub detections: ::prost::alloc::vec::Vec<Detection>,
        /// Distinct change start times in seconds, ascending.
        #[prost(double, repeated, tag = "3")]
        pub start_times: ::prost::alloc::vec::Vec<f64>,
        #[prost(message, optional, tag = "4")]
        pub validation: ::core::option::Option<Validation>,
        /// One entry per analyzed frame after the first, in frame order.
        #[prost(message, repeated, tag = "5")]
        pub diffs: ::prost::alloc::vec::Vec<FrameDiff>,
    }
}
