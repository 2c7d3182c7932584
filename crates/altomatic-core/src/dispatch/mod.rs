//! Batch dispatch of caption work.
//!
//! - **dispatcher**: chunk asset ids into jobs and submit them, with audit
//! - **job**: a batch job and its item-by-item execution
//! - **queue**: the job facility seam and the in-process tokio queue

mod dispatcher;
mod job;
mod queue;

pub use dispatcher::{
    plan_batches, BatchDispatcher, Dispatched, SubmitResponse, ACTION_QUEUE_ALL,
    ACTION_QUEUE_ASSET, ACTION_QUEUE_SELECTION, DEFAULT_CHUNK_SIZE,
};
pub use job::{BatchJob, GenerateJob, JobReport, NoProgress, ProgressSink};
pub use queue::{JobQueue, LocalQueue, ProgressReporter};
