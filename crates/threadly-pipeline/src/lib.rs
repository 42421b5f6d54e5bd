// SPDX-FileCopyrightText: 2026 Threadly Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mention processing pipeline.
//!
//! Inbound mentions pass an admission gate that records each platform post
//! once, then synchronous account policy checks. Mentions that pass get a
//! detached continuation that classifies them, composes a reply from a
//! template or the AI generator, and delivers it. The reconciliation puller
//! feeds missed replies through the same path.

pub mod admission;
pub mod composer;
pub mod dispatcher;
pub mod policy;
pub mod processor;
pub mod reconcile;
pub mod service;

pub use admission::{Admission, MentionCandidate};
pub use composer::{ComposedReply, ReplyComposer};
pub use policy::SkipReason;
pub use processor::{MentionProcessor, Outcome};
pub use reconcile::PullReport;
pub use service::{MentionPipeline, PipelineDeps, PipelineSettings, SubmitOutcome};
