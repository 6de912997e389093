//! Release policy: turns a commit message and branch into a publish decision

pub mod release_policy;

pub use release_policy::{
    classify_beta, compute_increment, decide_publish, PublishDecision, SkipReason,
};
