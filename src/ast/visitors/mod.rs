//! Ready-to-use tree visitors.

pub mod collecting;
pub mod span;

pub use collecting::{CollectingVisitor, erroneous_nodes};
pub use span::{ContainmentChecker, ContainmentViolation, SpanCollector};
