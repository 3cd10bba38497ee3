//! Route selection and the composed route-and-send operation

pub mod pipeline;
pub mod selector;

pub use pipeline::RoutePipeline;
pub use selector::{RouteDecision, SelectionPolicy};
