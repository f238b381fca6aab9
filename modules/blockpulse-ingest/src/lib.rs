pub mod guard;
pub mod normalize;
pub mod pipeline;
pub mod sink;
pub mod source;
