//! Channel-interleaved memory layout of the pipeline.

mod channels;
mod mapper;

pub use self::{channels::ChannelBuffers, mapper::ChannelLayout};
