//! Index mapping between a linear batch and the pipeline's memory channels.
//!
//! Samples are dealt round-robin to the cores: sample `NUM_CORE * i + x` is
//! processed by core `x` during its `i`-th batch step. Inside a core, every
//! depth step `j` moves one memory word of `vec_len` residues per channel.
//!
//! Input and output words group coefficients differently. An input word pairs
//! `vec_len / 2` coefficients from the lower half of the sample with the
//! matching ones from the upper half (the first butterfly stage combines `k`
//! with `k + n/2`), while an output word carries `vec_len` consecutive
//! coefficients of the pipeline's result. Scatter and gather are therefore
//! not inverses of each other; each has its own inverse here (`unscatter`,
//! `ungather`) for use on the accelerator side.

#[cfg(feature = "tracing")]
use tracing::instrument;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::ChannelBuffers;
use crate::{ntt::Residue, parameters::RunConfig};

/// Addressing for one run: transform size, channel topology and batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    n: usize,
    num_core: usize,
    ch_per_core: usize,
    vec_len: usize,
    samples: usize,
}

impl ChannelLayout {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            n: config.params.n,
            num_core: config.topology.num_core,
            ch_per_core: config.topology.ch_per_core,
            vec_len: config.topology.vec_len,
            samples: config.samples,
        }
    }

    pub const fn num_channels(&self) -> usize {
        self.num_core * self.ch_per_core
    }

    pub const fn channel_len(&self) -> usize {
        self.samples * self.n / self.num_channels()
    }

    pub const fn batch_len(&self) -> usize {
        self.samples * self.n
    }

    /// Number of batch steps per core.
    const fn groups(&self) -> usize {
        self.samples / self.num_core
    }

    /// Memory words per channel per sample.
    const fn depth(&self) -> usize {
        self.n / (self.ch_per_core * self.vec_len)
    }

    /// Offset of word `(i, j)` inside a channel buffer.
    #[inline]
    const fn channel_offset(&self, i: usize, j: usize) -> usize {
        i * (self.n / self.ch_per_core) + j * self.vec_len
    }

    /// Allocates output channels of the right shape.
    pub fn new_channels(&self) -> ChannelBuffers {
        ChannelBuffers::new(self.num_channels(), self.channel_len())
    }

    fn check_shapes(&self, linear: &[Residue], channels: &ChannelBuffers) {
        assert_eq!(linear.len(), self.batch_len());
        assert_eq!(channels.num_channels(), self.num_channels());
        assert_eq!(channels.channel_len(), self.channel_len());
    }

    /// Linear batch to channel buffers. Every cell of every channel is written
    /// exactly once.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(channels = self.num_channels())))]
    pub fn scatter(&self, linear: &[Residue], channels: &mut ChannelBuffers) {
        self.check_shapes(linear, channels);
        let fill = |(cc, channel): (usize, &mut [Residue])| self.scatter_channel(cc, linear, channel);
        #[cfg(not(feature = "parallel"))]
        channels.channels_mut().for_each(fill);
        #[cfg(feature = "parallel")]
        channels.par_channels_mut().for_each(fill);
    }

    fn scatter_channel(&self, cc: usize, linear: &[Residue], channel: &mut [Residue]) {
        let (x, y) = (cc / self.ch_per_core, cc % self.ch_per_core);
        let half_vec = self.vec_len / 2;
        let half_n = self.n / 2;
        for i in 0..self.groups() {
            for j in 0..self.depth() {
                for k in 0..half_vec {
                    let idx = self.channel_offset(i, j) + k;
                    let input_base_idx = self.n * (self.num_core * i + x)
                        + half_vec * (self.ch_per_core * j + y)
                        + k;
                    channel[idx] = linear[input_base_idx];
                    channel[idx + half_vec] = linear[input_base_idx + half_n];
                }
            }
        }
    }

    /// Inverse of [`Self::scatter`]: reassembles the linear batch from input channels.
    pub fn unscatter(&self, channels: &ChannelBuffers, linear: &mut [Residue]) {
        self.check_shapes(linear, channels);
        let half_vec = self.vec_len / 2;
        let half_n = self.n / 2;
        let fill = |(s, sample): (usize, &mut [Residue])| {
            let (i, x) = (s / self.num_core, s % self.num_core);
            for j in 0..self.depth() {
                for y in 0..self.ch_per_core {
                    let channel = channels.channel(self.ch_per_core * x + y);
                    for k in 0..half_vec {
                        let idx = self.channel_offset(i, j) + k;
                        let offset = half_vec * (self.ch_per_core * j + y) + k;
                        sample[offset] = channel[idx];
                        sample[offset + half_n] = channel[idx + half_vec];
                    }
                }
            }
        };
        #[cfg(not(feature = "parallel"))]
        linear.chunks_exact_mut(self.n).enumerate().for_each(fill);
        #[cfg(feature = "parallel")]
        linear.par_chunks_exact_mut(self.n).enumerate().for_each(fill);
    }

    /// Output channels to a linear batch, in the order the pipeline produced
    /// the coefficients. Every linear cell is written exactly once.
    #[cfg_attr(feature = "tracing", instrument(skip_all, fields(channels = self.num_channels())))]
    pub fn gather(&self, channels: &ChannelBuffers, linear: &mut [Residue]) {
        self.check_shapes(linear, channels);
        let fill = |(s, sample): (usize, &mut [Residue])| {
            let (i, x) = (s / self.num_core, s % self.num_core);
            for j in 0..self.depth() {
                for y in 0..self.ch_per_core {
                    let channel = channels.channel(self.ch_per_core * x + y);
                    let idx = self.channel_offset(i, j);
                    let out_hw_idx = self.vec_len * (self.ch_per_core * j + y);
                    sample[out_hw_idx..out_hw_idx + self.vec_len]
                        .copy_from_slice(&channel[idx..idx + self.vec_len]);
                }
            }
        };
        #[cfg(not(feature = "parallel"))]
        linear.chunks_exact_mut(self.n).enumerate().for_each(fill);
        #[cfg(feature = "parallel")]
        linear.par_chunks_exact_mut(self.n).enumerate().for_each(fill);
    }

    /// Inverse of [`Self::gather`]: lays a linear batch out the way the
    /// pipeline writes its output channels.
    pub fn ungather(&self, linear: &[Residue], channels: &mut ChannelBuffers) {
        self.check_shapes(linear, channels);
        let fill = |(cc, channel): (usize, &mut [Residue])| {
            let (x, y) = (cc / self.ch_per_core, cc % self.ch_per_core);
            for i in 0..self.groups() {
                for j in 0..self.depth() {
                    let idx = self.channel_offset(i, j);
                    let out_hw_idx =
                        self.n * (self.num_core * i + x) + self.vec_len * (self.ch_per_core * j + y);
                    channel[idx..idx + self.vec_len]
                        .copy_from_slice(&linear[out_hw_idx..out_hw_idx + self.vec_len]);
                }
            }
        };
        #[cfg(not(feature = "parallel"))]
        channels.channels_mut().for_each(fill);
        #[cfg(feature = "parallel")]
        channels.par_channels_mut().for_each(fill);
    }
}
