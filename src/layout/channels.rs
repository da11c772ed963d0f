//! A set of equally sized channel buffers backed by one allocation.

use std::ops::{Index, IndexMut};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::ntt::Residue;

/// `num_channels` buffers of `channel_len` residues each.
///
/// The invariant this data structure maintains is that `data` holds the
/// channels back to back, so channel `cc` occupies
/// `cc * channel_len..(cc + 1) * channel_len`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelBuffers {
    data: Vec<Residue>,
    num_channels: usize,
    channel_len: usize,
}

impl ChannelBuffers {
    /// Zero-filled buffers.
    pub fn new(num_channels: usize, channel_len: usize) -> Self {
        assert!(num_channels > 0);
        Self {
            data: vec![0; num_channels * channel_len],
            num_channels,
            channel_len,
        }
    }

    /// Wraps a contiguous slab of `num_channels` concatenated channels.
    pub fn from_flat(data: Vec<Residue>, num_channels: usize) -> Self {
        assert!(num_channels > 0);
        assert_eq!(data.len() % num_channels, 0);
        let channel_len = data.len() / num_channels;
        Self {
            data,
            num_channels,
            channel_len,
        }
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    pub fn channel_len(&self) -> usize {
        self.channel_len
    }

    pub fn channel(&self, cc: usize) -> &[Residue] {
        assert!(cc < self.num_channels);
        &self.data[cc * self.channel_len..(cc + 1) * self.channel_len]
    }

    pub fn channel_mut(&mut self, cc: usize) -> &mut [Residue] {
        assert!(cc < self.num_channels);
        &mut self.data[cc * self.channel_len..(cc + 1) * self.channel_len]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[Residue]> {
        self.data.chunks_exact(self.channel_len.max(1))
    }

    /// Every channel with its index, for writers that fill channels independently.
    #[cfg(feature = "parallel")]
    pub fn par_channels_mut(&mut self) -> impl IndexedParallelIterator<Item = (usize, &mut [Residue])> {
        self.data
            .par_chunks_exact_mut(self.channel_len.max(1))
            .enumerate()
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = (usize, &mut [Residue])> {
        self.data
            .chunks_exact_mut(self.channel_len.max(1))
            .enumerate()
    }

    pub fn as_flat(&self) -> &[Residue] {
        &self.data
    }

    pub fn into_flat(self) -> Vec<Residue> {
        self.data
    }

    /// Checks that both sets have the same number and length of channels.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.num_channels == other.num_channels && self.channel_len == other.channel_len
    }
}

impl Index<(usize, usize)> for ChannelBuffers {
    type Output = Residue;

    fn index(&self, (cc, idx): (usize, usize)) -> &Residue {
        &self.channel(cc)[idx]
    }
}

impl IndexMut<(usize, usize)> for ChannelBuffers {
    fn index_mut(&mut self, (cc, idx): (usize, usize)) -> &mut Residue {
        &mut self.channel_mut(cc)[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_views() {
        let mut buffers = ChannelBuffers::from_flat((0..12).collect(), 3);
        assert_eq!(buffers.num_channels(), 3);
        assert_eq!(buffers.channel_len(), 4);
        assert_eq!(buffers.channel(1), &[4, 5, 6, 7]);
        assert_eq!(buffers[(2, 3)], 11);

        buffers[(0, 1)] = 42;
        buffers.channel_mut(2)[0] = 7;
        assert_eq!(buffers.channel(0), &[0, 42, 2, 3]);
        assert_eq!(buffers.channel(2), &[7, 9, 10, 11]);
        assert_eq!(buffers.channels().count(), 3);
    }

    #[test]
    fn test_channels_mut_indices() {
        let mut buffers = ChannelBuffers::new(4, 2);
        for (cc, channel) in buffers.channels_mut() {
            channel.fill(cc as Residue);
        }
        assert_eq!(buffers.into_flat(), vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_same_shape() {
        let a = ChannelBuffers::new(4, 8);
        assert!(a.same_shape(&ChannelBuffers::new(4, 8)));
        assert!(!a.same_shape(&ChannelBuffers::new(2, 16)));
    }

    #[test]
    #[should_panic]
    fn test_channel_out_of_range() {
        let buffers = ChannelBuffers::new(2, 4);
        let _ = buffers.channel(2);
    }
}
