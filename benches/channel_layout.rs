use divan::{black_box, Bencher};
use ntt_pipeline::{
    layout::ChannelLayout,
    ntt::{bit_reverse_batch, Residue},
    parameters::{NttParameters, RunConfig, Topology},
};

// (NUM_CH, B)
const TOPOLOGIES: &[(usize, usize)] = &[(4, 8), (4, 16), (8, 8), (16, 32)];

const SAMPLES: usize = 1024;

fn layout(case: &(usize, usize)) -> ChannelLayout {
    let (num_ch, b) = *case;
    let params = NttParameters::new(1024, 12289, b, None).unwrap();
    let topology = Topology::from_memory_layout(num_ch, 32, b).unwrap();
    ChannelLayout::new(&RunConfig::new(params, topology, SAMPLES).unwrap())
}

#[divan::bench(args = TOPOLOGIES)]
fn scatter(bencher: Bencher, case: &(usize, usize)) {
    let layout = layout(case);
    let linear: Vec<Residue> = (0..layout.batch_len() as Residue).collect();
    let mut channels = layout.new_channels();
    bencher.bench_local(|| layout.scatter(black_box(&linear), &mut channels));
}

#[divan::bench(args = TOPOLOGIES)]
fn gather(bencher: Bencher, case: &(usize, usize)) {
    let layout = layout(case);
    let mut channels = layout.new_channels();
    layout.ungather(&(0..layout.batch_len() as Residue).collect::<Vec<_>>(), &mut channels);
    let mut linear = vec![0; layout.batch_len()];
    bencher.bench_local(|| layout.gather(black_box(&channels), &mut linear));
}

#[divan::bench]
fn bit_reverse(bencher: Bencher) {
    let src: Vec<Residue> = (0..SAMPLES as Residue * 1024).collect();
    let mut dst = vec![0; src.len()];
    bencher.bench_local(|| bit_reverse_batch(black_box(&src), &mut dst, 1024));
}

fn main() {
    divan::main();
}
