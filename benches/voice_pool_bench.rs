use criterion::{black_box, criterion_group, criterion_main, Criterion};

use howler::{EngineParams, NoteSet, SourceSample, VoicePool};

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK: usize = 512;

fn prepared_pool(active_notes: &[u8]) -> VoicePool {
    let mut pool = VoicePool::new(SAMPLE_RATE);
    pool.prepare(SAMPLE_RATE);
    pool.add_sound(
        SourceSample::new(
            "tone",
            &[vec![0.33; 65_536]],
            SAMPLE_RATE,
            NoteSet::from_range(0..=127),
            60,
            true,
            0.001,
            0.05,
        )
        .into_shared(),
    );
    pool.update_parameters(&EngineParams {
        cutoff: 4_000.0,
        resonance: 0.3,
        lfo_depth: 0.5,
        ..EngineParams::default()
    });
    for &note in active_notes {
        pool.note_on(note, 100);
    }
    pool
}

fn bench_render_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_block_512");

    for &voices in &[1usize, 4, 16] {
        let notes: Vec<u8> = (0..voices as u8).map(|i| 48 + i * 3).collect();
        let mut pool = prepared_pool(&notes);
        let mut left = vec![0.0f32; BLOCK];
        let mut right = vec![0.0f32; BLOCK];

        group.bench_function(format!("{voices}_voices"), |b| {
            b.iter(|| {
                left.fill(0.0);
                right.fill(0.0);
                pool.render_block(black_box(&mut left), black_box(&mut right), &[]);
                black_box(left[0]);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render_block);
criterion_main!(benches);
