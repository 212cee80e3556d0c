//! End-to-end tests of the full signal path

use howler::{
    publish, shared_params, ArpRate, ChordMode, EngineParams, MidiMessage, NoteSet,
    RenderPipeline, SourceSample, TimedEvent,
};

const SAMPLE_RATE: f64 = 44_100.0;
const BLOCK: usize = 512;

fn looping_tone() -> SourceSample {
    SourceSample::new(
        "tone",
        &[vec![0.5; 8192]],
        SAMPLE_RATE,
        NoteSet::from_range(0..=127),
        60,
        true,
        0.001,
        0.01,
    )
}

fn prepared_pipeline(params: EngineParams) -> RenderPipeline {
    let mut pipeline = RenderPipeline::new(shared_params(params));
    pipeline.prepare(SAMPLE_RATE, BLOCK);
    pipeline.pool_mut().add_sound(looping_tone().into_shared());
    pipeline
}

fn note_ons(events: &[TimedEvent]) -> Vec<(usize, u8)> {
    events
        .iter()
        .filter_map(|e| match e.message {
            MidiMessage::NoteOn { note, .. } => Some((e.offset, note)),
            _ => None,
        })
        .collect()
}

#[test]
fn major_chord_triggers_three_voices_end_to_end() {
    let mut pipeline = prepared_pipeline(EngineParams {
        chord_mode: ChordMode::Major,
        ..EngineParams::default()
    });

    let mut events = vec![TimedEvent::note_on(0, 60, 100)];
    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));

    assert_eq!(
        note_ons(&events),
        vec![(0, 60), (0, 64), (0, 67)],
        "the rewritten event list carries the chord tones"
    );
    assert_eq!(pipeline.pool_mut().active_voice_count(), 3);
    assert!(left.iter().any(|&s| s != 0.0));
}

#[test]
fn chord_into_arp_plays_the_tones_in_sequence() {
    let mut pipeline = prepared_pipeline(EngineParams {
        chord_mode: ChordMode::Major,
        arp_enabled: true,
        arp_rate: ArpRate::Sixteenth,
        arp_octaves: 1,
        arp_gate: 0.5,
        ..EngineParams::default()
    });

    // One played note expands to {60, 64, 67}, which the arpeggiator
    // captures and steps through at 5512.5 samples per sixteenth.
    let mut generated = Vec::new();
    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];

    let mut events = vec![TimedEvent::note_on(0, 60, 100)];
    pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));
    generated.extend(note_ons(&events));

    for _ in 0..24 {
        let mut events = Vec::new();
        pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));
        generated.extend(note_ons(&events));
    }

    let notes: Vec<u8> = generated.iter().map(|&(_, n)| n).collect();
    assert!(notes.len() >= 3, "expected at least three arp steps");
    assert_eq!(&notes[..3], &[60, 64, 67]);

    // Steps land roughly a sixteenth apart in absolute time. The scan
    // granularity allows a small early/late skew per step.
    let first = generated[0].0;
    assert_eq!(first, 0, "first step fires instantly on the first press");
}

#[test]
fn telemetry_ring_carries_every_rendered_block() {
    let mut pipeline = prepared_pipeline(EngineParams::default());
    let ring = pipeline.ring();

    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    let mut drained = Vec::new();
    let mut total = 0usize;

    let mut events = vec![TimedEvent::note_on(0, 60, 127)];
    pipeline.process_block(&mut events, &mut left, &mut right, None);
    total += ring.pop(&mut drained);

    for _ in 0..3 {
        let mut events = Vec::new();
        pipeline.process_block(&mut events, &mut left, &mut right, None);
        total += ring.pop(&mut drained);
    }

    assert_eq!(total, 4 * BLOCK, "one mono frame per rendered frame");
}

#[test]
fn reset_stops_sound_and_sequencing() {
    let mut pipeline = prepared_pipeline(EngineParams {
        arp_enabled: true,
        ..EngineParams::default()
    });

    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    let mut events = vec![TimedEvent::note_on(0, 60, 127)];
    pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));
    assert!(left.iter().any(|&s| s != 0.0));

    pipeline.reset();
    for _ in 0..4 {
        let mut events = Vec::new();
        pipeline.process_block(&mut events, &mut left, &mut right, Some(120.0));
        assert!(
            left.iter().all(|&s| s == 0.0),
            "after reset no voice or arp step may sound"
        );
    }
}

#[test]
fn note_off_releases_and_the_tail_decays() {
    let mut pipeline = prepared_pipeline(EngineParams {
        attack: 0.001,
        release: 0.005,
        ..EngineParams::default()
    });

    let mut left = vec![0.0f32; BLOCK];
    let mut right = vec![0.0f32; BLOCK];
    let mut events = vec![TimedEvent::note_on(0, 60, 127)];
    pipeline.process_block(&mut events, &mut left, &mut right, None);
    assert_eq!(pipeline.pool_mut().active_voice_count(), 1);

    // 5 ms release is 220 samples; one more block covers the whole tail.
    let mut events = vec![TimedEvent::note_off(0, 60)];
    pipeline.process_block(&mut events, &mut left, &mut right, None);
    assert_eq!(pipeline.pool_mut().active_voice_count(), 0);

    let mut events = Vec::new();
    pipeline.process_block(&mut events, &mut left, &mut right, None);
    assert!(left.iter().all(|&s| s == 0.0), "released voice must go silent");
}
