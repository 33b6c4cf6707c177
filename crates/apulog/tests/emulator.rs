use std::path::PathBuf;

use apulog::chip::{ClockRate, LENGTH_COUNTER_TABLE};
use apulog::functional::to_functional;
use apulog::score::{RawScore, ReducerConfig, emulate, raw_to_expressive};
use apulog::vgm::{RawEvent, decode, encode};

/// Optional output directory for generated traces (relative to the crate root).
///
/// Set `APULOG_TEST_OUTPUT_VGM=target/vgm` to keep the traces these tests
/// build; nothing is written otherwise.
fn output_vgm_dir() -> Option<PathBuf> {
    match std::env::var("APULOG_TEST_OUTPUT_VGM") {
        Ok(s) if !s.is_empty() => Some(PathBuf::from(s)),
        _ => None,
    }
}

fn maybe_write_vgm(filename: &str, bytes: &[u8]) {
    if let Some(dir) = output_vgm_dir() {
        let out_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(dir);
        if let Err(e) = std::fs::create_dir_all(&out_dir) {
            eprintln!("warning: could not create output dir {:?}: {}", out_dir, e);
            return;
        }
        let out_path = out_dir.join(filename);
        if let Err(e) = std::fs::write(&out_path, bytes) {
            eprintln!("warning: failed to write vgm file {:?}: {}", out_path, e);
        }
    }
}

fn write(register: u8, value: u8) -> RawEvent {
    RawEvent::RegisterWrite { register, value }
}

fn play(name: &str, events: &[RawEvent]) -> RawScore {
    let bytes = encode(events).expect("encode");
    maybe_write_vgm(name, &bytes);
    let raw = decode(&bytes).expect("decode");
    emulate(&to_functional(&raw).expect("disassemble")).expect("emulate")
}

fn held_pulse(period_low: u8, period_high: u8, samples: u32) -> Vec<RawEvent> {
    vec![
        RawEvent::Clock(ClockRate::NTSC),
        write(0x00, 0x3F),
        write(0x02, period_low),
        write(0x03, period_high),
        RawEvent::Wait(samples),
    ]
}

#[test]
fn a_held_pulse_at_period_256() {
    let score = play("pulse_256.vgm", &held_pulse(0x00, 0x01, 44_100));
    assert_eq!(score.sample_count, 44_100);
    assert_eq!(score.frames.len(), 44_100);
    assert!(score.frames.iter().all(|f| f[0] == [1, 0, 15, 0]));
    assert!(score.frames.iter().all(|f| f[1][..3] == [0, 0, 0]));

    let expressive = raw_to_expressive(&score, &ReducerConfig::default()).unwrap();
    let expected = (69.0 + 12.0 * (1_789_773.0 / (16.0 * 257.0) / 440.0f64).log2()).round() as u8;
    assert_eq!(expected, 69);
    assert!(expressive.frames.iter().all(|f| f[0] == [expected, 15, 0]));
}

#[test]
fn replay_is_deterministic() {
    let mut events = held_pulse(0xA9, 0x08, 10_000);
    events.extend([
        write(0x01, 0x9A),
        write(0x0C, 0x04),
        write(0x0E, 0x83),
        write(0x0F, 0x18),
        write(0x08, 0x20),
        write(0x0A, 0x40),
        write(0x0B, 0x09),
        RawEvent::Wait(30_000),
    ]);
    let first = play("mixed.vgm", &events);
    let second = play("mixed.vgm", &events);
    assert_eq!(first, second);
}

#[test]
fn pulse_period_seven_is_silent() {
    let silent = play("period_7.vgm", &held_pulse(0x07, 0x00, 100));
    assert!(silent.frames.iter().all(|f| f[0] == [0, 0, 0, 0]));

    let audible = play("period_8.vgm", &held_pulse(0x08, 0x00, 100));
    assert!(audible.frames.iter().all(|f| f[0] == [0, 8, 15, 0]));
    assert_eq!(audible.period(99, 0), Some(8));
    assert_eq!(silent.period(99, 0), Some(0));
    assert_eq!(silent.period(100, 0), None);
}

#[test]
fn length_table_boundaries() {
    assert_eq!(LENGTH_COUNTER_TABLE[0], 10);
    assert_eq!(LENGTH_COUNTER_TABLE[1], 254);
    assert_eq!(LENGTH_COUNTER_TABLE.len(), 32);
    assert!(LENGTH_COUNTER_TABLE.iter().all(|&n| n > 0));
}

#[test]
fn unhalted_length_counter_expires() {
    let events = vec![
        RawEvent::Clock(ClockRate::NTSC),
        write(0x00, 0x1F),
        write(0x02, 0x00),
        write(0x03, 0x01),
        RawEvent::Wait(6_000),
    ];
    let score = play("length_expiry.vgm", &events);
    assert_eq!(score.frames[0][0], [1, 0, 15, 0]);
    assert_eq!(score.frames[3_000][0], [1, 0, 15, 0]);
    assert_eq!(score.frames[5_999][0], [0, 0, 0, 0]);
}

#[test]
fn disabled_channel_ignores_length_load() {
    let mut events = vec![RawEvent::Clock(ClockRate::PAL), write(0x15, 0x00)];
    events.extend(held_pulse(0x00, 0x01, 100).into_iter().skip(1));
    let score = play("disabled.vgm", &events);
    assert!(score.frames.iter().all(|f| f[0] == [0, 0, 0, 0]));
}

#[test]
fn sweep_raises_period_until_it_mutes() {
    // Sweep on, period 0, shift 1: each half frame adds half the period.
    let events = vec![
        RawEvent::Clock(ClockRate::NTSC),
        write(0x00, 0x3F),
        write(0x01, 0x81),
        write(0x02, 0x00),
        write(0x03, 0x01),
        RawEvent::Wait(3_000),
    ];
    let score = play("sweep_up.vgm", &events);
    assert_eq!(score.frames[300][0], [1, 0x00, 15, 0]);
    assert_eq!(score.period(400, 0), Some(384));
    assert_eq!(score.period(800, 0), Some(576));
    assert_eq!(score.frames[2_000][0], [7, 0x98, 15, 0]);
    // 1944 + 972 overflows the 11-bit period.
    assert_eq!(score.frames[2_300][0], [0, 0, 0, 0]);
}

fn short_note(mode: Option<u8>) -> Vec<RawEvent> {
    let mut events = vec![
        RawEvent::Clock(ClockRate::NTSC),
        write(0x00, 0x1F),
        write(0x02, 0x00),
        // Length index 3: two half frames.
        write(0x03, 0x19),
    ];
    if let Some(mode) = mode {
        events.push(write(0x17, mode));
    }
    events.push(RawEvent::Wait(1_000));
    events
}

#[test]
fn frame_mode_write_clocks_at_once() {
    let four_step = play("length_2_four_step.vgm", &short_note(None));
    assert_eq!(four_step.frames[450][0], [1, 0, 15, 0]);
    assert_eq!(four_step.frames[700][0], [1, 0, 15, 0]);
    assert_eq!(four_step.frames[800][0], [0, 0, 0, 0]);

    // The write spends one half frame immediately, the 192 Hz sequence the other.
    let five_step = play("length_2_five_step.vgm", &short_note(Some(0x80)));
    assert_eq!(five_step.frames[1][0], [1, 0, 15, 0]);
    assert_eq!(five_step.frames[450][0], [1, 0, 15, 0]);
    assert_eq!(five_step.frames[470][0], [0, 0, 0, 0]);
}

fn triangle_note(control: u8) -> Vec<RawEvent> {
    vec![
        RawEvent::Clock(ClockRate::NTSC),
        write(0x08, control),
        write(0x0A, 0x80),
        write(0x0B, 0x08),
        RawEvent::Wait(4_000),
    ]
}

#[test]
fn triangle_linear_counter_runs_out() {
    // Reload value 16, counting down on every quarter frame.
    let score = play("triangle_linear.vgm", &triangle_note(0x10));
    assert_eq!(score.frames[100][2], [0, 0, 0, 0]);
    assert_eq!(score.frames[1_000][2], [0, 0x80, 0, 0]);
    assert_eq!(score.frames[3_000][2], [0, 0x80, 0, 0]);
    assert_eq!(score.frames[3_300][2], [0, 0, 0, 0]);

    // With the control bit set the counter keeps reloading.
    let held = play("triangle_held.vgm", &triangle_note(0x90));
    assert_eq!(held.frames[3_300][2], [0, 0x80, 0, 0]);
    assert_eq!(held.frames[3_999][2], [0, 0x80, 0, 0]);
}
