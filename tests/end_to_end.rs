use pico_psg::driver::MemoryDriver;
use pico_psg::engine::{Engine, EngineConfig, Pacing, Script, Sequencer};
use pico_psg::psg::{DEFAULT_SAMPLE_RATE, SAMPLE_MAX};
use pico_psg::queue::Waveform;
use pico_psg::sync::MaskingSection;

fn config() -> EngineConfig {
    EngineConfig::default().with_pacing(Pacing::Freerun)
}

fn rising_edges(samples: &[u16]) -> Vec<usize> {
    samples
        .windows(2)
        .enumerate()
        .filter(|(_, w)| w[0] == 0 && w[1] > 0)
        .map(|(n, _)| n + 1)
        .collect()
}

#[test]
fn test_a440_square_on_channel_a() {
    let rate = DEFAULT_SAMPLE_RATE as usize;
    let (mut psg, mut core) = Engine::offline::<MemoryDriver>(config(), rate).unwrap();
    assert!(psg.enqueue(0, 7, 0x3E));
    assert!(psg.enqueue(0, 0, 142));
    assert!(psg.enqueue(0, 1, 0));
    assert!(psg.enqueue(0, 8, 0x0F));

    core.run_ms(1000);
    assert_eq!(core.stats().applied, 4);
    assert_eq!(core.voices().voice(0).increment(), 85_731_997);

    let driver = core.shutdown();
    let left = driver.left();
    assert_eq!(left.len(), rate);

    let edges = rising_edges(&left);
    assert!((438..=441).contains(&edges.len()), "{} cycles", edges.len());
    // sample_rate / 440 = 50.1 samples per cycle
    for pair in edges.windows(2) {
        let period = pair[1] - pair[0];
        assert!((49..=51).contains(&period), "period {period}");
    }
    approx::assert_relative_eq!(
        (edges[edges.len() - 1] - edges[0]) as f64 / (edges.len() - 1) as f64,
        DEFAULT_SAMPLE_RATE as f64 / 440.14,
        max_relative = 0.01
    );
}

#[test]
fn test_commands_land_on_their_tick() {
    let (mut psg, mut core) = Engine::offline::<MemoryDriver>(config(), 4096).unwrap();
    psg.enqueue(0, 8, 0x0F);
    psg.enqueue(5, 8, 0x00);

    core.run_ms(4);
    assert_eq!(core.voices().voice(0).volume(), 0x0F);
    core.run_ms(1);
    assert_eq!(core.now(), 5);
    assert_eq!(core.voices().voice(0).volume(), 0x00);
}

#[test]
fn test_output_stays_in_range_with_everything_on() {
    let (mut psg, mut core) = Engine::offline::<MemoryDriver>(config(), 22_050).unwrap();
    psg.enqueue(0, 7, 0x00);
    psg.enqueue(0, 6, 3);
    for ch in 0..3u8 {
        psg.enqueue(0, ch * 2, 50 + ch * 30);
        psg.enqueue(0, 8 + ch, 0x0F);
        psg.set_lfo(0, ch, 127, 70);
    }
    psg.set_timbre(0, 1, Waveform::Triangle);
    psg.set_timbre(0, 2, Waveform::InverseSawtooth);
    psg.set_pan(0, 0, 1);
    psg.set_pan(0, 2, 15);

    core.run_ms(1000);
    let driver = core.shutdown();
    let frames = driver.frames();
    assert!(frames
        .iter()
        .all(|&(l, r)| l <= SAMPLE_MAX && r <= SAMPLE_MAX));
    assert!(frames.iter().any(|&(l, _)| l > 0));
    assert!(frames.iter().any(|&(_, r)| r > 0));
}

#[test]
fn test_envelope_decay_through_engine() {
    let (mut psg, mut core) = Engine::offline::<MemoryDriver>(config(), 22_050).unwrap();
    // envelope period 1000: 2 MHz / 32 / 1000 = 62.5 steps/s
    psg.enqueue(0, 11, 0xE8);
    psg.enqueue(0, 12, 0x03);
    psg.enqueue(0, 8, 0x10);
    psg.enqueue(0, 13, 0x00);

    core.run_ms(1);
    assert_eq!(core.voices().voice(0).envelope().level(), 15);
    core.run_ms(100);
    let level = core.voices().voice(0).envelope().level();
    assert!((7..=10).contains(&level), "level {level}");
    core.run_ms(500);
    let voices = core.voices();
    assert_eq!(voices.voice(0).envelope().level(), 0);
    assert!(!voices.voice(0).envelope().is_running());
}

#[test]
fn test_masking_section_engine() {
    let (mut psg, mut core) = Engine::<MaskingSection>::new(config())
        .build::<MemoryDriver>(100)
        .unwrap();
    psg.enqueue(0, 8, 0x0F);
    core.run_samples(100);
    let driver = core.shutdown();
    // both sources disabled at power on: the channel is a DC level
    let (l, r) = driver.frames()[99];
    assert!(l > 0 && l == r);
}

#[test]
fn test_sequencer_plays_script_longer_than_queue() {
    let events: Vec<String> = (0..2000)
        .map(|n| format!(r#"{{ "at": {}, "cmd": "reg", "reg": 8, "val": {} }}"#, n, n % 16))
        .collect();
    let json = format!(r#"{{ "events": [{}] }}"#, events.join(","));
    let script = Script::from_json_str(&json).unwrap();

    let (mut psg, mut core) = Engine::offline::<MemoryDriver>(config(), 0).unwrap();
    let mut sequencer = Sequencer::new(&script, psg.now());
    for _ in 0..2100 {
        sequencer.pump(&mut psg);
        core.run_ms(1);
    }
    assert!(sequencer.is_finished());
    let stats = core.stats();
    assert_eq!(stats.dropped, 0);
    assert_eq!(stats.applied, 2000);
    assert_eq!(core.voices().voice(0).volume(), 15);
}

#[test]
fn test_independent_sections_allow_nested_inspection() {
    let (mut psg_a, core_a) = Engine::<MaskingSection>::new(config())
        .build::<MemoryDriver>(0)
        .unwrap();
    let (mut psg_b, mut core_b) = Engine::<MaskingSection>::new(config())
        .build::<MemoryDriver>(0)
        .unwrap();
    psg_a.enqueue(0, 8, 0x03);
    psg_b.enqueue(0, 8, 0x0C);

    let voices_a = core_a.voices();
    core_b.run_ms(2);
    assert_eq!(core_b.voices().voice(0).volume(), 0x0C);
    assert_eq!(voices_a.voice(0).volume(), 0);
}
