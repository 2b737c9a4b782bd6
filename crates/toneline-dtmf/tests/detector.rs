use toneline_dtmf::{
    DetectorConfig, DigitEntry, DtmfDetector, Error, ProcessOptions, ToneBank, BLOCK_SIZE,
};
use toneline_tone::DtmfDialer;

const RATE: u32 = 8000;

fn dialer() -> DtmfDialer {
    DtmfDialer::new(RATE as f32, 60.0, 60.0, 8000.0)
}

fn detector() -> DtmfDetector {
    DtmfDetector::new(RATE, DetectorConfig::default()).unwrap()
}

fn silence(blocks: usize) -> Vec<i16> {
    vec![0; blocks * BLOCK_SIZE]
}

#[test]
fn silence_never_yields_a_digit() {
    let mut det = detector();
    let audio = vec![0i16; 50 * BLOCK_SIZE + 17];
    for chunk in audio.chunks(160) {
        assert_eq!(det.process(chunk, ProcessOptions::default()), None);
    }
    assert!(det.sink().is_empty());
    assert_eq!(det.sink().detected(), 0);
}

#[test]
fn digit_one_begins_and_ends_on_block_counts() {
    let mut det = detector();
    let tone = dialer().tone('1', 2 * BLOCK_SIZE).unwrap();
    let opts = ProcessOptions::default();

    assert_eq!(det.process(&tone[..BLOCK_SIZE], opts), None);
    assert_eq!(det.process(&tone[BLOCK_SIZE..], opts), Some('1'));

    assert_eq!(det.process(&silence(1), opts), Some('1'));
    assert_eq!(det.process(&silence(1), opts), Some('1'));
    assert_eq!(det.process(&silence(1), opts), None);

    assert_eq!(
        det.sink().entries(),
        &[DigitEntry {
            digit: '1',
            duration: 2 * BLOCK_SIZE
        }]
    );
}

#[test]
fn worked_trace_from_audio() {
    let dialer = dialer();
    let block = |key: Option<char>| match key {
        Some(k) => dialer.tone(k, BLOCK_SIZE).unwrap(),
        None => silence(1),
    };
    let hits = [
        Some('A'),
        Some('A'),
        None,
        None,
        None,
        Some('B'),
        Some('C'),
        Some('C'),
    ];
    let expected = [
        None,
        Some('A'),
        Some('A'),
        Some('A'),
        None,
        None,
        None,
        Some('C'),
    ];

    let mut det = detector();
    for (hit, want) in hits.iter().zip(expected) {
        assert_eq!(det.process(&block(*hit), ProcessOptions::default()), want);
    }
    assert_eq!(det.sink().digits(), "AC");
    assert_eq!(det.sink().entries()[0].duration, 2 * BLOCK_SIZE);
    assert_eq!(det.sink().entries()[1].duration, 2 * BLOCK_SIZE);
}

#[test]
fn held_digit_only_extends_its_entry() {
    let mut det = detector();
    let tone = dialer().tone('7', 10 * BLOCK_SIZE).unwrap();
    for chunk in tone.chunks(BLOCK_SIZE) {
        det.process(chunk, ProcessOptions::default());
    }
    assert_eq!(det.current_digit(), Some('7'));
    assert_eq!(det.sink().len(), 1);
    assert_eq!(det.sink().entries()[0].duration, 10 * BLOCK_SIZE);
    assert_eq!(det.blocks_evaluated(), 10);
}

#[test]
fn split_calls_match_single_call() {
    let audio = dialer().dial("159#").unwrap();

    let mut whole = detector();
    let whole_digit = whole.process(&audio, ProcessOptions::default());

    for chunk_len in [1, 37, 101, 103, 500] {
        let mut split = detector();
        let mut digit = None;
        for chunk in audio.chunks(chunk_len) {
            digit = split.process(chunk, ProcessOptions::default());
        }
        assert_eq!(digit, whole_digit);
        assert_eq!(split.sink().entries(), whole.sink().entries());
        assert_eq!(split.blocks_evaluated(), whole.blocks_evaluated());
        assert_eq!(split.samples_processed(), audio.len() as u64);
    }
    assert_eq!(whole.sink().digits(), "159#");
}

#[test]
fn full_keypad() {
    let mut det = detector();
    let audio = DtmfDialer::new(RATE as f32, 50.0, 50.0, 8000.0)
        .dial("147*2580369#ABCD")
        .unwrap();
    det.process(&audio, ProcessOptions::default());
    assert_eq!(det.sink().digits(), "147*2580369#ABCD");
    assert_eq!(det.current_digit(), None);
}

#[test]
fn reverse_twist_needs_relax() {
    // column tone 5 dB above the row tone
    let audio = DtmfDialer::new(RATE as f32, 80.0, 0.0, 8000.0)
        .with_twist_db(-5.0)
        .dial("0")
        .unwrap();

    let mut strict = detector();
    assert_eq!(strict.process(&audio, ProcessOptions::default()), None);
    assert!(strict.sink().is_empty());

    let mut relaxed = detector();
    assert_eq!(relaxed.process(&audio, ProcessOptions::relaxed()), Some('0'));
}

#[test]
fn excessive_normal_twist_rejected() {
    let audio = DtmfDialer::new(RATE as f32, 80.0, 0.0, 8000.0)
        .with_twist_db(9.0)
        .dial("0")
        .unwrap();
    let mut det = detector();
    assert_eq!(det.process(&audio, ProcessOptions::relaxed()), None);
}

#[test]
fn two_keys_at_once_rejected() {
    let dialer = DtmfDialer::new(RATE as f32, 80.0, 0.0, 6000.0);
    let one = dialer.dial("1").unwrap();
    let five = dialer.dial("5").unwrap();
    let mixed: Vec<i16> = one.iter().zip(&five).map(|(a, b)| a + b).collect();

    let mut det = detector();
    assert_eq!(det.process(&mixed, ProcessOptions::default()), None);
    assert!(det.sink().is_empty());
}

#[test]
fn squelch_does_not_change_detection() {
    let audio = dialer().dial("42").unwrap();
    let squelched = ProcessOptions {
        squelch: true,
        ..ProcessOptions::default()
    };

    let mut a = detector();
    let mut b = detector();
    assert_eq!(
        a.process(&audio, ProcessOptions::default()),
        b.process(&audio, squelched)
    );
    assert_eq!(a.sink().entries(), b.sink().entries());
}

#[test]
fn full_log_counts_lost_digits() {
    let config = DetectorConfig {
        digit_capacity: 2,
        ..DetectorConfig::default()
    };
    let mut det = DtmfDetector::new(RATE, config).unwrap();
    det.process(&dialer().dial("1234").unwrap(), ProcessOptions::default());

    assert_eq!(det.sink().digits(), "12");
    assert_eq!(det.sink().detected(), 4);
    assert_eq!(det.sink().lost(), 2);
}

#[test]
fn custom_sink() {
    let mut det = DtmfDetector::builder(RATE)
        .hits_to_begin(3)
        .misses_to_end(2)
        .sink(Vec::<(char, usize)>::new())
        .build()
        .unwrap();
    det.process(&dialer().dial("9").unwrap(), ProcessOptions::default());

    let sink = det.into_sink();
    assert_eq!(sink.len(), 1);
    assert_eq!(sink[0].0, '9');
    assert!(sink[0].1 >= 3 * BLOCK_SIZE);
}

#[test]
fn reset_forgets_partial_state() {
    let mut det = detector();
    let tone = dialer().tone('6', 3 * BLOCK_SIZE).unwrap();
    assert_eq!(det.process(&tone, ProcessOptions::default()), Some('6'));

    det.reset();
    assert_eq!(det.current_digit(), None);
    assert_eq!(det.blocks_evaluated(), 0);
    // the log belongs to the caller and survives a reset
    assert_eq!(det.sink().digits(), "6");
}

#[test]
fn invalid_session_parameters() {
    assert!(matches!(
        DtmfDetector::new(0, DetectorConfig::default()),
        Err(Error::InvalidSampleRate(0))
    ));
    assert!(matches!(
        DtmfDetector::new(2000, DetectorConfig::default()),
        Err(Error::InvalidFrequency { .. })
    ));
    assert!(matches!(
        DtmfDetector::builder(RATE).hits_to_begin(0).build(),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn resonator_history_stays_bounded() {
    let mut bank = ToneBank::new(RATE).unwrap();
    let mut state = 0x1234_5678u32;
    for n in 0..(20 * BLOCK_SIZE) {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let sample = if n % 3 == 0 { i16::MIN } else { state as i16 };
        bank.feed(sample);
        for r in bank.resonators() {
            let (v2, v3) = r.history();
            assert!(v2.abs() <= 1 << 15 && v3.abs() <= 1 << 15);
        }
        if n % BLOCK_SIZE == BLOCK_SIZE - 1 {
            bank.reset();
        }
    }
}
