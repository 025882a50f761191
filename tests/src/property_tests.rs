//! Property tests for the poller, the sweep loop and the settings record

use dds_core::config::{MAX_CALIBRATION, MAX_FREQ, MIN_CALIBRATION, MIN_FREQ};
use dds_core::dds::{DdsTiming, SampleEngine, SoftwareEngine, SweepPlan};
use dds_core::hal::mock::MockStore;
use dds_core::input::{ButtonLatch, ButtonPoller, AUTO_REPEAT_START_TICKS, AUTO_REPEAT_TICKS, UNBOUNCE_TICKS};
use dds_core::storage::{self, Loaded, Record, RECORD_LEN, SENTINEL};
use dds_core::waveform::{WaveBuffer, SINE_FROM_ZERO};
use dds_core::{Button, GeneratorConfig, HsFrequency, PulseDuration, PwmFrequency, StopFlag};
use proptest::prelude::*;

use crate::CountingDac;

fn any_button() -> impl Strategy<Value = Button> {
    prop::sample::select(Button::PRIORITY.to_vec())
}

/// Presses reported while a button is held for `held` ticks. Deadlines fire
/// on the tick after they are due.
fn expected_presses(held: u16) -> u32 {
    let first_repeat = AUTO_REPEAT_START_TICKS + 2;
    if held < first_repeat {
        1
    } else {
        2 + ((held - first_repeat) / (AUTO_REPEAT_TICKS + 1)) as u32
    }
}

fn config_strategy() -> impl Strategy<Value = GeneratorConfig> {
    (
        (MIN_FREQ..MAX_FREQ, 0.001f64..10_000.0, 0.9f64..1.1, MIN_FREQ..MAX_FREQ, 0.001f64..10_000.0),
        prop::sample::select(vec![1u8, 2, 4, 8]),
        prop::sample::select(vec![61u16, 244, 976, 7813, 62500]),
        any::<u8>(),
        any::<u8>(),
        prop::sample::select(PulseDuration::LADDER_MS.to_vec()),
        0u8..12,
    )
        .prop_map(|(floats, mhz, pwm, duty, off, ms, entry)| {
            let (frequency, frequency_step, calibration, sweep_end, sweep_increment) = floats;
            GeneratorConfig {
                frequency,
                frequency_step,
                calibration,
                sweep_end,
                sweep_increment,
                hs_frequency: HsFrequency::from_mhz(mhz),
                pwm_frequency: PwmFrequency::from_hz(pwm),
                pwm_duty: duty,
                off_level: off,
                pulse: PulseDuration::Millis(ms),
                menu_entry: entry,
            }
        })
}

proptest! {
    #[test]
    fn prop_accumulator_is_positive_and_monotonic(
        a in MIN_FREQ..=MAX_FREQ,
        b in MIN_FREQ..=MAX_FREQ,
        calibration in MIN_CALIBRATION..=MAX_CALIBRATION,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        for timing in [DdsTiming::REFERENCE, DdsTiming { cpu_hz: 72_000_000, ..DdsTiming::REFERENCE }] {
            let low_inc = timing.accumulator_for(low, calibration);
            let high_inc = timing.accumulator_for(high, calibration);
            prop_assert!(low_inc.raw() >= 1);
            prop_assert!(low_inc <= high_inc);
        }
    }

    #[test]
    fn prop_held_button_auto_repeats(button in any_button(), held in 1u16..400) {
        let latch = ButtonLatch::new();
        let mut poller = ButtonPoller::new();
        let mut presses = 0;

        for _ in 0..held {
            poller.tick(button, &latch);
            if let Some(seen) = latch.take_unprocessed() {
                prop_assert_eq!(seen, button);
                presses += 1;
            }
        }
        prop_assert_eq!(presses, expected_presses(held));

        for _ in 0..UNBOUNCE_TICKS + 1 {
            poller.tick(Button::None, &latch);
        }
        prop_assert_eq!(latch.pressed(), Button::None);
    }

    #[test]
    fn prop_release_bounce_is_ignored(
        button in any_button(),
        bounce in prop::collection::vec(any::<bool>(), 0..(UNBOUNCE_TICKS as usize - 1)),
    ) {
        let latch = ButtonLatch::new();
        let mut poller = ButtonPoller::new();
        poller.tick(button, &latch);
        prop_assert_eq!(latch.take_unprocessed(), Some(button));

        // Contacts chatter right after the press
        for closed in bounce {
            poller.tick(if closed { button } else { Button::None }, &latch);
            prop_assert_eq!(latch.take_unprocessed(), None);
            prop_assert_eq!(latch.pressed(), button);
        }
    }

    #[test]
    fn prop_tick_counter_follows_the_poller(ticks in 1u32..2000) {
        let latch = ButtonLatch::new();
        let mut poller = ButtonPoller::new();
        for _ in 0..ticks {
            poller.tick(Button::None, &latch);
        }
        prop_assert_eq!(latch.tick_count(), poller.now());
        prop_assert_eq!(latch.tick_count(), ticks as u16);
    }

    #[test]
    fn prop_saved_config_loads_back(cfg in config_strategy()) {
        let mut store = MockStore::new();
        storage::save(&mut store, &cfg).unwrap();
        prop_assert_eq!(storage::load(&mut store).unwrap(), Loaded::Restored(cfg));

        // Nothing changed, nothing written
        let writes = store.write_count();
        prop_assert_eq!(storage::save(&mut store, &cfg).unwrap(), 0);
        prop_assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn prop_decoded_records_are_in_range(bytes in prop::collection::vec(any::<u8>(), RECORD_LEN)) {
        let mut rec: Record = [0; RECORD_LEN];
        rec.copy_from_slice(&bytes);
        rec[RECORD_LEN - 1] = SENTINEL;

        let cfg = storage::decode(&rec).unwrap();
        prop_assert_eq!(cfg, cfg.sanitized());
        prop_assert!(cfg.frequency >= MIN_FREQ && cfg.frequency <= MAX_FREQ);
        prop_assert!(cfg.calibration >= 0.9 && cfg.calibration <= 1.1);
        prop_assert!(cfg.menu_entry < 12);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_sweep_runs_the_expected_periods(
        start in 500.0f64..5000.0,
        span in 0.0f64..5000.0,
        step in 50.0f64..500.0,
        calibration in 0.9f64..1.1,
    ) {
        let timing = DdsTiming::REFERENCE;
        let plan = SweepPlan::new(&timing, start, start + span, step, calibration);
        let mut buffer = WaveBuffer::new();
        buffer.load(&SINE_FROM_ZERO);
        let stop = StopFlag::new();
        let mut engine = SoftwareEngine::new(CountingDac::default(), timing);

        let outcome = engine.run_sweep(&buffer, &plan, &stop);

        prop_assert!(!outcome.stopped);
        prop_assert_eq!(outcome.periods, plan.expected_periods());
        if outcome.periods > 0 {
            prop_assert!(outcome.final_increment >= plan.end);
            prop_assert!(outcome.final_increment - plan.step.raw() < plan.end);
        }
    }
}
