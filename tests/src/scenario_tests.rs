//! Front panel scenarios on the virtual board

use dds_core::config::{MAX_CALIBRATION, MIN_FREQ, MIN_FREQ_STEP};
use dds_core::test_utils::{run_for, VirtualBoard};
use dds_core::{Action, Button, Generator, MainMode, OptionEntry, PulseDuration, Shape, SweepStage};
use rstest::rstest;
use tokio_test::assert_ok;

use crate::goto;

#[test]
fn test_first_boot_writes_defaults() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let generator = assert_ok!(Generator::boot(board, &latch, &stop));

    let stored = generator.hal().stored_config().unwrap();
    assert_eq!(stored, dds_core::default_config());
    assert_eq!(generator.hal().eeprom().commit_count(), 1);
}

#[test]
fn test_boot_restores_last_entry() {
    let mut cfg = dds_core::default_config();
    cfg.menu_entry = MainMode::Calibration.index();
    cfg.calibration = 1.0123;
    let mut store = dds_core::hal::mock::MockStore::new();
    assert_ok!(dds_core::storage::save(&mut store, &cfg));

    let board = VirtualBoard::with_store(store);
    let (latch, stop) = (board.latch(), board.stop());
    let generator = assert_ok!(Generator::boot(board, &latch, &stop));

    assert_eq!(generator.mode(), MainMode::Calibration);
    assert_eq!(generator.hal().lcd_row(0), "  Calibration   ");
    assert_eq!(generator.hal().lcd_row(1), "   1.0123    OFF");
}

#[rstest]
#[case(0, "      Sine      ")]
#[case(1, "     Square     ")]
#[case(2, "    Triangle    ")]
#[case(3, "    SawTooth    ")]
#[case(4, "  Rev SawTooth  ")]
#[case(5, "      ECG       ")]
#[case(6, "     Noise      ")]
#[case(7, "   High Speed   ")]
#[case(9, "     Sweep   Beg")]
#[case(10, "     Pulse      ")]
#[case(11, "  Calibration   ")]
#[case(12, "      Sine      ")]
fn test_down_walks_the_main_menu(#[case] presses: usize, #[case] title: &str) {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();

    for _ in 0..presses {
        assert_ok!(generator.perform(Action::Next));
    }
    assert_eq!(generator.hal().lcd_row(0), title);
    assert_eq!(generator.config().menu_entry as usize, presses % 12);
}

#[test]
fn test_up_wraps_to_last_entry() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();

    assert_ok!(generator.perform(Action::Previous));
    assert_eq!(generator.mode(), MainMode::Calibration);
    assert_eq!(generator.hal().lcd_row(1), "   1.0000    OFF");
}

#[rstest]
#[case(Action::FrequencyUp, 3, "  1300.000Hz OFF")]
#[case(Action::FrequencyDown, 2, "   800.000Hz OFF")]
#[case(Action::FrequencyDown, 20, "     0.000Hz OFF")]
fn test_frequency_edits(#[case] action: Action, #[case] times: usize, #[case] row: &str) {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();

    for _ in 0..times {
        assert_ok!(generator.perform(action));
    }
    assert_eq!(generator.hal().lcd_row(1), row);
    assert!(generator.config().frequency >= MIN_FREQ);
}

#[test]
fn test_step_option_clamps_and_applies() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();

    assert_ok!(generator.perform(Action::EnterOptions));
    assert_eq!(generator.option(), Some(OptionEntry::FreqStep));
    assert_eq!(generator.hal().lcd_row(1), "   100.000Hz    ");
    for _ in 0..8 {
        assert_ok!(generator.perform(Action::StepDown));
    }
    assert_eq!(generator.config().frequency_step, MIN_FREQ_STEP);
    assert_eq!(generator.hal().lcd_row(1), "     0.001Hz    ");

    assert_ok!(generator.perform(Action::LeaveOptions));
    assert_ok!(generator.perform(Action::FrequencyUp));
    assert_eq!(generator.hal().lcd_row(1), "  1000.001Hz OFF");
}

#[test]
fn test_off_level_option_moves_the_output() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();

    assert_ok!(generator.perform(Action::EnterOptions));
    assert_ok!(generator.perform(Action::Previous));
    assert_eq!(generator.option(), Some(OptionEntry::OffLevel));
    assert_eq!(generator.hal().lcd_row(0), "   Off Level    ");
    assert_eq!(generator.hal().lcd_row(1), "128             ");

    for _ in 0..200 {
        assert_ok!(generator.perform(Action::OffLevelUp));
    }
    assert_eq!(generator.config().off_level, 255);
    assert_eq!(generator.hal().dac_last(), Some(255));
    assert_eq!(generator.hal().lcd_row(1), "255             ");
}

#[rstest]
#[case(Action::HsHigher, 1, 2)]
#[case(Action::HsHigher, 3, 8)]
#[case(Action::HsHigher, 4, 1)]
#[case(Action::HsLower, 1, 8)]
#[case(Action::HsLower, 2, 4)]
fn test_high_speed_rates(#[case] action: Action, #[case] times: usize, #[case] mhz: u8) {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::HighSpeed));

    for _ in 0..times {
        assert_ok!(generator.perform(action));
    }
    assert_eq!(generator.config().hs_frequency.mhz(), mhz);
    // Not running, so the timer stays off
    assert_eq!(generator.hal().hs_running(), None);
}

#[rstest]
#[case(Action::PwmFaster, 1, "   61.04Hz   OFF")]
#[case(Action::PwmFaster, 3, "  976.56Hz   OFF")]
#[case(Action::PwmSlower, 1, " 7812.50Hz   OFF")]
#[case(Action::PwmSlower, 5, "62500.00Hz   OFF")]
fn test_pwm_rates(#[case] action: Action, #[case] times: usize, #[case] row: &str) {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pwm));
    assert_eq!(generator.hal().lcd_row(0), "      PWM    128");

    for _ in 0..times {
        assert_ok!(generator.perform(action));
    }
    assert_eq!(generator.hal().lcd_row(1), row);
}

#[test]
fn test_pwm_up_down_navigate_when_idle() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pwm));

    assert_ok!(generator.perform(Action::DutyUp));
    assert_eq!(generator.mode(), MainMode::HighSpeed);
    assert_ok!(generator.perform(Action::Next));
    assert_ok!(generator.perform(Action::DutyDown));
    assert_eq!(generator.mode(), MainMode::Sweep);
    assert_eq!(generator.config().pwm_duty, 128);
}

#[test]
fn test_pwm_duty_changes_while_running() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pwm));

    generator.hal_mut().press_after(Button::Start, 10, 50);
    generator.hal_mut().press_after(Button::Up, 300, 30);
    generator.hal_mut().press_after(Button::Start, 600, 30);
    assert_ok!(run_for(&mut generator, 1000));

    assert!(!generator.is_running());
    assert_eq!(generator.mode(), MainMode::Pwm);
    assert_eq!(generator.config().pwm_duty, 129);
    assert_eq!(generator.hal().lcd_row(0), "      PWM    129");
    // One burst before the edit, one after
    assert_eq!(generator.hal().sync_pulses(), 2);
    // Saved when the run started
    assert_eq!(generator.hal().stored_config().unwrap().pwm_duty, 128);
}

#[test]
fn test_noise_runs_until_start() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Noise));
    assert_eq!(generator.hal().lcd_row(1), "    Random   OFF");

    generator.hal_mut().press_after(Button::Start, 10, 50);
    generator.hal_mut().press_after(Button::Start, 300, 50);
    assert_ok!(run_for(&mut generator, 800));

    assert!(!generator.is_running());
    assert_eq!(generator.hal().sync_pulses(), 1);
    assert!(generator.hal().dac_writes() > 100_000);
    assert_eq!(generator.hal().dac_last(), Some(0x80));
    assert_eq!(&generator.hal().dac_history()[1..4], &dds_core::waveform::NOISE[..3]);
    assert!(generator.hal().tick_enabled());
    assert!(!generator.hal().stop_armed());
}

#[test]
fn test_calibration_tone_runs_and_stops() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Calibration));
    for _ in 0..1000 {
        assert_ok!(generator.perform(Action::CalibrationUp));
    }
    assert_eq!(generator.config().calibration, MAX_CALIBRATION);

    generator.hal_mut().press_after(Button::Start, 10, 50);
    generator.hal_mut().press_after(Button::Start, 250, 50);
    assert_ok!(run_for(&mut generator, 600));

    assert!(!generator.is_running());
    assert_eq!(generator.hal().sync_pulses(), 1);
    assert_eq!(generator.hal().lcd_row(1), "   1.1000    OFF");
    assert_eq!(generator.hal().stored_config().unwrap().calibration, MAX_CALIBRATION);
    // The tone starts from the bottom of the sine
    assert!(generator.hal().dac_history()[1] < 0x08);
}

#[test]
fn test_sweep_stages_then_repeated_sweeps() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Sweep));
    assert_eq!(generator.sweep_stage(), SweepStage::StartFreq);

    assert_ok!(generator.perform(Action::SweepAdvance));
    assert_eq!(generator.hal().lcd_row(0), "     Sweep   End");
    assert_eq!(generator.hal().lcd_row(1), " 10000.000Hz OFF");

    assert_ok!(generator.perform(Action::SweepAdvance));
    assert_eq!(generator.sweep_stage(), SweepStage::Increment);
    assert_eq!(generator.hal().lcd_row(1), "    10.000Hz OFF");

    // Starting blocks until Start comes in during a sweep
    generator.hal_mut().press_after(Button::Start, 600, 40);
    assert_ok!(generator.perform(Action::SweepAdvance));

    assert!(!generator.is_running());
    assert!(generator.hal().sync_pulses() >= 2);
    assert_eq!(generator.sweep_stage(), SweepStage::StartFreq);
    assert_eq!(generator.hal().lcd_row(0), "     Sweep   Beg");
    assert_eq!(generator.hal().lcd_row(1), "  1000.000Hz OFF");
    assert_eq!(generator.hal().dac_last(), Some(0x80));
}

#[test]
fn test_sweep_fields_locked_while_running() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Sweep));
    assert_ok!(generator.perform(Action::SweepAdvance));
    assert_ok!(generator.perform(Action::SweepFieldDown));
    assert_eq!(generator.config().sweep_end, 9900.0);
    assert_ok!(generator.perform(Action::SweepAdvance));

    // Right lands in a running sweep and is ignored, Start then stops it
    generator.hal_mut().press_after(Button::Right, 100, 30);
    generator.hal_mut().press_after(Button::Start, 400, 30);
    assert_ok!(generator.perform(Action::SweepAdvance));

    assert_eq!(generator.config().sweep_increment, 10.0);
    assert_eq!(generator.hal().stored_config().unwrap().sweep_end, 9900.0);
}

#[test]
fn test_navigation_locked_while_running() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_eq!(generator.mode(), MainMode::Signal(Shape::Sine));

    generator.hal_mut().press_after(Button::Start, 10, 50);
    generator.hal_mut().press_after(Button::Down, 300, 30);
    generator.hal_mut().press_after(Button::Options, 500, 30);
    generator.hal_mut().press_after(Button::Start, 700, 30);
    assert_ok!(run_for(&mut generator, 1000));

    assert!(!generator.is_running());
    assert_eq!(generator.mode(), MainMode::Signal(Shape::Sine));
    assert_eq!(generator.option(), None);
    assert_eq!(generator.hal().sync_pulses(), 3);
}

#[rstest]
#[case(PulseDuration::Minimum)]
#[case(PulseDuration::Millis(1))]
#[case(PulseDuration::Millis(50))]
fn test_single_pulses(#[case] duration: PulseDuration) {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pulse));
    while generator.config().pulse != duration {
        let action = if generator.config().pulse.code() < duration.code() {
            Action::PulseLonger
        } else {
            Action::PulseShorter
        };
        assert_ok!(generator.perform(action));
    }

    let before = generator.hal().now_ms();
    assert_ok!(generator.perform(Action::FirePulse));

    assert!(!generator.is_running());
    assert_eq!(generator.hal().dac_history(), &[0x80, 0xFF, 0x80]);
    assert_eq!(generator.hal().sync_pulses(), 1);
    if let PulseDuration::Millis(ms) = duration {
        assert!(generator.hal().now_ms() - before >= ms as u64);
    }
}

#[test]
fn test_hold_pulse_follows_start() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pulse));
    while generator.config().pulse != PulseDuration::Hold {
        assert_ok!(generator.perform(Action::PulseLonger));
    }
    assert_eq!(generator.hal().lcd_row(1), "    Hold     OFF");

    generator.hal_mut().press_after(Button::Start, 10, 200);
    assert_ok!(run_for(&mut generator, 500));

    assert!(!generator.is_running());
    assert_eq!(generator.hal().dac_history(), &[0x80, 0xFF, 0x80]);
    assert_eq!(generator.hal().stored_config().unwrap().pulse, PulseDuration::Hold);
}

/// Run the idle loop in 1 ms slices and count run/idle transitions
fn count_run_changes(generator: &mut Generator<'_, VirtualBoard>, ms: u64) -> usize {
    let mut changes = 0;
    let mut running = generator.is_running();
    let until = generator.hal().now_ms() + ms;
    while generator.hal().now_ms() < until {
        assert_ok!(run_for(generator, 1));
        if generator.is_running() != running {
            running = generator.is_running();
            changes += 1;
        }
    }
    changes
}

#[test]
fn test_toggle_pulse_flips_once_per_press() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::Pulse));
    while generator.config().pulse != PulseDuration::Toggle {
        assert_ok!(generator.perform(Action::PulseLonger));
    }

    // Held well past the auto-repeat delay
    generator.hal_mut().press_after(Button::Start, 10, 1000);
    assert_eq!(count_run_changes(&mut generator, 1300), 1);
    assert!(generator.is_running());
    assert_eq!(generator.hal().dac_last(), Some(0xFF));
    assert_eq!(generator.hal().lcd_row(1), "  Toggle     ON ");

    generator.hal_mut().press_after(Button::Start, 10, 1000);
    assert_eq!(count_run_changes(&mut generator, 1300), 1);
    assert!(!generator.is_running());
    assert_eq!(generator.hal().dac_history(), &[0x80, 0xFF, 0x80]);
    assert_eq!(generator.hal().sync_pulses(), 1);
}

#[test]
fn test_high_speed_toggles_once_per_press() {
    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop).unwrap();
    assert_ok!(goto(&mut generator, MainMode::HighSpeed));

    generator.hal_mut().press_after(Button::Start, 10, 1000);
    assert_eq!(count_run_changes(&mut generator, 1300), 1);
    assert!(generator.is_running());
    assert_eq!(generator.hal().hs_running(), Some(1));

    generator.hal_mut().press_after(Button::Start, 10, 1000);
    assert_eq!(count_run_changes(&mut generator, 1300), 1);
    assert!(!generator.is_running());
    assert_eq!(generator.hal().hs_running(), None);
}
