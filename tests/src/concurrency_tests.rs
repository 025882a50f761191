//! The interrupt-shared state exercised from real threads

use std::sync::Arc;
use std::time::Duration;

use dds_core::dds::{DdsTiming, PhaseIncrement, SampleEngine, SoftwareEngine};
use dds_core::input::{ButtonLatch, ButtonPoller};
use dds_core::waveform::{WaveBuffer, SQUARE};
use dds_core::{Button, StopFlag};

use crate::CountingDac;

#[tokio::test]
async fn test_stop_flag_ends_output_loop_on_another_thread() {
    let stop = Arc::new(StopFlag::new());
    let engine_stop = stop.clone();

    let output = tokio::task::spawn_blocking(move || {
        let mut buffer = WaveBuffer::new();
        buffer.load(&SQUARE);
        let mut engine = SoftwareEngine::new(CountingDac::default(), DdsTiming::REFERENCE);
        engine.run_phase(&buffer, PhaseIncrement::new(9437), &engine_stop);
        engine.into_inner()
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    stop.raise();

    let dac = tokio::time::timeout(Duration::from_secs(5), output)
        .await
        .expect("output loop did not stop")
        .unwrap();
    assert!(dac.writes > 0);
    assert!(dac.last == 0 || dac.last == 255);
}

#[tokio::test]
async fn test_latch_hands_presses_across_threads() {
    let latch = Arc::new(ButtonLatch::new());
    let tick_latch = latch.clone();

    // Stand-in for the tick interrupt: one press of Right, then released
    let ticker = tokio::task::spawn_blocking(move || {
        let mut poller = ButtonPoller::new();
        for tick in 0..60 {
            let raw = if tick < 5 { Button::Right } else { Button::None };
            poller.tick(raw, &tick_latch);
            std::thread::sleep(Duration::from_micros(200));
        }
    });

    let mut seen = Vec::new();
    while !ticker.is_finished() {
        if let Some(button) = latch.take_unprocessed() {
            seen.push(button);
        }
        tokio::task::yield_now().await;
    }
    ticker.await.unwrap();
    if let Some(button) = latch.take_unprocessed() {
        seen.push(button);
    }

    assert_eq!(seen, vec![Button::Right]);
    assert_eq!(latch.pressed(), Button::None);
    assert_eq!(latch.tick_count(), 60);
}
