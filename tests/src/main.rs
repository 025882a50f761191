// Scripted front panel session on the virtual board

use dds_core::test_utils::{run_for, VirtualBoard};
use dds_core::{Button, Generator, HalError};

fn main() -> Result<(), HalError> {
    println!("🧪 DDS generator scenario run");

    let board = VirtualBoard::new();
    let (latch, stop) = (board.latch(), board.stop());
    let mut generator = Generator::boot(board, &latch, &stop)?;
    print_screen(&generator);

    // Two steps up, run for a while, stop
    generator.hal_mut().press_after(Button::Right, 10, 30);
    generator.hal_mut().press_after(Button::Right, 200, 30);
    generator.hal_mut().press_after(Button::Start, 400, 40);
    generator.hal_mut().press_after(Button::Start, 900, 40);
    run_for(&mut generator, 1200)?;
    print_screen(&generator);

    println!(
        "📊 {} samples, {} sync pulses, {:.1} ms in output loops",
        generator.hal().dac_writes(),
        generator.hal().sync_pulses(),
        generator.hal().engine_cycles() as f64 * 1000.0 / dds_core::DdsTiming::REFERENCE.cpu_hz as f64,
    );
    println!("✅ Stopped at {} ms", generator.hal().now_ms());
    Ok(())
}

fn print_screen(generator: &Generator<'_, VirtualBoard>) {
    println!("  ┌────────────────┐");
    println!("  │{}│", generator.hal().lcd_row(0));
    println!("  │{}│", generator.hal().lcd_row(1));
    println!("  └────────────────┘");
}
