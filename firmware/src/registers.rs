//! CH32V203 memory map and register access

/// Peripheral base addresses
pub const RCC_BASE: u32 = 0x4002_1000;
pub const FLASH_BASE: u32 = 0x4002_2000;
pub const GPIOA_BASE: u32 = 0x4001_0800;
pub const GPIOB_BASE: u32 = 0x4001_0C00;
pub const AFIO_BASE: u32 = 0x4001_0000;
pub const EXTI_BASE: u32 = 0x4001_0400;
pub const TIM1_BASE: u32 = 0x4001_2C00;
pub const PFIC_BASE: u32 = 0xE000_E000;
pub const SYSTICK_BASE: u32 = 0xE000_F000;

/// RCC register offsets
pub const RCC_CTLR: u32 = 0x00;
pub const RCC_CFGR0: u32 = 0x04;
pub const RCC_APB2PCENR: u32 = 0x18;

/// Flash controller register offsets
pub const FLASH_ACTLR: u32 = 0x00;
pub const FLASH_KEYR: u32 = 0x04;
pub const FLASH_STATR: u32 = 0x0C;
pub const FLASH_CTLR: u32 = 0x10;
pub const FLASH_ADDR: u32 = 0x14;

/// GPIO register offsets
pub const GPIO_CFGLR: u32 = 0x00;
pub const GPIO_CFGHR: u32 = 0x04;
pub const GPIO_INDR: u32 = 0x08;
pub const GPIO_OUTDR: u32 = 0x0C;
pub const GPIO_BSHR: u32 = 0x10;

/// AFIO external interrupt source selection, lines 8..=11 and 12..=15
pub const AFIO_EXTICR3: u32 = 0x10;
pub const AFIO_EXTICR4: u32 = 0x14;

/// EXTI register offsets
pub const EXTI_INTENR: u32 = 0x00;
pub const EXTI_FTENR: u32 = 0x0C;
pub const EXTI_INTFR: u32 = 0x14;

/// TIM1 register offsets
pub const TIM_CTLR1: u32 = 0x00;
pub const TIM_CHCTLR1: u32 = 0x18;
pub const TIM_CCER: u32 = 0x20;
pub const TIM_CNT: u32 = 0x24;
pub const TIM_PSC: u32 = 0x28;
pub const TIM_ATRLR: u32 = 0x2C;
pub const TIM_CH1CVR: u32 = 0x34;
pub const TIM_BDTR: u32 = 0x44;

/// SysTick register offsets (QingKe V4 64-bit up counter)
pub const STK_CTLR: u32 = 0x00;
pub const STK_SR: u32 = 0x04;
pub const STK_CNTL: u32 = 0x08;
pub const STK_CMPLR: u32 = 0x10;
pub const STK_CMPHR: u32 = 0x14;

/// PFIC interrupt enable/disable banks
pub const PFIC_IENR: u32 = 0x100;
pub const PFIC_IRER: u32 = 0x180;

/// Interrupt numbers
pub const IRQ_SYSTICK: u32 = 12;
pub const IRQ_EXTI15_10: u32 = 56;

#[inline(always)]
pub fn read(addr: u32) -> u32 {
    // SAFETY: every caller passes one of the register addresses above
    unsafe { core::ptr::read_volatile(addr as *const u32) }
}

#[inline(always)]
pub fn write(addr: u32, value: u32) {
    // SAFETY: see `read`
    unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
}

#[inline(always)]
pub fn modify(addr: u32, f: impl FnOnce(u32) -> u32) {
    write(addr, f(read(addr)));
}

/// Set or clear one interrupt in the PFIC
pub fn enable_irq(irq: u32, enable: bool) {
    let bank = if enable { PFIC_IENR } else { PFIC_IRER };
    write(PFIC_BASE + bank + (irq / 32) * 4, 1 << (irq % 32));
}

/// Four-bit pin configuration nibble for CFGLR/CFGHR
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMode {
    /// Input with pull-up/down (pull-up selected through OUTDR)
    InputPull = 0b1000,
    /// General purpose push-pull, 50 MHz
    PushPull = 0b0011,
    /// Alternate function push-pull, 50 MHz
    AltPushPull = 0b1011,
}

/// Configure one pin of a port
pub fn configure_pin(port: u32, pin: u32, mode: PinMode) {
    let (reg, shift) = if pin < 8 { (GPIO_CFGLR, pin * 4) } else { (GPIO_CFGHR, (pin - 8) * 4) };
    modify(port + reg, |v| (v & !(0xF << shift)) | ((mode as u32) << shift));
}
