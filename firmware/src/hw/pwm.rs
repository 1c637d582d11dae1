// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! 50 Hz servo pulses on TIM4 CH1-4 and TIM3 CH1.
//!
//! Both timers count microseconds, so a compare value is a pulse width in µs. The TIM4 update
//! interrupt marks the start of every period and runs the control loop.

use stm32f7xx_hal::pac;

use rathing::config::servo::PERIOD_US;
use rathing::config::ACTUATOR_COUNT;

/// PWM mode 1 with preload, for both channels of a CCMR register.
const PWM1_PAIR: u32 = 0x6868;
const CC1E: u32 = 1;
const CC1_TO_CC4E: u32 = 0x1111;

#[inline]
fn tim3() -> &'static pac::tim3::RegisterBlock {
    unsafe { &*pac::TIM3::ptr() }
}

#[inline]
fn tim4() -> &'static pac::tim3::RegisterBlock {
    unsafe { &*pac::TIM4::ptr() }
}

fn configure(tim: &pac::tim3::RegisterBlock, prescaler: u32, channels: u32) {
    // Disable counter while configuring
    tim.cr1.modify(|_, w| w.cen().clear_bit());

    tim.psc.write(|w| unsafe { w.bits(prescaler) });
    tim.arr.write(|w| unsafe { w.bits(u32::from(PERIOD_US) - 1) });

    tim.ccmr1_output().write(|w| unsafe { w.bits(PWM1_PAIR) });
    tim.ccmr2_output().write(|w| unsafe { w.bits(PWM1_PAIR) });
    tim.ccer.write(|w| unsafe { w.bits(channels) });

    // Outputs stay low until the control loop sets a pulse.
    tim.ccr1.write(|w| unsafe { w.bits(0) });
    tim.ccr2.write(|w| unsafe { w.bits(0) });
    tim.ccr3.write(|w| unsafe { w.bits(0) });
    tim.ccr4.write(|w| unsafe { w.bits(0) });

    // Load the prescaler, then drop the update flag it raised.
    tim.egr.write(|w| w.ug().set_bit());
    tim.sr.write(|w| unsafe { w.bits(0) });

    tim.cr1.modify(|_, w| w.arpe().set_bit().cen().set_bit());
}

/// Start both timers. `timer_clock_hz` is the APB1 timer clock.
pub fn init(_tim3: pac::TIM3, _tim4: pac::TIM4, timer_clock_hz: u32) {
    let rcc = unsafe { &*pac::RCC::ptr() };
    rcc.apb1enr
        .modify(|_, w| w.tim3en().set_bit().tim4en().set_bit());

    let prescaler = timer_clock_hz / 1_000_000 - 1;
    configure(tim3(), prescaler, CC1E);
    configure(tim4(), prescaler, CC1_TO_CC4E);

    tim4().dier.modify(|_, w| w.uie().set_bit());
}

/// APB1 timer clock: PCLK1, doubled when APB1 is divided.
pub fn apb1_timer_clock(pclk1_hz: u32) -> u32 {
    let rcc = unsafe { &*pac::RCC::ptr() };
    if rcc.cfgr.read().ppre1().bits() < 0b100 {
        pclk1_hz
    } else {
        2 * pclk1_hz
    }
}

/// Clear the TIM4 update flag. Returns whether it was set.
pub fn take_update() -> bool {
    let tim = tim4();
    if tim.sr.read().uif().bit_is_clear() {
        return false;
    }
    tim.sr.modify(|_, w| w.uif().clear_bit());
    true
}

/// Pulse widths in µs, thumb to pinky. Applied from the next period.
pub fn set_pulses(pulses: &[u16; ACTUATOR_COUNT]) {
    let [thumb, index, middle, ring, pinky] = *pulses;
    let tim = tim4();
    tim.ccr1.write(|w| unsafe { w.bits(u32::from(thumb)) });
    tim.ccr2.write(|w| unsafe { w.bits(u32::from(index)) });
    tim.ccr3.write(|w| unsafe { w.bits(u32::from(middle)) });
    tim.ccr4.write(|w| unsafe { w.bits(u32::from(ring)) });
    tim3().ccr1.write(|w| unsafe { w.bits(u32::from(pinky)) });
}
