// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Pin definitions for the STM32F777 on the RA Thing hand controller.

use stm32f7xx_hal::{
    gpio::{gpioa, gpiob, gpioc, gpiod, gpioe, Alternate, Analog, Floating, Input, Output, PushPull},
    pac,
    prelude::*,
};

use rathing::sensing::SLOT_COUNT;

/// ADC1 input channel of every scan slot: current and angle per finger, then the battery.
pub const ADC_CHANNELS: [u8; SLOT_COUNT] = [0, 1, 4, 5, 7, 8, 9, 10, 11, 12, 13];

/// All board pins. Construct this once at startup using:
///
/// ```rust
/// let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);
/// ```
pub struct BoardPins {
    pub leds: LedPins,
    pub usart1: Usart1Pins,
    pub usart2: Usart2Pins,
    pub servos: ServoPins,
    pub analog: AnalogPins,
    pub power: PowerPins,
}

/// Battery level bar, lowest level first.
pub struct LedPins {
    pub low: gpiod::PD8<Output<PushPull>>,
    pub medium: gpiod::PD9<Output<PushPull>>,
    pub high: gpiod::PD10<Output<PushPull>>,
}

/// Debug line
pub struct Usart1Pins {
    pub tx: gpioa::PA9<Alternate<7>>,
    pub rx: gpioa::PA10<Alternate<7>>,
}

/// ESP8266 modem
pub struct Usart2Pins {
    pub tx: gpiod::PD5<Alternate<7>>,
    pub rx: gpiod::PD6<Alternate<7>>,
}

/// Servo control pulses
pub struct ServoPins {
    pub thumb: gpiod::PD12<Alternate<2>>,  // TIM4_CH1
    pub index: gpiod::PD13<Alternate<2>>,  // TIM4_CH2
    pub middle: gpiod::PD14<Alternate<2>>, // TIM4_CH3
    pub ring: gpiod::PD15<Alternate<2>>,   // TIM4_CH4
    pub pinky: gpioa::PA6<Alternate<2>>,   // TIM3_CH1
}

/// Servo feedback and battery voltage, in [`ADC_CHANNELS`] order.
pub struct AnalogPins {
    pub thumb_current: gpioa::PA0<Analog>,  // ADC1_IN0
    pub thumb_angle: gpioa::PA1<Analog>,    // ADC1_IN1
    pub index_current: gpioa::PA4<Analog>,  // ADC1_IN4
    pub index_angle: gpioa::PA5<Analog>,    // ADC1_IN5
    pub middle_current: gpioa::PA7<Analog>, // ADC1_IN7
    pub middle_angle: gpiob::PB0<Analog>,   // ADC1_IN8
    pub ring_current: gpiob::PB1<Analog>,   // ADC1_IN9
    pub ring_angle: gpioc::PC0<Analog>,     // ADC1_IN10
    pub pinky_current: gpioc::PC1<Analog>,  // ADC1_IN11
    pub pinky_angle: gpioc::PC2<Analog>,    // ADC1_IN12
    pub battery: gpioc::PC3<Analog>,        // ADC1_IN13
}

/// Boost converter shutdown and charger status
pub struct PowerPins {
    pub converters_off: gpioe::PE0<Output<PushPull>>,
    pub usb_present: gpioe::PE1<Input<Floating>>,
    pub charge_done: gpioe::PE2<Input<Floating>>,
}

impl BoardPins {
    /// Create all named pins from raw GPIO peripherals.
    pub fn new(
        gpioa: pac::GPIOA,
        gpiob: pac::GPIOB,
        gpioc: pac::GPIOC,
        gpiod: pac::GPIOD,
        gpioe: pac::GPIOE,
    ) -> Self {
        let gpioa = gpioa.split();
        let gpiob = gpiob.split();
        let gpioc = gpioc.split();
        let gpiod = gpiod.split();
        let gpioe = gpioe.split();

        Self {
            leds: LedPins {
                low: gpiod.pd8.into_push_pull_output(),
                medium: gpiod.pd9.into_push_pull_output(),
                high: gpiod.pd10.into_push_pull_output(),
            },

            usart1: Usart1Pins {
                tx: gpioa.pa9.into_alternate::<7>(),
                rx: gpioa.pa10.into_alternate::<7>(),
            },

            usart2: Usart2Pins {
                tx: gpiod.pd5.into_alternate::<7>(),
                rx: gpiod.pd6.into_alternate::<7>(),
            },

            servos: ServoPins {
                thumb: gpiod.pd12.into_alternate::<2>(),
                index: gpiod.pd13.into_alternate::<2>(),
                middle: gpiod.pd14.into_alternate::<2>(),
                ring: gpiod.pd15.into_alternate::<2>(),
                pinky: gpioa.pa6.into_alternate::<2>(),
            },

            analog: AnalogPins {
                thumb_current: gpioa.pa0.into_analog(),
                thumb_angle: gpioa.pa1.into_analog(),
                index_current: gpioa.pa4.into_analog(),
                index_angle: gpioa.pa5.into_analog(),
                middle_current: gpioa.pa7.into_analog(),
                middle_angle: gpiob.pb0.into_analog(),
                ring_current: gpiob.pb1.into_analog(),
                ring_angle: gpioc.pc0.into_analog(),
                pinky_current: gpioc.pc1.into_analog(),
                pinky_angle: gpioc.pc2.into_analog(),
                battery: gpioc.pc3.into_analog(),
            },

            power: PowerPins {
                converters_off: gpioe.pe0.into_push_pull_output(),
                usb_present: gpioe.pe1.into_floating_input(),
                charge_done: gpioe.pe2.into_floating_input(),
            },
        }
    }
}
