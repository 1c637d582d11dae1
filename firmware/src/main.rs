// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

#![no_main]
#![no_std]

use cortex_m::{delay::Delay, peripheral::NVIC};
use cortex_m_rt::entry;
use log::{info, warn, LevelFilter};
use panic_halt as _;

use hal::{
    pac::{self, interrupt, Interrupt},
    prelude::*,
    serial::{Config, Serial},
};
use stm32f7xx_hal as hal;

use rathing::config::{ModemConfig, DEBUG_BAUD, LINK_BAUD};
use rathing::control::{dispatch, ServoBank};
use rathing::power::PowerMonitor;
use rathing::sensing::{AnalogScanner, Readings, Telemetry};
use rathing::transport::{IrqCell, Modem, Transport};

mod hw;
use hw::pins::ADC_CHANNELS;
use hw::{BoardPins, DebugLog, ModemUsart, NvicGate, PowerIo};

const MODEM_CONFIG: ModemConfig = ModemConfig::DEFAULT;

/// Control periods between battery checks (1 s at 50 Hz).
const POWER_CHECK_TICKS: u16 = 50;

/// Owned by USART2.
static MODEM: IrqCell<Transport<ModemUsart>> =
    IrqCell::new(Transport::new(ModemUsart::new(), &MODEM_CONFIG));
/// Owned by TIM4.
static SERVOS: IrqCell<ServoBank> = IrqCell::new(ServoBank::new());
/// Owned by TIM4.
static POWER_IO: IrqCell<Option<PowerIo>> = IrqCell::new(None);
/// Written by ADC.
static READINGS: Readings = Readings::new();

fn serial_config(baud: u32) -> Config {
    Config {
        baud_rate: baud.bps(),
        ..Default::default()
    }
}

#[entry]
fn main() -> ! {
    // Peripherals
    let (Some(dp), Some(cp)) = (pac::Peripherals::take(), cortex_m::Peripherals::take()) else {
        panic!("peripherals already taken");
    };
    let mut nvic = cp.NVIC;

    // Clocks
    let rcc = dp.RCC.constrain();
    let clocks = rcc.cfgr.freeze();

    // GPIO
    let pins = BoardPins::new(dp.GPIOA, dp.GPIOB, dp.GPIOC, dp.GPIOD, dp.GPIOE);

    // USART1 (DBG)
    let debug = Serial::new(
        dp.USART1,
        (pins.usart1.tx, pins.usart1.rx),
        &clocks,
        serial_config(DEBUG_BAUD),
    );
    DebugLog::install(debug, LevelFilter::Info);

    // USART2 (ESP8266)
    let link = Serial::new(
        dp.USART2,
        (pins.usart2.tx, pins.usart2.rx),
        &clocks,
        serial_config(LINK_BAUD),
    );
    hw::modem::init(link);

    // Feedback scan and servo pulses
    hw::adc::init(dp.ADC1, ADC_CHANNELS[0]);
    let timer_clock = hw::pwm::apb1_timer_clock(clocks.pclk1().raw());
    hw::pwm::init(dp.TIM3, dp.TIM4, timer_clock);

    // Modem bytes first, debug output last
    unsafe {
        nvic.set_priority(Interrupt::USART2, 0x10);
        nvic.set_priority(Interrupt::TIM4, 0x40);
        nvic.set_priority(Interrupt::ADC, 0x40);
        nvic.set_priority(Interrupt::USART1, 0xE0);
        NVIC::unmask(Interrupt::USART1);
        NVIC::unmask(Interrupt::ADC);
    }
    // USART2 and TIM4 are unmasked when their cells are first locked.

    let control = NvicGate(Interrupt::TIM4);
    let power_io = PowerIo::new(pins.leds, pins.power);
    POWER_IO.lock(&control, |io| *io = Some(power_io));

    let modem = Modem::new(&MODEM, NvicGate(Interrupt::USART2));
    let mut delay = Delay::new(cp.SYST, clocks.sysclk().raw());
    modem.initialize(&mut delay, &MODEM_CONFIG);

    info!("RA Thing v0.1 READY");

    loop {
        let cmd = modem.wait_command();
        info!("C{} S{} D{}", cmd.opcode_bits(), cmd.target(), cmd.data());

        match SERVOS.lock(&control, |servos| dispatch(cmd, servos, &READINGS)) {
            Ok(Some(reply)) => modem.send_command(reply),
            Ok(None) => {}
            Err(e) => warn!("ignored {:#06x}: {}", cmd.raw(), e),
        }
    }
}

#[interrupt]
fn USART2() {
    // SAFETY: USART2 owns MODEM; the main loop masks USART2 around every access.
    unsafe {
        MODEM.with_owner(|t| {
            while let Some(byte) = t.link_mut().read() {
                t.feed(byte);
            }
            if t.link().tx_pending() {
                t.on_tx_ready();
            }
        })
    }
}

#[interrupt]
fn TIM4() {
    static mut POWER: PowerMonitor = PowerMonitor::new(POWER_CHECK_TICKS);

    if !hw::pwm::take_update() {
        return;
    }

    let readings = READINGS.servo_readings();
    // SAFETY: TIM4 owns SERVOS and POWER_IO; the main loop masks TIM4 around every access.
    let pulses = unsafe { SERVOS.with_owner(|servos| servos.step(&readings)) };
    hw::pwm::set_pulses(&pulses);

    let battery = READINGS.battery();
    unsafe {
        POWER_IO.with_owner(|io| {
            if let Some(io) = io {
                if let Some(output) = POWER.tick(battery, io.supply()) {
                    io.apply(output);
                }
            }
        })
    }
}

#[interrupt]
fn ADC() {
    static mut SCANNER: AnalogScanner = AnalogScanner::new(ADC_CHANNELS);

    let raw = hw::adc::take_result();
    let next = SCANNER.complete(raw, &READINGS);
    hw::adc::start(next);
}

#[interrupt]
fn USART1() {
    hw::usart::on_interrupt();
}
