//! Pin mapping for the iron-station reference board (STM32F407).
//!
//! Every heater and heartbeat pin is erased to the HAL's type-erased
//! `ErasedPin` so a fixed-size array of per-channel pins can share one
//! concrete type, matching what `iron_core::Channel<P>` needs to be
//! homogeneous across channels.

use stm32f4xx_hal::gpio::{Alternate, ErasedPin, Input, OpenDrain, Output, Pin, PushPull};
use stm32f4xx_hal::pac::{GPIOA, GPIOB, GPIOC};
use stm32f4xx_hal::prelude::*;
use stm32f4xx_hal::rcc::Rcc;

pub const CHANNEL_COUNT: usize = 4;

pub struct BoardPins {
    pub heater: [ErasedPin<Output<PushPull>>; CHANNEL_COUNT],
    pub stand_sense: [ErasedPin<Input>; CHANNEL_COUNT],
    pub heartbeat: ErasedPin<Output<PushPull>>,
    pub eeprom_scl: Pin<'B', 6, Alternate<4, OpenDrain>>,
    pub eeprom_sda: Pin<'B', 7, Alternate<4, OpenDrain>>,
}

impl BoardPins {
    pub fn new(gpioa: GPIOA, gpiob: GPIOB, gpioc: GPIOC, rcc: &mut Rcc) -> Self {
        let gpioa = gpioa.split(rcc);
        let gpiob = gpiob.split(rcc);
        let gpioc = gpioc.split(rcc);

        let heater = [
            gpioa.pa4.into_push_pull_output().erase(),
            gpioa.pa5.into_push_pull_output().erase(),
            gpioa.pa6.into_push_pull_output().erase(),
            gpioa.pa7.into_push_pull_output().erase(),
        ];
        let stand_sense = [
            gpiob.pb12.into_pull_up_input().erase(),
            gpiob.pb13.into_pull_up_input().erase(),
            gpiob.pb14.into_pull_up_input().erase(),
            gpiob.pb15.into_pull_up_input().erase(),
        ];

        Self {
            heater,
            stand_sense,
            heartbeat: gpioc.pc13.into_push_pull_output().erase(),
            eeprom_scl: gpiob.pb6.into_alternate_open_drain(),
            eeprom_sda: gpiob.pb7.into_alternate_open_drain(),
        }
    }
}
