//! Zero-cross tick dispatch and the fixed-cardinality channel container.

use embedded_hal::digital::OutputPin;

use crate::channel::Channel;
use crate::error::CoreError;

/// Owns exactly `N` channels. The command surface and the HMI cadence
/// loop both index into a station by channel id; the zero-cross
/// scheduler dispatches its tick to every channel it holds.
pub struct Station<const N: usize, P: OutputPin> {
    channels: [Channel<P>; N],
}

impl<const N: usize, P: OutputPin> Station<N, P> {
    pub fn new(channels: [Channel<P>; N]) -> Self {
        Self { channels }
    }

    pub fn len(&self) -> usize {
        N
    }

    pub fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn channel(&self, id: usize) -> Result<&Channel<P>, CoreError> {
        self.channels.get(id).ok_or(CoreError::ChannelIndexOutOfRange)
    }

    pub fn channel_mut(&mut self, id: usize) -> Result<&mut Channel<P>, CoreError> {
        self.channels
            .get_mut(id)
            .ok_or(CoreError::ChannelIndexOutOfRange)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Channel<P>> {
        self.channels.iter()
    }

    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, Channel<P>> {
        self.channels.iter_mut()
    }
}

/// Counts half-cycles between sample windows and dispatches either a
/// duty-slot output update or a sample-window open to every channel in
/// a station. Driven from the zero-cross ISR; never blocks.
pub struct ZeroCrossScheduler {
    n: u16,
    counter: u16,
}

impl ZeroCrossScheduler {
    pub fn new(n: u16) -> Self {
        Self { n, counter: 0 }
    }

    pub fn tick<const N: usize, P: OutputPin>(&mut self, now_us: u32, station: &mut Station<N, P>) {
        if self.counter >= self.n {
            for ch in station.iter_mut() {
                ch.schedule_sample(now_us);
            }
            self.counter = 0;
        } else {
            let op_level = self.counter as f32 / self.n as f32;
            for ch in station.iter_mut() {
                ch.update_output(op_level);
            }
            self.counter += 1;
        }
    }
}
