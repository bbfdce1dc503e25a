//! Display push capability.
//!
//! A channel doesn't know the name of the field it's writing to on the
//! physical display — that binding (which Nextion component backs
//! "this channel's process value") is a wiring concern that belongs to
//! whatever owns the serial link to the display. `Channel` only knows
//! *which logical slot* it's updating; the `HmiSink` implementation maps
//! that slot to an actual field name per channel.
pub enum HmiField {
    ProcessValue,
    SetPoint,
    OutputPercent,
    EnableState,
    SleepState,
}

pub trait HmiSink {
    fn push_text(&mut self, field: HmiField, text: &str);
    fn push_value(&mut self, field: HmiField, value: i32);
    fn push_color(&mut self, field: HmiField, color: u32);
}

/// Sink that drops every update. Useful for channels with no attached
/// display and for tests that don't care about HMI traffic.
pub struct NullHmiSink;

impl HmiSink for NullHmiSink {
    fn push_text(&mut self, _field: HmiField, _text: &str) {}
    fn push_value(&mut self, _field: HmiField, _value: i32) {}
    fn push_color(&mut self, _field: HmiField, _color: u32) {}
}
