//! The `id:command:arg` request grammar and its dispatch table.
//!
//! Parsing never allocates: a `Request` borrows straight from the framed
//! line. Dispatch is a plain `match` over the verb rather than a lookup
//! table, since the verb set is small and fixed — the closest thing the
//! pack has to this shape is a fixed binary opcode match, not a runtime
//! registry. A response body is just the stringified value or `OK`;
//! nothing echoes the channel id or verb back.

use core::fmt::Write;
use heapless::String;
use iron_core::{CalibrationTable, Channel, HmiSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtoError {
    Malformed,
    UnknownCommand,
    InvalidArgument,
    ChannelIndexOutOfRange,
}

impl core::fmt::Display for ProtoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtoError::Malformed => write!(f, "Malformed command. Format: id:command:value_or_?"),
            ProtoError::UnknownCommand => write!(f, "Unknown command"),
            ProtoError::InvalidArgument => write!(f, "Invalid argument"),
            ProtoError::ChannelIndexOutOfRange => write!(f, "Invalid device ID"),
        }
    }
}

/// A parsed `id:command:arg` request. `arg` is either `"?"` (get) or a
/// textual value (set) — the grammar has no bare-verb form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub channel_id: u8,
    pub verb: &'a str,
    pub arg: &'a str,
}

/// Splits a framed, already-terminator-stripped line into a `Request`.
pub fn parse_request(line: &str) -> Result<Request<'_>, ProtoError> {
    let mut parts = line.splitn(3, ':');
    let id_str = parts.next().ok_or(ProtoError::Malformed)?;
    let verb = parts.next().ok_or(ProtoError::Malformed)?;
    let arg = parts.next().ok_or(ProtoError::Malformed)?;
    if verb.is_empty() || arg.is_empty() {
        return Err(ProtoError::Malformed);
    }
    let channel_id: u8 = id_str.parse().map_err(|_| ProtoError::Malformed)?;
    Ok(Request {
        channel_id,
        verb,
        arg,
    })
}

/// Reply buffer type shared by every handler.
pub type ReplyBuf = String<32>;

const OK: &str = "OK";

fn reply_float(buf: &mut ReplyBuf, value: f32, precision: usize) {
    buf.clear();
    let _ = write!(buf, "{:.*}", precision, value);
}

fn reply_bool(buf: &mut ReplyBuf, value: bool) {
    buf.clear();
    let _ = buf.push_str(if value { "1" } else { "0" });
}

fn reply_ok(buf: &mut ReplyBuf) {
    buf.clear();
    let _ = buf.push_str(OK);
}

fn parse_f32(arg: &str) -> Result<f32, ProtoError> {
    arg.parse().map_err(|_| ProtoError::InvalidArgument)
}

fn parse_bool(arg: &str) -> Result<bool, ProtoError> {
    match arg {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(ProtoError::InvalidArgument),
    }
}

/// Dispatches one already-resolved request against a channel, writing
/// the text reply into `buf`. On `Err`, `buf` holds the error body text
/// (without the `ERROR ` prefix the serial transport adds).
pub fn dispatch<P: embedded_hal::digital::OutputPin>(
    req: &Request<'_>,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    let result = match req.verb {
        "en" => set_enable(req.arg, channel, buf),
        "set_t" => set_temp(req.arg, channel, buf),
        "meas_t" => read_only_float(req.arg, channel.temp_pv, 2, buf),
        "meas_uv" => read_only_float(req.arg, channel.tc_voltage_pv, 5, buf),
        "sleep_state" => read_only_bool(req.arg, channel.is_sleeping(), buf),
        "pid_op" => read_only_float(req.arg, channel.pid.output, 4, buf),
        "runaway_t" => runaway_t(req.arg, channel, buf),
        "set_min_t" => set_min_t(req.arg, channel, buf),
        "set_max_t" => set_max_t(req.arg, channel, buf),
        "set_uv" => set_uv(req.arg, channel, buf),
        "pid_kp" => gain_non_negative(req.arg, &mut channel.pid.kp, 5, buf),
        "pid_ki" => gain_non_negative(req.arg, &mut channel.pid.ki, 5, buf),
        "pid_kd" => gain_non_negative(req.arg, &mut channel.pid.kd, 5, buf),
        "pid_d_tau" => gain_non_negative(req.arg, &mut channel.pid.derivative_tau, 5, buf),
        "sleep_set_t" => sleep_set_t(req.arg, channel, buf),
        "sleep_delay" => gain_non_negative(req.arg, &mut channel.sleep_delay_ms, 0, buf),
        "tc_cal_table" => cal_table(req.arg, channel, buf),
        "restore" => restore(req.arg, channel, buf),
        _ => Err(ProtoError::UnknownCommand),
    };
    if let Err(e) = result {
        buf.clear();
        let _ = write!(buf, "{}", e);
    }
    result
}

fn set_enable<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_bool(buf, channel.enable);
        return Ok(());
    }
    let value = parse_bool(arg)?;
    channel.set_enable(value);
    reply_ok(buf);
    Ok(())
}

fn read_only_float(arg: &str, value: f32, precision: usize, buf: &mut ReplyBuf) -> Result<(), ProtoError> {
    if arg != "?" {
        return Err(ProtoError::InvalidArgument);
    }
    reply_float(buf, value, precision);
    Ok(())
}

fn read_only_bool(arg: &str, value: bool, buf: &mut ReplyBuf) -> Result<(), ProtoError> {
    if arg != "?" {
        return Err(ProtoError::InvalidArgument);
    }
    reply_bool(buf, value);
    Ok(())
}

fn set_temp<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.temp_sp, 2);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    if value < channel.temp_sp_min || value > channel.temp_sp_max {
        return Err(ProtoError::InvalidArgument);
    }
    channel.temp_sp = value;
    channel.tc_voltage_sp = channel.calibration.temp_to_tcv(value);
    reply_ok(buf);
    Ok(())
}

fn runaway_t<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.temp_runaway_threshold, 1);
        return Ok(());
    }
    let mut value = parse_f32(arg)?;
    let tcv = channel.calibration.temp_to_tcv(value);
    if tcv > channel.tc_max_voltage_setpoint {
        value = channel.calibration.tcv_to_temp(channel.tc_max_voltage_setpoint);
    }
    channel.temp_runaway_threshold = value;
    reply_ok(buf);
    Ok(())
}

fn set_min_t<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.temp_sp_min, 0);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    if value < 0.0 || value > channel.temp_sp_max {
        return Err(ProtoError::InvalidArgument);
    }
    channel.temp_sp_min = value;
    reply_ok(buf);
    Ok(())
}

fn set_max_t<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.temp_sp_max, 0);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    let hardware_max = channel.calibration.tcv_to_temp(channel.tc_max_voltage_setpoint);
    if value < channel.temp_sp_min || value > hardware_max {
        return Err(ProtoError::InvalidArgument);
    }
    channel.temp_sp_max = value;
    reply_ok(buf);
    Ok(())
}

fn set_uv<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.tc_voltage_sp, 5);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    if value < 0.0 || value > channel.tc_max_voltage_setpoint {
        return Err(ProtoError::InvalidArgument);
    }
    channel.tc_voltage_sp = value;
    channel.temp_sp = channel.calibration.tcv_to_temp(value);
    reply_ok(buf);
    Ok(())
}

fn gain_non_negative(arg: &str, field: &mut f32, precision: usize, buf: &mut ReplyBuf) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, *field, precision);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    if value < 0.0 {
        return Err(ProtoError::InvalidArgument);
    }
    *field = value;
    reply_ok(buf);
    Ok(())
}

fn sleep_set_t<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        reply_float(buf, channel.calibration.tcv_to_temp(channel.sleep_voltage_sp), 1);
        return Ok(());
    }
    let value = parse_f32(arg)?;
    if value < channel.temp_sp_min || value > channel.temp_sp_max {
        return Err(ProtoError::InvalidArgument);
    }
    channel.sleep_voltage_sp = channel.calibration.temp_to_tcv(value);
    reply_ok(buf);
    Ok(())
}

/// `tc_cal_table` writes are never rejected for non-monotonicity, per
/// the source's own behavior — only logged, so a degenerate table is
/// visible in the field without bricking the write path.
#[cfg(feature = "defmt")]
fn warn_if_non_monotonic(calibration: &CalibrationTable) {
    if !calibration.is_monotonic() {
        defmt::warn!("tc_cal_table write left the table non-monotonic");
    }
}

#[cfg(not(feature = "defmt"))]
fn warn_if_non_monotonic(_calibration: &CalibrationTable) {}

/// `?` reports the table size; a bare index reads one `[v,t]` pair; an
/// index followed by a bracketed pair writes it. Writes aren't checked
/// for monotonicity against their neighbors.
fn cal_table<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    if arg == "?" {
        buf.clear();
        let _ = write!(buf, "{}", channel.calibration.len());
        return Ok(());
    }
    if let Some(bracket) = arg.find('[') {
        let index: usize = arg[..bracket].parse().map_err(|_| ProtoError::InvalidArgument)?;
        let inner = arg[bracket + 1..]
            .strip_suffix(']')
            .ok_or(ProtoError::InvalidArgument)?;
        let mut fields = inner.splitn(2, ',');
        let v: f32 = fields
            .next()
            .ok_or(ProtoError::InvalidArgument)?
            .parse()
            .map_err(|_| ProtoError::InvalidArgument)?;
        let t: f32 = fields
            .next()
            .ok_or(ProtoError::InvalidArgument)?
            .parse()
            .map_err(|_| ProtoError::InvalidArgument)?;
        if !channel.calibration.set_entry(index, v, t) {
            return Err(ProtoError::InvalidArgument);
        }
        warn_if_non_monotonic(&channel.calibration);
        reply_ok(buf);
        Ok(())
    } else {
        let index: usize = arg.parse().map_err(|_| ProtoError::InvalidArgument)?;
        let (v, t) = channel
            .calibration
            .entry(index)
            .ok_or(ProtoError::InvalidArgument)?;
        buf.clear();
        let _ = write!(buf, "[{:.2},{:.2}]", v, t);
        Ok(())
    }
}

/// Validates the argument as a thermocouple sensitivity in `(0, 40]`
/// µV/K, resets the channel's tunables to their factory defaults, and —
/// preserving a cross-field quirk rather than "fixing" it — assigns the
/// raw sensitivity value straight into `tc_voltage_sp` instead of using
/// it to reseed the calibration table.
fn restore<P: embedded_hal::digital::OutputPin>(
    arg: &str,
    channel: &mut Channel<P>,
    buf: &mut ReplyBuf,
) -> Result<(), ProtoError> {
    let value = parse_f32(arg)?;
    if value <= 0.0 || value > 40.0 {
        return Err(ProtoError::InvalidArgument);
    }
    channel.temp_sp_min = 0.0;
    channel.temp_sp_max = 450.0;
    channel.temp_runaway_threshold = 450.0;
    channel.sleep_voltage_sp = 0.0;
    channel.sleep_delay_ms = 30_000.0;
    channel.pid.kp = 0.0;
    channel.pid.ki = 0.0;
    channel.pid.kd = 0.0;
    channel.pid.derivative_tau = 0.0;

    channel.tc_voltage_sp = value;
    reply_ok(buf);
    Ok(())
}

pub type ResponseBuf = String<40>;

/// Builds the final transport line body: `body` verbatim on success, or
/// `ERROR ` prefixed to it on failure. The caller appends whichever
/// terminator its link uses.
pub fn render_response(ok: bool, body: &str, out: &mut ResponseBuf) {
    out.clear();
    if !ok {
        let _ = out.push_str("ERROR ");
    }
    let _ = out.push_str(body);
}

/// Drains a channel's HMI fields through a sink, ignoring the pause
/// flag the caller is responsible for checking before calling this.
pub fn push_hmi<P: embedded_hal::digital::OutputPin, H: HmiSink>(
    channel: &mut Channel<P>,
    now_ms: u32,
    sink: &mut H,
) {
    channel.push_hmi_if_due(now_ms, sink);
}
