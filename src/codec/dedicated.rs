//! Dedicated back-logo structure (6 bytes):
//! `[selector, r, g, b, brightness, enable]`.

use super::{
    LogoState, MethodCall, MethodId, Rgb, check_brightness, check_response, decode_bool,
    decode_brightness,
};
use crate::error::{Error, Result};

pub const LEN: usize = 6;
pub const SELECTOR: u8 = 0x02;

pub fn encode(state: &LogoState) -> Result<[u8; LEN]> {
    let c = state.color;
    Ok([
        SELECTOR,
        c.r,
        c.g,
        c.b,
        check_brightness(state.brightness)?,
        u8::from(state.enabled),
    ])
}

pub fn set_call(state: &LogoState) -> Result<MethodCall> {
    Ok(MethodCall::new(MethodId::SetLogo, encode(state)?.to_vec()))
}

pub fn get_call() -> MethodCall {
    MethodCall::new(MethodId::GetLogo, vec![SELECTOR])
}

/// Decode a full `GetLogo` response.
pub fn decode(response: &[u8]) -> Result<LogoState> {
    let body = check_response(MethodId::GetLogo, response)?;
    decode_body(body)
}

pub fn decode_body(buf: &[u8]) -> Result<LogoState> {
    let method = MethodId::GetLogo;
    if buf.len() != LEN {
        return Err(Error::protocol(
            method.id(),
            format!("logo structure must be {} bytes, got {}", LEN, buf.len()),
        ));
    }
    if buf[0] != SELECTOR {
        return Err(Error::protocol(
            method.id(),
            format!("unexpected selector {:#04x}", buf[0]),
        ));
    }
    Ok(LogoState {
        color: Rgb::new(buf[1], buf[2], buf[3]),
        brightness: decode_brightness(method, buf[4])?,
        enabled: decode_bool(method, "enable", buf[5])?,
    })
}
