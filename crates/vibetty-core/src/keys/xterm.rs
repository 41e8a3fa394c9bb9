//! xterm byte sequences for terminal key requests.
//!
//! Cursor keys use the CSI form (`ESC [ A`).  When modifiers are asserted the
//! parameterised form `ESC [ 1 ; <m> A` is used, where `m = 1 + shift + 2·alt
//! + 4·ctrl` as in xterm's `modifyCursorKeys`.

use super::{KeyRequest, TerminalKey};

const ESC: u8 = 0x1B;

/// Encodes `request` as the bytes an xterm-compatible terminal would send.
pub fn encode_key(request: &KeyRequest) -> Vec<u8> {
    let mods = request.modifiers;
    match request.key {
        TerminalKey::Up | TerminalKey::Down => {
            let final_byte = if request.key == TerminalKey::Up { b'A' } else { b'B' };
            if mods.is_empty() {
                vec![ESC, b'[', final_byte]
            } else {
                let param = 1 + u8::from(mods.shift()) + 2 * u8::from(mods.alt()) + 4 * u8::from(mods.ctrl());
                vec![ESC, b'[', b'1', b';', b'0' + param, final_byte]
            }
        }
        TerminalKey::Tab if mods.shift() => vec![ESC, b'[', b'Z'],
        TerminalKey::Escape | TerminalKey::Tab | TerminalKey::Enter => {
            let base = match request.key {
                TerminalKey::Escape => ESC,
                TerminalKey::Tab => b'\t',
                _ => b'\r',
            };
            if mods.alt() {
                vec![ESC, base]
            } else {
                vec![base]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{LogicalKey, Modifiers};

    #[test]
    fn test_plain_arrows_use_csi_form() {
        assert_eq!(LogicalKey::ArrowUp.request().xterm_bytes(), b"\x1b[A");
        assert_eq!(LogicalKey::ArrowDown.request().xterm_bytes(), b"\x1b[B");
    }

    #[test]
    fn test_ctrl_arrows_use_modifier_parameter_five() {
        assert_eq!(LogicalKey::CtrlArrowUp.request().xterm_bytes(), b"\x1b[1;5A");
        assert_eq!(LogicalKey::CtrlArrowDown.request().xterm_bytes(), b"\x1b[1;5B");
    }

    #[test]
    fn test_single_byte_keys() {
        assert_eq!(LogicalKey::Escape.request().xterm_bytes(), vec![0x1B]);
        assert_eq!(LogicalKey::Tab.request().xterm_bytes(), vec![0x09]);
        assert_eq!(LogicalKey::Enter.request().xterm_bytes(), vec![0x0D]);
    }

    #[test]
    fn test_shift_tab_is_back_tab() {
        let req = KeyRequest::new(TerminalKey::Tab, Modifiers::SHIFT);
        assert_eq!(req.xterm_bytes(), b"\x1b[Z");
    }

    #[test]
    fn test_alt_prefixes_escape() {
        let req = KeyRequest::new(TerminalKey::Enter, Modifiers::ALT);
        assert_eq!(req.xterm_bytes(), vec![0x1B, 0x0D]);
    }

    #[test]
    fn test_ctrl_alt_shift_arrow_parameter_is_eight() {
        let req = KeyRequest::new(TerminalKey::Up, Modifiers::CTRL | Modifiers::ALT | Modifiers::SHIFT);
        assert_eq!(req.xterm_bytes(), b"\x1b[1;8A");
    }
}
