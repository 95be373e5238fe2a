//! Keysym to character and key label conversion.
//!
//! Covers the printable Latin-1 and Unicode keysyms, the keypad, and the
//! legacy Kana, Arabic, Cyrillic, Greek and Hebrew blocks. Function keys get
//! a short label derived from their keysym name.

use super::key_layout::{Keysym, NO_SYMBOL};

/// Unicode keysyms are `0x0100_0000 + code point`.
const UNICODE_KEYSYM_OFFSET: Keysym = 0x0100_0000;

/// `XF86_Switch_VT_1`; the twelve console switch keysyms follow it.
const SWITCH_VT_FIRST: Keysym = 0x1008_fe01;

/// Labels longer than this are cut.
const MAX_LABEL_CHARS: usize = 3;

/// Kana keysyms 0x4a1..=0x4df.
const KANA: [u16; 63] = [
    0x3002, 0x300c, 0x300d, 0x3001, 0x30fb, 0x30f2, 0x30a1, //
    0x30a3, 0x30a5, 0x30a7, 0x30a9, 0x30e3, 0x30e5, 0x30e7, 0x30c3, //
    0x30fc, 0x30a2, 0x30a4, 0x30a6, 0x30a8, 0x30aa, 0x30ab, 0x30ad, //
    0x30af, 0x30b1, 0x30b3, 0x30b5, 0x30b7, 0x30b9, 0x30bb, 0x30bd, //
    0x30bf, 0x30c1, 0x30c4, 0x30c6, 0x30c8, 0x30ca, 0x30cb, 0x30cc, //
    0x30cd, 0x30ce, 0x30cf, 0x30d2, 0x30d5, 0x30d8, 0x30db, 0x30de, //
    0x30df, 0x30e0, 0x30e1, 0x30e2, 0x30e4, 0x30e6, 0x30e8, 0x30e9, //
    0x30ea, 0x30eb, 0x30ec, 0x30ed, 0x30ef, 0x30f3, 0x309b, 0x309c,
];

/// Cyrillic keysyms 0x6a1..=0x6ff.
const CYRILLIC: [u16; 95] = [
    0x0452, 0x0453, 0x0451, 0x0454, 0x0455, 0x0456, 0x0457, //
    0x0458, 0x0459, 0x045a, 0x045b, 0x045c, 0x0491, 0x045e, 0x045f, //
    0x2116, 0x0402, 0x0403, 0x0401, 0x0404, 0x0405, 0x0406, 0x0407, //
    0x0408, 0x0409, 0x040a, 0x040b, 0x040c, 0x0490, 0x040e, 0x040f, //
    0x044e, 0x0430, 0x0431, 0x0446, 0x0434, 0x0435, 0x0444, 0x0433, //
    0x0445, 0x0438, 0x0439, 0x043a, 0x043b, 0x043c, 0x043d, 0x043e, //
    0x043f, 0x044f, 0x0440, 0x0441, 0x0442, 0x0443, 0x0436, 0x0432, //
    0x044c, 0x044b, 0x0437, 0x0448, 0x044d, 0x0449, 0x0447, 0x044a, //
    0x042e, 0x0410, 0x0411, 0x0426, 0x0414, 0x0415, 0x0424, 0x0413, //
    0x0425, 0x0418, 0x0419, 0x041a, 0x041b, 0x041c, 0x041d, 0x041e, //
    0x041f, 0x042f, 0x0420, 0x0421, 0x0422, 0x0423, 0x0416, 0x0412, //
    0x042c, 0x042b, 0x0417, 0x0428, 0x042d, 0x0429, 0x0427, 0x042a,
];

/// Keysym names for keys without a printable character.
const NAMES: &[(Keysym, &str)] = &[
    (0xfe03, "ISO_Level3_Shift"),
    (0xff08, "BackSpace"),
    (0xff09, "Tab"),
    (0xff0d, "Return"),
    (0xff13, "Pause"),
    (0xff14, "Scroll_Lock"),
    (0xff1b, "Escape"),
    (0xff20, "Multi_key"),
    (0xff21, "Kanji"),
    (0xff22, "Muhenkan"),
    (0xff23, "Henkan_Mode"),
    (0xff25, "Hiragana"),
    (0xff26, "Katakana"),
    (0xff27, "Hiragana_Katakana"),
    (0xff2a, "Zenkaku_Hankaku"),
    (0xff31, "Hangul"),
    (0xff34, "Hangul_Hanja"),
    (0xff50, "Home"),
    (0xff51, "Left"),
    (0xff52, "Up"),
    (0xff53, "Right"),
    (0xff54, "Down"),
    (0xff55, "Prior"),
    (0xff56, "Next"),
    (0xff57, "End"),
    (0xff58, "Begin"),
    (0xff61, "Print"),
    (0xff63, "Insert"),
    (0xff67, "Menu"),
    (0xff7e, "Mode_switch"),
    (0xff7f, "Num_Lock"),
    (0xff89, "KP_Tab"),
    (0xff8d, "KP_Enter"),
    (0xff95, "KP_Home"),
    (0xff96, "KP_Left"),
    (0xff97, "KP_Up"),
    (0xff98, "KP_Right"),
    (0xff99, "KP_Down"),
    (0xff9a, "KP_Prior"),
    (0xff9b, "KP_Next"),
    (0xff9c, "KP_End"),
    (0xff9d, "KP_Begin"),
    (0xff9e, "KP_Insert"),
    (0xff9f, "KP_Delete"),
    (0xffe1, "Shift_L"),
    (0xffe2, "Shift_R"),
    (0xffe3, "Control_L"),
    (0xffe4, "Control_R"),
    (0xffe5, "Caps_Lock"),
    (0xffe7, "Meta_L"),
    (0xffe8, "Meta_R"),
    (0xffe9, "Alt_L"),
    (0xffea, "Alt_R"),
    (0xffeb, "Super_L"),
    (0xffec, "Super_R"),
    (0xffed, "Hyper_L"),
    (0xffee, "Hyper_R"),
    (0xffff, "Delete"),
];

/// Labels replacing whole keysym names.
const SHORT_LABELS: &[(&str, &str)] = &[
    ("Zenkaku_Hankaku", "\u{534a}"),
    ("Henkan_Mode", "\u{534a}"),
    ("Return", "\u{21b5}"),
    ("Enter", "\u{21b5}"),
    ("BackSpace", "BS"),
    ("Left", "\u{2190}"),
    ("Up", "\u{2191}"),
    ("Right", "\u{2192}"),
    ("Down", "\u{2193}"),
    ("Prior", "PU"),
    ("Next", "PD"),
    ("Begin", "\u{b7}"),
];

fn from_table(table: &[u16], first: Keysym, keysym: Keysym) -> Option<char> {
    let idx = usize::try_from(keysym.checked_sub(first)?).ok()?;
    table.get(idx).and_then(|&cp| char::from_u32(u32::from(cp)))
}

fn offset(keysym: Keysym, first: Keysym, base: u32) -> Option<char> {
    char::from_u32(base + (keysym - first))
}

/// Character a keysym types, if it is printable.
///
/// Control characters are never returned, so keys like `BackSpace` and
/// `Return` fall through to [`display_name`]'s named labels.
#[must_use]
pub fn keysym_to_char(keysym: Keysym) -> Option<char> {
    let ch = match keysym {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(keysym),
        0x4a1..=0x4df => from_table(&KANA, 0x4a1, keysym),
        0x5ac => Some('\u{060c}'),
        0x5bb => Some('\u{061b}'),
        0x5bf => Some('\u{061f}'),
        0x5c1..=0x5da | 0x5e0..=0x5f2 => offset(keysym, 0x5c1, 0x0621),
        0x6a1..=0x6ff => from_table(&CYRILLIC, 0x6a1, keysym),
        0x7c1..=0x7d1 => offset(keysym, 0x7c1, 0x0391),
        0x7d2 => Some('\u{03a3}'),
        0x7d4..=0x7d9 => offset(keysym, 0x7d4, 0x03a4),
        0x7e1..=0x7f1 => offset(keysym, 0x7e1, 0x03b1),
        0x7f2 => Some('\u{03c3}'),
        0x7f3 => Some('\u{03c2}'),
        0x7f4..=0x7f9 => offset(keysym, 0x7f4, 0x03c4),
        0xcdf => Some('\u{2017}'),
        0xce0..=0xcfa => offset(keysym, 0xce0, 0x05d0),
        0xff80 => Some(' '),
        0xffaa..=0xffb9 => offset(keysym, 0xffaa, 0x2a),
        0xffbd => Some('='),
        k if k > UNICODE_KEYSYM_OFFSET && k <= UNICODE_KEYSYM_OFFSET + 0x10_ffff => {
            char::from_u32(k - UNICODE_KEYSYM_OFFSET)
        }
        _ => None,
    };
    ch.filter(|c| !c.is_control())
}

/// Name of a non-printable keysym, e.g. `"BackSpace"` or `"F5"`.
#[must_use]
pub fn keysym_name(keysym: Keysym) -> Option<String> {
    match keysym {
        0xffbe..=0xffe0 => return Some(format!("F{}", keysym - 0xffbe + 1)),
        k if (SWITCH_VT_FIRST..SWITCH_VT_FIRST + 12).contains(&k) => {
            return Some(format!("XF86_Switch_VT_{}", k - SWITCH_VT_FIRST + 1));
        }
        _ => {}
    }
    NAMES
        .iter()
        .find(|(sym, _)| *sym == keysym)
        .map(|(_, name)| (*name).to_string())
}

/// Short label drawn on a key producing `keysym`.
///
/// Printable keysyms show their character. Named keysyms drop a `KP_`
/// prefix and are abbreviated: console switches become `V<n>`, control
/// keys `Ctl`, a few well known keys get a fixed label or arrow, and
/// anything else is cut to three characters.
#[must_use]
pub fn display_name(keysym: Keysym) -> Option<String> {
    if keysym == NO_SYMBOL {
        return None;
    }
    if let Some(ch) = keysym_to_char(keysym) {
        return Some(ch.to_string());
    }

    let full = keysym_name(keysym)?;
    let name = full.strip_prefix("KP_").unwrap_or(&full);

    if let Some(vt) = name.strip_prefix("XF86_Switch_VT_") {
        return Some(format!("V{vt}"));
    }
    if name
        .get(..8)
        .is_some_and(|head| head.eq_ignore_ascii_case("Control_"))
    {
        return Some("Ctl".to_string());
    }
    if let Some((_, label)) = SHORT_LABELS.iter().find(|(long, _)| *long == name) {
        return Some((*label).to_string());
    }
    Some(name.chars().take(MAX_LABEL_CHARS).collect())
}
