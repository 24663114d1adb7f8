//! IRC mode string parsing.
//!
//! Parsing is lenient: a mode that needs a parameter when none is left is
//! kept without one, and surplus parameters are ignored.

use crate::isupport::Isupport;

use super::{ModeChange, ModeKind};

enum PlusMinus {
    Plus,
    Minus,
}

/// Classify a channel mode letter using the server's ISUPPORT.
pub(crate) fn channel_mode_kind(isupport: &Isupport, mode: char) -> ModeKind {
    if isupport.prefix().is_prefix_mode(mode) {
        return ModeKind::Prefix;
    }
    let chanmodes = isupport.chanmodes();
    if chanmodes.a.contains(mode) {
        ModeKind::List
    } else if chanmodes.b.contains(mode) {
        ModeKind::AlwaysArg
    } else if chanmodes.c.contains(mode) {
        ModeKind::ArgWhenSet
    } else {
        ModeKind::Flag
    }
}

/// Parse `pieces` (mode string then its parameters) as channel modes.
pub fn parse_channel_modes(isupport: &Isupport, pieces: &[String]) -> Vec<ModeChange> {
    parse_modes(pieces, |mode, adding| {
        match channel_mode_kind(isupport, mode) {
            ModeKind::Prefix | ModeKind::List | ModeKind::AlwaysArg => true,
            ModeKind::ArgWhenSet => adding,
            ModeKind::Flag => false,
        }
    })
}

/// Parse a user mode string; user modes never take parameters here.
pub fn parse_user_modes(modes: &str) -> Vec<ModeChange> {
    parse_modes(&[modes.to_string()], |_, _| false)
}

fn parse_modes<F>(pieces: &[String], takes_arg: F) -> Vec<ModeChange>
where
    F: Fn(char, bool) -> bool,
{
    use self::PlusMinus::*;

    let mut res = vec![];
    let Some((first, rest)) = pieces.split_first() else {
        return res;
    };
    let mut args = rest.iter();
    let mut cur_mod = Plus;

    for c in first.chars() {
        match c {
            '+' => cur_mod = Plus,
            '-' => cur_mod = Minus,
            _ => {
                let adding = matches!(cur_mod, Plus);
                let arg = if takes_arg(c, adding) {
                    args.next().cloned()
                } else {
                    None
                };
                res.push(ModeChange { adding, mode: c, arg });
            }
        }
    }

    res
}
