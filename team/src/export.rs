//! Showdown team export text
//!
//! One stanza per slot:
//!
//! ```text
//! Nickname (Species) (M) @ Item
//! Ability: Ability
//! Level: 50
//! Shiny: Yes
//! Tera Type: Type
//! EVs: 252 HP / 4 Def / 252 Spe
//! Jolly Nature
//! IVs: 0 Atk
//! - Move
//! ```
//!
//! Every line is terminated by two spaces and `\n`, and every stanza by an
//! extra `\n`, exactly as the Showdown teambuilder writes it.

use std::fmt::Write;

use crate::slot::{DEFAULT_LEVEL, Slot};
use crate::stats::MAX_IV;

const EOL: &str = "  \n";

/// Render a whole team
pub fn to_export(slots: &[Slot]) -> String {
    let mut out = String::new();
    for slot in slots {
        write_slot(&mut out, slot);
        out.push('\n');
    }
    out
}

/// Render a single stanza (without the trailing blank line)
pub fn slot_to_export(slot: &Slot) -> String {
    let mut out = String::new();
    write_slot(&mut out, slot);
    out
}

fn write_slot(out: &mut String, slot: &Slot) {
    match slot.nickname.as_deref() {
        Some(nick) if !nick.is_empty() && nick != slot.species => {
            let _ = write!(out, "{} ({})", nick, slot.species);
        }
        _ => out.push_str(&slot.species),
    }
    if let Some(gender) = slot.gender {
        let _ = write!(out, " ({})", gender.as_char());
    }
    if let Some(item) = slot.item.as_deref().filter(|i| !i.is_empty()) {
        let _ = write!(out, " @ {}", item);
    }
    out.push_str(EOL);

    if let Some(ability) = slot.ability.as_deref().filter(|a| !a.is_empty()) {
        let _ = write!(out, "Ability: {}{}", ability, EOL);
    }
    if slot.level != DEFAULT_LEVEL {
        let _ = write!(out, "Level: {}{}", slot.level, EOL);
    }
    if slot.shiny {
        out.push_str("Shiny: Yes");
        out.push_str(EOL);
    }
    if let Some(tera) = slot.tera_type {
        let _ = write!(out, "Tera Type: {}{}", tera, EOL);
    }

    let evs = slot.evs.describe(0);
    if !evs.is_empty() {
        let _ = write!(out, "EVs: {}{}", evs, EOL);
    }
    if let Some(nature) = slot.nature.as_deref().filter(|n| !n.is_empty()) {
        let _ = write!(out, "{} Nature{}", nature, EOL);
    }
    let ivs = slot.ivs.describe(MAX_IV);
    if !ivs.is_empty() {
        let _ = write!(out, "IVs: {}{}", ivs, EOL);
    }

    for m in &slot.moves {
        let _ = write!(out, "- {}{}", m, EOL);
    }
}
