//! Showdown team import text

use rotom_dex::Type;
use thiserror::Error;

use crate::slot::{Gender, Slot};
use crate::stats::{MAX_IV, StatSpread};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    #[error("Missing species on line {line}")]
    MissingSpecies { line: usize },
}

/// Lines the teambuilder may write that carry nothing a slot keeps
const IGNORED_PREFIXES: [&str; 5] = [
    "Happiness:",
    "Pokeball:",
    "Hidden Power:",
    "Dynamax Level:",
    "Gigantamax:",
];

/// Parse a team in export format. `=== [format] name ===` headers are skipped.
pub fn parse_export(text: &str) -> Result<Vec<Slot>, ParseError> {
    let mut slots = Vec::new();
    let mut current: Option<Slot> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();

        if line.is_empty() {
            if let Some(slot) = current.take() {
                slots.push(slot);
            }
            continue;
        }

        if line.starts_with("===") {
            if let Some(slot) = current.take() {
                slots.push(slot);
            }
            continue;
        }

        match current.as_mut() {
            None => current = Some(parse_header(line, line_no)?),
            Some(slot) => parse_attribute(slot, line, line_no)?,
        }
    }

    if let Some(slot) = current.take() {
        slots.push(slot);
    }

    Ok(slots)
}

/// `Nickname (Species) (G) @ Item`
fn parse_header(line: &str, line_no: usize) -> Result<Slot, ParseError> {
    let (mut name, item) = match line.split_once('@') {
        Some((name, item)) => (name.trim(), Some(item.trim())),
        None => (line.trim(), None),
    };

    let mut slot = Slot::default();

    if let Some(rest) = name.strip_suffix(')')
        && let Some((before, g)) = rest.rsplit_once(" (")
        && g.len() == 1
        && let Some(gender) = g.chars().next().and_then(Gender::from_char)
    {
        slot.gender = Some(gender);
        name = before.trim_end();
    }

    if let Some(rest) = name.strip_suffix(')')
        && let Some((nick, species)) = rest.rsplit_once(" (")
    {
        slot.species = species.trim().to_string();
        slot.nickname = Some(nick.trim().to_string());
    } else {
        slot.species = name.trim().to_string();
    }

    if slot.species.is_empty() {
        return Err(ParseError::MissingSpecies { line: line_no });
    }

    slot.item = item.filter(|i| !i.is_empty()).map(str::to_string);
    Ok(slot)
}

fn parse_attribute(slot: &mut Slot, line: &str, line_no: usize) -> Result<(), ParseError> {
    let invalid = |reason: &str| ParseError::InvalidLine {
        line: line_no,
        reason: reason.to_string(),
    };

    if let Some(m) = line.strip_prefix('-').or_else(|| line.strip_prefix('~')) {
        let m = m.trim();
        if m.is_empty() {
            return Err(invalid("empty move"));
        }
        slot.moves.push(m.to_string());
    } else if let Some(ability) = line.strip_prefix("Ability:") {
        slot.ability = Some(ability.trim().to_string());
    } else if let Some(level) = line.strip_prefix("Level:") {
        slot.level = level
            .trim()
            .parse()
            .map_err(|_| invalid("level is not a number"))?;
    } else if let Some(shiny) = line.strip_prefix("Shiny:") {
        slot.shiny = shiny.trim().eq_ignore_ascii_case("yes");
    } else if let Some(tera) = line.strip_prefix("Tera Type:") {
        slot.tera_type = Some(Type::parse(tera).ok_or_else(|| invalid("unknown tera type"))?);
    } else if let Some(evs) = line.strip_prefix("EVs:") {
        slot.evs = StatSpread::parse(evs, 0).ok_or_else(|| invalid("malformed EVs"))?;
    } else if let Some(ivs) = line.strip_prefix("IVs:") {
        slot.ivs = StatSpread::parse(ivs, MAX_IV).ok_or_else(|| invalid("malformed IVs"))?;
    } else if let Some(nature) = line.strip_suffix(" Nature") {
        slot.nature = Some(nature.trim().to_string());
    } else if IGNORED_PREFIXES.iter().any(|p| line.starts_with(p)) {
        // carried by the teambuilder, not by slots
    } else {
        return Err(invalid("unrecognized line"));
    }

    Ok(())
}
