//! Binary form of parsing tables, for caching them between runs.
//!
//! ```text
//! table  := initial:i32 state-count:i32 default-rule:i32
//!           (rule-name \0 element+ FF)* FF
//!           state*
//! state  := entry-count:i32 (element action-type:u8 value:i32)*
//! ```
//!
//! Elements use the grammar encoding. Shifts and reduces are keyed by
//! terminal elements, gotos by non-terminal elements.

use grammar::serialize::{
  write_element, write_i32, write_rule_elements, write_string, ByteReader, END,
};
use grammar::{DecodeError, Element, Map, ProductionRule};
use crate::{Action, ParsingTable};

const SHIFT: u8 = 1;
const REDUCE: u8 = 2;
const GOTO: u8 = 3;

pub fn write_table(table: &ParsingTable) -> Vec<u8> {
  let mut buf = vec![];
  write_i32(&mut buf, table.initial_state() as i32);
  write_i32(&mut buf, table.state_count() as i32);
  write_i32(&mut buf, table.default_rule_index() as i32);

  for rule in table.rules() {
    write_string(&mut buf, rule.name());
    write_rule_elements(&mut buf, rule.elements());
  }
  buf.push(END);

  for state in 0..table.state_count() {
    let actions = table.actions(state).iter()
      .filter(|(_, action)| **action != Action::Error)
      .collect::<Vec<_>>();
    let gotos = table.gotos(state);

    write_i32(&mut buf, (actions.len() + gotos.len()) as i32);

    for (terminal, action) in actions {
      let (tag, value) = match *action {
        Action::Shift(target) => (SHIFT, target),
        Action::Reduce(slot) => (REDUCE, slot),
        Action::Error => continue,
      };
      write_element(&mut buf, &Element::Terminal(terminal.clone()));
      buf.push(tag);
      write_i32(&mut buf, value as i32);
    }

    for (symbol, &target) in gotos {
      write_element(&mut buf, &Element::NonTerminal(symbol.clone()));
      buf.push(GOTO);
      write_i32(&mut buf, target as i32);
    }
  }

  buf
}

pub fn read_table(bytes: &[u8]) -> Result<ParsingTable, DecodeError> {
  let mut reader = ByteReader::new(bytes);

  let initial = read_bounded(&mut reader, None)?;
  let state_count = reader.read_index()?;
  let default_rule = reader.read_index()?;

  let mut rules = vec![];
  loop {
    match reader.peek() {
      Some(END) => {
        reader.read_u8()?;
        break;
      }
      Some(_) => {
        let name = reader.read_string()?;
        let elements = reader.read_rule_elements()?;
        rules.push(ProductionRule::new(name, elements));
      }
      None => return Err(DecodeError::UnexpectedEnd(reader.offset())),
    }
  }

  check_bound(initial, state_count, 0)?;
  check_bound(default_rule, rules.len(), 8)?;

  let mut actions = Vec::with_capacity(state_count);
  let mut gotos = Vec::with_capacity(state_count);

  for _ in 0..state_count {
    let mut action_row = Map::default();
    let mut goto_row = Map::default();

    for _ in 0..reader.read_index()? {
      let element = reader.read_element()?;
      let tag_offset = reader.offset();
      let tag = reader.read_u8()?;

      match (element, tag) {
        (Element::Terminal(terminal), SHIFT) => {
          let target = read_bounded(&mut reader, Some(state_count))?;
          action_row.insert(terminal, Action::Shift(target));
        }
        (Element::Terminal(terminal), REDUCE) => {
          let slot = read_bounded(&mut reader, Some(rules.len()))?;
          action_row.insert(terminal, Action::Reduce(slot));
        }
        (Element::NonTerminal(symbol), GOTO) => {
          let target = read_bounded(&mut reader, Some(state_count))?;
          goto_row.insert(symbol, target);
        }
        (_, tag) => {
          return Err(DecodeError::InvalidTag {
            what: "action type",
            tag,
            offset: tag_offset,
          });
        }
      }
    }

    actions.push(action_row);
    gotos.push(goto_row);
  }

  if let Some(tag) = reader.peek() {
    return Err(DecodeError::InvalidTag {
      what: "trailing data",
      tag,
      offset: reader.offset(),
    });
  }

  Ok(ParsingTable::from_parts(initial, actions, gotos, rules, default_rule))
}

fn read_bounded(reader: &mut ByteReader, bound: Option<usize>) -> Result<usize, DecodeError> {
  let offset = reader.offset();
  let value = reader.read_index()?;
  match bound {
    Some(bound) => check_bound(value, bound, offset),
    None => Ok(value),
  }
}

fn check_bound(value: usize, bound: usize, offset: usize) -> Result<usize, DecodeError> {
  if value < bound {
    Ok(value)
  } else {
    Err(DecodeError::OutOfRange {
      value: value as i32,
      offset,
    })
  }
}
