use grammar::Terminal;
use grammar::lex::tokenize;
use lr::{Action, ParsingTable};

pub static EARLE: &str = include_str!("../../../src/earle.pg");

/// Runs the table by hand and records every step.
pub fn parse(
  table: &ParsingTable,
  input: &str,
) -> Vec<String> {
  let mut events = vec![];
  let mut tokens = tokenize(input).unwrap().into_iter();
  let mut token = tokens.next();
  let mut state = table.initial_state();
  let mut stack: Vec<(usize, String)> = vec![];

  loop {
    let action = match &token {
      Some(t) => match table.action(state, &Terminal::literal(t.kind, t.text.as_str())) {
        Action::Error => table.action(state, &Terminal::any(t.kind)),
        action => action,
      },
      None => table.action(state, &Terminal::eof()),
    };
    let text = token.as_ref()
      .map(|t| t.text.clone())
      .unwrap_or_else(|| "EOF".to_owned());

    match action {
      Action::Shift(next) => {
        events.push(format!("shift  {}", text));
        stack.push((state, text));
        state = next;
        token = tokens.next();
      }
      Action::Reduce(slot) => {
        let rule = table.rule(slot);
        let state0 = if rule.is_empty() {
          state
        } else {
          stack[stack.len() - rule.len()].0
        };

        let mut event = format!("reduce {} ->", rule.name());
        for (_, text) in stack.drain(stack.len() - rule.len()..) {
          event.push(' ');
          event.push_str(&text);
        }
        events.push(event);

        if slot == table.default_rule_index() && stack.is_empty() && token.is_none() {
          events.push("accept".to_owned());
          break;
        }

        state = table.goto(state0, rule.name()).unwrap();
        stack.push((state0, rule.name().to_owned()));
      }
      Action::Error => {
        events.push(format!("error token {}", text));
        break;
      }
    }
  }

  events
}
