//! Key scripts replayed against a headless view.
//!
//! One step per line: `<key> <x> [<y>]` presses a key with the pointer
//! at `(x, y)`, `range <low> <high>` changes the visible range. Blank lines
//! and lines starting with `#` are skipped. A 1-D view ignores keys pressed
//! outside the plot, so a key without an x position is a parse error.

use histogrammer_core::InputEvent;

/// One script line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Key(InputEvent),
    Range(f64, f64),
}

/// Parses a script, reporting the first bad line.
pub fn parse(text: &str) -> Result<Vec<Step>, String> {
    let mut steps = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let step = parse_line(line).map_err(|e| format!("line {}: {e}", n + 1))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<Step, String> {
    let mut fields = line.split_whitespace();
    let head = fields.next().unwrap_or_default();
    let numbers = fields
        .map(|f| f.parse::<f64>().map_err(|e| format!("{f:?}: {e}")))
        .collect::<Result<Vec<f64>, String>>()?;

    if head == "range" {
        return match numbers.as_slice() {
            [low, high] => Ok(Step::Range(*low, *high)),
            _ => Err("range takes a low and a high bound".to_string()),
        };
    }

    let mut chars = head.chars();
    let (Some(key), None) = (chars.next(), chars.next()) else {
        return Err(format!("{head:?} is not a single key"));
    };
    let event = match numbers.as_slice() {
        [] => return Err(format!("key {key:?} needs an x position")),
        [x] => InputEvent::at(key, *x, 0.0),
        [x, y] => InputEvent::at(key, *x, *y),
        _ => return Err("a key takes at most x and y".to_string()),
    };
    Ok(Step::Key(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let steps = parse("# markers\nr 10\nr 20.5\n\nf 15\nrange 0 100\nb 3 4\n").unwrap();
        assert_eq!(
            steps,
            vec![
                Step::Key(InputEvent::at('r', 10.0, 0.0)),
                Step::Key(InputEvent::at('r', 20.5, 0.0)),
                Step::Key(InputEvent::at('f', 15.0, 0.0)),
                Step::Range(0.0, 100.0),
                Step::Key(InputEvent::at('b', 3.0, 4.0)),
            ]
        );
    }

    #[test]
    fn test_bad_lines() {
        assert_eq!(parse("r 1\nrb 2\n").unwrap_err(), "line 2: \"rb\" is not a single key");
        assert!(parse("range 1").is_err());
        assert!(parse("r x").is_err());
        assert!(parse("r 1 2 3").is_err());
    }

    #[test]
    fn test_key_without_position_is_rejected() {
        assert_eq!(
            parse("r 10\nr 20\nf\n").unwrap_err(),
            "line 3: key 'f' needs an x position"
        );
        assert_eq!(parse("B").unwrap_err(), "line 1: key 'B' needs an x position");
        assert_eq!(parse("# clear\n-").unwrap_err(), "line 2: key '-' needs an x position");
    }
}
