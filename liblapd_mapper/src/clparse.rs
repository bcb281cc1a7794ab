use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use super::dtype::DType;
use super::error::ClParseError;

/// Name of the capture group every command list pattern must use for its value
pub const VALUE_GROUP: &str = "VAL";

/// Values extracted from a command list, one per command index
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandValues {
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl CommandValues {
    /// Convert to floats when every value parses as one, otherwise keep the text
    pub fn from_strings(values: Vec<String>) -> Self {
        let floats: Option<Vec<f64>> = values.iter().map(|v| v.trim().parse().ok()).collect();
        match floats {
            Some(f) => CommandValues::Float(f),
            None => CommandValues::Text(values),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CommandValues::Float(v) => v.len(),
            CommandValues::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The numpy-style dtype an array of these values has
    pub fn dtype(&self) -> DType {
        match self {
            CommandValues::Float(_) => DType::Float64,
            CommandValues::Text(v) => text_dtype(v),
        }
    }
}

/// `<U<n>` where n is the longest string, with numpy's minimum of one
pub fn text_dtype(values: &[String]) -> DType {
    let longest = values.iter().map(|v| v.chars().count()).max().unwrap_or(0);
    DType::FixedUnicode(longest.max(1))
}

/// One state value recovered from a command list by a single pattern
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedState {
    pub re_pattern: String,
    pub command_list: CommandValues,
    pub cl_str: Vec<String>,
}

impl ParsedState {
    pub fn dtype(&self) -> DType {
        self.command_list.dtype()
    }
}

/// Parser for the command lists recorded by command-list driven control
/// devices (waveform generators, power supplies).
///
/// Each shot records a command index into the list; applying regex patterns
/// to the list turns those indices into physical state values.
#[derive(Debug, Clone, PartialEq)]
pub struct ClParse {
    command_list: Vec<String>,
}

impl ClParse {
    pub fn new<S: AsRef<str>>(command_list: &[S]) -> Self {
        Self {
            command_list: command_list.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    /// Build from the raw attribute text: one command per line, whitespace stripped
    pub fn from_text(text: &str) -> Self {
        Self {
            command_list: split_command_list(text),
        }
    }

    pub fn command_list(&self) -> &[String] {
        &self.command_list
    }

    /// Apply a set of patterns to the command list.
    ///
    /// Every pattern needs exactly two named groups: `VAL`, holding the value,
    /// and one more whose lowercased name becomes the state name. Each pattern
    /// has to match every command, since every command index must resolve to
    /// a value for every state.
    pub fn apply_patterns<S: AsRef<str>>(
        &self,
        patterns: &[S],
    ) -> Result<BTreeMap<String, ParsedState>, ClParseError> {
        if patterns.is_empty() {
            return Err(ClParseError::NoPatterns);
        }

        let mut states = BTreeMap::new();
        for pattern in patterns.iter().map(|p| p.as_ref()) {
            let (regex, group) = compile_pattern(pattern)?;
            let state_name = group.to_lowercase();
            if states.contains_key(&state_name) {
                return Err(ClParseError::DuplicateState(state_name));
            }

            let mut values = Vec::with_capacity(self.command_list.len());
            let mut cl_str = Vec::with_capacity(self.command_list.len());
            for command in self.command_list.iter() {
                let captures =
                    regex
                        .captures(command)
                        .ok_or_else(|| ClParseError::Unmatched {
                            pattern: pattern.to_string(),
                            command: command.clone(),
                        })?;
                let (Some(value), Some(matched)) =
                    (captures.name(VALUE_GROUP), captures.name(&group))
                else {
                    return Err(ClParseError::Unmatched {
                        pattern: pattern.to_string(),
                        command: command.clone(),
                    });
                };
                values.push(value.as_str().to_string());
                cl_str.push(matched.as_str().to_string());
            }

            states.insert(
                state_name,
                ParsedState {
                    re_pattern: pattern.to_string(),
                    command_list: CommandValues::from_strings(values),
                    cl_str,
                },
            );
        }
        Ok(states)
    }

    /// Render what each pattern extracts from each command. Meant for working
    /// out patterns interactively, so nothing here is an error.
    pub fn try_patterns<S: AsRef<str>>(&self, patterns: &[S]) -> String {
        let mut report = String::new();
        let mut columns: Vec<(String, Regex, String)> = vec![];
        for pattern in patterns.iter().map(|p| p.as_ref()) {
            match compile_pattern(pattern) {
                Ok((regex, group)) => columns.push((group.to_lowercase(), regex, group)),
                Err(e) => {
                    let _ = writeln!(report, "skipping pattern: {e}");
                }
            }
        }

        let mut rows: Vec<Vec<String>> = vec![];
        let mut header = vec![String::from("command")];
        header.extend(columns.iter().map(|(name, _, _)| name.clone()));
        rows.push(header);
        for command in self.command_list.iter() {
            let mut row = vec![command.clone()];
            for (_, regex, _) in columns.iter() {
                let cell = regex
                    .captures(command)
                    .and_then(|c| c.name(VALUE_GROUP).map(|m| m.as_str().to_string()))
                    .unwrap_or_else(|| String::from("--"));
                row.push(cell);
            }
            rows.push(row);
        }

        let n_cols = columns.len() + 1;
        let widths: Vec<usize> = (0..n_cols)
            .map(|col| rows.iter().map(|r| r[col].chars().count()).max().unwrap_or(0))
            .collect();
        for (idx, row) in rows.iter().enumerate() {
            let cells: Vec<String> = row
                .iter()
                .zip(widths.iter())
                .map(|(cell, width)| format!("{cell:<width$}"))
                .collect();
            let _ = writeln!(report, "{}", cells.join(" | ").trim_end());
            if idx == 0 {
                let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
                let _ = writeln!(report, "{}", rule.join("-+-"));
            }
        }
        report
    }
}

/// Split a command list attribute into its commands. Any of `\n`, `\r\n`
/// or a lone `\r` ends a command; a trailing line break does not start a new one.
pub fn split_command_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return vec![];
    }
    let text = text.replace("\r\n", "\n");
    let mut commands: Vec<String> = text
        .split(['\n', '\r'])
        .map(|command| command.trim().to_string())
        .collect();
    if text.ends_with(['\n', '\r']) {
        commands.pop();
    }
    commands
}

/// Compile a pattern and find the name of its state group
fn compile_pattern(pattern: &str) -> Result<(Regex, String), ClParseError> {
    let regex =
        Regex::new(pattern).map_err(|e| ClParseError::BadPattern(pattern.to_string(), e))?;
    let names: Vec<&str> = regex.capture_names().flatten().collect();
    if names.len() != 2 || !names.contains(&VALUE_GROUP) {
        return Err(ClParseError::BadGroups(pattern.to_string()));
    }
    let group = names
        .iter()
        .find(|n| **n != VALUE_GROUP)
        .map(|n| n.to_string())
        .ok_or_else(|| ClParseError::BadGroups(pattern.to_string()))?;
    Ok((regex, group))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VOLT: &str = r"(?P<VOLT>(\bSOURCE:VOLTAGE:LEVEL\s)(?P<VAL>(\d+\.\d*|\.\d+|\d+\b)))";
    const CURR: &str = r"(?P<CURR>(\bSOURCE:CURRENT:LEVEL\s)(?P<VAL>(\d+\.\d*|\.\d+|\d+\b)))";

    fn voltage_list() -> ClParse {
        ClParse::from_text(
            "SOURCE:VOLTAGE:LEVEL 10.0\n  SOURCE:VOLTAGE:LEVEL 20.5 \nSOURCE:VOLTAGE:LEVEL 30\n",
        )
    }

    #[test]
    fn test_voltage_pattern() {
        let states = voltage_list().apply_patterns(&[VOLT]).unwrap();
        let volt = &states["volt"];
        assert_eq!(volt.command_list, CommandValues::Float(vec![10.0, 20.5, 30.0]));
        assert_eq!(volt.cl_str[1], "SOURCE:VOLTAGE:LEVEL 20.5");
        assert_eq!(volt.re_pattern, VOLT);
        assert_eq!(volt.dtype(), DType::Float64);
    }

    #[test]
    fn test_two_patterns() {
        let cl = ClParse::new(&[
            "SOURCE:VOLTAGE:LEVEL 1.0;SOURCE:CURRENT:LEVEL 0.5",
            "SOURCE:VOLTAGE:LEVEL 2.0;SOURCE:CURRENT:LEVEL 1.5",
        ]);
        let states = cl.apply_patterns(&[VOLT, CURR]).unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states["curr"].command_list, CommandValues::Float(vec![0.5, 1.5]));
    }

    #[test]
    fn test_unmatched_command_fails() {
        let cl = ClParse::new(&["SOURCE:VOLTAGE:LEVEL 10.0", "OUTPUT ON"]);
        match cl.apply_patterns(&[VOLT]) {
            Err(ClParseError::Unmatched { command, .. }) => assert_eq!(command, "OUTPUT ON"),
            other => panic!("expected unmatched command, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_group_layout() {
        let cl = voltage_list();
        assert!(matches!(
            cl.apply_patterns(&[r"(?P<VOLT>SOURCE:VOLTAGE:LEVEL\s\d+)"]),
            Err(ClParseError::BadGroups(_))
        ));
        assert!(matches!(
            cl.apply_patterns(&[r"(?P<A>x)(?P<B>y)(?P<VAL>z)"]),
            Err(ClParseError::BadGroups(_))
        ));
        assert!(matches!(
            cl.apply_patterns(&[r"(?P<VOLT>(unclosed"]),
            Err(ClParseError::BadPattern(_, _))
        ));
        assert!(matches!(
            cl.apply_patterns::<&str>(&[]),
            Err(ClParseError::NoPatterns)
        ));
    }

    #[test]
    fn test_duplicate_state_names() {
        let lower = r"(?P<volt>(\bSOURCE:VOLTAGE:LEVEL\s)(?P<VAL>(\d+)))";
        assert!(matches!(
            voltage_list().apply_patterns(&[VOLT, lower]),
            Err(ClParseError::DuplicateState(name)) if name == "volt"
        ));
    }

    #[test]
    fn test_text_values() {
        let cl = ClParse::new(&["MODE sine", "MODE square"]);
        let states = cl
            .apply_patterns(&[r"(?P<MODE>(\bMODE\s)(?P<VAL>\w+))"])
            .unwrap();
        let mode = &states["mode"];
        assert_eq!(
            mode.command_list,
            CommandValues::Text(vec![String::from("sine"), String::from("square")])
        );
        assert_eq!(mode.dtype(), DType::FixedUnicode(6));
    }

    #[test]
    fn test_try_patterns_report() {
        let cl = ClParse::new(&["SOURCE:VOLTAGE:LEVEL 10.0", "OUTPUT ON"]);
        let report = cl.try_patterns(&[VOLT, "(bad"]);
        assert!(report.contains("skipping pattern"));
        assert!(report.contains("volt"));
        assert!(report.contains("10.0"));
        let last = report.lines().last().unwrap();
        assert!(last.starts_with("OUTPUT ON"));
        assert!(last.ends_with("--"));
    }

    #[test]
    fn test_split_line_endings() {
        let expected = vec!["FREQ 1.0", "FREQ 2.0", "FREQ 3.0"];
        assert_eq!(split_command_list("FREQ 1.0\nFREQ 2.0\nFREQ 3.0\n"), expected);
        assert_eq!(split_command_list("FREQ 1.0\r\nFREQ 2.0\r\nFREQ 3.0"), expected);
        assert_eq!(split_command_list("FREQ 1.0\rFREQ 2.0\r FREQ 3.0 \r"), expected);
        assert_eq!(split_command_list("A\n\nB"), vec!["A", "", "B"]);
        assert!(split_command_list("").is_empty());
        assert_eq!(ClParse::from_text("A 1\rA 2").command_list().len(), 2);
    }
}
