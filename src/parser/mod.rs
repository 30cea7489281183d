//! Script parser - cutscene scripts to action lists
//!
//! Scripts are markdown-flavoured: a `# Title` heading, then one bracketed
//! command per line. Labels mark positions without occupying an action slot;
//! branch sockets name labels (or the keywords `stop`/`continue`) and are
//! resolved to action indices in a second pass.
//!
//! ```text
//! # The Gate
//! [CUTSCENE type=blocking skippable=true]
//! [PARAM name=hero value=Mira]
//! [SAY speaker=$hero secs=1.5]
//! Open the gate!
//! [CHECK var=gate_open cmp=eq value=true then=walk else=refuse]
//! [LABEL name=walk]
//! [STOP]
//! [LABEL name=refuse]
//! [SAY speaker=Guard]
//! Not today.
//! ```

use std::collections::BTreeMap;

use crate::types::action::{Action, ActionEnd, ActionKind, EndPolicy};
use crate::types::list::{ActionList, ListType};
use crate::types::value::{Arg, Comparison, NumericOp, ParamSet, VarValue};


/// Parse a cutscene script into a validated [`ActionList`].
pub fn parse_script(src: &str) -> Result<ActionList, ParseError> {
    ScriptParser::new(src).parse()
}

/// Parsing errors, always carrying the offending line
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("Missing required parameter '{param}' for command '{command}' at line {line}")]
    MissingParameter {
        command: String,
        param: String,
        line: usize,
    },
    #[error("Invalid value '{value}' for parameter '{param}' at line {line}")]
    InvalidValue {
        param: String,
        value: String,
        line: usize,
    },
    #[error("Undefined label '{label}' referenced at line {line}")]
    UndefinedLabel { label: String, line: usize },
    #[error("Duplicate label '{label}' defined at line {line}")]
    DuplicateLabel { label: String, line: usize },
    #[error("Invalid command syntax at line {line}: {content}")]
    InvalidSyntax { line: usize, content: String },
    #[error("Validation error: {message}")]
    Validation { message: String },
}

/// A branch socket as written: a label name or keyword, plus its line.
type TargetRef = (String, usize);

enum Pending {
    Ready(Action),
    Check {
        variable: String,
        comparison: Comparison,
        value: Arg,
        then: TargetRef,
        otherwise: Option<TargetRef>,
    },
    Switch {
        variable: String,
        sockets: Vec<TargetRef>,
    },
    Parallel {
        sockets: Vec<TargetRef>,
    },
}

struct ScriptParser {
    lines: Vec<String>,
    current_line: usize,
    pending: Vec<Pending>,
    labels: BTreeMap<String, usize>,
    title: String,
    list_type: ListType,
    skippable: bool,
    trigger_time: f32,
    autosave_after: bool,
    params: ParamSet,
}

impl ScriptParser {
    fn new(src: &str) -> Self {
        Self {
            lines: src.lines().map(|s| s.to_string()).collect(),
            current_line: 0,
            pending: Vec::new(),
            labels: BTreeMap::new(),
            title: String::new(),
            list_type: ListType::Blocking,
            skippable: true,
            trigger_time: 0.0,
            autosave_after: false,
            params: ParamSet::new(),
        }
    }

    fn parse(mut self) -> Result<ActionList, ParseError> {
        self.title = self.extract_title();

        while self.current_line < self.lines.len() {
            self.parse_line()?;
            self.current_line += 1;
        }

        let ScriptParser {
            pending,
            labels,
            title,
            list_type,
            skippable,
            trigger_time,
            autosave_after,
            params,
            ..
        } = self;
        let actions = resolve_targets(pending, &labels)?;
        let mut list = ActionList::new(title, actions);
        list.list_type = list_type;
        list.skippable = skippable;
        list.trigger_time = trigger_time;
        list.autosave_after = autosave_after;
        list.params = params;
        list.validate().map_err(|e| ParseError::Validation {
            message: e.to_string(),
        })?;
        Ok(list)
    }

    fn extract_title(&self) -> String {
        for line in self.lines.iter().take(5) {
            if let Some(stripped) = line.trim().strip_prefix("# ") {
                return stripped.trim().to_string();
            }
        }
        "Untitled Cutscene".to_string()
    }

    fn parse_line(&mut self) -> Result<(), ParseError> {
        let line = self.lines[self.current_line].trim().to_string();

        if line.is_empty() || line.starts_with("<!--") || line.starts_with('#') {
            return Ok(());
        }

        if let Some(cmd_str) = extract_command(&line) {
            self.parse_command(&cmd_str)?;
        }

        Ok(())
    }

    fn parse_command(&mut self, cmd_str: &str) -> Result<(), ParseError> {
        let parts: Vec<&str> = cmd_str.split_whitespace().collect();
        if parts.is_empty() {
            return Err(ParseError::InvalidSyntax {
                line: self.line_no(),
                content: cmd_str.to_string(),
            });
        }

        let command = parts[0];
        let params = parse_params(&parts[1..]);

        match command {
            "CUTSCENE" => self.parse_config(&params),
            "PARAM" => {
                let name = self.require_param(&params, "name", command)?;
                let value = self.require_param(&params, "value", command)?;
                self.params.insert(name, VarValue::parse(&value));
                Ok(())
            }
            "LABEL" => {
                let name = self.require_param(&params, "name", command)?;
                if self.labels.contains_key(&name) {
                    return Err(ParseError::DuplicateLabel {
                        label: name,
                        line: self.line_no(),
                    });
                }
                // A label marks the position of the next action
                self.labels.insert(name, self.pending.len());
                Ok(())
            }
            "SAY" => {
                let speaker = self.require_param(&params, "speaker", command)?;
                let seconds = match params.get("secs") {
                    Some(raw) => self.parse_float(raw, "secs")?,
                    None => 0.0,
                };
                let text = self.take_say_text();
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::Say {
                        speaker: parse_arg(&speaker),
                        text: parse_arg(&text),
                        seconds,
                    },
                    end,
                )));
                Ok(())
            }
            "PLAY_SOUND" => {
                let name = self.require_param(&params, "name", command)?;
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::PlaySound { name },
                    end,
                )));
                Ok(())
            }
            "PLAY_MUSIC" => {
                let name = self.require_param(&params, "name", command)?;
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::PlayMusic { name },
                    end,
                )));
                Ok(())
            }
            "WAIT" => {
                let seconds = if let Some(raw) = params.get("secs") {
                    self.parse_float(raw, "secs")?
                } else if parts.len() > 1 {
                    let raw = parts[1].strip_suffix('s').unwrap_or(parts[1]);
                    self.parse_float(raw, "secs")?
                } else {
                    return Err(ParseError::MissingParameter {
                        command: command.to_string(),
                        param: "secs".to_string(),
                        line: self.line_no(),
                    });
                };
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::Wait { seconds },
                    end,
                )));
                Ok(())
            }
            "SET" => {
                let name = self.require_param(&params, "name", command)?;
                let value = self.require_param(&params, "value", command)?;
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::SetVar {
                        name,
                        value: parse_arg(&value),
                    },
                    end,
                )));
                Ok(())
            }
            "MODIFY" => {
                let name = self.require_param(&params, "name", command)?;
                let op = self.parse_op(&self.require_param(&params, "op", command)?)?;
                let value = self.require_param(&params, "value", command)?;
                let end = self.parse_end(&params)?;
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::ModifyVar {
                        name,
                        op,
                        value: parse_arg(&value),
                    },
                    end,
                )));
                Ok(())
            }
            "RUN" => {
                let asset = self.require_param(&params, "asset", command)?;
                self.pending
                    .push(Pending::Ready(Action::new(ActionKind::RunList { asset })));
                Ok(())
            }
            "STOP" => {
                self.pending.push(Pending::Ready(Action::with_end(
                    ActionKind::Wait { seconds: 0.0 },
                    EndPolicy::Stop,
                )));
                Ok(())
            }
            "CHECK" => {
                let variable = self.require_param(&params, "var", command)?;
                let comparison = self.parse_cmp(&self.require_param(&params, "cmp", command)?)?;
                let value = self.require_param(&params, "value", command)?;
                let then = self.require_param(&params, "then", command)?;
                let line = self.line_no();
                self.pending.push(Pending::Check {
                    variable,
                    comparison,
                    value: parse_arg(&value),
                    then: (then, line),
                    otherwise: params.get("else").map(|l| (l.clone(), line)),
                });
                Ok(())
            }
            "SWITCH" => {
                let variable = self.require_param(&params, "var", command)?;
                let sockets = self.parse_sockets(&params, command)?;
                self.pending.push(Pending::Switch { variable, sockets });
                Ok(())
            }
            "PARALLEL" => {
                let sockets = self.parse_sockets(&params, command)?;
                self.pending.push(Pending::Parallel { sockets });
                Ok(())
            }
            _ => Err(ParseError::InvalidSyntax {
                line: self.line_no(),
                content: cmd_str.to_string(),
            }),
        }
    }

    fn parse_config(&mut self, params: &BTreeMap<String, String>) -> Result<(), ParseError> {
        if let Some(raw) = params.get("type") {
            self.list_type = match raw.as_str() {
                "blocking" => ListType::Blocking,
                "background" => ListType::Background,
                other => {
                    return Err(ParseError::InvalidValue {
                        param: "type".to_string(),
                        value: other.to_string(),
                        line: self.line_no(),
                    });
                }
            };
        }
        if let Some(raw) = params.get("skippable") {
            self.skippable = self.parse_bool(raw, "skippable")?;
        }
        if let Some(raw) = params.get("trigger") {
            self.trigger_time = self.parse_float(raw, "trigger")?;
        }
        if let Some(raw) = params.get("autosave") {
            self.autosave_after = self.parse_bool(raw, "autosave")?;
        }
        Ok(())
    }

    /// `end=stop` turns any single-socket command into a terminator.
    fn parse_end(&self, params: &BTreeMap<String, String>) -> Result<EndPolicy, ParseError> {
        match params.get("end").map(String::as_str) {
            None | Some("continue") => Ok(EndPolicy::Continue),
            Some("stop") => Ok(EndPolicy::Stop),
            Some(other) => Err(ParseError::InvalidValue {
                param: "end".to_string(),
                value: other.to_string(),
                line: self.line_no(),
            }),
        }
    }

    fn parse_sockets(
        &self,
        params: &BTreeMap<String, String>,
        command: &str,
    ) -> Result<Vec<TargetRef>, ParseError> {
        let raw = self.require_param(params, "sockets", command)?;
        let line = self.line_no();
        let sockets: Vec<TargetRef> = raw
            .split('|')
            .map(|s| (s.trim().to_string(), line))
            .filter(|(s, _)| !s.is_empty())
            .collect();
        if sockets.is_empty() {
            return Err(ParseError::MissingParameter {
                command: command.to_string(),
                param: "sockets".to_string(),
                line,
            });
        }
        Ok(sockets)
    }

    /// Dialogue text sits after the bracket on the same line or on the next.
    fn take_say_text(&mut self) -> String {
        let current = &self.lines[self.current_line];
        if let Some(bracket_end) = current.find(']') {
            let after = current[bracket_end + 1..].trim();
            if !after.is_empty() {
                return after.to_string();
            }
        }
        if self.current_line + 1 < self.lines.len() {
            let next = self.lines[self.current_line + 1].trim();
            if !next.is_empty() && !next.starts_with('[') {
                self.current_line += 1;
                return next.to_string();
            }
        }
        String::new()
    }

    fn require_param(
        &self,
        params: &BTreeMap<String, String>,
        param: &str,
        command: &str,
    ) -> Result<String, ParseError> {
        params
            .get(param)
            .cloned()
            .ok_or_else(|| ParseError::MissingParameter {
                command: command.to_string(),
                param: param.to_string(),
                line: self.line_no(),
            })
    }

    fn parse_float(&self, raw: &str, param: &str) -> Result<f32, ParseError> {
        raw.parse().map_err(|_| ParseError::InvalidValue {
            param: param.to_string(),
            value: raw.to_string(),
            line: self.line_no(),
        })
    }

    fn parse_bool(&self, raw: &str, param: &str) -> Result<bool, ParseError> {
        raw.parse().map_err(|_| ParseError::InvalidValue {
            param: param.to_string(),
            value: raw.to_string(),
            line: self.line_no(),
        })
    }

    fn parse_op(&self, raw: &str) -> Result<NumericOp, ParseError> {
        match raw {
            "add" => Ok(NumericOp::Add),
            "sub" => Ok(NumericOp::Subtract),
            _ => Err(ParseError::InvalidValue {
                param: "op".to_string(),
                value: raw.to_string(),
                line: self.line_no(),
            }),
        }
    }

    fn parse_cmp(&self, raw: &str) -> Result<Comparison, ParseError> {
        match raw {
            "eq" => Ok(Comparison::Equal),
            "ne" => Ok(Comparison::NotEqual),
            "lt" => Ok(Comparison::LessThan),
            "le" => Ok(Comparison::LessThanOrEqual),
            "gt" => Ok(Comparison::GreaterThan),
            "ge" => Ok(Comparison::GreaterThanOrEqual),
            _ => Err(ParseError::InvalidValue {
                param: "cmp".to_string(),
                value: raw.to_string(),
                line: self.line_no(),
            }),
        }
    }

    fn line_no(&self) -> usize {
        self.current_line + 1
    }
}

fn resolve_targets(
    pending: Vec<Pending>,
    labels: &BTreeMap<String, usize>,
) -> Result<Vec<Action>, ParseError> {
    let resolve = |target: &TargetRef| -> Result<ActionEnd, ParseError> {
        let (name, line) = target;
        match name.as_str() {
            "stop" => Ok(ActionEnd::Stop),
            "continue" => Ok(ActionEnd::Continue),
            _ => labels
                .get(name)
                .map(|&index| ActionEnd::Skip { index })
                .ok_or_else(|| ParseError::UndefinedLabel {
                    label: name.clone(),
                    line: *line,
                }),
        }
    };

    pending
        .into_iter()
        .map(|entry| match entry {
            Pending::Ready(action) => Ok(action),
            Pending::Check {
                variable,
                comparison,
                value,
                then,
                otherwise,
            } => {
                let on_true = resolve(&then)?;
                let on_false = match &otherwise {
                    Some(target) => resolve(target)?,
                    None => ActionEnd::Continue,
                };
                Ok(Action::new(ActionKind::Check {
                    variable,
                    comparison,
                    value,
                    on_true,
                    on_false,
                }))
            }
            Pending::Switch { variable, sockets } => {
                let sockets = sockets.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
                Ok(Action::new(ActionKind::CheckMultiple { variable, sockets }))
            }
            Pending::Parallel { sockets } => {
                let sockets = sockets.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
                Ok(Action::new(ActionKind::Parallel { sockets }))
            }
        })
        .collect()
}

fn extract_command(line: &str) -> Option<String> {
    if line.starts_with('[')
        && let Some(end) = line.find(']')
    {
        return Some(line[1..end].to_string());
    }
    None
}

fn parse_params(parts: &[&str]) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();
    for part in parts {
        if let Some(eq) = part.find('=') {
            let key = part[..eq].to_string();
            let mut value = part[eq + 1..].to_string();
            if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
                value = value[1..value.len() - 1].to_string();
            }
            params.insert(key, value);
        }
    }
    params
}

/// `$name` binds to a list parameter; anything else is a literal.
fn parse_arg(raw: &str) -> Arg {
    match raw.strip_prefix('$') {
        Some(name) => Arg::param(name),
        None => Arg::Literal(VarValue::parse(raw)),
    }
}
