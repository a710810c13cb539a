use std::collections::BTreeMap;

use serde_json::Value;

use super::command_registry::{
    CommandSpec, ENHANCE_COMMAND, HISTORY_COMMAND, NO_ARG_COMMANDS, SAVE_COMMAND,
    SETTING_COMMANDS, SINGLE_PATH_COMMANDS,
};

/// One line of studio input, resolved to an action.
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    pub action: String,
    pub raw: String,
    pub prompt: Option<String>,
    pub settings_update: BTreeMap<String, Value>,
    pub command_args: BTreeMap<String, Value>,
}

impl Intent {
    fn new(action: &str, raw: &str) -> Self {
        Self {
            action: action.to_string(),
            raw: raw.to_string(),
            prompt: None,
            settings_update: BTreeMap::new(),
            command_args: BTreeMap::new(),
        }
    }
}

fn find_action(command: &str, specs: &[CommandSpec]) -> Option<&'static str> {
    specs
        .iter()
        .find(|spec| spec.command == command)
        .map(|spec| spec.action)
}

fn parse_single_path_arg(arg: &str) -> String {
    if arg.trim().is_empty() {
        return String::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect::<Vec<String>>()
            .join(" "),
        Err(_) => arg.trim().to_string(),
    }
}

fn parse_index_arg(arg: &str) -> Value {
    let trimmed = arg.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<u64>() {
        Ok(index) => Value::Number(index.into()),
        Err(_) => Value::String(trimmed.to_string()),
    }
}

pub fn parse_intent(text: &str) -> Intent {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return Intent::new("noop", text);
    }

    if let Some(slash_tail) = raw_trimmed.strip_prefix('/') {
        let command_len = slash_tail
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
            .count();
        if command_len > 0 {
            let command = slash_tail[..command_len].to_ascii_lowercase();
            let arg = slash_tail[command_len..].trim();

            if let Some(setting) = find_action(&command, SETTING_COMMANDS) {
                let mut intent = Intent::new("update_settings", text);
                intent
                    .settings_update
                    .insert(setting.to_string(), Value::String(arg.to_string()));
                return intent;
            }

            if let Some(action) = find_action(&command, SINGLE_PATH_COMMANDS) {
                let mut intent = Intent::new(action, text);
                intent.command_args.insert(
                    "path".to_string(),
                    Value::String(parse_single_path_arg(arg)),
                );
                return intent;
            }

            if command == ENHANCE_COMMAND.command {
                let mut intent = Intent::new(ENHANCE_COMMAND.action, text);
                if !arg.is_empty() {
                    intent.prompt = Some(arg.to_string());
                }
                return intent;
            }

            if command == SAVE_COMMAND.command {
                let mut intent = Intent::new(SAVE_COMMAND.action, text);
                intent
                    .command_args
                    .insert("index".to_string(), parse_index_arg(arg));
                return intent;
            }

            if command == HISTORY_COMMAND.command {
                let mut intent = Intent::new(HISTORY_COMMAND.action, text);
                intent.command_args.insert(
                    "all".to_string(),
                    Value::Bool(arg.eq_ignore_ascii_case("all")),
                );
                return intent;
            }

            if let Some(action) = find_action(&command, NO_ARG_COMMANDS) {
                return Intent::new(action, text);
            }

            let mut intent = Intent::new("unknown", text);
            intent
                .command_args
                .insert("command".to_string(), Value::String(command));
            return intent;
        }
    }

    let mut intent = Intent::new("generate", text);
    intent.prompt = Some(raw_trimmed.to_string());
    intent
}
