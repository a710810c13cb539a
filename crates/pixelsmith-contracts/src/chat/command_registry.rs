#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub action: &'static str,
}

/// Commands that change one form field; `action` is the settings key.
pub(crate) const SETTING_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "style",
        action: "style_preset",
    },
    CommandSpec {
        command: "realism",
        action: "realism",
    },
    CommandSpec {
        command: "lighting",
        action: "lighting",
    },
    CommandSpec {
        command: "detail",
        action: "detail",
    },
    CommandSpec {
        command: "camera",
        action: "camera",
    },
    CommandSpec {
        command: "aspect",
        action: "aspect_ratio",
    },
    CommandSpec {
        command: "model",
        action: "model",
    },
    CommandSpec {
        command: "negative",
        action: "negative_prompt",
    },
    CommandSpec {
        command: "strength",
        action: "strength",
    },
];

pub(crate) const SINGLE_PATH_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "image",
        action: "set_reference_image",
    },
    CommandSpec {
        command: "out",
        action: "set_output_dir",
    },
];

pub(crate) const NO_ARG_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "text",
        action: "text_mode",
    },
    CommandSpec {
        command: "clear",
        action: "clear_history",
    },
    CommandSpec {
        command: "settings",
        action: "show_settings",
    },
    CommandSpec {
        command: "options",
        action: "show_options",
    },
    CommandSpec {
        command: "help",
        action: "help",
    },
    CommandSpec {
        command: "quit",
        action: "quit",
    },
    CommandSpec {
        command: "exit",
        action: "quit",
    },
];

pub(crate) const ENHANCE_COMMAND: CommandSpec = CommandSpec {
    command: "enhance",
    action: "enhance",
};

/// `/history` shows the recent strip; `/history all` the whole session.
pub(crate) const HISTORY_COMMAND: CommandSpec = CommandSpec {
    command: "history",
    action: "history",
};

pub(crate) const SAVE_COMMAND: CommandSpec = CommandSpec {
    command: "save",
    action: "save",
};

pub const STUDIO_HELP_COMMANDS: &[&str] = &[
    "/style",
    "/realism",
    "/lighting",
    "/detail",
    "/camera",
    "/aspect",
    "/model",
    "/negative",
    "/strength",
    "/image",
    "/text",
    "/out",
    "/enhance",
    "/history",
    "/save",
    "/clear",
    "/settings",
    "/options",
    "/help",
    "/quit",
];
