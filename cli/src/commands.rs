use geminal_core::{ModelTier, ToolRegistry};

pub const HELP_TEXT: &str = "\
Type a message to start chatting.
----------------------------------------------------------------
Available Commands:
  /help       - Show this help message
  /clear      - Clear terminal history
  /model      - Switch AI models (flash | pro | pro-thinking)
  /system     - Set system instruction
  /mcp        - Show tool status or toggle tools (status | toggle)
----------------------------------------------------------------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpAction {
    Status,
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Model(Option<String>),
    System(Option<String>),
    Mcp(Option<McpAction>),
    InvalidMcp(String),
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Chat(String),
    Command(Command),
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Input::Chat(line.to_string());
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let arg = (!args.is_empty()).then(|| args.to_string());

    let command = match name.to_lowercase().as_str() {
        "help" => Command::Help,
        "clear" => Command::Clear,
        "model" => Command::Model(arg),
        "system" => Command::System(arg),
        "mcp" => match arg.as_deref().map(str::to_lowercase).as_deref() {
            None | Some("status") => Command::Mcp(Some(McpAction::Status)),
            Some("toggle") => Command::Mcp(Some(McpAction::Toggle)),
            Some(other) => Command::InvalidMcp(other.to_string()),
        },
        other => Command::Unknown(other.to_string()),
    };

    Input::Command(command)
}

/// What the REPL should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    System(String),
    Error(String),
    ClearScreen,
}

/// Per-conversation choices the commands adjust and each submission reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSettings {
    pub tier: ModelTier,
    pub system_instruction: Option<String>,
    pub tools_enabled: bool,
}

impl ChatSettings {
    pub fn apply(&mut self, command: Command, registry: &ToolRegistry) -> Reply {
        match command {
            Command::Help => Reply::System(HELP_TEXT.to_string()),
            Command::Clear => Reply::ClearScreen,
            Command::Model(None) => Reply::System(format!(
                "Current model: {} ({})",
                self.tier,
                self.tier.model_id()
            )),
            Command::Model(Some(name)) => match name.parse::<ModelTier>() {
                Ok(tier) => {
                    self.tier = tier;
                    Reply::System(format!("Switched to {} ({})", tier, tier.model_id()))
                }
                Err(e) => Reply::Error(e),
            },
            Command::System(None) => Reply::System(format!(
                "Current system instruction: {}",
                self.system_instruction.as_deref().unwrap_or("(none)")
            )),
            Command::System(Some(instruction)) => {
                self.system_instruction = Some(instruction);
                Reply::System("System instruction updated.".to_string())
            }
            Command::Mcp(Some(McpAction::Toggle)) => {
                self.tools_enabled = !self.tools_enabled;
                Reply::System(format!(
                    "MCP tools {}.",
                    if self.tools_enabled { "enabled" } else { "disabled" }
                ))
            }
            Command::Mcp(_) => Reply::System(self.mcp_status(registry)),
            Command::InvalidMcp(arg) => Reply::Error(format!(
                "Unknown /mcp option: {}. Available: status, toggle",
                arg
            )),
            Command::Unknown(name) => Reply::Error(format!(
                "Command not found: /{}. Type /help for assistance.",
                name
            )),
        }
    }

    fn mcp_status(&self, registry: &ToolRegistry) -> String {
        let mut lines = vec![format!(
            "MCP tools: {} ({} tools)",
            if self.tools_enabled { "enabled" } else { "disabled" },
            registry.tool_count()
        )];
        for server in registry.servers() {
            let names: Vec<&str> = server.tools.iter().map(|t| t.name()).collect();
            lines.push(format!("  {}: {}", server.name, names.join(", ")));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geminal_core::tools::standard_server;

    fn settings() -> ChatSettings {
        ChatSettings {
            tier: ModelTier::Flash,
            system_instruction: None,
            tools_enabled: true,
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register_server(standard_server());
        registry
    }

    #[test]
    fn plain_text_is_chat() {
        assert_eq!(parse_input("  hello there "), Input::Chat("hello there".into()));
        assert_eq!(parse_input("   "), Input::Empty);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(parse_input("/HELP"), Input::Command(Command::Help));
        assert_eq!(
            parse_input("/model pro"),
            Input::Command(Command::Model(Some("pro".into())))
        );
        assert_eq!(
            parse_input("/system You are a pirate."),
            Input::Command(Command::System(Some("You are a pirate.".into())))
        );
        assert_eq!(
            parse_input("/mcp"),
            Input::Command(Command::Mcp(Some(McpAction::Status)))
        );
        assert_eq!(
            parse_input("/mcp Toggle"),
            Input::Command(Command::Mcp(Some(McpAction::Toggle)))
        );
        assert_eq!(
            parse_input("/mcp restart"),
            Input::Command(Command::InvalidMcp("restart".into()))
        );
        assert_eq!(
            parse_input("/frobnicate"),
            Input::Command(Command::Unknown("frobnicate".into()))
        );
    }

    #[test]
    fn model_switch_and_rejection() {
        let mut settings = settings();
        let registry = registry();

        let reply = settings.apply(Command::Model(Some("pro".into())), &registry);
        assert_eq!(
            reply,
            Reply::System("Switched to pro (gemini-3-pro-preview)".into())
        );
        assert_eq!(settings.tier, ModelTier::Pro);

        let reply = settings.apply(Command::Model(Some("ultra".into())), &registry);
        assert!(matches!(reply, Reply::Error(ref m) if m.starts_with("Unknown model: ultra")));
        assert_eq!(settings.tier, ModelTier::Pro);
    }

    #[test]
    fn system_instruction_round_trip() {
        let mut settings = settings();
        let registry = registry();

        assert_eq!(
            settings.apply(Command::System(None), &registry),
            Reply::System("Current system instruction: (none)".into())
        );
        settings.apply(Command::System(Some("Be terse.".into())), &registry);
        assert_eq!(settings.system_instruction.as_deref(), Some("Be terse."));
    }

    #[test]
    fn mcp_toggle_and_status() {
        let mut settings = settings();
        let registry = registry();

        settings.apply(Command::Mcp(Some(McpAction::Toggle)), &registry);
        assert!(!settings.tools_enabled);

        let Reply::System(status) = settings.apply(Command::Mcp(None), &registry) else {
            panic!("expected status text");
        };
        assert!(status.starts_with("MCP tools: disabled (3 tools)"));
        assert!(status.contains("standard-utils: get_current_time, get_weather, roll_dice"));
    }

    #[test]
    fn unknown_command_is_error() {
        let mut settings = settings();
        assert_eq!(
            settings.apply(Command::Unknown("foo".into()), &registry()),
            Reply::Error("Command not found: /foo. Type /help for assistance.".into())
        );
    }
}
