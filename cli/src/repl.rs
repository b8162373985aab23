use crate::commands::{ChatSettings, HELP_TEXT, Input, Reply, parse_input};
use crate::render::TerminalConsumer;
use anyhow::Result;
use console::style;
use geminal_core::agent::MessageKind;
use geminal_core::{AgentLoop, ChatSubmission, Transcript};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;
use std::path::PathBuf;

pub struct Repl {
    agent: AgentLoop,
    settings: ChatSettings,
    transcript: Transcript,
    history_path: Option<PathBuf>,
}

impl Repl {
    pub fn new(agent: AgentLoop, settings: ChatSettings) -> Self {
        Self {
            agent,
            settings,
            transcript: Transcript::new(),
            history_path: None,
        }
    }

    pub fn with_history_path(mut self, path: PathBuf) -> Self {
        self.history_path = Some(path);
        self
    }

    #[cfg(test)]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Sends one prompt through the agent loop, streaming to `out`.
    /// Failures are shown, recorded and swallowed so the session continues.
    pub async fn submit<W: Write + Send>(&mut self, prompt: &str, out: W) -> Result<bool> {
        let submission = ChatSubmission {
            tier: self.settings.tier,
            prompt: prompt.to_string(),
            history: self.transcript.api_history(),
            system_instruction: self.settings.system_instruction.clone(),
            tools_enabled: self.settings.tools_enabled,
        };
        self.transcript.push(MessageKind::User, prompt);

        let mut consumer = TerminalConsumer::new(out);
        let result = self.agent.stream_chat(submission, &mut consumer).await;

        let partial = consumer.streamed_text().to_string();
        if !partial.is_empty() {
            self.transcript.push(MessageKind::Assistant, partial);
        }

        consumer.finish();
        if !consumer.tool_log().is_empty() {
            tracing::debug!("Tools used this submission: {:?}", consumer.tool_log());
        }
        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!("Submission failed: {:?}", e);
                let message = format!("Error: {}", e);
                eprintln!("{}", style(&message).red());
                self.transcript.push(MessageKind::Error, message);
                Ok(false)
            }
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Result<()> {
        match parse_input(line) {
            Input::Empty => {}
            Input::Chat(prompt) => {
                println!();
                self.submit(&prompt, std::io::stdout()).await?;
            }
            Input::Command(command) => {
                self.transcript.push(MessageKind::System, line.trim());
                match self.settings.apply(command, self.agent.tool_registry()) {
                    Reply::System(text) => {
                        println!("{}", style(&text).cyan());
                        self.transcript.push(MessageKind::System, text);
                    }
                    Reply::Error(text) => {
                        eprintln!("{}", style(&text).red());
                        self.transcript.push(MessageKind::Error, text);
                    }
                    Reply::ClearScreen => {
                        self.transcript.clear();
                        let _ = console::Term::stdout().clear_screen();
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn run(mut self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &self.history_path
            && editor.load_history(path).is_err()
        {
            tracing::debug!("No previous input history at {}", path.display());
        }

        println!("{}", style("Geminal").green().bold());
        println!("{}", style(HELP_TEXT).dim());
        self.transcript.push(MessageKind::System, HELP_TEXT);

        loop {
            match editor.readline("$ ") {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        let _ = editor.add_history_entry(line.as_str());
                    }
                    self.handle_line(&line).await?;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some(path) = &self.history_path
            && let Err(e) = editor.save_history(path)
        {
            tracing::warn!("Failed to save input history to {}: {}", path.display(), e);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geminal_core::providers::mock::{ScriptedProvider, call};
    use geminal_core::{ModelTier, ToolRegistry, standard_server};
    use serde_json::json;
    use std::sync::Arc;

    fn repl(provider: &ScriptedProvider) -> Repl {
        let mut registry = ToolRegistry::new();
        registry.register_server(standard_server());
        let agent = AgentLoop::new(Arc::new(provider.clone()), Arc::new(registry));
        Repl::new(
            agent,
            ChatSettings {
                tier: ModelTier::Flash,
                system_instruction: None,
                tools_enabled: true,
            },
        )
    }

    #[tokio::test]
    async fn history_grows_between_submissions() {
        let provider = ScriptedProvider::new()
            .then_text(&["Hi", " there"])
            .then_text(&["Sure"]);
        let mut repl = repl(&provider);

        assert!(repl.submit("hello", Vec::new()).await.unwrap());
        assert!(repl.submit("again", Vec::new()).await.unwrap());

        let histories = provider.opened_histories();
        assert!(histories[0].is_empty());
        assert_eq!(
            histories[1],
            vec![
                geminal_core::ChatTurn::user("hello"),
                geminal_core::ChatTurn::model("Hi there"),
            ]
        );
    }

    #[tokio::test]
    async fn failure_keeps_partial_text_and_records_error() {
        let provider = ScriptedProvider::new().then_failure(
            vec![geminal_core::StreamEvent::TextDelta("Half an ans".into())],
            "stream cut",
        );
        let mut repl = repl(&provider);

        assert!(!repl.submit("question", Vec::new()).await.unwrap());

        let messages = repl.transcript().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "Half an ans");
        assert_eq!(messages[2].kind, MessageKind::Error);
        assert_eq!(messages[2].content, "Error: Transport error: stream cut");
    }

    #[tokio::test]
    async fn tool_round_trip_lands_in_transcript_as_answer() {
        let provider = ScriptedProvider::new()
            .then_calls(vec![call("1", "roll_dice", json!({}))])
            .then_text(&["You rolled a number."]);
        let mut repl = repl(&provider);

        let mut out = Vec::new();
        assert!(repl.submit("roll", &mut out).await.unwrap());

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("roll_dice({})"));
        assert_eq!(
            repl.transcript().messages().last().unwrap().content,
            "You rolled a number."
        );
    }

    #[tokio::test]
    async fn commands_update_settings_used_by_next_submission() {
        let provider = ScriptedProvider::new().then_text(&["ok"]);
        let mut repl = repl(&provider);

        repl.handle_line("/model pro-thinking").await.unwrap();
        repl.handle_line("/system Speak French.").await.unwrap();
        repl.handle_line("/mcp toggle").await.unwrap();
        repl.submit("bonjour", Vec::new()).await.unwrap();

        let config = &provider.opened_configs()[0];
        assert_eq!(config.thinking_budget, 1024);
        assert_eq!(config.system_instruction.as_deref(), Some("Speak French."));
        assert!(config.tool_schemas.is_empty());

        // command echoes and replies never reach the model
        assert_eq!(
            provider.opened_histories()[0],
            Vec::<geminal_core::ChatTurn>::new()
        );
    }

    #[tokio::test]
    async fn clear_empties_transcript() {
        let provider = ScriptedProvider::new().then_text(&["ok"]);
        let mut repl = repl(&provider);
        repl.submit("hi", Vec::new()).await.unwrap();

        repl.handle_line("/clear").await.unwrap();
        assert!(repl.transcript().is_empty());
    }
}
