use console::style;
use geminal_core::{FunctionCallResponse, StreamConsumer};
use serde_json::{Map, Value};
use std::io::Write;

/// Prints streamed text as it arrives and keeps a copy for the transcript.
pub struct TerminalConsumer<W: Write + Send> {
    out: W,
    streamed: String,
    tool_log: Vec<String>,
    line_open: bool,
}

impl<W: Write + Send> TerminalConsumer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            streamed: String::new(),
            tool_log: Vec::new(),
            line_open: false,
        }
    }

    pub fn streamed_text(&self) -> &str {
        &self.streamed
    }

    pub fn tool_log(&self) -> &[String] {
        &self.tool_log
    }

    /// Ends the answer on a fresh line.
    pub fn finish(&mut self) {
        self.break_line();
        let _ = self.out.flush();
    }

    /// Keeps tool lines from running into partial text.
    fn break_line(&mut self) {
        if self.line_open {
            let _ = writeln!(self.out);
            self.line_open = false;
        }
    }
}

impl<W: Write + Send> StreamConsumer for TerminalConsumer<W> {
    fn on_text_chunk(&mut self, delta: &str) {
        self.streamed.push_str(delta);
        let _ = write!(self.out, "{}", delta);
        if !delta.is_empty() {
            self.line_open = !delta.ends_with('\n');
        }
        let _ = self.out.flush();
    }

    fn on_tool_start(&mut self, name: &str, args: &Map<String, Value>) {
        let entry = format!("{}({})", name, Value::Object(args.clone()));
        self.break_line();
        let _ = writeln!(self.out, "{} {}", style("⚙ Executing").yellow(), style(&entry).dim());
        let _ = self.out.flush();
        self.tool_log.push(entry);
    }

    fn on_tool_finish(&mut self, response: &FunctionCallResponse) {
        let line = match &response.outcome {
            Ok(_) => format!("{} {}", style("✓").green(), response.name),
            Err(e) => format!("{} {}: {}", style("✗").red(), response.name, e),
        };
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deltas_are_written_in_order() {
        let mut consumer = TerminalConsumer::new(Vec::new());
        consumer.on_text_chunk("Hel");
        consumer.on_text_chunk("lo");

        assert_eq!(consumer.streamed_text(), "Hello");
        assert_eq!(String::from_utf8(consumer.out).unwrap(), "Hello");
    }

    #[test]
    fn tool_start_is_logged_on_its_own_line() {
        console::set_colors_enabled(false);
        let mut consumer = TerminalConsumer::new(Vec::new());
        consumer.on_text_chunk("Checking");
        let args = json!({"city": "Oslo"}).as_object().cloned().unwrap();
        consumer.on_tool_start("get_weather", &args);
        consumer.on_tool_finish(&FunctionCallResponse::error("1", "get_weather", "offline"));

        assert_eq!(consumer.tool_log(), ["get_weather({\"city\":\"Oslo\"})"]);
        let out = String::from_utf8(consumer.out).unwrap();
        assert_eq!(
            out,
            "Checking\n⚙ Executing get_weather({\"city\":\"Oslo\"})\n✗ get_weather: offline\n"
        );
    }
}
