use crate::traits::FunctionCallResponse;
use serde_json::{Map, Value};

/// Receives progress from the orchestration loop as it happens.
///
/// Callbacks run inline on the loop's task, so a slow handler delays the
/// loop but the loop never waits on anything the handler starts.
pub trait StreamConsumer: Send {
    /// A text delta, delivered as soon as the transport yields it.
    fn on_text_chunk(&mut self, delta: &str);

    /// Fired once per dispatched call, in request order, before it executes.
    fn on_tool_start(&mut self, name: &str, args: &Map<String, Value>);

    fn on_tool_finish(&mut self, _response: &FunctionCallResponse) {}
}

/// Adapts a pair of closures to [`StreamConsumer`].
pub struct FnConsumer<T, S> {
    on_text: T,
    on_tool: S,
}

impl<T, S> FnConsumer<T, S>
where
    T: FnMut(&str) + Send,
    S: FnMut(&str, &Map<String, Value>) + Send,
{
    pub fn new(on_text: T, on_tool: S) -> Self {
        Self { on_text, on_tool }
    }
}

impl<T, S> StreamConsumer for FnConsumer<T, S>
where
    T: FnMut(&str) + Send,
    S: FnMut(&str, &Map<String, Value>) + Send,
{
    fn on_text_chunk(&mut self, delta: &str) {
        (self.on_text)(delta)
    }

    fn on_tool_start(&mut self, name: &str, args: &Map<String, Value>) {
        (self.on_tool)(name, args)
    }
}
