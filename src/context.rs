//! Per-invocation context.

use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tracing::{warn, Span};

use crate::response::{IntoResponse, Response};

/// Free-form data middleware hand down to the ones after them.
pub type PassDown = Map<String, Value>;

/// The mutable record threaded through every middleware of one invocation.
///
/// The host creates one per invocation and lends it out as `&mut Context`;
/// every middleware in the chain sees the mutations of the ones before it.
/// A context is never cloned and never reused for a second invocation.
///
/// ```rust
/// use fnchain::{Context, Response};
/// use serde_json::json;
///
/// let mut ctx = Context::new().with_invocation_id("inv-1");
/// ctx.pass_down_mut().insert("user".into(), json!("albert"));
/// ctx.set_res(Response::json(json!({ "ok": true })));
///
/// assert_eq!(ctx.pass_down()["user"], "albert");
/// assert_eq!(ctx.res().map(Response::status), Some(200));
/// ```
#[derive(Debug)]
pub struct Context {
    res: Option<Response>,
    pass_down: PassDown,
    invocation_id: String,
    span: Span,
    completion: Option<oneshot::Sender<Option<Response>>>,
    done: bool,
}

impl Context {
    pub fn new() -> Self {
        Self {
            res: None,
            pass_down: PassDown::new(),
            invocation_id: String::new(),
            span: Span::none(),
            completion: None,
            done: false,
        }
    }

    /// Host-assigned identifier, recorded on the invocation span.
    pub fn with_invocation_id(mut self, id: impl Into<String>) -> Self {
        self.invocation_id = id.into();
        self
    }

    /// Host-provided logging span. When none is set the handler opens one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn invocation_id(&self) -> &str { &self.invocation_id }
    pub fn span(&self) -> &Span { &self.span }

    pub fn res(&self) -> Option<&Response> { self.res.as_ref() }

    /// Stores the response, replacing any earlier one.
    pub fn set_res(&mut self, res: impl IntoResponse) {
        self.res = Some(res.into_response());
    }

    pub fn take_res(&mut self) -> Option<Response> { self.res.take() }

    pub fn pass_down(&self) -> &PassDown { &self.pass_down }
    pub fn pass_down_mut(&mut self) -> &mut PassDown { &mut self.pass_down }

    /// Registers interest in completion.
    ///
    /// The receiver resolves with the final response slot when [`done`](Self::done)
    /// runs. Registering again replaces the earlier receiver.
    pub fn on_done(&mut self) -> oneshot::Receiver<Option<Response>> {
        let (tx, rx) = oneshot::channel();
        self.completion = Some(tx);
        rx
    }

    pub fn is_done(&self) -> bool { self.done }

    /// Signals completion to the host. Only the first call has an effect.
    ///
    /// A later call means the context is being reused: it is logged, and a
    /// receiver registered since the first call is closed without a value.
    pub fn done(&mut self) {
        if self.done {
            warn!(
                invocation_id = %self.invocation_id,
                "done() called again; a context must not be reused across invocations"
            );
            self.completion = None;
            return;
        }
        self.done = true;

        if let Some(tx) = self.completion.take() {
            // The host may have stopped listening; nothing left to tell it.
            let _ = tx.send(self.res.clone());
        }
    }
}

impl Default for Context {
    fn default() -> Self { Self::new() }
}
