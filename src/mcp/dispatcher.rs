//! Method table and request dispatch.
//!
//! The table is built once by explicit registration and never mutated
//! afterwards, so it can be shared behind an `Arc` by every front-end
//! without locking. Dispatch is also the single place where handler
//! failures, including panics, are translated into JSON-RPC errors.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::{CatalogError, Result};

use super::transport::{
    decode_request, decode_value, ErrorCode, JsonRpcRequest, JsonRpcResponse,
};

/// A method handler. Receives the raw `params` member, if any.
pub type Handler = fn(Option<Value>) -> Result<Value>;

/// Whether a method answers with a response or is fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Request,
    Notification,
}

#[derive(Clone, Copy)]
enum Method {
    Request(Handler),
    Notification(Handler),
    /// Terminates the process. Carried out by the front-end, not here.
    Exit,
}

impl Method {
    fn kind(&self) -> MethodKind {
        match self {
            Method::Request(_) => MethodKind::Request,
            Method::Notification(_) | Method::Exit => MethodKind::Notification,
        }
    }
}

/// What a front-end should do after dispatching one message.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Send this response.
    Reply(JsonRpcResponse),
    /// Send nothing.
    Silent,
    /// Terminate the process, after sending the response if there is one.
    /// `exit` sent with an id is answered with `null` like any other
    /// notification-kind method.
    Exit(Option<JsonRpcResponse>),
}

/// Immutable mapping from method name to handler.
pub struct MethodTable {
    methods: HashMap<&'static str, Method>,
}

/// Collects registrations for a [`MethodTable`].
#[derive(Default)]
pub struct MethodTableBuilder {
    methods: HashMap<&'static str, Method>,
}

impl MethodTableBuilder {
    /// Registers a method that answers with a response.
    pub fn request(mut self, name: &'static str, handler: Handler) -> Self {
        self.insert(name, Method::Request(handler));
        self
    }

    /// Registers a notification. Its handler's return value is discarded.
    pub fn notification(mut self, name: &'static str, handler: Handler) -> Self {
        self.insert(name, Method::Notification(handler));
        self
    }

    /// Registers the notification that ends the process.
    pub fn exit(mut self, name: &'static str) -> Self {
        self.insert(name, Method::Exit);
        self
    }

    pub fn build(self) -> MethodTable {
        MethodTable {
            methods: self.methods,
        }
    }

    fn insert(&mut self, name: &'static str, method: Method) {
        if self.methods.insert(name, method).is_some() {
            warn!(method = name, "method registered twice; keeping the last registration");
        }
    }
}

impl MethodTable {
    pub fn builder() -> MethodTableBuilder {
        MethodTableBuilder::default()
    }

    /// Returns the kind of a registered method.
    pub fn kind(&self, name: &str) -> Option<MethodKind> {
        self.methods.get(name).map(Method::kind)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Decodes one text frame and dispatches it.
    ///
    /// Undecodable frames are answered with a parse or invalid-request error.
    pub fn handle_line(&self, line: &str) -> Dispatch {
        match decode_request(line) {
            Ok(request) => self.dispatch(&request),
            Err(e) => Dispatch::Reply(e.into_response()),
        }
    }

    /// Same as [`handle_line`](Self::handle_line) for an already-parsed value.
    pub fn handle_value(&self, value: Value) -> Dispatch {
        match decode_value(value) {
            Ok(request) => self.dispatch(&request),
            Err(e) => Dispatch::Reply(e.into_response()),
        }
    }

    /// Dispatches a decoded request to its handler.
    ///
    /// Notifications never produce a reply, even when the method is unknown
    /// or the handler fails; those cases are only logged. A request that
    /// names a notification-kind method is answered with `null`.
    pub fn dispatch(&self, request: &JsonRpcRequest) -> Dispatch {
        debug!(
            method = %request.method,
            notification = request.is_notification(),
            "dispatching"
        );

        let Some(method) = self.methods.get(request.method.as_str()) else {
            return match &request.id {
                Some(id) => Dispatch::Reply(JsonRpcResponse::error(
                    id.clone(),
                    ErrorCode::MethodNotFound,
                    format!("Method not found: {}", request.method),
                )),
                None => {
                    warn!(method = %request.method, "notification for unknown method ignored");
                    Dispatch::Silent
                }
            };
        };

        let (handler, kind) = match method {
            Method::Exit => {
                let reply = request
                    .id
                    .clone()
                    .map(|id| JsonRpcResponse::success(id, Value::Null));
                return Dispatch::Exit(reply);
            }
            Method::Request(h) => (*h, MethodKind::Request),
            Method::Notification(h) => (*h, MethodKind::Notification),
        };

        let outcome = invoke(handler, request.params.clone());

        match (&request.id, outcome) {
            (Some(id), Ok(result)) => {
                let result = match kind {
                    MethodKind::Request => result,
                    MethodKind::Notification => Value::Null,
                };
                Dispatch::Reply(JsonRpcResponse::success(id.clone(), result))
            }
            (Some(id), Err(e)) => {
                warn!(method = %request.method, error = %e, "request failed");
                Dispatch::Reply(JsonRpcResponse::from_error(id.clone(), &e))
            }
            (None, Ok(_)) => Dispatch::Silent,
            (None, Err(e)) => {
                warn!(method = %request.method, error = %e, "notification handler failed");
                Dispatch::Silent
            }
        }
    }
}

/// Runs a handler, turning a panic into an ordinary error.
fn invoke(handler: Handler, params: Option<Value>) -> Result<Value> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(params))) {
        Ok(result) => result,
        Err(payload) => Err(CatalogError::Unexpected {
            message: format!("handler panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn echo(params: Option<Value>) -> Result<Value> {
        Ok(params.unwrap_or(Value::Null))
    }

    fn fails(_: Option<Value>) -> Result<Value> {
        Err(CatalogError::InvalidParams {
            message: "Missing parameter: 'x'".to_string(),
        })
    }

    fn explodes(_: Option<Value>) -> Result<Value> {
        panic!("boom")
    }

    fn table() -> MethodTable {
        MethodTable::builder()
            .request("echo", echo)
            .request("fails", fails)
            .request("explodes", explodes)
            .notification("note", echo)
            .exit("exit")
            .build()
    }

    fn reply(dispatch: Dispatch) -> JsonRpcResponse {
        match dispatch {
            Dispatch::Reply(r) => r,
            other => panic!("expected a reply, got {:?}", other),
        }
    }

    #[test]
    fn test_request_gets_result() {
        let line = r#"{"jsonrpc":"2.0","id":1,"method":"echo","params":{"a":1}}"#;
        let response = reply(table().handle_line(line));
        assert_eq!(response.id, json!(1));
        assert_eq!(response.result, Some(json!({"a": 1})));
    }

    #[test]
    fn test_unknown_method_request() {
        let response = reply(table().handle_line(r#"{"jsonrpc":"2.0","id":2,"method":"nope"}"#));
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[test]
    fn test_unknown_method_notification_is_silent() {
        let outcome = table().handle_line(r#"{"jsonrpc":"2.0","method":"nope"}"#);
        assert!(matches!(outcome, Dispatch::Silent));
    }

    #[test]
    fn test_handler_error_is_translated() {
        let response = reply(table().handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"fails"}"#));
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Missing parameter: 'x'");
    }

    #[test]
    fn test_panic_becomes_server_error() {
        let line = r#"{"jsonrpc":"2.0","id":4,"method":"explodes"}"#;
        let response = reply(table().handle_line(line));
        let error = response.error.unwrap();
        assert_eq!(error.code, -32000);
        assert!(error.message.contains("boom"));
    }

    #[test]
    fn test_notification_is_silent() {
        let outcome = table().handle_line(r#"{"jsonrpc":"2.0","method":"note","params":{"a":1}}"#);
        assert!(matches!(outcome, Dispatch::Silent));
    }

    #[test]
    fn test_notification_method_called_with_id_answers_null() {
        let response = reply(table().handle_line(r#"{"jsonrpc":"2.0","id":5,"method":"note"}"#));
        assert_eq!(response.result, Some(Value::Null));
    }

    #[test]
    fn test_exit() {
        let outcome = table().handle_line(r#"{"jsonrpc":"2.0","method":"exit"}"#);
        assert!(matches!(outcome, Dispatch::Exit(None)));
    }

    #[test]
    fn test_exit_with_id_answers_null_then_exits() {
        match table().handle_line(r#"{"jsonrpc":"2.0","id":6,"method":"exit"}"#) {
            Dispatch::Exit(Some(response)) => {
                assert_eq!(response.id, json!(6));
                assert_eq!(response.result, Some(Value::Null));
                assert!(response.error.is_none());
            }
            other => panic!("expected exit with a reply, got {:?}", other),
        }
    }

    #[test]
    fn test_kinds_and_names() {
        let t = table();
        assert_eq!(t.kind("echo"), Some(MethodKind::Request));
        assert_eq!(t.kind("note"), Some(MethodKind::Notification));
        assert_eq!(t.kind("exit"), Some(MethodKind::Notification));
        assert_eq!(t.kind("missing"), None);
        assert_eq!(t.method_names(), vec!["echo", "exit", "explodes", "fails", "note"]);
    }
}
