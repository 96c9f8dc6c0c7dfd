//! Request-scoped log prefixes and key/value log macros.
//!
//! Every handler line starts with `[req=req-xxxxxxxx]`, the id minted by
//! `RequestContext` when the request is admitted. Once an ingested event
//! is stored its id is appended as `[event=<uuid>]`, so the signature,
//! scan and store lines of one ingest can be joined in the log.

use std::fmt;

/// Prefix for one inbound request, optionally narrowed to a stored event.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub request_id: String,
    pub event_id: Option<String>,
}

impl LogContext {
    pub fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            event_id: None,
        }
    }

    pub fn with_event(&self, event_id: &str) -> Self {
        Self {
            request_id: self.request_id.clone(),
            event_id: Some(event_id.to_string()),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event_id {
            Some(eid) => write!(f, "[req={}] [event={}]", self.request_id, eid),
            None => write!(f, "[req={}]", self.request_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr $(, $key:ident = $value:expr)* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*) $(, $value)*)
        );
    };
}
