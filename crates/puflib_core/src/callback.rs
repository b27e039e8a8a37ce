//! Status and query callback bus.
//!
//! # Responsibility
//! - Route module status reports to one installed status handler.
//! - Route interactive queries to one optional query handler.
//!
//! # Invariants
//! - Reporting never fails the caller; formatting failures degrade to
//!   `INTERNAL_FORMAT_ERROR`.
//! - Without a query handler, `query` fails immediately and leaves the
//!   buffer untouched.
//! - Handlers run synchronously on the calling thread.

use crate::module::ModuleInfo;
use crate::nv_store::StoreError;
use crate::status::{
    describe_os_error, render_status_line, try_render_status_line, StatusLevel,
    INTERNAL_FORMAT_ERROR,
};
use once_cell::sync::Lazy;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

/// Receives one rendered status line.
pub type StatusHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Answers one query by filling `buffer`; returns false when unanswered.
pub type QueryHandler = Arc<dyn Fn(&QueryRequest<'_>, &mut String) -> bool + Send + Sync>;

static GLOBAL_BUS: Lazy<Arc<CallbackBus>> = Lazy::new(|| Arc::new(CallbackBus::new()));

/// One interactive query issued by a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRequest<'a> {
    pub module: &'a ModuleInfo,
    /// Stable machine key, e.g. for scripted answers.
    pub key: &'a str,
    /// Human-readable prompt.
    pub prompt: &'a str,
    /// Maximum answer length in bytes.
    pub capacity: usize,
}

/// Query failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    NoHandler,
    Declined,
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoHandler => write!(f, "no query handler installed"),
            Self::Declined => write!(f, "query handler did not answer"),
        }
    }
}

impl Error for QueryError {}

/// Status/query handler slots, last writer wins.
///
/// Reports issued while no status handler is installed go to the `log`
/// facade at the matching level.
#[derive(Default)]
pub struct CallbackBus {
    status: RwLock<Option<StatusHandler>>,
    query: RwLock<Option<QueryHandler>>,
}

impl CallbackBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide bus shared by hosts that do not build their own.
    pub fn global() -> Arc<CallbackBus> {
        Arc::clone(&GLOBAL_BUS)
    }

    pub fn set_status_handler(&self, handler: impl Fn(&str) + Send + Sync + 'static) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn clear_status_handler(&self) {
        *self.status.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn set_query_handler(
        &self,
        handler: impl Fn(&QueryRequest<'_>, &mut String) -> bool + Send + Sync + 'static,
    ) {
        *self.query.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(handler));
    }

    pub fn clear_query_handler(&self) {
        *self.query.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn has_query_handler(&self) -> bool {
        self.query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Reports `<level> (<module>): <message>`.
    pub fn report(&self, module: &ModuleInfo, level: StatusLevel, message: &str) {
        let line = render_status_line(level, module.name, message);
        self.dispatch(level, &line);
    }

    /// Reports a message built from format arguments.
    ///
    /// Use with `format_args!`. Arguments that fail to format produce the
    /// internal-error fallback line instead.
    pub fn report_fmt(&self, module: &ModuleInfo, level: StatusLevel, args: fmt::Arguments<'_>) {
        match try_render_status_line(level, module.name, args) {
            Some(line) => self.dispatch(level, &line),
            None => self.dispatch(StatusLevel::Error, INTERNAL_FORMAT_ERROR),
        }
    }

    /// Reports an OS error description at error level.
    pub fn report_os_error(&self, module: &ModuleInfo, err: &io::Error) {
        self.report(module, StatusLevel::Error, &describe_os_error(err));
    }

    /// Reports the calling thread's last OS error at error level.
    pub fn report_last_os_error(&self, module: &ModuleInfo) {
        self.report_os_error(module, &io::Error::last_os_error());
    }

    /// Reports a store failure; OS failures use their strerror text.
    pub fn report_store_error(&self, module: &ModuleInfo, err: &StoreError) {
        match err.io_error() {
            Some(source) => self.report_os_error(module, source),
            None => self.report(module, StatusLevel::Error, &err.to_string()),
        }
    }

    /// Asks the installed query handler for input.
    ///
    /// Answers longer than `capacity` bytes are cut at the last char
    /// boundary that fits.
    pub fn query(
        &self,
        module: &ModuleInfo,
        key: &str,
        prompt: &str,
        buffer: &mut String,
        capacity: usize,
    ) -> Result<(), QueryError> {
        let handler = self
            .query
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(handler) = handler else {
            return Err(QueryError::NoHandler);
        };

        let request = QueryRequest {
            module,
            key,
            prompt,
            capacity,
        };
        if handler(&request, buffer) {
            truncate_to_capacity(buffer, capacity);
            Ok(())
        } else {
            Err(QueryError::Declined)
        }
    }

    fn dispatch(&self, level: StatusLevel, line: &str) {
        let handler = self
            .status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler(line),
            None => log::log!(target: "puflib::status", level.as_log_level(), "{line}"),
        }
    }
}

fn truncate_to_capacity(buffer: &mut String, capacity: usize) {
    if buffer.len() <= capacity {
        return;
    }
    let mut end = capacity;
    while !buffer.is_char_boundary(end) {
        end -= 1;
    }
    buffer.truncate(end);
}
