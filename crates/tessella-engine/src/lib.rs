//! Rule-based automation engine for Tessella.
//!
//! The engine evaluates stored automation rules against record mutations:
//! trigger matching, `{{field}}` template resolution, and action dispatch
//! (email, webhooks, field updates, tasks) with per-rule failure isolation
//! and an execution log entry for every firing.
//!
//! [`RecordService`] is the write path: it validates payloads against the
//! entity schema, commits the mutation, and hands the committed snapshot to
//! the [`AutomationEngine`].

pub mod adapters;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod service;
pub mod settings;
pub mod stores;
pub mod template;
pub mod trigger;
pub mod types;

pub use adapters::{
    EmailSender, HttpClient, HttpResponse, LoggingTaskSink, ReqwestHttpClient, SmtpEmailSender,
    TaskRequest, TaskSink,
};
pub use dispatch::{ActionDispatcher, DispatchOutcome};
pub use engine::AutomationEngine;
pub use error::{EngineError, Result};
pub use service::RecordService;
pub use settings::{EngineSettings, SmtpSettings};
pub use stores::{
    EntityStore, ExecutionLogStore, InMemoryEntityStore, InMemoryExecutionLog, InMemoryRuleStore,
    RuleStore,
};
pub use trigger::rule_matches;
pub use types::{
    ActionConfig, ActionType, AutomationRule, ChangeEvent, ExecutionLogEntry, ExecutionStatus,
    TriggerConfig, TriggerType, WebhookMethod,
};
