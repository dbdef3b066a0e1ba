//! The alarm notifier: six stages from trigger payload to delivered email.

use std::sync::Arc;

use alarmlog_config::{NotifierConfig, RecipientSetting};
use alarmlog_core::{
    AlarmEvent, ComposedEmail, DeliveryReceipt, EmailTransport, Geolocator, LogQuery,
    LogQueryService, LogRecord, MetricFilter, MetricFilterDirectory, NotifierError,
    RecipientList, SubscriptionDirectory, TimeWindow,
};
use alarmlog_monitor::{Completion, ExecutionTracer};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, info_span, Instrument};

use crate::compose::EmailComposer;
use crate::context::resolve_context;
use crate::pagination::paginate;
use crate::pipeline::{Pipeline, Stage, StageOutput, StageWarning};
use crate::recipients::resolve_recipients;
use crate::transform::TransformChain;

/// Stage name of the entry recording the raw trigger payload.
pub const TRIGGER_STAGE: &str = "trigger";

// ─────────────────────────────────────────────────────────────────────────────
// Run Context
// ─────────────────────────────────────────────────────────────────────────────

/// Data carried between stages. Each variant is the output of one stage.
#[derive(Debug)]
pub enum RunContext {
    Triggered {
        payload: Value,
    },
    Resolved {
        alarm: AlarmEvent,
        window: TimeWindow,
    },
    FilterSelected {
        alarm: AlarmEvent,
        window: TimeWindow,
        filter: MetricFilter,
    },
    LogsFetched {
        alarm: AlarmEvent,
        window: TimeWindow,
        query: LogQuery,
        records: Vec<LogRecord>,
    },
    RecipientsResolved {
        alarm: AlarmEvent,
        window: TimeWindow,
        query: LogQuery,
        records: Vec<LogRecord>,
        recipients: RecipientList,
    },
    Composed {
        email: ComposedEmail,
    },
    Sent {
        receipt: DeliveryReceipt,
    },
}

impl RunContext {
    pub fn name(&self) -> &'static str {
        match self {
            RunContext::Triggered { .. } => "triggered",
            RunContext::Resolved { .. } => "resolved",
            RunContext::FilterSelected { .. } => "filter-selected",
            RunContext::LogsFetched { .. } => "logs-fetched",
            RunContext::RecipientsResolved { .. } => "recipients-resolved",
            RunContext::Composed { .. } => "composed",
            RunContext::Sent { .. } => "sent",
        }
    }
}

fn out_of_order(stage: &'static str, found: &RunContext) -> NotifierError {
    NotifierError::PipelineState {
        stage,
        found: found.name(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stages
// ─────────────────────────────────────────────────────────────────────────────

struct ResolveContext;

#[async_trait]
impl Stage<RunContext> for ResolveContext {
    fn name(&self) -> &'static str {
        "resolve-context"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let payload = match context {
            RunContext::Triggered { payload } => payload,
            other => return Err(out_of_order(self.name(), &other)),
        };

        let (alarm, window) = resolve_context(&payload)?;
        let snapshot = json!({ "alarm": alarm, "window": window });
        Ok(StageOutput::new(RunContext::Resolved { alarm, window }, snapshot))
    }
}

struct FetchFilters {
    directory: Arc<dyn MetricFilterDirectory>,
}

#[async_trait]
impl Stage<RunContext> for FetchFilters {
    fn name(&self) -> &'static str {
        "fetch-filters"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let (alarm, window) = match context {
            RunContext::Resolved { alarm, window } => (alarm, window),
            other => return Err(out_of_order(self.name(), &other)),
        };

        let filters = self
            .directory
            .describe_metric_filters(&alarm.metric_name, &alarm.namespace)
            .await?;
        let Some(filter) = filters.first().cloned() else {
            return Err(NotifierError::EmptyFilterResult {
                metric_name: alarm.metric_name,
                namespace: alarm.namespace,
            });
        };

        let snapshot = json!({ "metric_filters": filters, "selected": filter });
        Ok(StageOutput::new(
            RunContext::FilterSelected { alarm, window, filter },
            snapshot,
        ))
    }
}

struct FetchLogs {
    service: Arc<dyn LogQueryService>,
}

#[async_trait]
impl Stage<RunContext> for FetchLogs {
    fn name(&self) -> &'static str {
        "fetch-logs"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let (alarm, window, filter) = match context {
            RunContext::FilterSelected { alarm, window, filter } => (alarm, window, filter),
            other => return Err(out_of_order(self.name(), &other)),
        };

        let service = &self.service;
        let (query, records) = paginate(LogQuery::new(&filter, &window), |q| {
            service.filter_log_events(q)
        })
        .await?;

        let snapshot = json!({ "query": query, "events": records });
        Ok(StageOutput::new(
            RunContext::LogsFetched {
                alarm,
                window,
                query,
                records,
            },
            snapshot,
        ))
    }
}

struct ResolveRecipients {
    setting: RecipientSetting,
    directory: Arc<dyn SubscriptionDirectory>,
}

#[async_trait]
impl Stage<RunContext> for ResolveRecipients {
    fn name(&self) -> &'static str {
        "resolve-recipients"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let (alarm, window, query, records) = match context {
            RunContext::LogsFetched {
                alarm,
                window,
                query,
                records,
            } => (alarm, window, query, records),
            other => return Err(out_of_order(self.name(), &other)),
        };

        let recipients =
            resolve_recipients(&self.setting, &alarm.topic_arn, self.directory.as_ref()).await?;

        let snapshot = json!({ "recipients": recipients });
        Ok(StageOutput::new(
            RunContext::RecipientsResolved {
                alarm,
                window,
                query,
                records,
                recipients,
            },
            snapshot,
        ))
    }
}

struct ComposeEmail {
    chain: TransformChain,
    composer: EmailComposer,
}

#[async_trait]
impl Stage<RunContext> for ComposeEmail {
    fn name(&self) -> &'static str {
        "compose-email"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let (alarm, window, query, records, recipients) = match context {
            RunContext::RecipientsResolved {
                alarm,
                window,
                query,
                records,
                recipients,
            } => (alarm, window, query, records, recipients),
            other => return Err(out_of_order(self.name(), &other)),
        };

        let rendered = self.chain.transform_all(&records).await;
        let composition = self
            .composer
            .compose(&alarm, &window, &query, recipients, &rendered)?;

        let aux = self.composer.custom_args().map(Value::from);
        let warnings = composition
            .warnings
            .iter()
            .map(|w| StageWarning::from_error(w, aux.clone()))
            .collect();

        let snapshot = json!(composition.email);
        Ok(StageOutput::new(RunContext::Composed { email: composition.email }, snapshot)
            .with_warnings(warnings))
    }
}

struct SendEmail {
    transport: Arc<dyn EmailTransport>,
}

#[async_trait]
impl Stage<RunContext> for SendEmail {
    fn name(&self) -> &'static str {
        "send-email"
    }

    async fn run(&self, context: RunContext) -> Result<StageOutput<RunContext>, NotifierError> {
        let email = match context {
            RunContext::Composed { email } => email,
            other => return Err(out_of_order(self.name(), &other)),
        };

        let receipt = self.transport.send(&email).await?;
        info!(
            recipients = email.to.len(),
            status = receipt.status,
            "Alarm report delivered"
        );

        let snapshot = json!(receipt);
        Ok(StageOutput::new(RunContext::Sent { receipt }, snapshot))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notifier
// ─────────────────────────────────────────────────────────────────────────────

/// External services a notifier talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub filters: Arc<dyn MetricFilterDirectory>,
    pub logs: Arc<dyn LogQueryService>,
    pub subscriptions: Arc<dyn SubscriptionDirectory>,
    pub transport: Arc<dyn EmailTransport>,
    /// Enables the geolocation transform when present.
    pub geolocator: Option<Arc<dyn Geolocator>>,
}

/// Runs one pipeline per trigger payload. Holds no per-run state, so a single
/// instance can serve concurrent invocations.
pub struct Notifier {
    pipeline: Pipeline<RunContext>,
}

impl Notifier {
    pub fn new(config: &NotifierConfig, collaborators: Collaborators) -> Self {
        let pipeline = Pipeline::new()
            .stage(ResolveContext)
            .stage(FetchFilters {
                directory: collaborators.filters,
            })
            .stage(FetchLogs {
                service: collaborators.logs,
            })
            .stage(ResolveRecipients {
                setting: config.recipients.clone(),
                directory: collaborators.subscriptions,
            })
            .stage(ComposeEmail {
                chain: TransformChain::standard(collaborators.geolocator),
                composer: EmailComposer::from_config(config),
            })
            .stage(SendEmail {
                transport: collaborators.transport,
            });

        Self { pipeline }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.pipeline.stage_names()
    }

    /// Processes one trigger payload with a fresh tracer.
    pub async fn run(&self, payload: Value) -> Completion {
        self.run_traced(ExecutionTracer::new(), payload).await
    }

    /// Processes one trigger payload, recording into `tracer`.
    pub async fn run_traced(&self, mut tracer: ExecutionTracer, payload: Value) -> Completion {
        let span = info_span!("notifier", invocation_id = %tracer.invocation_id());
        async move {
            tracer.info(TRIGGER_STAGE, payload.clone());
            let run = self
                .pipeline
                .run(RunContext::Triggered { payload }, &mut tracer)
                .await;

            let trace = tracer.finalize();
            run.outcome.map(|_| {
                info!(level = %trace.level, entries = trace.len(), "Run complete");
                trace
            })
        }
        .instrument(span)
        .await
    }

    /// Processes one trigger payload and hands the outcome to `callback`.
    pub async fn handle<F>(&self, payload: Value, callback: F)
    where
        F: FnOnce(Completion),
    {
        callback(self.run(payload).await);
    }
}
