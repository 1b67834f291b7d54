use std::sync::Arc;

use serde_json::{Map, Value};

use super::options::CaptureOptions;
use crate::context::ContextSnapshot;
use crate::core::ClientConfig;
use crate::error::BuildError;
use crate::protocol::{Event, ExceptionValue, ProcessInfo, Request, Stacktrace};
use crate::stacktrace::{Normalizer, SourceLookup, culprit};

/// `type` of the exception entry of a message-only event.
pub const MESSAGE_EXCEPTION_TYPE: &str = "message";

/// Builds immutable [`Event`]s from capture options and a context snapshot.
///
/// Holds only read-only state (static config values, the normalizer and the
/// process snapshot), so one builder is shared by every capture call.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    environment: Option<String>,
    release: Option<String>,
    server_name: Option<String>,
    tags: Map<String, Value>,
    max_breadcrumbs: usize,
    source_context: bool,
    normalizer: Normalizer,
    process: Arc<ProcessInfo>,
}

impl EventBuilder {
    pub fn new(cfg: &ClientConfig, process: Arc<ProcessInfo>) -> Self {
        Self {
            environment: cfg.environment.clone(),
            release: cfg.release.clone(),
            server_name: cfg.server_name.clone(),
            tags: cfg.tags.clone(),
            max_breadcrumbs: cfg.max_breadcrumbs,
            source_context: cfg.enable_source_code_context,
            normalizer: Normalizer::new(&cfg.in_app_module_allow_list),
            process,
        }
    }

    /// Uses `lookup` for frame source context (if enabled in the config).
    pub fn with_source_lookup(mut self, lookup: Arc<dyn SourceLookup>) -> Self {
        self.normalizer = self.normalizer.with_source(lookup, self.source_context);
        self
    }

    /// Merges `opts` over `ctx` over the static config into a new event.
    ///
    /// ### Errors
    /// - [`BuildError::StacktraceWithoutSubject`] if a stacktrace is given without
    ///   an exception or a message;
    /// - [`BuildError::UnknownRequestField`] if `opts.request` has an unknown key.
    pub fn build(&self, opts: CaptureOptions, ctx: &ContextSnapshot) -> Result<Event, BuildError> {
        let CaptureOptions {
            exception,
            stacktrace,
            message,
            source,
            extra,
            tags,
            user,
            request,
            breadcrumbs,
            level,
            fingerprint,
        } = opts;

        if stacktrace.is_some() && exception.is_none() && message.is_none() {
            return Err(BuildError::StacktraceWithoutSubject);
        }
        let request = ctx.request.clone().merge(Request::from_map(request)?);

        let culprit = stacktrace.as_deref().and_then(culprit);
        let stacktrace = stacktrace.map(|raw| Stacktrace {
            frames: self.normalizer.normalize(&raw),
        });

        let mut event = Event::new(self.process.sdk.clone());

        event.exception = match (&exception, &message) {
            (Some(exc), _) => vec![ExceptionValue {
                ty: exc.ty.clone(),
                value: exc.value.clone(),
                module: exc.module.clone(),
                stacktrace,
            }],
            (None, Some(msg)) => vec![ExceptionValue {
                ty: MESSAGE_EXCEPTION_TYPE.to_string(),
                value: msg.clone(),
                module: None,
                stacktrace,
            }],
            (None, None) => Vec::new(),
        };
        event.original_exception = exception.and_then(|e| e.original);
        event.message = message;
        event.culprit = culprit;
        event.source = source;

        if let Some(level) = level {
            event.level = level;
        }
        if let Some(fingerprint) = fingerprint {
            event.fingerprint = fingerprint;
        }

        event.tags = merged([&self.tags, &ctx.tags], tags);
        event.user = merged([&ctx.user], user);
        event.extra = merged([&ctx.extra], extra);
        event.request = request;

        let mut crumbs = breadcrumbs;
        crumbs.extend(ctx.breadcrumbs.iter().cloned());
        let excess = crumbs.len().saturating_sub(self.max_breadcrumbs);
        crumbs.drain(..excess);
        event.breadcrumbs = crumbs;

        event.environment = self.environment.clone();
        event.release = self.release.clone();
        event.server_name = self.server_name.clone();
        event.contexts = self.process.contexts.clone();
        event.modules = self.process.modules.clone();

        Ok(event)
    }
}

/// Key-wise merge, later layers win; `top` wins over every layer.
fn merged<const N: usize>(
    layers: [&Map<String, Value>; N],
    top: Map<String, Value>,
) -> Map<String, Value> {
    let mut out = Map::new();
    for layer in layers {
        out.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    out.extend(top);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ExceptionInfo;
    use crate::context::ContextStore;
    use crate::protocol::{Breadcrumb, EventSource, Level};
    use crate::stacktrace::{RawFrame, SourceCodeMap};
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn builder(cfg: ClientConfig) -> EventBuilder {
        let process = Arc::new(ProcessInfo::collect(
            cfg.report_dependencies,
            [("tokio", "1.47.0")],
        ));
        EventBuilder::new(&cfg, process)
    }

    fn default_builder() -> EventBuilder {
        builder(ClientConfig {
            environment: Some("prod".into()),
            release: Some("1.2.3".into()),
            server_name: Some("web-1".into()),
            in_app_module_allow_list: vec!["MyApp".into()],
            tags: obj(json!({"region": "eu", "tier": "free"})),
            max_breadcrumbs: 3,
            ..ClientConfig::default()
        })
    }

    #[test]
    fn unknown_route_message_from_plug() {
        let opts = CaptureOptions::message("Unknown route").with_source(EventSource::Plug);
        let event = default_builder()
            .build(opts, &ContextSnapshot::default())
            .unwrap();

        assert_eq!(event.source, Some(EventSource::Plug));
        assert_eq!(event.exception.len(), 1);
        assert_eq!(event.exception[0].ty, "message");
        assert_eq!(event.exception[0].value, "Unknown route");
        assert!(event.exception[0].stacktrace.is_none());
    }

    #[test]
    fn empty_capture_has_no_exception() {
        let event = default_builder()
            .build(CaptureOptions::default(), &ContextSnapshot::default())
            .unwrap();
        assert!(event.exception.is_empty());
        assert_eq!(event.level, Level::Error);
        assert_eq!(event.fingerprint, vec!["{{default}}"]);
        assert_eq!(event.culprit, None);
    }

    #[test]
    fn stacktrace_without_subject_is_rejected() {
        let opts = CaptureOptions::default().with_stacktrace(vec![RawFrame::bare("f", 0)]);
        let err = default_builder()
            .build(opts, &ContextSnapshot::default())
            .unwrap_err();
        assert_eq!(err, BuildError::StacktraceWithoutSubject);
    }

    #[test]
    fn unknown_request_field_is_rejected() {
        let opts = CaptureOptions::message("x").with_request(obj(json!({"body": "raw"})));
        let err = default_builder()
            .build(opts, &ContextSnapshot::default())
            .unwrap_err();
        assert_eq!(err, BuildError::UnknownRequestField("body".into()));
    }

    #[test]
    fn exception_entry_carries_type_value_and_frames() {
        let frames = vec![
            RawFrame::qualified("MyApp.Repo", "get!", 2).at("lib/repo.ex", 10),
            RawFrame::qualified("Phoenix.Endpoint", "call", 2),
        ];
        let opts = CaptureOptions::exception(std::io::Error::other("connection reset"))
            .with_stacktrace(frames);
        let event = default_builder()
            .build(opts, &ContextSnapshot::default())
            .unwrap();

        let exc = &event.exception[0];
        assert_eq!(exc.ty, "Error");
        assert_eq!(exc.value, "connection reset");
        let frames = &exc.stacktrace.as_ref().unwrap().frames;
        assert_eq!(frames[0].function, "Phoenix.Endpoint.call/2");
        assert!(!frames[0].in_app);
        assert!(frames[1].in_app);
        assert_eq!(event.culprit.as_deref(), Some("MyApp.Repo.get!/2"));
        assert_eq!(
            event.original_exception.as_ref().map(|e| e.to_string()),
            Some("connection reset".to_string())
        );
    }

    #[test]
    fn exception_wins_over_message_for_the_entry() {
        let opts = CaptureOptions::default()
            .with_exception(ExceptionInfo::new("Timeout", "upstream timed out"))
            .with_message("while loading /users");
        let event = default_builder()
            .build(opts, &ContextSnapshot::default())
            .unwrap();
        assert_eq!(event.exception[0].ty, "Timeout");
        assert_eq!(event.message.as_deref(), Some("while loading /users"));
    }

    #[test]
    fn options_override_context_override_config() {
        let ctx = ContextStore::new(10);
        ctx.set_tags_context(obj(json!({"tier": "paid", "route": "/a"})));
        ctx.set_user_context(obj(json!({"id": 1, "email": "a@b.c"})));
        ctx.set_extra_context(obj(json!({"attempt": 1})));
        ctx.set_request_context(obj(json!({"url": "/a", "method": "GET"})))
            .unwrap();

        let opts = CaptureOptions::message("boom")
            .with_tag("route", "/b")
            .with_user(obj(json!({"id": 2})))
            .with_extra("attempt", 2)
            .with_request(obj(json!({"method": "POST"})));
        let event = default_builder().build(opts, &ctx.snapshot()).unwrap();

        assert_eq!(event.tags["region"], "eu");
        assert_eq!(event.tags["tier"], "paid");
        assert_eq!(event.tags["route"], "/b");
        assert_eq!(event.user["id"], 2);
        assert_eq!(event.user["email"], "a@b.c");
        assert_eq!(event.extra["attempt"], 2);
        assert_eq!(event.request.url, Some(json!("/a")));
        assert_eq!(event.request.method, Some(json!("POST")));
        assert_eq!(event.environment.as_deref(), Some("prod"));
        assert_eq!(event.release.as_deref(), Some("1.2.3"));
        assert_eq!(event.server_name.as_deref(), Some("web-1"));
    }

    #[test]
    fn breadcrumbs_are_capped_keeping_the_last() {
        let ctx = ContextStore::new(10);
        ctx.add_breadcrumb(Breadcrumb::new("ctx-1"));
        ctx.add_breadcrumb(Breadcrumb::new("ctx-2"));

        let opts = CaptureOptions::message("x")
            .with_breadcrumb(Breadcrumb::new("opt-1"))
            .with_breadcrumb(Breadcrumb::new("opt-2"));
        let event = default_builder().build(opts, &ctx.snapshot()).unwrap();

        let messages: Vec<_> = event
            .breadcrumbs
            .iter()
            .filter_map(|b| b.message.as_deref())
            .collect();
        assert_eq!(messages, vec!["opt-2", "ctx-1", "ctx-2"]);
    }

    #[test]
    fn builds_are_identical_apart_from_id_and_timestamp() {
        let ctx = ContextStore::new(10);
        ctx.add_breadcrumb(Breadcrumb::new("step"));
        let snap = ctx.snapshot();
        let opts = CaptureOptions::message("same")
            .with_level(Level::Warning)
            .with_stacktrace(vec![RawFrame::qualified("MyApp", "run", 0)]);

        let b = default_builder();
        let first = b.build(opts.clone(), &snap).unwrap();
        let second = b.build(opts, &snap).unwrap();
        assert_ne!(first.event_id, second.event_id);

        let strip = |e: &Event| {
            let mut v = e.to_payload().unwrap();
            let obj = v.as_object_mut().unwrap();
            obj.remove("event_id");
            obj.remove("timestamp");
            v
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn process_info_is_attached() {
        let event = default_builder()
            .build(CaptureOptions::message("x"), &ContextSnapshot::default())
            .unwrap();
        assert_eq!(event.sdk.name, env!("CARGO_PKG_NAME"));
        assert!(event.contexts.contains_key("os"));
        assert!(event.contexts.contains_key("runtime"));
        assert_eq!(event.modules.get("tokio").map(String::as_str), Some("1.47.0"));
    }

    #[test]
    fn modules_empty_without_dependency_reporting() {
        let b = builder(ClientConfig {
            report_dependencies: false,
            ..ClientConfig::default()
        });
        let event = b
            .build(CaptureOptions::message("x"), &ContextSnapshot::default())
            .unwrap();
        assert!(event.modules.is_empty());
    }

    #[test]
    fn source_lookup_follows_config_flag() {
        let mut map = SourceCodeMap::new(1);
        map.insert("lib/app.ex", "one\ntwo\nthree");
        let lookup: Arc<dyn SourceLookup> = Arc::new(map);
        let frames = vec![RawFrame::qualified("MyApp", "run", 0).at("lib/app.ex", 2)];

        let enabled = builder(ClientConfig {
            enable_source_code_context: true,
            ..ClientConfig::default()
        })
        .with_source_lookup(lookup.clone());
        let event = enabled
            .build(
                CaptureOptions::message("x").with_stacktrace(frames.clone()),
                &ContextSnapshot::default(),
            )
            .unwrap();
        let frame = &event.exception[0].stacktrace.as_ref().unwrap().frames[0];
        assert_eq!(frame.context_line.as_deref(), Some("two"));

        let disabled = builder(ClientConfig::default()).with_source_lookup(lookup);
        let event = disabled
            .build(
                CaptureOptions::message("x").with_stacktrace(frames),
                &ContextSnapshot::default(),
            )
            .unwrap();
        let frame = &event.exception[0].stacktrace.as_ref().unwrap().frames[0];
        assert_eq!(frame.context_line, None);
    }
}
