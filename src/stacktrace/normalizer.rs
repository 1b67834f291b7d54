use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::raw::RawFrame;
use super::source::{SourceContext, SourceLookup};
use crate::protocol::Frame;

/// Maximum length (in chars) of one argument representation in `vars`.
pub const MAX_ARG_REPR: usize = 512;

/// Converts raw captured frames into normalized [`Frame`]s.
///
/// Pure apart from the optional source lookup; safe to share across threads.
#[derive(Clone, Default)]
pub struct Normalizer {
    allow_list: Vec<Vec<String>>,
    source: Option<Arc<dyn SourceLookup>>,
    source_context: bool,
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("allow_list", &self.allow_list)
            .field("source", &self.source.is_some())
            .field("source_context", &self.source_context)
            .finish()
    }
}

impl Normalizer {
    /// Creates a normalizer marking frames of the given module prefixes as in-app.
    pub fn new<I, S>(in_app_allow_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allow_list: in_app_allow_list
                .into_iter()
                .map(|m| segments(m.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
            source: None,
            source_context: false,
        }
    }

    /// Attaches a source lookup; it is consulted only when `enabled` is true.
    pub fn with_source(mut self, lookup: Arc<dyn SourceLookup>, enabled: bool) -> Self {
        self.source = Some(lookup);
        self.source_context = enabled;
        self
    }

    /// Normalizes `raw` (top-of-stack first) into frames ordered oldest call first.
    pub fn normalize(&self, raw: &[RawFrame]) -> Vec<Frame> {
        raw.iter().rev().map(|f| self.normalize_frame(f)).collect()
    }

    /// True when `module` equals an allow-listed module or is nested under one.
    ///
    /// Both `.` and `::` separate module segments, so `MyApp` covers
    /// `MyApp.Router` and `my_app` covers `my_app::router`.
    pub fn is_in_app(&self, module: Option<&str>) -> bool {
        let Some(module) = module else {
            return false;
        };
        let module = segments(module);
        self.allow_list
            .iter()
            .any(|prefix| module.len() >= prefix.len() && module[..prefix.len()] == prefix[..])
    }

    fn normalize_frame(&self, raw: &RawFrame) -> Frame {
        let mut frame = Frame {
            module: raw.module.clone(),
            function: raw.signature(),
            filename: raw.location.file.clone(),
            lineno: raw.location.line,
            in_app: self.is_in_app(raw.module.as_deref()),
            vars: vars(raw.arity.args()),
            ..Frame::default()
        };

        if let Some(ctx) = self.source_context_for(raw) {
            frame.pre_context = ctx.pre_context;
            frame.context_line = Some(ctx.context_line);
            frame.post_context = ctx.post_context;
        }

        frame
    }

    fn source_context_for(&self, raw: &RawFrame) -> Option<SourceContext> {
        if !self.source_context {
            return None;
        }
        let lookup = self.source.as_ref()?;
        let file = raw.location.file.as_deref()?;
        let line = raw.location.line?;
        lookup.lookup(file, line)
    }
}

/// Culprit of a captured stack: the signature of its top-most frame.
pub fn culprit(raw: &[RawFrame]) -> Option<String> {
    raw.first().map(RawFrame::signature)
}

fn segments(module: &str) -> Vec<String> {
    module
        .split(['.', ':'])
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn vars(args: Option<&[Value]>) -> BTreeMap<String, String> {
    args.unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("arg{i}"), repr(v)))
        .collect()
}

/// Bounded textual representation of one argument.
fn repr(value: &Value) -> String {
    let full = value.to_string();
    if full.chars().count() <= MAX_ARG_REPR {
        return full;
    }
    let mut out: String = full.chars().take(MAX_ARG_REPR - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stacktrace::SourceCodeMap;
    use serde_json::json;

    fn stack() -> Vec<RawFrame> {
        vec![
            RawFrame::qualified("MyApp.Repo", "get!", vec![json!("users"), json!(7)])
                .at("lib/my_app/repo.ex", 12),
            RawFrame::qualified("MyApp.Router", "call", 2).at("lib/my_app/router.ex", 4),
            RawFrame::qualified("Plug.Adapters.Cowboy", "handle", 2),
            RawFrame::bare("spawn_fn", 0),
        ]
    }

    #[test]
    fn output_is_oldest_call_first() {
        let frames = Normalizer::new(["MyApp"]).normalize(&stack());
        let fns: Vec<_> = frames.iter().map(|f| f.function.as_str()).collect();
        assert_eq!(
            fns,
            vec![
                "spawn_fn/0",
                "Plug.Adapters.Cowboy.handle/2",
                "MyApp.Router.call/2",
                "MyApp.Repo.get!/2",
            ]
        );
    }

    #[test]
    fn in_app_follows_allow_list_prefixes() {
        let frames = Normalizer::new(["MyApp"]).normalize(&stack());
        let in_app: Vec<_> = frames.iter().map(|f| f.in_app).collect();
        assert_eq!(in_app, vec![false, false, true, true]);
    }

    #[test]
    fn prefix_match_is_per_segment() {
        let n = Normalizer::new(["my_app"]);
        assert!(n.is_in_app(Some("my_app")));
        assert!(n.is_in_app(Some("my_app::router")));
        assert!(!n.is_in_app(Some("my_application::router")));
        assert!(!n.is_in_app(None));
    }

    #[test]
    fn empty_allow_list_marks_nothing_in_app() {
        let frames = Normalizer::new(Vec::<String>::new()).normalize(&stack());
        assert!(frames.iter().all(|f| !f.in_app));
    }

    #[test]
    fn argument_lists_become_vars() {
        let frames = Normalizer::new(["MyApp"]).normalize(&stack());
        let top = frames.last().unwrap();
        assert_eq!(top.vars["arg0"], "\"users\"");
        assert_eq!(top.vars["arg1"], "7");
        assert!(frames[0].vars.is_empty());
    }

    #[test]
    fn long_arguments_are_truncated() {
        let raw = vec![RawFrame::bare("f", vec![json!("x".repeat(2000))])];
        let frames = Normalizer::default().normalize(&raw);
        let arg = &frames[0].vars["arg0"];
        assert_eq!(arg.chars().count(), MAX_ARG_REPR);
        assert!(arg.ends_with('…'));
    }

    #[test]
    fn absent_location_stays_absent() {
        let frames = Normalizer::default().normalize(&[RawFrame::bare("f", 1)]);
        assert_eq!(frames[0].filename, None);
        assert_eq!(frames[0].lineno, None);
    }

    #[test]
    fn source_context_only_when_enabled() {
        let mut map = SourceCodeMap::new(1);
        map.insert("lib/my_app/router.ex", "a\nb\nc\nd\ne");
        let lookup: Arc<dyn SourceLookup> = Arc::new(map);

        let raw = vec![RawFrame::qualified("MyApp.Router", "call", 2).at("lib/my_app/router.ex", 4)];

        let on = Normalizer::new(["MyApp"]).with_source(lookup.clone(), true);
        let frame = &on.normalize(&raw)[0];
        assert_eq!(frame.pre_context, vec!["c"]);
        assert_eq!(frame.context_line.as_deref(), Some("d"));
        assert_eq!(frame.post_context, vec!["e"]);

        let off = Normalizer::new(["MyApp"]).with_source(lookup, false);
        assert_eq!(off.normalize(&raw)[0].context_line, None);
    }

    #[test]
    fn culprit_is_top_frame() {
        assert_eq!(culprit(&stack()).as_deref(), Some("MyApp.Repo.get!/2"));
        assert_eq!(culprit(&[]), None);
    }
}
