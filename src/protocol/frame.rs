use std::collections::BTreeMap;

use serde::Serialize;

/// One normalized stack frame.
///
/// Produced by [`Normalizer`](crate::Normalizer); absent location data stays
/// absent and is omitted from the payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// `"module.function/arity"` or `"function/arity"`.
    pub function: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    pub in_app: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pre_context: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_line: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub post_context: Vec<String>,
    /// `"arg<N>"` → bounded textual representation of the N-th argument.
    pub vars: BTreeMap<String, String>,
}
