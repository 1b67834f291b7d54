//! # One-shot process snapshot.
//!
//! [`ProcessInfo`] gathers everything about the running process that every event
//! repeats: SDK identity, OS/runtime contexts and the dependency snapshot. It is
//! computed once in [`ClientBuilder::build`](crate::ClientBuilder::build) and
//! shared read-only as `Arc<ProcessInfo>`; nothing mutates it afterwards, so no
//! lock guards it.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value, json};
use sysinfo::System;

/// SDK identity sent with every event and in the auth header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sdk {
    pub name: &'static str,
    pub version: &'static str,
}

impl Sdk {
    /// Identity of this crate build.
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    /// `name/version`, as used in `sentry_client`.
    pub fn client_string(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }
}

/// Read-only process-wide state attached to every event.
#[derive(Clone, Debug)]
pub struct ProcessInfo {
    pub sdk: Sdk,
    /// `os` and `runtime` contexts.
    pub contexts: Map<String, Value>,
    /// Dependency name → version; empty unless dependency reporting is on.
    pub modules: BTreeMap<String, String>,
}

impl ProcessInfo {
    /// Collects the snapshot.
    ///
    /// `modules` lists the application's dependencies (`name`, `version`); it is
    /// ignored when `report_dependencies` is false. This crate always adds itself.
    pub fn collect<I, K, V>(report_dependencies: bool, modules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let sdk = Sdk::current();
        let modules = if report_dependencies {
            let mut m: BTreeMap<String, String> = modules
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
            m.insert(sdk.name.to_string(), sdk.version.to_string());
            m
        } else {
            BTreeMap::new()
        };

        Self {
            sdk,
            contexts: static_contexts(),
            modules,
        }
    }
}

fn static_contexts() -> Map<String, Value> {
    let os_name = System::name().unwrap_or_else(|| std::env::consts::OS.to_string());
    let os_version = System::os_version().or_else(System::kernel_version);

    let mut contexts = Map::new();
    contexts.insert(
        "os".into(),
        json!({ "name": os_name, "version": os_version }),
    );
    contexts.insert(
        "runtime".into(),
        json!({ "name": "rust", "version": env!("CARGO_PKG_RUST_VERSION") }),
    );
    contexts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modules_are_empty_without_reporting() {
        let info = ProcessInfo::collect(false, [("serde", "1.0.0")]);
        assert!(info.modules.is_empty());
    }

    #[test]
    fn modules_include_self_when_reporting() {
        let info = ProcessInfo::collect(true, [("serde", "1.0.0")]);
        assert_eq!(info.modules.get("serde").map(String::as_str), Some("1.0.0"));
        assert!(info.modules.contains_key(env!("CARGO_PKG_NAME")));
    }

    #[test]
    fn contexts_carry_os_and_runtime() {
        let info = ProcessInfo::collect(false, Vec::<(String, String)>::new());
        assert!(info.contexts["os"]["name"].is_string());
        assert_eq!(info.contexts["runtime"]["name"], "rust");
    }
}
