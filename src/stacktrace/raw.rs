use serde_json::Value;

/// Arity of a raw frame: either a plain count or the captured argument list.
#[derive(Clone, Debug, PartialEq)]
pub enum Arity {
    Count(u32),
    Args(Vec<Value>),
}

impl Arity {
    /// Normalized arity (argument lists count their length).
    pub fn count(&self) -> usize {
        match self {
            Arity::Count(n) => *n as usize,
            Arity::Args(args) => args.len(),
        }
    }

    pub fn args(&self) -> Option<&[Value]> {
        match self {
            Arity::Count(_) => None,
            Arity::Args(args) => Some(args),
        }
    }
}

impl From<u32> for Arity {
    fn from(n: u32) -> Self {
        Arity::Count(n)
    }
}

impl From<Vec<Value>> for Arity {
    fn from(args: Vec<Value>) -> Self {
        Arity::Args(args)
    }
}

/// Optional location metadata of a raw frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Location {
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// A frame as captured, before normalization.
///
/// Captured stacks are ordered top-of-stack first (the crashing call at index 0).
#[derive(Clone, Debug, PartialEq)]
pub struct RawFrame {
    pub module: Option<String>,
    pub function: String,
    pub arity: Arity,
    pub location: Location,
}

impl RawFrame {
    /// Frame of a function inside `module`.
    pub fn qualified(
        module: impl Into<String>,
        function: impl Into<String>,
        arity: impl Into<Arity>,
    ) -> Self {
        Self {
            module: Some(module.into()),
            function: function.into(),
            arity: arity.into(),
            location: Location::default(),
        }
    }

    /// Frame of a function with no owning module (closures, free functions).
    pub fn bare(function: impl Into<String>, arity: impl Into<Arity>) -> Self {
        Self {
            module: None,
            function: function.into(),
            arity: arity.into(),
            location: Location::default(),
        }
    }

    #[inline]
    pub fn at(mut self, file: impl Into<String>, line: u32) -> Self {
        self.location = Location {
            file: Some(file.into()),
            line: Some(line),
        };
        self
    }

    #[inline]
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.location.file = Some(file.into());
        self
    }

    /// `"module.function/arity"` or `"function/arity"`.
    pub fn signature(&self) -> String {
        match &self.module {
            Some(module) => format!("{module}.{}/{}", self.function, self.arity.count()),
            None => format!("{}/{}", self.function, self.arity.count()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_with_module() {
        let f = RawFrame::qualified("MyApp.Router", "call", 2);
        assert_eq!(f.signature(), "MyApp.Router.call/2");
    }

    #[test]
    fn signature_without_module() {
        let f = RawFrame::bare("handler", 0);
        assert_eq!(f.signature(), "handler/0");
    }

    #[test]
    fn argument_list_normalizes_to_count() {
        let f = RawFrame::qualified("app::db", "query", vec![json!("SELECT 1"), json!(5)]);
        assert_eq!(f.signature(), "app::db.query/2");
    }
}
