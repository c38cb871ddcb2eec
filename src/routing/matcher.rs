//! Route matching logic.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix only matches on a segment boundary (`/httpbin` matches
//!   `/httpbin/get` and `/httpbin?x=1`, not `/httpbinfoo`)

/// Route a request target resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    /// `/yourproblem`: the client's fault.
    YourProblem,
    /// `/myproblem`: the server's fault.
    MyProblem,
    /// `/httpbin<rest>`: relayed upstream with `rest` appended.
    Httpbin { rest: &'a str },
    /// Everything else.
    Index,
}

impl<'a> Route<'a> {
    pub fn resolve(target: &'a str) -> Self {
        if target == "/yourproblem" {
            Route::YourProblem
        } else if target == "/myproblem" {
            Route::MyProblem
        } else if let Some(rest) = strip_path_prefix(target, "/httpbin") {
            Route::Httpbin { rest }
        } else {
            Route::Index
        }
    }

    /// Label for logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Route::YourProblem => "yourproblem",
            Route::MyProblem => "myproblem",
            Route::Httpbin { .. } => "httpbin",
            Route::Index => "index",
        }
    }
}

/// `target` with `prefix` removed, if `prefix` ends on a segment boundary.
fn strip_path_prefix<'a>(target: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = target.strip_prefix(prefix)?;
    match rest.as_bytes().first() {
        None | Some(b'/') | Some(b'?') => Some(rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_routes() {
        assert_eq!(Route::resolve("/yourproblem"), Route::YourProblem);
        assert_eq!(Route::resolve("/myproblem"), Route::MyProblem);
        assert_eq!(Route::resolve("/myproblem/more"), Route::Index);
        assert_eq!(Route::resolve("/MyProblem"), Route::Index);
    }

    #[test]
    fn httpbin_prefix_keeps_remainder() {
        assert_eq!(Route::resolve("/httpbin/stream/100"), Route::Httpbin { rest: "/stream/100" });
        assert_eq!(Route::resolve("/httpbin?a=1"), Route::Httpbin { rest: "?a=1" });
        assert_eq!(Route::resolve("/httpbin"), Route::Httpbin { rest: "" });
        assert_eq!(Route::resolve("/httpbinfoo"), Route::Index);
    }

    #[test]
    fn everything_else_is_index() {
        assert_eq!(Route::resolve("/"), Route::Index);
        assert_eq!(Route::resolve("*"), Route::Index);
        assert_eq!(Route::resolve("/").name(), "index");
    }
}
