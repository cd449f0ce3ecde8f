// File: src/group.rs
// Purpose: Route groups with a shared URL prefix and endpoint namespace

use freesia_router::{FilterSpec, RouteOptions};

use crate::handler::{BoxedHandler, Handler};
use crate::view::MethodView;

/// A registration recorded on a group, replayed by `App::register_group`
#[derive(Debug)]
pub(crate) enum Deferred {
    Filter {
        name: String,
        spec: FilterSpec,
    },
    Route {
        rule: String,
        methods: Vec<String>,
        handler: BoxedHandler,
        options: Option<RouteOptions>,
    },
    View {
        rule: String,
        view: MethodView,
        options: Option<RouteOptions>,
    },
}

/// A set of routes sharing a URL prefix and an endpoint namespace
///
/// Nothing is compiled until the group is handed to the app, so a group may
/// use filters it registers itself.
///
/// ```
/// use freesia::{App, Group, RequestContext};
///
/// async fn profile(_ctx: RequestContext, id: i64) -> String { id.to_string() }
///
/// let mut users = Group::new("users", "/users/");
/// users.get("/<int:id>", profile);
///
/// let mut app = App::new();
/// app.register_group(users).unwrap();
/// assert_eq!(app.rules()[0].rule(), "/users/<int:id>");
/// assert_eq!(app.rules()[0].endpoint(), "users.profile");
/// ```
#[derive(Debug)]
pub struct Group {
    name: String,
    url_prefix: String,
    deferred: Vec<Deferred>,
}

impl Group {
    pub fn new(name: impl Into<String>, url_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url_prefix: url_prefix.into(),
            deferred: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Registers a filter on the app when the group is applied
    pub fn set_filter(&mut self, name: impl Into<String>, spec: FilterSpec) -> &mut Self {
        self.deferred.push(Deferred::Filter {
            name: name.into(),
            spec,
        });
        self
    }

    /// Records a route; `options` of `None` takes the app's defaults
    pub fn add_route<H, Args, I, S>(
        &mut self,
        rule: impl Into<String>,
        methods: I,
        handler: H,
        options: Option<RouteOptions>,
    ) -> &mut Self
    where
        H: Handler<Args>,
        Args: 'static,
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deferred.push(Deferred::Route {
            rule: rule.into(),
            methods: methods.into_iter().map(|m| m.as_ref().to_string()).collect(),
            handler: BoxedHandler::new(handler),
            options,
        });
        self
    }

    pub fn get<H: Handler<Args>, Args: 'static>(&mut self, rule: &str, handler: H) -> &mut Self {
        self.add_route(rule, ["GET"], handler, None)
    }

    pub fn post<H: Handler<Args>, Args: 'static>(&mut self, rule: &str, handler: H) -> &mut Self {
        self.add_route(rule, ["POST"], handler, None)
    }

    pub fn put<H: Handler<Args>, Args: 'static>(&mut self, rule: &str, handler: H) -> &mut Self {
        self.add_route(rule, ["PUT"], handler, None)
    }

    pub fn delete<H: Handler<Args>, Args: 'static>(&mut self, rule: &str, handler: H) -> &mut Self {
        self.add_route(rule, ["DELETE"], handler, None)
    }

    pub fn patch<H: Handler<Args>, Args: 'static>(&mut self, rule: &str, handler: H) -> &mut Self {
        self.add_route(rule, ["PATCH"], handler, None)
    }

    pub fn add_view(&mut self, rule: impl Into<String>, view: MethodView) -> &mut Self {
        self.deferred.push(Deferred::View {
            rule: rule.into(),
            view,
            options: None,
        });
        self
    }

    /// Prefix `rule` with this group's URL prefix
    pub fn prefixed(&self, rule: &str) -> String {
        join_prefix(&self.url_prefix, rule)
    }

    /// `"{group}.{endpoint}"`
    pub fn namespaced(&self, endpoint: &str) -> String {
        format!("{}.{}", self.name, endpoint)
    }

    /// Drains the recorded registrations, leaving the group empty
    pub(crate) fn take_deferred(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.deferred)
    }
}

/// Joins with exactly one `/` at the seam
///
/// An empty rule maps to the prefix itself; an empty prefix leaves the rule
/// untouched.
pub fn join_prefix(prefix: &str, rule: &str) -> String {
    if prefix.is_empty() {
        return rule.to_string();
    }
    if rule.is_empty() {
        return prefix.to_string();
    }
    format!("{}/{}", prefix.trim_end_matches('/'), rule.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("/api", "/users", "/api/users")]
    #[case("/api/", "/users", "/api/users")]
    #[case("/api/", "users", "/api/users")]
    #[case("/api", "users/", "/api/users/")]
    #[case("/api", "", "/api")]
    #[case("", "/users", "/users")]
    #[case("/", "/", "/")]
    fn test_join_prefix(#[case] prefix: &str, #[case] rule: &str, #[case] expected: &str) {
        assert_eq!(join_prefix(prefix, rule), expected);
    }

    #[test]
    fn test_namespaced() {
        let group = Group::new("admin", "/admin");
        assert_eq!(group.namespaced("index"), "admin.index");
        assert_eq!(group.prefixed("/stats"), "/admin/stats");
    }

    #[test]
    fn test_records_in_order() {
        async fn stats(_ctx: crate::RequestContext) -> &'static str {
            "stats"
        }

        let mut group = Group::new("admin", "/admin");
        group
            .set_filter("slug", FilterSpec::string())
            .get("/stats", stats)
            .add_view("/person", MethodView::new("Person"));

        let deferred = group.take_deferred();
        assert_eq!(deferred.len(), 3);
        assert!(group.take_deferred().is_empty());
        assert!(matches!(deferred[0], Deferred::Filter { .. }));
        assert!(matches!(deferred[1], Deferred::Route { .. }));
        assert!(matches!(deferred[2], Deferred::View { .. }));
    }
}
