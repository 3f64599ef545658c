//! Gateway and route tree descriptors
//!
//! Routes form a tree of path segments (`item` → `{itemId}`); each node
//! may bind handler-and-method pairs with an authorization requirement.
//! Parameter segments are bound at request time, not provisioning time.

use serde::{Deserialize, Serialize};

/// Declares the REST gateway itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestApiSpec {
    pub name: String,
    /// Stage the API is deployed to.
    pub stage: String,
}

impl RestApiSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage: "prod".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    /// Catch-all method, used for the unauthenticated default route.
    Any,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Any => "ANY",
        }
    }
}

/// Authorization requirement of one method binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Authorization {
    /// Open route; the gateway invokes the handler for any caller.
    None,
    /// Bearer credential validated by the named authorizer before the
    /// handler is invoked.
    CognitoUserPools { authorizer: String },
}

/// One method on one route node, wired to a handler function by logical
/// name. Integrations are proxy-style: the handler receives the request
/// envelope and produces the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodBinding {
    pub method: HttpMethod,
    pub function: String,
    pub authorization: Authorization,
}

/// One segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum PathSegment {
    Literal(String),
    /// `{name}` — resolved per request by the routing layer.
    Parameter(String),
}

impl PathSegment {
    /// The path part as the gateway spells it (`item`, `{itemId}`).
    pub fn path_part(&self) -> String {
        match self {
            PathSegment::Literal(s) => s.clone(),
            PathSegment::Parameter(s) => format!("{{{s}}}"),
        }
    }
}

/// A node of the route resource tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    pub segment: PathSegment,
    pub bindings: Vec<MethodBinding>,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    pub fn literal(segment: impl Into<String>) -> Self {
        Self {
            segment: PathSegment::Literal(segment.into()),
            bindings: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Self {
            segment: PathSegment::Parameter(name.into()),
            bindings: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn bind(mut self, binding: MethodBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn child(mut self, node: RouteNode) -> Self {
        self.children.push(node);
        self
    }

    /// Walks the tree depth-first, yielding `(path, binding)` pairs with
    /// paths spelled the way the gateway spells them.
    pub fn walk(&self) -> Vec<(String, &MethodBinding)> {
        let mut out = Vec::new();
        self.collect("", &mut out);
        out
    }

    fn collect<'a>(&'a self, parent: &str, out: &mut Vec<(String, &'a MethodBinding)>) {
        let path = format!("{parent}/{}", self.segment.path_part());
        for binding in &self.bindings {
            out.push((path.clone(), binding));
        }
        for c in &self.children {
            c.collect(&path, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_yields_gateway_style_paths() {
        let tree = RouteNode::literal("item").child(
            RouteNode::parameter("itemId")
                .bind(MethodBinding {
                    method: HttpMethod::Get,
                    function: "get".to_string(),
                    authorization: Authorization::CognitoUserPools {
                        authorizer: "authz".to_string(),
                    },
                })
                .bind(MethodBinding {
                    method: HttpMethod::Any,
                    function: "health".to_string(),
                    authorization: Authorization::None,
                }),
        );

        let routes = tree.walk();
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].0, "/item/{itemId}");
        assert_eq!(routes[0].1.method, HttpMethod::Get);
        assert_eq!(routes[1].1.method, HttpMethod::Any);
    }

    #[test]
    fn parameter_segments_render_braced() {
        assert_eq!(PathSegment::Parameter("itemId".into()).path_part(), "{itemId}");
        assert_eq!(PathSegment::Literal("item".into()).path_part(), "item");
    }
}
