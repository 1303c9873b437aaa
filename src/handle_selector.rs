use std::{borrow::Cow, collections::HashMap};

use crate::{
    error::Error,
    handler::{BoxedHandler, RefHandler},
    request::PathParams,
    result::InternalResult,
};

struct Route {
    pattern: String,
    param_names: Vec<String>,
    handler: BoxedHandler,
}

#[derive(Default)]
struct Node {
    childrens: Option<HashMap<String, Node>>,
    wildcard_node: Option<Box<Node>>,
    value: Option<Route>,
}

/// Path tree for the handlers of one HTTP method.
#[derive(Default)]
pub struct HandlerSelect {
    root: Node,
}

/// `{name}` and `:name` both declare a parameter segment.
fn parameter_name(value: &str) -> Option<&str> {
    if value.starts_with('{') && value.ends_with('}') && value.len() > 2 {
        return Some(&value[1..value.len() - 1]);
    }

    value
        .strip_prefix(':')
        .filter(|name| !name.is_empty())
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter(|x| !x.is_empty())
}

fn decode_segment(raw: &str) -> InternalResult<String> {
    urlencoding::decode(raw)
        .map(Cow::into_owned)
        .map_err(|_| Error::bad_request(format!("Path segment `{raw}` does not decode to UTF-8")))
}

impl HandlerSelect {
    pub fn insert(&mut self, path: &str, handler: BoxedHandler) {
        let mut node = &mut self.root;
        let mut param_names = Vec::new();

        for splitted_path in segments(path) {
            if let Some(name) = parameter_name(splitted_path) {
                param_names.push(name.to_owned());
                node = node.add_wildcard_node();
                continue;
            }

            node = node.add_normal_node(splitted_path);
        }

        node.value = Some(Route {
            pattern: path.to_owned(),
            param_names,
            handler,
        });
    }

    /// Finds the handler for `path` and its parameters, percent-decoded.
    ///
    /// A matched route whose parameters do not decode still resolves, with the
    /// decoding error in place of the parameters.
    pub fn get(&self, path: &str) -> Option<(RefHandler<'_>, InternalResult<PathParams>)> {
        let splitted: Vec<&str> = segments(path).collect();
        let mut captured = Vec::new();

        let route = self
            .root
            .find(&splitted, &mut captured)?;

        let params = route
            .param_names
            .iter()
            .zip(captured)
            .map(|(name, raw)| decode_segment(raw).map(|value| (name.clone(), value)))
            .collect::<InternalResult<Vec<_>>>()
            .map(PathParams::new);

        Some((route.handler.as_ref(), params))
    }

    /// Every registered route as `(pattern, handler)`, in no particular order.
    pub fn into_routes(self) -> Vec<(String, BoxedHandler)> {
        let mut routes = Vec::new();
        self.root.collect(&mut routes);
        routes
    }

    pub fn extend(&mut self, routes: impl IntoIterator<Item = (String, BoxedHandler)>) {
        for (pattern, handler) in routes {
            self.insert(&pattern, handler);
        }
    }
}

impl Node {
    fn add_wildcard_node(&mut self) -> &mut Self {
        self.wildcard_node
            .get_or_insert_with(Box::default)
            .as_mut()
    }

    fn add_normal_node(&mut self, path: &str) -> &mut Self {
        self.childrens
            .get_or_insert_with(HashMap::new)
            .entry(path.to_owned())
            .or_default()
    }

    // Static segments are tried first; a failed static branch backtracks into
    // the wildcard one.
    fn find<'p>(&self, path: &[&'p str], captured: &mut Vec<&'p str>) -> Option<&Route> {
        let Some((head, rest)) = path.split_first() else {
            return self.value.as_ref();
        };

        if let Some(found) = self
            .childrens
            .as_ref()
            .and_then(|childrens| childrens.get(*head))
            .and_then(|child| child.find(rest, captured))
        {
            return Some(found);
        }

        let wildcard = self.wildcard_node.as_ref()?;
        captured.push(*head);
        let found = wildcard.find(rest, captured);
        if found.is_none() {
            captured.pop();
        }
        found
    }

    fn collect(self, routes: &mut Vec<(String, BoxedHandler)>) {
        if let Some(route) = self.value {
            routes.push((route.pattern, route.handler));
        }

        if let Some(childrens) = self.childrens {
            for child in childrens.into_values() {
                child.collect(routes);
            }
        }

        if let Some(wildcard) = self.wildcard_node {
            wildcard.collect(routes);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        error::Error, handler::HandlerFuture, request::Request, response::Response,
        result::InternalResult,
    };

    fn tagged(tag: &'static str) -> BoxedHandler {
        Arc::new(
            move |_req: InternalResult<Request<String>>| -> HandlerFuture {
                Box::pin(async move { Ok(Response::new(tag.to_owned())) })
            },
        )
    }

    async fn tag_of(select: &HandlerSelect, path: &str) -> Option<(String, PathParams)> {
        let (handler, params) = select.get(path)?;
        let params = params.unwrap();
        let response = handler(Err(Error::new(String::new(), 500)))
            .await
            .ok()?;
        Some((response.body().clone(), params))
    }

    #[tokio::test]
    async fn test_static_route() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger", tagged("list"));

        let (tag, params) = tag_of(&select, "/power-ranger").await.unwrap();

        assert_eq!(tag, "list");
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_trailing_slash_is_ignored() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/", tagged("list"));

        assert!(tag_of(&select, "/power-ranger").await.is_some());
        assert!(tag_of(&select, "/power-ranger/").await.is_some());
    }

    #[tokio::test]
    async fn test_both_parameter_syntaxes_capture() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/:id", tagged("colon"));
        select.insert("/zords/{zord}/pilots/{pilot}", tagged("braces"));

        let (tag, params) = tag_of(&select, "/power-ranger/42").await.unwrap();
        assert_eq!(tag, "colon");
        assert_eq!(params.get("id"), Some("42"));

        let (tag, params) = tag_of(&select, "/zords/tyranno/pilots/jason")
            .await
            .unwrap();
        assert_eq!(tag, "braces");
        assert_eq!(params.get("zord"), Some("tyranno"));
        assert_eq!(params.get("pilot"), Some("jason"));
    }

    #[tokio::test]
    async fn test_static_segment_wins_and_backtracks() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/:id/season", tagged("season"));
        select.insert("/power-ranger/red/morph", tagged("morph"));

        let (tag, params) = tag_of(&select, "/power-ranger/red/morph").await.unwrap();
        assert_eq!(tag, "morph");
        assert!(params.is_empty());

        let (tag, params) = tag_of(&select, "/power-ranger/red/season").await.unwrap();
        assert_eq!(tag, "season");
        assert_eq!(params.get("id"), Some("red"));
    }

    #[tokio::test]
    async fn test_missing_route() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/:id", tagged("one"));

        assert!(select.get("/power-ranger").is_none());
        assert!(select.get("/power-ranger/1/2").is_none());
        assert!(select.get("/villains").is_none());
    }

    #[test]
    fn test_into_routes_and_extend() {
        let mut select = HandlerSelect::default();
        select.insert("/a/:id", tagged("a"));
        select.insert("/b", tagged("b"));

        let mut patterns: Vec<String> = select
            .into_routes()
            .into_iter()
            .map(|(pattern, _)| pattern)
            .collect();
        patterns.sort();
        assert_eq!(patterns, vec!["/a/:id".to_owned(), "/b".to_owned()]);

        let mut other = HandlerSelect::default();
        assert!(other.get("/c").is_none());
        other.extend(vec![("/c".to_owned(), tagged("c"))]);
        assert!(other.get("/c").is_some());
    }

    #[tokio::test]
    async fn test_params_are_percent_decoded() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/:name", tagged("named"));

        let (_, params) = tag_of(&select, "/power-ranger/Jason%20Lee%20Scott").await.unwrap();
        assert_eq!(params.get("name"), Some("Jason Lee Scott"));

        let (_, params) = tag_of(&select, "/power-ranger/%31").await.unwrap();
        assert_eq!(params.get("name"), Some("1"));
    }

    #[test]
    fn test_undecodable_param_is_bad_request() {
        let mut select = HandlerSelect::default();
        select.insert("/power-ranger/:name", tagged("named"));

        let Some((_, params)) = select.get("/power-ranger/%FF") else {
            panic!("route must still match");
        };

        assert_eq!(*params.unwrap_err().code(), 400);
    }
}
