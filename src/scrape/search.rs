//! Generic search over untyped JSON trees.
//!
//! RPC responses are deeply nested and their exact shape drifts, so nothing
//! here hard-codes paths. The tree is walked as an open structure (maps and
//! sequences; scalars are leaves) and matches are collected in document
//! order with their nesting depth, which the continuation tie-break needs.

use serde_json::Value;

/// A continuation-token candidate found somewhere in a response tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenCandidate {
    pub token: String,
    /// Nesting depth the token was found at (root = 0).
    pub depth: usize,
}

/// Every value stored under `key` anywhere in the tree, in document order.
pub fn search_key<'a>(tree: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    walk(tree, &mut |k, v, _| {
        if k == Some(key) {
            out.push(v);
        }
    });
    out
}

/// First value stored under `key`, in document order.
pub fn first_key<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    // Plain DFS; fine for the tree sizes the host serves.
    search_key(tree, key).into_iter().next()
}

/// Collect every continuation-token candidate in the tree.
///
/// The host stores continuation strings under a small, known set of field
/// names: legacy containers use a `continuation` field, current ones a
/// `token` field inside a `continuationCommand`. An empty result is the
/// normal end-of-listing condition, not an error.
pub fn find_continuations(tree: &Value) -> Vec<TokenCandidate> {
    let mut out = Vec::new();
    walk(tree, &mut |key, value, depth| {
        if key == Some("continuation") {
            if let Some(token) = value.as_str() {
                out.push(TokenCandidate {
                    token: token.to_string(),
                    depth,
                });
            }
        }
        // A bare `token` key only counts inside a continuationCommand.
        if key == Some("continuationCommand") {
            if let Some(token) = value.get("token").and_then(Value::as_str) {
                out.push(TokenCandidate {
                    token: token.to_string(),
                    depth: depth + 1,
                });
            }
        }
    });
    out
}

/// Pick the candidate to follow for the next page.
///
/// Heuristic, not a host contract: the longest token empirically identifies
/// the primary continuation (decoys for unrelated widgets are shorter), and
/// on length ties the shallower one wins. Kept as a free function so the
/// policy can be replaced without touching traversal or the paginators.
pub fn select_continuation(candidates: &[TokenCandidate]) -> Option<&TokenCandidate> {
    candidates
        .iter()
        .min_by(|a, b| {
            b.token
                .len()
                .cmp(&a.token.len())
                .then(a.depth.cmp(&b.depth))
        })
}

/// Depth-first walk calling `visit(key, value, depth)` for every node.
/// `key` is the map key the node is stored under (`None` for the root and
/// for sequence elements); sequence elements keep their parent's key depth
/// semantics by being one level deeper than the sequence itself.
fn walk<'a>(tree: &'a Value, visit: &mut impl FnMut(Option<&'a str>, &'a Value, usize)) {
    fn inner<'a>(
        node: &'a Value,
        key: Option<&'a str>,
        depth: usize,
        visit: &mut impl FnMut(Option<&'a str>, &'a Value, usize),
    ) {
        visit(key, node, depth);
        match node {
            Value::Object(map) => {
                for (k, v) in map {
                    inner(v, Some(k.as_str()), depth + 1, visit);
                }
            }
            Value::Array(items) => {
                for item in items {
                    inner(item, None, depth + 1, visit);
                }
            }
            _ => {}
        }
    }
    inner(tree, None, 0, visit);
}
