//! Template string to request match, through the public API only.

use http::Method;
use httprule::{Dispatch, Pattern, ServeMux, ValidatorConfig};

fn pattern(template: &str) -> Pattern {
    let compiled = httprule_core::compile(template).unwrap();
    Pattern::from_template(&compiled).unwrap()
}

#[test]
fn resource_name_spans_several_components() {
    let books = pattern("/v1/{name=shelves/*/books/*}");

    let params = books.match_path("/v1/shelves/42/books/7").unwrap();
    assert_eq!(params.get("name"), Some("shelves/42/books/7"));
    assert_eq!(params.len(), 1);

    assert!(books.match_path("/v1/shelves/42").is_none());
    assert!(books.match_path("/v1/shelves/42/books/7/pages/1").is_none());
    assert!(books.match_path("/v1/shelves/42/magazines/7").is_none());
}

#[test]
fn nested_field_paths_and_several_variables() {
    let pat = pattern("/v1/{parent=projects/*}/books/{book.id}");
    let params = pat.match_path("/v1/projects/p1/books/b2").unwrap();
    assert_eq!(
        params.iter().collect::<Vec<_>>(),
        vec![("parent", "projects/p1"), ("book.id", "b2")]
    );
}

#[test]
fn trailing_deep_wildcard_variable() {
    let pat = pattern("/v1/{path=files/**}");
    assert_eq!(
        pat.match_path("/v1/files/a/b/c.txt").unwrap().get("path"),
        Some("files/a/b/c.txt")
    );
    assert!(pat.match_path("/v1/files").is_none());
}

#[test]
fn serialized_artifact_still_matches() {
    let template = httprule_core::compile("/v1/{name=messages/*}:publish").unwrap();
    let mut stored = template.clone();
    stored.template.clear();

    let pat = Pattern::from_template(&stored).unwrap();
    assert_eq!(pat.verb(), "publish");
    assert_eq!(
        pat.match_path("/v1/messages/m1:publish").unwrap().get("name"),
        Some("messages/m1")
    );
}

#[test]
fn library_service_routing() {
    let config = ValidatorConfig::default();
    let mut mux = ServeMux::new();
    for (method, template, rpc) in [
        (Method::GET, "/v1/{name=shelves/*}", "GetShelf"),
        (Method::GET, "/v1/{parent=shelves/*}/books", "ListBooks"),
        (Method::GET, "/v1/{name=shelves/*/books/*}", "GetBook"),
        (Method::POST, "/v1/{parent=shelves/*}/books", "CreateBook"),
        (Method::DELETE, "/v1/{name=shelves/*/books/*}", "DeleteBook"),
        (Method::POST, "/v1/{name=shelves/*/books/*}:archive", "ArchiveBook"),
    ] {
        mux.handle_template(method, template, rpc, &config).unwrap();
    }
    assert_eq!(mux.len(), 6);

    let route = |method: &Method, path: &str| match mux.dispatch(method, path) {
        Dispatch::Matched { handler, params } => Some((*handler, params)),
        _ => None,
    };

    let (rpc, params) = route(&Method::GET, "/v1/shelves/s1/books").unwrap();
    assert_eq!(rpc, "ListBooks");
    assert_eq!(params.get("parent"), Some("shelves/s1"));

    let (rpc, params) = route(&Method::POST, "/v1/shelves/s1/books/b1:archive").unwrap();
    assert_eq!(rpc, "ArchiveBook");
    assert_eq!(params.get("name"), Some("shelves/s1/books/b1"));

    assert_eq!(route(&Method::DELETE, "/v1/shelves/s1/books/b1").unwrap().0, "DeleteBook");

    assert_eq!(
        mux.dispatch(&Method::PATCH, "/v1/shelves/s1/books/b1"),
        Dispatch::MethodNotAllowed {
            allowed: vec![Method::DELETE, Method::GET]
        }
    );
    assert_eq!(mux.dispatch(&Method::GET, "/v2/shelves"), Dispatch::NotFound);
}
