//! Full CRUD lifecycle test against a live todo server.
//!
//! # Design
//! Starts the server on a random port, then exercises every core client
//! operation over real HTTP using ureq.

use todo_core::{
    add_todo_to_collection_if_missing, ApiError, CreateTodo, HttpMethod, HttpResponse, Todo,
    TodoClient,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Status codes are returned as data rather than `Err`, letting the core
/// client interpret them.
fn execute(req: todo_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();
    let content_type = req.header("content-type").unwrap_or("application/json").to_string();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => agent
            .post(&req.path)
            .content_type(content_type)
            .send(body.as_bytes()),
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => agent
            .put(&req.path)
            .content_type(content_type)
            .send(body.as_bytes()),
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
        (HttpMethod::Patch, Some(body)) => agent
            .patch(&req.path)
            .content_type(content_type)
            .send(body.as_bytes()),
        (HttpMethod::Patch, None) => agent.patch(&req.path).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    HttpResponse {
        status,
        headers,
        body,
    }
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            todo_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let client = TodoClient::new(&start_server());

    // List: should be empty.
    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert!(todos.is_empty(), "expected empty list");

    // Create.
    let create_input = CreateTodo {
        title: Some("Integration test".to_string()),
        completed: Some(false),
    };
    let req = client.build_create_todo(&create_input).unwrap();
    let created = client.parse_create_todo(execute(req)).unwrap();
    assert_eq!(created.title.as_deref(), Some("Integration test"));
    assert_eq!(created.completed, Some(false));
    let id = created.id.expect("server assigns an id");

    // Get.
    let fetched = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap();
    assert_eq!(fetched, created);

    // Partial update: title only.
    let patch = Todo {
        id: Some(id),
        title: Some("Updated title".to_string()),
        completed: None,
    };
    let req = client.build_partial_update_todo(&patch).unwrap();
    let updated = client.parse_partial_update_todo(execute(req)).unwrap();
    assert_eq!(updated.title.as_deref(), Some("Updated title"));
    assert_eq!(updated.completed, Some(false));

    // Full update.
    let replacement = Todo {
        id: Some(id),
        title: Some("Replaced".to_string()),
        completed: Some(true),
    };
    let req = client.build_update_todo(&replacement).unwrap();
    let updated = client.parse_update_todo(execute(req)).unwrap();
    assert_eq!(updated, replacement);

    // Second todo, then list newest first.
    let req = client
        .build_create_todo(&CreateTodo {
            title: Some("Second".to_string()),
            completed: None,
        })
        .unwrap();
    let second = client.parse_create_todo(execute(req)).unwrap();
    let todos = client
        .parse_list_todos(execute(client.build_list_todos_sorted(&["id,desc"])))
        .unwrap();
    assert_eq!(todos, vec![second.clone(), replacement.clone()]);

    // Collection helper over fetched data.
    let merged = add_todo_to_collection_if_missing(vec![replacement.clone()], [Some(second.clone())]);
    assert_eq!(merged, todos);

    // Delete.
    client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap();

    // Get after delete: NotFound.
    let err = client.parse_get_todo(execute(client.build_get_todo(id))).unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Deleting again still succeeds.
    client.parse_delete_todo(execute(client.build_delete_todo(id))).unwrap();

    let todos = client.parse_list_todos(execute(client.build_list_todos())).unwrap();
    assert_eq!(todos, vec![second]);
}

#[test]
fn rejected_requests_carry_error_keys() {
    let client = TodoClient::new(&start_server());

    // Update of an id the server never issued.
    let ghost = Todo {
        id: Some(4242),
        title: Some("ghost".to_string()),
        completed: Some(false),
    };
    let err = client
        .parse_update_todo(execute(client.build_update_todo(&ghost).unwrap()))
        .unwrap_err();
    assert!(
        matches!(err, ApiError::BadRequest { error_key: Some(ref key), .. } if key == "idnotfound"),
        "unexpected error: {err:?}"
    );

    let err = client
        .parse_partial_update_todo(execute(client.build_partial_update_todo(&ghost).unwrap()))
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { error_key: Some(ref key), .. } if key == "idnotfound"));

    // Invalid sort field.
    let err = client
        .parse_list_todos(execute(client.build_list_todos_sorted(&["owner,asc"])))
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest { error_key: Some(ref key), .. } if key == "sortinvalid"));
}
