//! Tests for the TFVC REST client against a mock HTTP server

use std::io::Read;
use std::sync::mpsc::{self, Receiver};

use mockito::{Matcher, Server, ServerGuard};

use tfsget::config::ServerConfig;
use tfsget::domain::{ChangeType, Credential, Item, ItemKind, VersionRange, VersionSpec};
use tfsget::infrastructure::rest::RestConnector;
use tfsget::infrastructure::traits::{Connector, HistoryQuery, NonFatalError, VersionControl};
use tfsget::infrastructure::RemoteError;

fn connect(
    server: &ServerGuard,
    credential: Option<&Credential>,
) -> (Box<dyn VersionControl>, Receiver<NonFatalError>) {
    let connector = RestConnector::new(ServerConfig {
        page_size: 2,
        ..ServerConfig::default()
    });
    let (tx, rx) = mpsc::channel();
    let vc = connector.connect(&server.url(), credential, tx).unwrap();
    (vc, rx)
}

fn changeset_json(id: u32) -> String {
    format!(
        r#"{{"changesetId": {id}, "author": {{"displayName": "Alice", "uniqueName": "CORP\\alice"}},
            "createdDate": "2024-03-0{id}T10:00:00Z", "comment": "change {id}"}}"#
    )
}

fn history_query(range: VersionRange) -> HistoryQuery {
    HistoryQuery {
        path: "$/P".into(),
        recursive: true,
        range,
        include_details: false,
    }
}

#[test]
fn given_valid_login_when_authenticate_then_basic_auth_sent() {
    // Arrange
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/_apis/connectionData")
        .match_header("authorization", "Basic YWxpY2U6czNjcmV0")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"authenticatedUser": {"providerDisplayName": "Alice"}}"#)
        .create();
    let credential = Credential::parse_login("alice,s3cret");
    let (vc, _rx) = connect(&server, credential.as_ref());

    // Act
    let user = vc.authenticate().unwrap();

    // Assert
    assert_eq!(user, "Alice");
    mock.assert();
}

#[test]
fn given_rejected_login_when_authenticate_then_unauthorized() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/connectionData")
        .with_status(401)
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let result = vc.authenticate();

    // Assert
    match result {
        Err(RemoteError::Unauthorized(message)) => assert!(message.starts_with("TF30063")),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[test]
fn given_changeset_version_when_list_items_then_version_descriptor_sent() {
    // Arrange
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/_apis/tfvc/items")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("scopePath".into(), "$/P".into()),
            Matcher::UrlEncoded("recursionLevel".into(), "Full".into()),
            Matcher::UrlEncoded("versionDescriptor.versionType".into(), "changeset".into()),
            Matcher::UrlEncoded("versionDescriptor.version".into(), "7".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"count": 3, "value": [
                {"path": "$/P", "version": 7, "isFolder": true},
                {"path": "$/P/a.txt", "version": 5, "size": 3},
                {"path": "$/P/link", "version": 6, "isSymLink": true}
            ]}"#,
        )
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let items = vc.list_items("$/P", &VersionSpec::Changeset(7)).unwrap();

    // Assert
    mock.assert();
    let kinds: Vec<ItemKind> = items.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, vec![ItemKind::Folder, ItemKind::File, ItemKind::Any]);
    assert_eq!(items[1].changeset_id, 5);
    assert_eq!(items[1].size, Some(3));
}

#[test]
fn given_file_item_when_download_then_content_streamed() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/tfvc/items")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("path".into(), "$/P/a.txt".into()),
            Matcher::UrlEncoded("download".into(), "true".into()),
        ]))
        .with_status(200)
        .with_body("abc")
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let mut content = String::new();
    vc.download(&Item::file("$/P/a.txt", 5))
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();

    // Assert
    assert_eq!(content, "abc");
}

#[test]
fn given_more_changesets_than_page_size_when_query_history_then_all_pages_fetched() {
    // Arrange
    let mut server = Server::new();
    let first = server
        .mock("GET", "/_apis/tfvc/changesets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("searchCriteria.itemPath".into(), "$/P".into()),
            Matcher::UrlEncoded("searchCriteria.fromId".into(), "1".into()),
            Matcher::UrlEncoded("$top".into(), "2".into()),
            Matcher::UrlEncoded("$skip".into(), "0".into()),
        ]))
        .with_status(200)
        .with_body(format!(
            r#"{{"value": [{}, {}]}}"#,
            changeset_json(3),
            changeset_json(2)
        ))
        .create();
    let second = server
        .mock("GET", "/_apis/tfvc/changesets")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("$top".into(), "2".into()),
            Matcher::UrlEncoded("$skip".into(), "2".into()),
        ]))
        .with_status(200)
        .with_body(format!(r#"{{"value": [{}]}}"#, changeset_json(1)))
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let history = vc
        .query_history(&history_query(VersionRange::parse(Some("1")).unwrap()))
        .unwrap();

    // Assert
    first.assert();
    second.assert();
    let ids: Vec<u32> = history.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(history[0].committer.display_name, "Alice");
    assert_eq!(history[0].comment_text(), "change 3");
}

#[test]
fn given_detail_fetch_fails_when_query_history_then_notified_and_summary_kept() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/tfvc/changesets")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(format!(r#"{{"value": [{}]}}"#, changeset_json(4)))
        .create();
    server
        .mock("GET", "/_apis/tfvc/changesets/4")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message": "TF246017: database unavailable"}"#)
        .create();
    let (vc, rx) = connect(&server, None);
    let mut query = history_query(VersionRange::default());
    query.include_details = true;

    // Act
    let history = vc.query_history(&query).unwrap();

    // Assert
    assert_eq!(history.len(), 1);
    let warning = rx.try_recv().unwrap();
    assert!(warning.message.contains("TF246017"));
}

#[test]
fn given_non_recursive_query_when_query_history_then_unsupported() {
    // Arrange
    let server = Server::new();
    let (vc, _rx) = connect(&server, None);
    let mut query = history_query(VersionRange::default());
    query.recursive = false;

    // Act
    let result = vc.query_history(&query);

    // Assert
    assert!(matches!(result, Err(RemoteError::Unsupported(_))));
}

#[test]
fn given_change_names_when_changes_for_changeset_then_decoded_and_unknown_notified() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/tfvc/changesets/9/changes")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            r#"{"value": [
                {"item": {"path": "$/P/a.txt"}, "changeType": "edit, rename"},
                {"item": {"path": "$/P/b.txt"}, "changeType": 16},
                {"item": {"path": "$/P/c.txt"}, "changeType": "add, teleport"}
            ]}"#,
        )
        .create();
    let (vc, rx) = connect(&server, None);

    // Act
    let changes = vc.changes_for_changeset(9).unwrap();

    // Assert
    assert_eq!(changes[0].change_type, ChangeType::EDIT | ChangeType::RENAME);
    assert_eq!(changes[1].change_type, ChangeType::DELETE);
    assert_eq!(changes[2].change_type, ChangeType::ADD);
    let warning = rx.try_recv().unwrap();
    assert!(warning.message.contains("teleport"));
}

#[test]
fn given_server_error_when_list_items_then_http_error_with_message() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/tfvc/items")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message": "TF14019: internal error"}"#)
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let result = vc.list_items("$/P", &VersionSpec::Latest);

    // Assert
    assert_eq!(
        result.unwrap_err(),
        RemoteError::Http {
            status: 500,
            message: "TF14019: internal error".into()
        }
    );
}

#[test]
fn given_missing_path_when_list_items_then_not_found() {
    // Arrange
    let mut server = Server::new();
    server
        .mock("GET", "/_apis/tfvc/items")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message": "TF401174: item not found"}"#)
        .create();
    let (vc, _rx) = connect(&server, None);

    // Act
    let result = vc.list_items("$/Nope", &VersionSpec::Latest);

    // Assert
    assert_eq!(
        result.unwrap_err(),
        RemoteError::NotFound("TF401174: item not found".into())
    );
}
