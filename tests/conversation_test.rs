// End-to-end tests: conversation client against a live gateway

mod common;

use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use adversary::client::{ClientError, ClientState, ConversationClient};
use adversary::debate::{DebateSetup, QuickAction, Turn, TurnRole};
use adversary::providers::MessageRole;
use adversary::server::{GatewayServer, GatewayState};
use common::{Script, ScriptedProvider};

/// Running gateway; stops when dropped
struct TestGateway {
    url: String,
    _shutdown: oneshot::Sender<()>,
}

async fn spawn_gateway(provider: Arc<ScriptedProvider>) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel::<()>();

    let server = GatewayServer::new(GatewayState::new(provider), url.clone());
    tokio::spawn(async move {
        let shutdown = async {
            let _ = rx.await;
        };
        server.serve_with_listener(listener, shutdown).await.unwrap();
    });

    TestGateway {
        url,
        _shutdown: tx,
    }
}

fn setup() -> DebateSetup {
    DebateSetup::new("Should we build a mobile app?", "Yes, our users want it")
        .with_template("feature")
        .with_lens("competitor")
}

#[tokio::test]
async fn test_start_yields_one_opponent_turn() {
    let provider = ScriptedProvider::new(Script::Reply(vec!["Which ", "users?"]));
    let gateway = spawn_gateway(provider.clone()).await;
    let mut client = ConversationClient::new(&gateway.url).unwrap();

    let mut partials = Vec::new();
    let turn = client
        .start(setup(), &CancellationToken::new(), |text| {
            partials.push(text.to_string())
        })
        .await
        .unwrap();

    assert_eq!(turn.role, TurnRole::Opponent);
    assert_eq!(turn.content, "Which users?");
    assert_eq!(client.transcript().len(), 1);
    assert_eq!(partials.last().map(String::as_str), Some("Which users?"));
    assert_eq!(provider.requests().len(), 1);
}

#[tokio::test]
async fn test_full_exchange_then_quick_rate() {
    let provider = ScriptedProvider::new(Script::Reply(vec!["Prove it."]));
    let gateway = spawn_gateway(provider.clone()).await;
    let mut client = ConversationClient::new(&gateway.url).unwrap();
    let cancel = CancellationToken::new();

    client.start(setup(), &cancel, |_| {}).await.unwrap();
    client
        .submit(Turn::user("We ran a survey"), &cancel, |_| {})
        .await
        .unwrap();
    assert_eq!(client.transcript().len(), 3);

    client
        .quick_action(QuickAction::Rate, &cancel, |_| {})
        .await
        .unwrap();

    // system + scene + three prior turns + rate instruction
    let messages = provider.last_messages();
    assert_eq!(messages.len(), 6);
    assert_eq!(messages[0].role, MessageRole::System);
    assert_eq!(messages[2].role, MessageRole::Assistant);
    assert_eq!(messages[4].role, MessageRole::Assistant);

    // opponent, user, opponent, user label, opponent
    assert_eq!(client.transcript().len(), 5);
    assert_eq!(client.transcript()[3].content, QuickAction::Rate.label());
    assert_eq!(client.state(), &ClientState::Idle);
}

#[tokio::test]
async fn test_provider_failure_keeps_user_turn() {
    let gateway = spawn_gateway(ScriptedProvider::new(Script::Fail)).await;
    let mut client = ConversationClient::new(&gateway.url).unwrap();
    let cancel = CancellationToken::new();

    let result = client.start(setup(), &cancel, |_| {}).await;
    match result {
        Err(ClientError::Gateway { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to generate response");
        }
        other => panic!("expected gateway error, got {:?}", other),
    }
    assert!(client.transcript().is_empty());
    assert!(client.last_error().is_some());

    // The setup survives a failed start, so the user can keep arguing
    let result = client
        .submit(Turn::user("Our churn is low"), &cancel, |_| {})
        .await;
    assert!(matches!(result, Err(ClientError::Gateway { status: 500, .. })));
    assert_eq!(client.transcript().len(), 1);
    assert_eq!(client.transcript()[0].role, TurnRole::User);
    assert_eq!(client.transcript()[0].content, "Our churn is low");
}

#[tokio::test]
async fn test_truncated_stream_appends_no_opponent_turn() {
    let provider = ScriptedProvider::new(Script::Truncate(vec!["Half an ans"]));
    let gateway = spawn_gateway(provider).await;
    let mut client = ConversationClient::new(&gateway.url).unwrap();

    let result = client
        .start(setup(), &CancellationToken::new(), |_| {})
        .await;

    assert!(matches!(result, Err(ClientError::IncompleteStream)));
    assert!(client.transcript().is_empty());
    assert!(matches!(client.state(), ClientState::Failed(_)));
}

#[tokio::test]
async fn test_non_streaming_client() {
    let provider = ScriptedProvider::new(Script::Reply(vec!["Who ", "pays?"]));
    let gateway = spawn_gateway(provider.clone()).await;
    let mut client = ConversationClient::new(&gateway.url)
        .unwrap()
        .with_streaming(false);

    let turn = client
        .start(setup(), &CancellationToken::new(), |_| {})
        .await
        .unwrap();

    assert_eq!(turn.content, "Who pays?");
    assert!(!provider.requests()[0].stream);
}
