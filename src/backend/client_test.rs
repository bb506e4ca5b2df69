use futures::TryStreamExt;
use mockito::Matcher;
use serde_json::json;

use super::*;
use crate::models::{GoogleSearchKeys, Message, Model, Plugin};

fn chat_body() -> ChatBody {
    ChatBody {
        model: Model::default(),
        messages: vec![Message::new_user("Hello")],
        prompt: "Be helpful.".to_string(),
    }
}

#[tokio::test]
async fn test_chat_stream() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/api/chat")
        .match_header("Authorization", "Bearer test_token")
        .match_body(Matcher::PartialJson(json!({
            "model": {"id": "gpt-3.5-turbo"},
            "messages": [{"role": "user", "content": "Hello"}],
            "prompt": "Be helpful.",
        })))
        .with_status(200)
        .with_body("Hello world!")
        .create_async()
        .await;

    let client = Client::default()
        .with_endpoint(&server.url())
        .with_api_key("test_token");

    let reply = client.chat(Route::Chat, chat_body()).await.unwrap();
    let Reply::Stream(stream) = reply else {
        panic!("expected a stream reply");
    };
    let text: Vec<String> = stream.try_collect().await.unwrap();
    assert_eq!(text.concat(), "Hello world!");
    handler.assert_async().await;
}

#[tokio::test]
async fn test_chat_plugin_answer() {
    let mut server = mockito::Server::new_async().await;
    let handler = server
        .mock("POST", "/api/google")
        .match_body(Matcher::PartialJson(json!({
            "googleAPIKey": "key",
            "googleCSEId": "cse",
        })))
        .with_status(200)
        .with_body(r#"{"answer":"Paris"}"#)
        .create_async()
        .await;

    let client = Client::default()
        .with_endpoint(&format!("{}/", server.url()))
        .with_plugin_keys(PluginKeys {
            google_search: Some(GoogleSearchKeys {
                api_key: "key".to_string(),
                cse_id: "cse".to_string(),
            }),
        });

    let reply = client
        .chat(Route::Plugin(Plugin::GoogleSearch), chat_body())
        .await
        .unwrap();
    match reply {
        Reply::Answer(answer) => assert_eq!(answer, "Paris"),
        other => panic!("unexpected reply {:?}", other),
    }
    handler.assert_async().await;
}

#[tokio::test]
async fn test_chat_plugin_bad_answer() {
    let mut server = mockito::Server::new_async().await;
    let _handler = server
        .mock("POST", "/api/google")
        .with_status(200)
        .with_body(r#"{"result":"Paris"}"#)
        .create_async()
        .await;

    let client = Client::default().with_endpoint(&server.url());
    let err = client
        .chat(Route::Plugin(Plugin::GoogleSearch), chat_body())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("google-search"));
}

#[tokio::test]
async fn test_chat_error_status() {
    let mut server = mockito::Server::new_async().await;
    let _handler = server
        .mock("POST", "/api/chat")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = Client::default().with_endpoint(&server.url());
    let err = client.chat(Route::Chat, chat_body()).await.unwrap_err();

    let request_err = err.downcast_ref::<RequestError>().unwrap();
    assert_eq!(request_err.status, 500);
    assert_eq!(err.to_string(), "500 Internal Server Error");
}

#[test]
fn test_from_config() {
    let mut config = BackendConfig::default();
    config.endpoint = "http://chat.local".to_string();
    config.api_key = Some("secret".to_string());
    config.timeout_secs = Some(30);

    let client = Client::from(&config);
    assert_eq!(client.endpoint(), "http://chat.local");
    assert_eq!(client.api_key(), Some("secret"));
    assert_eq!(client.timeout(), Some(time::Duration::from_secs(30)));
    assert_eq!(client.name(), "http://chat.local");
}

#[test]
fn test_endpoint_policy() {
    assert_eq!(endpoint_path(Route::Chat), "api/chat");
    assert_eq!(endpoint_path(Route::Plugin(Plugin::GoogleSearch)), "api/google");

    let body = chat_body();
    let keys = PluginKeys {
        google_search: Some(GoogleSearchKeys {
            api_key: "key".to_string(),
            cse_id: "cse".to_string(),
        }),
    };

    let chat = request_body(Route::Chat, &body, &keys).unwrap();
    assert!(chat.get("googleAPIKey").is_none());

    let plugin = request_body(Route::Plugin(Plugin::GoogleSearch), &body, &keys).unwrap();
    assert_eq!(plugin["googleAPIKey"], "key");
    assert_eq!(plugin["googleCSEId"], "cse");
    assert_eq!(plugin["prompt"], "Be helpful.");

    let without_keys =
        request_body(Route::Plugin(Plugin::GoogleSearch), &body, &PluginKeys::default()).unwrap();
    assert!(without_keys.get("googleAPIKey").is_none());
}
