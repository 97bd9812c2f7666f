mod common;

use base64::Engine;
use serde_json::{json, Value};

use tts_studio::generations;

use common::{session_cookie, set_cookie, start_app, TestApp, AUDIO_LEN};

async fn generate(app: &TestApp, cookie: &str, text: &str) -> Value {
    let resp = app
        .client
        .post(app.url("/api/text-to-speech"))
        .header("Cookie", cookie)
        .json(&json!({ "text": text, "voiceId": "v1", "stability": 50, "clarity": 70 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_register_login_logout_flow() {
    let app = start_app().await;
    let cookie = app.register("alice").await;
    assert!(cookie.starts_with("sid=sess_"));

    let me: Value = app
        .client
        .get(app.url("/api/user"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["username"], "alice");
    assert!(me.get("password").is_none());
    assert!(me.get("passwordHash").is_none());

    // duplicate username
    let dup = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({"username": "alice", "email": "other@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(dup.status(), 400);

    // login by email
    let login = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({"username": "alice@example.com", "password": "password123"}))
        .send()
        .await
        .unwrap();
    assert_eq!(login.status(), 200);
    let second_cookie = session_cookie(&login).unwrap();
    let body: Value = login.json().await.unwrap();
    assert!(!body["lastLoginAt"].is_null());

    let bad = app
        .client
        .post(app.url("/api/login"))
        .json(&json!({"username": "alice", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status(), 401);
    let body: Value = bad.json().await.unwrap();
    assert_eq!(body["error"], "Invalid credentials");

    let logout = app
        .client
        .post(app.url("/api/logout"))
        .header("Cookie", &second_cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 200);

    let after = app
        .client
        .get(app.url("/api/user"))
        .header("Cookie", &second_cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), 401);

    // the first session is unaffected
    let still = app
        .client
        .get(app.url("/api/user"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(still.status(), 200);
}

#[tokio::test]
async fn test_text_to_speech_requires_session() {
    let app = start_app().await;
    let resp = app
        .client
        .post(app.url("/api/text-to-speech"))
        .json(&json!({ "text": "Hello", "voiceId": "v1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");
    assert_eq!(app.env.mock.synth_calls(), 0);
}

#[tokio::test]
async fn test_text_to_speech_validation() {
    let app = start_app().await;
    let cookie = app.register("alice").await;

    for body in [
        json!({ "text": "", "voiceId": "v1" }),
        json!({ "text": "Hello", "voiceId": "" }),
        json!({ "text": "Hello", "voiceId": "v1", "stability": 101 }),
        json!({ "text": "x".repeat(5001), "voiceId": "v1" }),
    ] {
        let resp = app
            .client
            .post(app.url("/api/text-to-speech"))
            .header("Cookie", &cookie)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "body {} should be rejected", body);
        let err: Value = resp.json().await.unwrap();
        assert!(err["error"].is_string());
    }

    let malformed = app
        .client
        .post(app.url("/api/text-to-speech"))
        .header("Cookie", &cookie)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);

    assert_eq!(app.env.mock.synth_calls(), 0);
}

#[tokio::test]
async fn test_generate_then_list_and_replay() {
    let app = start_app().await;
    let cookie = app.register("alice").await;

    let created = generate(&app, &cookie, "Hello world").await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["format"], "mp3");
    assert_eq!(created["contentType"], "audio/mpeg");
    assert_eq!(created["duration"], 1.0);
    let audio = base64::engine::general_purpose::STANDARD
        .decode(created["audio"].as_str().unwrap())
        .unwrap();
    assert_eq!(audio.len(), AUDIO_LEN);

    let recent: Value = app
        .client
        .get(app.url("/api/generations"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(recent[0]["id"], id);
    assert_eq!(recent[0]["text"], "Hello world");
    assert_eq!(recent[0]["voiceId"], "v1");
    assert_eq!(recent[0]["downloadCount"], 0);

    let mine: Value = app
        .client
        .get(app.url("/api/user/generations?limit=5"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let playback = app
        .client
        .get(app.url(&format!("/api/generations/{}/audio", id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(playback.status(), 200);
    assert_eq!(playback.headers()["content-type"], "audio/mpeg");
    let disposition = playback.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment"));
    assert_eq!(playback.bytes().await.unwrap().len(), AUDIO_LEN);
    assert_eq!(app.env.mock.synth_calls(), 2);

    let record = generations::get(&app.env.pool, id).await.unwrap();
    assert_eq!(record.download_count, 0, "playback is not a download");

    let download = app
        .client
        .get(app.url(&format!("/api/generations/{}/download", id)))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), 200);
    let record = generations::get(&app.env.pool, id).await.unwrap();
    assert_eq!(record.download_count, 1);
}

#[tokio::test]
async fn test_replay_unknown_generation_is_404() {
    let app = start_app().await;
    let cookie = app.register("alice").await;

    let resp = app
        .client
        .get(app.url("/api/generations/99999/audio"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(app.env.mock.synth_calls(), 0);

    let bad_id = app
        .client
        .get(app.url("/api/generations/abc/audio"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status(), 400);
}

#[tokio::test]
async fn test_session_cookie_attributes_and_removal() {
    let app = start_app().await;
    let resp = app
        .client
        .post(app.url("/api/register"))
        .json(&json!({
            "username": "carol",
            "email": "carol@example.com",
            "password": "password123",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let issued = set_cookie(&resp).unwrap();
    assert_eq!(issued.name(), "sid");
    assert!(issued.value().starts_with("sess_"));
    assert_eq!(issued.path(), Some("/"));
    assert_eq!(issued.http_only(), Some(true));
    assert_eq!(issued.same_site(), Some(cookie::SameSite::Lax));
    assert_ne!(issued.secure(), Some(true));
    assert_eq!(issued.max_age(), Some(cookie::time::Duration::days(30)));

    // other cookies in the same header do not hide the session
    let header = format!("theme=dark; {}; tracking=\"a b\"", issued.stripped());
    let me = app
        .client
        .get(app.url("/api/user"))
        .header("Cookie", &header)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);

    let logout = app
        .client
        .post(app.url("/api/logout"))
        .header("Cookie", &header)
        .send()
        .await
        .unwrap();
    assert_eq!(logout.status(), 200);
    let removal = set_cookie(&logout).unwrap();
    assert_eq!(removal.name(), "sid");
    assert_eq!(removal.value(), "");
    assert_eq!(removal.path(), Some("/"));
    assert_eq!(removal.max_age(), Some(cookie::time::Duration::ZERO));
}

#[tokio::test]
async fn test_provider_failure_is_502_and_creates_nothing() {
    let app = start_app().await;
    let cookie = app.register("alice").await;
    app.env.mock.set_failing(true);

    let resp = app
        .client
        .post(app.url("/api/text-to-speech"))
        .header("Cookie", &cookie)
        .json(&json!({ "text": "Hello world", "voiceId": "v1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Speech provider request failed"));
    assert!(!message.contains("provider exploded"), "upstream body must not leak");

    let recent = generations::list_recent(&app.env.pool, 10).await.unwrap();
    assert!(recent.is_empty());
}

#[tokio::test]
async fn test_concurrent_increment_download_requests() {
    let app = start_app().await;
    let cookie = app.register("alice").await;
    let id = generate(&app, &cookie, "count me").await["id"].as_i64().unwrap();

    let n = 20;
    let mut handles = Vec::new();
    for _ in 0..n {
        let client = app.client.clone();
        let url = app.url(&format!("/api/generations/{}/increment-download", id));
        let cookie = cookie.clone();
        handles.push(tokio::spawn(async move {
            client.post(url).header("Cookie", cookie).send().await.unwrap().status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let record = generations::get(&app.env.pool, id).await.unwrap();
    assert_eq!(record.download_count, n);

    let missing = app
        .client
        .post(app.url("/api/generations/99999/increment-download"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_only_owner_can_delete() {
    let app = start_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let id = generate(&app, &alice, "mine").await["id"].as_i64().unwrap();

    let denied = app
        .client
        .delete(app.url(&format!("/api/generations/{}", id)))
        .header("Cookie", &bob)
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 403);
    let record = generations::get(&app.env.pool, id).await.unwrap();
    assert_eq!(record.text, "mine");

    let anonymous = app
        .client
        .delete(app.url(&format!("/api/generations/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);

    let deleted = app
        .client
        .delete(app.url(&format!("/api/generations/{}", id)))
        .header("Cookie", &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), 200);

    let gone = app
        .client
        .delete(app.url(&format!("/api/generations/{}", id)))
        .header("Cookie", &alice)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), 404);
}

#[tokio::test]
async fn test_user_stats_endpoint() {
    let app = start_app().await;
    let cookie = app.register("alice").await;
    generate(&app, &cookie, "Hello world").await;
    generate(&app, &cookie, "Hi").await;

    let stats: Value = app
        .client
        .get(app.url("/api/user/stats"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(stats["totalGenerations"], 2);
    assert_eq!(stats["totalCharacters"], 13);
    assert_eq!(stats["totalDuration"], 2.0);
    assert_eq!(stats["totalDownloads"], 0);
    assert_eq!(stats["recentActivity"].as_array().unwrap().len(), 1);
    assert_eq!(stats["recentActivity"][0]["generationCount"], 2);
    assert_eq!(stats["popularVoices"][0]["voiceId"], "v1");
    assert_eq!(stats["popularVoices"][0]["count"], 2);
    assert_eq!(stats["monthlyQuota"], 100);
    assert_eq!(stats["usedQuota"], 2);

    let anonymous = app
        .client
        .get(app.url("/api/user/stats"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), 401);
}

#[tokio::test]
async fn test_voices_and_usage_endpoints() {
    let app = start_app().await;

    let voices: Value = app
        .client
        .get(app.url("/api/voices"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let voices = voices.as_array().unwrap();
    assert_eq!(voices.len(), 2);
    assert_eq!(voices[0]["id"], "v1");
    assert_eq!(voices[0]["language"], "English");
    assert_eq!(voices[1]["premium"], true);

    let cookie = app.register("alice").await;
    let created = generate(&app, &cookie, "Hello").await;
    assert_eq!(created["voiceName"], "Rachel");

    let usage: Value = app
        .client
        .get(app.url("/api/voices/usage"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(usage[0]["voiceId"], "v1");
    assert_eq!(usage[0]["voiceName"], "Rachel");
    assert_eq!(usage[0]["useCount"], 1);
}

#[tokio::test]
async fn test_status_endpoint() {
    let app = start_app().await;

    let ok = app.client.get(app.url("/api/status")).send().await.unwrap();
    assert_eq!(ok.status(), 200);
    let body: Value = ok.json().await.unwrap();
    assert_eq!(body["status"], "connected");

    app.env.mock.set_failing(true);
    let down = app.client.get(app.url("/api/status")).send().await.unwrap();
    assert_eq!(down.status(), 502);
    let body: Value = down.json().await.unwrap();
    assert_eq!(body["status"], "error");
}
