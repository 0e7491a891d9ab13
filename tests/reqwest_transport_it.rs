#![cfg(feature = "reqwest")]

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// crates.io
use httpmock::prelude::*;
// self
use vk_dispatch::{
	_preludet::*,
	auth::{AppId, AuthParams, AuthorizationRequest, UserId},
	client::Client,
	config::ClientConfig,
	error::TransportError,
	ext::CaptchaAnswer,
	http::{ApiTransport, ReqwestTransport},
	params::Params,
	protocol::{Outcome, RemoteErrorKind},
};

fn http_url(server: &MockServer, path: &str) -> String {
	format!("http://{}{path}", server.address())
}

fn config_for(server: &MockServer) -> ClientConfig {
	ClientConfig::builder()
		.api_endpoint(http_url(server, "/method/"))
		.oauth_endpoint(http_url(server, "/token"))
		.requests_per_second(0.)
		.build()
		.expect("Mock server config should be valid.")
}

#[test]
fn mock_endpoints_use_plain_http() {
	let server = MockServer::start();
	let config = config_for(&server);

	assert_eq!(config.api_endpoint.scheme(), "http");
	assert_eq!(config.oauth_endpoint.scheme(), "http");
}

fn auth_params(server: &MockServer) -> AuthParams {
	let request = AuthorizationRequest::with_credentials(AppId::new(2274003), "alice", "hunter2");

	AuthParams::from_request(
		&request,
		Url::parse(&http_url(server, "/token")).expect("Mock server URL should parse."),
		"5.199",
	)
	.expect("Credentials are complete.")
}

#[tokio::test]
async fn api_calls_post_the_prepared_form() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/method/users.get")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"response\":[{\"id\":1,\"first_name\":\"Pavel\"}]}");
		})
		.await;
	let client = Client::new(config_for(&server)).expect("Config should build a client.");

	client
		.authorize(AuthorizationRequest::with_token("token-1"))
		.await
		.expect("Token authorization should succeed.");

	let value = client
		.call("users.get", Params::new().with("user_ids", 1), false)
		.await
		.expect("Mocked call should succeed.");

	mock.assert_async().await;

	assert_eq!(value[0]["first_name"], "Pavel");
}

#[tokio::test]
async fn api_error_payloads_are_classified() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/method/messages.send");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":{\"error_code\":901,\"error_msg\":\"Can't send messages for users without permission\"}}");
		})
		.await;

	let client = Client::new(config_for(&server)).expect("Config should build a client.");
	let err = client
		.invoke("messages.send", Params::new(), true)
		.await
		.expect_err("Error payload must fail.");

	assert_eq!(err.remote_kind(), Some(RemoteErrorKind::MessagesForbidden));
}

#[tokio::test]
async fn server_errors_are_transport_failures() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/method/users.get");
			then.status(502);
		})
		.await;

	let client = Client::new(config_for(&server)).expect("Config should build a client.");
	let err = client
		.invoke("users.get", Params::new(), true)
		.await
		.expect_err("Bad gateway must fail.");

	assert!(matches!(err, Error::Transport(TransportError::Status { status: 502 })));
}

#[tokio::test]
async fn direct_auth_grants_tokens() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"token-1\",\"expires_in\":86400,\"user_id\":42}");
		})
		.await;
	let client = Client::new(config_for(&server)).expect("Config should build a client.");

	client
		.authorize(AuthorizationRequest::with_credentials(AppId::new(2274003), "alice", "hunter2"))
		.await
		.expect("Direct auth should succeed.");

	mock.assert_async().await;

	assert!(client.is_authorized());
	assert_eq!(client.user_id(), Some(UserId::new(42)));
	assert!(client.session().is_refreshable());
}

#[tokio::test]
async fn direct_auth_reports_captcha_and_accepts_answers() {
	let server = MockServer::start_async().await;
	let transport = ReqwestTransport::default();
	let mut params = auth_params(&server);
	let captcha = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"need_captcha\",\"captcha_sid\":\"661\",\"captcha_img\":\"https://api.vk.com/captcha.php?sid=661\"}",
			);
		})
		.await;

	match transport.authorize(&params).await.expect("Captcha replies are not failures.") {
		Outcome::Challenge(challenge) => assert_eq!(challenge.id, 661),
		other => panic!("Unexpected outcome: {other:?}."),
	}

	captcha.delete_async().await;

	let granted = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"token-1\",\"expires_in\":0,\"user_id\":42}");
		})
		.await;

	params.captcha = Some(CaptchaAnswer::new(661, "qwerty"));

	let outcome = transport.authorize(&params).await.expect("Answered handshake succeeds.");

	granted.assert_async().await;

	assert!(matches!(outcome, Outcome::Complete(ref grant) if grant.access_token.expose() == "token-1"));
}

#[tokio::test]
async fn rejected_credentials_fail_authentication() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"invalid_client\",\"error_description\":\"Username or password is incorrect\"}",
			);
		})
		.await;

	let err = ReqwestTransport::default()
		.authorize(&auth_params(&server))
		.await
		.expect_err("Rejected credentials must fail.");

	match err {
		Error::AuthenticationFailed { reason } => assert!(reason.contains("invalid_client")),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn two_factor_prompts_need_a_provider() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401).header("content-type", "application/json").body(
				"{\"error\":\"need_validation\",\"validation_type\":\"2fa_sms\",\"redirect_uri\":\"https://m.vk.com/login?act=authcheck\"}",
			);
		})
		.await;
	let transport = ReqwestTransport::default();
	let mut params = auth_params(&server);

	assert!(matches!(transport.authorize(&params).await, Err(Error::ValidationFailed { .. })));

	mock.assert_hits_async(1).await;

	let asked = Arc::new(AtomicUsize::new(0));
	let hook = asked.clone();

	params.two_factor = Some(Arc::new(move || {
		hook.fetch_add(1, Ordering::SeqCst);

		Some("123456".to_owned())
	}));

	let err = transport.authorize(&params).await.expect_err("Mock keeps demanding validation.");

	match err {
		Error::ValidationFailed { reason } => assert!(reason.contains("m.vk.com")),
		other => panic!("Unexpected error: {other:?}."),
	}

	assert_eq!(asked.load(Ordering::SeqCst), 1);

	mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn validation_reads_the_redirect_fragment() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/authcheck").query_param("phone", "+79990001122");
			then.status(302)
				.header("location", "/blank.html#access_token=validated&expires_in=0&user_id=8");
		})
		.await;
	let no_redirects = ReqwestClient::builder()
		.redirect(vk_dispatch::reqwest::redirect::Policy::none())
		.build()
		.expect("Client should build.");
	let client =
		Client::with_transport(config_for(&server), ReqwestTransport::with_client(no_redirects))
			.expect("Config should build a client.");
	let url = Url::parse(&http_url(&server, "/authcheck")).expect("Mock server URL should parse.");

	client.validate(&url, Some("+79990001122")).await.expect("Redirect carries a token.");

	mock.assert_async().await;

	assert!(client.is_authorized());
	assert_eq!(client.user_id(), Some(UserId::new(8)));
}
