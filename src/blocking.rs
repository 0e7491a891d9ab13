//! Blocking facade over [`Client`] for callers without an async runtime.
//!
//! The facade owns a private multi-thread runtime with one worker, so expiry timers keep firing
//! between calls. Do not use it from inside another Tokio runtime.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::runtime::{Builder, Runtime};
// self
use crate::{
	_prelude::*,
	auth::AuthorizationRequest,
	client::Client,
	error::ConfigError,
	ext::TwoFactorProvider,
	http::ApiTransport,
	params::Params,
};

/// Synchronous wrapper mirroring the async [`Client`] surface.
pub struct BlockingClient<T>
where
	T: ?Sized + ApiTransport,
{
	client: Client<T>,
	runtime: Arc<Runtime>,
}
impl<T> BlockingClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Wraps `client`, starting the private runtime.
	pub fn new(client: Client<T>) -> Result<Self> {
		let runtime = Builder::new_multi_thread()
			.worker_threads(1)
			.thread_name("vk-dispatch-blocking")
			.enable_all()
			.build()
			.map_err(ConfigError::RuntimeBuild)?;

		Ok(Self { client, runtime: Arc::new(runtime) })
	}

	/// Underlying async client.
	pub fn client(&self) -> &Client<T> {
		&self.client
	}

	/// Blocking [`Client::authorize`].
	pub fn authorize(&self, request: AuthorizationRequest) -> Result<()> {
		self.runtime.block_on(self.client.authorize(request))
	}

	/// Blocking [`Client::refresh`].
	pub fn refresh(&self, two_factor: Option<Arc<dyn TwoFactorProvider>>) -> Result<()> {
		self.runtime.block_on(self.client.refresh(two_factor))
	}

	/// Blocking [`Client::validate`].
	pub fn validate(&self, url: &Url, phone: Option<&str>) -> Result<()> {
		self.runtime.block_on(self.client.validate(url, phone))
	}

	/// Blocking [`Client::log_out`].
	pub fn log_out(&self) {
		self.runtime.block_on(self.client.log_out())
	}

	/// Blocking [`Client::invoke`].
	pub fn invoke(&self, method: &str, params: Params, skip_authorization: bool) -> Result<String> {
		self.runtime.block_on(self.client.invoke(method, params, skip_authorization))
	}

	/// Blocking [`Client::call`].
	pub fn call(&self, method: &str, params: Params, skip_authorization: bool) -> Result<Value> {
		self.runtime.block_on(self.client.call(method, params, skip_authorization))
	}

	/// Blocking [`Client::call_as`].
	pub fn call_as<R>(&self, method: &str, params: Params, skip_authorization: bool) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.runtime.block_on(self.client.call_as(method, params, skip_authorization))
	}

	/// See [`Client::set_rate_limit`].
	pub fn set_rate_limit(&self, requests_per_second: f64) -> Result<()> {
		self.client.set_rate_limit(requests_per_second)
	}

	/// See [`Client::is_authorized`].
	pub fn is_authorized(&self) -> bool {
		self.client.is_authorized()
	}

	/// See [`Client::dispose`].
	pub fn dispose(&self) {
		self.client.dispose();
	}
}
impl<T> Clone for BlockingClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { client: self.client.clone(), runtime: self.runtime.clone() }
	}
}
impl<T> Debug for BlockingClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BlockingClient").field("client", &self.client).finish()
	}
}
