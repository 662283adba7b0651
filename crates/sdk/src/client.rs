//! ByteGenie Client Implementation

use crate::error::{Result, SdkError};
use crate::types::{
    CheckFileArgs, ListCorrespondingFilesArgs, ListDocFilesArgs, ReadFileArgs, ReadFilesArgs,
    SlugifyArgs, UploadDataArgs,
};
use async_trait::async_trait;
use bytegenie_core::domain::TaskArgs;
use bytegenie_core::{
    ClientConfig, ClusterArgs, FileService, ResponseEnvelope, Secrets, TaskMode, TaskPayload,
};
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// ByteGenie API Client
///
/// Every operation builds a fresh [`TaskPayload`] from the client's
/// configuration and posts it to the execute endpoint. Failures never surface
/// as errors from the task helpers: they come back as an envelope for which
/// [`ResponseEnvelope::is_failure`] is true.
///
/// # Example
///
/// ```no_run
/// use bytegenie_sdk::{ByteGenieClient, ClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ByteGenieClient::new(ClientConfig::default())?;
/// let resp = client.slugify("Hello World", None).await;
/// println!("{} {:?}", resp.status(), resp.data());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ByteGenieClient {
    config: ClientConfig,
    secrets: Secrets,
    http: reqwest::Client,
    api_url: Url,
}

impl std::fmt::Debug for ByteGenieClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteGenieClient")
            .field("api_url", &self.config.api_url)
            .field("task_mode", &self.config.task_mode)
            .field("calc_mode", &self.config.calc_mode)
            .finish_non_exhaustive()
    }
}

impl ByteGenieClient {
    /// Create a client, reading credentials from `config.secrets_file`.
    ///
    /// A missing or malformed secrets file leaves the credentials empty.
    ///
    /// # Errors
    /// - SdkError::InvalidUrl if `api_url` or `auth_token` is unusable
    /// - SdkError::Http if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> Result<Self> {
        let secrets = Secrets::load_or_default(&config);
        Self::with_secrets(config, secrets)
    }

    /// Create a client with credentials supplied by the caller
    pub fn with_secrets(config: ClientConfig, secrets: Secrets) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .map_err(|e| SdkError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;

        let http = reqwest::Client::builder()
            .default_headers(default_headers(&config.auth_token)?)
            .build()?;

        Ok(Self {
            config,
            secrets,
            http,
            api_url,
        })
    }

    /// Same client with `task_mode = sync`, sharing credentials and connections
    pub fn sync_mode(&self) -> Self {
        let mut client = self.clone();
        client.config.task_mode = TaskMode::Sync;
        client
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_key(&self) -> &str {
        &self.secrets.api_key
    }

    pub fn username(&self) -> &str {
        &self.secrets.username
    }

    /// Build the request body for one call of `func`
    pub fn create_payload(&self, func: &str, args: TaskArgs) -> TaskPayload {
        self.create_payload_with_cluster(func, args, ClusterArgs::default())
    }

    /// Build the request body, asking for specific cluster resources
    pub fn create_payload_with_cluster(
        &self,
        func: &str,
        args: TaskArgs,
        cluster: ClusterArgs,
    ) -> TaskPayload {
        TaskPayload::new(
            self.secrets.api_key.clone(),
            self.config.task_spec(func, args, cluster),
        )
    }

    /// Send `payload` and decode the reply
    ///
    /// # Errors
    /// - SdkError::Http on connection failure or timeout
    /// - SdkError::Decode if the body is not JSON
    /// - SdkError::Envelope if the body is JSON but not an object
    pub async fn try_call(
        &self,
        payload: &TaskPayload,
        method: Method,
        timeout: Option<Duration>,
    ) -> Result<ResponseEnvelope> {
        let timeout = timeout.unwrap_or(self.config.timeout);
        debug!(
            func = payload.func(),
            url = %self.api_url,
            task_mode = %payload.task().task_mode,
            "Calling ByteGenie"
        );

        let response = self
            .http
            .request(method, self.api_url.clone())
            .json(payload)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| SdkError::Decode {
                status: status.as_u16(),
                message: e.to_string(),
            })?;

        Ok(ResponseEnvelope::new(value)?)
    }

    /// Send `payload`, folding any failure into the returned envelope
    pub async fn call(
        &self,
        payload: &TaskPayload,
        method: Method,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        match self.try_call(payload, method, timeout).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(func = payload.func(), error = %e, "ByteGenie call failed");
                ResponseEnvelope::failure(payload, e)
            }
        }
    }

    /// Run any remote function by name
    pub async fn execute(
        &self,
        func: &str,
        args: TaskArgs,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        let payload = self.create_payload(func, args);
        self.call(&payload, Method::POST, timeout).await
    }

    async fn invoke<A: Serialize>(
        &self,
        func: &str,
        args: &A,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        match to_args(args) {
            Ok(args) => self.execute(func, args, timeout).await,
            Err(e) => ResponseEnvelope::failure(&self.create_payload(func, TaskArgs::new()), e),
        }
    }

    /// Slugify text
    ///
    /// # Arguments
    ///
    /// * `text` - Text to slugify
    /// * `timeout` - Call timeout (default: the configured timeout)
    pub async fn slugify(&self, text: &str, timeout: Option<Duration>) -> ResponseEnvelope {
        let args = SlugifyArgs {
            text: text.to_string(),
        };
        self.invoke("slugify", &args, timeout).await
    }

    /// Upload file contents under the given file names
    ///
    /// # Arguments
    ///
    /// * `contents` - File contents, one entry per file
    /// * `filenames` - Names for the uploaded contents
    /// * `username` - Owner of the upload (default: `USERNAME` from the secrets file)
    /// * `timeout` - Call timeout (default: the configured timeout)
    pub async fn upload_data(
        &self,
        contents: Vec<String>,
        filenames: Vec<String>,
        username: Option<&str>,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        let args = UploadDataArgs {
            contents,
            filenames,
            username: username.unwrap_or(&self.secrets.username).to_string(),
        };
        self.invoke("upload_data", &args, timeout).await
    }

    /// List the files of a document that match `file_pattern`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use bytegenie_sdk::{ByteGenieClient, ClientConfig};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = ByteGenieClient::new(ClientConfig::default())?;
    /// let resp = client.list_doc_files("annual_report_2023", "*page_text*", None).await;
    /// if let Some(files) = resp.data() {
    ///     println!("{}", files);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn list_doc_files(
        &self,
        doc_name: &str,
        file_pattern: &str,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        let args = ListDocFilesArgs {
            doc_name: doc_name.to_string(),
            file_pattern: file_pattern.to_string(),
        };
        self.invoke("list_doc_files", &args, timeout).await
    }

    /// Ask whether a server-side file exists; the answer is the envelope's data
    pub async fn check_file_exists(&self, file: &str, timeout: Option<Duration>) -> ResponseEnvelope {
        let args = CheckFileArgs {
            file: file.to_string(),
        };
        self.invoke("check_file_exists", &args, timeout).await
    }

    /// Read a server-side file; the contents are the envelope's data
    pub async fn read_file(
        &self,
        file: &str,
        add_file: Option<bool>,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        let args = ReadFileArgs {
            file: file.to_string(),
            add_file,
        };
        self.invoke("read_file", &args, timeout).await
    }

    /// Read several files at once
    pub async fn read_files(&self, args: ReadFilesArgs, timeout: Option<Duration>) -> ResponseEnvelope {
        self.invoke("read_files", &args, timeout).await
    }

    /// Map input files to the files derived from them
    pub async fn list_corresponding_files(
        &self,
        args: ListCorrespondingFilesArgs,
        timeout: Option<Duration>,
    ) -> ResponseEnvelope {
        self.invoke("list_corresponding_files", &args, timeout).await
    }
}

/// Output polling always runs in sync task mode, whatever mode queued the task.
#[async_trait]
impl FileService for ByteGenieClient {
    async fn check_file_exists(&self, path: &str) -> ResponseEnvelope {
        ByteGenieClient::check_file_exists(&self.sync_mode(), path, None).await
    }

    async fn read_file(&self, path: &str) -> ResponseEnvelope {
        ByteGenieClient::read_file(&self.sync_mode(), path, None, None).await
    }
}

fn default_headers(auth_token: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    let mut auth = HeaderValue::from_str(auth_token)
        .map_err(|e| SdkError::InvalidUrl(format!("authorization header: {}", e)))?;
    auth.set_sensitive(true);
    headers.insert(header::AUTHORIZATION, auth);
    // reqwest adds `accept-encoding: gzip,deflate` from its gzip/deflate features
    Ok(headers)
}

fn to_args<A: Serialize>(args: &A) -> Result<TaskArgs> {
    Ok(serde_json::from_value(serde_json::to_value(args)?)?)
}
