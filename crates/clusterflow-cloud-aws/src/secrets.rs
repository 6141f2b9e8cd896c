//! Secrets Manager backed `SecretStore`

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::config::Region;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, SdkError};
use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
use clusterflow_cloud::{SecretError, SecretStore, SecretValue};

/// Secret store backed by AWS Secrets Manager
///
/// A client is built per lookup for the requested region; nothing is cached
/// between invocations.
#[derive(Debug, Clone, Default)]
pub struct SecretsManagerStore {
    endpoint_url: Option<String>,
}

impl SecretsManagerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send requests to another endpoint (LocalStack and similar)
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    async fn client(&self, region: &str) -> Client {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_string()));
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let config = loader.load().await;
        Client::new(&config)
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str, region: &str) -> Result<SecretValue, SecretError> {
        let client = self.client(region).await;

        tracing::debug!(secret = %name, region = %region, "GetSecretValue");
        let output = client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| classify_sdk_error(name, &e))?;

        secret_value(
            name,
            output.secret_string(),
            output.secret_binary().map(|b| b.as_ref()),
        )
    }
}

/// Pick the populated field of a GetSecretValue response
fn secret_value(
    name: &str,
    string: Option<&str>,
    binary: Option<&[u8]>,
) -> Result<SecretValue, SecretError> {
    match (string, binary) {
        (Some(text), _) => Ok(SecretValue::Text(text.to_string())),
        (None, Some(bytes)) => Ok(SecretValue::Binary(bytes.to_vec())),
        (None, None) => Err(SecretError::Empty(name.to_string())),
    }
}

fn classify_sdk_error<R>(name: &str, err: &SdkError<GetSecretValueError, R>) -> SecretError
where
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service_error) => classify(name, service_error)
            .unwrap_or_else(|| SecretError::Unavailable(DisplayErrorContext(err).to_string())),
        None => SecretError::Unavailable(DisplayErrorContext(err).to_string()),
    }
}

/// Map the documented GetSecretValue faults, `None` for anything else
fn classify(name: &str, err: &GetSecretValueError) -> Option<SecretError> {
    let name = name.to_string();
    match err {
        GetSecretValueError::DecryptionFailure(_) => Some(SecretError::DecryptionFailure(name)),
        GetSecretValueError::InternalServiceError(_) => {
            Some(SecretError::InternalServiceError(name))
        }
        GetSecretValueError::InvalidParameterException(_) => {
            Some(SecretError::InvalidParameter(name))
        }
        GetSecretValueError::InvalidRequestException(_) => Some(SecretError::InvalidRequest(name)),
        GetSecretValueError::ResourceNotFoundException(_) => {
            Some(SecretError::ResourceNotFound(name))
        }
        _ => None,
    }
}
