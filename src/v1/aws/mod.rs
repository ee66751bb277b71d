pub mod datasync;
pub mod logs;
pub mod opensearchserverless;

use std::{fmt, marker::PhantomData, sync::Arc};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;

use super::{
    conns::AwsClient,
    handler::{decode, encode, DataSourceHandler, ResourceHandler},
    manager::{ManagerError, ResourceManager},
    types::ServicePackage,
};

static SERVICE_PACKAGES: &[&dyn ServicePackage] = &[
    &datasync::ServicePackage,
    &logs::ServicePackage,
    &opensearchserverless::ServicePackage,
];

/// Every service package the provider ships, in registration order.
pub fn service_packages() -> &'static [&'static dyn ServicePackage] {
    SERVICE_PACKAGES
}

pub struct AwsManager<Input, Output, Client> {
    client: Client,
    handle: Handle,
    aws: AwsClient,
    _phantom: PhantomData<fn() -> (Input, Output)>,
}

impl<Input, Output, Client> AwsManager<Input, Output, Client> {
    pub fn new(aws: &AwsClient, client: Client) -> Self {
        Self {
            client,
            handle: aws.handle().clone(),
            aws: aws.clone(),
            _phantom: PhantomData,
        }
    }
    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Marker type for one managed object type. Its behaviour comes from the
/// [`AwsResourceCreator`] impl for the concrete input/output pair.
pub struct AwsResource<Input, Output> {
    _phantom: PhantomData<fn() -> (Input, Output)>,
}

impl<Input, Output> Default for AwsResource<Input, Output> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

pub trait AwsResourceCreator {
    type Input: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static;
    type Output: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static;
    fn r#type() -> &'static str;
    fn manager(client: &AwsClient) -> Arc<dyn ResourceManager<Self::Input, Self::Output>>;
    fn resource_id(output: &Self::Output) -> String;
    /// Normalizes configuration before it is compared or sent.
    fn input_hook(_input: &mut Self::Input) {}
    fn needs_replace(_latest: &Self::Input, _input: &Self::Input) -> bool {
        false
    }
    /// Copies attributes the service does not report back from prior state.
    fn carry_over(_prior: &Self::Output, _latest: &mut Self::Output) {}
    /// Takes optional attributes the configuration leaves to the service from `prior`.
    fn fill_computed(_prior: &Self::Input, _input: &mut Self::Input) {}
}

impl<Input, Output> AwsResource<Input, Output>
where
    Self: AwsResourceCreator<Input = Input, Output = Output>,
    Input: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static,
    Output: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static,
{
    fn input(config: &Value) -> Result<Input, ManagerError> {
        let mut input: Input = decode(config)?;
        <Self as AwsResourceCreator>::input_hook(&mut input);
        Ok(input)
    }

    fn comparable(prior_config: &Value, config: &Value) -> Result<(Input, Input), ManagerError> {
        let prior = Self::input(prior_config)?;
        let mut input = Self::input(config)?;
        <Self as AwsResourceCreator>::fill_computed(&prior, &mut input);
        Ok((prior, input))
    }
}

impl<Input, Output> ResourceHandler for AwsResource<Input, Output>
where
    Self: AwsResourceCreator<Input = Input, Output = Output>,
    Input: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static,
    Output: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static,
{
    fn type_name(&self) -> &'static str {
        <Self as AwsResourceCreator>::r#type()
    }

    fn create(&self, client: &AwsClient, config: &Value) -> Result<Value, ManagerError> {
        let mut input = Self::input(config)?;
        let output = Self::manager(client).ensure_present(None, &mut input)?;
        tracing::info!(
            "Resource[{}] {} created",
            self.type_name(),
            Self::resource_id(&output)
        );
        encode(&output)
    }

    fn read(
        &self,
        client: &AwsClient,
        id: &str,
        prior: Option<&Value>,
    ) -> Result<Value, ManagerError> {
        let mut latest = Self::manager(client)
            .lookup(id)?
            .ok_or_else(|| ManagerError::NotFound(format!("{} {}", self.type_name(), id)))?;
        if let Some(prior) = prior {
            // Prior state written by an older version may not decode; it only
            // feeds attributes the service does not report.
            if let Ok(prior) = decode::<Output>(prior) {
                Self::carry_over(&prior, &mut latest);
            }
        }
        encode(&latest)
    }

    fn update(&self, client: &AwsClient, id: &str, config: &Value) -> Result<Value, ManagerError> {
        let mut input = Self::input(config)?;
        let output = Self::manager(client).ensure_present(Some(id), &mut input)?;
        tracing::info!("Resource[{}] {} updated", self.type_name(), id);
        encode(&output)
    }

    fn delete(&self, client: &AwsClient, state: &Value) -> Result<bool, ManagerError> {
        let latest: Output = decode(state)?;
        let id = Self::resource_id(&latest);
        Self::manager(client)
            .ensure_absent(&id, &latest)
            .inspect(|_| tracing::info!("Resource[{}] {} is absent", self.type_name(), id))
    }

    fn requires_replace(&self, prior_config: &Value, config: &Value) -> Result<bool, ManagerError> {
        let (prior, input) = Self::comparable(prior_config, config)?;
        Ok(Self::needs_replace(&prior, &input))
    }

    fn has_changes(&self, prior_config: &Value, config: &Value) -> Result<bool, ManagerError> {
        let (prior, input) = Self::comparable(prior_config, config)?;
        Ok(encode(&prior)? != encode(&input)?)
    }

    fn config_from_state(&self, state: &Value) -> Result<Value, ManagerError> {
        encode(&Self::input(state)?)
    }

    fn id(&self, state: &Value) -> Result<String, ManagerError> {
        Ok(Self::resource_id(&decode::<Output>(state)?))
    }
}

/// Marker type for one data source.
pub struct AwsDataSource<Args, Output> {
    _phantom: PhantomData<fn() -> (Args, Output)>,
}

impl<Args, Output> Default for AwsDataSource<Args, Output> {
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

pub trait AwsDataSourceReader {
    type Args: fmt::Debug + DeserializeOwned + 'static;
    type Output: fmt::Debug + Serialize + 'static;
    fn r#type() -> &'static str;
    fn read(client: &AwsClient, args: &Self::Args) -> Result<Self::Output, ManagerError>;
}

impl<Args, Output> DataSourceHandler for AwsDataSource<Args, Output>
where
    Self: AwsDataSourceReader<Args = Args, Output = Output>,
    Args: fmt::Debug + DeserializeOwned + 'static,
    Output: fmt::Debug + Serialize + 'static,
{
    fn type_name(&self) -> &'static str {
        <Self as AwsDataSourceReader>::r#type()
    }

    fn read(&self, client: &AwsClient, args: &Value) -> Result<Value, ManagerError> {
        let args: Args = match args {
            Value::Null => decode(&Value::Object(Default::default()))?,
            args => decode(args)?,
        };
        tracing::debug!("Reading data source {} with {:?}", self.type_name(), args);
        encode(&<Self as AwsDataSourceReader>::read(client, &args)?)
    }
}

/// Partition segment of an ARN (`aws`, `aws-cn`, ...).
pub fn arn_partition(arn: &str) -> Option<&str> {
    let mut parts = arn.splitn(6, ':');
    match (parts.next(), parts.next()) {
        (Some("arn"), Some(partition)) if !partition.is_empty() => Some(partition),
        _ => None,
    }
}
