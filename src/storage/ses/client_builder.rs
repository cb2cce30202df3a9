use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::{BehaviorVersion, ConfigLoader, SdkConfig};
use aws_sdk_ses::Client;
use aws_sdk_ses::config::timeout::TimeoutConfig;
use aws_sdk_ses::config::{Credentials, Region, StalledStreamProtectionConfig};
use std::time::Duration;

use crate::config::{CLITimeoutConfig, ClientConfig};
use crate::types::SesCredentials;

const STATIC_CREDENTIALS_PROVIDER_NAME: &str = "sesrm-static";

impl ClientConfig {
    pub async fn create_client(&self) -> Client {
        let sdk_config = self.load_sdk_config().await;

        let mut config_builder = aws_sdk_ses::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &self.endpoint_url {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        Client::from_conf(config_builder.build())
    }

    async fn load_sdk_config(&self) -> SdkConfig {
        let mut config_loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(profile_files) = self.build_profile_files() {
            config_loader = config_loader.profile_files(profile_files);
        }

        config_loader = self.load_credentials(config_loader);
        config_loader = config_loader.region(self.build_region_provider());
        config_loader = config_loader.timeout_config(build_timeout_config(&self.cli_timeout_config));

        if self.disable_stalled_stream_protection {
            config_loader =
                config_loader.stalled_stream_protection(StalledStreamProtectionConfig::disabled());
        }

        config_loader.load().await
    }

    fn build_profile_files(&self) -> Option<ProfileFiles> {
        let location = &self.client_config_location;
        if location.aws_config_file.is_none() && location.aws_shared_credentials_file.is_none() {
            return None;
        }

        let mut builder = ProfileFiles::builder();
        builder = match &location.aws_config_file {
            Some(path) => builder.with_file(ProfileFileKind::Config, path.clone()),
            None => builder.include_default_config_file(true),
        };
        builder = match &location.aws_shared_credentials_file {
            Some(path) => builder.with_file(ProfileFileKind::Credentials, path.clone()),
            None => builder.include_default_credentials_file(true),
        };

        Some(builder.build())
    }

    fn load_credentials(&self, config_loader: ConfigLoader) -> ConfigLoader {
        match &self.credential {
            SesCredentials::Profile(profile_name) => config_loader.profile_name(profile_name),
            SesCredentials::Credentials { access_keys } => {
                let credentials = Credentials::new(
                    access_keys.access_key.to_string(),
                    access_keys.secret_access_key.to_string(),
                    access_keys.session_token.clone(),
                    None,
                    STATIC_CREDENTIALS_PROVIDER_NAME,
                );
                config_loader.credentials_provider(credentials)
            }
            SesCredentials::FromEnvironment => config_loader,
        }
    }

    fn build_region_provider(&self) -> RegionProviderChain {
        let mut region_provider =
            RegionProviderChain::first_try(self.region.clone().map(Region::new));

        if let SesCredentials::Profile(profile_name) = &self.credential {
            let mut builder =
                aws_config::profile::ProfileFileRegionProvider::builder().profile_name(profile_name);
            if let Some(profile_files) = self.build_profile_files() {
                builder = builder.profile_files(profile_files);
            }
            region_provider = region_provider.or_else(builder.build());
        } else {
            region_provider = region_provider.or_default_provider();
        }

        region_provider
    }
}

fn build_timeout_config(cli_timeout_config: &CLITimeoutConfig) -> TimeoutConfig {
    let mut builder = TimeoutConfig::builder();

    if let Some(ms) = cli_timeout_config.operation_timeout_milliseconds {
        builder = builder.operation_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.operation_attempt_timeout_milliseconds {
        builder = builder.operation_attempt_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.connect_timeout_milliseconds {
        builder = builder.connect_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = cli_timeout_config.read_timeout_milliseconds {
        builder = builder.read_timeout(Duration::from_millis(ms));
    }

    builder.build()
}
